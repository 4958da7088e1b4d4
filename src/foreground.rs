// =============================================================================
// foreground.rs - Contexte de premier plan / Foreground context
// =============================================================================
//
// Possède l'unique `PickerSession` du contexte et y achemine les messages,
// les événements de l'hôte et les captures terminées.
// Owns the context's single `PickerSession` and routes messages, host events
// and finished captures into it.
//
// Les captures tournent en tâches locales : `run` doit être appelé dans un
// `tokio::task::LocalSet`.
// Captures run as local tasks: `run` must be called inside a
// `tokio::task::LocalSet`.

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::error::SamplerError;
use crate::messages::{Inbox, Incoming, Message};
use crate::picker::{CaptureTicket, HostEvent, PendingCapture, PickerSession};

type Finished = (CaptureTicket, Result<String, SamplerError>);

pub struct Foreground {
    session: PickerSession,
    /// Tâche de la capture en vol / Task of the capture in flight
    capture: Option<(CaptureTicket, AbortHandle)>,
}

impl Foreground {
    pub fn new(session: PickerSession) -> Self {
        Self {
            session,
            capture: None,
        }
    }

    pub fn session(&self) -> &PickerSession {
        &self.session
    }

    /// Boucle du contexte ; rend la session quand la boîte de réception ou
    /// le flux d'événements se ferme
    /// Context loop; gives the session back once the inbox or the event
    /// stream closes
    pub async fn run(
        mut self,
        mut inbox: Inbox,
        mut events: mpsc::UnboundedReceiver<HostEvent>,
    ) -> PickerSession {
        let (finished_tx, mut finished_rx) = mpsc::unbounded_channel::<Finished>();
        info!("Foreground context started");

        loop {
            tokio::select! {
                // Messages d'abord, puis captures, puis événements de l'hôte
                // Messages first, then captures, then host events
                biased;

                incoming = inbox.recv() => match incoming {
                    Some(incoming) => {
                        self.on_message(incoming).await;
                        self.release_capture();
                    }
                    None => break,
                },
                Some((ticket, result)) = finished_rx.recv() => {
                    if matches!(self.capture, Some((current, _)) if current == ticket) {
                        self.capture = None;
                    }
                    self.session.finish_capture(ticket, result);
                }
                event = events.recv() => match event {
                    Some(event) => {
                        self.on_event(event, &finished_tx).await;
                        self.release_capture();
                    }
                    None => break,
                },
            }
        }

        self.abort_capture();
        info!("Foreground context stopped");
        self.session
    }

    async fn on_message(&mut self, incoming: Incoming) {
        match incoming.message {
            Message::ActivatePicker => {
                let transition = self.session.toggle().await;
                debug!("activate-picker: {:?}", transition);
            }
            Message::FormatChanged { format } => self.session.set_format(format),
            Message::GetColorFormat => {
                warn!("get-color-format is answered by the background context");
            }
        }
        // Le premier plan ne répond à aucune requête
        // The foreground answers no request
        drop(incoming.responder);
    }

    async fn on_event(&mut self, event: HostEvent, finished: &mpsc::UnboundedSender<Finished>) {
        match event {
            HostEvent::PointerMoved => {
                if let Some(PendingCapture { ticket, capture }) = self.session.begin_capture() {
                    // La nouvelle capture rend la précédente caduque
                    // The new capture makes the previous one stale
                    self.abort_capture();

                    let finished = finished.clone();
                    let task = tokio::task::spawn_local(async move {
                        let result = capture.await;
                        // La boucle peut être arrêtée entre-temps
                        // The loop may have stopped meanwhile
                        let _ = finished.send((ticket, result));
                    });
                    self.capture = Some((ticket, task.abort_handle()));
                }
            }
            HostEvent::Clicked => {
                let outcome = self.session.commit().await;
                debug!("click: {:?}", outcome);
            }
            HostEvent::Escaped => {
                self.session.escape();
            }
        }
    }

    /// Une session éteinte n'attend plus aucune capture
    /// An inactive session waits for no capture
    fn release_capture(&mut self) {
        if !self.session.is_active() {
            self.abort_capture();
        }
    }

    fn abort_capture(&mut self) {
        if let Some((ticket, task)) = self.capture.take() {
            debug!("Aborting pending capture {}", ticket.0);
            task.abort();
        }
    }
}
