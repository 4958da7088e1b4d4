// =============================================================================
// background.rs - Contexte d'arrière-plan / Background context
// =============================================================================
//
// Détient les préférences, répond à `get-color-format`, et envoie
// `activate-picker` / `format-changed` au premier plan.
// Owns the preferences, answers `get-color-format`, and sends
// `activate-picker` / `format-changed` to the foreground.

use log::{debug, info, warn};

use crate::color::ColorFormat;
use crate::error::{ChannelError, StoreError};
use crate::messages::{ContextLink, FormatResponse, Inbox, Incoming, Message};
use crate::store::{Preferences, SettingsStore};

pub struct Background<S> {
    prefs: Preferences<S>,
    foreground: ContextLink,
}

impl<S: SettingsStore> Background<S> {
    pub fn new(prefs: Preferences<S>, foreground: ContextLink) -> Self {
        Self { prefs, foreground }
    }

    pub fn preferences(&self) -> &Preferences<S> {
        &self.prefs
    }

    /// Premier lancement : écrit le format par défaut s'il manque
    /// First run: writes the default format if missing
    pub async fn install(&self) {
        if let Err(err) = self.prefs.ensure_default().await {
            warn!("Failed to initialize color format: {}", err);
        }
    }

    /// Clic sur l'action de l'extension : active le picker au premier plan
    /// Action click: activates the picker in the foreground
    pub fn action_clicked(&self) -> Result<(), ChannelError> {
        self.foreground.notify(&Message::ActivatePicker)
    }

    /// Enregistre un nouveau format (page d'options)
    /// Saves a new format (options page)
    ///
    /// The foreground is told by `run`, through the preference subscription.
    pub async fn save_format(&self, format: ColorFormat) -> Result<(), StoreError> {
        self.prefs.save_format(format).await
    }

    /// Traite un message entrant
    /// Handles one incoming message
    pub async fn handle(&self, incoming: Incoming) {
        match (incoming.message, incoming.responder) {
            (Message::GetColorFormat, Some(responder)) => {
                let format = self.prefs.color_format().await;
                if let Err(err) = responder.respond(&FormatResponse { format }) {
                    warn!("Failed to send color format: {}", err);
                }
            }
            (Message::GetColorFormat, None) => {
                debug!("get-color-format sent without a response channel");
            }
            (message, responder) => {
                // Pas pour nous : le demandeur est libéré tout de suite
                // Not ours: the requester is released right away
                drop(responder);
                warn!("Unexpected message in background: {:?}", message);
            }
        }
    }

    /// Boucle du contexte jusqu'à la fermeture de la boîte de réception
    /// Context loop until the inbox closes
    pub async fn run(&self, mut inbox: Inbox) {
        let mut changes = self.prefs.subscribe();
        info!("Background context started");

        loop {
            tokio::select! {
                incoming = inbox.recv() => match incoming {
                    Some(incoming) => self.handle(incoming).await,
                    None => break,
                },
                Ok(()) = changes.changed() => {
                    let format = *changes.borrow_and_update();
                    if let Err(err) = self.foreground.notify(&Message::FormatChanged { format }) {
                        warn!("Failed to forward color format: {}", err);
                    }
                }
            }
        }

        info!("Background context stopped");
    }
}

// =============================================================================
// TESTS
// =============================================================================
