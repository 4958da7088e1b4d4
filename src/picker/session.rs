// =============================================================================
// picker/session.rs - Session de capture / Picker session
// =============================================================================
//
// Une seule session par contexte, possédée par le point d'entrée du contexte.
// One session per context, owned by the context's entry point.
//
//   Inactive --toggle--> Active --toggle / escape / commit--> Inactive
//
// Les captures sont asynchrones : chaque capture reçoit un ticket, et seul le
// dernier ticket émis peut modifier la session.
// Captures are asynchronous: each one gets a ticket, and only the latest
// issued ticket may update the session.

use log::{debug, error, info, warn};

use crate::clipboard::Clipboard;
use crate::color::{self, ColorFormat, ColorSample};
use crate::error::SamplerError;

use super::common::{Capability, CaptureTicket, ListenerId, PickerState, Preview, Trigger};
use super::{CaptureFuture, FormatSource, Presenter, Sampler, TriggerHost};

// =============================================================================
// COLLABORATEURS ET RÉSULTATS
// COLLABORATORS AND OUTCOMES
// =============================================================================

/// Collaborateurs externes de la session
/// External collaborators of the session
pub struct Collaborators {
    pub sampler: Box<dyn Sampler>,
    pub clipboard: Box<dyn Clipboard>,
    pub presenter: Box<dyn Presenter>,
    pub host: Box<dyn TriggerHost>,
    pub formats: Box<dyn FormatSource>,
}

/// Résultat d'un message d'activation
/// Result of an activation message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Activated,
    Deactivated,
    /// Le capteur n'est pas disponible, la session reste inactive
    /// The sampler is unavailable, the session stays inactive
    Unsupported,
    Unchanged,
}

/// Capture demandée par un mouvement du pointeur, attendue par l'appelant
/// Capture requested by a pointer move, to be awaited by the caller
pub struct PendingCapture {
    pub ticket: CaptureTicket,
    pub capture: CaptureFuture,
}

/// Ce qu'est devenue une capture résolue
/// What happened to a resolved capture
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// Gardée comme dernier échantillon et prévisualisée
    /// Stored as the last sample and previewed
    Applied(Preview),
    /// Une capture plus récente a été émise depuis
    /// A newer capture was issued since
    Stale,
    /// Le capteur a échoué ou a été annulé
    /// The sampler failed or was cancelled
    Failed(SamplerError),
    /// La session a été éteinte entre-temps
    /// The session was deactivated meanwhile
    Dropped,
}

/// Résultat d'un clic
/// Result of a click
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Copied(String),
    CopyFailed(String),
    NothingToCommit,
    Inactive,
}

// =============================================================================
// SESSION
// =============================================================================

pub struct PickerSession {
    state: PickerState,
    format: ColorFormat,
    last_sample: Option<ColorSample>,
    listeners: Vec<ListenerId>,
    latest_ticket: u64,
    collaborators: Collaborators,
}

impl PickerSession {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            state: PickerState::Inactive,
            format: ColorFormat::default(),
            last_sample: None,
            listeners: Vec::new(),
            latest_ticket: 0,
            collaborators,
        }
    }

    pub fn state(&self) -> PickerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == PickerState::Active
    }

    pub fn format(&self) -> ColorFormat {
        self.format
    }

    pub fn last_sample(&self) -> Option<ColorSample> {
        self.last_sample
    }

    /// Message d'activation : allume ou éteint la session
    /// Activation message: turns the session on or off
    pub async fn toggle(&mut self) -> Transition {
        match self.state {
            PickerState::Inactive => self.activate().await,
            PickerState::Active => {
                self.deactivate();
                Transition::Deactivated
            }
        }
    }

    /// Échap : éteint la session sans rien copier
    /// Escape: turns the session off without copying
    pub fn escape(&mut self) -> Transition {
        if !self.is_active() {
            return Transition::Unchanged;
        }
        self.deactivate();
        Transition::Deactivated
    }

    /// Mouvement du pointeur : demande une nouvelle capture
    /// Pointer move: requests a new capture
    ///
    /// Returns `None` while inactive. Issuing a capture makes every earlier
    /// pending one stale.
    pub fn begin_capture(&mut self) -> Option<PendingCapture> {
        if !self.is_active() {
            return None;
        }
        let ticket = self.next_ticket();
        Some(PendingCapture {
            ticket,
            capture: self.collaborators.sampler.open(),
        })
    }

    /// Applique le résultat d'une capture
    /// Applies the result of a capture
    pub fn finish_capture(
        &mut self,
        ticket: CaptureTicket,
        result: Result<String, SamplerError>,
    ) -> CaptureOutcome {
        if !self.is_active() {
            debug!("Dropping capture resolved after deactivation");
            return CaptureOutcome::Dropped;
        }
        if ticket.0 != self.latest_ticket {
            debug!("Dropping stale capture {}", ticket.0);
            return CaptureOutcome::Stale;
        }

        let sample = match result.and_then(|hex| ColorSample::from_hex(&hex).map_err(SamplerError::from)) {
            Ok(sample) => sample,
            Err(err) => {
                warn!("Error picking color: {}", err);
                return CaptureOutcome::Failed(err);
            }
        };

        self.last_sample = Some(sample);
        let preview = Preview::new(sample, self.format);
        self.collaborators.presenter.preview(&preview);
        CaptureOutcome::Applied(preview)
    }

    /// Capture séquentielle : demande, attend, applique
    /// Sequential capture: request, wait, apply
    pub async fn sample(&mut self) -> Option<CaptureOutcome> {
        let PendingCapture { ticket, capture } = self.begin_capture()?;
        let result = capture.await;
        Some(self.finish_capture(ticket, result))
    }

    /// Clic : copie le dernier échantillon puis éteint la session
    /// Click: copies the last sample then turns the session off
    ///
    /// The feedback waits for the clipboard: "copied" only on success,
    /// "copy failed" otherwise. The session turns off in both cases.
    pub async fn commit(&mut self) -> CommitOutcome {
        if !self.is_active() {
            return CommitOutcome::Inactive;
        }
        let Some(sample) = self.last_sample else {
            debug!("Click without a sample, nothing to copy");
            return CommitOutcome::NothingToCommit;
        };

        let text = color::render(sample, self.format);
        let outcome = match self.collaborators.clipboard.write(&text).await {
            Ok(()) => {
                info!("Copied {}", text);
                self.collaborators.presenter.copied(&text);
                CommitOutcome::Copied(text)
            }
            Err(err) => {
                error!("Failed to copy text: {}", err);
                self.collaborators.presenter.copy_failed(&text);
                CommitOutcome::CopyFailed(text)
            }
        };

        self.deactivate();
        outcome
    }

    /// Notification de changement de format
    /// Format changed notification
    pub fn set_format(&mut self, format: ColorFormat) {
        self.format = format;
        // Vide quand inactive / Empty while inactive
        if let Some(sample) = self.last_sample {
            self.collaborators.presenter.preview(&Preview::new(sample, format));
        }
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    async fn activate(&mut self) -> Transition {
        if self.collaborators.sampler.capability() == Capability::Unsupported {
            warn!("Screen sampling is not available");
            self.collaborators.presenter.unsupported();
            return Transition::Unsupported;
        }

        // Relu à chaque activation / Fetched again on every activation
        self.format = match self.collaborators.formats.color_format().await {
            Ok(format) => format,
            Err(err) => {
                error!("Failed to get color format: {}", err);
                ColorFormat::default()
            }
        };

        self.last_sample = None;
        self.next_ticket();
        for trigger in Trigger::ALL {
            let id = self.collaborators.host.register(trigger);
            self.listeners.push(id);
        }
        self.collaborators.presenter.show_magnifier();
        self.state = PickerState::Active;

        info!("Picker activated ({})", self.format);
        Transition::Activated
    }

    fn deactivate(&mut self) {
        for id in self.listeners.drain(..) {
            self.collaborators.host.unregister(id);
        }
        self.collaborators.presenter.hide_magnifier();
        self.last_sample = None;
        // Invalide les captures en vol / Invalidates captures in flight
        self.next_ticket();
        self.state = PickerState::Inactive;

        info!("Picker deactivated");
    }

    fn next_ticket(&mut self) -> CaptureTicket {
        self.latest_ticket += 1;
        CaptureTicket(self.latest_ticket)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ChannelError, ClipboardError};
    use crate::store::{MemoryStore, Preferences};
    use crate::config;
    use async_trait::async_trait;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;
    use tokio::sync::oneshot;

    // -------------------------------------------------------------------------
    // Doublures / Test doubles
    // -------------------------------------------------------------------------

    #[derive(Debug, Clone, PartialEq)]
    enum Shown {
        Magnifier(bool),
        Preview(String),
        Copied(String),
        CopyFailed(String),
        Unsupported,
    }

    #[derive(Default)]
    struct World {
        shown: Vec<Shown>,
        clipboard: Vec<String>,
        clipboard_fails: bool,
        listeners: HashSet<ListenerId>,
        next_listener: u64,
        captures: Vec<oneshot::Sender<Result<String, SamplerError>>>,
    }

    type Shared = Rc<RefCell<World>>;

    struct FakeSampler(Shared, Capability);

    impl Sampler for FakeSampler {
        fn capability(&self) -> Capability {
            self.1
        }

        fn open(&self) -> CaptureFuture {
            let (tx, rx) = oneshot::channel();
            self.0.borrow_mut().captures.push(tx);
            Box::pin(async move { rx.await.unwrap_or(Err(SamplerError::Cancelled)) })
        }
    }

    struct FakeClipboard(Shared);

    #[async_trait(?Send)]
    impl Clipboard for FakeClipboard {
        async fn write(&self, text: &str) -> Result<(), ClipboardError> {
            let mut world = self.0.borrow_mut();
            if world.clipboard_fails {
                return Err(ClipboardError("document is not focused".into()));
            }
            world.clipboard.push(text.to_string());
            Ok(())
        }
    }

    struct FakePresenter(Shared);

    impl Presenter for FakePresenter {
        fn show_magnifier(&mut self) {
            self.0.borrow_mut().shown.push(Shown::Magnifier(true));
        }
        fn hide_magnifier(&mut self) {
            self.0.borrow_mut().shown.push(Shown::Magnifier(false));
        }
        fn preview(&mut self, preview: &Preview) {
            self.0.borrow_mut().shown.push(Shown::Preview(preview.text.clone()));
        }
        fn copied(&mut self, text: &str) {
            self.0.borrow_mut().shown.push(Shown::Copied(text.to_string()));
        }
        fn copy_failed(&mut self, text: &str) {
            self.0.borrow_mut().shown.push(Shown::CopyFailed(text.to_string()));
        }
        fn unsupported(&mut self) {
            self.0.borrow_mut().shown.push(Shown::Unsupported);
        }
    }

    struct FakeHost(Shared);

    impl TriggerHost for FakeHost {
        fn register(&mut self, _trigger: Trigger) -> ListenerId {
            let mut world = self.0.borrow_mut();
            world.next_listener += 1;
            let id = ListenerId(world.next_listener);
            world.listeners.insert(id);
            id
        }
        fn unregister(&mut self, id: ListenerId) {
            self.0.borrow_mut().listeners.remove(&id);
        }
    }

    struct FailingFormats;

    #[async_trait(?Send)]
    impl FormatSource for FailingFormats {
        async fn color_format(&self) -> Result<ColorFormat, ChannelError> {
            Err(ChannelError::Closed)
        }
    }

    fn session_with(formats: Box<dyn FormatSource>, capability: Capability) -> (PickerSession, Shared) {
        let world = Shared::default();
        let session = PickerSession::new(Collaborators {
            sampler: Box::new(FakeSampler(world.clone(), capability)),
            clipboard: Box::new(FakeClipboard(world.clone())),
            presenter: Box::new(FakePresenter(world.clone())),
            host: Box::new(FakeHost(world.clone())),
            formats,
        });
        (session, world)
    }

    fn session(stored: Option<&str>) -> (PickerSession, Shared) {
        let store = match stored {
            Some(format) => MemoryStore::new().with(config::COLOR_FORMAT_KEY, format),
            None => MemoryStore::new(),
        };
        session_with(Box::new(Preferences::new(store)), Capability::Supported)
    }

    /// Résout une capture ouverte / Resolves one opened capture
    fn resolve(world: &Shared, index: usize, result: Result<&str, SamplerError>) {
        let tx = world.borrow_mut().captures.remove(index);
        let _ = tx.send(result.map(str::to_string));
    }

    async fn capture(
        session: &mut PickerSession,
        world: &Shared,
        result: Result<&str, SamplerError>,
    ) -> CaptureOutcome {
        let pending = session.begin_capture().unwrap();
        let last = world.borrow().captures.len() - 1;
        resolve(world, last, result);
        let result = pending.capture.await;
        session.finish_capture(pending.ticket, result)
    }

    // -------------------------------------------------------------------------
    // Scénarios / Scenarios
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_pick_rgb_copies_and_deactivates() {
        let (mut session, world) = session(Some("rgb"));

        assert_eq!(session.toggle().await, Transition::Activated);
        assert_eq!(session.format(), ColorFormat::Rgb);

        let outcome = capture(&mut session, &world, Ok("#336699")).await;
        assert!(matches!(outcome, CaptureOutcome::Applied(ref p) if p.text == "rgb(51, 102, 153)"));

        let outcome = session.commit().await;
        assert_eq!(outcome, CommitOutcome::Copied("rgb(51, 102, 153)".into()));
        assert_eq!(world.borrow().clipboard, vec!["rgb(51, 102, 153)".to_string()]);
        assert_eq!(session.state(), PickerState::Inactive);
        assert!(world.borrow().listeners.is_empty());
    }

    #[tokio::test]
    async fn test_missing_format_uses_hex() {
        let (mut session, world) = session(None);

        session.toggle().await;
        assert_eq!(session.format(), ColorFormat::Hex);

        capture(&mut session, &world, Ok("#FFFFFF")).await;
        assert_eq!(session.commit().await, CommitOutcome::Copied("#ffffff".into()));
        assert_eq!(world.borrow().clipboard, vec!["#ffffff".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_or_unreachable_format_uses_hex() {
        let (mut session, _) = session(Some("cmyk"));
        session.toggle().await;
        assert_eq!(session.format(), ColorFormat::Hex);

        let (mut session, _) = session_with(Box::new(FailingFormats), Capability::Supported);
        assert_eq!(session.toggle().await, Transition::Activated);
        assert_eq!(session.format(), ColorFormat::Hex);
    }

    #[tokio::test]
    async fn test_cancelled_capture_then_click_is_noop() {
        let (mut session, world) = session(Some("hsl"));
        session.toggle().await;

        let outcome = capture(&mut session, &world, Err(SamplerError::Cancelled)).await;
        assert_eq!(outcome, CaptureOutcome::Failed(SamplerError::Cancelled));
        assert_eq!(session.last_sample(), None);

        assert_eq!(session.commit().await, CommitOutcome::NothingToCommit);
        assert!(world.borrow().clipboard.is_empty());
        assert!(session.is_active());
    }

    #[tokio::test]
    async fn test_failed_capture_keeps_previous_sample() {
        let (mut session, world) = session(Some("hex"));
        session.toggle().await;

        capture(&mut session, &world, Ok("#102030")).await;
        capture(&mut session, &world, Err(SamplerError::Cancelled)).await;
        let outcome = capture(&mut session, &world, Ok("not a color")).await;
        assert!(matches!(outcome, CaptureOutcome::Failed(SamplerError::Malformed(_))));

        assert_eq!(session.last_sample(), Some(ColorSample::opaque(0x10, 0x20, 0x30)));
    }

    #[tokio::test]
    async fn test_double_toggle_leaves_no_listeners() {
        let (mut session, world) = session(Some("rgba"));

        assert_eq!(session.toggle().await, Transition::Activated);
        assert_eq!(world.borrow().listeners.len(), Trigger::ALL.len());

        assert_eq!(session.toggle().await, Transition::Deactivated);
        assert_eq!(session.state(), PickerState::Inactive);
        assert!(world.borrow().listeners.is_empty());
        assert!(world.borrow().clipboard.is_empty());
        assert_eq!(
            world.borrow().shown,
            vec![Shown::Magnifier(true), Shown::Magnifier(false)]
        );
    }

    #[tokio::test]
    async fn test_each_activation_refetches_format() {
        let prefs = Rc::new(Preferences::new(MemoryStore::new().with(config::COLOR_FORMAT_KEY, "hsl")));

        struct SharedPrefs(Rc<Preferences<MemoryStore>>);

        #[async_trait(?Send)]
        impl FormatSource for SharedPrefs {
            async fn color_format(&self) -> Result<ColorFormat, ChannelError> {
                Ok(self.0.color_format().await)
            }
        }

        let (mut session, _) =
            session_with(Box::new(SharedPrefs(prefs.clone())), Capability::Supported);

        session.toggle().await;
        assert_eq!(session.format(), ColorFormat::Hsl);
        session.toggle().await;

        prefs.save_format(ColorFormat::Hsla).await.unwrap();
        session.toggle().await;
        assert_eq!(session.format(), ColorFormat::Hsla);
    }

    // -------------------------------------------------------------------------
    // Courses / Races
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_latest_capture_wins() {
        let (mut session, world) = session(Some("hex"));
        session.toggle().await;

        let first = session.begin_capture().unwrap();
        let second = session.begin_capture().unwrap();

        // La plus récente résout d'abord / The newest resolves first
        resolve(&world, 1, Ok("#00ff00"));
        resolve(&world, 0, Ok("#ff0000"));

        let result = second.capture.await;
        assert!(matches!(session.finish_capture(second.ticket, result), CaptureOutcome::Applied(_)));
        let result = first.capture.await;
        assert_eq!(session.finish_capture(first.ticket, result), CaptureOutcome::Stale);

        assert_eq!(session.last_sample(), Some(ColorSample::opaque(0, 255, 0)));
    }

    #[tokio::test]
    async fn test_capture_after_deactivation_is_dropped() {
        let (mut session, world) = session(Some("hex"));
        session.toggle().await;

        let pending = session.begin_capture().unwrap();
        session.toggle().await;
        resolve(&world, 0, Ok("#abcdef"));

        let result = pending.capture.await;
        assert_eq!(session.finish_capture(pending.ticket, result), CaptureOutcome::Dropped);
        assert_eq!(session.last_sample(), None);

        // Une capture d'une activation précédente reste périmée
        // A capture from an earlier activation stays stale
        let old = session.toggle().await;
        assert_eq!(old, Transition::Activated);
        assert_eq!(
            session.finish_capture(pending.ticket, Ok("#abcdef".into())),
            CaptureOutcome::Stale
        );
    }

    #[tokio::test]
    async fn test_no_capture_while_inactive() {
        let (mut session, _) = session(None);
        assert!(session.begin_capture().is_none());
        assert!(session.sample().await.is_none());
        assert_eq!(session.commit().await, CommitOutcome::Inactive);
        assert_eq!(session.escape(), Transition::Unchanged);
    }

    // -------------------------------------------------------------------------
    // Retour et erreurs / Feedback and errors
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_clipboard_failure_still_deactivates() {
        let (mut session, world) = session(Some("hsla"));
        world.borrow_mut().clipboard_fails = true;
        session.toggle().await;
        capture(&mut session, &world, Ok("#336699")).await;

        let text = "hsla(210, 50%, 40%, 1.00)".to_string();
        assert_eq!(session.commit().await, CommitOutcome::CopyFailed(text.clone()));
        assert_eq!(session.state(), PickerState::Inactive);
        assert!(world.borrow().shown.contains(&Shown::CopyFailed(text)));
        assert!(!world.borrow().shown.iter().any(|s| matches!(s, Shown::Copied(_))));
    }

    #[tokio::test]
    async fn test_unsupported_sampler_reports_and_stays_inactive() {
        let (mut session, world) = session_with(
            Box::new(Preferences::new(MemoryStore::new())),
            Capability::Unsupported,
        );

        assert_eq!(session.toggle().await, Transition::Unsupported);
        assert_eq!(session.state(), PickerState::Inactive);
        assert_eq!(world.borrow().shown, vec![Shown::Unsupported]);
        assert!(world.borrow().listeners.is_empty());
    }

    #[tokio::test]
    async fn test_escape_deactivates_without_copy() {
        let (mut session, world) = session(Some("rgb"));
        session.toggle().await;
        capture(&mut session, &world, Ok("#010203")).await;

        assert_eq!(session.escape(), Transition::Deactivated);
        assert!(world.borrow().clipboard.is_empty());
        assert!(world.borrow().listeners.is_empty());
    }

    #[tokio::test]
    async fn test_format_change_rerenders_preview() {
        let (mut session, world) = session(Some("hex"));
        session.toggle().await;
        capture(&mut session, &world, Ok("#336699")).await;

        session.set_format(ColorFormat::Hsl);
        assert_eq!(
            world.borrow().shown.last(),
            Some(&Shown::Preview("hsl(210, 50%, 40%)".into()))
        );
        assert_eq!(session.commit().await, CommitOutcome::Copied("hsl(210, 50%, 40%)".into()));
    }

    #[tokio::test]
    async fn test_sequential_sample() {
        let (mut session, world) = session(Some("rgba"));
        session.toggle().await;

        // Attend le capteur / Waits for the sampler
        let sampling = session.sample();
        tokio::pin!(sampling);
        assert!(poll_once(&mut sampling).await.is_none());
        resolve(&world, 0, Ok("#808080"));
        let outcome = sampling.await.unwrap();
        assert!(matches!(outcome, CaptureOutcome::Applied(ref p) if p.text == "rgba(128, 128, 128, 1.00)"));
    }

    /// Polls a future once, returning its output if it is already ready
    async fn poll_once<F: std::future::Future + Unpin>(fut: &mut F) -> Option<F::Output> {
        tokio::select! {
            biased;
            out = fut => Some(out),
            _ = std::future::ready(()) => None,
        }
    }
}
