// =============================================================================
// picker/mod.rs - Module de capture de couleur / Color picker module
// =============================================================================

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::color::ColorFormat;
use crate::error::{ChannelError, SamplerError};
use crate::messages::{ContextLink, FormatResponse, Message};
use crate::store::{Preferences, SettingsStore};

/// Types partagés (états, déclencheurs, aperçu)
/// Shared types (states, triggers, preview)
pub mod common;

/// Machine à états de la session
/// Session state machine
pub mod session;

pub use common::{Capability, CaptureTicket, HostEvent, ListenerId, PickerState, Preview, Trigger};
pub use session::{CaptureOutcome, Collaborators, CommitOutcome, PendingCapture, PickerSession, Transition};

// =============================================================================
// COLLABORATEURS
// COLLABORATORS
// =============================================================================

/// Capture en cours : résout avec `#RRGGBB` ou échoue
/// Capture in flight: resolves with `#RRGGBB` or fails
pub type CaptureFuture = Pin<Box<dyn Future<Output = Result<String, SamplerError>>>>;

/// Capteur d'écran de l'hôte
/// Host screen sampler
pub trait Sampler {
    fn capability(&self) -> Capability;

    /// Ouvre une capture ; peut rester en attente indéfiniment
    /// Opens a capture; may stay pending indefinitely
    fn open(&self) -> CaptureFuture;
}

/// Capteur des hôtes qui ne peuvent pas lire les pixels de l'écran
/// Sampler for hosts that cannot read screen pixels
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedSampler;

impl Sampler for UnsupportedSampler {
    fn capability(&self) -> Capability {
        Capability::Unsupported
    }

    fn open(&self) -> CaptureFuture {
        Box::pin(async { Err(SamplerError::Unsupported) })
    }
}

/// Affichage : loupe, curseur, retour "copié"
/// Presentation: magnifier, cursor, "copied" feedback
pub trait Presenter {
    /// Affiche la loupe et change le curseur / Shows the magnifier and changes the cursor
    fn show_magnifier(&mut self);

    /// Cache la loupe et restaure le curseur / Hides the magnifier and restores the cursor
    fn hide_magnifier(&mut self);

    fn preview(&mut self, preview: &Preview);

    fn copied(&mut self, text: &str);

    fn copy_failed(&mut self, text: &str);

    /// Signale que la capture d'écran est impossible ici
    /// Reports that screen capture is not possible here
    fn unsupported(&mut self);
}

/// Enregistrement des écouteurs d'événements de l'hôte
/// Registration of host event listeners
pub trait TriggerHost {
    fn register(&mut self, trigger: Trigger) -> ListenerId;
    fn unregister(&mut self, id: ListenerId);
}

/// Source du format choisi par l'utilisateur
/// Source of the user's chosen format
#[async_trait(?Send)]
pub trait FormatSource {
    async fn color_format(&self) -> Result<ColorFormat, ChannelError>;
}

/// Demande le format au contexte d'arrière-plan
/// Asks the background context for the format
#[async_trait(?Send)]
impl FormatSource for ContextLink {
    async fn color_format(&self) -> Result<ColorFormat, ChannelError> {
        let reply: FormatResponse = self.request(&Message::GetColorFormat).await?;
        Ok(reply.format)
    }
}

/// Lit le format directement dans le stockage du même contexte
/// Reads the format straight from storage in the same context
#[async_trait(?Send)]
impl<S: SettingsStore> FormatSource for Preferences<S> {
    async fn color_format(&self) -> Result<ColorFormat, ChannelError> {
        Ok(Preferences::color_format(self).await)
    }
}
