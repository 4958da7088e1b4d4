//! =============================================================================
//! COMMON.RS - Types partagés par la session et ses collaborateurs
//! COMMON.RS - Types shared by the session and its collaborators
//! =============================================================================

use bigcolor::BigColor;

use crate::color::{self, ColorFormat, ColorSample};

// =============================================================================
// ÉTATS ET DÉCLENCHEURS
// STATES AND TRIGGERS
// =============================================================================

/// État de la session de capture
/// Picker session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickerState {
    #[default]
    Inactive,
    Active,
}

/// Ce que l'hôte sait faire pour capturer un pixel
/// What the host can do to capture a pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Supported,
    Unsupported,
}

/// Déclencheurs écoutés pendant qu'une session est active
/// Triggers listened to while a session is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Mouvement du pointeur : nouvelle capture / Pointer move: new capture
    PointerMove,
    /// Clic : copie / Click: copy
    Click,
    /// Échap : annule / Escape: cancel
    Escape,
}

impl Trigger {
    pub const ALL: [Trigger; 3] = [Trigger::PointerMove, Trigger::Click, Trigger::Escape];
}

/// Identifiant d'écouteur rendu par l'hôte
/// Listener handle returned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Événement livré par l'hôte à un écouteur enregistré
/// Event delivered by the host to a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    PointerMoved,
    Clicked,
    Escaped,
}

/// Ticket d'une demande de capture ; seul le dernier peut modifier la session
/// Ticket of one capture request; only the latest one may update the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureTicket(pub(crate) u64);

// =============================================================================
// APERÇU
// PREVIEW
// =============================================================================

/// Données d'aperçu envoyées à la loupe
/// Preview data sent to the magnifier
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub sample: ColorSample,

    /// Texte dans le format courant / Text in the current format
    pub text: String,

    /// Toujours en hex, pour la bordure / Always hex, for the border
    pub hex: String,

    /// Couleur sombre : l'étiquette doit être claire
    /// Dark color: the label must be light
    pub is_dark: bool,
}

impl Preview {
    pub fn new(sample: ColorSample, format: ColorFormat) -> Self {
        let ColorSample { r, g, b, .. } = sample;
        Self {
            sample,
            text: color::render(sample, format),
            hex: sample.to_hex(),
            is_dark: BigColor::from_rgb(r, g, b, 1.0).is_dark(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
