// =============================================================================
// error.rs - Erreurs des collaborateurs / Collaborator errors
// =============================================================================
//
// Aucune de ces erreurs n'est fatale : la session les journalise et continue.
// None of these errors is fatal: the session logs them and carries on.

use thiserror::Error;

/// Texte d'échantillon qui n'est ni `#RRGGBB` ni `#RRGGBBAA`
/// Sample text that is not `#RRGGBB` or `#RRGGBBAA`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid hex color {0:?}")]
pub struct ParseColorError(pub String);

/// Échec d'une capture de l'échantillonneur d'écran
/// Failure of one capture from the screen sampler
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SamplerError {
    /// L'utilisateur a fermé le capteur (Échap, perte du focus)
    /// The user dismissed the sampler (escape, focus loss)
    #[error("capture cancelled")]
    Cancelled,

    /// L'environnement n'a aucune primitive de capture
    /// The environment has no capture primitive
    #[error("screen sampling is not supported here")]
    Unsupported,

    /// Le capteur a rendu autre chose qu'une couleur
    /// The sampler resolved with something that is not a color
    #[error("sampler returned a malformed color: {0}")]
    Malformed(#[from] ParseColorError),
}

/// Échec du stockage des préférences
/// Failure of the preference storage
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings io: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("settings unavailable: {0}")]
    Unavailable(String),
}

/// Échec d'écriture dans le presse-papiers
/// Failure to write the clipboard
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("clipboard: {0}")]
pub struct ClipboardError(pub String);

/// Échec du canal de messages entre deux contextes
/// Failure of the message channel between two contexts
#[derive(Debug, Error)]
pub enum ChannelError {
    /// L'autre contexte a disparu
    /// The other context is gone
    #[error("peer context closed")]
    Closed,

    /// Le destinataire a lâché son répondeur sans répondre
    /// The handler dropped its responder without answering
    #[error("request was dropped without a response")]
    NoResponse,

    #[error("could not encode message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("could not decode message: {0}")]
    Decode(#[source] serde_json::Error),
}
