// =============================================================================
// lib.rs - Cœur du sélecteur de couleur / Color picker core
// =============================================================================
//
// Deux contextes indépendants, reliés uniquement par messages :
// Two independent contexts, linked by messages only:
//
//   background  --activate-picker / format-changed-->  foreground
//   foreground  --get-color-format (request)-------->  background
//
// Le premier plan possède la `PickerSession` : capture -> rendu -> presse-papiers.
// The foreground owns the `PickerSession`: capture -> render -> clipboard.

// =============================================================================
// MODULES
// =============================================================================

/// Configuration partagée (constantes)
/// Shared configuration (constants)
pub mod config;

/// Conversion des couleurs (hex, rgb, rgba, hsl, hsla)
/// Color conversion (hex, rgb, rgba, hsl, hsla)
pub mod color;

/// Erreurs des collaborateurs
/// Collaborator errors
pub mod error;

/// Stockage des préférences
/// Preference storage
pub mod store;

/// Presse-papiers
/// Clipboard
pub mod clipboard;

/// Messages entre contextes
/// Messages between contexts
pub mod messages;

/// Session de capture et ses collaborateurs
/// Picker session and its collaborators
pub mod picker;

/// Contexte d'arrière-plan
/// Background context
pub mod background;

/// Contexte de premier plan
/// Foreground context
pub mod foreground;

pub use background::Background;
pub use color::{render, rgb_to_hsl, ColorFormat, ColorSample};
pub use foreground::Foreground;
pub use picker::{PickerSession, PickerState};

// =============================================================================
// INITIALISATION
// INITIALIZATION
// =============================================================================

/// Installe le logger (lit `RUST_LOG`, `info` par défaut)
/// Installs the logger (reads `RUST_LOG`, `info` by default)
///
/// Calling it more than once is harmless.
pub fn init_logging() {
    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}
