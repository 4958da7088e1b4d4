//! Configuration constants shared by both contexts
//!
//! These values control the defaults and the storage layout of the picker.

use std::path::PathBuf;

use crate::color::ColorFormat;

/// Format used when nothing valid is stored
/// Format utilisé quand rien de valide n'est stocké
pub const DEFAULT_COLOR_FORMAT: ColorFormat = ColorFormat::Hex;

/// Key under which the selected format is stored
/// Clé sous laquelle le format choisi est stocké
pub const COLOR_FORMAT_KEY: &str = "colorFormat";

/// Number of decimal digits of the alpha field in rgba / hsla output
/// Example: a = 128 gives "0.50"
pub const ALPHA_DECIMALS: usize = 2;

/// Environment variable pointing to the JSON settings file
/// Variable d'environnement pointant vers le fichier de réglages JSON
pub const SETTINGS_PATH_ENV: &str = "EYEDROPPER_SETTINGS";

/// Path of the settings file, if one is configured
/// Chemin du fichier de réglages, s'il est configuré
pub fn settings_path() -> Option<PathBuf> {
    std::env::var_os(SETTINGS_PATH_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
