// =============================================================================
// clipboard.rs - Presse-papiers / Clipboard
// =============================================================================

use async_trait::async_trait;

use crate::error::ClipboardError;

/// Écriture de texte dans le presse-papiers
/// Writes text to the clipboard
#[async_trait(?Send)]
pub trait Clipboard {
    async fn write(&self, text: &str) -> Result<(), ClipboardError>;
}

/// System clipboard through `arboard`
///
/// A new handle is opened for each write, so nothing is held between picks.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

#[async_trait(?Send)]
impl Clipboard for SystemClipboard {
    async fn write(&self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|err| ClipboardError(err.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|err| ClipboardError(err.to_string()))
    }
}
