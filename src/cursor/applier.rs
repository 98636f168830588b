use std::sync::Arc;

use crate::cursor::store::ColorStore;
use crate::error::Result;

/// Cursor colour found in the settings before the first session started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorColorState {
    pub color: Option<String>,
}

pub struct CursorColorApplier {
    store: Arc<dyn ColorStore>,
}

impl CursorColorApplier {
    pub fn new(store: Arc<dyn ColorStore>) -> Self {
        Self { store }
    }

    pub async fn capture(&self) -> Result<CursorColorState> {
        let color = self.store.cursor_color().await?;
        tracing::debug!(color = ?color, "captured original cursor colour");
        Ok(CursorColorState { color })
    }

    pub async fn apply(&self, color: &str) -> Result<()> {
        if self.store.cursor_color().await?.as_deref() == Some(color) {
            return Ok(());
        }
        self.store.set_cursor_color(Some(color)).await
    }

    /// Puts back the captured colour, or clears the override when nothing
    /// was captured or the captured state had no colour.
    pub async fn restore(&self, state: Option<&CursorColorState>) -> Result<()> {
        let original = state.and_then(|s| s.color.as_deref());
        tracing::debug!(color = ?original, "restoring cursor colour");
        self.store.set_cursor_color(original).await
    }
}
