use crate::detect::detector::LanguageCode;

pub const ACTIVE_COLOR: &str = "#00ff00";
pub const INACTIVE_COLOR: &str = "#ff0000";

/// Cursor colour per detected language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPolicy {
    pub active: String,
    pub inactive: String,
}

impl Default for ColorPolicy {
    fn default() -> Self {
        Self {
            active: ACTIVE_COLOR.to_string(),
            inactive: INACTIVE_COLOR.to_string(),
        }
    }
}

impl ColorPolicy {
    pub fn new(active: impl Into<String>, inactive: impl Into<String>) -> Self {
        Self {
            active: active.into(),
            inactive: inactive.into(),
        }
    }

    pub fn color_for(&self, code: LanguageCode) -> &str {
        match code {
            LanguageCode::Korean => &self.active,
            LanguageCode::Other => &self.inactive,
        }
    }
}
