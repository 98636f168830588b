use thiserror::Error;

#[derive(Debug, Error)]
pub enum LangCursorError {
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Detection command failed ({status}): {stderr}")]
    CommandFailed { status: String, stderr: String },

    #[error("Detection command timed out after {0} ms")]
    CommandTimedOut(u64),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Control channel error: {0}")]
    Control(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

pub type Result<T> = std::result::Result<T, LangCursorError>;
