use regex::Regex;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use crate::cursor::color_policy::{ACTIVE_COLOR, ColorPolicy, INACTIVE_COLOR};
use crate::cursor::store::default_settings_path;
use crate::detect::detector::DEFAULT_COMMAND_TIMEOUT_MS;
use crate::error::{LangCursorError, Result};
use crate::session::controller::DEFAULT_POLL_INTERVAL_MS;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8766";

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
        .expect("static pattern is valid")
});

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub poll_interval_ms: u64,
    pub command_timeout_ms: u64,
    pub active_color: String,
    pub inactive_color: String,
    /// Editor settings file; the VS Code user settings when unset.
    pub settings_path: Option<PathBuf>,
    pub listen_addr: String,
    pub notifications: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
            active_color: ACTIVE_COLOR.to_string(),
            inactive_color: INACTIVE_COLOR.to_string(),
            settings_path: None,
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            notifications: true,
        }
    }
}

impl AppConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn color_policy(&self) -> ColorPolicy {
        ColorPolicy::new(&self.active_color, &self.inactive_color)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen_addr
            .parse()
            .map_err(|e| LangCursorError::Config(format!("invalid listen_addr {:?}: {}", self.listen_addr, e)))
    }

    pub fn settings_path(&self) -> Result<PathBuf> {
        match &self.settings_path {
            Some(path) => Ok(path.clone()),
            None => default_settings_path().ok_or_else(|| {
                LangCursorError::Config("no config directory; set settings_path".into())
            }),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(LangCursorError::Config("poll_interval_ms must be greater than 0".into()));
        }
        if self.command_timeout_ms == 0 {
            return Err(LangCursorError::Config("command_timeout_ms must be greater than 0".into()));
        }
        for color in [&self.active_color, &self.inactive_color] {
            if !HEX_COLOR.is_match(color) {
                return Err(LangCursorError::Config(format!("{color:?} is not a hex colour")));
            }
        }
        if self.active_color.eq_ignore_ascii_case(&self.inactive_color) {
            return Err(LangCursorError::Config(
                "active_color and inactive_color must differ".into(),
            ));
        }
        self.listen_addr()?;
        Ok(())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("lang-cursor").join("config.toml"))
}

pub fn parse_config(content: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Loads `path` if given (it must exist), else the default location if a
/// file is there, else built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => path,
            None => {
                tracing::debug!("no config file, using defaults");
                return Ok(AppConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| LangCursorError::Config(format!("cannot read {}: {}", path.display(), e)))?;
    let config = parse_config(&content)?;
    tracing::info!(path = %path.display(), "config loaded");
    Ok(config)
}
