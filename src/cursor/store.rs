use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::{LangCursorError, Result};

pub const COLOR_CUSTOMIZATIONS_KEY: &str = "workbench.colorCustomizations";
pub const CURSOR_FOREGROUND_KEY: &str = "editorCursor.foreground";

/// Where the editor's cursor colour override lives.
#[async_trait]
pub trait ColorStore: Send + Sync {
    async fn cursor_color(&self) -> Result<Option<String>>;

    /// `None` removes the override.
    async fn set_cursor_color(&self, color: Option<&str>) -> Result<()>;
}

/// Global VS Code user settings location for this OS.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("Code").join("User").join("settings.json"))
}

/// The editor's global `settings.json`.
pub struct SettingsFile {
    path: PathBuf,
    // serialises read-modify-write cycles
    lock: Mutex<()>,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_settings(&self) -> Result<Map<String, Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        // settings.json is JSONC: comments and trailing commas are allowed
        let value: Value = json5::from_str(&content).map_err(|e| {
            LangCursorError::Settings(format!("cannot parse {}: {}", self.path.display(), e))
        })?;

        match value {
            Value::Object(map) => Ok(map),
            _ => Err(LangCursorError::Settings(format!(
                "{} is not a JSON object",
                self.path.display()
            ))),
        }
    }

    /// The real file behind `path`, following symlinks when it exists.
    async fn resolve_target(&self) -> Result<PathBuf> {
        match tokio::fs::canonicalize(&self.path).await {
            Ok(target) => Ok(target),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(self.path.clone()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_settings(&self, settings: &Map<String, Value>) -> Result<()> {
        let target = self.resolve_target().await?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        settings.serialize(&mut serializer)?;
        buf.push(b'\n');

        let tmp = target.with_extension("json.lang-cursor.tmp");
        tokio::fs::write(&tmp, &buf).await?;
        if let Ok(metadata) = tokio::fs::metadata(&target).await {
            tokio::fs::set_permissions(&tmp, metadata.permissions()).await?;
        }
        tokio::fs::rename(&tmp, &target).await?;
        Ok(())
    }
}

fn customizations(settings: &Map<String, Value>) -> Result<Option<&Map<String, Value>>> {
    match settings.get(COLOR_CUSTOMIZATIONS_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(LangCursorError::Settings(format!(
            "{COLOR_CUSTOMIZATIONS_KEY} is not an object"
        ))),
    }
}

#[async_trait]
impl ColorStore for SettingsFile {
    async fn cursor_color(&self) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        let settings = self.read_settings().await?;
        let color = customizations(&settings)?
            .and_then(|map| map.get(CURSOR_FOREGROUND_KEY))
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(color)
    }

    async fn set_cursor_color(&self, color: Option<&str>) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut settings = self.read_settings().await?;

        let mut overrides = customizations(&settings)?.cloned().unwrap_or_default();
        match color {
            Some(color) => {
                overrides.insert(CURSOR_FOREGROUND_KEY.to_string(), Value::String(color.to_string()));
            }
            None => {
                overrides.remove(CURSOR_FOREGROUND_KEY);
            }
        }
        settings.insert(COLOR_CUSTOMIZATIONS_KEY.to_string(), Value::Object(overrides));

        self.write_settings(&settings).await?;
        tracing::debug!(path = %self.path.display(), color = ?color, "cursor colour written");
        Ok(())
    }
}
