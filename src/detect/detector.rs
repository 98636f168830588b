use async_trait::async_trait;
use regex::Regex;
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{LangCursorError, Result};
use crate::platform::command::{DetectionCommand, PlatformKind, resolve_command};

pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 2000;

static LANGUAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)abc|korea").expect("static pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCode {
    Korean,
    Other,
}

impl LanguageCode {
    pub fn code(&self) -> &'static str {
        match self {
            LanguageCode::Korean => "ko",
            LanguageCode::Other => "en",
        }
    }
}

/// Classifies raw input-method output. Only the leftmost `abc|korea` match
/// counts, so an `ABC` source listed before a Korean one reads as Other.
pub fn classify(output: &str) -> LanguageCode {
    match LANGUAGE_PATTERN.find(output) {
        Some(m) if m.as_str().to_lowercase() == "korea" => LanguageCode::Korean,
        _ => LanguageCode::Other,
    }
}

#[async_trait]
pub trait LanguageSource: Send + Sync {
    /// Never fails: anything that goes wrong resolves to `LanguageCode::Other`.
    async fn detect(&self) -> LanguageCode;
}

/// Runs the platform's detection command and greps its stdout.
pub struct ShellDetector {
    command: Option<DetectionCommand>,
    command_timeout: Duration,
}

impl ShellDetector {
    pub fn new(platform: PlatformKind, command_timeout: Duration) -> Self {
        Self {
            command: resolve_command(platform).ok(),
            command_timeout,
        }
    }

    pub fn with_command(command: DetectionCommand, command_timeout: Duration) -> Self {
        Self {
            command: Some(command),
            command_timeout,
        }
    }

    /// Raw stdout of the detection command.
    pub async fn query(&self) -> Result<String> {
        let Some(detection) = &self.command else {
            return Err(LangCursorError::UnsupportedPlatform(
                std::env::consts::OS.to_string(),
            ));
        };

        let mut command = Command::new(detection.shell);
        command
            .args(detection.shell_args)
            .arg(detection.command)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = timeout(self.command_timeout, command.output())
            .await
            .map_err(|_| LangCursorError::CommandTimedOut(self.command_timeout.as_millis() as u64))??;

        if !output.status.success() {
            return Err(LangCursorError::CommandFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl LanguageSource for ShellDetector {
    async fn detect(&self) -> LanguageCode {
        match self.query().await {
            Ok(stdout) => classify(&stdout),
            Err(LangCursorError::UnsupportedPlatform(os)) => {
                tracing::debug!(os = %os, "no detection command for this platform");
                LanguageCode::Other
            }
            Err(e) => {
                let command = self.command.as_ref().map(|c| c.command).unwrap_or_default();
                tracing::warn!(command, error = %e, "input method detection failed");
                LanguageCode::Other
            }
        }
    }
}
