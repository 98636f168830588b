use crate::error::{LangCursorError, Result};

pub const MAC_OS_COMMAND: &str =
    "defaults read ~/Library/Preferences/com.apple.HIToolbox.plist AppleSelectedInputSources";
pub const WINDOWS_COMMAND: &str =
    "Get-WinUserLanguageList | Select-Object -ExpandProperty InputMethodTips";
pub const LINUX_COMMAND: &str = "setxkbmap -query | grep layout";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformKind {
    MacOs,
    Windows,
    Linux,
    Unknown,
}

impl PlatformKind {
    /// Platform of the running process.
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Accepts both Rust's `std::env::consts::OS` names and Node-style ones.
    pub fn from_os(os: &str) -> Self {
        match os {
            "macos" | "darwin" => PlatformKind::MacOs,
            "windows" | "win32" => PlatformKind::Windows,
            "linux" => PlatformKind::Linux,
            _ => PlatformKind::Unknown,
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        match self {
            PlatformKind::MacOs => "macos",
            PlatformKind::Windows => "windows",
            PlatformKind::Linux => "linux",
            PlatformKind::Unknown => "unknown",
        }
    }
}

/// A fixed shell command that prints input-method information to stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionCommand {
    pub command: &'static str,
    pub shell: &'static str,
    pub shell_args: &'static [&'static str],
}

pub fn resolve_command(platform: PlatformKind) -> Result<DetectionCommand> {
    match platform {
        PlatformKind::MacOs => Ok(DetectionCommand {
            command: MAC_OS_COMMAND,
            shell: "sh",
            shell_args: &["-c"],
        }),
        PlatformKind::Windows => Ok(DetectionCommand {
            command: WINDOWS_COMMAND,
            shell: "powershell",
            shell_args: &["-NoProfile", "-NonInteractive", "-Command"],
        }),
        PlatformKind::Linux => Ok(DetectionCommand {
            command: LINUX_COMMAND,
            shell: "sh",
            shell_args: &["-c"],
        }),
        PlatformKind::Unknown => Err(LangCursorError::UnsupportedPlatform(
            std::env::consts::OS.to_string(),
        )),
    }
}
