use notify_rust::Notification;

pub const START_NOTICE: &str = "Cursor colour now follows the keyboard language.";
pub const STOP_NOTICE: &str = "Stopped following the keyboard language; cursor colour restored.";

/// One-time notices shown on start and stop.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

pub struct DesktopNotifier;

fn send_notification(message: &str) -> Result<(), Box<dyn std::error::Error>> {
    Notification::new()
        .summary("Lang Cursor")
        .body(message)
        .show()?;
    Ok(())
}

impl Notifier for DesktopNotifier {
    fn notify(&self, message: &str) {
        let message = message.to_string();
        // notification backends block (D-Bus, COM)
        tokio::task::spawn_blocking(move || {
            if let Err(e) = send_notification(&message) {
                tracing::warn!(error = %e, "failed to send notification");
            }
        });
    }
}

pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, message: &str) {
        tracing::info!("{}", message);
    }
}
