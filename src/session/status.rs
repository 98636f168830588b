use chrono::Local;
use std::sync::Mutex;

pub const STATUS_PREFIX: &str = "Keyboard Lang";

pub fn status_text(code: &str) -> String {
    format!("{STATUS_PREFIX}: {code}")
}

/// One visible status indicator.
pub trait StatusItem: Send + Sync {
    fn show(&self);
    fn set_text(&self, text: &str);
    fn text(&self) -> String;
    fn dispose(&self);
}

/// Creates status indicators.
pub trait StatusBar: Send + Sync {
    fn create_item(&self) -> Box<dyn StatusItem>;
}

pub struct ConsoleStatusBar;

impl StatusBar for ConsoleStatusBar {
    fn create_item(&self) -> Box<dyn StatusItem> {
        Box::new(ConsoleStatusItem::default())
    }
}

/// Prints the indicator text whenever it changes.
#[derive(Default)]
pub struct ConsoleStatusItem {
    text: Mutex<String>,
}

impl StatusItem for ConsoleStatusItem {
    fn show(&self) {
        tracing::debug!("status indicator shown");
    }

    fn set_text(&self, text: &str) {
        let Ok(mut current) = self.text.lock() else {
            return;
        };
        tracing::debug!(text, "status tick");
        if *current != text {
            println!("[{}] {}", Local::now().format("%H:%M:%S"), text);
            *current = text.to_string();
        }
    }

    fn text(&self) -> String {
        self.text.lock().map(|t| t.clone()).unwrap_or_default()
    }

    fn dispose(&self) {
        if let Ok(mut current) = self.text.lock() {
            current.clear();
        }
        tracing::debug!("status indicator disposed");
    }
}
