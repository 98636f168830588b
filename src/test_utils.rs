//! Fakes for the detector, settings, status bar and notifier seams.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cursor::store::{COLOR_CUSTOMIZATIONS_KEY, CURSOR_FOREGROUND_KEY, ColorStore};
use crate::detect::detector::{LanguageCode, LanguageSource};
use crate::error::{LangCursorError, Result};
use crate::session::notify::Notifier;
use crate::session::status::{StatusBar, StatusItem};

/// Polls `cond` until it holds, failing the test after two seconds.
pub async fn wait_until(cond: impl Fn() -> bool) {
    let waited = tokio::time::timeout(Duration::from_secs(2), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "condition not reached in time");
}

pub struct ScriptedSource {
    language: Mutex<LanguageCode>,
}

impl ScriptedSource {
    pub fn new(language: LanguageCode) -> Self {
        Self {
            language: Mutex::new(language),
        }
    }

    pub fn set(&self, language: LanguageCode) {
        *self.language.lock().unwrap() = language;
    }
}

#[async_trait]
impl LanguageSource for ScriptedSource {
    async fn detect(&self) -> LanguageCode {
        *self.language.lock().unwrap()
    }
}

/// In-memory `workbench.colorCustomizations` object.
#[derive(Default)]
pub struct MemoryStore {
    overrides: Mutex<Map<String, Value>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn with_color(color: &str) -> Self {
        let store = Self::default();
        store
            .overrides
            .lock()
            .unwrap()
            .insert(CURSOR_FOREGROUND_KEY.to_string(), Value::String(color.to_string()));
        store
    }

    pub fn current(&self) -> Option<String> {
        self.overrides
            .lock()
            .unwrap()
            .get(CURSOR_FOREGROUND_KEY)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn overrides(&self) -> Map<String, Value> {
        self.overrides.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ColorStore for MemoryStore {
    async fn cursor_color(&self) -> Result<Option<String>> {
        Ok(self.current())
    }

    async fn set_cursor_color(&self, color: Option<&str>) -> Result<()> {
        let mut overrides = self.overrides.lock().unwrap();
        match color {
            Some(color) => {
                overrides.insert(CURSOR_FOREGROUND_KEY.to_string(), Value::String(color.to_string()));
            }
            None => {
                overrides.remove(CURSOR_FOREGROUND_KEY);
            }
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Reads succeed with no override; every write fails.
pub struct FailingStore;

impl FailingStore {
    pub fn failing_writes() -> Self {
        FailingStore
    }
}

#[async_trait]
impl ColorStore for FailingStore {
    async fn cursor_color(&self) -> Result<Option<String>> {
        Ok(None)
    }

    async fn set_cursor_color(&self, _color: Option<&str>) -> Result<()> {
        Err(LangCursorError::Settings(format!(
            "{COLOR_CUSTOMIZATIONS_KEY} is read-only"
        )))
    }
}

#[derive(Default)]
struct ItemState {
    text: String,
    visible: bool,
    sets: usize,
    disposals: usize,
}

#[derive(Clone, Default)]
pub struct RecordingItem {
    state: Arc<Mutex<ItemState>>,
}

impl RecordingItem {
    pub fn is_visible(&self) -> bool {
        self.state.lock().unwrap().visible
    }

    pub fn is_disposed(&self) -> bool {
        self.dispose_count() > 0
    }

    pub fn dispose_count(&self) -> usize {
        self.state.lock().unwrap().disposals
    }

    pub fn set_count(&self) -> usize {
        self.state.lock().unwrap().sets
    }
}

impl StatusItem for RecordingItem {
    fn show(&self) {
        self.state.lock().unwrap().visible = true;
    }

    fn set_text(&self, text: &str) {
        let mut state = self.state.lock().unwrap();
        state.text = text.to_string();
        state.sets += 1;
    }

    fn text(&self) -> String {
        self.state.lock().unwrap().text.clone()
    }

    fn dispose(&self) {
        let mut state = self.state.lock().unwrap();
        state.visible = false;
        state.disposals += 1;
    }
}

#[derive(Default)]
pub struct RecordingStatusBar {
    items: Mutex<Vec<RecordingItem>>,
}

impl RecordingStatusBar {
    pub fn item(&self, index: usize) -> RecordingItem {
        self.items.lock().unwrap()[index].clone()
    }

    pub fn created(&self) -> usize {
        self.items.lock().unwrap().len()
    }
}

impl StatusBar for RecordingStatusBar {
    fn create_item(&self) -> Box<dyn StatusItem> {
        let item = RecordingItem::default();
        self.items.lock().unwrap().push(item.clone());
        Box::new(item)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
