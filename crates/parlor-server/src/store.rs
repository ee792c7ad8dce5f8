//! Widget configuration storage.
//!
//! A capability-style key/value store injected into the handlers. The only
//! implementation today keeps configs in process memory, which covers the
//! dashboard's preview workflow; a persistent backend can slot in behind the
//! same trait.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Appearance and behavior settings for one embedded widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    #[serde(default = "default_position")]
    pub position: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_privacy_approach")]
    pub privacy_approach: String,
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
    #[serde(default = "default_true")]
    pub show_powered_by: bool,
    #[serde(default = "default_true")]
    pub show_close_button: bool,
    #[serde(default = "default_true")]
    pub show_refresh_button: bool,
    #[serde(default = "default_true")]
    pub show_settings_button: bool,
    #[serde(default)]
    pub custom_styles: Map<String, Value>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            position: default_position(),
            width: default_width(),
            height: default_height(),
            privacy_approach: default_privacy_approach(),
            bot_name: default_bot_name(),
            show_powered_by: true,
            show_close_button: true,
            show_refresh_button: true,
            show_settings_button: true,
            custom_styles: Map::new(),
        }
    }
}

fn default_position() -> String {
    "right".to_string()
}

fn default_width() -> u32 {
    400
}

fn default_height() -> u32 {
    700
}

fn default_privacy_approach() -> String {
    "passive".to_string()
}

fn default_bot_name() -> String {
    "Chat Assistent".to_string()
}

fn default_true() -> bool {
    true
}

pub trait ConfigStore: Send + Sync {
    fn get(&self, key: &str) -> Option<WidgetConfig>;
    fn put(&self, key: &str, value: WidgetConfig);
}

/// Process-local store; contents live and die with the hosting process.
#[derive(Default)]
pub struct MemoryConfigStore {
    entries: Mutex<HashMap<String, WidgetConfig>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, key: &str) -> Option<WidgetConfig> {
        self.entries
            .lock()
            .expect("config store lock poisoned")
            .get(key)
            .cloned()
    }

    fn put(&self, key: &str, value: WidgetConfig) {
        self.entries
            .lock()
            .expect("config store lock poisoned")
            .insert(key.to_string(), value);
    }
}
