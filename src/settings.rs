//! Search settings persisted as JSON inside the profile directory.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config;

/// Selectable search engines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    #[default]
    Google,
    DuckDuckGo,
    Bing,
    Custom,
}

impl SearchEngine {
    /// Engine id as stored in the settings file
    pub fn id(self) -> &'static str {
        match self {
            SearchEngine::Google => "google",
            SearchEngine::DuckDuckGo => "duckduckgo",
            SearchEngine::Bing => "bing",
            SearchEngine::Custom => "custom",
        }
    }

    /// Look up an engine by its stored id
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "google" => Some(SearchEngine::Google),
            "duckduckgo" => Some(SearchEngine::DuckDuckGo),
            "bing" => Some(SearchEngine::Bing),
            "custom" => Some(SearchEngine::Custom),
            _ => None,
        }
    }
}

/// User-configurable settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub search_engine: SearchEngine,
    #[serde(default)]
    pub custom_template: String,
    /// Keys this version does not know about, kept so that loading and
    /// re-saving an older or newer file does not discard them.
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Settings {
    /// URL template for the configured engine. The custom engine returns
    /// whatever template is stored, valid or not.
    pub fn search_template(&self) -> &str {
        if self.search_engine == SearchEngine::Custom {
            return &self.custom_template;
        }
        config::SEARCH_ENGINES
            .iter()
            .find(|(id, _, _)| *id == self.search_engine.id())
            .map(|(_, _, template)| *template)
            .unwrap_or(config::DEFAULT_SEARCH_URL)
    }
}

/// A usable search template carries the placeholder the encoded query is
/// substituted for.
pub fn template_has_placeholder(template: &str) -> bool {
    template.contains(config::SEARCH_PLACEHOLDER)
}

/// Owns the settings for the lifetime of the application. Views hold an
/// `Rc<SettingsStore>` handle; reads go through [`SettingsStore::get`] and
/// every mutation goes through [`SettingsStore::update`], which persists
/// before returning.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    current: RefCell<Settings>,
}

impl SettingsStore {
    /// Load settings from `path`. A missing file yields defaults silently;
    /// an unreadable or malformed file yields defaults with a warning.
    pub fn load(path: PathBuf) -> Self {
        let current = match Self::read(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Failed to load settings from {:?}: {}", path, e);
                Settings::default()
            }
        };
        if !current.extra.is_empty() {
            log::debug!("Keeping {} unrecognized settings keys", current.extra.len());
        }
        Self {
            path,
            current: RefCell::new(current),
        }
    }

    fn read(path: &Path) -> io::Result<Settings> {
        if !path.exists() {
            return Ok(Settings::default());
        }
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Snapshot of the current settings
    pub fn get(&self) -> Settings {
        self.current.borrow().clone()
    }

    /// Apply a mutation and persist the result. Write failures are logged,
    /// never raised.
    pub fn update(&self, f: impl FnOnce(&mut Settings)) {
        f(&mut self.current.borrow_mut());
        if let Err(e) = self.save() {
            log::warn!("Failed to save settings to {:?}: {}", self.path, e);
        }
    }

    fn save(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&*self.current.borrow())?;
        fs::write(&self.path, contents)?;
        log::debug!("Settings saved to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("vireo-settings-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = temp_path("missing");
        let _ = fs::remove_file(&path);
        let store = SettingsStore::load(path);
        assert_eq!(store.get(), Settings::default());
        assert_eq!(store.get().search_engine, SearchEngine::Google);
    }

    #[test]
    fn test_save_load_round_trip() {
        let path = temp_path("round-trip");
        let store = SettingsStore::load(path.clone());
        store.update(|s| {
            s.search_engine = SearchEngine::Custom;
            s.custom_template = "https://search.example/?q=%s".to_string();
        });
        let saved = store.get();

        let reloaded = SettingsStore::load(path.clone());
        assert_eq!(reloaded.get(), saved);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_merge_fills_missing_keys() {
        let path = temp_path("merge");
        fs::write(&path, r#"{"search_engine":"bing"}"#).unwrap();
        let store = SettingsStore::load(path.clone());
        assert_eq!(store.get().search_engine, SearchEngine::Bing);
        assert_eq!(store.get().custom_template, "");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_unknown_keys_survive_save() {
        let path = temp_path("unknown-keys");
        fs::write(
            &path,
            r#"{"search_engine":"duckduckgo","homepage":"https://example.com"}"#,
        )
        .unwrap();
        let store = SettingsStore::load(path.clone());
        store.update(|s| s.search_engine = SearchEngine::Bing);

        let contents = fs::read_to_string(&path).unwrap();
        let value: Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["search_engine"], "bing");
        assert_eq!(value["homepage"], "https://example.com");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_malformed_file_yields_defaults() {
        let path = temp_path("malformed");
        fs::write(&path, "not json at all").unwrap();
        let store = SettingsStore::load(path.clone());
        assert_eq!(store.get(), Settings::default());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_search_template_per_engine() {
        let mut settings = Settings::default();
        assert_eq!(
            settings.search_template(),
            "https://www.google.com/search?q=%s"
        );

        settings.search_engine = SearchEngine::DuckDuckGo;
        assert_eq!(settings.search_template(), "https://duckduckgo.com/?q=%s");

        settings.search_engine = SearchEngine::Bing;
        assert_eq!(
            settings.search_template(),
            "https://www.bing.com/search?q=%s"
        );

        settings.search_engine = SearchEngine::Custom;
        settings.custom_template = "https://search.example/?q=%s".to_string();
        assert_eq!(settings.search_template(), "https://search.example/?q=%s");
    }

    #[test]
    fn test_template_has_placeholder() {
        assert!(template_has_placeholder("https://search.example/?q=%s"));
        assert!(!template_has_placeholder("https://search.example/?q="));
        assert!(!template_has_placeholder(""));
    }

    #[test]
    fn test_engine_id_round_trip() {
        for &(id, _, _) in config::SEARCH_ENGINES {
            let engine = SearchEngine::from_id(id).unwrap();
            assert_eq!(engine.id(), id);
        }
        assert_eq!(SearchEngine::from_id("altavista"), None);
    }
}
