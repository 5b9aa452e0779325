use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

const ACCESS_TOKEN_KEY: &str = "carnet_google_access_token";
const SPREADSHEET_ID_KEY: &str = "carnet_spreadsheet_id";
const THEME_KEY: &str = "carnet_theme";
const CHANGE_COUNTER_KEY: &str = "carnet_config_version";

pub const THEME_DARK: &str = "dark";
pub const THEME_LIGHT: &str = "light";

/// Key/value persistence seam. The browser backend sits on `localStorage`;
/// tests use the in-memory one.
pub trait StorageBackend {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

pub struct LocalStorageBackend;

impl LocalStorageBackend {
    fn raw(&self) -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok()?
    }
}

impl StorageBackend for LocalStorageBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.raw()?.get_item(key).ok()?
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(storage) = self.raw() {
            let _ = storage.set_item(key, value);
        }
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = self.raw() {
            let _ = storage.remove_item(key);
        }
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    entries: RefCell<HashMap<String, String>>,
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

/// Persisted app configuration: access token, spreadsheet id, theme.
/// Constructed once and cloned into whatever needs it; every mutation bumps
/// a change counter so the UI can poll for external edits instead of
/// listening to platform storage events.
#[derive(Clone)]
pub struct Store {
    backend: Rc<dyn StorageBackend>,
}

impl Store {
    pub fn browser() -> Self {
        Self { backend: Rc::new(LocalStorageBackend) }
    }

    pub fn in_memory() -> Self {
        Self { backend: Rc::new(MemoryBackend::default()) }
    }

    fn get_non_empty(&self, key: &str) -> Option<String> {
        self.backend.get(key).filter(|value| !value.is_empty())
    }

    pub fn access_token(&self) -> Option<String> {
        self.get_non_empty(ACCESS_TOKEN_KEY)
    }

    pub fn set_access_token(&self, token: &str) {
        self.backend.set(ACCESS_TOKEN_KEY, token);
        self.bump();
    }

    pub fn clear_access_token(&self) {
        self.backend.remove(ACCESS_TOKEN_KEY);
        self.bump();
    }

    pub fn spreadsheet_id(&self) -> Option<String> {
        self.get_non_empty(SPREADSHEET_ID_KEY)
    }

    pub fn set_spreadsheet_id(&self, id: &str) {
        self.backend.set(SPREADSHEET_ID_KEY, id);
        self.bump();
    }

    pub fn clear_spreadsheet_id(&self) {
        self.backend.remove(SPREADSHEET_ID_KEY);
        self.bump();
    }

    /// Defaults to dark, like the original stylesheet.
    pub fn theme(&self) -> String {
        self.get_non_empty(THEME_KEY).unwrap_or_else(|| THEME_DARK.to_string())
    }

    pub fn set_theme(&self, theme: &str) {
        self.backend.set(THEME_KEY, theme);
        self.bump();
    }

    /// Monotonic change counter, bumped on every write through this store.
    pub fn version(&self) -> u64 {
        self.backend
            .get(CHANGE_COUNTER_KEY)
            .and_then(|value| value.parse().ok())
            .unwrap_or(0)
    }

    fn bump(&self) {
        let next = self.version() + 1;
        self.backend.set(CHANGE_COUNTER_KEY, &next.to_string());
    }
}
