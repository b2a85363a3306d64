//! LocalStorage persistence
//!
//! Values are stored as JSON under a fixed key. On native targets there is
//! no storage: loads return `None` and saves are no-ops.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Load a JSON value from LocalStorage (WASM only)
#[cfg(target_arch = "wasm32")]
pub fn load<T: DeserializeOwned>(key: &str) -> Option<T> {
    let storage = web_sys::window()?.local_storage().ok()??;
    let json = storage.get_item(key).ok()??;
    match serde_json::from_str(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring corrupt '{key}' entry: {e}");
            None
        }
    }
}

/// Save a JSON value to LocalStorage (WASM only)
#[cfg(target_arch = "wasm32")]
pub fn save<T: Serialize>(key: &str, value: &T) -> bool {
    let storage = web_sys::window()
        .and_then(|w| w.local_storage().ok())
        .flatten();

    if let Some(storage) = storage {
        match serde_json::to_string(value) {
            Ok(json) => return storage.set_item(key, &json).is_ok(),
            Err(e) => log::warn!("Could not serialize '{key}': {e}"),
        }
    }
    false
}

/// Native stubs
#[cfg(not(target_arch = "wasm32"))]
pub fn load<T: DeserializeOwned>(_key: &str) -> Option<T> {
    None
}

#[cfg(not(target_arch = "wasm32"))]
pub fn save<T: Serialize>(_key: &str, _value: &T) -> bool {
    false
}
