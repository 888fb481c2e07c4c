//! Auth token tiers
//!
//! The token lives in one of two places: a persistent tier ("remember me") and
//! a session tier. In the browser these are `localStorage` and
//! `sessionStorage`; natively both are an in-process map.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

#[cfg(target_arch = "wasm32")]
const TOKEN_KEY: &str = "token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageTier {
    Persistent,
    Session,
}

pub trait TokenStorage {
    fn get(&self, tier: StorageTier) -> Option<String>;
    fn set(&self, tier: StorageTier, token: &str);
    fn remove(&self, tier: StorageTier);
}

/// Returns the stored token, persistent tier first
pub fn read_token(storage: &dyn TokenStorage) -> Option<String> {
    let stored = |tier| storage.get(tier).filter(|token: &String| !token.is_empty());
    stored(StorageTier::Persistent).or_else(|| stored(StorageTier::Session))
}

/// Stores a token in the tier picked by `remember`, clearing the other one
pub fn store_token(storage: &dyn TokenStorage, token: &str, remember: bool) {
    let (keep, drop) = if remember {
        (StorageTier::Persistent, StorageTier::Session)
    } else {
        (StorageTier::Session, StorageTier::Persistent)
    };
    storage.remove(drop);
    storage.set(keep, token);
    log::debug!("Session token stored in {:?} tier", keep);
}

/// Logout: forget the token in both tiers
pub fn clear_token(storage: &dyn TokenStorage) {
    storage.remove(StorageTier::Persistent);
    storage.remove(StorageTier::Session);
}

/// In-process token store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<HashMap<StorageTier, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryStorage {
    fn get(&self, tier: StorageTier) -> Option<String> {
        self.inner.lock().ok()?.get(&tier).cloned()
    }

    fn set(&self, tier: StorageTier, token: &str) {
        if let Ok(mut map) = self.inner.lock() {
            map.insert(tier, token.to_string());
        }
    }

    fn remove(&self, tier: StorageTier) {
        if let Ok(mut map) = self.inner.lock() {
            map.remove(&tier);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
lazy_static::lazy_static! {
    static ref PROCESS_STORAGE: MemoryStorage = MemoryStorage::new();
}

#[cfg(target_arch = "wasm32")]
pub struct BrowserStorage;

#[cfg(target_arch = "wasm32")]
impl BrowserStorage {
    fn area(tier: StorageTier) -> Option<web_sys::Storage> {
        let window = web_sys::window()?;
        let area = match tier {
            StorageTier::Persistent => window.local_storage(),
            StorageTier::Session => window.session_storage(),
        };
        area.ok().flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl TokenStorage for BrowserStorage {
    fn get(&self, tier: StorageTier) -> Option<String> {
        Self::area(tier)?.get_item(TOKEN_KEY).ok().flatten()
    }

    fn set(&self, tier: StorageTier, token: &str) {
        if let Some(area) = Self::area(tier) {
            if let Err(e) = area.set_item(TOKEN_KEY, token) {
                log::error!("Failed to store token: {:?}", e);
            }
        }
    }

    fn remove(&self, tier: StorageTier) {
        if let Some(area) = Self::area(tier) {
            let _ = area.remove_item(TOKEN_KEY);
        }
    }
}

/// The token store for the current platform
pub fn platform_storage() -> Rc<dyn TokenStorage> {
    #[cfg(target_arch = "wasm32")]
    {
        Rc::new(BrowserStorage)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        Rc::new(PROCESS_STORAGE.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistent_tier_checked_first() {
        let storage = MemoryStorage::new();
        storage.set(StorageTier::Session, "session-token");
        assert_eq!(read_token(&storage).as_deref(), Some("session-token"));

        storage.set(StorageTier::Persistent, "remembered-token");
        assert_eq!(read_token(&storage).as_deref(), Some("remembered-token"));
    }

    #[test]
    fn test_store_token_clears_other_tier() {
        let storage = MemoryStorage::new();
        store_token(&storage, "a", true);
        store_token(&storage, "b", false);
        assert_eq!(storage.get(StorageTier::Persistent), None);
        assert_eq!(storage.get(StorageTier::Session).as_deref(), Some("b"));
    }

    #[test]
    fn test_clear_token_removes_both() {
        let storage = MemoryStorage::new();
        storage.set(StorageTier::Persistent, "a");
        storage.set(StorageTier::Session, "b");
        clear_token(&storage);
        assert_eq!(read_token(&storage), None);
    }

    #[test]
    fn test_empty_token_counts_as_missing() {
        let storage = MemoryStorage::new();
        storage.set(StorageTier::Persistent, "");
        assert_eq!(read_token(&storage), None);
    }

    #[test]
    fn test_empty_persistent_entry_falls_through_to_session() {
        let storage = MemoryStorage::new();
        storage.set(StorageTier::Persistent, "");
        storage.set(StorageTier::Session, "session-token");
        assert_eq!(read_token(&storage).as_deref(), Some("session-token"));
    }
}
