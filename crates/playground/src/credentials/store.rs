//! Provider-partitioned API key store.
//!
//! Layout in the underlying storage:
//! - `api_keys_<provider>`: JSON array of [`ApiKeyEntry`], insertion ordered
//! - `selected_key_<provider>`: id of the selected entry
//! - `system_prompt_<provider>`: trimmed, non-empty system prompt

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ulid::Ulid;

use super::error::StorageError;
use super::storage::{MemoryStorage, SessionStorage};
use crate::provider::Provider;

// ============================================================================
// ApiKeyEntry
// ============================================================================

/// A named API key stored for one provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyEntry {
    pub id: String,
    pub name: String,
    pub key: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl fmt::Debug for ApiKeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyEntry")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("key", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

// ============================================================================
// CredentialStore
// ============================================================================

/// Credential store over an injected [`SessionStorage`].
///
/// No method returns an error. When the storage medium fails, reads return
/// empty values and mutations are abandoned before anything is written.
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn SessionStorage>,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    /// A store backed by fresh [`MemoryStorage`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// All keys for `provider`, in insertion order.
    pub fn list_keys(&self, provider: Provider) -> Vec<ApiKeyEntry> {
        degrade(provider, "list_keys", self.load_keys(provider))
    }

    /// The secret for `key_id`, or the first stored secret when no id is given.
    pub fn get_key(&self, provider: Provider, key_id: Option<&str>) -> Option<String> {
        let keys = self.list_keys(provider);
        let entry = match key_id.filter(|id| !id.is_empty()) {
            Some(id) => keys.into_iter().find(|k| k.id == id),
            None => keys.into_iter().next(),
        };
        entry.map(|e| e.key).filter(|k| !k.is_empty())
    }

    /// The selected key id. A selection pointing at a missing entry is
    /// repaired to the first entry, or cleared when none remain.
    pub fn get_selected_key_id(&self, provider: Provider) -> Option<String> {
        degrade(provider, "get_selected_key_id", self.try_selected(provider))
    }

    /// Select `key_id`, or clear the selection with `None`.
    pub fn set_selected_key_id(&self, provider: Provider, key_id: Option<&str>) {
        degrade(
            provider,
            "set_selected_key_id",
            self.write_selection(provider, key_id),
        )
    }

    /// Store a new key and return its id.
    ///
    /// Callers must reject secrets that are empty after trimming. The secret
    /// and name are stored trimmed. Without a name, or with a blank one, the
    /// entry is called `Key N`. The first key for a provider becomes
    /// the selected key. Returns `None` when nothing could be stored.
    pub fn add_key(&self, provider: Provider, secret: &str, name: Option<&str>) -> Option<String> {
        degrade(
            provider,
            "add_key",
            self.try_add(provider, secret, name).map(Some),
        )
    }

    /// Remove a key. Removing the selected key selects the first remaining
    /// entry, or clears the selection.
    pub fn remove_key(&self, provider: Provider, key_id: &str) {
        degrade(provider, "remove_key", self.try_remove(provider, key_id))
    }

    /// Replace the display name of a key with the trimmed `name`.
    pub fn rename_key(&self, provider: Provider, key_id: &str, name: &str) {
        degrade(provider, "rename_key", self.try_rename(provider, key_id, name))
    }

    /// The stored system prompt, or an empty string.
    pub fn get_system_prompt(&self, provider: Provider) -> String {
        degrade(
            provider,
            "get_system_prompt",
            self.storage.get_item(&system_prompt_key(provider)),
        )
        .unwrap_or_default()
    }

    /// Store the trimmed prompt. A blank prompt removes the stored value.
    pub fn set_system_prompt(&self, provider: Provider, prompt: &str) {
        let prompt = prompt.trim();
        let key = system_prompt_key(provider);
        let result = if prompt.is_empty() {
            self.storage.remove_item(&key)
        } else {
            self.storage.set_item(&key, prompt)
        };
        degrade(provider, "set_system_prompt", result)
    }

    // ------------------------------------------------------------------------
    // Fallible internals
    // ------------------------------------------------------------------------

    fn load_keys(&self, provider: Provider) -> Result<Vec<ApiKeyEntry>, StorageError> {
        let Some(raw) = self.storage.get_item(&keys_key(provider))? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(keys) => Ok(keys),
            Err(e) => {
                warn!(%provider, error = %e, "Stored API keys are malformed, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    fn save_keys(&self, provider: Provider, keys: &[ApiKeyEntry]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(keys).map_err(|e| StorageError::Backend(e.to_string()))?;
        self.storage.set_item(&keys_key(provider), &raw)
    }

    fn write_selection(&self, provider: Provider, key_id: Option<&str>) -> Result<(), StorageError> {
        let key = selected_key(provider);
        match key_id.filter(|id| !id.is_empty()) {
            Some(id) => self.storage.set_item(&key, id),
            None => self.storage.remove_item(&key),
        }
    }

    fn try_selected(&self, provider: Provider) -> Result<Option<String>, StorageError> {
        let Some(selected) = self.storage.get_item(&selected_key(provider))? else {
            return Ok(None);
        };
        let keys = self.load_keys(provider)?;
        if keys.iter().any(|k| k.id == selected) {
            return Ok(Some(selected));
        }

        let repaired = keys.first().map(|k| k.id.clone());
        debug!(%provider, stale = %selected, "Repairing dangling key selection");
        self.write_selection(provider, repaired.as_deref())?;
        Ok(repaired)
    }

    fn try_add(
        &self,
        provider: Provider,
        secret: &str,
        name: Option<&str>,
    ) -> Result<String, StorageError> {
        let mut keys = self.load_keys(provider)?;
        let id = unique_id(&keys);
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
            .unwrap_or_else(|| format!("Key {}", keys.len() + 1));

        keys.push(ApiKeyEntry {
            id: id.clone(),
            name,
            key: secret.trim().to_string(),
            created_at: Utc::now().timestamp_millis(),
        });
        self.save_keys(provider, &keys)?;

        if keys.len() == 1
            && let Err(e) = self.write_selection(provider, Some(&id))
        {
            warn!(%provider, error = %e, "Failed to auto-select first API key");
        }

        debug!(%provider, key_id = %id, "Added API key");
        Ok(id)
    }

    fn try_remove(&self, provider: Provider, key_id: &str) -> Result<(), StorageError> {
        let keys = self.load_keys(provider)?;
        let before = keys.len();
        let remaining: Vec<ApiKeyEntry> = keys.into_iter().filter(|k| k.id != key_id).collect();
        if remaining.len() == before {
            return Ok(());
        }
        self.save_keys(provider, &remaining)?;

        let selected = self.storage.get_item(&selected_key(provider))?;
        if selected.as_deref() == Some(key_id) {
            self.write_selection(provider, remaining.first().map(|k| k.id.as_str()))?;
        }

        debug!(%provider, key_id, "Removed API key");
        Ok(())
    }

    fn try_rename(&self, provider: Provider, key_id: &str, name: &str) -> Result<(), StorageError> {
        let mut keys = self.load_keys(provider)?;
        let Some(entry) = keys.iter_mut().find(|k| k.id == key_id) else {
            return Ok(());
        };
        entry.name = name.trim().to_string();
        self.save_keys(provider, &keys)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn keys_key(provider: Provider) -> String {
    format!("api_keys_{provider}")
}

fn selected_key(provider: Provider) -> String {
    format!("selected_key_{provider}")
}

fn system_prompt_key(provider: Provider) -> String {
    format!("system_prompt_{provider}")
}

/// Time-ordered id with a random tail, unique within `existing`.
fn unique_id(existing: &[ApiKeyEntry]) -> String {
    loop {
        let id = Ulid::new().to_string().to_lowercase();
        if !existing.iter().any(|e| e.id == id) {
            return id;
        }
    }
}

fn degrade<T: Default>(
    provider: Provider,
    operation: &'static str,
    result: Result<T, StorageError>,
) -> T {
    result.unwrap_or_else(|e| {
        warn!(%provider, operation, error = %e, "Credential storage degraded");
        T::default()
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::credentials::UnavailableStorage;

    /// Reads from a memory store, fails every write.
    struct ReadOnlyStorage(MemoryStorage);

    impl SessionStorage for ReadOnlyStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get_item(key)
        }

        fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Backend("quota exceeded".to_string()))
        }

        fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Backend("quota exceeded".to_string()))
        }
    }

    fn store_with(storage: &Arc<MemoryStorage>) -> CredentialStore {
        CredentialStore::new(storage.clone())
    }

    #[test]
    fn add_then_get_by_id() {
        let store = CredentialStore::in_memory();
        let id = store
            .add_key(Provider::Gemini, "secret123", Some("mykey"))
            .unwrap();

        assert_eq!(
            store.get_key(Provider::Gemini, Some(&id)).as_deref(),
            Some("secret123")
        );
        let keys = store.list_keys(Provider::Gemini);
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].name, "mykey");
    }

    #[test]
    fn add_trims_secret_and_auto_names() {
        let store = CredentialStore::in_memory();
        store.add_key(Provider::Gemini, "  k1  ", None);
        store.add_key(Provider::Gemini, "k2", Some("   "));
        store.add_key(Provider::Gemini, "k3", Some("  work  "));

        let keys = store.list_keys(Provider::Gemini);
        assert_eq!(keys[0].key, "k1");
        assert_eq!(keys[0].name, "Key 1");
        assert_eq!(keys[1].name, "Key 2");
        assert_eq!(keys[2].name, "work");
    }

    #[test]
    fn first_key_is_auto_selected() {
        let store = CredentialStore::in_memory();
        assert_eq!(store.get_selected_key_id(Provider::Gemini), None);

        let first = store.add_key(Provider::Gemini, "a", None).unwrap();
        let _second = store.add_key(Provider::Gemini, "b", None).unwrap();

        assert_eq!(store.get_selected_key_id(Provider::Gemini), Some(first));
    }

    #[test]
    fn ids_are_unique_and_count_tracks_adds_minus_removes() {
        let store = CredentialStore::in_memory();
        let mut ids = Vec::new();
        for i in 0..40 {
            ids.push(store.add_key(Provider::Claude, &format!("k{i}"), None).unwrap());
        }
        for id in ids.iter().step_by(3) {
            store.remove_key(Provider::Claude, id);
        }

        let keys = store.list_keys(Provider::Claude);
        assert_eq!(keys.len(), 40 - 14);
        let unique: HashSet<&str> = keys.iter().map(|k| k.id.as_str()).collect();
        assert_eq!(unique.len(), keys.len());
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 40);
    }

    #[test]
    fn duplicate_secrets_are_kept() {
        let store = CredentialStore::in_memory();
        store.add_key(Provider::Gpt, "same", None);
        store.add_key(Provider::Gpt, "same", None);
        assert_eq!(store.list_keys(Provider::Gpt).len(), 2);
    }

    #[test]
    fn providers_are_partitioned() {
        let store = CredentialStore::in_memory();
        store.add_key(Provider::Gemini, "g", None);
        store.set_system_prompt(Provider::Gemini, "be brief");

        assert!(store.list_keys(Provider::Gpt).is_empty());
        assert_eq!(store.get_selected_key_id(Provider::Gpt), None);
        assert_eq!(store.get_system_prompt(Provider::Gpt), "");
    }

    #[test]
    fn get_key_without_id_returns_first() {
        let store = CredentialStore::in_memory();
        assert_eq!(store.get_key(Provider::Gemini, None), None);

        store.add_key(Provider::Gemini, "first", None);
        store.add_key(Provider::Gemini, "second", None);
        assert_eq!(
            store.get_key(Provider::Gemini, None).as_deref(),
            Some("first")
        );
        assert_eq!(store.get_key(Provider::Gemini, Some("nope")), None);
    }

    #[test]
    fn removing_selected_key_selects_first_remaining() {
        let store = CredentialStore::in_memory();
        let a = store.add_key(Provider::Gemini, "a", None).unwrap();
        let b = store.add_key(Provider::Gemini, "b", None).unwrap();
        let c = store.add_key(Provider::Gemini, "c", None).unwrap();

        store.set_selected_key_id(Provider::Gemini, Some(&b));
        store.remove_key(Provider::Gemini, &b);
        assert_eq!(store.get_selected_key_id(Provider::Gemini), Some(a.clone()));

        store.remove_key(Provider::Gemini, &a);
        assert_eq!(store.get_selected_key_id(Provider::Gemini), Some(c.clone()));

        store.remove_key(Provider::Gemini, &c);
        assert_eq!(store.get_selected_key_id(Provider::Gemini), None);
        assert!(store.list_keys(Provider::Gemini).is_empty());
    }

    #[test]
    fn removing_unselected_key_keeps_selection() {
        let store = CredentialStore::in_memory();
        let a = store.add_key(Provider::Gemini, "a", None).unwrap();
        let b = store.add_key(Provider::Gemini, "b", None).unwrap();

        store.remove_key(Provider::Gemini, &b);
        assert_eq!(store.get_selected_key_id(Provider::Gemini), Some(a));
    }

    #[test]
    fn removing_unknown_id_is_noop() {
        let store = CredentialStore::in_memory();
        let a = store.add_key(Provider::Gemini, "a", None).unwrap();
        store.remove_key(Provider::Gemini, "does-not-exist");

        assert_eq!(store.list_keys(Provider::Gemini).len(), 1);
        assert_eq!(store.get_selected_key_id(Provider::Gemini), Some(a));
    }

    #[test]
    fn dangling_selection_is_repaired_lazily() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(&storage);
        let a = store.add_key(Provider::Gemini, "a", None).unwrap();

        store.set_selected_key_id(Provider::Gemini, Some("ghost"));
        assert_eq!(store.get_selected_key_id(Provider::Gemini), Some(a.clone()));
        assert_eq!(
            storage.get_item("selected_key_gemini").unwrap(),
            Some(a.clone())
        );

        store.remove_key(Provider::Gemini, &a);
        storage.set_item("selected_key_gemini", "ghost").unwrap();
        assert_eq!(store.get_selected_key_id(Provider::Gemini), None);
        assert_eq!(storage.get_item("selected_key_gemini").unwrap(), None);
    }

    #[test]
    fn clearing_selection() {
        let store = CredentialStore::in_memory();
        store.add_key(Provider::Gemini, "a", None);
        store.set_selected_key_id(Provider::Gemini, None);
        assert_eq!(store.get_selected_key_id(Provider::Gemini), None);
    }

    #[test]
    fn rename_trims_and_ignores_unknown_ids() {
        let store = CredentialStore::in_memory();
        let id = store.add_key(Provider::Gemini, "a", Some("old")).unwrap();

        store.rename_key(Provider::Gemini, &id, "  new name ");
        store.rename_key(Provider::Gemini, "missing", "ignored");

        let keys = store.list_keys(Provider::Gemini);
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].name, "new name");
        assert_eq!(keys[0].key, "a");
    }

    #[test]
    fn system_prompt_is_trimmed_and_blank_clears() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(&storage);

        store.set_system_prompt(Provider::Gemini, "  You are terse.  ");
        assert_eq!(store.get_system_prompt(Provider::Gemini), "You are terse.");

        store.set_system_prompt(Provider::Gemini, "   ");
        assert_eq!(store.get_system_prompt(Provider::Gemini), "");
        assert_eq!(storage.get_item("system_prompt_gemini").unwrap(), None);
    }

    #[test]
    fn entries_serialize_with_camel_case_fields() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(&storage);
        store.add_key(Provider::Gemini, "a", Some("n"));

        let raw = storage.get_item("api_keys_gemini").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value[0]["createdAt"].is_i64());
        assert_eq!(value[0]["name"], "n");
    }

    #[test]
    fn malformed_collection_reads_as_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item("api_keys_gemini", "{not json").unwrap();
        let store = store_with(&storage);

        assert!(store.list_keys(Provider::Gemini).is_empty());
        assert_eq!(store.get_key(Provider::Gemini, None), None);

        let id = store.add_key(Provider::Gemini, "fresh", None).unwrap();
        assert_eq!(store.list_keys(Provider::Gemini).len(), 1);
        assert_eq!(store.get_selected_key_id(Provider::Gemini), Some(id));
    }

    #[test]
    fn unavailable_storage_degrades_to_empty() {
        let store = CredentialStore::new(Arc::new(UnavailableStorage));

        assert!(store.list_keys(Provider::Gemini).is_empty());
        assert_eq!(store.get_key(Provider::Gemini, None), None);
        assert_eq!(store.get_selected_key_id(Provider::Gemini), None);
        assert_eq!(store.add_key(Provider::Gemini, "k", None), None);
        assert_eq!(store.get_system_prompt(Provider::Gemini), "");

        store.set_selected_key_id(Provider::Gemini, Some("x"));
        store.remove_key(Provider::Gemini, "x");
        store.rename_key(Provider::Gemini, "x", "y");
        store.set_system_prompt(Provider::Gemini, "prompt");
    }

    #[test]
    fn failed_writes_leave_data_untouched() {
        let inner = MemoryStorage::new();
        let seeded = CredentialStore::new(Arc::new(MemoryStorage::new()));
        let id = seeded.add_key(Provider::Gemini, "a", Some("keep")).unwrap();
        let raw = serde_json::to_string(&seeded.list_keys(Provider::Gemini)).unwrap();
        inner.set_item("api_keys_gemini", &raw).unwrap();
        inner.set_item("selected_key_gemini", &id).unwrap();

        let store = CredentialStore::new(Arc::new(ReadOnlyStorage(inner)));
        assert_eq!(store.add_key(Provider::Gemini, "b", None), None);
        store.remove_key(Provider::Gemini, &id);
        store.rename_key(Provider::Gemini, &id, "changed");

        let keys = store.list_keys(Provider::Gemini);
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].name, "keep");
        assert_eq!(store.get_selected_key_id(Provider::Gemini), Some(id));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let entry = ApiKeyEntry {
            id: "1".to_string(),
            name: "n".to_string(),
            key: "super-secret".to_string(),
            created_at: 0,
        };
        let rendered = format!("{entry:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
