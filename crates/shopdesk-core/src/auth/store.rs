use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use keyring::Entry;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Fixed key the credential token is persisted under
pub const TOKEN_KEY: &str = "token";

/// Keyring service name
const SERVICE_NAME: &str = "shopdesk";

/// Token file name in the config directory
const TOKEN_FILE: &str = "session.json";

/// Durable home of the credential token across restarts.
///
/// The token is the only piece of session state that is persisted.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, token: &str) -> Result<()>;
    /// Remove the record. Removing an absent record is not an error.
    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenRecord {
    token: String,
}

/// Stores the token as a small JSON file.
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }

    fn read(path: &Path) -> Result<TokenRecord> {
        let contents = std::fs::read_to_string(path).context("Failed to read session file")?;
        serde_json::from_str(&contents).context("Failed to parse session file")
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let record = Self::read(&path)?;
        if record.token.is_empty() {
            return Ok(None);
        }
        Ok(Some(record.token))
    }

    fn save(&self, token: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir).context("Failed to create session directory")?;
        let record = TokenRecord {
            token: token.to_string(),
        };
        let contents = serde_json::to_string_pretty(&record)?;
        std::fs::write(self.path(), contents).context("Failed to write session file")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

/// Stores the token in the OS keychain under a fixed entry.
pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(&self.service, TOKEN_KEY).context("Failed to create keyring entry")
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<String>> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        self.entry()?
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

/// Process-local store. Nothing survives the process; useful for tests and
/// for `--ephemeral` runs.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.token.lock().clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.token.lock() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.token.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(dir.path().join("nested"));

        assert_eq!(store.load().unwrap(), None);

        store.save("abc123").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc123"));

        // A fresh store over the same directory sees the record
        let reopened = FileTokenStore::new(dir.path().join("nested"));
        assert_eq!(reopened.load().unwrap().as_deref(), Some("abc123"));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_clear_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(dir.path());
        store.clear().unwrap();
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_rejects_corrupt_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(dir.path());
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().is_err());
    }

    #[test]
    fn test_keyring_store_survives_fresh_handle() {
        let service = "shopdesk-test";
        let store = KeyringTokenStore::with_service(service);
        if let Err(e) = store.save("T") {
            eprintln!("skipping, no keychain available: {:#}", e);
            return;
        }

        // A second handle stands in for the next process
        let reopened = KeyringTokenStore::with_service(service);
        let loaded = reopened.load();
        reopened.clear().unwrap();

        assert_eq!(loaded.unwrap().as_deref(), Some("T"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryTokenStore::with_token("T");
        assert_eq!(store.load().unwrap().as_deref(), Some("T"));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
