//! Durable credential storage for the access/refresh token pair.

use std::sync::Mutex;

use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "embarca";

const ACCESS_KEY: &str = "access-token";
const REFRESH_KEY: &str = "refresh-token";

/// Key-value persistence for the credential pair.
///
/// `store_pair` writes both credentials together; callers never observe a
/// partially written pair through this interface.
pub trait CredentialStore: Send + Sync {
    fn access_credential(&self) -> Result<Option<String>>;
    fn refresh_credential(&self) -> Result<Option<String>>;
    fn store_pair(&self, access: &str, refresh: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Credential store backed by the OS keychain.
pub struct KeyringStore;

impl KeyringStore {
    pub fn new() -> Self {
        Self
    }

    fn read(key: &str) -> Result<Option<String>> {
        let entry = Entry::new(SERVICE_NAME, key).context("Failed to create keyring entry")?;
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read credential from keychain"),
        }
    }

    fn write(key: &str, value: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, key).context("Failed to create keyring entry")?;
        entry
            .set_password(value)
            .context("Failed to store credential in keychain")?;
        Ok(())
    }

    fn delete(key: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, key).context("Failed to create keyring entry")?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete credential from keychain"),
        }
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringStore {
    fn access_credential(&self) -> Result<Option<String>> {
        Self::read(ACCESS_KEY)
    }

    fn refresh_credential(&self) -> Result<Option<String>> {
        Self::read(REFRESH_KEY)
    }

    fn store_pair(&self, access: &str, refresh: &str) -> Result<()> {
        Self::write(ACCESS_KEY, access)?;
        Self::write(REFRESH_KEY, refresh)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        Self::delete(ACCESS_KEY)?;
        Self::delete(REFRESH_KEY)?;
        Ok(())
    }
}

/// In-process credential store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    pair: Mutex<StoredPair>,
}

#[derive(Default)]
struct StoredPair {
    access: Option<String>,
    refresh: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(access: &str, refresh: &str) -> Self {
        let store = Self::new();
        store
            .store_pair(access, refresh)
            .expect("memory store writes cannot fail");
        store
    }

    /// Store holding an access credential but no refresh credential.
    pub fn with_access_only(access: &str) -> Self {
        let store = Self::new();
        store.pair.lock().unwrap().access = Some(access.to_string());
        store
    }
}

impl CredentialStore for MemoryStore {
    fn access_credential(&self) -> Result<Option<String>> {
        Ok(self.pair.lock().unwrap().access.clone())
    }

    fn refresh_credential(&self) -> Result<Option<String>> {
        Ok(self.pair.lock().unwrap().refresh.clone())
    }

    fn store_pair(&self, access: &str, refresh: &str) -> Result<()> {
        let mut pair = self.pair.lock().unwrap();
        pair.access = Some(access.to_string());
        pair.refresh = Some(refresh.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut pair = self.pair.lock().unwrap();
        pair.access = None;
        pair.refresh = None;
        Ok(())
    }
}
