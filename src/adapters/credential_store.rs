use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::domain::DomainError;
use crate::ports::CredentialStore;

/// Name of the credential file inside the data directory: the one
/// well-known key the application stores.
const CREDENTIAL_FILE: &str = "api_key";

/// File-backed credential store holding the single API key string.
///
/// The key is re-read on every access so a settings edit takes effect
/// before the next remote call. The value itself is never logged.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            path: data_dir.join(CREDENTIAL_FILE),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn api_key(&self) -> Option<String> {
        let content = fs::read_to_string(&self.path).ok()?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn set_api_key(&self, key: &str) -> Result<(), DomainError> {
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(DomainError::Config("API key must not be empty".to_string()));
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, trimmed)?;
        info!("API key saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().to_path_buf());
        assert!(store.api_key().is_none());
    }

    #[test]
    fn test_roundtrip_trims_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().to_path_buf());
        store.set_api_key("  sk-abc123  ").unwrap();
        assert_eq!(store.api_key().unwrap(), "sk-abc123");
    }

    #[test]
    fn test_empty_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().to_path_buf());
        assert!(store.set_api_key("   ").is_err());
        assert!(store.api_key().is_none());
    }

    #[test]
    fn test_edit_takes_effect_on_next_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().to_path_buf());
        store.set_api_key("sk-old").unwrap();
        store.set_api_key("sk-new").unwrap();
        assert_eq!(store.api_key().unwrap(), "sk-new");
    }
}
