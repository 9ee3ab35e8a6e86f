use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use crate::config::ConfigError;

pub const TMDB_API_KEY: &str = "TMDB_API_KEY";
pub const STORE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
pub const STORE_SERVICE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
pub const SESSION_SECRET: &str = "SESSION_SECRET";

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

/// Secrets and the persisted session token, kept in `credentials.toml`
pub struct CredentialStore {
    path: PathBuf,
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            credentials: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let creds_data: CredentialsData = toml::from_str(&content)?;
            self.credentials = creds_data.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let creds_data = CredentialsData {
            data: self.credentials.clone(),
        };
        let content = toml::to_string_pretty(&creds_data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.credentials.get(key)
    }

    pub fn set(&mut self, key: String, value: String) {
        self.credentials.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.credentials.remove(key);
    }

    pub fn get_session_token(&self) -> Option<&String> {
        self.get("session_token")
    }

    pub fn set_session_token(&mut self, token: String) {
        self.set("session_token".to_string(), token);
    }

    pub fn clear_session(&mut self) {
        self.remove("session_token");
    }

    pub fn get_all_keys(&self) -> Vec<String> {
        self.credentials.keys().cloned().collect()
    }
}

/// Resolved secrets: environment first, then the credential file
#[derive(Clone, Default)]
pub struct Secrets {
    pub tmdb_api_key: Option<String>,
    pub store_anon_key: Option<String>,
    pub store_service_key: Option<String>,
    pub session_secret: Option<String>,
}

impl Secrets {
    pub fn from_env(store: &CredentialStore) -> Self {
        Self::resolve(|key| std::env::var(key).ok(), store)
    }

    pub fn resolve<F>(lookup: F, store: &CredentialStore) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .or_else(|| store.get(&name.to_lowercase()).cloned())
        };
        Self {
            tmdb_api_key: get(TMDB_API_KEY),
            store_anon_key: get(STORE_ANON_KEY),
            store_service_key: get(STORE_SERVICE_KEY),
            session_secret: get(SESSION_SECRET),
        }
    }

    pub fn tmdb_api_key(&self) -> Result<&str, ConfigError> {
        self.tmdb_api_key.as_deref().ok_or(ConfigError::MissingSecret(TMDB_API_KEY))
    }

    pub fn store_anon_key(&self) -> Result<&str, ConfigError> {
        self.store_anon_key.as_deref().ok_or(ConfigError::MissingSecret(STORE_ANON_KEY))
    }

    pub fn store_service_key(&self) -> Result<&str, ConfigError> {
        self.store_service_key.as_deref().ok_or(ConfigError::MissingSecret(STORE_SERVICE_KEY))
    }

    pub fn session_secret(&self) -> Result<&str, ConfigError> {
        self.session_secret.as_deref().ok_or(ConfigError::MissingSecret(SESSION_SECRET))
    }
}

// Never print secret values
impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "***" } else { "<unset>" };
        f.debug_struct("Secrets")
            .field("tmdb_api_key", &mask(&self.tmdb_api_key))
            .field("store_anon_key", &mask(&self.store_anon_key))
            .field("store_service_key", &mask(&self.store_service_key))
            .field("session_secret", &mask(&self.session_secret))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_credential_store_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let mut store = CredentialStore::new(path.clone());
        store.set_session_token("token".to_string());
        store.set("tmdb_api_key".to_string(), "file_key".to_string());
        store.save().unwrap();

        let mut loaded_store = CredentialStore::new(path);
        loaded_store.load().unwrap();
        assert_eq!(loaded_store.get_session_token(), Some(&"token".to_string()));
        assert_eq!(loaded_store.get("tmdb_api_key"), Some(&"file_key".to_string()));
    }

    #[test]
    fn test_credential_store_clear_session() {
        let mut store = CredentialStore::new(PathBuf::from("/tmp/test"));
        store.set_session_token("token".to_string());
        store.set("key2".to_string(), "value2".to_string());

        store.clear_session();
        assert_eq!(store.get_session_token(), None);
        assert_eq!(store.get("key2"), Some(&"value2".to_string()));
    }

    #[test]
    fn test_secrets_env_wins_over_file() {
        let mut store = CredentialStore::new(PathBuf::from("/tmp/test"));
        store.set("tmdb_api_key".to_string(), "from_file".to_string());
        store.set("session_secret".to_string(), "file_secret".to_string());

        let secrets = Secrets::resolve(
            |key| match key {
                TMDB_API_KEY => Some("from_env".to_string()),
                SESSION_SECRET => Some(String::new()),
                _ => None,
            },
            &store,
        );

        assert_eq!(secrets.tmdb_api_key().unwrap(), "from_env");
        // Empty env values fall back to the file
        assert_eq!(secrets.session_secret().unwrap(), "file_secret");
        assert!(matches!(
            secrets.store_service_key(),
            Err(ConfigError::MissingSecret(STORE_SERVICE_KEY))
        ));
        assert!(!format!("{:?}", secrets).contains("from_env"));
    }
}
