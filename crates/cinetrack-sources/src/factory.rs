//! Builds the gateways from configuration and resolved secrets
//!
//! Online mode talks to the metadata API and the hosted store. Offline mode
//! swaps the store for a file-backed `MemoryStore` so the CLI still works
//! without store credentials; the metadata API is always remote.

use anyhow::{Context, Result};
use cinetrack_config::{Config, Secrets};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use crate::store::{MemoryStore, PostgrestStore};
use crate::tmdb::TmdbClient;
use crate::traits::{ContentSource, PersistenceStore};

/// The two store handles the app needs
///
/// `public` carries the viewer-scoped key and serves every read and write;
/// `service` carries the privileged key and is only used to provision users
/// at sign-in.
#[derive(Clone)]
pub struct Stores {
    pub public: Arc<dyn PersistenceStore>,
    pub service: Arc<dyn PersistenceStore>,
}

pub fn create_content_source(config: &Config, secrets: &Secrets) -> Result<Arc<dyn ContentSource>> {
    let api_key = secrets.tmdb_api_key()?.to_string();
    let client = TmdbClient::new(
        config.content.base_url.clone(),
        api_key,
        Duration::from_secs(config.http.timeout_secs),
    )?
    .with_language(config.content.language.clone());
    Ok(Arc::new(client))
}

pub fn create_stores(config: &Config, secrets: &Secrets) -> Result<Stores> {
    let url = config.store_url()?;
    let timeout = Duration::from_secs(config.http.timeout_secs);

    let public = PostgrestStore::new(url, secrets.store_anon_key()?.to_string(), timeout)
        .context("Failed to build store client")?;
    // Without a service key, provisioning falls back to the public key and
    // succeeds only if the row-level policies allow self sign-up
    let service = match secrets.store_service_key() {
        Ok(key) => PostgrestStore::new(url, key.to_string(), timeout)?,
        Err(_) => public.clone(),
    };

    info!("Using hosted store at {}", public.rest_url());
    Ok(Stores {
        public: Arc::new(public),
        service: Arc::new(service),
    })
}

pub fn create_offline_stores(path: &Path) -> Result<Stores> {
    let store: Arc<dyn PersistenceStore> = Arc::new(
        MemoryStore::open(path).with_context(|| format!("Failed to open offline store {}", path.display()))?,
    );
    info!("Using offline store at {}", path.display());
    Ok(Stores {
        public: Arc::clone(&store),
        service: store,
    })
}
