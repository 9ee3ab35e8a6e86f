use crate::output::Output;
use cinetrack_config::{Config, CredentialStore, PathManager, Secrets};
use cinetrack_core::{verify_session, Actions, NoticeLog, QueryCache, Session, Views};
use cinetrack_sources::{create_content_source, create_offline_stores, create_stores, Stores};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::sync::Arc;
use tracing::{debug, warn};

const SESSION_SECRET_KEY: &str = "session_secret";

/// An action already reported its failure as a notice; exit non-zero without printing again
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct AlreadyReported(pub String);

/// Everything a command needs, built once per invocation
pub struct App {
    pub paths: PathManager,
    pub config: Config,
    pub credentials: CredentialStore,
    pub secrets: Secrets,
    pub stores: Stores,
    pub cache: Arc<QueryCache>,
    pub notices: Arc<NoticeLog>,
    pub session: Option<Session>,
    offline: bool,
}

impl App {
    pub fn new(paths: PathManager, config: Config, offline: bool) -> Result<Self> {
        let mut credentials = CredentialStore::new(paths.credentials_file());
        credentials
            .load()
            .map_err(|e| eyre!("Failed to load credentials from {}: {}", paths.credentials_file().display(), e))?;
        let secrets = Secrets::from_env(&credentials);

        let stores = if offline {
            create_offline_stores(&paths.offline_store_file())
        } else {
            create_stores(&config, &secrets)
        }
        .map_err(|e| eyre!("{:#}", e))?;

        let mut app = Self {
            cache: Arc::new(QueryCache::from_config(&config.cache)),
            notices: Arc::new(NoticeLog::new()),
            session: None,
            paths,
            config,
            credentials,
            secrets,
            stores,
            offline,
        };
        app.session = app.restore_session();
        Ok(app)
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    fn restore_session(&self) -> Option<Session> {
        let token = self.credentials.get_session_token()?;
        let secret = self.session_secret_if_set()?;
        match verify_session(token, &secret) {
            Ok(session) => {
                debug!("Restored session for {}", session.email);
                Some(session)
            }
            Err(e) => {
                warn!("Stored session is no longer valid: {}", e);
                None
            }
        }
    }

    fn session_secret_if_set(&self) -> Option<String> {
        self.secrets.session_secret().ok().map(str::to_string)
    }

    /// Secret used to sign sessions
    ///
    /// Offline, a missing secret is generated and kept in the credentials
    /// file so sessions survive between runs.
    pub fn session_secret(&mut self) -> Result<String> {
        match self.secrets.session_secret() {
            Ok(secret) => return Ok(secret.to_string()),
            Err(e) if !self.offline => return Err(eyre!("{}", e)),
            Err(_) => {}
        }
        let secret = format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple());
        self.credentials.set(SESSION_SECRET_KEY.to_string(), secret.clone());
        self.credentials
            .save()
            .map_err(|e| eyre!("Failed to save credentials: {}", e))?;
        self.secrets.session_secret = Some(secret.clone());
        debug!("Generated a local session secret for offline use");
        Ok(secret)
    }

    pub fn require_session(&self) -> Result<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| eyre!("Not signed in. Run 'cinetrack signin --email <EMAIL>' first"))
    }

    pub fn views(&self) -> Result<Views> {
        let content = create_content_source(&self.config, &self.secrets).map_err(|e| eyre!("{:#}", e))?;
        Ok(Views::new(content, Arc::clone(&self.stores.public), Arc::clone(&self.cache)))
    }

    pub fn actions(&self) -> Actions {
        Actions::new(
            Arc::clone(&self.stores.public),
            Arc::clone(&self.cache),
            self.session.clone(),
            self.notices.clone(),
        )
    }

    /// Render queued notices, then turn an action failure into an exit status
    pub fn finish<T, E: std::fmt::Display>(&self, result: std::result::Result<T, E>, output: &Output) -> Result<T> {
        output.notices(&self.notices.drain());
        result.map_err(|e| AlreadyReported(e.to_string()).into())
    }
}
