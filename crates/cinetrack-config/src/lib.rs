pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{CacheConfig, Config, ConfigError, ContentConfig, HttpConfig, LoggingConfig, StoreConfig};
pub use credentials::{CredentialStore, Secrets};
pub use paths::{PathManager, container_base_path};
