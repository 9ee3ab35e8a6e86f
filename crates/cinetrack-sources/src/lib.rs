pub mod error;
pub mod factory;
pub mod store;
pub mod tmdb;
pub mod traits;

pub use error::{optional, ContentError, StoreError};
pub use factory::{create_content_source, create_offline_stores, create_stores, Stores};
pub use store::{MemoryStore, PostgrestStore};
pub use tmdb::{ImageSize, ImageUrls, TimeWindow, TmdbClient, TrendingScope};
pub use traits::{ContentSource, PersistenceStore};
