pub mod api;
pub mod client;
pub mod images;

pub use api::{TimeWindow, TmdbEndpoint, TrendingScope};
pub use client::TmdbClient;
pub use images::{ImageSize, ImageUrls};
