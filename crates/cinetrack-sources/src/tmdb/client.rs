use async_trait::async_trait;
use cinetrack_models::{ContentDetails, ContentItem, Genre, MediaType, Paged, Person, PersonCredits, SearchHit};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use crate::error::ContentError;
use crate::tmdb::api::{self, TimeWindow, TmdbEndpoint, TrendingScope};
use crate::traits::ContentSource;

/// HTTP gateway to the metadata API
///
/// Stateless apart from the connection pool: no retries and no caching here,
/// the query cache sits above this.
#[derive(Clone)]
pub struct TmdbClient {
    client: Arc<Client>,
    endpoint: TmdbEndpoint,
}

impl TmdbClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, ContentError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cinetrack/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ContentError::Http { path: "<client>".to_string(), source })?;
        Ok(Self {
            client: Arc::new(client),
            endpoint: TmdbEndpoint {
                base_url,
                api_key,
                language: None,
            },
        })
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.endpoint.language = language;
        self
    }

    pub async fn movie_details(&self, id: u64) -> Result<ContentDetails, ContentError> {
        api::get_movie_details(&self.client, &self.endpoint, id).await
    }

    pub async fn tv_details(&self, id: u64) -> Result<ContentDetails, ContentError> {
        api::get_tv_details(&self.client, &self.endpoint, id).await
    }
}

#[async_trait]
impl ContentSource for TmdbClient {
    async fn trending(&self, scope: TrendingScope, window: TimeWindow) -> Result<Paged<SearchHit>, ContentError> {
        api::get_trending(&self.client, &self.endpoint, scope, window).await
    }

    async fn search_multi(&self, query: &str, page: u32) -> Result<Paged<SearchHit>, ContentError> {
        api::search_multi(&self.client, &self.endpoint, query, page).await
    }

    async fn details(&self, media: MediaType, id: u64) -> Result<ContentDetails, ContentError> {
        match media {
            MediaType::Movie => self.movie_details(id).await,
            MediaType::Tv => self.tv_details(id).await,
        }
    }

    async fn popular(&self, media: MediaType, page: u32) -> Result<Paged<ContentItem>, ContentError> {
        api::get_popular(&self.client, &self.endpoint, media, page).await
    }

    async fn top_rated(&self, media: MediaType, page: u32) -> Result<Paged<ContentItem>, ContentError> {
        api::get_top_rated(&self.client, &self.endpoint, media, page).await
    }

    async fn discover_by_genres(&self, media: MediaType, genre_ids: &[u32], page: u32) -> Result<Paged<ContentItem>, ContentError> {
        api::discover_by_genres(&self.client, &self.endpoint, media, genre_ids, page).await
    }

    async fn genres(&self, media: MediaType) -> Result<Vec<Genre>, ContentError> {
        api::get_genres(&self.client, &self.endpoint, media).await
    }

    async fn similar(&self, media: MediaType, id: u64, page: u32) -> Result<Paged<ContentItem>, ContentError> {
        api::get_similar(&self.client, &self.endpoint, media, id, page).await
    }

    async fn recommendations(&self, media: MediaType, id: u64, page: u32) -> Result<Paged<ContentItem>, ContentError> {
        api::get_recommendations(&self.client, &self.endpoint, media, id, page).await
    }

    async fn person(&self, id: u64) -> Result<Person, ContentError> {
        api::get_person(&self.client, &self.endpoint, id).await
    }

    async fn person_credits(&self, id: u64) -> Result<PersonCredits, ContentError> {
        api::get_person_credits(&self.client, &self.endpoint, id).await
    }
}
