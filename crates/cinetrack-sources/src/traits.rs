use async_trait::async_trait;
use cinetrack_models::{
    Comment, CommunityPost, ContentDetails, ContentItem, Genre, LikeOutcome, MediaType, NewComment,
    NewPost, NewRating, NewUser, NewWatchlistEntry, Paged, Person, PersonCredits, Rating, SearchHit,
    UserProfile, WatchStatus, WatchlistEntry,
};
use crate::error::{ContentError, StoreError};
use crate::tmdb::{TimeWindow, TrendingScope};

/// Read-only metadata service
///
/// Responses come back in the upstream shape. Detail lookups get the media
/// type injected since the upstream leaves it out.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn trending(&self, scope: TrendingScope, window: TimeWindow) -> Result<Paged<SearchHit>, ContentError>;
    async fn search_multi(&self, query: &str, page: u32) -> Result<Paged<SearchHit>, ContentError>;
    async fn details(&self, media: MediaType, id: u64) -> Result<ContentDetails, ContentError>;
    async fn popular(&self, media: MediaType, page: u32) -> Result<Paged<ContentItem>, ContentError>;
    async fn top_rated(&self, media: MediaType, page: u32) -> Result<Paged<ContentItem>, ContentError>;
    async fn discover_by_genres(&self, media: MediaType, genre_ids: &[u32], page: u32) -> Result<Paged<ContentItem>, ContentError>;
    async fn genres(&self, media: MediaType) -> Result<Vec<Genre>, ContentError>;
    async fn similar(&self, media: MediaType, id: u64, page: u32) -> Result<Paged<ContentItem>, ContentError>;
    async fn recommendations(&self, media: MediaType, id: u64, page: u32) -> Result<Paged<ContentItem>, ContentError>;
    async fn person(&self, id: u64) -> Result<Person, ContentError>;
    async fn person_credits(&self, id: u64) -> Result<PersonCredits, ContentError>;
}

/// Row-level access to the hosted store
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    // Users
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserProfile>, StoreError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError>;
    async fn insert_user(&self, user: &NewUser) -> Result<UserProfile, StoreError>;

    // Watchlist
    async fn list_watchlist(&self, user_id: &str) -> Result<Vec<WatchlistEntry>, StoreError>;
    async fn get_watchlist_item(&self, user_id: &str, movie_id: u64, media: MediaType) -> Result<Option<WatchlistEntry>, StoreError>;
    async fn add_to_watchlist(&self, entry: &NewWatchlistEntry) -> Result<WatchlistEntry, StoreError>;
    async fn update_watchlist_status(&self, id: &str, status: WatchStatus) -> Result<WatchlistEntry, StoreError>;
    async fn remove_from_watchlist(&self, id: &str) -> Result<(), StoreError>;

    async fn is_in_watchlist(&self, user_id: &str, movie_id: u64, media: MediaType) -> Result<bool, StoreError> {
        Ok(self.get_watchlist_item(user_id, movie_id, media).await?.is_some())
    }

    // Ratings
    async fn list_ratings(&self, user_id: &str) -> Result<Vec<Rating>, StoreError>;
    async fn get_rating(&self, user_id: &str, movie_id: u64, media: MediaType) -> Result<Option<Rating>, StoreError>;
    async fn upsert_rating(&self, rating: &NewRating) -> Result<Rating, StoreError>;
    async fn delete_rating(&self, id: &str) -> Result<(), StoreError>;
    async fn average_rating(&self, movie_id: u64, media: MediaType) -> Result<f64, StoreError>;

    // Community
    async fn list_posts(&self, viewer_id: Option<&str>) -> Result<Vec<CommunityPost>, StoreError>;
    async fn create_post(&self, post: &NewPost) -> Result<CommunityPost, StoreError>;
    async fn delete_post(&self, post_id: &str) -> Result<(), StoreError>;
    async fn toggle_like(&self, user_id: &str, post_id: &str) -> Result<LikeOutcome, StoreError>;
    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, StoreError>;
    async fn add_comment(&self, comment: &NewComment) -> Result<Comment, StoreError>;
}
