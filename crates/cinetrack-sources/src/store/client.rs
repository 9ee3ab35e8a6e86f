use async_trait::async_trait;
use cinetrack_models::{
    Comment, CommunityPost, LikeOutcome, MediaType, NewComment, NewPost, NewRating, NewUser,
    NewWatchlistEntry, Rating, UserProfile, WatchStatus, WatchlistEntry,
};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use crate::error::{optional, StoreError, PGRST_NO_ROWS, PG_UNIQUE_VIOLATION};
use crate::store::query::{self, Query, COMMENTS, POSTS, POST_LIKES, RATINGS, USERS, USER_EMBED, WATCHLIST};
use crate::store::{average, merge_liked};
use crate::traits::PersistenceStore;

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const TOGGLE_LIKE_RPC: &str = "toggle_post_like";

/// Error body PostgREST sends on failure
#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CountRow {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct PostRow {
    #[serde(flatten)]
    post: CommunityPost,
    #[serde(default)]
    comments: Vec<CountRow>,
}

#[derive(Debug, Deserialize)]
struct LikedRow {
    post_id: String,
}

#[derive(Debug, Deserialize)]
struct ScoreRow {
    rating: u8,
}

/// Gateway to a PostgREST-compatible hosted store (`{url}/rest/v1`)
///
/// The key decides which row-level policies apply: the public key for
/// everything a viewer does, the service key only for provisioning users.
#[derive(Clone)]
pub struct PostgrestStore {
    client: Arc<Client>,
    rest_url: String,
    api_key: String,
}

impl PostgrestStore {
    pub fn new(project_url: &str, api_key: String, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client: Arc::new(client),
            rest_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            api_key,
        })
    }

    pub fn rest_url(&self) -> &str {
        &self.rest_url
    }

    fn request(&self, method: reqwest::Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
    }

    async fn fetch_many<T: DeserializeOwned>(&self, query: Query) -> Result<Vec<T>, StoreError> {
        debug!("SELECT {} {:?}", query.table(), query.params());
        let url = query.url(&self.rest_url)?;
        let response = self.request(reqwest::Method::GET, url).send().await?;
        decode(response).await
    }

    /// Single-object read; zero rows surfaces as `StoreError::NotFound`
    async fn fetch_one<T: DeserializeOwned>(&self, query: Query) -> Result<T, StoreError> {
        debug!("SELECT ONE {} {:?}", query.table(), query.params());
        let url = query.url(&self.rest_url)?;
        let response = self
            .request(reqwest::Method::GET, url)
            .header("Accept", SINGLE_OBJECT)
            .send()
            .await?;
        decode(response).await
    }

    async fn insert_one<B: Serialize + ?Sized, T: DeserializeOwned>(&self, query: Query, body: &B, prefer: &str) -> Result<T, StoreError> {
        let url = query.url(&self.rest_url)?;
        let response = self
            .request(reqwest::Method::POST, url)
            .header("Accept", SINGLE_OBJECT)
            .header("Prefer", prefer)
            .json(body)
            .send()
            .await?;
        decode(response).await
    }

    async fn update_one<B: Serialize + ?Sized, T: DeserializeOwned>(&self, query: Query, body: &B) -> Result<T, StoreError> {
        let url = query.url(&self.rest_url)?;
        let response = self
            .request(reqwest::Method::PATCH, url)
            .header("Accept", SINGLE_OBJECT)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        decode(response).await
    }

    async fn delete(&self, query: Query) -> Result<(), StoreError> {
        let url = query.url(&self.rest_url)?;
        let response = self.request(reqwest::Method::DELETE, url).send().await?;
        check(response).await.map(|_| ())
    }
}

/// Fail on non-2xx, translating PostgREST error codes
async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(error_from_body(status.as_u16(), &body))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let response = check(response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub(crate) fn error_from_body(status: u16, body: &str) -> StoreError {
    let parsed: Option<PostgrestErrorBody> = serde_json::from_str(body).ok();
    let code = parsed.as_ref().and_then(|b| b.code.clone());
    match code.as_deref() {
        Some(PGRST_NO_ROWS) => StoreError::NotFound,
        Some(PG_UNIQUE_VIOLATION) => StoreError::Conflict(
            parsed
                .and_then(|b| b.details.or(b.message))
                .unwrap_or_else(|| "duplicate key".to_string()),
        ),
        _ => StoreError::Api {
            status,
            code,
            message: parsed
                .and_then(|b| b.message)
                .unwrap_or_else(|| body.to_string()),
        },
    }
}

#[async_trait]
impl PersistenceStore for PostgrestStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserProfile>, StoreError> {
        optional(self.fetch_one(Query::from(USERS).select("*").eq("email", email)).await)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        optional(self.fetch_one(Query::from(USERS).select("*").eq("id", user_id)).await)
    }

    async fn insert_user(&self, user: &NewUser) -> Result<UserProfile, StoreError> {
        let created: UserProfile = self
            .insert_one(Query::from(USERS).select("*"), user, "return=representation")
            .await?;
        info!("Provisioned user {} for {}", created.id, created.email);
        Ok(created)
    }

    async fn list_watchlist(&self, user_id: &str) -> Result<Vec<WatchlistEntry>, StoreError> {
        self.fetch_many(
            Query::from(WATCHLIST)
                .select("*")
                .eq("user_id", user_id)
                .order("added_at", false),
        )
        .await
    }

    async fn get_watchlist_item(&self, user_id: &str, movie_id: u64, media: MediaType) -> Result<Option<WatchlistEntry>, StoreError> {
        optional(
            self.fetch_one(
                Query::from(WATCHLIST)
                    .select("*")
                    .eq("user_id", user_id)
                    .eq("movie_id", movie_id)
                    .eq("media_type", media),
            )
            .await,
        )
    }

    async fn add_to_watchlist(&self, entry: &NewWatchlistEntry) -> Result<WatchlistEntry, StoreError> {
        self.insert_one(Query::from(WATCHLIST).select("*"), entry, "return=representation")
            .await
    }

    async fn update_watchlist_status(&self, id: &str, status: WatchStatus) -> Result<WatchlistEntry, StoreError> {
        self.update_one(
            Query::from(WATCHLIST).select("*").eq("id", id),
            &json!({ "status": status }),
        )
        .await
    }

    async fn remove_from_watchlist(&self, id: &str) -> Result<(), StoreError> {
        self.delete(Query::from(WATCHLIST).eq("id", id)).await
    }

    async fn list_ratings(&self, user_id: &str) -> Result<Vec<Rating>, StoreError> {
        self.fetch_many(
            Query::from(RATINGS)
                .select("*")
                .eq("user_id", user_id)
                .order("created_at", false),
        )
        .await
    }

    async fn get_rating(&self, user_id: &str, movie_id: u64, media: MediaType) -> Result<Option<Rating>, StoreError> {
        optional(
            self.fetch_one(
                Query::from(RATINGS)
                    .select("*")
                    .eq("user_id", user_id)
                    .eq("movie_id", movie_id)
                    .eq("media_type", media),
            )
            .await,
        )
    }

    async fn upsert_rating(&self, rating: &NewRating) -> Result<Rating, StoreError> {
        self.insert_one(
            Query::from(RATINGS)
                .select("*")
                .on_conflict("user_id,movie_id,media_type"),
            rating,
            "resolution=merge-duplicates,return=representation",
        )
        .await
    }

    async fn delete_rating(&self, id: &str) -> Result<(), StoreError> {
        self.delete(Query::from(RATINGS).eq("id", id)).await
    }

    async fn average_rating(&self, movie_id: u64, media: MediaType) -> Result<f64, StoreError> {
        let rows: Vec<ScoreRow> = self
            .fetch_many(
                Query::from(RATINGS)
                    .select("rating")
                    .eq("movie_id", movie_id)
                    .eq("media_type", media),
            )
            .await?;
        Ok(average(rows.iter().map(|r| r.rating)))
    }

    async fn list_posts(&self, viewer_id: Option<&str>) -> Result<Vec<CommunityPost>, StoreError> {
        let rows: Vec<PostRow> = self
            .fetch_many(
                Query::from(POSTS)
                    .select(&format!("*,{},comments:comments(count)", USER_EMBED))
                    .order("created_at", false),
            )
            .await?;

        let mut posts: Vec<CommunityPost> = rows
            .into_iter()
            .map(|row| {
                let mut post = row.post;
                post.comment_count = row.comments.first().map(|c| c.count).unwrap_or(0);
                post
            })
            .collect();

        if let Some(viewer) = viewer_id {
            if !posts.is_empty() {
                // One batched read for all of the viewer's likes instead of one per post
                let liked: Vec<LikedRow> = self
                    .fetch_many(
                        Query::from(POST_LIKES)
                            .select("post_id")
                            .eq("user_id", viewer)
                            .in_list("post_id", posts.iter().map(|p| p.id.as_str())),
                    )
                    .await?;
                let liked: HashSet<String> = liked.into_iter().map(|l| l.post_id).collect();
                merge_liked(&mut posts, &liked);
            }
        }

        Ok(posts)
    }

    async fn create_post(&self, post: &NewPost) -> Result<CommunityPost, StoreError> {
        self.insert_one(Query::from(POSTS).select("*"), post, "return=representation")
            .await
    }

    async fn delete_post(&self, post_id: &str) -> Result<(), StoreError> {
        self.delete(Query::from(POSTS).eq("id", post_id)).await
    }

    async fn toggle_like(&self, user_id: &str, post_id: &str) -> Result<LikeOutcome, StoreError> {
        // Flip and counter update happen in one server-side transaction
        let url = query::rpc_url(&self.rest_url, TOGGLE_LIKE_RPC)?;
        let response = self
            .request(reqwest::Method::POST, url)
            .header("Accept", SINGLE_OBJECT)
            .json(&json!({ "p_post_id": post_id, "p_user_id": user_id }))
            .send()
            .await?;
        decode(response).await
    }

    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, StoreError> {
        self.fetch_many(
            Query::from(COMMENTS)
                .select(&format!("*,{}", USER_EMBED))
                .eq("post_id", post_id)
                .order("created_at", true),
        )
        .await
    }

    async fn add_comment(&self, comment: &NewComment) -> Result<Comment, StoreError> {
        self.insert_one(
            Query::from(COMMENTS).select(&format!("*,{}", USER_EMBED)),
            comment,
            "return=representation",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_rows_code_is_not_found() {
        let body = r#"{"code":"PGRST116","details":"The result contains 0 rows","hint":null,"message":"JSON object requested, multiple (or no) rows returned"}"#;
        assert!(error_from_body(406, body).is_not_found());
    }

    #[test]
    fn test_unique_violation_is_conflict() {
        let body = r#"{"code":"23505","details":"Key (user_id, movie_id, media_type)=(u, 42, movie) already exists.","hint":null,"message":"duplicate key value violates unique constraint"}"#;
        match error_from_body(409, body) {
            StoreError::Conflict(detail) => assert!(detail.contains("already exists")),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_other_errors_keep_status_and_message() {
        match error_from_body(401, r#"{"code":"42501","message":"permission denied for table ratings"}"#) {
            StoreError::Api { status, code, message } => {
                assert_eq!(status, 401);
                assert_eq!(code.as_deref(), Some("42501"));
                assert_eq!(message, "permission denied for table ratings");
            }
            other => panic!("expected api error, got {:?}", other),
        }

        match error_from_body(502, "Bad Gateway") {
            StoreError::Api { code, message, .. } => {
                assert_eq!(code, None);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("expected api error, got {:?}", other),
        }
    }

    #[test]
    fn test_feed_row_comment_count() {
        let json = r#"{
            "id": "p1", "user_id": "u1", "movie_id": 42, "media_type": "movie",
            "title": "T", "poster_path": null, "content": null, "likes": 0,
            "created_at": "2025-01-02T03:04:05Z", "updated_at": "2025-01-02T03:04:05Z",
            "user": null,
            "comments": [{"count": 4}]
        }"#;
        let row: PostRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.comments[0].count, 4);
        assert_eq!(row.post.id, "p1");
    }

    #[test]
    fn test_rest_url() {
        let store = PostgrestStore::new("https://abc.supabase.co/", "anon".to_string(), Duration::from_secs(5)).unwrap();
        assert_eq!(store.rest_url(), "https://abc.supabase.co/rest/v1");
    }
}
