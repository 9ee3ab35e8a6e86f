use chrono::Utc;
use cinetrack_models::{
    Comment, CommunityPost, ContentDetails, ContentSnapshot, LikeOutcome, MediaType, NewComment,
    NewPost, NewRating, NewWatchlistEntry, Rating, RatingError, UserProfile, WatchStatus,
    WatchlistEntry, TEMP_ID_PREFIX,
};
use cinetrack_sources::{PersistenceStore, StoreError};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;
use crate::identity::Session;
use crate::keys;
use crate::query_cache::{QueryCache, QueryError};

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Please sign in to {0}")]
    SignedOut(&'static str),
    #[error(transparent)]
    InvalidScore(#[from] RatingError),
    #[error("Only the author can delete this post")]
    NotOwner,
    #[error("Comment cannot be empty")]
    EmptyComment,
    #[error("{0} is already on your watchlist")]
    AlreadyInWatchlist(String),
    #[error("{media} {id} is not on your watchlist")]
    NotInWatchlist { media: MediaType, id: u64 },
    #[error("You have not rated {media} {id}")]
    NotRated { media: MediaType, id: u64 },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Cache(#[from] QueryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// User-facing outcome of a mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Collects notices for the caller to render after the action returns
#[derive(Default)]
pub struct NoticeLog {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl NoticeSink for NoticeLog {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap_or_else(|e| e.into_inner()).push(notice);
    }
}

pub fn default_share_caption(media: MediaType) -> String {
    format!("Check out this amazing {}!", media.label())
}

/// Every mutation the app offers, each reporting its outcome as a notice
///
/// Likes and comments patch the cache before the store answers and roll
/// back on failure. Creates and deletes skip patching and invalidate the
/// keys that depend on them instead.
pub struct Actions {
    store: Arc<dyn PersistenceStore>,
    cache: Arc<QueryCache>,
    viewer: Option<Session>,
    notices: Arc<dyn NoticeSink>,
}

impl Actions {
    pub fn new(
        store: Arc<dyn PersistenceStore>,
        cache: Arc<QueryCache>,
        viewer: Option<Session>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Self { store, cache, viewer, notices }
    }

    pub fn viewer(&self) -> Option<&Session> {
        self.viewer.as_ref()
    }

    fn require_viewer(&self, action: &'static str) -> Result<&Session, ActionError> {
        match &self.viewer {
            Some(viewer) => Ok(viewer),
            None => {
                let err = ActionError::SignedOut(action);
                self.notices.notify(Notice::error(err.to_string()));
                Err(err)
            }
        }
    }

    fn report<T>(&self, result: Result<T, ActionError>, failure: &str, success: impl FnOnce(&T) -> String) -> Result<T, ActionError> {
        match &result {
            Ok(value) => self.notices.notify(Notice::success(success(value))),
            Err(e) => self.notices.notify(Notice::error(format!("{}: {}", failure, e))),
        }
        result
    }

    fn invalidate(&self, prefixes: &[&str]) {
        for name in prefixes {
            self.cache.invalidate_prefix(&keys::prefix(name));
        }
    }

    pub async fn add_to_watchlist(&self, details: &ContentDetails) -> Result<WatchlistEntry, ActionError> {
        let viewer = self.require_viewer("add titles to your watchlist")?;
        let title = details.item.display_title().to_string();
        let entry = NewWatchlistEntry {
            user_id: viewer.user_id.clone(),
            movie_id: details.item.id,
            media_type: details.media_type(),
            snapshot: ContentSnapshot::from_details(details),
            status: WatchStatus::PlanToWatch,
        };

        let result = match self.store.add_to_watchlist(&entry).await {
            Ok(added) => {
                info!("Added {} {} to watchlist", added.media_type, added.movie_id);
                self.invalidate(&[keys::WATCHLIST, keys::WATCHLIST_CHECK, keys::USER_WATCHLIST]);
                Ok(added)
            }
            Err(StoreError::Conflict(_)) => Err(ActionError::AlreadyInWatchlist(title.clone())),
            Err(e) => Err(ActionError::from(e)),
        };
        self.report(result, "Failed to add to watchlist", |_| format!("Added {} to your watchlist", title))
    }

    async fn find_watchlist_entry(&self, user_id: &str, media: MediaType, id: u64) -> Result<WatchlistEntry, ActionError> {
        self.store
            .get_watchlist_item(user_id, id, media)
            .await?
            .ok_or(ActionError::NotInWatchlist { media, id })
    }

    pub async fn remove_from_watchlist(&self, media: MediaType, id: u64) -> Result<WatchlistEntry, ActionError> {
        let viewer = self.require_viewer("edit your watchlist")?;
        let result = async {
            let entry = self.find_watchlist_entry(&viewer.user_id, media, id).await?;
            self.store.remove_from_watchlist(&entry.id).await?;
            info!("Removed {} {} from watchlist", media, id);
            self.invalidate(&[keys::WATCHLIST, keys::WATCHLIST_CHECK, keys::USER_WATCHLIST]);
            Ok::<_, ActionError>(entry)
        }
        .await;
        self.report(result, "Failed to remove from watchlist", |entry| {
            format!("Removed {} from your watchlist", entry.snapshot.title)
        })
    }

    /// Status changes patch the cached list right away
    pub async fn update_watchlist_status(&self, media: MediaType, id: u64, status: WatchStatus) -> Result<WatchlistEntry, ActionError> {
        let viewer = self.require_viewer("edit your watchlist")?;
        let result = async {
            let entry = self.find_watchlist_entry(&viewer.user_id, media, id).await?;
            let key = keys::watchlist(&viewer.user_id);
            let update = self.cache.optimistic(&key, |list: Option<Vec<WatchlistEntry>>| {
                list.map(|mut list| {
                    if let Some(row) = list.iter_mut().find(|row| row.id == entry.id) {
                        row.status = status;
                    }
                    list
                })
            })?;

            match self.store.update_watchlist_status(&entry.id, status).await {
                Ok(saved) => {
                    update.confirm(|list: Vec<WatchlistEntry>| {
                        list.into_iter()
                            .map(|row| if row.id == saved.id { saved.clone() } else { row })
                            .collect()
                    })?;
                    info!("Marked {} {} as {}", media, id, status);
                    self.invalidate(&[keys::USER_WATCHLIST]);
                    Ok(saved)
                }
                Err(e) => {
                    update.rollback();
                    Err(ActionError::from(e))
                }
            }
        }
        .await;
        self.report(result, "Failed to update status", |entry| {
            format!("Marked {} as {}", entry.snapshot.title, entry.status)
        })
    }

    pub async fn rate(&self, details: &ContentDetails, score: u8, review: Option<String>) -> Result<Rating, ActionError> {
        let viewer = self.require_viewer("rate titles")?;
        let result = async {
            let score = Rating::validate_score(score)?;
            let rating = NewRating {
                user_id: viewer.user_id.clone(),
                movie_id: details.item.id,
                media_type: details.media_type(),
                rating: score,
                review: review.filter(|r| !r.trim().is_empty()),
                snapshot: ContentSnapshot::from_details(details),
            };
            let saved = self.store.upsert_rating(&rating).await?;
            info!("Rated {} {} {}/10", saved.media_type, saved.movie_id, saved.rating);
            self.invalidate(&[keys::USER_RATING, keys::RATINGS, keys::AVERAGE_RATING, keys::USER_RATINGS]);
            Ok::<_, ActionError>(saved)
        }
        .await;
        self.report(result, "Failed to save rating", |saved| {
            format!("Rated {} {}/10", saved.snapshot.title, saved.rating)
        })
    }

    pub async fn delete_rating(&self, media: MediaType, id: u64) -> Result<Rating, ActionError> {
        let viewer = self.require_viewer("manage your ratings")?;
        let result = async {
            let rating = self
                .store
                .get_rating(&viewer.user_id, id, media)
                .await?
                .ok_or(ActionError::NotRated { media, id })?;
            self.store.delete_rating(&rating.id).await?;
            info!("Deleted rating for {} {}", media, id);
            self.invalidate(&[keys::USER_RATING, keys::RATINGS, keys::AVERAGE_RATING, keys::USER_RATINGS]);
            Ok::<_, ActionError>(rating)
        }
        .await;
        self.report(result, "Failed to delete rating", |rating| {
            format!("Removed your rating for {}", rating.snapshot.title)
        })
    }

    pub async fn share(&self, details: &ContentDetails, caption: Option<String>) -> Result<CommunityPost, ActionError> {
        let viewer = self.require_viewer("share to the community")?;
        let media = details.media_type();
        let post = NewPost {
            user_id: viewer.user_id.clone(),
            movie_id: details.item.id,
            media_type: media,
            title: details.item.display_title().to_string(),
            poster_path: details.item.poster_path.clone(),
            content: Some(
                caption
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or_else(|| default_share_caption(media)),
            ),
        };

        let result = match self.store.create_post(&post).await {
            Ok(created) => {
                info!("Shared {} {} as post {}", media, created.movie_id, created.id);
                self.invalidate(&[keys::COMMUNITY_POSTS]);
                Ok(created)
            }
            Err(e) => Err(ActionError::from(e)),
        };
        self.report(result, "Failed to share", |created| {
            format!("Shared {} with the community", created.title)
        })
    }

    pub async fn delete_post(&self, post: &CommunityPost) -> Result<(), ActionError> {
        let viewer = self.require_viewer("delete posts")?;
        let result = async {
            if !post.is_owned_by(&viewer.user_id) {
                return Err(ActionError::NotOwner);
            }
            self.store.delete_post(&post.id).await?;
            info!("Deleted post {}", post.id);
            self.invalidate(&[keys::COMMUNITY_POSTS]);
            self.cache.invalidate_prefix(&keys::comments(&post.id));
            Ok(())
        }
        .await;
        self.report(result, "Failed to delete post", |_| "Post deleted".to_string())
    }

    /// Flip the viewer's like, showing the new state before the store answers
    pub async fn toggle_like(&self, post_id: &str) -> Result<LikeOutcome, ActionError> {
        let viewer = self.require_viewer("like posts")?;
        let result = async {
            let key = keys::community_posts(Some(&viewer.user_id));
            let update = self.cache.optimistic(&key, |posts: Option<Vec<CommunityPost>>| {
                posts.map(|mut posts| {
                    if let Some(post) = posts.iter_mut().find(|p| p.id == post_id) {
                        let liked = post.is_liked.unwrap_or(false);
                        post.is_liked = Some(!liked);
                        post.likes = if liked { (post.likes - 1).max(0) } else { post.likes + 1 };
                    }
                    posts
                })
            })?;

            match self.store.toggle_like(&viewer.user_id, post_id).await {
                Ok(outcome) => {
                    update.confirm(|mut posts: Vec<CommunityPost>| {
                        if let Some(post) = posts.iter_mut().find(|p| p.id == post_id) {
                            post.is_liked = Some(outcome.is_liked);
                            post.likes = outcome.likes;
                        }
                        posts
                    })?;
                    info!("Post {} like toggled to {}", post_id, outcome.is_liked);
                    Ok(outcome)
                }
                Err(e) => {
                    update.rollback();
                    Err(ActionError::from(e))
                }
            }
        }
        .await;
        self.report(result, "Failed to update like", |outcome| {
            if outcome.is_liked { "Liked".to_string() } else { "Like removed".to_string() }
        })
    }

    /// Append the comment under a temporary id, then swap in the stored row
    pub async fn add_comment(&self, post_id: &str, content: &str) -> Result<Comment, ActionError> {
        let viewer = self.require_viewer("comment")?;
        let result = async {
            let content = content.trim();
            if content.is_empty() {
                return Err(ActionError::EmptyComment);
            }

            let provisional = provisional_comment(viewer, post_id, content);
            let temp_id = provisional.id.clone();
            let author = provisional.user.clone();

            let key = keys::comments(post_id);
            let update = self.cache.optimistic(&key, |list: Option<Vec<Comment>>| {
                list.map(|mut list| {
                    list.push(provisional);
                    list
                })
            })?;

            let request = NewComment {
                user_id: viewer.user_id.clone(),
                post_id: post_id.to_string(),
                content: content.to_string(),
            };
            match self.store.add_comment(&request).await {
                Ok(mut saved) => {
                    if saved.user.is_none() {
                        saved.user = author;
                    }
                    update.confirm(|list: Vec<Comment>| reconcile_comment(list, &temp_id, &saved))?;
                    info!("Added comment {} to post {}", saved.id, post_id);
                    // The next read of the thread comes from the store
                    self.cache.invalidate_prefix(&key);
                    // Feed rows carry comment counts
                    self.invalidate(&[keys::COMMUNITY_POSTS]);
                    Ok(saved)
                }
                Err(e) => {
                    warn!("Comment on post {} failed, removing provisional entry", post_id);
                    update.rollback();
                    Err(ActionError::from(e))
                }
            }
        }
        .await;
        self.report(result, "Failed to add comment", |_| "Comment added".to_string())
    }
}

/// Comment shown under a temporary id until the store answers
fn provisional_comment(viewer: &Session, post_id: &str, content: &str) -> Comment {
    Comment {
        id: format!("{}{}", TEMP_ID_PREFIX, Uuid::new_v4()),
        user_id: viewer.user_id.clone(),
        post_id: post_id.to_string(),
        content: content.to_string(),
        created_at: Utc::now(),
        user: Some(UserProfile {
            id: viewer.user_id.clone(),
            email: viewer.email.clone(),
            name: viewer.name.clone(),
            image: viewer.image.clone(),
        }),
    }
}

/// Replace the provisional comment with the stored one, leaving exactly one copy
fn reconcile_comment(mut list: Vec<Comment>, temp_id: &str, saved: &Comment) -> Vec<Comment> {
    if !list.iter().any(|c| c.id == temp_id) {
        // A refetch replaced the list after the patch
        if !list.iter().any(|c| c.id == saved.id) {
            list.push(saved.clone());
        }
        return list;
    }
    list.into_iter()
        .filter(|c| c.id != saved.id)
        .map(|c| if c.id == temp_id { saved.clone() } else { c })
        .collect()
}

#[cfg(test)]
mod tests;
