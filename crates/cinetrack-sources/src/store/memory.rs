use async_trait::async_trait;
use chrono::Utc;
use cinetrack_models::{
    Comment, CommunityPost, LikeOutcome, MediaType, NewComment, NewPost, NewRating, NewUser,
    NewWatchlistEntry, PostLike, Rating, UserProfile, WatchStatus, WatchlistEntry,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;
use crate::error::StoreError;
use crate::store::{average, merge_liked};
use crate::traits::PersistenceStore;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Tables {
    #[serde(default)]
    users: Vec<UserProfile>,
    #[serde(default)]
    watchlist: Vec<WatchlistEntry>,
    #[serde(default)]
    ratings: Vec<Rating>,
    #[serde(default)]
    posts: Vec<CommunityPost>,
    #[serde(default)]
    post_likes: Vec<PostLike>,
    #[serde(default)]
    comments: Vec<Comment>,
}

/// In-process store with the same constraints as the hosted schema
///
/// Enforces one watchlist row and one rating per (user, title, media type),
/// one like per (user, post), and cascades post deletes to likes and
/// comments. With a backing file it doubles as the `--offline` store.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    path: Option<PathBuf>,
    unavailable: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            path: None,
            unavailable: AtomicBool::new(false),
        }
    }

    /// Load tables from `path` (if it exists) and write back after every mutation
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let tables = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            match serde_json::from_str::<Tables>(&content) {
                Ok(tables) => {
                    info!(
                        "Loaded offline store from {} ({} watchlist, {} ratings, {} posts)",
                        path.display(),
                        tables.watchlist.len(),
                        tables.ratings.len(),
                        tables.posts.len()
                    );
                    tables
                }
                Err(e) => {
                    warn!("Offline store at {} is corrupted ({}), starting empty", path.display(), e);
                    Tables::default()
                }
            }
        } else {
            debug!("No offline store at {}, starting empty", path.display());
            Tables::default()
        };

        Ok(Self {
            tables: Mutex::new(tables),
            path: Some(path.to_path_buf()),
            unavailable: AtomicBool::new(false),
        })
    }

    /// Make every subsequent call fail as if the service were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Api {
                status: 503,
                code: None,
                message: "store unavailable".to_string(),
            });
        }
        // A poisoned lock still holds consistent rows: every mutation is a single push/retain
        Ok(self.tables.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn persist(&self, tables: &Tables) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(tables)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn user_by_id(tables: &Tables, user_id: &str) -> Option<UserProfile> {
    tables.users.iter().find(|u| u.id == user_id).cloned()
}

#[async_trait]
impl PersistenceStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserProfile>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        let tables = self.lock()?;
        Ok(user_by_id(&tables, user_id))
    }

    async fn insert_user(&self, user: &NewUser) -> Result<UserProfile, StoreError> {
        let mut tables = self.lock()?;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("user {} already exists", user.email)));
        }
        let created = UserProfile {
            id: new_id(),
            email: user.email.clone(),
            name: user.name.clone(),
            image: user.image.clone(),
        };
        tables.users.push(created.clone());
        self.persist(&tables)?;
        Ok(created)
    }

    async fn list_watchlist(&self, user_id: &str) -> Result<Vec<WatchlistEntry>, StoreError> {
        let tables = self.lock()?;
        let mut entries: Vec<WatchlistEntry> = tables
            .watchlist
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        Ok(entries)
    }

    async fn get_watchlist_item(&self, user_id: &str, movie_id: u64, media: MediaType) -> Result<Option<WatchlistEntry>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .watchlist
            .iter()
            .find(|e| e.user_id == user_id && e.movie_id == movie_id && e.media_type == media)
            .cloned())
    }

    async fn add_to_watchlist(&self, entry: &NewWatchlistEntry) -> Result<WatchlistEntry, StoreError> {
        let mut tables = self.lock()?;
        let exists = tables.watchlist.iter().any(|e| {
            e.user_id == entry.user_id && e.movie_id == entry.movie_id && e.media_type == entry.media_type
        });
        if exists {
            return Err(StoreError::Conflict(format!(
                "{} {} is already on the watchlist",
                entry.media_type, entry.movie_id
            )));
        }
        let created = WatchlistEntry {
            id: new_id(),
            user_id: entry.user_id.clone(),
            movie_id: entry.movie_id,
            media_type: entry.media_type,
            snapshot: entry.snapshot.clone(),
            status: entry.status,
            added_at: Utc::now(),
        };
        tables.watchlist.push(created.clone());
        self.persist(&tables)?;
        Ok(created)
    }

    async fn update_watchlist_status(&self, id: &str, status: WatchStatus) -> Result<WatchlistEntry, StoreError> {
        let mut tables = self.lock()?;
        let entry = tables
            .watchlist
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(StoreError::NotFound)?;
        entry.status = status;
        let updated = entry.clone();
        self.persist(&tables)?;
        Ok(updated)
    }

    async fn remove_from_watchlist(&self, id: &str) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        tables.watchlist.retain(|e| e.id != id);
        self.persist(&tables)
    }

    async fn list_ratings(&self, user_id: &str) -> Result<Vec<Rating>, StoreError> {
        let tables = self.lock()?;
        let mut ratings: Vec<Rating> = tables
            .ratings
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ratings)
    }

    async fn get_rating(&self, user_id: &str, movie_id: u64, media: MediaType) -> Result<Option<Rating>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .ratings
            .iter()
            .find(|r| r.user_id == user_id && r.movie_id == movie_id && r.media_type == media)
            .cloned())
    }

    async fn upsert_rating(&self, rating: &NewRating) -> Result<Rating, StoreError> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        let existing = tables.ratings.iter_mut().find(|r| {
            r.user_id == rating.user_id && r.movie_id == rating.movie_id && r.media_type == rating.media_type
        });

        let saved = match existing {
            Some(row) => {
                row.rating = rating.rating;
                row.review = rating.review.clone();
                row.snapshot = rating.snapshot.clone();
                row.updated_at = now;
                row.clone()
            }
            None => {
                let row = Rating {
                    id: new_id(),
                    user_id: rating.user_id.clone(),
                    movie_id: rating.movie_id,
                    media_type: rating.media_type,
                    rating: rating.rating,
                    review: rating.review.clone(),
                    snapshot: rating.snapshot.clone(),
                    created_at: now,
                    updated_at: now,
                };
                tables.ratings.push(row.clone());
                row
            }
        };
        self.persist(&tables)?;
        Ok(saved)
    }

    async fn delete_rating(&self, id: &str) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        tables.ratings.retain(|r| r.id != id);
        self.persist(&tables)
    }

    async fn average_rating(&self, movie_id: u64, media: MediaType) -> Result<f64, StoreError> {
        let tables = self.lock()?;
        Ok(average(
            tables
                .ratings
                .iter()
                .filter(|r| r.movie_id == movie_id && r.media_type == media)
                .map(|r| r.rating),
        ))
    }

    async fn list_posts(&self, viewer_id: Option<&str>) -> Result<Vec<CommunityPost>, StoreError> {
        let tables = self.lock()?;
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for comment in &tables.comments {
            *counts.entry(comment.post_id.as_str()).or_default() += 1;
        }

        let mut posts: Vec<CommunityPost> = tables
            .posts
            .iter()
            .rev()
            .map(|p| {
                let mut post = p.clone();
                post.user = user_by_id(&tables, &post.user_id);
                post.comment_count = counts.get(post.id.as_str()).copied().unwrap_or(0);
                post.is_liked = None;
                post
            })
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        if let Some(viewer) = viewer_id {
            let liked: HashSet<String> = tables
                .post_likes
                .iter()
                .filter(|l| l.user_id == viewer)
                .map(|l| l.post_id.clone())
                .collect();
            merge_liked(&mut posts, &liked);
        }
        Ok(posts)
    }

    async fn create_post(&self, post: &NewPost) -> Result<CommunityPost, StoreError> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        let created = CommunityPost {
            id: new_id(),
            user_id: post.user_id.clone(),
            movie_id: post.movie_id,
            media_type: post.media_type,
            title: post.title.clone(),
            poster_path: post.poster_path.clone(),
            content: post.content.clone(),
            likes: 0,
            created_at: now,
            updated_at: now,
            user: None,
            is_liked: None,
            comment_count: 0,
        };
        tables.posts.push(created.clone());
        self.persist(&tables)?;
        Ok(created)
    }

    async fn delete_post(&self, post_id: &str) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        tables.posts.retain(|p| p.id != post_id);
        tables.post_likes.retain(|l| l.post_id != post_id);
        tables.comments.retain(|c| c.post_id != post_id);
        self.persist(&tables)
    }

    async fn toggle_like(&self, user_id: &str, post_id: &str) -> Result<LikeOutcome, StoreError> {
        // Flip and counter change under one lock
        let mut tables = self.lock()?;
        let position = tables.posts.iter().position(|p| p.id == post_id).ok_or(StoreError::NotFound)?;

        let like = PostLike {
            user_id: user_id.to_string(),
            post_id: post_id.to_string(),
        };
        let was_liked = tables.post_likes.contains(&like);
        if was_liked {
            tables.post_likes.retain(|l| l != &like);
        } else {
            tables.post_likes.push(like);
        }

        let post = &mut tables.posts[position];
        post.likes = if was_liked { (post.likes - 1).max(0) } else { post.likes + 1 };
        let outcome = LikeOutcome {
            is_liked: !was_liked,
            likes: post.likes,
        };
        self.persist(&tables)?;
        Ok(outcome)
    }

    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, StoreError> {
        let tables = self.lock()?;
        let mut comments: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| {
                let mut comment = c.clone();
                comment.user = user_by_id(&tables, &comment.user_id);
                comment
            })
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }

    async fn add_comment(&self, comment: &NewComment) -> Result<Comment, StoreError> {
        let mut tables = self.lock()?;
        if !tables.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(StoreError::NotFound);
        }
        let created = Comment {
            id: new_id(),
            user_id: comment.user_id.clone(),
            post_id: comment.post_id.clone(),
            content: comment.content.clone(),
            created_at: Utc::now(),
            user: user_by_id(&tables, &comment.user_id),
        };
        tables.comments.push(Comment { user: None, ..created.clone() });
        self.persist(&tables)?;
        Ok(created)
    }
}

#[cfg(test)]
mod tests;
