use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::content::MediaType;
use crate::user::UserProfile;

/// Id prefix of comments that exist only in the local cache
pub const TEMP_ID_PREFIX: &str = "temp-";

/// A `community_posts` row, plus fields joined in on read
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommunityPost {
    pub id: String,
    pub user_id: String,
    pub movie_id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub poster_path: Option<String>,
    pub content: Option<String>,
    #[serde(default)]
    pub likes: i64, // server-maintained counter
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,

    // Per-viewer, only set when the feed was read on behalf of a viewer
    #[serde(default, rename = "isLiked", skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
    #[serde(default)]
    pub comment_count: u64,
}

impl CommunityPost {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPost {
    pub user_id: String,
    pub movie_id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub poster_path: Option<String>,
    pub content: Option<String>,
}

/// A `post_likes` row; existence is the fact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PostLike {
    pub user_id: String,
    pub post_id: String,
}

/// Result of flipping a like
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LikeOutcome {
    pub is_liked: bool,
    pub likes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub post_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

impl Comment {
    pub fn is_provisional(&self) -> bool {
        self.id.starts_with(TEMP_ID_PREFIX)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewComment {
    pub user_id: String,
    pub post_id: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_feed_row_with_joins() {
        let json = r#"{
            "id": "p1",
            "user_id": "u1",
            "movie_id": 42,
            "media_type": "movie",
            "title": "The Answer",
            "poster_path": null,
            "content": "Check out this amazing movie!",
            "likes": 3,
            "created_at": "2025-01-02T03:04:05Z",
            "updated_at": "2025-01-02T03:04:05Z",
            "user": {"id": "u1", "email": "a@example.com", "name": "Ann", "image": null},
            "isLiked": true,
            "comment_count": 2
        }"#;

        let post: CommunityPost = serde_json::from_str(json).unwrap();
        assert_eq!(post.is_liked, Some(true));
        assert_eq!(post.comment_count, 2);
        assert_eq!(post.user.as_ref().map(|u| u.display_name()), Some("Ann"));
        assert!(post.is_owned_by("u1"));
        assert!(!post.is_owned_by("u2"));
    }

    #[test]
    fn test_provisional_comment_marker() {
        let comment = Comment {
            id: format!("{}abc", TEMP_ID_PREFIX),
            user_id: "u1".to_string(),
            post_id: "p1".to_string(),
            content: "hi".to_string(),
            created_at: Utc::now(),
            user: None,
        };
        assert!(comment.is_provisional());
    }
}
