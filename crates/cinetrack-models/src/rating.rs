use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::content::MediaType;
use crate::snapshot::ContentSnapshot;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rating must be between {min} and {max}, got {score}", min = MIN_SCORE, max = MAX_SCORE)]
pub struct RatingError {
    pub score: u8,
}

/// A `ratings` row. Unique per (user_id, movie_id, media_type); writes upsert on that key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub id: String,
    pub user_id: String,
    pub movie_id: u64,
    pub media_type: MediaType,
    pub rating: u8, // 1-10 integer
    #[serde(default)]
    pub review: Option<String>,
    #[serde(flatten)]
    pub snapshot: ContentSnapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rating {
    pub fn validate_score(score: u8) -> Result<u8, RatingError> {
        if (MIN_SCORE..=MAX_SCORE).contains(&score) {
            Ok(score)
        } else {
            Err(RatingError { score })
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewRating {
    pub user_id: String,
    pub movie_id: u64,
    pub media_type: MediaType,
    pub rating: u8,
    pub review: Option<String>,
    #[serde(flatten)]
    pub snapshot: ContentSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_score_bounds() {
        assert!(Rating::validate_score(0).is_err());
        assert_eq!(Rating::validate_score(1), Ok(1));
        assert_eq!(Rating::validate_score(10), Ok(10));
        assert_eq!(Rating::validate_score(11), Err(RatingError { score: 11 }));
    }

    #[test]
    fn test_rating_error_message() {
        assert_eq!(
            RatingError { score: 0 }.to_string(),
            "rating must be between 1 and 10, got 0"
        );
    }

    #[test]
    fn test_rating_row_with_missing_snapshot_fields() {
        let json = r#"{
            "id": "r1",
            "user_id": "u1",
            "movie_id": 7,
            "media_type": "tv",
            "rating": 9,
            "review": "great",
            "created_at": "2025-01-02T03:04:05Z",
            "updated_at": "2025-01-02T03:04:05Z"
        }"#;

        let rating: Rating = serde_json::from_str(json).unwrap();
        assert_eq!(rating.rating, 9);
        assert_eq!(rating.review.as_deref(), Some("great"));
        assert_eq!(rating.snapshot, ContentSnapshot::default());
    }
}
