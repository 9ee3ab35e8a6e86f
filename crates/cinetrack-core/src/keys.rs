use cinetrack_models::MediaType;
use std::fmt;

/// Ordered cache key: an operation name followed by its parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new(name: &str) -> Self {
        Self(vec![name.to_string()])
    }

    pub fn arg(mut self, segment: impl fmt::Display) -> Self {
        self.0.push(segment.to_string());
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Segment-wise prefix match, so `["watchlist"]` covers
    /// `["watchlist", user]` but not `["watchlist-check", ...]`
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

pub const COMMUNITY_POSTS: &str = "community-posts";
pub const COMMENTS: &str = "comments";
pub const WATCHLIST: &str = "watchlist";
pub const RATINGS: &str = "ratings";
pub const WATCHLIST_CHECK: &str = "watchlist-check";
pub const USER_RATING: &str = "user-rating";
pub const DETAILS: &str = "details";
pub const SIMILAR: &str = "similar";
pub const EXPLORE: &str = "explore";
pub const GENRES: &str = "genres";
pub const PERSON: &str = "person";
pub const PERSON_CREDITS: &str = "person-credits";
pub const TRENDING: &str = "trending";
pub const SEARCH: &str = "search";
pub const AVERAGE_RATING: &str = "average-rating";
pub const RECOMMENDATIONS: &str = "recommendations";
pub const USER: &str = "user";
pub const USER_PROFILE: &str = "user-profile";
pub const USER_WATCHLIST: &str = "user-watchlist";
pub const USER_RATINGS: &str = "user-ratings";

/// Prefix covering every key of one operation
pub fn prefix(name: &str) -> QueryKey {
    QueryKey::new(name)
}

/// Feed as seen by `viewer`; anonymous readers share the `anon` entry
pub fn community_posts(viewer: Option<&str>) -> QueryKey {
    QueryKey::new(COMMUNITY_POSTS).arg(viewer.unwrap_or("anon"))
}

pub fn comments(post_id: &str) -> QueryKey {
    QueryKey::new(COMMENTS).arg(post_id)
}

pub fn watchlist(user_id: &str) -> QueryKey {
    QueryKey::new(WATCHLIST).arg(user_id)
}

pub fn ratings(user_id: &str) -> QueryKey {
    QueryKey::new(RATINGS).arg(user_id)
}

pub fn watchlist_check(id: u64, media: MediaType, user_id: &str) -> QueryKey {
    QueryKey::new(WATCHLIST_CHECK).arg(id).arg(media).arg(user_id)
}

pub fn user_rating(id: u64, media: MediaType, user_id: &str) -> QueryKey {
    QueryKey::new(USER_RATING).arg(id).arg(media).arg(user_id)
}

pub fn average_rating(id: u64, media: MediaType) -> QueryKey {
    QueryKey::new(AVERAGE_RATING).arg(id).arg(media)
}

pub fn details(media: MediaType, id: u64) -> QueryKey {
    QueryKey::new(DETAILS).arg(media).arg(id)
}

pub fn similar(media: MediaType, id: u64) -> QueryKey {
    QueryKey::new(SIMILAR).arg(media).arg(id)
}

pub fn recommendations(media: MediaType, id: u64) -> QueryKey {
    QueryKey::new(RECOMMENDATIONS).arg(media).arg(id)
}

pub fn user(user_id: &str) -> QueryKey {
    QueryKey::new(USER).arg(user_id)
}

/// Public profile of any user
pub fn user_profile(user_id: &str) -> QueryKey {
    QueryKey::new(USER_PROFILE).arg(user_id)
}

pub fn user_watchlist(user_id: &str) -> QueryKey {
    QueryKey::new(USER_WATCHLIST).arg(user_id)
}

pub fn user_ratings(user_id: &str) -> QueryKey {
    QueryKey::new(USER_RATINGS).arg(user_id)
}

pub fn person(id: u64) -> QueryKey {
    QueryKey::new(PERSON).arg(id)
}

pub fn person_credits(id: u64) -> QueryKey {
    QueryKey::new(PERSON_CREDITS).arg(id)
}

pub fn trending() -> QueryKey {
    QueryKey::new(TRENDING).arg("all").arg("week")
}

pub fn search(query: &str, page: u32) -> QueryKey {
    QueryKey::new(SEARCH).arg(query).arg(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_match_is_per_segment() {
        let key = watchlist_check(42, MediaType::Movie, "u1");
        assert!(key.starts_with(&prefix(WATCHLIST_CHECK)));
        assert!(!key.starts_with(&prefix(WATCHLIST)));
        assert!(watchlist("u1").starts_with(&prefix(WATCHLIST)));
        assert!(key.starts_with(&key));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(details(MediaType::Tv, 1399).to_string(), "[details, tv, 1399]");
        assert_eq!(community_posts(None).to_string(), "[community-posts, anon]");
    }
}
