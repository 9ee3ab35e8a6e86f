use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::content::MediaType;
use crate::snapshot::ContentSnapshot;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    #[default]
    PlanToWatch,
    Watching,
    Completed,
}

impl WatchStatus {
    pub const ALL: [WatchStatus; 3] = [WatchStatus::PlanToWatch, WatchStatus::Watching, WatchStatus::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            WatchStatus::PlanToWatch => "plan_to_watch",
            WatchStatus::Watching => "watching",
            WatchStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "plan_to_watch" | "plan" => Ok(WatchStatus::PlanToWatch),
            "watching" => Ok(WatchStatus::Watching),
            "completed" | "done" => Ok(WatchStatus::Completed),
            _ => Err(format!(
                "Invalid status: {}. Use 'plan_to_watch', 'watching', or 'completed'",
                s
            )),
        }
    }
}

/// A `watchlist` row. Unique per (user_id, movie_id, media_type).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistEntry {
    pub id: String,
    pub user_id: String,
    pub movie_id: u64,
    pub media_type: MediaType,
    #[serde(flatten)]
    pub snapshot: ContentSnapshot,
    pub status: WatchStatus,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewWatchlistEntry {
    pub user_id: String,
    pub movie_id: u64,
    pub media_type: MediaType,
    #[serde(flatten)]
    pub snapshot: ContentSnapshot,
    pub status: WatchStatus,
}
