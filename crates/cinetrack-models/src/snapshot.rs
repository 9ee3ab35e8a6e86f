use serde::{Deserialize, Serialize};
use crate::content::ContentDetails;

/// Point-in-time copy of content metadata stored on watchlist and rating rows
///
/// Rows keep rendering even if the upstream entry later changes or disappears,
/// so these fields are copied once at write time and never refreshed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ContentSnapshot {
    pub title: String,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
    pub backdrop_path: Option<String>,
    pub genre_ids: Vec<u32>,
    pub vote_average: f64,
    pub release_date: Option<String>,
}

impl ContentSnapshot {
    pub fn from_details(details: &ContentDetails) -> Self {
        let item = &details.item;
        Self {
            title: item.display_title().to_string(),
            poster_path: item.poster_path.clone(),
            overview: Some(item.overview.clone()).filter(|o| !o.is_empty()),
            backdrop_path: item.backdrop_path.clone(),
            genre_ids: details.genres.iter().map(|g| g.id).collect(),
            vote_average: item.vote_average,
            release_date: item.display_date().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentItem, Genre, MediaType};

    #[test]
    fn test_snapshot_from_tv_details() {
        let details = ContentDetails {
            item: ContentItem {
                id: 1399,
                title: None,
                name: Some("Game of Thrones".to_string()),
                overview: String::new(),
                poster_path: Some("/got.jpg".to_string()),
                backdrop_path: None,
                vote_average: 8.4,
                release_date: None,
                first_air_date: Some("2011-04-17".to_string()),
                media_type: Some(MediaType::Tv),
                genre_ids: vec![],
                popularity: 0.0,
            },
            genres: vec![Genre { id: 18, name: "Drama".to_string() }, Genre { id: 10765, name: "Sci-Fi & Fantasy".to_string() }],
            runtime: None,
            episode_run_time: vec![60],
            number_of_seasons: Some(8),
            number_of_episodes: Some(73),
            videos: None,
            credits: None,
        };

        let snapshot = ContentSnapshot::from_details(&details);
        assert_eq!(snapshot.title, "Game of Thrones");
        assert_eq!(snapshot.overview, None);
        assert_eq!(snapshot.genre_ids, vec![18, 10765]);
        assert_eq!(snapshot.release_date.as_deref(), Some("2011-04-17"));
    }
}
