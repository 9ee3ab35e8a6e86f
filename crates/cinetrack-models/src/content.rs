use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which content namespace an id belongs to.
///
/// Movie and TV ids are not unique across the two, so every stored row
/// carries the discriminator next to the id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }

    /// Human label used in share captions ("movie" / "tv show")
    pub fn label(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv show",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "movie" | "movies" => Ok(MediaType::Movie),
            "tv" | "show" | "shows" => Ok(MediaType::Tv),
            _ => Err(format!("Invalid media type: {}. Use 'movie' or 'tv'", s)),
        }
    }
}

/// A movie or TV show as returned by list endpoints (trending, popular, search...)
///
/// Movies carry `title`/`release_date`, shows carry `name`/`first_air_date`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentItem {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_air_date: Option<String>,
    // Absent on popular/top-rated/discover listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub popularity: f64,
}

impl ContentItem {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or_default()
    }

    pub fn display_date(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .or(self.first_air_date.as_deref())
            .filter(|d| !d.is_empty())
    }

    /// Year part of the release (or first air) date
    pub fn year(&self) -> Option<u32> {
        self.display_date()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse().ok())
    }

    /// Media type, falling back to the namespace of the listing it came from
    pub fn media_type_or(&self, fallback: MediaType) -> MediaType {
        self.media_type.unwrap_or(fallback)
    }
}

/// An entry of a multi-type listing (`/search/multi`, `/trending/all/..`)
///
/// People show up in these listings too; callers that only render content
/// use [`Paged::content`] to drop them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "media_type", rename_all = "lowercase")]
pub enum SearchHit {
    Movie(ContentItem),
    Tv(ContentItem),
    Person {
        id: u64,
        name: String,
        #[serde(default)]
        profile_path: Option<String>,
    },
    #[serde(other)]
    Other,
}

impl SearchHit {
    /// Content item with its media type restored from the tag
    pub fn into_content(self) -> Option<ContentItem> {
        match self {
            SearchHit::Movie(mut item) => {
                item.media_type = Some(MediaType::Movie);
                Some(item)
            }
            SearchHit::Tv(mut item) => {
                item.media_type = Some(MediaType::Tv);
                Some(item)
            }
            SearchHit::Person { .. } | SearchHit::Other => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Video {
    pub id: String,
    pub key: String,
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VideoList {
    #[serde(default)]
    pub results: Vec<Video>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

/// Detail response for a single movie or show, with `videos` and `credits`
/// appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentDetails {
    #[serde(flatten)]
    pub item: ContentItem,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub episode_run_time: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_seasons: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_episodes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub videos: Option<VideoList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<Credits>,
}

impl ContentDetails {
    pub fn media_type(&self) -> MediaType {
        // Gateways always inject the type; movies are the upstream default
        self.item.media_type_or(MediaType::Movie)
    }

    /// First YouTube trailer, if any
    pub fn trailer(&self) -> Option<&Video> {
        self.videos.as_ref().and_then(|v| {
            v.results
                .iter()
                .find(|video| video.site == "YouTube" && video.video_type == "Trailer")
        })
    }
}

/// One page of a paginated listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paged<T> {
    pub page: u32,
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

impl<T> Paged<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            page: self.page,
            results: self.results.into_iter().map(f).collect(),
            total_pages: self.total_pages,
            total_results: self.total_results,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

impl Paged<SearchHit> {
    /// Movies and shows only
    pub fn content(self) -> Paged<ContentItem> {
        let results: Vec<ContentItem> = self
            .results
            .into_iter()
            .filter_map(SearchHit::into_content)
            .collect();
        Paged {
            page: self.page,
            results,
            total_pages: self.total_pages,
            total_results: self.total_results,
        }
    }
}
