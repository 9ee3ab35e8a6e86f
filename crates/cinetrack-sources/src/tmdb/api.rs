use cinetrack_models::{ContentDetails, ContentItem, Genre, MediaType, Paged, Person, PersonCredits, SearchHit};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use crate::error::ContentError;

/// Which namespace `/trending` should cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrendingScope {
    All,
    Movie,
    Tv,
}

impl TrendingScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendingScope::All => "all",
            TrendingScope::Movie => "movie",
            TrendingScope::Tv => "tv",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeWindow {
    Day,
    Week,
}

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
        }
    }
}

/// Connection details shared by every call
#[derive(Clone)]
pub struct TmdbEndpoint {
    pub base_url: String,
    pub api_key: String,
    pub language: Option<String>,
}

impl TmdbEndpoint {
    /// Build the full URL for `path`, with the API key and any extra query params
    pub fn url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, ContentError> {
        let base = self.base_url.trim_end_matches('/');
        let mut query: Vec<(&str, String)> = vec![("api_key", self.api_key.clone())];
        if let Some(language) = &self.language {
            query.push(("language", language.clone()));
        }
        query.extend(params.iter().cloned());

        Url::parse_with_params(&format!("{}{}", base, path), &query)
            .map_err(|e| ContentError::Url(format!("{}{}: {}", base, path, e)))
    }
}

/// Issue a GET and decode the body; non-2xx statuses surface as errors
async fn get_json<T>(
    client: &Client,
    endpoint: &TmdbEndpoint,
    path: &str,
    params: &[(&str, String)],
) -> Result<T, ContentError>
where
    T: DeserializeOwned,
{
    let url = endpoint.url(path, params)?;
    debug!("GET {}", path);

    let response = client
        .get(url)
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|source| ContentError::Http { path: path.to_string(), source })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ContentError::Status {
            path: path.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|source| ContentError::Http { path: path.to_string(), source })?;
    serde_json::from_slice(&bytes).map_err(|source| ContentError::Decode { path: path.to_string(), source })
}

fn page_param(page: u32) -> (&'static str, String) {
    ("page", page.max(1).to_string())
}

/// Comma-joined genre list for `with_genres` (comma means AND upstream)
pub fn genre_filter(genre_ids: &[u32]) -> String {
    genre_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

pub async fn get_trending(
    client: &Client,
    endpoint: &TmdbEndpoint,
    scope: TrendingScope,
    window: TimeWindow,
) -> Result<Paged<SearchHit>, ContentError> {
    let path = format!("/trending/{}/{}", scope.as_str(), window.as_str());
    get_json(client, endpoint, &path, &[]).await
}

pub async fn search_multi(
    client: &Client,
    endpoint: &TmdbEndpoint,
    query: &str,
    page: u32,
) -> Result<Paged<SearchHit>, ContentError> {
    get_json(
        client,
        endpoint,
        "/search/multi",
        &[("query", query.to_string()), page_param(page)],
    )
    .await
}

pub async fn get_movie_details(client: &Client, endpoint: &TmdbEndpoint, id: u64) -> Result<ContentDetails, ContentError> {
    get_details(client, endpoint, MediaType::Movie, id).await
}

pub async fn get_tv_details(client: &Client, endpoint: &TmdbEndpoint, id: u64) -> Result<ContentDetails, ContentError> {
    get_details(client, endpoint, MediaType::Tv, id).await
}

async fn get_details(
    client: &Client,
    endpoint: &TmdbEndpoint,
    media: MediaType,
    id: u64,
) -> Result<ContentDetails, ContentError> {
    let path = format!("/{}/{}", media.as_str(), id);
    let mut details: ContentDetails = get_json(
        client,
        endpoint,
        &path,
        &[("append_to_response", "videos,credits".to_string())],
    )
    .await?;
    // Upstream omits the discriminator on detail responses
    details.item.media_type = Some(media);
    Ok(details)
}

pub async fn get_popular(
    client: &Client,
    endpoint: &TmdbEndpoint,
    media: MediaType,
    page: u32,
) -> Result<Paged<ContentItem>, ContentError> {
    let path = format!("/{}/popular", media.as_str());
    get_json(client, endpoint, &path, &[page_param(page)]).await
}

pub async fn get_top_rated(
    client: &Client,
    endpoint: &TmdbEndpoint,
    media: MediaType,
    page: u32,
) -> Result<Paged<ContentItem>, ContentError> {
    let path = format!("/{}/top_rated", media.as_str());
    get_json(client, endpoint, &path, &[page_param(page)]).await
}

pub async fn discover_by_genres(
    client: &Client,
    endpoint: &TmdbEndpoint,
    media: MediaType,
    genre_ids: &[u32],
    page: u32,
) -> Result<Paged<ContentItem>, ContentError> {
    let path = format!("/discover/{}", media.as_str());
    get_json(
        client,
        endpoint,
        &path,
        &[
            ("with_genres", genre_filter(genre_ids)),
            page_param(page),
            ("sort_by", "popularity.desc".to_string()),
        ],
    )
    .await
}

#[derive(Debug, Deserialize)]
struct GenreList {
    genres: Vec<Genre>,
}

pub async fn get_genres(client: &Client, endpoint: &TmdbEndpoint, media: MediaType) -> Result<Vec<Genre>, ContentError> {
    let path = format!("/genre/{}/list", media.as_str());
    let list: GenreList = get_json(client, endpoint, &path, &[]).await?;
    Ok(list.genres)
}

pub async fn get_similar(
    client: &Client,
    endpoint: &TmdbEndpoint,
    media: MediaType,
    id: u64,
    page: u32,
) -> Result<Paged<ContentItem>, ContentError> {
    let path = format!("/{}/{}/similar", media.as_str(), id);
    get_json(client, endpoint, &path, &[page_param(page)]).await
}

pub async fn get_recommendations(
    client: &Client,
    endpoint: &TmdbEndpoint,
    media: MediaType,
    id: u64,
    page: u32,
) -> Result<Paged<ContentItem>, ContentError> {
    let path = format!("/{}/{}/recommendations", media.as_str(), id);
    get_json(client, endpoint, &path, &[page_param(page)]).await
}

pub async fn get_person(client: &Client, endpoint: &TmdbEndpoint, id: u64) -> Result<Person, ContentError> {
    get_json(client, endpoint, &format!("/person/{}", id), &[]).await
}

pub async fn get_person_credits(client: &Client, endpoint: &TmdbEndpoint, id: u64) -> Result<PersonCredits, ContentError> {
    get_json(client, endpoint, &format!("/person/{}/combined_credits", id), &[]).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> TmdbEndpoint {
        TmdbEndpoint {
            base_url: "https://api.themoviedb.org/3/".to_string(),
            api_key: "k3y".to_string(),
            language: None,
        }
    }

    #[test]
    fn test_url_carries_api_key_and_params() {
        let url = endpoint()
            .url("/search/multi", &[("query", "the matrix".to_string()), page_param(2)])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.themoviedb.org/3/search/multi?api_key=k3y&query=the+matrix&page=2"
        );
    }

    #[test]
    fn test_url_with_language() {
        let mut endpoint = endpoint();
        endpoint.language = Some("id-ID".to_string());
        let url = endpoint.url("/movie/popular", &[page_param(0)]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.themoviedb.org/3/movie/popular?api_key=k3y&language=id-ID&page=1"
        );
    }

    #[test]
    fn test_genre_filter_joins_with_commas() {
        assert_eq!(genre_filter(&[28, 12, 878]), "28,12,878");
        assert_eq!(genre_filter(&[]), "");
    }

    #[test]
    fn test_invalid_base_url() {
        let endpoint = TmdbEndpoint {
            base_url: "not a url".to_string(),
            api_key: "k".to_string(),
            language: None,
        };
        assert!(matches!(endpoint.url("/x", &[]), Err(ContentError::Url(_))));
    }
}
