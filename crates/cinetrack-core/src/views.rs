use cinetrack_models::{
    Comment, CommunityPost, ContentDetails, ContentItem, Genre, MediaType, Paged, Person,
    PersonCredit, PersonCredits, Rating, UserProfile, WatchStatus, WatchlistEntry,
};
use cinetrack_sources::store::average;
use cinetrack_sources::{ContentSource, PersistenceStore, TimeWindow, TrendingScope};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use crate::identity::Session;
use crate::keys::{self, QueryKey};
use crate::query_cache::{QueryCache, QueryError};

pub const KNOWN_FOR_LIMIT: usize = 12;
pub const SIMILAR_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExploreTab {
    #[default]
    Trending,
    Movies,
    Tv,
}

impl ExploreTab {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExploreTab::Trending => "trending",
            ExploreTab::Movies => "movies",
            ExploreTab::Tv => "tv",
        }
    }

    pub fn media(&self) -> Option<MediaType> {
        match self {
            ExploreTab::Trending => None,
            ExploreTab::Movies => Some(MediaType::Movie),
            ExploreTab::Tv => Some(MediaType::Tv),
        }
    }
}

impl fmt::Display for ExploreTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExploreTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trending" => Ok(ExploreTab::Trending),
            "movies" | "movie" => Ok(ExploreTab::Movies),
            "tv" | "shows" => Ok(ExploreTab::Tv),
            _ => Err(format!("Invalid tab: {}. Use 'trending', 'movies', or 'tv'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExploreCategory {
    #[default]
    Popular,
    TopRated,
}

impl ExploreCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExploreCategory::Popular => "popular",
            ExploreCategory::TopRated => "top_rated",
        }
    }
}

impl fmt::Display for ExploreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExploreCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "popular" => Ok(ExploreCategory::Popular),
            "top_rated" | "top" => Ok(ExploreCategory::TopRated),
            _ => Err(format!("Invalid category: {}. Use 'popular' or 'top_rated'", s)),
        }
    }
}

/// Browse position on the explore screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExploreState {
    tab: ExploreTab,
    category: ExploreCategory,
    page: u32,
    genres: Vec<u32>,
}

impl Default for ExploreState {
    fn default() -> Self {
        Self {
            tab: ExploreTab::default(),
            category: ExploreCategory::default(),
            page: 1,
            genres: Vec::new(),
        }
    }
}

impl ExploreState {
    pub fn new(tab: ExploreTab, category: ExploreCategory) -> Self {
        Self { tab, category, ..Default::default() }
    }

    pub fn tab(&self) -> ExploreTab {
        self.tab
    }

    pub fn category(&self) -> ExploreCategory {
        self.category
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn genres(&self) -> &[u32] {
        &self.genres
    }

    /// Switching tab starts over at page 1 and drops the genre filter,
    /// since genre ids differ between movies and tv
    pub fn set_tab(&mut self, tab: ExploreTab) {
        if self.tab != tab {
            self.tab = tab;
            self.page = 1;
            self.genres.clear();
        }
    }

    pub fn set_category(&mut self, category: ExploreCategory) {
        if self.category != category {
            self.category = category;
            self.page = 1;
        }
    }

    pub fn set_genres(&mut self, genres: Vec<u32>) {
        self.genres = genres;
        self.page = 1;
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn next_page(&mut self) {
        self.page = self.page.saturating_add(1);
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    pub fn key(&self) -> QueryKey {
        QueryKey::new(keys::EXPLORE)
            .arg(self.tab)
            .arg(self.category)
            .arg(self.page)
            .arg(genre_segment(&self.genres))
    }
}

fn genre_segment(genres: &[u32]) -> String {
    genres.iter().map(|g| g.to_string()).collect::<Vec<_>>().join(",")
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailView {
    pub details: ContentDetails,
    pub similar: Vec<ContentItem>,
    /// `None` when nobody is signed in
    pub in_watchlist: Option<bool>,
    pub user_rating: Option<Rating>,
    pub average_rating: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonView {
    pub person: Person,
    pub known_for: Vec<PersonCredit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub user: Option<UserProfile>,
    pub watchlist: Vec<WatchlistEntry>,
    pub ratings: Vec<Rating>,
    pub status_counts: Vec<(WatchStatus, usize)>,
    pub average_rating: f64,
}

impl ProfileView {
    fn new(user: Option<UserProfile>, watchlist: Vec<WatchlistEntry>, ratings: Vec<Rating>) -> Self {
        let status_counts = WatchStatus::ALL
            .iter()
            .map(|status| (*status, watchlist.iter().filter(|e| e.status == *status).count()))
            .collect();
        let average_rating = average(ratings.iter().map(|r| r.rating));
        Self {
            user,
            watchlist,
            ratings,
            status_counts,
            average_rating,
        }
    }

    pub fn count(&self, status: WatchStatus) -> usize {
        self.status_counts
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, n)| *n)
    }
}

/// Read side: every screen's data, loaded through the query cache
pub struct Views {
    content: Arc<dyn ContentSource>,
    store: Arc<dyn PersistenceStore>,
    cache: Arc<QueryCache>,
}

impl Views {
    pub fn new(content: Arc<dyn ContentSource>, store: Arc<dyn PersistenceStore>, cache: Arc<QueryCache>) -> Self {
        Self { content, store, cache }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub async fn trending(&self) -> Result<Paged<ContentItem>, QueryError> {
        let content = Arc::clone(&self.content);
        self.cache
            .fetch(&keys::trending(), move || async move {
                content
                    .trending(TrendingScope::All, TimeWindow::Week)
                    .await
                    .map(Paged::content)
            })
            .await
    }

    pub async fn search(&self, query: &str, page: u32) -> Result<Paged<ContentItem>, QueryError> {
        let content = Arc::clone(&self.content);
        let query = query.trim().to_string();
        self.cache
            .fetch(&keys::search(&query, page), move || async move {
                content.search_multi(&query, page).await.map(Paged::content)
            })
            .await
    }

    /// Trending ignores category and page; a genre filter switches
    /// movies/tv over to discover
    pub async fn explore(&self, state: &ExploreState) -> Result<Paged<ContentItem>, QueryError> {
        let Some(media) = state.tab.media() else {
            return self.trending().await;
        };
        let content = Arc::clone(&self.content);
        let category = state.category;
        let page = state.page;
        let genres = state.genres.clone();
        self.cache
            .fetch(&state.key(), move || async move {
                if !genres.is_empty() {
                    content.discover_by_genres(media, &genres, page).await
                } else {
                    match category {
                        ExploreCategory::Popular => content.popular(media, page).await,
                        ExploreCategory::TopRated => content.top_rated(media, page).await,
                    }
                }
            })
            .await
    }

    pub async fn genres(&self, tab: ExploreTab) -> Result<Vec<Genre>, QueryError> {
        let Some(media) = tab.media() else {
            return Ok(Vec::new());
        };
        let content = Arc::clone(&self.content);
        self.cache
            .fetch(&QueryKey::new(keys::GENRES).arg(tab), move || async move {
                content.genres(media).await
            })
            .await
    }

    pub async fn details(&self, media: MediaType, id: u64) -> Result<ContentDetails, QueryError> {
        let content = Arc::clone(&self.content);
        self.cache
            .fetch(&keys::details(media, id), move || async move { content.details(media, id).await })
            .await
    }

    pub async fn similar(&self, media: MediaType, id: u64) -> Result<Paged<ContentItem>, QueryError> {
        let content = Arc::clone(&self.content);
        self.cache
            .fetch(&keys::similar(media, id), move || async move {
                content.similar(media, id, 1).await.map(|page| {
                    // Listing rows leave the type out
                    page.map(|mut item| {
                        item.media_type.get_or_insert(media);
                        item
                    })
                })
            })
            .await
    }

    pub async fn recommendations(&self, media: MediaType, id: u64) -> Result<Paged<ContentItem>, QueryError> {
        let content = Arc::clone(&self.content);
        self.cache
            .fetch(&keys::recommendations(media, id), move || async move {
                content.recommendations(media, id, 1).await.map(|page| {
                    page.map(|mut item| {
                        item.media_type.get_or_insert(media);
                        item
                    })
                })
            })
            .await
    }

    pub async fn is_in_watchlist(&self, id: u64, media: MediaType, user_id: &str) -> Result<bool, QueryError> {
        let store = Arc::clone(&self.store);
        let user_id = user_id.to_string();
        self.cache
            .fetch(&keys::watchlist_check(id, media, &user_id), move || async move {
                store.is_in_watchlist(&user_id, id, media).await
            })
            .await
    }

    pub async fn user_rating(&self, id: u64, media: MediaType, user_id: &str) -> Result<Option<Rating>, QueryError> {
        let store = Arc::clone(&self.store);
        let user_id = user_id.to_string();
        self.cache
            .fetch(&keys::user_rating(id, media, &user_id), move || async move {
                store.get_rating(&user_id, id, media).await
            })
            .await
    }

    pub async fn average_rating(&self, id: u64, media: MediaType) -> Result<f64, QueryError> {
        let store = Arc::clone(&self.store);
        self.cache
            .fetch(&keys::average_rating(id, media), move || async move {
                store.average_rating(id, media).await
            })
            .await
    }

    pub async fn detail_view(&self, media: MediaType, id: u64, viewer: Option<&Session>) -> Result<DetailView, QueryError> {
        let (details, similar, average_rating) = futures::try_join!(
            self.details(media, id),
            self.similar(media, id),
            self.average_rating(id, media),
        )?;

        let (in_watchlist, user_rating) = match viewer {
            Some(viewer) => {
                let (listed, rating) = futures::try_join!(
                    self.is_in_watchlist(id, media, &viewer.user_id),
                    self.user_rating(id, media, &viewer.user_id),
                )?;
                (Some(listed), rating)
            }
            None => (None, None),
        };

        Ok(DetailView {
            details,
            similar: similar.results.into_iter().take(SIMILAR_LIMIT).collect(),
            in_watchlist,
            user_rating,
            average_rating,
        })
    }

    pub async fn person_view(&self, id: u64) -> Result<PersonView, QueryError> {
        let person_source = Arc::clone(&self.content);
        let credits_source = Arc::clone(&self.content);
        let person_key = keys::person(id);
        let credits_key = keys::person_credits(id);
        let (person, credits): (Person, PersonCredits) = futures::try_join!(
            self.cache
                .fetch(&person_key, move || async move { person_source.person(id).await }),
            self.cache.fetch(&credits_key, move || async move {
                credits_source.person_credits(id).await
            }),
        )?;
        Ok(PersonView {
            person,
            known_for: credits.known_for(KNOWN_FOR_LIMIT).into_iter().cloned().collect(),
        })
    }

    pub async fn watchlist(&self, user_id: &str) -> Result<Vec<WatchlistEntry>, QueryError> {
        let store = Arc::clone(&self.store);
        let user_id = user_id.to_string();
        self.cache
            .fetch(&keys::watchlist(&user_id), move || async move { store.list_watchlist(&user_id).await })
            .await
    }

    pub async fn ratings(&self, user_id: &str) -> Result<Vec<Rating>, QueryError> {
        let store = Arc::clone(&self.store);
        let user_id = user_id.to_string();
        self.cache
            .fetch(&keys::ratings(&user_id), move || async move { store.list_ratings(&user_id).await })
            .await
    }

    pub async fn profile_view(&self, viewer: &Session) -> Result<ProfileView, QueryError> {
        let store = Arc::clone(&self.store);
        let user_id = viewer.user_id.clone();
        let user_key = keys::user(&viewer.user_id);
        let (user, watchlist, ratings) = futures::try_join!(
            self.cache.fetch(&user_key, move || async move {
                store.get_user(&user_id).await
            }),
            self.watchlist(&viewer.user_id),
            self.ratings(&viewer.user_id),
        )?;

        Ok(ProfileView::new(user, watchlist, ratings))
    }

    /// Any user's public profile; `None` when no such user exists
    pub async fn user_profile(&self, user_id: &str) -> Result<Option<ProfileView>, QueryError> {
        let user_store = Arc::clone(&self.store);
        let id = user_id.to_string();
        let user: Option<UserProfile> = self
            .cache
            .fetch(&keys::user_profile(user_id), move || async move { user_store.get_user(&id).await })
            .await?;
        let Some(user) = user else {
            return Ok(None);
        };

        let watchlist_store = Arc::clone(&self.store);
        let ratings_store = Arc::clone(&self.store);
        let watchlist_id = user.id.clone();
        let ratings_id = user.id.clone();
        let watchlist_key = keys::user_watchlist(&user.id);
        let ratings_key = keys::user_ratings(&user.id);
        let (watchlist, ratings): (Vec<WatchlistEntry>, Vec<Rating>) = futures::try_join!(
            self.cache.fetch(&watchlist_key, move || async move {
                watchlist_store.list_watchlist(&watchlist_id).await
            }),
            self.cache.fetch(&ratings_key, move || async move {
                ratings_store.list_ratings(&ratings_id).await
            }),
        )?;

        Ok(Some(ProfileView::new(Some(user), watchlist, ratings)))
    }

    pub async fn feed(&self, viewer: Option<&Session>) -> Result<Vec<CommunityPost>, QueryError> {
        let store = Arc::clone(&self.store);
        let viewer_id = viewer.map(|v| v.user_id.clone());
        self.cache
            .fetch(&keys::community_posts(viewer_id.as_deref()), move || async move {
                store.list_posts(viewer_id.as_deref()).await
            })
            .await
    }

    pub async fn comments(&self, post_id: &str) -> Result<Vec<Comment>, QueryError> {
        let store = Arc::clone(&self.store);
        let post_id = post_id.to_string();
        self.cache
            .fetch(&keys::comments(&post_id), move || async move { store.list_comments(&post_id).await })
            .await
    }
}
