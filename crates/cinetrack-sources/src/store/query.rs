use reqwest::Url;
use std::fmt::Display;
use crate::error::StoreError;

pub const USERS: &str = "users";
pub const WATCHLIST: &str = "watchlist";
pub const RATINGS: &str = "ratings";
pub const POSTS: &str = "community_posts";
pub const COMMENTS: &str = "comments";
pub const POST_LIKES: &str = "post_likes";

/// Embedded author projection used by feed and comment reads
pub const USER_EMBED: &str = "user:users(id,name,email,image)";

/// PostgREST filter/select builder for one table
///
/// Only the operators this client needs: `eq`, `in`, ordering and
/// `on_conflict`. Values are URL-encoded when the URL is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: &'static str,
    params: Vec<(String, String)>,
}

impl Query {
    pub fn from(table: &'static str) -> Self {
        Self { table, params: Vec::new() }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.params.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    /// `column=in.("a","b")`; values are quoted so commas inside them survive
    pub fn in_list<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Display,
    {
        let quoted: Vec<String> = values
            .into_iter()
            .map(|v| format!("\"{}\"", v.to_string().replace('\\', "\\\\").replace('"', "\\\"")))
            .collect();
        self.params.push((column.to_string(), format!("in.({})", quoted.join(","))));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.params.push(("order".to_string(), format!("{}.{}", column, direction)));
        self
    }

    pub fn on_conflict(mut self, columns: &str) -> Self {
        self.params.push(("on_conflict".to_string(), columns.to_string()));
        self
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// `{rest_url}/{table}?...`
    pub fn url(&self, rest_url: &str) -> Result<Url, StoreError> {
        let raw = format!("{}/{}", rest_url.trim_end_matches('/'), self.table);
        Url::parse_with_params(&raw, &self.params).map_err(|e| StoreError::Url(format!("{}: {}", raw, e)))
    }
}

/// `{rest_url}/rpc/{function}`
pub fn rpc_url(rest_url: &str, function: &str) -> Result<Url, StoreError> {
    let raw = format!("{}/rpc/{}", rest_url.trim_end_matches('/'), function);
    Url::parse(&raw).map_err(|e| StoreError::Url(format!("{}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const REST: &str = "https://abc.supabase.co/rest/v1/";

    #[test]
    fn test_single_row_lookup_filters() {
        let url = Query::from(WATCHLIST)
            .select("*")
            .eq("user_id", "u-1")
            .eq("movie_id", 42)
            .eq("media_type", "movie")
            .url(REST)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://abc.supabase.co/rest/v1/watchlist?select=*&user_id=eq.u-1&movie_id=eq.42&media_type=eq.movie"
        );
    }

    #[test]
    fn test_feed_select_with_embeds_and_order() {
        let query = Query::from(POSTS)
            .select(&format!("*,{},comments:comments(count)", USER_EMBED))
            .order("created_at", false);
        assert_eq!(
            query.params(),
            &[
                ("select".to_string(), "*,user:users(id,name,email,image),comments:comments(count)".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_in_list_quotes_values() {
        let query = Query::from(POST_LIKES).in_list("post_id", ["p1", "p,2", "p\"3"]);
        assert_eq!(query.params()[0].1, r#"in.("p1","p,2","p\"3")"#);
    }

    #[test]
    fn test_upsert_conflict_target() {
        let url = Query::from(RATINGS)
            .on_conflict("user_id,movie_id,media_type")
            .url(REST)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://abc.supabase.co/rest/v1/ratings?on_conflict=user_id%2Cmovie_id%2Cmedia_type"
        );
    }

    #[test]
    fn test_rpc_url() {
        assert_eq!(
            rpc_url(REST, "toggle_post_like").unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/rpc/toggle_post_like"
        );
    }
}
