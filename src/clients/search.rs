use serde::{Deserialize, Serialize};
use tracing::debug;

use super::HttpFetcher;
use crate::error::{FetchError, Result};
use crate::models::Position;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    /// `[lat, lon]`
    position: (f64, f64),
}

impl From<SearchResponse> for Vec<Position> {
    fn from(response: SearchResponse) -> Self {
        response
            .items
            .into_iter()
            .map(|item| Position::new(item.position.0, item.position.1))
            .collect()
    }
}

/// Free-text place search. The endpoint is optional; without one every
/// query fails with [`FetchError::NotConfigured`].
#[derive(Debug, Clone)]
pub struct SearchClient {
    http: HttpFetcher,
    url: Option<String>,
}

impl SearchClient {
    pub fn new(http: HttpFetcher, url: Option<String>) -> Self {
        SearchClient { http, url }
    }

    /// Positions ranked by the service. An empty list means "no match,
    /// clear the pins" and is not an error.
    pub async fn search(&self, query: &str) -> Result<Vec<Position>> {
        let url = self.url.as_deref().ok_or(FetchError::NotConfigured("search"))?;

        let response: SearchResponse = self.http.post_json(url, &SearchRequest { query }).await?;
        let positions: Vec<Position> = response.into();
        debug!("Search '{}' returned {} positions", query, positions.len());

        Ok(positions)
    }
}
