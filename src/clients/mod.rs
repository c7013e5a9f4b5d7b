// Upstream feed clients. All of them share one `reqwest::Client` so the
// connection pool and request timeout are configured in a single place.

pub mod bike;
pub mod search;
pub mod transit;

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::{FetchError, Result};

pub use bike::{BikeStationClient, JoinOutcome};
pub use search::SearchClient;
pub use transit::TransitClient;

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(HttpFetcher { client })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkError(format!("Failed to fetch {}: {}", url, e)))?;

        Self::read_json(url, response).await
    }

    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| FetchError::NetworkError(format!("Failed to post to {}: {}", url, e)))?;

        Self::read_json(url, response).await
    }

    async fn read_json<T: DeserializeOwned>(url: &str, response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(FetchError::NetworkError(format!(
                "{} returned error: {}",
                url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::NetworkError(format!("Failed to read response: {}", e)))?;

        serde_json::from_str(&body)
            .map_err(|e| FetchError::ParseError(format!("Invalid JSON response from {}: {}", url, e)))
    }
}
