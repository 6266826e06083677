//! HTTP client for the rightsizer server

use anyhow::{Context, Result};
use engine_lib::{RecommendationFilter, SummarizeQuery, SummarizeResult, WorkloadRecommendations};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// Client for the summarize and recommendations endpoints
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

/// Error body returned by the server on 4xx/5xx
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub httpcode: u16,
    pub message: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// GET `path` with `query` encoded as URL parameters
    pub async fn get<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => anyhow::bail!("API error ({}): {}", err.httpcode, err.message),
                Err(_) => anyhow::bail!("API error ({}): {}", status, body),
            }
        }

        response.json().await.context("Failed to parse response")
    }

    pub async fn summarize(&self, query: &SummarizeQuery) -> Result<Vec<SummarizeResult>> {
        self.get("summarize", query).await
    }

    pub async fn recommendations(
        &self,
        filter: &RecommendationFilter,
    ) -> Result<Vec<WorkloadRecommendations>> {
        self.get("recommendations", filter).await
    }
}
