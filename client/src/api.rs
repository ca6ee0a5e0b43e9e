use async_trait::async_trait;
use precept_core::ClientConfig;
use precept_core::PollError;
use precept_protocol::ConnectedDataSource;
use precept_protocol::DataSourceType;
use precept_protocol::SearchResultDetails;
use precept_protocol::StatusSample;
use reqwest::RequestBuilder;
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::poller::StatusSource;

const INSTALLATION_HEADER: &str = "uuid";

/// Thin typed wrapper over the search server's HTTP API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    status_timeout: Duration,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Url::parse(&config.base_url)
            .map_err(|err| ApiError::InvalidUrl(format!("{}: {err}", config.base_url)))?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            status_timeout: config.status_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /status`, bounded by the status timeout and classified for the
    /// poller.
    pub async fn status(&self) -> Result<StatusSample, PollError> {
        let resp = self
            .http
            .get(self.endpoint("/status"))
            .timeout(self.status_timeout)
            .send()
            .await
            .map_err(classify)?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(PollError::Server { status, body });
        }
        resp.json()
            .await
            .map_err(|err| PollError::Network(format!("invalid status body: {err}")))
    }

    pub async fn search(
        &self,
        query: &str,
        installation_id: &Uuid,
    ) -> Result<Vec<SearchResultDetails>, ApiError> {
        let request = self
            .http
            .get(self.endpoint("/search"))
            .query(&[("query", query)])
            .header(INSTALLATION_HEADER, installation_id.to_string());
        let results: Vec<SearchResultDetails> = self.get_json("/search", request).await?;
        debug!(query, hits = results.len(), "search completed");
        Ok(results)
    }

    pub async fn data_source_types(&self) -> Result<Vec<DataSourceType>, ApiError> {
        let path = "/data-sources/types";
        self.get_json(path, self.http.get(self.endpoint(path))).await
    }

    pub async fn connected_data_sources(&self) -> Result<Vec<ConnectedDataSource>, ApiError> {
        let path = "/data-sources/connected";
        self.get_json(path, self.http.get(self.endpoint(path))).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T>(&self, endpoint: &str, request: RequestBuilder) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let resp = request.send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status,
                body: error_body(body),
            });
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl StatusSource for ApiClient {
    async fn fetch_status(&self) -> Result<StatusSample, PollError> {
        self.status().await
    }
}

fn classify(err: reqwest::Error) -> PollError {
    if err.is_timeout() {
        PollError::Timeout
    } else {
        PollError::Network(err.to_string())
    }
}

/// Error bodies are either a bare JSON string or plain text.
fn error_body(body: String) -> String {
    match serde_json::from_str::<Value>(&body) {
        Ok(Value::String(text)) => text,
        _ => body,
    }
}
