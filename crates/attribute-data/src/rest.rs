//! ArcGIS REST style feature service client.

use std::time::Duration;

use async_trait::async_trait;
use map_common::{Attributes, MapError, MapResult};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::service::{parse_metadata, parse_query_response, FeatureService, PageQuery, ServiceMetadata};

/// HTTP settings for map service requests.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Token appended to every request, for secured services
    #[serde(default)]
    pub token: Option<String>,
}

fn default_request_timeout() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            token: None,
        }
    }
}

/// Thin JSON-over-HTTP client shared by the feature and spatial services.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    token: Option<String>,
}

impl RestClient {
    pub fn new(config: &HttpConfig) -> MapResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| MapError::InvalidConfig(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            token: config.token.clone(),
        })
    }

    /// GET `url` with `f=json` plus the given parameters, returning the body.
    pub async fn get_json_text(&self, url: &str, params: &[(&str, String)]) -> MapResult<String> {
        let mut query: Vec<(&str, String)> = Vec::with_capacity(params.len() + 2);
        query.push(("f", "json".to_string()));
        query.extend(params.iter().cloned());
        if let Some(token) = &self.token {
            query.push(("token", token.clone()));
        }

        let response = self
            .client
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MapError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| transport_error(url, e))
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> MapError {
    if err.is_timeout() {
        MapError::Timeout
    } else {
        MapError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

/// Feature service reached over HTTP.
#[derive(Debug, Clone)]
pub struct RestFeatureService {
    client: RestClient,
}

impl RestFeatureService {
    pub fn new(config: &HttpConfig) -> MapResult<Self> {
        Ok(Self {
            client: RestClient::new(config)?,
        })
    }

    pub fn with_client(client: RestClient) -> Self {
        Self { client }
    }
}

/// Query parameters for one attribute page: all fields, no geometry.
pub fn page_params(query: &PageQuery) -> Vec<(&'static str, String)> {
    vec![
        ("where", query.where_clause()),
        ("outFields", "*".to_string()),
        ("returnGeometry", "false".to_string()),
    ]
}

#[async_trait]
impl FeatureService for RestFeatureService {
    #[instrument(skip(self))]
    async fn metadata(&self, url: &str) -> MapResult<ServiceMetadata> {
        let body = self.client.get_json_text(url, &[]).await?;
        let metadata = parse_metadata(&body)?;
        debug!(
            fields = metadata.fields.len(),
            max_record_count = ?metadata.max_record_count,
            "Fetched layer metadata"
        );
        Ok(metadata)
    }

    #[instrument(skip(self), fields(after_id = query.after_id))]
    async fn query_page(&self, url: &str, query: &PageQuery) -> MapResult<Vec<Attributes>> {
        let query_url = format!("{}/query", url.trim_end_matches('/'));
        let body = self
            .client
            .get_json_text(&query_url, &page_params(query))
            .await?;
        let rows = parse_query_response(&body)?;
        debug!(count = rows.len(), "Fetched attribute page");
        Ok(rows)
    }
}
