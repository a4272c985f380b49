//! HTTP client for the Sonarr v3 queue API

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Response, Url};
use std::time::Duration;
use tracing::debug;

use super::{QueueApi, Result, TransportError};
use crate::config::ServerConfig;
use crate::queue::{QueueId, QueuePage, QueueRecord};

const API_KEY_HEADER: &str = "X-Api-Key";
const QUEUE_PATH: &[&str] = &["api", "v3", "queue"];

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub page_size: u32,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            page_size: 100,
            user_agent: format!("queuesweep/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl From<&ServerConfig> for HttpConfig {
    fn from(server: &ServerConfig) -> Self {
        Self {
            connect_timeout: server.connect_timeout.as_duration(),
            request_timeout: server.request_timeout.as_duration(),
            page_size: server.page_size,
            ..Self::default()
        }
    }
}

/// Sonarr queue client
pub struct SonarrClient {
    client: Client,
    base_url: Url,
    config: HttpConfig,
}

impl SonarrClient {
    /// Create a new client; every request carries the API key and a JSON content type
    pub fn new(base_url: &str, api_key: &str, config: HttpConfig) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(base_url.to_string()));
        }

        let mut key = HeaderValue::from_str(api_key)
            .map_err(|e| TransportError::Request(format!("Invalid API key header: {}", e)))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Build a client from the `[server]` config section
    pub fn from_config(server: &ServerConfig) -> Result<Self> {
        let api_key = server.api_key.as_deref().unwrap_or_default();
        Self::new(&server.base_url, api_key, HttpConfig::from(server))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `<base>/api/v3/queue[/<id>]`, keeping any path prefix on the base URL
    fn queue_url(&self, id: Option<&QueueId>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| TransportError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty().extend(QUEUE_PATH);
            if let Some(id) = id {
                segments.push(&id.to_string());
            }
        }
        Ok(url)
    }

    /// Fetch a single page of the queue (pages are 1-based)
    async fn fetch_page(&self, page: u32) -> Result<QueuePage> {
        let url = self.queue_url(None)?;
        debug!(%url, page, "Fetching queue page");

        let response = self
            .client
            .get(url)
            .query(&[
                ("page", page.to_string()),
                ("pageSize", self.config.page_size.to_string()),
            ])
            .send()
            .await
            .map_err(map_send_error)?;

        let response = check_status(response)?;

        response
            .json::<QueuePage>()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Decode(e.to_string())
                }
            })
    }
}

#[async_trait]
impl QueueApi for SonarrClient {
    async fn fetch_queue(&self) -> Result<Vec<QueueRecord>> {
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let batch = self.fetch_page(page).await?;
            let received = batch.records.len();
            records.extend(batch.records);

            // Servers that don't report a total return the whole queue at once
            let Some(total) = batch.total_records else {
                break;
            };
            if received == 0 || records.len() as u64 >= total {
                break;
            }
            page += 1;
        }

        debug!(count = records.len(), pages = page, "Queue fetched");
        Ok(records)
    }

    async fn remove(&self, id: &QueueId) -> Result<()> {
        let url = self.queue_url(Some(id))?;
        debug!(%url, "Removing queue item");

        let response = self
            .client
            .delete(url)
            .query(&[("removeFromClient", "false"), ("blocklist", "false")])
            .send()
            .await
            .map_err(map_send_error)?;

        check_status(response)?;
        Ok(())
    }
}

fn map_send_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Request(e.to_string())
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        });
    }
    Ok(response)
}
