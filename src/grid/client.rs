use crate::config::ApiConfig;
use crate::error::{GridwatchError, Result};
use crate::grid::state::{GridState, map_state};
use crate::logging::{StructuredLogger, get_logger};
use crate::zip::PostalCode;
use serde::Deserialize;
use std::time::Duration;

/// Production endpoint of the StromGedacht API
pub const DEFAULT_BASE_URL: &str = "https://api.stromgedacht.de/v1";

/// Anything that can answer grid status queries for a postal code.
///
/// Implementations must be safe to call concurrently for different offsets.
#[async_trait::async_trait]
pub trait GridStatusSource: Send + Sync {
    /// Current (`0`) or forecast grid state for `zip`
    async fn fetch_status(&self, zip: &PostalCode, hours_in_future: u32) -> Result<GridState>;

    /// Confirm the remote service accepts `zip`; the body only has to be JSON
    async fn validate_zip(&self, zip: &PostalCode) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    state: i64,
}

/// URL of a status query; `hoursInFuture` is always present, `0` included
pub fn status_url(base_url: &str, zip: &PostalCode, hours_in_future: u32) -> String {
    format!(
        "{}/now?zip={}&hoursInFuture={}",
        base_url.trim_end_matches('/'),
        zip,
        hours_in_future
    )
}

/// URL of the validation-only query, which carries no `hoursInFuture`
pub fn validation_url(base_url: &str, zip: &PostalCode) -> String {
    format!("{}/now?zip={}", base_url.trim_end_matches('/'), zip)
}

/// Decode a `{"state": <int>}` body and map the code
pub fn parse_status_body(body: &[u8]) -> Result<GridState> {
    let response: StatusResponse = serde_json::from_slice(body)?;
    map_state(response.state)
}

/// HTTP client for the StromGedacht `/now` endpoint
pub struct StromGedachtClient {
    http: reqwest::Client,
    base_url: String,
    logger: StructuredLogger,
}

impl StromGedachtClient {
    /// Build a client with the configured base URL, timeout and user agent
    pub fn new(cfg: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .user_agent(cfg.user_agent.clone())
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            logger: get_logger("grid_api"),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `url`, failing on transport errors and non-success statuses
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.logger.debug(&format!("GET {}", url));
        let resp = self.http.get(url).send().await.map_err(|e| {
            let err = GridwatchError::from(e);
            self.logger
                .warn(&format!("Request to {} failed without response: {}", url, err));
            err
        })?;

        let status = resp.status();
        if !status.is_success() {
            let reason = reason_phrase(&resp);
            self.logger.warn(&format!(
                "Grid API returned {} {} for {}",
                status.as_u16(),
                reason,
                url
            ));
            return Err(GridwatchError::http(status.as_u16(), reason));
        }

        Ok(resp.bytes().await?.to_vec())
    }
}

/// Reason phrase as sent by the server, else the canonical one for the status
fn reason_phrase(resp: &reqwest::Response) -> String {
    resp.extensions()
        .get::<hyper::ext::ReasonPhrase>()
        .and_then(|r| std::str::from_utf8(r.as_bytes()).ok())
        .filter(|r| !r.trim().is_empty())
        .or_else(|| resp.status().canonical_reason())
        .unwrap_or("Unknown Status")
        .to_string()
}

#[async_trait::async_trait]
impl GridStatusSource for StromGedachtClient {
    async fn fetch_status(&self, zip: &PostalCode, hours_in_future: u32) -> Result<GridState> {
        let url = status_url(&self.base_url, zip, hours_in_future);
        let body = self.get_bytes(&url).await?;
        parse_status_body(&body)
    }

    async fn validate_zip(&self, zip: &PostalCode) -> Result<()> {
        let url = validation_url(&self.base_url, zip);
        let body = self.get_bytes(&url).await?;
        serde_json::from_slice::<serde_json::Value>(&body)?;
        Ok(())
    }
}
