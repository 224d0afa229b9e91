// file: src/enrich/fetcher.rs
// description: fetch port and the reqwest-backed LinkedIn company page fetcher
// reference: https://docs.rs/reqwest

use crate::config::ScraperConfig;
use crate::enrich::page;
use crate::error::{FetchError, PipelineError, Result};
use crate::models::{CanonicalRecord, FetchedFields};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

/// Port for the external enrichment source. Production uses
/// `LinkedInFetcher`; tests substitute scripted implementations.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, record: &CanonicalRecord)
        -> std::result::Result<FetchedFields, FetchError>;
}

pub struct LinkedInFetcher {
    client: reqwest::Client,
}

impl LinkedInFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.fetch_timeout())
            .build()
            .map_err(|e| PipelineError::Http(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for LinkedInFetcher {
    async fn fetch(
        &self,
        record: &CanonicalRecord,
    ) -> std::result::Result<FetchedFields, FetchError> {
        let url = record
            .linkedin_url()
            .ok_or_else(|| FetchError::Permanent("record has no linkedin_url".to_string()))?;

        let url = reqwest::Url::parse(url)
            .map_err(|e| FetchError::Permanent(format!("invalid URL '{}': {}", url, e)))?;

        debug!(record_id = record.record_id, %url, "fetching company page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_request_error)?;

        if let Some(err) = classify_http_status(response.status()) {
            return Err(err);
        }

        let body = response.text().await.map_err(classify_request_error)?;
        page::extract_company_fields(&body)
    }
}

fn classify_http_status(status: StatusCode) -> Option<FetchError> {
    if status.is_success() {
        return None;
    }
    match status.as_u16() {
        429 => Some(FetchError::RateLimited),
        408 | 500..=599 => Some(FetchError::Transient(format!(
            "server returned {}",
            status
        ))),
        _ => Some(FetchError::Permanent(format!("server returned {}", status))),
    }
}

fn classify_request_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Transient(format!("request timed out: {}", error))
    } else if error.is_connect() {
        FetchError::Permanent(format!("host unreachable: {}", error))
    } else {
        FetchError::Transient(error.to_string())
    }
}
