use async_trait::async_trait;
use ferrous_feed_application::ports::{FetchOutcome, SourceFetcher};
use ferrous_feed_domain::config::LimitsConfig;
use ferrous_feed_domain::{CacheValidators, DomainError, FetchError, Source};
use reqwest::header::{HeaderMap, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

/// Conditional HTTP fetcher for upstream lists.
///
/// Each attempt carries the source's cache validators and its own timeout.
/// Retryable failures (network errors, timeouts, 408/429/5xx) are retried with
/// exponential backoff; an oversize body never is.
pub struct HttpSourceFetcher {
    client: Client,
    timeout: Duration,
    max_retries: u32,
    retry_base_delay: Duration,
    max_body_bytes: u64,
}

impl HttpSourceFetcher {
    pub fn new(limits: &LimitsConfig) -> Result<Self, DomainError> {
        let client = Client::builder()
            .user_agent(format!("ferrous-feed/{}", env!("CARGO_PKG_VERSION")))
            .connect_timeout(limits.fetch_timeout())
            .build()
            .map_err(|e| DomainError::IoError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, limits))
    }

    pub fn with_client(client: Client, limits: &LimitsConfig) -> Self {
        Self {
            client,
            timeout: limits.fetch_timeout(),
            max_retries: limits.max_retries,
            retry_base_delay: limits.retry_base_delay(),
            max_body_bytes: limits.max_body_bytes,
        }
    }

    async fn attempt(&self, source: &Source) -> Result<Option<(String, CacheValidators)>, FetchError> {
        let mut request = self.client.get(&*source.url).timeout(self.timeout);
        if let Some(etag) = &source.cache.etag {
            request = request.header(IF_NONE_MATCH, etag.as_str());
        }
        if let Some(last_modified) = &source.cache.last_modified {
            request = request.header(IF_MODIFIED_SINCE, last_modified.as_str());
        }

        let mut response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_body_bytes {
                return Err(FetchError::BodyTooLarge {
                    limit: self.max_body_bytes,
                });
            }
        }

        let validators = validators_from(response.headers());

        // Content-Length may be absent or wrong; enforce the ceiling while reading.
        let mut body = Vec::with_capacity(
            response
                .content_length()
                .map(|l| l as usize)
                .unwrap_or(64 * 1024),
        );
        while let Some(chunk) = response.chunk().await.map_err(map_reqwest_error)? {
            if (body.len() + chunk.len()) as u64 > self.max_body_bytes {
                return Err(FetchError::BodyTooLarge {
                    limit: self.max_body_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        let text = match String::from_utf8(body) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        Ok(Some((text, validators)))
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch(&self, source: &Source) -> FetchOutcome {
        let mut attempt: u32 = 0;
        loop {
            match self.attempt(source).await {
                Ok(None) => return FetchOutcome::Unchanged,
                Ok(Some((body, validators))) => {
                    return FetchOutcome::Updated { body, validators }
                }
                Err(error) if error.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.retry_base_delay * (1u32 << (attempt - 1).min(16));
                    debug!(
                        source = %source.name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Retrying source fetch"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => {
                    if attempt > 0 {
                        warn!(source = %source.name, attempts = attempt + 1, error = %error, "Giving up on source fetch");
                    }
                    return FetchOutcome::Failed(error);
                }
            }
        }
    }
}

fn validators_from(headers: &HeaderMap) -> CacheValidators {
    let header = |name| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    CacheValidators {
        etag: header(ETAG),
        last_modified: header(LAST_MODIFIED),
    }
}

fn map_reqwest_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = error.status() {
        FetchError::Status(status.as_u16())
    } else {
        FetchError::Network(error.to_string())
    }
}
