// src/ingest/providers/http.rs
use std::time::Duration;

use async_trait::async_trait;
use metrics::{counter, histogram};

use crate::error::FeedError;
use crate::ingest::types::FeedSource;

/// Public test endpoint of the aggregator.
pub const DEFAULT_FEED_URL: &str = "http://test.lengow.io/orders-test.xml";

/// Retrieves the feed with a plain GET.
pub struct HttpFeed {
    url: String,
    client: reqwest::Client,
}

impl HttpFeed {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeedSource for HttpFeed {
    async fn fetch(&self) -> Result<Vec<u8>, FeedError> {
        let t0 = std::time::Instant::now();
        let resp = match self.client.get(&self.url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(target: "ingest", error = ?e, url = %self.url, "feed http error");
                counter!("ingest_feed_errors_total").increment(1);
                return Err(FeedError::Http(e));
            }
        };

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(target: "ingest", status = status.as_u16(), url = %self.url, "feed http status");
            counter!("ingest_feed_errors_total").increment(1);
            return Err(FeedError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        // Raw bytes: the charset is resolved from the document itself.
        let body = match resp.bytes().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(target: "ingest", error = ?e, url = %self.url, "feed body read failed");
                counter!("ingest_feed_errors_total").increment(1);
                return Err(FeedError::Http(e));
            }
        };
        histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        tracing::info!(target: "ingest", url = %self.url, bytes = body.len(), "fetched feed");
        Ok(body.to_vec())
    }

    fn name(&self) -> &str {
        &self.url
    }
}
