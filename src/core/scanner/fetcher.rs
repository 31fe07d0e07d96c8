// src/core/scanner/fetcher.rs

use reqwest::header::{HeaderMap, HeaderValue, CONNECTION};
use std::error::Error as _;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::core::models::{FetchOutcome, Response};

/// Performs single HTTP GETs and folds transport states into a `FetchOutcome`.
///
/// Each worker opens its own session and reuses it for every target it handles;
/// sessions are never shared between workers.
pub trait Fetcher: Send + Sync + 'static {
    type Session: Send + Sync + 'static;

    fn open_session(&self) -> Result<Self::Session, String>;

    fn fetch(
        &self,
        session: &Self::Session,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = FetchOutcome> + Send;
}

/// The production fetcher, backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self { user_agent: user_agent.into() }
    }
}

impl Fetcher for HttpFetcher {
    type Session = reqwest::Client;

    fn open_session(&self) -> Result<reqwest::Client, String> {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("close"));

        reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))
    }

    fn fetch(
        &self,
        session: &reqwest::Client,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = FetchOutcome> + Send {
        async move {
            let response = match session.get(url).timeout(timeout).send().await {
                Ok(response) => response,
                Err(e) => return classify_error(&e),
            };

            let status = response.status();
            debug!(url, status = %status, "Received HTTP response.");
            if !status.is_success() {
                return FetchOutcome::HttpError(status.as_u16());
            }

            let headers = response.headers().clone();
            match response.text().await {
                Ok(body) => {
                    debug!(url, bytes = body.len(), "Read response body.");
                    FetchOutcome::Success(Response {
                        status: status.as_u16(),
                        headers,
                        body,
                    })
                }
                Err(e) => classify_error(&e),
            }
        }
    }
}

fn classify_error(error: &reqwest::Error) -> FetchOutcome {
    if error.is_timeout() {
        FetchOutcome::Timeout
    } else if let Some(status) = error.status() {
        FetchOutcome::HttpError(status.as_u16())
    } else {
        FetchOutcome::ConnectionError(error_chain(error))
    }
}

/// `reqwest` keeps the useful part (DNS, refused, TLS) in the source chain.
fn error_chain(error: &reqwest::Error) -> String {
    let mut detail = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}
