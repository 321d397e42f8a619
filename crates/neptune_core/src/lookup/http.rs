//! Blocking HTTP plumbing shared by the lookup clients.
//!
//! # Invariants
//! - Every client carries the configured timeout; no call can hang forever.
//! - Transport errors are classified once, here.

use crate::lookup::{LookupError, LookupResult, PageFetcher};
use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};
use std::time::Duration;

const MAX_ERROR_BODY_CHARS: usize = 200;

/// Builds the blocking client used for every outbound request.
pub fn build_http_client(timeout: Duration) -> LookupResult<Client> {
    Client::builder()
        .user_agent(format!("neptune/{}", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(|err| LookupError::Network(err.to_string()))
}

/// Sends `request` and rejects non-2xx responses.
pub(crate) fn send(request: RequestBuilder) -> LookupResult<Response> {
    let response = request.send().map_err(classify_transport_error)?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(LookupError::Http {
        status: status.as_u16(),
        body: truncate(&body, MAX_ERROR_BODY_CHARS),
    })
}

pub(crate) fn classify_transport_error(err: reqwest::Error) -> LookupError {
    // Drop the URL; it carries the API key.
    let err = err.without_url();
    if err.is_timeout() {
        LookupError::Timeout(err.to_string())
    } else if err.is_decode() {
        LookupError::Decode(err.to_string())
    } else {
        LookupError::Network(err.to_string())
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    let mut truncated = value.chars().take(max_chars).collect::<String>();
    if value.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}

/// Downloads pages as text with the shared client settings.
#[derive(Clone)]
pub struct HttpPageFetcher {
    http: Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> LookupResult<Self> {
        Ok(Self {
            http: build_http_client(timeout)?,
        })
    }
}

impl PageFetcher for HttpPageFetcher {
    fn fetch_page(&self, url: &str) -> LookupResult<String> {
        debug!("event=page_fetch module=lookup status=start");
        let response = send(self.http.get(url))?;
        response.text().map_err(classify_transport_error)
    }
}
