//! Request/response rate lookups over HTTP.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use catalog_types::{RateError, RateFetcher, RateRequest, RateResponse, RemoteErrorMessage};

/// Fetches single rates with `GET {base_url}/rates?base=..&destination=..`.
pub struct HttpRateFetcher {
    base_url: String,
    http: Client,
}

impl HttpRateFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    fn rate_url(&self, req: &RateRequest) -> String {
        format!(
            "{}/rates?base={}&destination={}",
            self.base_url, req.base, req.destination
        )
    }
}

#[async_trait]
impl RateFetcher for HttpRateFetcher {
    async fn fetch_rate(&self, req: RateRequest) -> Result<RateResponse, RateError> {
        let resp = self
            .http
            .get(self.rate_url(&req))
            .send()
            .await
            .map_err(|e| RateError::RemoteUnavailable(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return resp
                .json::<RateResponse>()
                .await
                .map_err(|e| RateError::RemoteUnavailable(format!("invalid rate response: {e}")));
        }

        let body = resp.text().await.unwrap_or_default();
        Err(classify_failure(status, &body, req))
    }
}

/// Maps a non-2xx reply onto the rate error taxonomy.
///
/// Client errors mean the service understood and refused the request.
/// Everything else, including throttling and request timeouts, is treated as
/// the service being unavailable.
fn classify_failure(status: StatusCode, body: &str, req: RateRequest) -> RateError {
    let remote = serde_json::from_str::<RemoteErrorMessage>(body).ok();

    let refused = status.is_client_error()
        && status != StatusCode::REQUEST_TIMEOUT
        && status != StatusCode::TOO_MANY_REQUESTS;

    if refused {
        let (message, request) = match remote {
            Some(remote) => (remote.message, remote.request.or(Some(req))),
            None => (body_or_status(body, status), Some(req)),
        };
        return RateError::RemoteRejected { message, request };
    }

    let message = remote
        .map(|r| r.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body_or_status(body, status));
    RateError::RemoteUnavailable(message)
}

fn body_or_status(body: &str, status: StatusCode) -> String {
    let body = body.trim();
    if body.is_empty() {
        status.to_string()
    } else {
        body.to_string()
    }
}
