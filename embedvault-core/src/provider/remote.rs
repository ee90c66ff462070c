//! Blocking HTTP plumbing shared by the remote adapters.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use super::ProviderKind;
use crate::error::{Error, Result};

/// JSON-over-HTTP client bound to one service endpoint.
#[derive(Debug, Clone)]
pub(crate) struct RemoteClient {
    http: Client,
    base_url: String,
    provider: ProviderKind,
}

impl RemoteClient {
    /// Builds a client that sends `auth` (if any) with every request.
    pub(crate) fn new(
        provider: ProviderKind,
        base_url: &str,
        auth: Option<(HeaderName, String)>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some((name, value)) = auth {
            let mut value = HeaderValue::from_str(&value)
                .map_err(|_| Error::Config(format!("{} API key is not a valid header value", provider)))?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build {} client: {}", provider, e)))?;

        Ok(Self {
            http,
            base_url: normalize_base_url(base_url),
            provider,
        })
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POSTs `body` to `path` and decodes the JSON response.
    ///
    /// Transport failures, non-success statuses and undecodable bodies all map
    /// to [`Error::RemoteUnavailable`].
    pub(crate) fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| Error::RemoteUnavailable(format!("{} {}: {}", self.provider, path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(Error::RemoteUnavailable(format!(
                "{} {} returned {}: {}",
                self.provider,
                path,
                status,
                detail.trim()
            )));
        }

        response.json::<R>().map_err(|e| {
            Error::RemoteUnavailable(format!("{} {} sent an unreadable body: {}", self.provider, path, e))
        })
    }
}

/// Adds `https://` when no scheme is given and strips trailing slashes.
pub(crate) fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Logs a failed remote call and hands back the simulated response instead.
pub(crate) fn degrade<T>(provider: ProviderKind, operation: &str, collection: &str, err: Error, fallback: T) -> T {
    warn!(
        %provider,
        operation,
        collection,
        error = %err,
        "remote vector service unavailable, returning simulated response"
    );
    fallback
}
