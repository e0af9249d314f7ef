//! HTTP transport for the asset platform.
//!
//! [`PlatformClient`] performs exactly one request per call and turns every
//! non-2xx response into one of the payload errors from [`crate::error`]:
//!
//! - problem-details bodies (`title`/`detail`) become [`StructuredErrorPayload`]
//! - 401/403 bodies with `code`/`reason` become [`UnauthorizedPayload`]
//! - anything else becomes [`HttpErrorPayload`]
//!
//! Client-side timeouts are tagged with [`DeadlineElapsed`].

use std::time::{Duration, Instant};

use anyhow::Context;
use assetctl_core::{Page, ResourceKind, ResponseMeta};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, StatusCode, header};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{
    DeadlineElapsed, HttpError, HttpErrorPayload, StructuredErrorPayload, UnauthorizedPayload,
};
use crate::paging::next_cursor;
use crate::source::{AssetSource, meaningful};

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default platform endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.assets.example.com/";

/// User agent string for assetctl.
const USER_AGENT: &str = concat!("assetctl/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Debug, Default, Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<Value>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct SearchBody<'a> {
    query: &'a str,
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct AssetsBody {
    ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    at_time: Option<String>,
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ============================================================================
// Platform Client
// ============================================================================

/// HTTP client for the asset platform.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    inner: Client,
    base_url: Url,
    token: Option<String>,
}

impl PlatformClient {
    /// Creates a client for `base_url` with the given bearer token and
    /// per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidUrl`] for an unparsable base URL and
    /// [`HttpError::Client`] if the TLS backend cannot be initialized.
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, HttpError> {
        let mut base_url =
            Url::parse(base_url).map_err(|e| HttpError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(HttpError::InvalidUrl(format!("{base_url}: not a base URL")));
        }
        // Joining relative paths keeps the last segment only with a trailing slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let inner = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            inner,
            base_url,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Returns the base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> anyhow::Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| HttpError::InvalidUrl(format!("{path}: {e}")).into())
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(header::ACCEPT, "application/json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends one request and decodes the `result` envelope.
    async fn send<T>(&self, request: RequestBuilder) -> anyhow::Result<(T, ResponseMeta)>
    where
        T: DeserializeOwned,
    {
        let request = self.authorize(request).build()?;
        let method = request.method().to_string();
        let url = request.url().to_string();

        debug!(%method, %url, "Sending request");
        let start = Instant::now();

        let response = self
            .inner
            .execute(request)
            .await
            .map_err(|err| transport_error(err, format!("{method} {url}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| {
                transport_error(err, format!("reading response body of {method} {url}"))
            })?;
        let latency = start.elapsed();
        debug!(
            status = status.as_u16(),
            latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            "Response received"
        );

        if !status.is_success() {
            return Err(error_from_response(status, &method, &url, body));
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)
            .with_context(|| format!("invalid response body from {method} {url}"))?;
        let meta = ResponseMeta::new(method, url, status.as_u16()).with_latency(latency);

        Ok((envelope.result, meta))
    }
}

/// Tags timeouts with [`DeadlineElapsed`] and everything else with `what`.
fn transport_error(err: reqwest::Error, what: String) -> anyhow::Error {
    if err.is_timeout() {
        anyhow::Error::new(err).context(DeadlineElapsed)
    } else {
        anyhow::Error::new(err).context(what)
    }
}

#[async_trait]
impl AssetSource for PlatformClient {
    #[instrument(skip(self, cursor), fields(has_cursor = cursor.is_some()))]
    async fn search(
        &self,
        query: &str,
        page_size: u32,
        cursor: Option<String>,
    ) -> anyhow::Result<Page<Value>> {
        let url = self.endpoint("v3/global/search/query")?;
        let body = SearchBody {
            query,
            page_size,
            page_token: cursor,
        };

        let (hits, meta): (SearchHits, _) = self.send(self.inner.post(url).json(&body)).await?;
        let page = Page::new(hits.hits, meta);

        Ok(match next_cursor(hits.next_page_token.as_deref()) {
            Some(token) => page.with_cursor(token),
            None => page,
        })
    }

    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    async fn get_assets(
        &self,
        kind: ResourceKind,
        ids: Vec<String>,
        at: Option<DateTime<Utc>>,
    ) -> anyhow::Result<Page<Value>> {
        let url = self.endpoint(&format!("v3/global/asset/{}", kind.path_segment()))?;
        let body = AssetsBody {
            ids,
            at_time: at.map(rfc3339),
        };

        let (entries, meta): (Vec<Value>, _) =
            self.send(self.inner.post(url).json(&body)).await?;
        let requested = entries.len();
        let assets: Vec<Value> = entries.into_iter().filter_map(meaningful).collect();
        if assets.len() < requested {
            debug!(missing = requested - assets.len(), "Some assets were not found");
        }

        Ok(Page::new(assets, meta))
    }

    #[instrument(skip(self))]
    async fn host_at(
        &self,
        host: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<(Option<Value>, ResponseMeta)> {
        let mut url = self.endpoint("v3/global/asset/host/")?;
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(host);
        }
        url.query_pairs_mut().append_pair("at_time", &rfc3339(at));

        let (snapshot, meta): (Value, _) = self.send(self.inner.get(url)).await?;
        Ok((meaningful(snapshot), meta))
    }
}

// ============================================================================
// Error Mapping
// ============================================================================

/// Builds the payload error for a non-2xx response.
fn error_from_response(status: StatusCode, method: &str, url: &str, body: String) -> anyhow::Error {
    let code = i64::from(status.as_u16());
    let json = serde_json::from_str::<Value>(&body).ok();
    let has = |key: &str| json.as_ref().is_some_and(|v| v.get(key).is_some());

    if has("title") || has("detail") {
        if let Some(mut payload) = json
            .clone()
            .and_then(|v| serde_json::from_value::<StructuredErrorPayload>(v).ok())
        {
            payload.status.get_or_insert(code);
            return payload.into();
        }
    }

    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        && (has("code") || has("reason"))
    {
        if let Some(mut payload) = json
            .clone()
            .and_then(|v| serde_json::from_value::<UnauthorizedPayload>(v).ok())
        {
            if payload.status == 0 {
                payload.status = code;
            }
            return payload.into();
        }
    }

    HttpErrorPayload {
        message: format!("{method} {url} returned {status}"),
        status_code: code,
        body,
    }
    .into()
}

// ============================================================================
// Tests
// ============================================================================
