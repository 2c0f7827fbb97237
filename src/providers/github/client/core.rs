use std::future::Future;
use std::time::Duration;

use futures::{stream, Stream, TryStreamExt};
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::auth::Token;
use crate::error::{DeployMetricsError, Result};

const DEFAULT_PER_PAGE: u32 = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const API_VERSION: &str = "2022-11-28";

pub struct GitHubClient {
    pub client: Client,
    pub api_url: Url,
    pub token: Token,
    pub per_page: u32,
}

/// Error body returned by the GitHub REST API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl GitHubClient {
    pub fn new(base_url: &str, token: Token) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(API_VERSION),
        );

        let client = Client::builder()
            .user_agent(concat!("deploy-metrics/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DeployMetricsError::Config(format!("Failed to create HTTP client: {e}")))?;

        let api_url = Url::parse(base_url)
            .map_err(|e| DeployMetricsError::Config(format!("Invalid API URL: {e}")))?;
        if api_url.cannot_be_a_base() {
            return Err(DeployMetricsError::Config(format!(
                "Invalid API URL: {base_url}"
            )));
        }

        Ok(Self {
            client,
            api_url,
            token,
            per_page: DEFAULT_PER_PAGE,
        })
    }

    #[must_use]
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(1, DEFAULT_PER_PAGE);
        self
    }

    pub fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(self.token.as_str())
    }

    /// Append percent-encoded path segments to the API base URL.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// GET a JSON document, mapping failure statuses onto the error taxonomy.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T> {
        debug!("GET {url} {query:?}");

        let request = self.auth_request(self.client.get(url.clone()).query(query));
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(&url, status, &headers, &body));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| DeployMetricsError::Decode {
            context: url.path().to_string(),
            source,
        })
    }

    /// Lazily walk a paginated endpoint. Each call produces a fresh stream
    /// starting at page 1; it ends after the first page shorter than
    /// `per_page`.
    pub fn paginate<'a, T, F, Fut>(&self, fetch_page: F) -> impl Stream<Item = Result<T>> + 'a
    where
        T: 'a,
        F: Fn(u32) -> Fut + 'a,
        Fut: Future<Output = Result<Vec<T>>> + 'a,
    {
        let per_page = self.per_page as usize;

        stream::try_unfold(Some(1u32), move |next| {
            let request = next.map(|page| (page, fetch_page(page)));
            async move {
                let Some((page, request)) = request else {
                    return Ok::<_, DeployMetricsError>(None);
                };

                let items = request.await?;
                debug!("Page {page}: {} items", items.len());

                let next = (items.len() >= per_page).then_some(page + 1);
                Ok::<_, DeployMetricsError>(Some((items, next)))
            }
        })
        .map_ok(|items| {
            stream::iter(items.into_iter().map(Ok::<T, DeployMetricsError>))
        })
        .try_flatten()
    }

    pub fn page_query(&self, page: u32) -> Vec<(&'static str, String)> {
        vec![
            ("per_page", self.per_page.to_string()),
            ("page", page.to_string()),
        ]
    }
}

/// Secondary rate limits answer 403 with `retry-after` while quota remains.
fn is_rate_limited(headers: &HeaderMap, message: &str) -> bool {
    let remaining = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok());

    remaining == Some("0")
        || headers.contains_key(RETRY_AFTER)
        || message.to_lowercase().contains("rate limit")
}

fn classify_failure(
    url: &Url,
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
) -> DeployMetricsError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string());
    let rate_limited = is_rate_limited(headers, &message);
    let context = format!("{} ({message})", url.path());

    match status {
        StatusCode::UNAUTHORIZED => DeployMetricsError::Auth(context),
        StatusCode::TOO_MANY_REQUESTS => DeployMetricsError::RateLimit(context),
        StatusCode::FORBIDDEN if rate_limited => DeployMetricsError::RateLimit(context),
        StatusCode::FORBIDDEN => DeployMetricsError::Auth(context),
        StatusCode::NOT_FOUND => DeployMetricsError::NotFound(context),
        _ => DeployMetricsError::Api {
            status: status.as_u16(),
            message: context,
        },
    }
}
