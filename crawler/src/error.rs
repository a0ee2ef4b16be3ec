use reqwest::{StatusCode, header::HeaderValue};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum Error {
    #[error("request to {url} failed: {source}")]
    FailedRequest {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("{0} is an empty page with no HTML content")]
    EmptyPage(Url),

    #[error("Retry-After header for {url} is invalid: {header:?}")]
    InvalidRetryAfterHeader {
        url: Url,
        header: Option<HeaderValue>,
    },

    #[error("{url} returned {status} status code")]
    MalformedHttpStatus { url: Url, status: StatusCode },

    #[error("request to {0} timed out")]
    RequestTimeout(Url),

    #[error("failed to decode HTML body from {url}: {source}")]
    HtmlDecoding {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("indexing failed for {url}: {source}")]
    Indexing {
        url: Url,
        #[source]
        source: indexer::Error,
    },
}
