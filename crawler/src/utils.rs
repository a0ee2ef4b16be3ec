#[cfg(any(test, feature = "bench-utils"))]
use httpmock::prelude::*;
#[cfg(any(test, feature = "bench-utils"))]
use reqwest::StatusCode;
#[cfg(any(test, feature = "bench-utils"))]
use url::Url;

/// A mock HTTP server for tests and benchmarks. Unlike the crawled site
/// itself, fixtures here are inline strings rather than files on disk,
/// since the crawl only ever needs a handful of short HTML bodies.
#[cfg(any(test, feature = "bench-utils"))]
pub struct HttpServer {
    server: MockServer,
}

#[cfg(any(test, feature = "bench-utils"))]
impl HttpServer {
    pub fn new_with_body(body: &str) -> Self {
        let server = MockServer::start();

        let _mock = server.mock(|when, then| {
            when.method(GET);
            then.status(StatusCode::OK.as_u16())
                .header("content-type", "text/html")
                .body(body);
        });

        HttpServer { server }
    }

    pub fn new_with_mock(mock: impl FnOnce(httpmock::When, httpmock::Then)) -> Self {
        let server = MockServer::start();

        let _mock = server.mock(mock);

        HttpServer { server }
    }

    pub fn base_url(&self) -> Url {
        let base_url = self.server.base_url();
        Url::parse(base_url.as_str())
            .unwrap_or_else(|_| panic!("base URL should be a valid url: {}", base_url))
    }
}
