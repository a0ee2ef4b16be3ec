use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use dashmap::DashMap;
use reqwest::{Client, ClientBuilder, StatusCode, header::RETRY_AFTER};
use scraper::{Html, Selector};
use store::Store;
use tokio::sync::Mutex;
use url::Url;

use crate::{
    error::Error,
    url_handler::{self, LinkFilter},
};

/// The default worker pool size (spec.md §4.4, `W`).
const DEFAULT_WORKERS: usize = 4;

/// The default crawl cap (spec.md §4.4, `L`): the crawl stops once this
/// many documents have been indexed.
const DEFAULT_CRAWL_LIMIT: usize = 5000;

/// How long a shutdown waits for in-flight tasks to drain before workers
/// are cut loose (spec.md §4.4).
const DRAIN_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// How long an idle worker sleeps between polls of the shared queue.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(50);

const MAX_RETRY_ATTEMPTS: u8 = 10;
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// The per-task state machine a crawl of a single URL moves through.
/// Any failure collapses the remaining states into `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskState {
    Fetching,
    Parsing,
    Indexing,
    Enqueuing,
    Done,
}

struct Shared {
    queue: Mutex<VecDeque<Url>>,
    visited: DashMap<String, ()>,
    crawled_count: AtomicUsize,
    next_doc_id: AtomicUsize,
    cap: usize,
    open_workers: AtomicUsize,
    in_flight: AtomicUsize,
    shutting_down: AtomicBool,
    shutdown_once: Mutex<()>,
    client: Client,
    store: Arc<dyn Store>,
    filter: LinkFilter,
}

/// Crawls a bounded set of pages with a fixed-size worker pool, writing
/// each page into the index as it is fetched.
///
/// The crawl holds no state across runs: the visited set and frontier
/// queue live only in memory for the lifetime of a single [`Crawler::run`]
/// call (spec.md §4.4 Non-goals).
#[derive(Clone)]
pub struct Crawler {
    shared: Arc<Shared>,
}

impl Crawler {
    pub fn new(store: Arc<dyn Store>, workers: usize, cap: usize, filter: LinkFilter) -> Self {
        let shared = Shared {
            queue: Mutex::new(VecDeque::new()),
            visited: DashMap::new(),
            crawled_count: AtomicUsize::new(0),
            next_doc_id: AtomicUsize::new(0),
            cap,
            open_workers: AtomicUsize::new(workers),
            in_flight: AtomicUsize::new(0),
            shutting_down: AtomicBool::new(false),
            shutdown_once: Mutex::new(()),
            client: Self::init_client(),
            store,
            filter,
        };

        Crawler {
            shared: Arc::new(shared),
        }
    }

    pub fn with_defaults(store: Arc<dyn Store>) -> Self {
        Self::new(
            store,
            DEFAULT_WORKERS,
            DEFAULT_CRAWL_LIMIT,
            LinkFilter::default(),
        )
    }

    /// Seeds the frontier with `start_urls` and runs the worker pool to
    /// completion, returning the number of documents indexed.
    ///
    /// Completion happens either because the crawl cap was reached or
    /// because the frontier was exhausted with no tasks in flight; both
    /// paths drive every worker through the same shutdown protocol.
    pub async fn run(&self, start_urls: Vec<Url>) -> usize {
        for url in start_urls {
            self.enqueue(url).await;
        }

        let mut handles = Vec::new();
        let worker_count = self.shared.open_workers.load(Ordering::SeqCst);

        for _ in 0..worker_count {
            let shared = self.shared.clone();
            handles.push(tokio::spawn(async move { worker_loop(shared).await }));
        }

        for handle in handles {
            let _ = handle.await;
        }

        log::info!(
            "crawl finished: {} documents indexed",
            self.shared.crawled_count.load(Ordering::SeqCst)
        );

        self.shared.crawled_count.load(Ordering::SeqCst)
    }

    /// Requests an external shutdown, e.g. from a process teardown hook.
    /// Runs the same drain-then-cut-loose protocol as a cap-triggered
    /// shutdown.
    pub async fn shutdown(&self) {
        initiate_shutdown(&self.shared).await;
    }

    async fn enqueue(&self, url: Url) {
        enqueue(&self.shared, url).await;
    }

    fn init_client() -> Client {
        ClientBuilder::new()
            .user_agent(crate::USER_AGENT)
            .gzip(true)
            .timeout(Duration::from_secs(15))
            .build()
            .expect("creating a reqwest::Client should not throw an error")
    }
}

async fn enqueue(shared: &Shared, url: Url) {
    let url = match url_handler::normalize_url(url) {
        Ok(url) => url,
        Err(e) => {
            log::warn!("dropping link with invalid domain: {}", e);
            return;
        }
    };

    if !shared.filter.allows(&url) {
        return;
    }

    let key = url_handler::visited_key(&url);

    // DashMap::insert returns the previous value, giving us an atomic
    // check-and-insert without a separate lock.
    if shared.visited.insert(key, ()).is_some() {
        return;
    }

    shared.queue.lock().await.push_back(url);
}

async fn worker_loop(shared: Arc<Shared>) {
    loop {
        if shared.shutting_down.load(Ordering::SeqCst) {
            break;
        }

        if shared.crawled_count.load(Ordering::SeqCst) >= shared.cap {
            initiate_shutdown(&shared).await;
            break;
        }

        let next = shared.queue.lock().await.pop_front();

        let url = match next {
            Some(url) => url,
            None => {
                if shared.in_flight.load(Ordering::SeqCst) == 0 {
                    initiate_shutdown(&shared).await;
                    break;
                }
                tokio::time::sleep(IDLE_POLL_INTERVAL).await;
                continue;
            }
        };

        shared.in_flight.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = process_url(&shared, url.clone()).await {
            log::warn!("crawl of {} failed: {}", url, e);
        }
        shared.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    let remaining = shared.open_workers.fetch_sub(1, Ordering::SeqCst) - 1;
    if remaining == 0 {
        log::info!("last worker exited; crawl pool drained");
    }
}

/// Requests pool shutdown. Idempotent: only the first caller actually
/// waits out the drain grace period, later callers return immediately.
async fn initiate_shutdown(shared: &Shared) {
    let _guard = shared.shutdown_once.lock().await;

    if shared.shutting_down.swap(true, Ordering::SeqCst) {
        return;
    }

    log::info!("crawl pool shutting down, draining in-flight tasks");

    let deadline = tokio::time::Instant::now() + DRAIN_GRACE_PERIOD;
    while shared.in_flight.load(Ordering::SeqCst) > 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(IDLE_POLL_INTERVAL).await;
    }
}

async fn process_url(shared: &Shared, url: Url) -> Result<(), Error> {
    let mut state = TaskState::Fetching;
    log::debug!("{} -> {:?}", url, state);

    let html_text = fetch_html(&shared.client, &url).await?;

    state = TaskState::Parsing;
    log::debug!("{} -> {:?}", url, state);

    let html = Html::parse_document(&html_text);
    let title = extract_title(&html).unwrap_or_default();
    let body = extract_text(&html);
    let links = extract_links(&html, &url);

    state = TaskState::Indexing;
    log::debug!("{} -> {:?}", url, state);

    // spec.md §4.4 step 4: docID is the post-increment value.
    let doc_id = (shared.next_doc_id.fetch_add(1, Ordering::SeqCst) + 1).to_string();
    indexer::index_page(
        shared.store.as_ref(),
        doc_id,
        url.to_string(),
        title,
        body,
    )
    .await
    .map_err(|e| Error::Indexing {
        url: url.clone(),
        source: e,
    })?;

    shared.crawled_count.fetch_add(1, Ordering::SeqCst);

    state = TaskState::Enqueuing;
    log::debug!("{} -> {:?}", url, state);

    for link in links {
        enqueue(shared, link).await;
    }

    state = TaskState::Done;
    log::debug!("{} -> {:?}", url, state);

    Ok(())
}

async fn fetch_html(client: &Client, url: &Url) -> Result<String, Error> {
    let mut resp = make_get_request(client, url).await?;

    match resp.status() {
        StatusCode::OK => extract_html_from_resp(resp).await?.ok_or_else(|| Error::EmptyPage(url.clone())),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = resp
                .headers()
                .get(RETRY_AFTER)
                .ok_or_else(|| Error::InvalidRetryAfterHeader {
                    url: url.clone(),
                    header: None,
                })?
                .clone();

            let delay_secs: u64 =
                retry_after
                    .to_str()
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| Error::InvalidRetryAfterHeader {
                        url: url.clone(),
                        header: Some(retry_after.clone()),
                    })?;

            let delay = Duration::from_secs(delay_secs);
            if delay > MAX_RETRY_DELAY {
                return Err(Error::RequestTimeout(url.clone()));
            }

            tokio::time::sleep(delay).await;

            let mut attempts = 0;
            while attempts < MAX_RETRY_ATTEMPTS && resp.status() != StatusCode::OK {
                resp = make_get_request(client, url).await?;
                attempts += 1;
            }

            if resp.status() != StatusCode::OK {
                return Err(Error::RequestTimeout(url.clone()));
            }

            extract_html_from_resp(resp)
                .await?
                .ok_or_else(|| Error::EmptyPage(url.clone()))
        }
        status => Err(Error::MalformedHttpStatus {
            url: url.clone(),
            status,
        }),
    }
}

async fn make_get_request(client: &Client, url: &Url) -> Result<reqwest::Response, Error> {
    client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| Error::FailedRequest {
            url: url.clone(),
            source: e,
        })
}

async fn extract_html_from_resp(resp: reqwest::Response) -> Result<Option<String>, Error> {
    let url = resp.url().clone();

    let html = resp
        .text()
        .await
        .map_err(|e| Error::HtmlDecoding { url, source: e })?;

    if html.is_empty() {
        Ok(None)
    } else {
        Ok(Some(html))
    }
}

fn extract_title(html: &Html) -> Option<String> {
    let selector = Selector::parse("title").expect("parsing 'title' selector cannot fail");
    html.select(&selector)
        .next()
        .map(|el| el.text().collect::<String>())
}

fn extract_text(html: &Html) -> String {
    html.root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_links(html: &Html, base: &Url) -> Vec<Url> {
    let selector = Selector::parse("a").expect("parsing 'a' selector cannot fail");

    html.select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| resolve_href(base, href))
        .collect()
}

fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    if href.starts_with("https://") || href.starts_with("http://") {
        Url::parse(href).ok()
    } else {
        base.join(href).ok()
    }
}

#[cfg(any(test, feature = "bench-utils"))]
impl Crawler {
    pub fn test_new(filter: LinkFilter) -> Self {
        use store::MockStore;

        Crawler::new(Arc::new(MockStore::new()), 1, DEFAULT_CRAWL_LIMIT, filter)
    }
}
