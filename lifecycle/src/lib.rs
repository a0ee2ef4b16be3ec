//! Wires Crawler -> Indexer -> Store, drains workers at completion, and
//! hands control to Retriever; publishes the error/waiting/crawl-finished
//! contract the UI collaborator subscribes to (spec.md §4.6).

pub mod config;
pub mod error;
pub mod events;

use std::sync::Arc;

pub use config::Config;
pub use error::Error;
pub use events::{ErrorReport, LifecycleEvent, StatusCode};

use crawler::Crawler;
use retriever::Retriever;
use store::{PgStore, Store};
use tokio::sync::{Mutex, mpsc::UnboundedSender};
use url::Url;

pub struct Lifecycle {
    store: Arc<dyn Store>,
    events: UnboundedSender<LifecycleEvent>,
    /// The crawler driving the current `run_crawl` call, if any. Held so
    /// `shutdown` can reach its drain-then-cut-loose protocol (spec.md
    /// §4.4) instead of only closing the store pool.
    crawler: Mutex<Option<Crawler>>,
}

impl Lifecycle {
    /// Connects to the configured store and runs its schema migrations.
    /// Both failures are fatal (spec.md §7): the caller is expected to
    /// report them via [`Error::status_code`] and terminate.
    pub async fn connect(
        config: &Config,
        events: UnboundedSender<LifecycleEvent>,
    ) -> Result<Self, Error> {
        let uri = config.connection_uri()?;

        let store = PgStore::connect(&uri).await.map_err(Error::Connect)?;

        store.migrate().await.map_err(Error::CollectionCreate)?;

        Ok(Lifecycle {
            store: Arc::new(store),
            events,
            crawler: Mutex::new(None),
        })
    }

    /// Constructs a [`Lifecycle`] over an arbitrary [`Store`], bypassing
    /// connection setup. Used by callers that already hold a store
    /// (notably tests, which use [`store::MockStore`]).
    pub fn with_store(store: Arc<dyn Store>, events: UnboundedSender<LifecycleEvent>) -> Self {
        Lifecycle {
            store,
            events,
            crawler: Mutex::new(None),
        }
    }

    /// Runs the crawl to completion with the default worker pool, cap,
    /// and muhlenberg.edu/keyword link filter, publishing `Waiting` and
    /// `CrawlFinished` around it.
    pub async fn run_crawl(&self, start_urls: Vec<Url>) -> usize {
        let _ = self.events.send(LifecycleEvent::Waiting(true));

        let crawler = Crawler::with_defaults(self.store.clone());
        *self.crawler.lock().await = Some(crawler.clone());

        let documents_indexed = crawler.run(start_urls).await;

        *self.crawler.lock().await = None;

        let _ = self.events.send(LifecycleEvent::CrawlFinished { documents_indexed });
        let _ = self.events.send(LifecycleEvent::Waiting(false));

        documents_indexed
    }

    /// Runs a query against the current index. A store read failure is
    /// non-fatal (spec.md §7): it is reported on the event channel and
    /// the query yields no results rather than propagating an error.
    pub async fn search(&self, query: &str) -> Vec<(String, String)> {
        let retriever = match Retriever::new(self.store.clone()).await {
            Ok(retriever) => retriever,
            Err(e) => {
                self.report_store_error(e.to_string());
                return Vec::new();
            }
        };

        match retriever.search(query).await {
            Ok(results) => results,
            Err(e) => {
                self.report_store_error(e.to_string());
                Vec::new()
            }
        }
    }

    fn report_store_error(&self, message: String) {
        let _ = self.events.send(LifecycleEvent::Error(ErrorReport {
            status: StatusCode::StoreError,
            message,
        }));
    }

    /// Drains and cuts loose any crawl in flight, then closes the store's
    /// connection pool. Invoked both on normal completion and from a
    /// process-exit hook (spec.md §4.4's external shutdown entry, §4.6's
    /// teardown contract).
    pub async fn shutdown(&self) {
        let crawler = self.crawler.lock().await.clone();
        if let Some(crawler) = crawler {
            crawler.shutdown().await;
        }

        self.store.close().await;
    }
}
