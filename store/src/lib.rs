//! Abstract persistence for the two collections the search engine reads
//! and writes: `Documents` (one record per crawled page) and
//! `InvertedIndex` (one record per term).

pub mod error;
pub mod mock;
pub mod postgres;

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

pub use error::Error;
pub use mock::MockStore;
pub use postgres::PgStore;

/// One record per successfully crawled page. Created exactly once per
/// `id`; never mutated afterward.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub url: String,
    pub title: String,
    pub max_frequency: f64,
}

/// One record per distinct stemmed term, mapping document id to the raw
/// (possibly title-boosted) frequency of that term in that document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexRecord {
    pub term: String,
    pub index: HashMap<String, f64>,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts a new [`Document`]. Returns [`Error::DuplicateKey`] if a
    /// document with this id already exists; callers treat that as
    /// non-fatal.
    async fn insert_doc(&self, doc: &Document) -> Result<(), Error>;

    /// Inserts a new [`IndexRecord`]. Called only when the term is not
    /// yet present; returns [`Error::DuplicateKey`] if it races with
    /// another writer.
    async fn insert_term(&self, record: &IndexRecord) -> Result<(), Error>;

    /// Replaces the entire posting map for `term`.
    async fn update_term_index(
        &self,
        term: &str,
        postings: &HashMap<String, f64>,
    ) -> Result<(), Error>;

    async fn find_doc(&self, id: &str) -> Result<Option<Document>, Error>;

    async fn find_term(&self, term: &str) -> Result<Option<IndexRecord>, Error>;

    /// Snapshot read of every distinct term currently indexed.
    async fn distinct_terms(&self) -> Result<HashSet<String>, Error>;

    /// Snapshot read of the number of distinct terms currently indexed.
    async fn count_terms(&self) -> Result<u64, Error>;

    /// Closes any underlying connection pool. A no-op for stores that
    /// don't hold one.
    async fn close(&self) {}
}
