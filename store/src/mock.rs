use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{Document, Error, IndexRecord, Store};

/// In-memory [`Store`], the `store` crate's analogue of the teacher's
/// `MockDbManager` — used by tests that want real read/write semantics
/// without a Postgres container.
#[derive(Default)]
pub struct MockStore {
    docs: Mutex<HashMap<String, Document>>,
    terms: Mutex<HashMap<String, IndexRecord>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MockStore {
    async fn insert_doc(&self, doc: &Document) -> Result<(), Error> {
        let mut docs = self.docs.lock().await;
        if docs.contains_key(&doc.id) {
            return Err(Error::DuplicateKey);
        }
        docs.insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn insert_term(&self, record: &IndexRecord) -> Result<(), Error> {
        let mut terms = self.terms.lock().await;
        if terms.contains_key(&record.term) {
            return Err(Error::DuplicateKey);
        }
        terms.insert(record.term.clone(), record.clone());
        Ok(())
    }

    async fn update_term_index(
        &self,
        term: &str,
        postings: &HashMap<String, f64>,
    ) -> Result<(), Error> {
        let mut terms = self.terms.lock().await;
        terms
            .entry(term.to_string())
            .or_insert_with(|| IndexRecord {
                term: term.to_string(),
                index: HashMap::new(),
            })
            .index = postings.clone();
        Ok(())
    }

    async fn find_doc(&self, id: &str) -> Result<Option<Document>, Error> {
        Ok(self.docs.lock().await.get(id).cloned())
    }

    async fn find_term(&self, term: &str) -> Result<Option<IndexRecord>, Error> {
        Ok(self.terms.lock().await.get(term).cloned())
    }

    async fn distinct_terms(&self) -> Result<HashSet<String>, Error> {
        Ok(self.terms.lock().await.keys().cloned().collect())
    }

    async fn count_terms(&self) -> Result<u64, Error> {
        Ok(self.terms.lock().await.len() as u64)
    }
}
