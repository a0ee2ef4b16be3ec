//! Ranked retrieval over the inverted index: IDF lookup, per-document
//! TF-IDF accumulation, and cosine similarity against the query vector.

pub mod error;

use std::collections::HashMap;
use std::sync::Arc;

pub use error::Error;
use store::Store;

/// The maximum number of results returned by [`Retriever::search`].
const MAX_RESULTS: usize = 25;

/// Snapshots the corpus size at construction time and answers queries
/// against it. `indexSize` (spec.md §4.5) is deliberately frozen here
/// rather than re-read per query, so a query's IDF weights stay
/// consistent even as the crawl keeps writing to the store concurrently.
pub struct Retriever {
    store: Arc<dyn Store>,
    index_size: usize,
}

impl Retriever {
    pub async fn new(store: Arc<dyn Store>) -> Result<Self, Error> {
        let index_size = store.count_terms().await.map_err(Error::Read)?;
        Ok(Retriever { store, index_size })
    }

    /// Returns up to [`MAX_RESULTS`] `(url, title)` pairs, ranked by
    /// descending cosine similarity against `query`.
    pub async fn search(&self, query: &str) -> Result<Vec<(String, String)>, Error> {
        let query_words = textpipeline::clean_query(query)?;

        if query_words.is_empty() {
            return Ok(Vec::new());
        }

        let distinct = self.store.distinct_terms().await.map_err(Error::Read)?;

        let retained: Vec<(String, f64)> = query_words
            .into_iter()
            .filter(|(term, _)| distinct.contains(term))
            .collect();

        if retained.is_empty() {
            return Ok(Vec::new());
        }

        let mut query_weights: Vec<(String, f64)> = Vec::with_capacity(retained.len());
        let mut query_norm_sq = 0.0;

        // First-seen order for documents, used below to break ties in the
        // final sort in favor of the entry encountered earlier.
        let mut doc_order: Vec<String> = Vec::new();
        let mut doc_index: HashMap<String, usize> = HashMap::new();
        let mut accumulators: Vec<(f64, f64)> = Vec::new();

        for (term, query_freq) in retained {
            let Some(record) = self.store.find_term(&term).await.map_err(Error::Read)? else {
                continue;
            };

            let n_t = record.index.len();
            if n_t == 0 {
                continue;
            }

            let idf = (self.index_size as f64 / n_t as f64).log10();
            let qw_t = query_freq * idf;

            query_weights.push((term, qw_t));
            query_norm_sq += qw_t * qw_t;

            for (doc_id, raw_freq) in &record.index {
                let Some(doc) = self.store.find_doc(doc_id).await.map_err(Error::Read)? else {
                    continue;
                };

                let tf = raw_freq / doc.max_frequency;
                if !tf.is_finite() {
                    // An empty-body document records maxFrequency = -inf
                    // (indexer's title-boost sentinel); every posting for
                    // such a document is itself -inf, making tf a -inf/-inf
                    // NaN. Exclude it from scoring rather than let NaN
                    // reach the sort below.
                    continue;
                }
                let dw = tf * idf;

                let idx = *doc_index.entry(doc_id.clone()).or_insert_with(|| {
                    doc_order.push(doc_id.clone());
                    accumulators.push((0.0, 0.0));
                    doc_order.len() - 1
                });

                accumulators[idx].0 += dw * qw_t;
                accumulators[idx].1 += dw * dw;
            }
        }

        let query_norm = query_norm_sq.sqrt();
        if query_norm == 0.0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(String, f64)> = doc_order
            .into_iter()
            .zip(accumulators)
            .filter_map(|(doc_id, (num, den))| {
                if den == 0.0 {
                    None
                } else {
                    Some((doc_id, num / (den.sqrt() * query_norm)))
                }
            })
            .collect();

        // Vec::sort_by is stable, so ties keep the first-encountered order
        // established above (spec.md §4.5 step 6).
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).expect("cosine scores are never NaN"));
        scored.truncate(MAX_RESULTS);

        let mut results = Vec::with_capacity(scored.len());
        for (doc_id, _) in scored {
            if let Some(doc) = self.store.find_doc(&doc_id).await.map_err(Error::Read)? {
                results.push((doc.url, doc.title));
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use super::*;
    use store::{Document, IndexRecord, MockStore};

    async fn index_hello_world() -> MockStore {
        let store = MockStore::new();

        indexer::index_page(
            &store,
            "1".to_string(),
            "https://example.com/hello".to_string(),
            "Hello World".to_string(),
            "hello hello world".to_string(),
        )
        .await
        .unwrap();

        store
    }

    #[tokio::test]
    async fn test_empty_corpus_returns_empty_result() {
        let store = Arc::new(MockStore::new());
        let retriever = Retriever::new(store).await.unwrap();

        let results = retriever.search("anything").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_hello_world_worked_example() {
        let store = Arc::new(index_hello_world().await);
        let retriever = Retriever::new(store).await.unwrap();

        let results = retriever.search("world").await.unwrap();

        assert_eq!(
            results,
            vec![("https://example.com/hello".to_string(), "Hello World".to_string())]
        );
    }

    #[tokio::test]
    async fn test_empty_body_document_is_excluded_rather_than_panicking() {
        let store = MockStore::new();

        // An empty-body page gets maxFrequency = -inf (indexer's
        // title-boost sentinel), which would otherwise produce a NaN
        // cosine score for any query matching its title.
        indexer::index_page(
            &store,
            "1".to_string(),
            "https://example.com/blank".to_string(),
            "Hippo".to_string(),
            String::new(),
        )
        .await
        .unwrap();

        let retriever = Retriever::new(Arc::new(store)).await.unwrap();
        let results = retriever.search("hippo").await.unwrap();

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_query_term_absent_from_index_yields_no_results() {
        let store = Arc::new(index_hello_world().await);
        let retriever = Retriever::new(store).await.unwrap();

        let results = retriever.search("nonexistent").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_empty_query_returns_empty_result() {
        let store = Arc::new(index_hello_world().await);
        let retriever = Retriever::new(store).await.unwrap();

        let results = retriever.search("").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_results_capped_at_twenty_five() {
        let store = MockStore::new();

        for i in 0..30 {
            store
                .insert_doc(&Document {
                    id: i.to_string(),
                    url: format!("https://example.com/{}", i),
                    title: "Hippo".to_string(),
                    max_frequency: 1.0,
                })
                .await
                .unwrap();
        }

        let postings: HashMap<String, f64> =
            (0..30).map(|i| (i.to_string(), 1.0)).collect();
        store
            .insert_term(&IndexRecord {
                term: "hippo".to_string(),
                index: postings,
            })
            .await
            .unwrap();

        let retriever = Retriever::new(Arc::new(store)).await.unwrap();
        let results = retriever.search("hippo").await.unwrap();

        assert_eq!(results.len(), MAX_RESULTS);
    }
}
