//! Computes the per-page frequency map (with title boost) and applies the
//! insert/merge protocol against a [`store::Store`].

pub mod error;

use std::collections::HashMap;

pub use error::Error;
use store::{Document, IndexRecord, Store};

/// Tokens longer than this are dropped while accumulating frequencies
/// (spec.md §4.1/§4.3), even though they survive plain normalization.
const MAX_TERM_LEN: usize = 30;

/// Indexes one crawled page: computes its frequency map with title boost,
/// inserts its [`Document`] record, and merges each term into the
/// inverted index.
///
/// Per-term write failures and duplicate-key conflicts are logged and
/// swallowed (spec.md §7) so a single bad write never aborts a crawl.
/// Only a failure while *reading* a term's existing posting map
/// propagates to the caller, since that read result directly determines
/// correctness of the subsequent write.
pub async fn index_page(
    store: &dyn Store,
    doc_id: String,
    url: String,
    title: String,
    body: String,
) -> Result<(), Error> {
    let title_tokens = textpipeline::normalize(&title)?;
    let body_tokens = textpipeline::normalize(&body)?;

    let mut frequencies = body_frequencies(&body_tokens);

    let max_freq = max_frequency(&frequencies);

    apply_title_boost(&mut frequencies, &title_tokens, max_freq);

    let doc = Document {
        id: doc_id.clone(),
        url,
        title,
        max_frequency: max_freq,
    };

    if let Err(e) = store.insert_doc(&doc).await {
        log::warn!("dropping duplicate document write for {}: {}", doc_id, e);
    }

    for (term, freq) in frequencies {
        merge_term(store, &term, &doc_id, freq).await?;
    }

    Ok(())
}

fn body_frequencies(tokens: &[String]) -> HashMap<String, f64> {
    let mut frequencies = HashMap::new();
    for token in tokens {
        if token.chars().count() > MAX_TERM_LEN {
            continue;
        }
        *frequencies.entry(token.clone()).or_insert(0.0) += 1.0;
    }
    frequencies
}

/// The maximum raw count in the body frequency map, or negative infinity
/// when the page's body yields no tokens. This sentinel is preserved
/// exactly as spec.md §4.3/§9 describes rather than special-cased, since
/// the spec is explicit that empty-body pages still get recorded.
fn max_frequency(frequencies: &HashMap<String, f64>) -> f64 {
    frequencies
        .values()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max)
}

fn apply_title_boost(frequencies: &mut HashMap<String, f64>, title_tokens: &[String], boost: f64) {
    for token in title_tokens {
        if token.chars().count() > MAX_TERM_LEN {
            continue;
        }
        *frequencies.entry(token.clone()).or_insert(0.0) += boost;
    }
}

/// Reads the term's current posting map and writes it back with `doc_id`
/// merged in. The read failure propagates (spec.md §7); a write failure
/// on this single term is logged and swallowed so the crawl continues.
async fn merge_term(store: &dyn Store, term: &str, doc_id: &str, freq: f64) -> Result<(), Error> {
    let existing = store.find_term(term).await.map_err(Error::Read)?;

    let write_result = match existing {
        None => {
            let record = IndexRecord {
                term: term.to_string(),
                index: HashMap::from([(doc_id.to_string(), freq)]),
            };
            // A concurrent writer may have inserted the term between our
            // read and this insert; that race is an accepted looseness
            // (spec.md §5) and is swallowed below like any other write.
            store.insert_term(&record).await
        }
        Some(mut record) => {
            record.index.insert(doc_id.to_string(), freq);
            store.update_term_index(term, &record.index).await
        }
    };

    if let Err(e) = write_result {
        log::warn!("dropping index write for term '{}': {}", term, e);
    }

    Ok(())
}
