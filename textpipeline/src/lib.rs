//! Deterministic, stateless text normalization shared by the indexer and
//! the retriever.
//!
//! The only state involved is the process-wide stopword set and stemmer
//! instance, both lazily initialized on first use (see [`stopwords`] and
//! [`stemmer`]).

pub mod error;
mod stopwords;

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use rust_stemmers::{Algorithm, Stemmer};

pub use error::Error;
pub use stopwords::stopwords;

static STEMMER: Lazy<Stemmer> = Lazy::new(|| Stemmer::create(Algorithm::English));

/// Lowercases `text`, strips everything outside `[a-z0-9\s]`, splits on
/// whitespace runs, drops stopwords, and stems what remains.
pub fn normalize(text: &str) -> Result<Vec<String>, Error> {
    Ok(normalize_with(text, stopwords()?, &STEMMER))
}

fn normalize_with(text: &str, stopwords: &HashSet<String>, stemmer: &Stemmer) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|token| !stopwords.contains(*token))
        .map(|token| stemmer.stem(token).into_owned())
        .collect()
}

/// Normalizes `text`, then returns each surviving term mapped to its
/// frequency divided by the total (post-normalization) token count,
/// including duplicates. Returns an empty map if no tokens survive.
pub fn clean_query(text: &str) -> Result<HashMap<String, f64>, Error> {
    let tokens = normalize(text)?;
    Ok(frequencies(&tokens))
}

fn frequencies(tokens: &[String]) -> HashMap<String, f64> {
    if tokens.is_empty() {
        return HashMap::new();
    }

    let mut counts: HashMap<String, f64> = HashMap::new();
    for token in tokens {
        *counts.entry(token.clone()).or_insert(0.0) += 1.0;
    }

    let total = tokens.len() as f64;
    for value in counts.values_mut() {
        *value /= total;
    }

    counts
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::stopwords::test_stopwords;

    mod normalize {
        use super::*;

        fn stemmer() -> Stemmer {
            Stemmer::create(Algorithm::English)
        }

        #[test]
        fn test_lowercases_and_strips_punctuation() {
            let stopwords = test_stopwords(&[]);
            let tokens = normalize_with("Hello, World!!", &stopwords, &stemmer());
            assert_eq!(tokens, vec!["hello".to_string(), "world".to_string()]);
        }

        #[test]
        fn test_drops_stopwords() {
            let stopwords = test_stopwords(&["the", "a"]);
            let tokens = normalize_with("the a quick fox", &stopwords, &stemmer());
            assert_eq!(tokens, vec!["quick".to_string(), "fox".to_string()]);
        }

        #[test]
        fn test_collapses_whitespace_runs() {
            let stopwords = test_stopwords(&[]);
            let tokens = normalize_with("hello     world", &stopwords, &stemmer());
            assert_eq!(tokens, vec!["hello".to_string(), "world".to_string()]);
        }

        #[test]
        fn test_empty_input_yields_no_tokens() {
            let stopwords = test_stopwords(&[]);
            let tokens = normalize_with("   ", &stopwords, &stemmer());
            assert!(tokens.is_empty());
        }

        #[test]
        fn test_all_stopword_input_yields_no_tokens() {
            let stopwords = test_stopwords(&["the", "a"]);
            let tokens = normalize_with("the a the", &stopwords, &stemmer());
            assert!(tokens.is_empty());
        }

        #[test]
        fn test_stems_to_common_root() {
            let stopwords = test_stopwords(&[]);
            let tokens = normalize_with("running runner ran", &stopwords, &stemmer());
            // Porter stemming collapses "running" and "runner" to "run";
            // "ran" is an irregular form and is not reduced to the same stem.
            assert_eq!(tokens[0], "run");
            assert_eq!(tokens[1], "runner");
        }
    }

    mod frequencies {
        use super::*;

        #[test]
        fn test_sums_to_one() {
            let tokens = vec!["quick".to_string()];
            let freqs = frequencies(&tokens);
            let total: f64 = freqs.values().sum();
            assert!((total - 1.0).abs() < 1e-9);
        }

        #[test]
        fn test_duplicate_tokens_share_the_distribution() {
            let tokens = vec!["hello".to_string(), "hello".to_string(), "world".to_string()];
            let freqs = frequencies(&tokens);
            assert!((freqs["hello"] - 2.0 / 3.0).abs() < 1e-9);
            assert!((freqs["world"] - 1.0 / 3.0).abs() < 1e-9);
        }

        #[test]
        fn test_empty_tokens_yields_empty_map() {
            assert!(frequencies(&[]).is_empty());
        }
    }

    #[test]
    fn test_clean_query_stopword_removal() {
        let stopwords = test_stopwords(&["the", "a"]);
        let tokens = normalize_with("the A quick", &stopwords, &STEMMER);
        let freqs = frequencies(&tokens);
        assert_eq!(freqs.len(), 1);
        assert!((freqs["quick"] - 1.0).abs() < 1e-9);
    }
}
