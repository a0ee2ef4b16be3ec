use std::collections::HashSet;
use std::fs;

use once_cell::sync::OnceCell;

use crate::error::Error;

const STOPWORDS_PATH: &str = "stopwords.txt";

static STOPWORDS: OnceCell<HashSet<String>> = OnceCell::new();

/// Returns the process-wide stopword set, loading it from `stopwords.txt` in
/// the working directory on first use.
pub fn stopwords() -> Result<&'static HashSet<String>, Error> {
    STOPWORDS.get_or_try_init(load_stopwords)
}

fn load_stopwords() -> Result<HashSet<String>, Error> {
    let contents = fs::read_to_string(STOPWORDS_PATH).map_err(Error::StopwordsMissing)?;

    let words = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_lowercase())
        .collect();

    log::info!("Loaded stopwords from {}", STOPWORDS_PATH);

    Ok(words)
}

#[cfg(test)]
pub(crate) fn test_stopwords(words: &[&str]) -> HashSet<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}
