use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("stopwords file could not be read: {0}")]
    StopwordsMissing(std::io::Error),
}
