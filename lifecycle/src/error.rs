use thiserror::Error;

use crate::events::StatusCode;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to connect to the store: {0}")]
    Connect(#[source] store::Error),

    #[error("failed to create store collections: {0}")]
    CollectionCreate(#[source] store::Error),

    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Stopwords(#[from] textpipeline::Error),
}

impl Error {
    /// Maps a fatal error onto the status-code taxonomy the UI
    /// collaborator's error dialog is indexed by (spec.md §6).
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Connect(_) => StatusCode::ConnectFailed,
            Error::CollectionCreate(_) => StatusCode::CollectionCreateFailed,
            Error::InvalidConfig(_) => StatusCode::InvalidUri,
            Error::Stopwords(_) => StatusCode::StopwordsMissing,
        }
    }
}
