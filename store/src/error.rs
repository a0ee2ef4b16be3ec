use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not connect to the store: {0}")]
    ConnectFailed(#[source] sqlx::Error),

    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("could not create a collection: {0}")]
    CollectionCreateFailed(#[source] sqlx::Error),

    #[error("a record with this key already exists")]
    DuplicateKey,

    #[error("read from the store failed: {0}")]
    ReadFailed(#[source] sqlx::Error),

    #[error("write to the store failed: {0}")]
    WriteFailed(#[source] sqlx::Error),
}
