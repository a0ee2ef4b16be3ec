use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    TextPipeline(#[from] textpipeline::Error),

    #[error("reading from the store failed: {0}")]
    Read(#[source] store::Error),
}
