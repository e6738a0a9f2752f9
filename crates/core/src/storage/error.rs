use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("company not found: {ticker}")]
    NotFound { ticker: String },

    #[error("rejected update for {ticker}: {detail}")]
    Rejected { ticker: String, detail: String },

    /// Failure inside the backing store itself.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
