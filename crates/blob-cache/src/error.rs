use thiserror::Error;

/// A cache miss and a malformed blob are both recoverable by the
/// caller (fall back to recompute from scratch); this crate surfaces them as
/// ordinary `Option`/`Err` rather than a dedicated variant, reserving this
/// enum for failures a caller cannot locally paper over.
#[derive(Debug, Error)]
pub enum BlobCacheError {
    #[error("blob cache backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("failed to serialize bundle blob: {0}")]
    Serialize(#[from] serde_json::Error),
}
