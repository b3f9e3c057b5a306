use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigStoreError {
    #[error("malformed config payload: {reason}")]
    MalformedPayload { reason: String },
}
