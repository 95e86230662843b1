use thiserror::Error;

/// Errors raised while resolving cached per-type artifacts.
///
/// A failed derivation is never cached: the next request for the same type
/// runs the derivation again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The requested artifact kind has no store.
    #[error("unsupported artifact kind `{kind}`")]
    UnsupportedKind { kind: &'static str },

    /// A type described itself inconsistently.
    #[error("invalid metadata for `{ty}`: {reason}")]
    InvalidMetadata { ty: &'static str, reason: String },
}

impl CacheError {
    pub(crate) fn invalid_metadata(ty: &'static str, reason: impl Into<String>) -> Self {
        CacheError::InvalidMetadata {
            ty,
            reason: reason.into(),
        }
    }
}
