use thiserror::Error;

/// Error type shared by schema construction, checking, and validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The input does not decode into a schema, or the schema violates a
    /// well-formedness invariant.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// Validation followed more `ref` indirections than the configured limit.
    #[error("max depth exceeded: more than {max_depth} nested ref(s)")]
    MaxDepthExceeded { max_depth: usize },
    /// A `ref` named a definition the root schema does not declare.
    ///
    /// Only reachable when validating a schema that was never checked.
    #[error("unresolved ref: no definition named '{0}'")]
    UnresolvedRef(String),
}

impl Error {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Error::InvalidSchema(reason.into())
    }
}

/// Convenience alias for results returned by typedef crates.
pub type Result<T> = std::result::Result<T, Error>;
