/// Convenience result type used across Traitloom.
pub type TraitloomResult<T> = Result<T, TraitloomError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum TraitloomError {
    /// Invalid user-provided collection data.
    #[error("validation error: {0}")]
    Validation(String),

    /// The collection cannot produce the requested batch.
    #[error("configuration error: {0}")]
    Config(String),

    /// Unique sampling ran out of combinations.
    #[error("combinations exhausted: {0}")]
    Exhausted(String),

    /// Archive construction or save failed.
    #[error("archive error: {0}")]
    Archive(String),

    /// The download path was invoked without authorization.
    #[error("archive download is locked until authorization is granted")]
    Locked,

    /// A cancellation token fired between items.
    #[error("operation cancelled")]
    Cancelled,

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TraitloomError {
    /// Build a [`TraitloomError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TraitloomError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`TraitloomError::Exhausted`] value.
    pub fn exhausted(msg: impl Into<String>) -> Self {
        Self::Exhausted(msg.into())
    }

    /// Build a [`TraitloomError::Archive`] value.
    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }

    /// Build a [`TraitloomError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<zip::result::ZipError> for TraitloomError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
