use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Failure taxonomy shared by every registry operation.
///
/// `Store` and `Unavailable` are storage failures: no partial write has
/// happened. Most may be retried; see [`RegistryError::is_retryable`].
/// `Validation` must not be retried without fixing the input, and `NotFound`
/// is a terminal answer.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{field} is required")]
    Validation { field: &'static str },

    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },

    #[error("database error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("database unavailable: {0}")]
    Unavailable(String),
}

impl RegistryError {
    pub fn not_found(what: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            key: key.into(),
        }
    }

    /// Storage failures other than constraint violations, plus the
    /// duplicate-key race: a retry of that one sees the committed row and
    /// takes the update path. A NOT NULL or CHECK failure repeats forever.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(_) if self.is_constraint_violation() => self.is_duplicate_key(),
            Self::Store(_) | Self::Unavailable(_) => true,
            Self::Validation { .. } | Self::NotFound { .. } => false,
        }
    }

    /// True when a write collided with an existing primary or unique key.
    pub fn is_duplicate_key(&self) -> bool {
        match self {
            Self::Store(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.extended_code,
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            ),
            _ => false,
        }
    }

    /// True when the store rejected a write on a key or NOT NULL constraint,
    /// e.g. two submissions racing to create the same project number.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            Self::Store(rusqlite::Error::SqliteFailure(err, _)) => {
                err.code == rusqlite::ErrorCode::ConstraintViolation
            }
            _ => false,
        }
    }
}

/// Rejects a missing or empty value but keeps whitespace, which is a
/// meaningful substring to search for.
pub(crate) fn present<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(RegistryError::Validation { field }),
    }
}

/// Rejects missing and blank values for a required field.
pub(crate) fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(RegistryError::Validation { field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_missing_and_blank() {
        assert!(matches!(
            required(None, "projectNumber"),
            Err(RegistryError::Validation { field: "projectNumber" })
        ));
        assert!(required(Some("  "), "name").is_err());
        assert_eq!(required(Some("P100"), "projectNumber").unwrap(), "P100");
    }

    #[test]
    fn present_keeps_whitespace() {
        assert_eq!(present(Some(" "), "name").unwrap(), " ");
        assert!(present(Some(""), "name").is_err());
        assert!(present(None, "name").is_err());
    }

    #[test]
    fn only_storage_failures_are_retryable() {
        assert!(!RegistryError::Validation { field: "name" }.is_retryable());
        assert!(!RegistryError::not_found("researcher", "R1").is_retryable());
        assert!(RegistryError::Unavailable("lock poisoned".into()).is_retryable());
        assert!(RegistryError::Store(rusqlite::Error::QueryReturnedNoRows).is_retryable());
    }
}
