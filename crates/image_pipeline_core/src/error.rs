use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    AlreadyExists,
    AccessDenied,
    NotFound,
    Other,
}

/// Classified failure returned by any cloud capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub operation: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(
        kind: ProviderErrorKind,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn other(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, operation, message)
    }

    pub fn is_access_denied(&self) -> bool {
        self.kind == ProviderErrorKind::AccessDenied
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ProviderErrorKind::NotFound
    }

    pub fn is_already_exists(&self) -> bool {
        self.kind == ProviderErrorKind::AlreadyExists
    }
}

/// Result of an idempotent create call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyPresent,
}

/// Maps a raw create result into the idempotent form: an "already exists"
/// failure becomes `AlreadyPresent`, anything else is passed through.
pub fn idempotent(result: Result<(), ProviderError>) -> Result<CreateOutcome, ProviderError> {
    match result {
        Ok(()) => Ok(CreateOutcome::Created),
        Err(error) if error.is_already_exists() => Ok(CreateOutcome::AlreadyPresent),
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent_distinguishes_created_from_present() {
        assert_eq!(idempotent(Ok(())), Ok(CreateOutcome::Created));
        let exists = ProviderError::new(ProviderErrorKind::AlreadyExists, "CreateTable", "in use");
        assert_eq!(idempotent(Err(exists)), Ok(CreateOutcome::AlreadyPresent));
    }

    #[test]
    fn idempotent_keeps_other_failures() {
        let denied = ProviderError::new(ProviderErrorKind::AccessDenied, "CreateTable", "denied");
        assert_eq!(idempotent(Err(denied.clone())), Err(denied));
    }

    #[test]
    fn kind_predicates_match_only_their_kind() {
        let missing = ProviderError::new(ProviderErrorKind::NotFound, "HeadBucket", "NoSuchBucket");
        assert!(missing.is_not_found());
        assert!(!missing.is_access_denied());
        assert!(!missing.is_already_exists());

        let denied = ProviderError::new(ProviderErrorKind::AccessDenied, "PutObject", "denied");
        assert!(!denied.is_not_found());
        assert!(denied.is_access_denied());
    }

    #[test]
    fn display_names_the_operation() {
        let error = ProviderError::other("PutObject", "timeout");
        assert_eq!(error.to_string(), "PutObject failed: timeout");
    }
}
