//! Core error types for Ensemble
use thiserror::Error;

/// Result type alias using `ClubError`
pub type Result<T> = std::result::Result<T, ClubError>;

/// Why an authentication attempt was refused.
///
/// Each case tells the user something different to do next, so they are
/// never collapsed into a single "login failed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No account with that name/email exists
    UnknownUser,
    /// The account exists but an admin has not approved it yet
    PendingApproval,
    /// The credential did not match
    WrongPassword,
    /// The operation needs a session and there is none
    NotSignedIn,
}

impl AuthFailure {
    /// Stable machine-readable code
    pub fn code(self) -> &'static str {
        match self {
            AuthFailure::UnknownUser => "unknown_user",
            AuthFailure::PendingApproval => "pending_approval",
            AuthFailure::WrongPassword => "wrong_password",
            AuthFailure::NotSignedIn => "not_signed_in",
        }
    }
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            AuthFailure::UnknownUser => "not a registered user; sign up and wait for approval",
            AuthFailure::PendingApproval => "account is waiting for admin approval",
            AuthFailure::WrongPassword => "password is incorrect",
            AuthFailure::NotSignedIn => "sign-in required",
        };
        f.write_str(msg)
    }
}

/// Core error type for Ensemble
#[derive(Error, Debug)]
pub enum ClubError {
    /// Missing or invalid required field
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Duplicate name/email, or a request that was superseded
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Authentication refused
    #[error("Authentication failed: {0}")]
    Auth(AuthFailure),

    /// The acting identity may not perform this operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The admin account is managed separately and cannot be changed here
    #[error("Protected account: {0}")]
    ProtectedAccount(String),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Backing store failure, message carried verbatim
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// The configured backend does not offer this capability
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl ClubError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a permission denied error
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Create a protected account error
    pub fn protected_account(msg: impl Into<String>) -> Self {
        Self::ProtectedAccount(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            ClubError::Validation(_) => "validation",
            ClubError::Conflict(_) => "conflict",
            ClubError::Auth(failure) => failure.code(),
            ClubError::PermissionDenied(_) => "permission_denied",
            ClubError::ProtectedAccount(_) => "protected_account",
            ClubError::NotFound { .. } => "not_found",
            ClubError::Persistence(_) | ClubError::Serialization(_) => "persistence",
            ClubError::Unsupported(_) => "unsupported",
        }
    }
}

impl From<AuthFailure> for ClubError {
    fn from(failure: AuthFailure) -> Self {
        Self::Auth(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_have_distinct_codes_and_messages() {
        let all = [
            AuthFailure::UnknownUser,
            AuthFailure::PendingApproval,
            AuthFailure::WrongPassword,
            AuthFailure::NotSignedIn,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.code(), b.code());
                assert_ne!(a.to_string(), b.to_string());
            }
        }
    }

    #[test]
    fn protected_account_is_not_a_permission_error() {
        let err = ClubError::protected_account("admin cannot be deleted");
        assert_eq!(err.code(), "protected_account");
        assert!(err.to_string().contains("admin cannot be deleted"));
    }
}
