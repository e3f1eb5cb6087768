//! Store-level error taxonomy.
//!
//! # Invariants
//! - Validation and not-found errors are raised before any mutation is
//!   attempted, so they never leave partial state behind.
//! - Persistence errors leave the in-memory store at its last confirmed state.

use crate::model::{EntityId, EntityKind, ValidationError};
use crate::persistence::PersistenceError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Credential check failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No account has the supplied identifier.
    UnknownUser(EntityId),
    /// Supplied password differs from the stored one.
    PasswordMismatch,
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownUser(id) => write!(f, "unknown user: {id}"),
            Self::PasswordMismatch => write!(f, "password does not match"),
        }
    }
}

impl Error for AuthError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Validation(ValidationError),
    NotFound { kind: EntityKind, id: EntityId },
    Auth(AuthError),
    Persistence(PersistenceError),
}

impl StoreError {
    pub(crate) fn not_found(kind: EntityKind, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Auth(_) => "auth",
            Self::Persistence(_) => "persistence",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Auth(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::Auth(err) => Some(err),
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<AuthError> for StoreError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<PersistenceError> for StoreError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}
