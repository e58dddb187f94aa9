use std::path::PathBuf;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Per-request failure raised while resolving or invoking a resolver.
///
/// Only `Unauthenticated` (and `BadRequest`, raised by the front door before
/// any lookup) reach the caller with a specific message. Every other variant
/// is answered with a generic `Server error` body; the detail stays in logs.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Unknown resolver: {0}")]
    UnknownResolver(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Resolver timed out: {0}")]
    Timeout(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ResolverError {
    /// Wrap any displayable failure as an internal error.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        ResolverError::Internal(err.to_string())
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ResolverError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ResolverError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ResolverError::UnknownResolver(_)
            | ResolverError::Payload(_)
            | ResolverError::Timeout(_)
            | ResolverError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ResolverError::Unauthenticated => "UNAUTHENTICATED",
            ResolverError::UnknownResolver(_) => "UNKNOWN_RESOLVER",
            ResolverError::BadRequest(_) => "BAD_REQUEST",
            ResolverError::Payload(_) => "INVALID_PAYLOAD",
            ResolverError::Timeout(_) => "TIMEOUT",
            ResolverError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The body sent to the caller. Never includes the underlying detail.
    pub fn public_message(&self) -> &'static str {
        match self {
            ResolverError::Unauthenticated => "Unauthenticated",
            ResolverError::BadRequest(_) => "Bad request",
            _ => "Server error",
        }
    }
}

impl From<UnknownHandlerError> for ResolverError {
    fn from(err: UnknownHandlerError) -> Self {
        ResolverError::UnknownResolver(err.name)
    }
}

impl IntoResponse for ResolverError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.public_message(),
        )
            .into_response()
    }
}

/// A resolver name was registered twice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("resolver `{name}` is already registered")]
pub struct DuplicateHandlerError {
    pub name: String,
}

/// A lookup named a resolver that was never registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no resolver named `{name}`")]
pub struct UnknownHandlerError {
    pub name: String,
}

/// Rejected registration. Always a startup-time programming error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error(transparent)]
    Duplicate(#[from] DuplicateHandlerError),

    #[error("resolver names must not be empty")]
    EmptyName,
}

/// Startup failure while discovering resolver units.
///
/// Any of these aborts startup: the server never serves a partially
/// populated registry.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("{source} (unit {})", .unit.display())]
    Duplicate {
        unit: PathBuf,
        #[source]
        source: DuplicateHandlerError,
    },

    #[error("unit {} exports a resolver with an empty name", .0.display())]
    InvalidName(PathBuf),

    #[error("resolver root {} does not exist or is not a directory", .0.display())]
    MissingRoot(PathBuf),

    #[error("failed to walk resolver tree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("unit {} is not linked into this binary", .0.display())]
    UnlinkedUnit(PathBuf),

    #[error("unit {} matches more than one linked unit", .0.display())]
    AmbiguousUnit(PathBuf),

    #[error("failed to load unit {}: {reason}", .unit.display())]
    Load { unit: PathBuf, reason: String },
}

impl DiscoveryError {
    pub(crate) fn from_register(err: RegisterError, unit: &std::path::Path) -> Self {
        match err {
            RegisterError::Duplicate(source) => DiscoveryError::Duplicate {
                unit: unit.to_path_buf(),
                source,
            },
            RegisterError::EmptyName => DiscoveryError::InvalidName(unit.to_path_buf()),
        }
    }
}
