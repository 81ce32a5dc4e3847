//! The public error type.
//!
//! Internal code works with `anyhow::Result` and attaches context as it goes. When a failure
//! crosses the public command surface it is tagged with an `ErrorType` so that callers (the CLI
//! and the HTTP server) can decide how to present it.

use serde::Serialize;
use std::fmt::{Debug, Display, Formatter};

/// The result type returned by the public command surface.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of a failure, used to pick an exit message or an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The home directory or its configuration is missing or invalid.
    Config,
    /// The SQLite database failed.
    Database,
    /// The caller supplied input that failed validation.
    Request,
    /// Credentials or a bearer token were missing or rejected.
    Unauthorized,
    /// The addressed record does not exist (or is not owned by the caller).
    NotFound,
    /// The request conflicts with existing data, e.g. a duplicate email.
    Conflict,
    /// The network service could not be started or stopped cleanly.
    Service,
    /// Anything else.
    Internal,
}

serde_plain::derive_display_from_serialize!(ErrorType);

/// An error with a classification attached.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    /// Shorthand for an error that carries only a message.
    pub fn msg(error_type: ErrorType, message: impl Display) -> Self {
        Self::new(error_type, anyhow::anyhow!("{message}"))
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    /// The full context chain, outermost first, joined by `: `.
    pub fn chain(&self) -> String {
        format!("{:#}", self.inner)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.inner)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Self::new(ErrorType::Internal, value)
    }
}

/// Tags an internal result with an `ErrorType` as it becomes part of the public surface.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}
