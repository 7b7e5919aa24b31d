use derive_more::Display;
use serde::{Deserialize, Serialize};
use tandem_core::error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    /// Return true if the caller can resolve this by synchronizing or
    /// unloading the relation.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self.kind, ErrorKind::Conflict)
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        let kind = match err.class {
            ErrorClass::Conflict => ErrorKind::Conflict,
            ErrorClass::InvariantViolation => ErrorKind::InvariantViolation,
            ErrorClass::Unsupported => ErrorKind::Unsupported,
            ErrorClass::Internal => ErrorKind::Internal,
        };

        Self::new(kind, err.origin.into(), err.message)
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// The relation is out of sync; synchronize or unload to proceed.
    Conflict,

    /// A documented precondition was violated by the caller.
    InvariantViolation,

    /// The relation shape or configuration is not supported.
    Unsupported,

    /// The caller cannot remediate this.
    Internal,
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Model,
    DataManager,
    LoadState,
    Command,
    EndPoint,
    Loader,
    Config,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Model => Self::Model,
            CoreErrorOrigin::DataManager => Self::DataManager,
            CoreErrorOrigin::LoadState => Self::LoadState,
            CoreErrorOrigin::Command => Self::Command,
            CoreErrorOrigin::EndPoint => Self::EndPoint,
            CoreErrorOrigin::Loader => Self::Loader,
            CoreErrorOrigin::Config => Self::Config,
        }
    }
}

///
/// TESTS
///
