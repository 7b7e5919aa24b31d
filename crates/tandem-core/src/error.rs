use crate::{endpoint::RelationEndPointId, types::ObjectId};
use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Not a stable API; intended for internal use and may change without notice.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    /// Construct an InternalError without detail.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Construct a model-origin invariant violation.
    pub(crate) fn model_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Model,
            message.into(),
        )
    }

    /// Construct a data-manager-origin invariant violation.
    pub(crate) fn data_manager_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::DataManager,
            message.into(),
        )
    }

    /// Construct a load-state-origin invariant violation.
    pub(crate) fn load_state_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::LoadState,
            message.into(),
        )
    }

    /// Construct a command-origin invariant violation.
    pub(crate) fn command_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Command,
            message.into(),
        )
    }

    /// Construct an end-point-origin invariant violation.
    pub(crate) fn end_point_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::EndPoint,
            message.into(),
        )
    }

    /// Construct a config-origin unsupported error.
    pub(crate) fn config_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Config, message.into())
    }

    /// Construct a load-state-origin consistency conflict with its structured detail.
    pub(crate) fn consistency(err: ConsistencyError) -> Self {
        Self {
            class: ErrorClass::Conflict,
            origin: ErrorOrigin::LoadState,
            message: err.to_string(),
            detail: Some(ErrorDetail::Consistency(err)),
        }
    }

    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self.class, ErrorClass::Conflict)
    }

    /// Borrow the consistency detail, if this is a consistency conflict.
    #[must_use]
    pub const fn consistency_detail(&self) -> Option<&ConsistencyError> {
        match &self.detail {
            Some(ErrorDetail::Consistency(err)) => Some(err),
            None => None,
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`InternalError`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Consistency(ConsistencyError),
}

///
/// ConsistencyError
///
/// Bidirectional consistency conflicts a caller can remediate. Every variant
/// names the identities involved and the service that resolves it.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConsistencyError {
    #[error(
        "the object end-point '{opposite_end_point}' cannot be synchronized with the virtual object end-point '{virtual_end_point}' because the virtual relation property already refers to another object ('{current_opposite}'); to synchronize '{opposite_end_point}', use the unload service to unload either object '{current_opposite}' or the virtual object end-point '{virtual_end_point}'"
    )]
    SynchronizeConflict {
        opposite_end_point: RelationEndPointId,
        virtual_end_point: RelationEndPointId,
        current_opposite: ObjectId,
    },

    #[error(
        "the virtual property '{virtual_property}' of object '{object_id}' cannot be set because the property is out of sync with the opposite object property '{opposite_property}'; to make this change, synchronize the two properties by calling the relation sync service on the '{opposite_property}' property"
    )]
    SetOutOfSync {
        object_id: ObjectId,
        virtual_property: String,
        opposite_property: String,
    },

    #[error(
        "the domain object '{new_related}' cannot be assigned to the virtual property '{virtual_property}' of object '{object_id}' because its object property '{opposite_property}' is out of sync with the virtual property; to make this change, synchronize the two properties by calling the relation sync service on the '{opposite_property}' property"
    )]
    SetUnsynchronizedTarget {
        new_related: ObjectId,
        object_id: ObjectId,
        virtual_property: String,
        opposite_property: String,
    },

    #[error(
        "the domain object '{object_id}' cannot be deleted because its virtual property '{virtual_property}' is out of sync with the opposite object property '{opposite_property}'; to make this change, synchronize the two properties by calling the relation sync service on the '{virtual_property}' property"
    )]
    DeleteOutOfSync {
        object_id: ObjectId,
        virtual_property: String,
        opposite_property: String,
    },

    #[error(
        "the domain object '{object_id}' cannot be deleted because the opposite object property '{opposite_property}' of domain object '{opposite_object}' is out of sync with the virtual property '{virtual_property}'; to make this change, synchronize the two properties by calling the relation sync service on the '{opposite_property}' property"
    )]
    DeleteUnsynchronizedOpposite {
        object_id: ObjectId,
        opposite_object: ObjectId,
        virtual_property: String,
        opposite_property: String,
    },
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    /// A documented precondition was violated by the caller.
    InvariantViolation,
    /// The object graph is out of sync; the caller can remediate.
    Conflict,
    Unsupported,
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InvariantViolation => "invariant_violation",
            Self::Conflict => "conflict",
            Self::Unsupported => "unsupported",
            Self::Internal => "internal",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Model,
    DataManager,
    LoadState,
    Command,
    EndPoint,
    Loader,
    Config,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Model => "model",
            Self::DataManager => "data_manager",
            Self::LoadState => "load_state",
            Self::Command => "command",
            Self::EndPoint => "end_point",
            Self::Loader => "loader",
            Self::Config => "config",
        };
        write!(f, "{label}")
    }
}
