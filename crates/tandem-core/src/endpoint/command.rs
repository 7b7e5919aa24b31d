use crate::{
    endpoint::{RelationChange, RelationEndPointId, TransactionEventSink, VirtualObjectEndPoint},
    error::InternalError,
    obs::RelationEvent,
    types::ObjectId,
};
use std::{fmt, rc::Rc};

///
/// CommandKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommandKind {
    Set,
    SetSame,
    Delete,
}

///
/// ObjectEndPointModification
///
/// What a command does to the current opposite object, as plain data.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ObjectEndPointModification {
    /// No relational change; still raises changing/changed events.
    SetSame { related: Option<ObjectId> },
    Set {
        old_related: Option<ObjectId>,
        new_related: Option<ObjectId>,
    },
    Delete { old_related: Option<ObjectId> },
}

impl ObjectEndPointModification {
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::SetSame { .. } => CommandKind::SetSame,
            Self::Set { .. } => CommandKind::Set,
            Self::Delete { .. } => CommandKind::Delete,
        }
    }

    #[must_use]
    pub const fn old_related_object(&self) -> Option<ObjectId> {
        match *self {
            Self::SetSame { related } => related,
            Self::Set { old_related, .. } | Self::Delete { old_related } => old_related,
        }
    }

    #[must_use]
    pub const fn new_related_object(&self) -> Option<ObjectId> {
        match *self {
            Self::SetSame { related } => related,
            Self::Set { new_related, .. } => new_related,
            Self::Delete { .. } => None,
        }
    }
}

///
/// ObjectEndPointCommand
///
/// A validated, executable modification of one virtual object end-point.
/// Validation happens when the command is created; `perform` only checks that
/// it is applied to the end-point it was built for.
///

#[derive(Clone)]
pub struct ObjectEndPointCommand {
    modified_end_point_id: RelationEndPointId,
    modification: ObjectEndPointModification,
    event_sink: Rc<dyn TransactionEventSink>,
}

impl ObjectEndPointCommand {
    #[must_use]
    pub fn new(
        modified_end_point_id: RelationEndPointId,
        modification: ObjectEndPointModification,
        event_sink: Rc<dyn TransactionEventSink>,
    ) -> Self {
        Self {
            modified_end_point_id,
            modification,
            event_sink,
        }
    }

    #[must_use]
    pub const fn modified_end_point_id(&self) -> &RelationEndPointId {
        &self.modified_end_point_id
    }

    #[must_use]
    pub const fn modification(&self) -> ObjectEndPointModification {
        self.modification
    }

    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        self.modification.kind()
    }

    #[must_use]
    pub const fn old_related_object(&self) -> Option<ObjectId> {
        self.modification.old_related_object()
    }

    #[must_use]
    pub const fn new_related_object(&self) -> Option<ObjectId> {
        self.modification.new_related_object()
    }

    #[must_use]
    pub const fn change(&self) -> RelationChange {
        RelationChange {
            end_point_id: self.modified_end_point_id,
            old_related_object: self.old_related_object(),
            new_related_object: self.new_related_object(),
        }
    }

    /// Raise the "relation changing" notification.
    pub fn begin(&self) {
        self.event_sink.raise_relation_changing(&self.change());
    }

    /// Apply the modification to `end_point` and touch it.
    pub fn perform(&self, end_point: &mut VirtualObjectEndPoint) -> Result<(), InternalError> {
        if end_point.id() != &self.modified_end_point_id {
            return Err(InternalError::command_invariant(format!(
                "command for '{}' cannot be performed on end-point '{}'",
                self.modified_end_point_id,
                end_point.id()
            )));
        }

        match self.modification {
            ObjectEndPointModification::SetSame { .. } => {}
            ObjectEndPointModification::Set { new_related, .. } => {
                end_point.set_current_opposite_object(new_related)?;
            }
            ObjectEndPointModification::Delete { .. } => {
                end_point.set_current_opposite_object(None)?;
            }
        }
        end_point.touch();

        end_point.context().record(RelationEvent::CommandPerformed {
            relation_id: self.modified_end_point_id.relation_id(),
            kind: self.kind(),
        });

        Ok(())
    }

    /// Raise the "relation changed" notification.
    pub fn end(&self) {
        self.event_sink.raise_relation_changed(&self.change());
    }

    /// `begin`, `perform`, `end` in order. `end` is skipped when `perform`
    /// fails.
    pub fn notify_and_perform(
        &self,
        end_point: &mut VirtualObjectEndPoint,
    ) -> Result<(), InternalError> {
        self.begin();
        self.perform(end_point)?;
        self.end();

        Ok(())
    }

    /// Build the command that undoes this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let modification = match self.modification {
            ObjectEndPointModification::SetSame { related } => {
                ObjectEndPointModification::SetSame { related }
            }
            ObjectEndPointModification::Set {
                old_related,
                new_related,
            } => ObjectEndPointModification::Set {
                old_related: new_related,
                new_related: old_related,
            },
            ObjectEndPointModification::Delete { old_related } => ObjectEndPointModification::Set {
                old_related: None,
                new_related: old_related,
            },
        };

        Self {
            modified_end_point_id: self.modified_end_point_id,
            modification,
            event_sink: Rc::clone(&self.event_sink),
        }
    }
}

impl PartialEq for ObjectEndPointCommand {
    fn eq(&self, other: &Self) -> bool {
        self.modified_end_point_id == other.modified_end_point_id
            && self.modification == other.modification
            && Rc::ptr_eq(&self.event_sink, &other.event_sink)
    }
}

impl fmt::Debug for ObjectEndPointCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectEndPointCommand")
            .field("modified_end_point_id", &self.modified_end_point_id)
            .field("modification", &self.modification)
            .finish_non_exhaustive()
    }
}
