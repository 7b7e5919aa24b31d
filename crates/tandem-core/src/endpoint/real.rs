use crate::{endpoint::RelationEndPointId, error::InternalError, types::ObjectId};
use std::{cell::Cell, fmt, rc::Rc};

///
/// RealObjectEndPoint
///
/// The foreign-key side of a bidirectional relation, as seen from the virtual
/// side. Sync flags use interior mutability; one transaction owns the graph
/// and serializes access.
///

pub trait RealObjectEndPoint: fmt::Debug {
    /// End-point identity on the real side.
    fn id(&self) -> RelationEndPointId;

    /// Object owning the foreign key.
    fn object_id(&self) -> ObjectId {
        self.id().object_id
    }

    /// Reference to the owning domain object (the virtual side's opposite).
    fn domain_object_reference(&self) -> ObjectId {
        self.object_id()
    }

    /// Object the foreign key currently points at.
    fn opposite_object_id(&self) -> Option<ObjectId>;

    /// `None` while the sync state is unknown.
    fn is_synchronized(&self) -> Option<bool>;

    fn mark_synchronized(&self);

    fn mark_unsynchronized(&self);

    fn reset_sync_state(&self);
}

/// Shared, non-owning handle to a real end-point; identity is pointer identity.
pub type RealEndPointRef = Rc<dyn RealObjectEndPoint>;

/// Return true if both handles refer to the same end-point instance.
#[must_use]
pub fn same_end_point(a: &RealEndPointRef, b: &RealEndPointRef) -> bool {
    Rc::ptr_eq(a, b)
}

///
/// SyncState
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SyncState {
    #[default]
    Unknown,
    Synchronized,
    Unsynchronized,
}

///
/// ForeignKeyEndPoint
///
/// In-memory real end-point: owner id, the foreign-key value and a
/// tri-state sync flag.
///

#[derive(Debug)]
pub struct ForeignKeyEndPoint {
    id: RelationEndPointId,
    opposite_object_id: Cell<Option<ObjectId>>,
    sync_state: Cell<SyncState>,
}

impl ForeignKeyEndPoint {
    pub fn try_new(
        id: RelationEndPointId,
        opposite_object_id: Option<ObjectId>,
    ) -> Result<Self, InternalError> {
        if id.is_virtual() {
            return Err(InternalError::end_point_invariant(format!(
                "end-point '{id}' is virtual and cannot hold a foreign key"
            )));
        }

        Ok(Self {
            id,
            opposite_object_id: Cell::new(opposite_object_id),
            sync_state: Cell::new(SyncState::Unknown),
        })
    }

    #[must_use]
    pub fn sync_state(&self) -> SyncState {
        self.sync_state.get()
    }

    pub fn set_opposite_object_id(&self, opposite_object_id: Option<ObjectId>) {
        self.opposite_object_id.set(opposite_object_id);
    }
}

impl RealObjectEndPoint for ForeignKeyEndPoint {
    fn id(&self) -> RelationEndPointId {
        self.id
    }

    fn opposite_object_id(&self) -> Option<ObjectId> {
        self.opposite_object_id.get()
    }

    fn is_synchronized(&self) -> Option<bool> {
        match self.sync_state.get() {
            SyncState::Unknown => None,
            SyncState::Synchronized => Some(true),
            SyncState::Unsynchronized => Some(false),
        }
    }

    fn mark_synchronized(&self) {
        self.sync_state.set(SyncState::Synchronized);
    }

    fn mark_unsynchronized(&self) {
        self.sync_state.set(SyncState::Unsynchronized);
    }

    fn reset_sync_state(&self) {
        self.sync_state.set(SyncState::Unknown);
    }
}

///
/// TESTS
///
