use crate::{
    endpoint::{
        IncompleteVirtualObjectEndPointLoadState, ObjectEndPointCommand,
        ObjectEndPointModification, RealEndPointRef, RelationEndPointId, RelationEndPointProvider,
        TransactionEventSink, VirtualObjectEndPointDataManager, same_end_point,
    },
    error::{ConsistencyError, InternalError},
    types::ObjectId,
};
use std::{collections::BTreeMap, rc::Rc};

///
/// UnregisterOutcome
///
/// Result of unregistering an original opposite end-point from a Complete
/// state. `RequiresIncomplete` asks the owner to mark the data incomplete and
/// retry against the Incomplete buffer.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum UnregisterOutcome {
    Removed,
    RequiresIncomplete,
}

///
/// CompleteVirtualObjectEndPointLoadState
///
/// Load state once the virtual end-point's data is known. Owns the data
/// manager plus the real end-points that point at this end-point's object
/// but were not reconciled into it.
///

#[derive(Clone, Debug)]
pub struct CompleteVirtualObjectEndPointLoadState {
    data_manager: VirtualObjectEndPointDataManager,
    unsynchronized_opposite_end_points: BTreeMap<ObjectId, RealEndPointRef>,
}

impl CompleteVirtualObjectEndPointLoadState {
    #[must_use]
    pub const fn new(data_manager: VirtualObjectEndPointDataManager) -> Self {
        Self {
            data_manager,
            unsynchronized_opposite_end_points: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn data_manager(&self) -> &VirtualObjectEndPointDataManager {
        &self.data_manager
    }

    pub(crate) const fn data_manager_mut(&mut self) -> &mut VirtualObjectEndPointDataManager {
        &mut self.data_manager
    }

    #[must_use]
    pub const fn end_point_id(&self) -> &RelationEndPointId {
        self.data_manager.end_point_id()
    }

    #[must_use]
    pub const fn get_data(&self) -> Option<ObjectId> {
        self.data_manager.current_opposite_object()
    }

    #[must_use]
    pub fn get_original_data(&self) -> Option<ObjectId> {
        self.data_manager.original_opposite_object()
    }

    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.data_manager.has_data_changed()
    }

    /// The virtual side is in sync unless its original value came from an
    /// item whose real end-point never registered.
    #[must_use]
    pub const fn is_synchronized(&self) -> bool {
        self.data_manager.original_item_without_end_point().is_none()
    }

    /// Drop the original item without end-point, if any.
    pub fn synchronize(&mut self) -> Result<(), InternalError> {
        if let Some(item) = self.data_manager.original_item_without_end_point() {
            self.data_manager
                .unregister_original_item_without_end_point(item)?;
        }

        Ok(())
    }

    #[expect(clippy::unused_self)]
    pub fn mark_data_complete(&self) -> Result<(), InternalError> {
        Err(InternalError::load_state_invariant(
            "the data is already complete",
        ))
    }

    #[must_use]
    pub fn can_be_marked_incomplete(&self) -> bool {
        !self.has_changed()
    }

    /// Rebuild an Incomplete buffer from every original and unsynchronized
    /// opposite end-point. Fails while the data has unsaved changes.
    pub fn mark_data_incomplete(
        &self,
    ) -> Result<IncompleteVirtualObjectEndPointLoadState, InternalError> {
        if self.has_changed() {
            return Err(InternalError::load_state_invariant(format!(
                "cannot mark virtual end-point '{}' incomplete because it has been changed",
                self.end_point_id()
            )));
        }

        let end_points = self
            .get_original_opposite_end_points()
            .chain(self.unsynchronized_opposite_end_points.values())
            .cloned();

        Ok(IncompleteVirtualObjectEndPointLoadState::with_original_opposite_end_points(end_points))
    }

    pub fn register_original_opposite_end_point(
        &mut self,
        end_point: RealEndPointRef,
    ) -> Result<(), InternalError> {
        let object_id = end_point.object_id();

        if self.data_manager.contains_original_object_id(object_id) {
            self.data_manager
                .register_original_opposite_end_point(end_point.clone())?;
            end_point.mark_synchronized();
        } else {
            if self
                .unsynchronized_opposite_end_points
                .contains_key(&object_id)
            {
                return Err(InternalError::load_state_invariant(format!(
                    "the opposite end-point '{}' has already been registered as unsynchronized",
                    end_point.id()
                )));
            }

            end_point.mark_unsynchronized();
            self.unsynchronized_opposite_end_points
                .insert(object_id, end_point);
        }

        Ok(())
    }

    pub(crate) fn unregister_original_opposite_end_point(
        &mut self,
        end_point: &RealEndPointRef,
    ) -> Result<UnregisterOutcome, InternalError> {
        let object_id = end_point.object_id();

        match self.unsynchronized_opposite_end_points.get(&object_id) {
            Some(existing) if same_end_point(existing, end_point) => {
                self.unsynchronized_opposite_end_points.remove(&object_id);
                end_point.reset_sync_state();

                Ok(UnregisterOutcome::Removed)
            }
            Some(_) => Err(InternalError::load_state_invariant(format!(
                "a different opposite end-point of object '{object_id}' has been registered as unsynchronized"
            ))),
            None => Ok(UnregisterOutcome::RequiresIncomplete),
        }
    }

    pub fn unsynchronized_opposite_end_points(&self) -> impl Iterator<Item = &RealEndPointRef> {
        self.unsynchronized_opposite_end_points.values()
    }

    /// Reconcile a previously unsynchronized real end-point into the data
    /// manager as the original opposite.
    pub fn synchronize_opposite_end_point(
        &mut self,
        end_point: RealEndPointRef,
        strict: bool,
    ) -> Result<(), InternalError> {
        let object_id = end_point.object_id();

        // a registered original end-point leaves nothing to reconcile
        let has_original_end_point = self.data_manager.original_opposite_end_point().is_some();
        if let Some(current_opposite) = self.data_manager.original_opposite_object()
            && (has_original_end_point || current_opposite != object_id)
        {
            return Err(InternalError::consistency(
                ConsistencyError::SynchronizeConflict {
                    opposite_end_point: end_point.id(),
                    virtual_end_point: *self.end_point_id(),
                    current_opposite,
                },
            ));
        }

        let tracked = self
            .unsynchronized_opposite_end_points
            .get(&object_id)
            .is_some_and(|existing| same_end_point(existing, &end_point));
        if strict && !tracked {
            return Err(InternalError::load_state_invariant(format!(
                "the opposite end-point '{}' has not been registered as unsynchronized",
                end_point.id()
            )));
        }

        self.data_manager
            .register_original_opposite_end_point(end_point.clone())?;
        if tracked {
            self.unsynchronized_opposite_end_points.remove(&object_id);
        }
        end_point.mark_synchronized();

        Ok(())
    }

    /// Sequence of 0 or 1 original opposite end-points.
    pub fn get_original_opposite_end_points(
        &self,
    ) -> impl Iterator<Item = &RealEndPointRef> + Clone {
        self.data_manager.original_opposite_end_point().into_iter()
    }

    /// Sequence of 0 or 1 original items without end-point.
    pub fn get_original_items_without_end_points(
        &self,
    ) -> impl Iterator<Item = ObjectId> + Clone {
        self.data_manager
            .original_item_without_end_point()
            .into_iter()
    }

    pub fn create_set_command(
        &self,
        new_related_object: Option<ObjectId>,
        event_sink: Rc<dyn TransactionEventSink>,
    ) -> Result<ObjectEndPointCommand, InternalError> {
        let id = self.end_point_id();

        if self.data_manager.original_item_without_end_point().is_some() {
            return Err(InternalError::consistency(ConsistencyError::SetOutOfSync {
                object_id: id.object_id,
                virtual_property: id.definition.qualified_name(),
                opposite_property: id.definition.opposite_qualified_name(),
            }));
        }

        let current = self.data_manager.current_opposite_object();
        if new_related_object == current {
            return Ok(ObjectEndPointCommand::new(
                *id,
                ObjectEndPointModification::SetSame { related: current },
                event_sink,
            ));
        }

        if let Some(new_related) = new_related_object
            && self
                .unsynchronized_opposite_end_points
                .contains_key(&new_related)
        {
            return Err(InternalError::consistency(
                ConsistencyError::SetUnsynchronizedTarget {
                    new_related,
                    object_id: id.object_id,
                    virtual_property: id.definition.qualified_name(),
                    opposite_property: id.definition.opposite_qualified_name(),
                },
            ));
        }

        Ok(ObjectEndPointCommand::new(
            *id,
            ObjectEndPointModification::Set {
                old_related: current,
                new_related: new_related_object,
            },
            event_sink,
        ))
    }

    pub fn create_delete_command(
        &self,
        event_sink: Rc<dyn TransactionEventSink>,
    ) -> Result<ObjectEndPointCommand, InternalError> {
        let id = self.end_point_id();

        if self.data_manager.original_item_without_end_point().is_some() {
            return Err(InternalError::consistency(
                ConsistencyError::DeleteOutOfSync {
                    object_id: id.object_id,
                    virtual_property: id.definition.qualified_name(),
                    opposite_property: id.definition.opposite_qualified_name(),
                },
            ));
        }

        if let Some(opposite_object) = self.unsynchronized_opposite_end_points.keys().next() {
            return Err(InternalError::consistency(
                ConsistencyError::DeleteUnsynchronizedOpposite {
                    object_id: id.object_id,
                    opposite_object: *opposite_object,
                    virtual_property: id.definition.qualified_name(),
                    opposite_property: id.definition.opposite_qualified_name(),
                },
            ));
        }

        Ok(ObjectEndPointCommand::new(
            *id,
            ObjectEndPointModification::Delete {
                old_related: self.data_manager.current_opposite_object(),
            },
            event_sink,
        ))
    }

    pub fn set_data_from_sub_transaction(
        &mut self,
        source: &Self,
        provider: &dyn RelationEndPointProvider,
    ) -> Result<(), InternalError> {
        self.data_manager
            .set_data_from_sub_transaction(&source.data_manager, provider)
    }

    pub fn commit(&mut self) {
        self.data_manager.commit();
    }

    pub fn rollback(&mut self) {
        self.data_manager.rollback();
    }
}
