//! Module: endpoint::data_manager
//! Responsibility: current/original opposite bookkeeping for one virtual
//! object end-point.
//! Does not own: loading, command construction, sync-state routing.


use crate::{
    endpoint::{RealEndPointRef, RelationEndPointId, RelationEndPointProvider, same_end_point},
    error::InternalError,
    types::ObjectId,
};

///
/// VirtualObjectEndPointDataManager
///
/// Holds the current and original opposite reference of exactly one virtual
/// object end-point and enforces its registration invariants. Pure data: no
/// loading and no commands.
///
/// An original item without end-point and an original end-point are never
/// set together; either one, when set, names the original opposite object.
///

#[derive(Clone, Debug)]
pub struct VirtualObjectEndPointDataManager {
    end_point_id: RelationEndPointId,
    current_opposite_object: Option<ObjectId>,
    current_opposite_end_point: Option<RealEndPointRef>,
    original_opposite_object: Option<ObjectId>,
    original_opposite_end_point: Option<RealEndPointRef>,
    original_item_without_end_point: Option<ObjectId>,
}

impl VirtualObjectEndPointDataManager {
    #[must_use]
    pub const fn new(end_point_id: RelationEndPointId) -> Self {
        Self {
            end_point_id,
            current_opposite_object: None,
            current_opposite_end_point: None,
            original_opposite_object: None,
            original_opposite_end_point: None,
            original_item_without_end_point: None,
        }
    }

    #[must_use]
    pub const fn end_point_id(&self) -> &RelationEndPointId {
        &self.end_point_id
    }

    #[must_use]
    pub const fn current_opposite_object(&self) -> Option<ObjectId> {
        self.current_opposite_object
    }

    /// Assign the current opposite object. Command execution path only.
    pub const fn set_current_opposite_object(&mut self, opposite: Option<ObjectId>) {
        self.current_opposite_object = opposite;
    }

    #[must_use]
    pub const fn original_opposite_object(&self) -> Option<ObjectId> {
        self.original_opposite_object
    }

    #[must_use]
    pub const fn original_opposite_end_point(&self) -> Option<&RealEndPointRef> {
        self.original_opposite_end_point.as_ref()
    }

    #[must_use]
    pub const fn original_item_without_end_point(&self) -> Option<ObjectId> {
        self.original_item_without_end_point
    }

    #[must_use]
    pub const fn current_opposite_end_point(&self) -> Option<&RealEndPointRef> {
        self.current_opposite_end_point.as_ref()
    }

    /// Return true if `object_id` is the original opposite object.
    #[must_use]
    pub fn contains_original_object_id(&self, object_id: ObjectId) -> bool {
        self.original_opposite_object == Some(object_id)
    }

    /// Register `end_point` as the original opposite end-point.
    ///
    /// Replaces an original item without end-point for the same object. The
    /// current mirror follows unless a current end-point is already set.
    pub fn register_original_opposite_end_point(
        &mut self,
        end_point: RealEndPointRef,
    ) -> Result<(), InternalError> {
        let object_id = end_point.object_id();

        if let Some(existing) = &self.original_opposite_end_point {
            return Err(InternalError::data_manager_invariant(format!(
                "the original opposite end-point of '{}' has already been registered ('{}'); cannot register '{}'",
                self.end_point_id,
                existing.id(),
                end_point.id()
            )));
        }

        match self.original_opposite_object {
            Some(original) if original != object_id => {
                let reason = if self.original_item_without_end_point.is_some() {
                    format!("the original item '{original}' has no end-point and differs from '{object_id}'")
                } else {
                    format!("the original opposite object is '{original}'")
                };
                return Err(InternalError::data_manager_invariant(format!(
                    "cannot register opposite end-point '{}' for '{}': {reason}",
                    end_point.id(),
                    self.end_point_id
                )));
            }
            Some(_) => {
                if self.current_opposite_end_point.is_none()
                    && self.current_opposite_object == Some(object_id)
                {
                    self.current_opposite_end_point = Some(end_point.clone());
                }
            }
            None => {
                // current value already set by another end-point: leave it
                if self.current_opposite_end_point.is_none() {
                    self.current_opposite_object = Some(object_id);
                    self.current_opposite_end_point = Some(end_point.clone());
                }
            }
        }

        self.original_opposite_object = Some(object_id);
        self.original_opposite_end_point = Some(end_point);
        self.original_item_without_end_point = None;

        Ok(())
    }

    /// Unregister the original opposite end-point; `end_point` must be the
    /// registered instance.
    pub fn unregister_original_opposite_end_point(
        &mut self,
        end_point: &RealEndPointRef,
    ) -> Result<(), InternalError> {
        let registered = self
            .original_opposite_end_point
            .as_ref()
            .is_some_and(|existing| same_end_point(existing, end_point));
        if !registered {
            return Err(InternalError::data_manager_invariant(format!(
                "the opposite end-point '{}' has not been registered as original opposite of '{}'",
                end_point.id(),
                self.end_point_id
            )));
        }

        if self
            .current_opposite_end_point
            .as_ref()
            .is_some_and(|current| same_end_point(current, end_point))
        {
            self.current_opposite_object = None;
            self.current_opposite_end_point = None;
        }
        self.original_opposite_object = None;
        self.original_opposite_end_point = None;

        Ok(())
    }

    /// Register an original opposite object whose real end-point is unknown.
    pub fn register_original_item_without_end_point(
        &mut self,
        item: ObjectId,
    ) -> Result<(), InternalError> {
        if let Some(existing) = self.original_opposite_object {
            return Err(InternalError::data_manager_invariant(format!(
                "an original opposite item ('{existing}') has already been registered for '{}'; cannot register '{item}'",
                self.end_point_id
            )));
        }

        if self.current_opposite_end_point.is_none() {
            self.current_opposite_object = Some(item);
        }
        self.original_opposite_object = Some(item);
        self.original_item_without_end_point = Some(item);

        Ok(())
    }

    /// Unregister an original item without end-point.
    pub fn unregister_original_item_without_end_point(
        &mut self,
        item: ObjectId,
    ) -> Result<(), InternalError> {
        if self.original_item_without_end_point != Some(item) {
            let reason = if self.original_opposite_end_point.is_some()
                && self.original_opposite_object == Some(item)
            {
                "an end-point has been registered for it"
            } else {
                "it has not been registered"
            };
            return Err(InternalError::data_manager_invariant(format!(
                "cannot unregister original item '{item}' of '{}': {reason}",
                self.end_point_id
            )));
        }

        if self.current_opposite_end_point.is_none() && self.current_opposite_object == Some(item)
        {
            self.current_opposite_object = None;
        }
        self.original_opposite_object = None;
        self.original_item_without_end_point = None;

        Ok(())
    }

    pub fn register_current_opposite_end_point(
        &mut self,
        end_point: RealEndPointRef,
    ) -> Result<(), InternalError> {
        if let Some(existing) = &self.current_opposite_end_point {
            return Err(InternalError::data_manager_invariant(format!(
                "an opposite end-point ('{}') has already been registered as current for '{}'",
                existing.id(),
                self.end_point_id
            )));
        }

        self.current_opposite_end_point = Some(end_point);

        Ok(())
    }

    pub fn unregister_current_opposite_end_point(
        &mut self,
        end_point: &RealEndPointRef,
    ) -> Result<(), InternalError> {
        match &self.current_opposite_end_point {
            Some(existing) if same_end_point(existing, end_point) => {
                self.current_opposite_end_point = None;
                Ok(())
            }
            _ => Err(InternalError::data_manager_invariant(format!(
                "the opposite end-point '{}' has not been registered as current for '{}'",
                end_point.id(),
                self.end_point_id
            ))),
        }
    }

    #[must_use]
    pub fn has_data_changed(&self) -> bool {
        self.current_opposite_object != self.original_opposite_object
    }

    /// Original ← current, for both the object and the end-point. Clears the
    /// original item without end-point.
    pub fn commit(&mut self) {
        self.original_opposite_object = self.current_opposite_object;
        self.original_opposite_end_point = self.current_opposite_end_point.clone();
        self.original_item_without_end_point = None;
    }

    /// Current ← original.
    pub fn rollback(&mut self) {
        self.current_opposite_object = self.original_opposite_object;
        self.current_opposite_end_point = self.original_opposite_end_point.clone();
    }

    /// Copy the current opposite of a sub-transaction's manager into this one.
    ///
    /// The current end-point is re-resolved in this transaction through
    /// `provider`, which must not load.
    pub fn set_data_from_sub_transaction(
        &mut self,
        source: &Self,
        provider: &dyn RelationEndPointProvider,
    ) -> Result<(), InternalError> {
        if source.end_point_id != self.end_point_id {
            return Err(InternalError::data_manager_invariant(format!(
                "cannot set data of '{}' from the data of a different end-point ('{}')",
                self.end_point_id, source.end_point_id
            )));
        }

        let current_opposite_end_point = match &source.current_opposite_end_point {
            None => None,
            Some(source_end_point) => {
                let source_id = source_end_point.id();
                let resolved = provider
                    .get_relation_end_point_without_loading(&source_id)
                    .ok_or_else(|| {
                        InternalError::data_manager_invariant(format!(
                            "opposite end-point '{source_id}' of '{}' is not registered in the parent transaction",
                            self.end_point_id
                        ))
                    })?;

                Some(resolved)
            }
        };

        self.current_opposite_end_point = current_opposite_end_point;
        self.current_opposite_object = source.current_opposite_object;

        Ok(())
    }
}
