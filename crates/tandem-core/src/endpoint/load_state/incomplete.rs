use crate::{
    endpoint::{
        RealEndPointRef, RelationEndPointId, VirtualObjectEndPointDataManager,
        VirtualObjectEndPointDataManagerFactory,
    },
    error::InternalError,
    types::ObjectId,
};
use std::mem;

///
/// IncompleteVirtualObjectEndPointLoadState
///
/// Load state before the virtual end-point's data has been fetched. Buffers
/// original opposite end-points registered early, in arrival order, so they
/// can be replayed once the data is complete.
///

#[derive(Clone, Debug, Default)]
pub struct IncompleteVirtualObjectEndPointLoadState {
    original_opposite_end_points: Vec<RealEndPointRef>,
}

impl IncompleteVirtualObjectEndPointLoadState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            original_opposite_end_points: Vec::new(),
        }
    }

    /// Seed the buffer, e.g. when a Complete state is marked incomplete.
    #[must_use]
    pub fn with_original_opposite_end_points(
        end_points: impl IntoIterator<Item = RealEndPointRef>,
    ) -> Self {
        let original_opposite_end_points: Vec<_> = end_points.into_iter().collect();
        for end_point in &original_opposite_end_points {
            end_point.reset_sync_state();
        }

        Self {
            original_opposite_end_points,
        }
    }

    pub fn original_opposite_end_points(&self) -> impl Iterator<Item = &RealEndPointRef> {
        self.original_opposite_end_points.iter()
    }

    /// The end-point holds nothing worth keeping in memory.
    #[must_use]
    pub fn can_be_collected(&self) -> bool {
        self.original_opposite_end_points.is_empty()
    }

    pub fn register_original_opposite_end_point(
        &mut self,
        end_point: RealEndPointRef,
    ) -> Result<(), InternalError> {
        let object_id = end_point.object_id();
        if self.position_of(object_id).is_some() {
            return Err(InternalError::load_state_invariant(format!(
                "an opposite end-point of object '{object_id}' has already been registered ('{}')",
                end_point.id()
            )));
        }

        end_point.reset_sync_state();
        self.original_opposite_end_points.push(end_point);

        Ok(())
    }

    pub fn unregister_original_opposite_end_point(
        &mut self,
        end_point: &RealEndPointRef,
    ) -> Result<(), InternalError> {
        let object_id = end_point.object_id();
        let Some(position) = self.position_of(object_id) else {
            return Err(InternalError::load_state_invariant(format!(
                "the opposite end-point '{}' has not been registered",
                end_point.id()
            )));
        };

        self.original_opposite_end_points.remove(position);

        Ok(())
    }

    fn position_of(&self, object_id: ObjectId) -> Option<usize> {
        self.original_opposite_end_points
            .iter()
            .position(|ep| ep.object_id() == object_id)
    }

    /// Build the data manager for the loaded `item` and hand back the
    /// buffered end-points that were not consumed by it.
    ///
    /// The buffered end-point of `item` (if any) becomes the original
    /// opposite end-point and is synchronized. The caller installs the
    /// Complete state via [`PendingCompletion::install`] before replaying.
    pub fn mark_data_complete(
        &mut self,
        end_point_id: RelationEndPointId,
        item: Option<ObjectId>,
        factory: &dyn VirtualObjectEndPointDataManagerFactory,
    ) -> Result<PendingCompletion, InternalError> {
        let mut data_manager = factory.create_end_point_data_manager(end_point_id);

        if let Some(item) = item {
            match self.position_of(item) {
                Some(position) => {
                    let end_point = self.original_opposite_end_points[position].clone();
                    data_manager.register_original_opposite_end_point(end_point.clone())?;
                    self.original_opposite_end_points.remove(position);

                    end_point.reset_sync_state();
                    end_point.mark_synchronized();
                }
                None => data_manager.register_original_item_without_end_point(item)?,
            }
        }

        Ok(PendingCompletion {
            data_manager,
            buffered: mem::take(&mut self.original_opposite_end_points),
        })
    }
}

///
/// PendingCompletion
///
/// First half of marking data complete: the new data manager plus the
/// remaining buffered end-points. Installing it yields the replay step.
///

#[derive(Debug)]
#[must_use = "the Complete state must be installed and the buffer replayed"]
pub struct PendingCompletion {
    data_manager: VirtualObjectEndPointDataManager,
    buffered: Vec<RealEndPointRef>,
}

impl PendingCompletion {
    #[must_use]
    pub const fn data_manager(&self) -> &VirtualObjectEndPointDataManager {
        &self.data_manager
    }

    /// Hand the data manager to `state_setter`; the owner switches to the
    /// Complete state there, before any buffered end-point is replayed.
    pub fn install(
        self,
        state_setter: impl FnOnce(VirtualObjectEndPointDataManager),
    ) -> CompletionReplay {
        state_setter(self.data_manager);

        CompletionReplay {
            buffered: self.buffered,
        }
    }
}

///
/// CompletionReplay
///

#[derive(Debug)]
#[must_use = "buffered end-points must be replayed into the Complete state"]
pub struct CompletionReplay {
    buffered: Vec<RealEndPointRef>,
}

impl CompletionReplay {
    #[must_use]
    pub const fn len(&self) -> usize {
        self.buffered.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.buffered.is_empty()
    }

    /// Re-register every buffered end-point, in original arrival order.
    /// Returns how many were replayed.
    pub fn replay(
        self,
        mut register: impl FnMut(RealEndPointRef) -> Result<(), InternalError>,
    ) -> Result<u64, InternalError> {
        let mut replayed = 0u64;
        for end_point in self.buffered {
            register(end_point)?;
            replayed += 1;
        }

        Ok(replayed)
    }
}

///
/// TESTS
///
