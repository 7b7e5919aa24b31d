use crate::{
    endpoint::{
        CompleteVirtualObjectEndPointLoadState, EndPointContext, ObjectEndPointCommand,
        RealEndPointRef, RelationEndPointId, RelationEndPointProvider, UnregisterOutcome,
        VirtualObjectEndPointLoadState,
    },
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::{Cardinality, RelationEndPointDefinition},
    obs::RelationEvent,
    types::ObjectId,
};
use std::rc::Rc;

///
/// VirtualObjectEndPoint
///
/// The single-valued, foreign-key-less side of a one-to-one relation. Owns
/// its load state; every operation needing data loads it on first use
/// through the context's loader and then runs against the Complete state.
///

#[derive(Debug)]
pub struct VirtualObjectEndPoint {
    id: RelationEndPointId,
    context: Rc<EndPointContext>,
    load_state: VirtualObjectEndPointLoadState,
    has_been_touched: bool,
}

impl VirtualObjectEndPoint {
    pub fn new(id: RelationEndPointId, context: Rc<EndPointContext>) -> Result<Self, InternalError> {
        if !id.is_virtual() {
            return Err(InternalError::end_point_invariant(format!(
                "end-point '{id}' is not virtual"
            )));
        }
        if id.definition.cardinality != Cardinality::One {
            return Err(InternalError::new(
                ErrorClass::Unsupported,
                ErrorOrigin::EndPoint,
                format!("end-point '{id}' is a collection end-point"),
            ));
        }

        Ok(Self {
            id,
            context,
            load_state: VirtualObjectEndPointLoadState::default(),
            has_been_touched: false,
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn id(&self) -> &RelationEndPointId {
        &self.id
    }

    #[must_use]
    pub const fn object_id(&self) -> ObjectId {
        self.id.object_id
    }

    #[must_use]
    pub const fn definition(&self) -> &'static RelationEndPointDefinition {
        self.id.definition
    }

    #[must_use]
    pub const fn context(&self) -> &Rc<EndPointContext> {
        &self.context
    }

    #[must_use]
    pub const fn load_state(&self) -> &VirtualObjectEndPointLoadState {
        &self.load_state
    }

    #[must_use]
    pub const fn is_data_complete(&self) -> bool {
        self.load_state.is_data_complete()
    }

    #[must_use]
    pub fn can_be_collected(&self) -> bool {
        self.load_state.can_be_collected()
    }

    #[must_use]
    pub fn can_be_marked_incomplete(&self) -> bool {
        match &self.load_state {
            VirtualObjectEndPointLoadState::Incomplete(_) => true,
            VirtualObjectEndPointLoadState::Complete(state) => state.can_be_marked_incomplete(),
        }
    }

    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.load_state.has_changed()
    }

    #[must_use]
    pub const fn has_been_touched(&self) -> bool {
        self.has_been_touched
    }

    pub const fn touch(&mut self) {
        self.has_been_touched = true;
    }

    /// Borrow the Complete state without loading.
    pub fn complete_state(&self) -> Result<&CompleteVirtualObjectEndPointLoadState, InternalError> {
        self.load_state.as_complete().ok_or_else(|| {
            InternalError::load_state_invariant(format!(
                "the data of virtual end-point '{}' is not complete",
                self.id
            ))
        })
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Load through the context's loader unless already complete. Reentrant
    /// calls observe the Complete state and return immediately.
    pub fn ensure_data_complete(&mut self) -> Result<(), InternalError> {
        if self.is_data_complete() {
            return Ok(());
        }

        let loader = Rc::clone(self.context.loader());
        loader.load_end_point_and_get_new_state(self)?;

        if !self.is_data_complete() {
            return Err(InternalError::load_state_invariant(format!(
                "the loader did not complete virtual end-point '{}'",
                self.id
            )));
        }

        self.context.record(RelationEvent::EndPointLoaded {
            relation_id: self.id.relation_id(),
        });

        Ok(())
    }

    fn loaded_state(&mut self) -> Result<&mut CompleteVirtualObjectEndPointLoadState, InternalError> {
        self.ensure_data_complete()?;

        match &mut self.load_state {
            VirtualObjectEndPointLoadState::Complete(state) => Ok(state),
            VirtualObjectEndPointLoadState::Incomplete(_) => Err(
                InternalError::load_state_invariant(format!(
                    "virtual end-point '{}' is incomplete after loading",
                    self.id
                )),
            ),
        }
    }

    /// Switch to the Complete state for the loaded `item`.
    ///
    /// The Complete state is installed first; buffered original opposite
    /// end-points are then re-registered through it in arrival order.
    pub fn mark_data_complete(&mut self, item: Option<ObjectId>) -> Result<(), InternalError> {
        let pending = match &mut self.load_state {
            VirtualObjectEndPointLoadState::Complete(state) => return state.mark_data_complete(),
            VirtualObjectEndPointLoadState::Incomplete(state) => {
                state.mark_data_complete(self.id, item, self.context.data_manager_factory())?
            }
        };

        let replay = pending.install(|data_manager| {
            self.load_state = VirtualObjectEndPointLoadState::Complete(
                CompleteVirtualObjectEndPointLoadState::new(data_manager),
            );
        });
        let replayed =
            replay.replay(|end_point| self.register_original_opposite_end_point(end_point))?;

        self.context.record(RelationEvent::DataMarkedComplete {
            relation_id: self.id.relation_id(),
            replayed,
        });

        Ok(())
    }

    /// Unload: return to the Incomplete state, keeping every known opposite
    /// end-point buffered. No-op when already incomplete.
    pub fn mark_data_incomplete(&mut self) -> Result<(), InternalError> {
        let VirtualObjectEndPointLoadState::Complete(state) = &self.load_state else {
            return Ok(());
        };

        let incomplete = state.mark_data_incomplete()?;
        self.load_state = VirtualObjectEndPointLoadState::Incomplete(incomplete);

        self.context.record(RelationEvent::DataMarkedIncomplete {
            relation_id: self.id.relation_id(),
        });

        Ok(())
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    pub fn register_original_opposite_end_point(
        &mut self,
        end_point: RealEndPointRef,
    ) -> Result<(), InternalError> {
        match &mut self.load_state {
            VirtualObjectEndPointLoadState::Incomplete(state) => {
                state.register_original_opposite_end_point(end_point)
            }
            VirtualObjectEndPointLoadState::Complete(state) => {
                state.register_original_opposite_end_point(end_point)
            }
        }
    }

    pub fn unregister_original_opposite_end_point(
        &mut self,
        end_point: &RealEndPointRef,
    ) -> Result<(), InternalError> {
        let outcome = match &mut self.load_state {
            VirtualObjectEndPointLoadState::Incomplete(state) => {
                return state.unregister_original_opposite_end_point(end_point);
            }
            VirtualObjectEndPointLoadState::Complete(state) => {
                state.unregister_original_opposite_end_point(end_point)?
            }
        };

        match outcome {
            UnregisterOutcome::Removed => Ok(()),
            UnregisterOutcome::RequiresIncomplete => {
                self.mark_data_incomplete()?;
                self.unregister_original_opposite_end_point(end_point)
            }
        }
    }

    pub fn register_current_opposite_end_point(
        &mut self,
        end_point: RealEndPointRef,
    ) -> Result<(), InternalError> {
        self.loaded_state()?
            .data_manager_mut()
            .register_current_opposite_end_point(end_point)
    }

    pub fn unregister_current_opposite_end_point(
        &mut self,
        end_point: &RealEndPointRef,
    ) -> Result<(), InternalError> {
        self.loaded_state()?
            .data_manager_mut()
            .unregister_current_opposite_end_point(end_point)
    }

    // ------------------------------------------------------------------
    // Synchronization
    // ------------------------------------------------------------------

    /// `None` while incomplete.
    #[must_use]
    pub fn is_synchronized(&self) -> Option<bool> {
        self.load_state
            .as_complete()
            .map(CompleteVirtualObjectEndPointLoadState::is_synchronized)
    }

    pub fn synchronize(&mut self) -> Result<(), InternalError> {
        self.loaded_state()?.synchronize()
    }

    pub fn synchronize_opposite_end_point(
        &mut self,
        end_point: RealEndPointRef,
    ) -> Result<(), InternalError> {
        let strict = self.context.config().sync.strict_opposite_synchronization;
        let result = self
            .loaded_state()?
            .synchronize_opposite_end_point(end_point, strict);
        self.observe(result)?;

        self.context.record(RelationEvent::OppositeEndPointSynchronized {
            relation_id: self.id.relation_id(),
        });

        Ok(())
    }

    // ------------------------------------------------------------------
    // Data and commands
    // ------------------------------------------------------------------

    pub fn get_data(&mut self) -> Result<Option<ObjectId>, InternalError> {
        Ok(self.loaded_state()?.get_data())
    }

    pub fn get_original_data(&mut self) -> Result<Option<ObjectId>, InternalError> {
        Ok(self.loaded_state()?.get_original_data())
    }

    pub fn create_set_command(
        &mut self,
        new_related_object: Option<ObjectId>,
    ) -> Result<ObjectEndPointCommand, InternalError> {
        let event_sink = Rc::clone(self.context.event_sink());
        let result = self
            .loaded_state()?
            .create_set_command(new_related_object, event_sink);

        self.command_created(result)
    }

    pub fn create_delete_command(&mut self) -> Result<ObjectEndPointCommand, InternalError> {
        let event_sink = Rc::clone(self.context.event_sink());
        let result = self.loaded_state()?.create_delete_command(event_sink);

        self.command_created(result)
    }

    fn command_created(
        &self,
        result: Result<ObjectEndPointCommand, InternalError>,
    ) -> Result<ObjectEndPointCommand, InternalError> {
        let command = self.observe(result)?;
        self.context.record(RelationEvent::CommandCreated {
            relation_id: self.id.relation_id(),
            kind: command.kind(),
        });

        Ok(command)
    }

    /// Run `command` against this end-point with changing/changed events.
    pub fn execute(&mut self, command: &ObjectEndPointCommand) -> Result<(), InternalError> {
        command.notify_and_perform(self)
    }

    pub(crate) fn set_current_opposite_object(
        &mut self,
        opposite: Option<ObjectId>,
    ) -> Result<(), InternalError> {
        match &mut self.load_state {
            VirtualObjectEndPointLoadState::Complete(state) => {
                state.data_manager_mut().set_current_opposite_object(opposite);
                Ok(())
            }
            VirtualObjectEndPointLoadState::Incomplete(_) => {
                Err(InternalError::command_invariant(format!(
                    "cannot set the opposite object of '{}' while its data is incomplete",
                    self.id
                )))
            }
        }
    }

    fn observe<T>(&self, result: Result<T, InternalError>) -> Result<T, InternalError> {
        if let Err(err) = &result
            && err.is_conflict()
        {
            self.context.record(RelationEvent::ConsistencyRejected {
                relation_id: self.id.relation_id(),
            });
        }

        result
    }

    // ------------------------------------------------------------------
    // Transaction
    // ------------------------------------------------------------------

    pub fn commit(&mut self) {
        if let VirtualObjectEndPointLoadState::Complete(state) = &mut self.load_state {
            state.commit();
        }
        self.has_been_touched = false;

        self.context.record(RelationEvent::Commit {
            relation_id: self.id.relation_id(),
        });
    }

    pub fn rollback(&mut self) {
        if let VirtualObjectEndPointLoadState::Complete(state) = &mut self.load_state {
            state.rollback();
        }
        self.has_been_touched = false;

        self.context.record(RelationEvent::Rollback {
            relation_id: self.id.relation_id(),
        });
    }

    /// Copy the current data of the same end-point in a sub-transaction.
    /// `source` must be complete; this end-point loads if needed.
    pub fn set_data_from_sub_transaction(
        &mut self,
        source: &Self,
        provider: &dyn RelationEndPointProvider,
    ) -> Result<(), InternalError> {
        let source_state = source.complete_state()?;
        self.loaded_state()?
            .set_data_from_sub_transaction(source_state, provider)?;

        if source.has_been_touched {
            self.touch();
        }

        self.context.record(RelationEvent::SubTransactionMerged {
            relation_id: self.id.relation_id(),
        });

        Ok(())
    }
}
