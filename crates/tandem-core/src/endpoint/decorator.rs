//! Change-notification wrapper for virtual object end-points.
//!
//! Every mutating call snapshots `has_changed`, delegates, and notifies the
//! listener after the call has returned, only when the value differs. The
//! notification also fires when the wrapped call fails.

use crate::{
    endpoint::{
        CommandKind, ObjectEndPointCommand, RealEndPointRef, RelationEndPointId,
        RelationEndPointProvider, VirtualObjectEndPoint, VirtualObjectEndPointLoadState,
    },
    error::InternalError,
    obs::RelationEvent,
    types::ObjectId,
};
use std::{fmt, rc::Rc};

///
/// VirtualEndPointStateUpdateListener
///

pub trait VirtualEndPointStateUpdateListener {
    fn virtual_end_point_state_updated(&self, end_point_id: &RelationEndPointId, has_changed: bool);
}

// Run `op` against `end_point` and notify `listener` if `has_changed` moved.
fn with_state_update<T>(
    end_point: &mut VirtualObjectEndPoint,
    listener: &dyn VirtualEndPointStateUpdateListener,
    op: impl FnOnce(&mut VirtualObjectEndPoint) -> T,
) -> T {
    let before = end_point.has_changed();
    let result = op(end_point);
    let after = end_point.has_changed();

    if after != before {
        end_point.context().record(RelationEvent::StateUpdated {
            relation_id: end_point.id().relation_id(),
            has_changed: after,
        });
        listener.virtual_end_point_state_updated(end_point.id(), after);
    }

    result
}

///
/// StateUpdateRaisingVirtualObjectEndPoint
///

pub struct StateUpdateRaisingVirtualObjectEndPoint {
    inner: VirtualObjectEndPoint,
    listener: Rc<dyn VirtualEndPointStateUpdateListener>,
}

impl StateUpdateRaisingVirtualObjectEndPoint {
    #[must_use]
    pub fn new(
        inner: VirtualObjectEndPoint,
        listener: Rc<dyn VirtualEndPointStateUpdateListener>,
    ) -> Self {
        Self { inner, listener }
    }

    #[must_use]
    pub const fn inner(&self) -> &VirtualObjectEndPoint {
        &self.inner
    }

    #[must_use]
    pub fn into_inner(self) -> VirtualObjectEndPoint {
        self.inner
    }

    #[must_use]
    pub const fn id(&self) -> &RelationEndPointId {
        self.inner.id()
    }

    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.inner.has_changed()
    }

    #[must_use]
    pub const fn is_data_complete(&self) -> bool {
        self.inner.is_data_complete()
    }

    #[must_use]
    pub const fn load_state(&self) -> &VirtualObjectEndPointLoadState {
        self.inner.load_state()
    }

    #[must_use]
    pub fn is_synchronized(&self) -> Option<bool> {
        self.inner.is_synchronized()
    }

    fn update<T>(&mut self, op: impl FnOnce(&mut VirtualObjectEndPoint) -> T) -> T {
        with_state_update(&mut self.inner, self.listener.as_ref(), op)
    }

    pub fn ensure_data_complete(&mut self) -> Result<(), InternalError> {
        self.inner.ensure_data_complete()
    }

    pub fn get_data(&mut self) -> Result<Option<ObjectId>, InternalError> {
        self.inner.get_data()
    }

    pub fn get_original_data(&mut self) -> Result<Option<ObjectId>, InternalError> {
        self.inner.get_original_data()
    }

    pub fn mark_data_complete(&mut self, item: Option<ObjectId>) -> Result<(), InternalError> {
        self.update(|ep| ep.mark_data_complete(item))
    }

    pub fn mark_data_incomplete(&mut self) -> Result<(), InternalError> {
        self.update(VirtualObjectEndPoint::mark_data_incomplete)
    }

    pub fn register_original_opposite_end_point(
        &mut self,
        end_point: RealEndPointRef,
    ) -> Result<(), InternalError> {
        self.update(|ep| ep.register_original_opposite_end_point(end_point))
    }

    pub fn unregister_original_opposite_end_point(
        &mut self,
        end_point: &RealEndPointRef,
    ) -> Result<(), InternalError> {
        self.update(|ep| ep.unregister_original_opposite_end_point(end_point))
    }

    pub fn register_current_opposite_end_point(
        &mut self,
        end_point: RealEndPointRef,
    ) -> Result<(), InternalError> {
        self.update(|ep| ep.register_current_opposite_end_point(end_point))
    }

    pub fn unregister_current_opposite_end_point(
        &mut self,
        end_point: &RealEndPointRef,
    ) -> Result<(), InternalError> {
        self.update(|ep| ep.unregister_current_opposite_end_point(end_point))
    }

    pub fn synchronize(&mut self) -> Result<(), InternalError> {
        self.update(VirtualObjectEndPoint::synchronize)
    }

    pub fn synchronize_opposite_end_point(
        &mut self,
        end_point: RealEndPointRef,
    ) -> Result<(), InternalError> {
        self.update(|ep| ep.synchronize_opposite_end_point(end_point))
    }

    pub fn commit(&mut self) {
        self.update(VirtualObjectEndPoint::commit);
    }

    pub fn rollback(&mut self) {
        self.update(VirtualObjectEndPoint::rollback);
    }

    pub fn set_data_from_sub_transaction(
        &mut self,
        source: &VirtualObjectEndPoint,
        provider: &dyn RelationEndPointProvider,
    ) -> Result<(), InternalError> {
        self.update(|ep| ep.set_data_from_sub_transaction(source, provider))
    }

    /// Creation itself never notifies; the returned command does when it is
    /// performed.
    pub fn create_set_command(
        &mut self,
        new_related_object: Option<ObjectId>,
    ) -> Result<StateUpdateRaisingCommand, InternalError> {
        let command = self.inner.create_set_command(new_related_object)?;

        Ok(self.wrap(command))
    }

    pub fn create_delete_command(&mut self) -> Result<StateUpdateRaisingCommand, InternalError> {
        let command = self.inner.create_delete_command()?;

        Ok(self.wrap(command))
    }

    fn wrap(&self, command: ObjectEndPointCommand) -> StateUpdateRaisingCommand {
        StateUpdateRaisingCommand {
            inner: command,
            listener: Rc::clone(&self.listener),
        }
    }

    pub fn execute(&mut self, command: &StateUpdateRaisingCommand) -> Result<(), InternalError> {
        command.notify_and_perform(&mut self.inner)
    }
}

impl fmt::Debug for StateUpdateRaisingVirtualObjectEndPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateUpdateRaisingVirtualObjectEndPoint")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

///
/// StateUpdateRaisingCommand
///
/// Command whose `perform` runs the change-detection/notification pair at
/// execution time.
///

#[derive(Clone)]
pub struct StateUpdateRaisingCommand {
    inner: ObjectEndPointCommand,
    listener: Rc<dyn VirtualEndPointStateUpdateListener>,
}

impl StateUpdateRaisingCommand {
    #[must_use]
    pub const fn inner(&self) -> &ObjectEndPointCommand {
        &self.inner
    }

    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        self.inner.kind()
    }

    pub fn begin(&self) {
        self.inner.begin();
    }

    pub fn perform(&self, end_point: &mut VirtualObjectEndPoint) -> Result<(), InternalError> {
        with_state_update(end_point, self.listener.as_ref(), |ep| {
            self.inner.perform(ep)
        })
    }

    pub fn end(&self) {
        self.inner.end();
    }

    pub fn notify_and_perform(
        &self,
        end_point: &mut VirtualObjectEndPoint,
    ) -> Result<(), InternalError> {
        self.begin();
        self.perform(end_point)?;
        self.end();

        Ok(())
    }

    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            inner: self.inner.inverse(),
            listener: Rc::clone(&self.listener),
        }
    }
}

impl fmt::Debug for StateUpdateRaisingCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateUpdateRaisingCommand")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        endpoint::{
            CompleteVirtualObjectEndPointLoadState, EndPointContext, EndPointLoader,
            VirtualObjectEndPointDataManager, VirtualObjectEndPointDataManagerFactory,
        },
        error::{ErrorClass, ErrorOrigin},
        test_support::{
            RecordingListener, as_ref, complete_end_point_with, incomplete_end_point,
            ticket_end_point, ticket_id, virtual_id,
        },
    };

    // Hands out a manager whose current value differs from its original.
    struct DirtyFactory;

    impl VirtualObjectEndPointDataManagerFactory for DirtyFactory {
        fn create_end_point_data_manager(
            &self,
            end_point_id: RelationEndPointId,
        ) -> VirtualObjectEndPointDataManager {
            let mut manager = VirtualObjectEndPointDataManager::new(end_point_id);
            manager.set_current_opposite_object(Some(ticket_id(42)));
            manager
        }
    }

    struct CompletingThenFailingLoader;

    impl EndPointLoader for CompletingThenFailingLoader {
        fn load_end_point_and_get_new_state<'a>(
            &self,
            end_point: &'a mut VirtualObjectEndPoint,
        ) -> Result<&'a CompleteVirtualObjectEndPointLoadState, InternalError> {
            end_point.mark_data_complete(None)?;

            Err(InternalError::new(
                ErrorClass::Internal,
                ErrorOrigin::Loader,
                "storage went away",
            ))
        }
    }

    fn decorated(
        end_point: VirtualObjectEndPoint,
    ) -> (StateUpdateRaisingVirtualObjectEndPoint, Rc<RecordingListener>) {
        let listener = Rc::new(RecordingListener::default());

        (
            StateUpdateRaisingVirtualObjectEndPoint::new(end_point, listener.clone()),
            listener,
        )
    }

    #[test]
    fn unchanged_state_raises_nothing() {
        let (end_point, _) = complete_end_point_with(1, 1);
        let (mut decorated, listener) = decorated(end_point);

        decorated.commit();
        decorated.rollback();

        assert!(listener.updates.borrow().is_empty());
    }

    #[test]
    fn changed_to_changed_raises_nothing() {
        let (end_point, _) = complete_end_point_with(1, 1);
        let (mut decorated, listener) = decorated(end_point);
        let command = decorated
            .create_set_command(Some(ticket_id(2)))
            .expect("set command should build");
        decorated.execute(&command).expect("set should execute");
        listener.updates.borrow_mut().clear();
        assert!(decorated.has_changed());

        let command = decorated
            .create_set_command(Some(ticket_id(3)))
            .expect("second set command should build");
        decorated.execute(&command).expect("second set should execute");

        assert!(decorated.has_changed());
        assert!(listener.updates.borrow().is_empty());
    }

    #[test]
    fn changed_to_unchanged_raises_once_with_false() {
        let (end_point, _) = complete_end_point_with(1, 1);
        let (mut decorated, listener) = decorated(end_point);
        let command = decorated
            .create_set_command(Some(ticket_id(2)))
            .expect("set command should build");
        decorated.execute(&command).expect("set should execute");
        listener.updates.borrow_mut().clear();

        decorated.rollback();

        assert_eq!(
            listener.updates.borrow().as_slice(),
            &[(*decorated.id(), false)]
        );
    }

    #[test]
    fn command_notifies_on_perform_not_on_creation() {
        let (end_point, _) = complete_end_point_with(1, 1);
        let (mut decorated, listener) = decorated(end_point);

        let command = decorated
            .create_delete_command()
            .expect("delete command should build");
        assert!(listener.updates.borrow().is_empty());

        decorated.execute(&command).expect("delete should execute");

        assert_eq!(
            listener.updates.borrow().as_slice(),
            &[(*decorated.id(), true)]
        );
    }

    #[test]
    fn rejected_unload_raises_nothing() {
        let (end_point, _) = complete_end_point_with(1, 1);
        let (mut decorated, listener) = decorated(end_point);
        let command = decorated
            .create_set_command(None)
            .expect("set command should build");
        decorated.execute(&command).expect("set should execute");
        listener.updates.borrow_mut().clear();

        decorated
            .mark_data_incomplete()
            .expect_err("changed data must not unload");

        assert!(decorated.has_changed());
        assert!(listener.updates.borrow().is_empty());
    }

    #[test]
    fn failed_call_still_reports_observed_change() {
        let context = EndPointContext::new(Rc::new(CompletingThenFailingLoader))
            .with_data_manager_factory(Rc::new(DirtyFactory));
        let end_point = VirtualObjectEndPoint::new(virtual_id(1), Rc::new(context))
            .expect("virtual end-point should build");
        let (mut decorated, listener) = decorated(end_point);

        let err = decorated
            .synchronize()
            .expect_err("loader failure should propagate");

        assert_eq!(err.message, "storage went away");
        assert_eq!(err.origin, ErrorOrigin::Loader);
        assert_eq!(
            listener.updates.borrow().as_slice(),
            &[(virtual_id(1), true)]
        );
    }

    #[test]
    fn completion_with_unsynchronized_end_point_raises_nothing() {
        let (end_point, _) = incomplete_end_point(1, None);
        let (mut decorated, listener) = decorated(end_point);
        let real = ticket_end_point(9, Some(1));

        decorated
            .register_original_opposite_end_point(as_ref(&real))
            .expect("buffering should succeed");
        decorated
            .mark_data_complete(None)
            .expect("mark complete should succeed");

        assert!(decorated.is_data_complete());
        assert!(!decorated.has_changed());
        assert!(listener.updates.borrow().is_empty());
    }
}
