use crate::{
    endpoint::{
        CompleteVirtualObjectEndPointLoadState, EndPointLoader, RelationEndPointId,
        VirtualObjectEndPoint,
    },
    error::{ErrorClass, ErrorOrigin, InternalError},
    types::ObjectId,
};
use std::fmt;

///
/// LookupEndPointLoader
///
/// Loads a virtual end-point by asking `lookup` for the object whose real
/// end-point references the virtual end-point's owner.
///

pub struct LookupEndPointLoader<F> {
    lookup: F,
}

impl<F> LookupEndPointLoader<F>
where
    F: Fn(&RelationEndPointId) -> Result<Option<ObjectId>, InternalError>,
{
    #[must_use]
    pub const fn new(lookup: F) -> Self {
        Self { lookup }
    }
}

impl<F> EndPointLoader for LookupEndPointLoader<F>
where
    F: Fn(&RelationEndPointId) -> Result<Option<ObjectId>, InternalError>,
{
    fn load_end_point_and_get_new_state<'a>(
        &self,
        end_point: &'a mut VirtualObjectEndPoint,
    ) -> Result<&'a CompleteVirtualObjectEndPointLoadState, InternalError> {
        // a reentrant load may already have completed the end-point
        if !end_point.is_data_complete() {
            let item = (self.lookup)(end_point.id())?;

            let expected_class = end_point.definition().opposite_class_id;
            if let Some(item) = item
                && item.class_id != expected_class
            {
                return Err(InternalError::new(
                    ErrorClass::InvariantViolation,
                    ErrorOrigin::Loader,
                    format!(
                        "lookup for '{}' returned '{item}', expected an object of class '{expected_class}'",
                        end_point.id()
                    ),
                ));
            }

            end_point.mark_data_complete(item)?;
        }

        end_point.complete_state()
    }
}

impl<F> fmt::Debug for LookupEndPointLoader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupEndPointLoader").finish_non_exhaustive()
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        endpoint::EndPointContext,
        test_support::{order_id, ticket_id, virtual_id},
    };
    use std::{cell::Cell, rc::Rc};

    fn end_point_with<F>(loader: LookupEndPointLoader<F>) -> VirtualObjectEndPoint
    where
        F: Fn(&RelationEndPointId) -> Result<Option<ObjectId>, InternalError> + 'static,
    {
        let context = Rc::new(EndPointContext::new(Rc::new(loader)));

        VirtualObjectEndPoint::new(virtual_id(1), context).expect("virtual end-point should build")
    }

    #[test]
    fn lookup_result_becomes_original_data() {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let mut end_point = end_point_with(LookupEndPointLoader::new(move |id| {
            seen.set(seen.get() + 1);
            assert_eq!(id, &virtual_id(1));
            Ok(Some(ticket_id(3)))
        }));

        assert_eq!(
            end_point.get_data().expect("load should succeed"),
            Some(ticket_id(3))
        );
        assert_eq!(
            end_point.get_original_data().expect("read should succeed"),
            Some(ticket_id(3))
        );
        assert_eq!(calls.get(), 1);
        assert_eq!(end_point.is_synchronized(), Some(false));
    }

    #[test]
    fn wrong_class_is_rejected() {
        let mut end_point = end_point_with(LookupEndPointLoader::new(|_| Ok(Some(order_id(2)))));

        let err = end_point
            .ensure_data_complete()
            .expect_err("wrong class must fail");

        assert_eq!(err.origin, ErrorOrigin::Loader);
        assert!(!end_point.is_data_complete());
    }

    #[test]
    fn lookup_error_propagates_unchanged() {
        let mut end_point = end_point_with(LookupEndPointLoader::new(|_| {
            Err(InternalError::new(
                ErrorClass::Internal,
                ErrorOrigin::Loader,
                "lookup failed",
            ))
        }));

        let err = end_point
            .get_data()
            .expect_err("lookup failure should propagate");

        assert_eq!(err.message, "lookup failed");
    }
}
