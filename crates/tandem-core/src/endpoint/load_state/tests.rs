use super::*;
use crate::{
    endpoint::{
        CommandKind, NullTransactionEventSink, ObjectEndPointModification, RealObjectEndPoint,
        TransactionEventSink, VirtualObjectEndPointDataManager, same_end_point,
    },
    error::{ConsistencyError, ErrorClass, ErrorOrigin},
    test_support::{as_ref, order_id, real_id, ticket_end_point, ticket_id, virtual_id},
};
use std::rc::Rc;

fn sink() -> Rc<dyn TransactionEventSink> {
    Rc::new(NullTransactionEventSink)
}

fn complete_with_item(ticket: Option<u128>) -> CompleteVirtualObjectEndPointLoadState {
    let mut manager = VirtualObjectEndPointDataManager::new(virtual_id(1));
    if let Some(ticket) = ticket {
        manager
            .register_original_item_without_end_point(ticket_id(ticket))
            .expect("item registration should succeed");
    }

    CompleteVirtualObjectEndPointLoadState::new(manager)
}

fn complete_with_end_point(ticket: u128) -> CompleteVirtualObjectEndPointLoadState {
    let mut state = complete_with_item(Some(ticket));
    state
        .register_original_opposite_end_point(as_ref(&ticket_end_point(ticket, Some(1))))
        .expect("matching end-point should register");

    state
}

#[test]
fn complete_state_cannot_be_marked_complete_again() {
    let state = complete_with_item(None);

    let err = state
        .mark_data_complete()
        .expect_err("second completion must fail");

    assert_eq!(err.class, ErrorClass::InvariantViolation);
    assert_eq!(err.message, "the data is already complete");
}

#[test]
fn matching_registration_is_synchronized() {
    let real = ticket_end_point(1, Some(1));
    let mut state = complete_with_item(Some(1));

    state
        .register_original_opposite_end_point(as_ref(&real))
        .expect("registration should succeed");

    assert_eq!(real.is_synchronized(), Some(true));
    assert!(state.is_synchronized());
    assert_eq!(state.unsynchronized_opposite_end_points().count(), 0);
}

#[test]
fn non_matching_registration_is_unsynchronized() {
    let real = ticket_end_point(2, Some(1));
    let mut state = complete_with_item(None);

    state
        .register_original_opposite_end_point(as_ref(&real))
        .expect("registration should succeed");

    assert_eq!(real.is_synchronized(), Some(false));
    assert_eq!(state.get_data(), None);
    assert_eq!(state.unsynchronized_opposite_end_points().count(), 1);
}

#[test]
fn set_is_rejected_while_item_has_no_end_point() {
    let state = complete_with_item(Some(1));

    let err = state
        .create_set_command(Some(ticket_id(1)), sink())
        .expect_err("out-of-sync set must fail even for the same value");

    assert_eq!(err.class, ErrorClass::Conflict);
    assert_eq!(
        err.consistency_detail(),
        Some(&ConsistencyError::SetOutOfSync {
            object_id: order_id(1),
            virtual_property: "Order.OrderTicket".to_string(),
            opposite_property: "OrderTicket.Order".to_string(),
        })
    );
    assert!(err.message.contains("'Order.OrderTicket'"), "{err}");
    assert!(err.message.contains("'OrderTicket.Order'"), "{err}");
    assert!(err.message.contains("relation sync service"), "{err}");
}

#[test]
fn set_to_current_value_builds_set_same() {
    let state = complete_with_end_point(1);

    let command = state
        .create_set_command(Some(ticket_id(1)), sink())
        .expect("set-same should build");

    assert_eq!(command.kind(), CommandKind::SetSame);
    assert_eq!(
        command.modification(),
        ObjectEndPointModification::SetSame {
            related: Some(ticket_id(1))
        }
    );
}

#[test]
fn set_to_unsynchronized_target_is_rejected() {
    let mut state = complete_with_end_point(1);
    state
        .register_original_opposite_end_point(as_ref(&ticket_end_point(2, Some(1))))
        .expect("stray end-point should register as unsynchronized");

    let err = state
        .create_set_command(Some(ticket_id(2)), sink())
        .expect_err("unsynchronized target must fail");

    assert!(matches!(
        err.consistency_detail(),
        Some(ConsistencyError::SetUnsynchronizedTarget { new_related, .. }) if *new_related == ticket_id(2)
    ));
}

#[test]
fn set_to_other_value_builds_set() {
    let state = complete_with_end_point(1);

    let command = state
        .create_set_command(Some(ticket_id(5)), sink())
        .expect("set should build");

    assert_eq!(
        command.modification(),
        ObjectEndPointModification::Set {
            old_related: Some(ticket_id(1)),
            new_related: Some(ticket_id(5)),
        }
    );
    assert_eq!(command.modified_end_point_id(), &virtual_id(1));
}

#[test]
fn delete_is_rejected_while_item_has_no_end_point() {
    let state = complete_with_item(Some(1));

    let err = state
        .create_delete_command(sink())
        .expect_err("out-of-sync delete must fail");

    assert!(matches!(
        err.consistency_detail(),
        Some(ConsistencyError::DeleteOutOfSync { .. })
    ));
}

#[test]
fn delete_is_rejected_while_unsynchronized_end_points_remain() {
    let mut state = complete_with_end_point(1);
    state
        .register_original_opposite_end_point(as_ref(&ticket_end_point(3, Some(1))))
        .expect("stray end-point should register");

    let err = state
        .create_delete_command(sink())
        .expect_err("delete with unsynchronized opposite must fail");

    assert_eq!(
        err.consistency_detail(),
        Some(&ConsistencyError::DeleteUnsynchronizedOpposite {
            object_id: order_id(1),
            opposite_object: ticket_id(3),
            virtual_property: "Order.OrderTicket".to_string(),
            opposite_property: "OrderTicket.Order".to_string(),
        })
    );
}

#[test]
fn delete_builds_command_with_old_value() {
    let state = complete_with_end_point(1);

    let command = state
        .create_delete_command(sink())
        .expect("delete should build");

    assert_eq!(
        command.modification(),
        ObjectEndPointModification::Delete {
            old_related: Some(ticket_id(1))
        }
    );
}

#[test]
fn synchronize_conflict_names_both_end_points() {
    let stray = as_ref(&ticket_end_point(2, Some(1)));
    let mut state = complete_with_end_point(1);
    state
        .register_original_opposite_end_point(stray.clone())
        .expect("stray end-point should register");

    let err = state
        .synchronize_opposite_end_point(stray.clone(), false)
        .expect_err("original already refers to another object");

    assert_eq!(err.origin, ErrorOrigin::LoadState);
    assert!(err.message.contains(&stray.id().to_string()), "{err}");
    assert!(err.message.contains(&virtual_id(1).to_string()), "{err}");
    assert!(err.message.contains("unload service"), "{err}");
    assert_eq!(state.unsynchronized_opposite_end_points().count(), 1);
}

#[test]
fn synchronize_with_registered_original_end_point_conflicts() {
    let mut state = complete_with_end_point(1);
    let twin = as_ref(&ticket_end_point(1, Some(1)));

    let err = state
        .synchronize_opposite_end_point(twin, false)
        .expect_err("an original end-point is already registered");

    assert_eq!(err.class, ErrorClass::Conflict);
    assert_eq!(
        err.consistency_detail(),
        Some(&ConsistencyError::SynchronizeConflict {
            opposite_end_point: real_id(1),
            virtual_end_point: virtual_id(1),
            current_opposite: ticket_id(1),
        })
    );
}

#[test]
fn synchronize_reconciles_unsynchronized_end_point() {
    let real = ticket_end_point(2, Some(1));
    let mut state = complete_with_item(None);
    state
        .register_original_opposite_end_point(as_ref(&real))
        .expect("registration should succeed");

    state
        .synchronize_opposite_end_point(as_ref(&real), true)
        .expect("synchronization should succeed");

    assert_eq!(real.is_synchronized(), Some(true));
    assert_eq!(state.get_data(), Some(ticket_id(2)));
    assert_eq!(state.get_original_data(), Some(ticket_id(2)));
    assert_eq!(state.unsynchronized_opposite_end_points().count(), 0);
}

#[test]
fn strict_synchronize_rejects_untracked_end_point() {
    let mut state = complete_with_item(None);

    let err = state
        .synchronize_opposite_end_point(as_ref(&ticket_end_point(2, Some(1))), true)
        .expect_err("strict mode requires a tracked end-point");
    assert_eq!(err.class, ErrorClass::InvariantViolation);

    state
        .synchronize_opposite_end_point(as_ref(&ticket_end_point(2, Some(1))), false)
        .expect("lenient mode accepts it");
}

#[test]
fn synchronize_drops_item_without_end_point() {
    let mut state = complete_with_item(Some(4));
    assert!(!state.is_synchronized());

    state.synchronize().expect("synchronize should succeed");

    assert!(state.is_synchronized());
    assert_eq!(state.get_original_data(), None);
}

#[test]
fn original_sequences_hold_zero_or_one_element() {
    let empty = complete_with_item(None);
    assert_eq!(empty.get_original_opposite_end_points().count(), 0);
    assert_eq!(empty.get_original_items_without_end_points().count(), 0);

    let with_item = complete_with_item(Some(1));
    let items = with_item.get_original_items_without_end_points();
    assert_eq!(items.clone().collect::<Vec<_>>(), vec![ticket_id(1)]);
    // restartable
    assert_eq!(items.count(), 1);

    let with_end_point = complete_with_end_point(1);
    assert_eq!(with_end_point.get_original_opposite_end_points().count(), 1);
    assert_eq!(with_end_point.get_original_items_without_end_points().count(), 0);
}

#[test]
fn unload_buffers_every_known_end_point() {
    let stray = ticket_end_point(2, Some(1));
    let mut state = complete_with_end_point(1);
    state
        .register_original_opposite_end_point(as_ref(&stray))
        .expect("stray end-point should register");

    let incomplete = state
        .mark_data_incomplete()
        .expect("unchanged data should unload");

    let buffered: Vec<_> = incomplete
        .original_opposite_end_points()
        .map(|ep| ep.object_id())
        .collect();
    assert_eq!(buffered, vec![ticket_id(1), ticket_id(2)]);
    assert_eq!(stray.is_synchronized(), None);
}

#[test]
fn unload_is_refused_with_pending_changes() {
    let mut state = complete_with_end_point(1);
    state
        .data_manager_mut()
        .set_current_opposite_object(None);

    assert!(!state.can_be_marked_incomplete());
    state
        .mark_data_incomplete()
        .expect_err("changed data must not unload");
}

#[test]
fn unregister_routes_unsynchronized_and_original_end_points() {
    let original = as_ref(&ticket_end_point(1, Some(1)));
    let stray = as_ref(&ticket_end_point(2, Some(1)));
    let mut state = complete_with_item(Some(1));
    state
        .register_original_opposite_end_point(original.clone())
        .expect("original should register");
    state
        .register_original_opposite_end_point(stray.clone())
        .expect("stray should register");

    assert_eq!(
        state
            .unregister_original_opposite_end_point(&stray)
            .expect("stray should unregister"),
        UnregisterOutcome::Removed
    );
    assert_eq!(
        state
            .unregister_original_opposite_end_point(&original)
            .expect("original needs the incomplete path"),
        UnregisterOutcome::RequiresIncomplete
    );
    assert!(same_end_point(
        state
            .get_original_opposite_end_points()
            .next()
            .expect("original is still registered"),
        &original
    ));
}

#[test]
fn load_state_enum_reports_completeness() {
    let incomplete = VirtualObjectEndPointLoadState::default();
    assert!(!incomplete.is_data_complete());
    assert!(!incomplete.has_changed());
    assert!(incomplete.can_be_collected());

    let complete = VirtualObjectEndPointLoadState::Complete(complete_with_end_point(1));
    assert!(complete.is_data_complete());
    assert!(!complete.can_be_collected());
    assert!(complete.as_complete().is_some());
}
