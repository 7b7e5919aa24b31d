use serde::{Deserialize, Serialize};
use std::{
    cell::RefCell,
    collections::BTreeMap,
    time::{SystemTime, UNIX_EPOCH},
};

///
/// EventState
/// Ephemeral, in-memory counters for relation end-point activity.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub relations: BTreeMap<String, RelationCounters>,
    pub since_ms: u64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            relations: BTreeMap::new(),
            since_ms: now_millis(),
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Load-state transitions
    pub loads: u64,
    pub marked_complete: u64,
    pub marked_incomplete: u64,
    pub replayed_registrations: u64,

    // Commands
    pub set_commands: u64,
    pub set_same_commands: u64,
    pub delete_commands: u64,
    pub commands_performed: u64,

    // Consistency
    pub synchronized_end_points: u64,
    pub consistency_rejections: u64,

    // Transaction boundaries
    pub commits: u64,
    pub rollbacks: u64,
    pub sub_transaction_merges: u64,

    // Decorator notifications
    pub state_updates: u64,
}

///
/// RelationCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RelationCounters {
    pub loads: u64,
    pub commands_created: u64,
    pub commands_performed: u64,
    pub consistency_rejections: u64,
    pub state_updates: u64,
}

///
/// EventReport
/// Point-in-time snapshot returned by `metrics_report`.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    pub counters: Option<EventState>,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        })
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters (useful in tests).
pub fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

/// Build a report; `window_start_ms` drops the counters when they started
/// after the requested window.
#[must_use]
pub fn report_window_start(window_start_ms: Option<u64>) -> EventReport {
    let snapshot = with_state(Clone::clone);
    let counters = match window_start_ms {
        Some(start) if snapshot.since_ms < start => None,
        _ => Some(snapshot),
    };

    EventReport { counters }
}
