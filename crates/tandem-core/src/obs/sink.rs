//! Metrics sink boundary.
//!
//! End-point logic MUST NOT touch obs::metrics directly.
//! All instrumentation flows through RelationEvent and MetricsSink.
use crate::{endpoint::CommandKind, obs::metrics};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// RelationEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RelationEvent {
    EndPointLoaded {
        relation_id: &'static str,
    },
    DataMarkedComplete {
        relation_id: &'static str,
        replayed: u64,
    },
    DataMarkedIncomplete {
        relation_id: &'static str,
    },
    CommandCreated {
        relation_id: &'static str,
        kind: CommandKind,
    },
    CommandPerformed {
        relation_id: &'static str,
        kind: CommandKind,
    },
    OppositeEndPointSynchronized {
        relation_id: &'static str,
    },
    ConsistencyRejected {
        relation_id: &'static str,
    },
    StateUpdated {
        relation_id: &'static str,
        has_changed: bool,
    },
    Commit {
        relation_id: &'static str,
    },
    Rollback {
        relation_id: &'static str,
    },
    SubTransactionMerged {
        relation_id: &'static str,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: RelationEvent);
}

/// GlobalMetricsSink
/// Default thread-local sink that writes into global metrics state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: RelationEvent) {
        match event {
            RelationEvent::EndPointLoaded { relation_id } => {
                metrics::with_state_mut(|m| {
                    m.ops.loads = m.ops.loads.saturating_add(1);
                    let entry = m.relations.entry(relation_id.to_string()).or_default();
                    entry.loads = entry.loads.saturating_add(1);
                });
            }

            RelationEvent::DataMarkedComplete { replayed, .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.marked_complete = m.ops.marked_complete.saturating_add(1);
                    m.ops.replayed_registrations =
                        m.ops.replayed_registrations.saturating_add(replayed);
                });
            }

            RelationEvent::DataMarkedIncomplete { .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.marked_incomplete = m.ops.marked_incomplete.saturating_add(1);
                });
            }

            RelationEvent::CommandCreated { relation_id, kind } => {
                metrics::with_state_mut(|m| {
                    match kind {
                        CommandKind::Set => {
                            m.ops.set_commands = m.ops.set_commands.saturating_add(1);
                        }
                        CommandKind::SetSame => {
                            m.ops.set_same_commands = m.ops.set_same_commands.saturating_add(1);
                        }
                        CommandKind::Delete => {
                            m.ops.delete_commands = m.ops.delete_commands.saturating_add(1);
                        }
                    }

                    let entry = m.relations.entry(relation_id.to_string()).or_default();
                    entry.commands_created = entry.commands_created.saturating_add(1);
                });
            }

            RelationEvent::CommandPerformed { relation_id, .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.commands_performed = m.ops.commands_performed.saturating_add(1);
                    let entry = m.relations.entry(relation_id.to_string()).or_default();
                    entry.commands_performed = entry.commands_performed.saturating_add(1);
                });
            }

            RelationEvent::OppositeEndPointSynchronized { .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.synchronized_end_points = m.ops.synchronized_end_points.saturating_add(1);
                });
            }

            RelationEvent::ConsistencyRejected { relation_id } => {
                metrics::with_state_mut(|m| {
                    m.ops.consistency_rejections = m.ops.consistency_rejections.saturating_add(1);
                    let entry = m.relations.entry(relation_id.to_string()).or_default();
                    entry.consistency_rejections = entry.consistency_rejections.saturating_add(1);
                });
            }

            RelationEvent::StateUpdated { relation_id, .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.state_updates = m.ops.state_updates.saturating_add(1);
                    let entry = m.relations.entry(relation_id.to_string()).or_default();
                    entry.state_updates = entry.state_updates.saturating_add(1);
                });
            }

            RelationEvent::Commit { .. } => {
                metrics::with_state_mut(|m| m.ops.commits = m.ops.commits.saturating_add(1));
            }

            RelationEvent::Rollback { .. } => {
                metrics::with_state_mut(|m| m.ops.rollbacks = m.ops.rollbacks.saturating_add(1));
            }

            RelationEvent::SubTransactionMerged { .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.sub_transaction_merges = m.ops.sub_transaction_merges.saturating_add(1);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: RelationEvent) {
    // Clone out of the slot so a sink may record re-entrantly.
    let override_sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match override_sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current metrics state for reporting and test plumbing.
#[must_use]
pub fn metrics_report(window_start_ms: Option<u64>) -> metrics::EventReport {
    metrics::report_window_start(window_start_ms)
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

///
/// TESTS
///
