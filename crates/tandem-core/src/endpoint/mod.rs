//! Module: endpoint
//! Responsibility: virtual object end-points, their load-state machine, data
//! manager, commands and the state-update decorator.
//! Does not own: relation metadata (`model`) or metric storage (`obs`).

mod command;
mod context;
mod data_manager;
mod decorator;
mod id;
mod load_state;
mod loader;
mod real;
mod virtual_object;

#[cfg(test)]
mod tests;

pub use command::{CommandKind, ObjectEndPointCommand, ObjectEndPointModification};
pub use context::{
    DefaultDataManagerFactory, EndPointContext, EndPointLoader, NullTransactionEventSink,
    RelationChange, RelationEndPointProvider, TransactionEventSink,
    VirtualObjectEndPointDataManagerFactory,
};
pub use data_manager::VirtualObjectEndPointDataManager;
pub use decorator::{
    StateUpdateRaisingCommand, StateUpdateRaisingVirtualObjectEndPoint,
    VirtualEndPointStateUpdateListener,
};
pub use id::RelationEndPointId;
pub(crate) use load_state::UnregisterOutcome;
pub use load_state::{
    CompleteVirtualObjectEndPointLoadState, CompletionReplay,
    IncompleteVirtualObjectEndPointLoadState, PendingCompletion, VirtualObjectEndPointLoadState,
};
pub use loader::LookupEndPointLoader;
pub use real::{ForeignKeyEndPoint, RealEndPointRef, RealObjectEndPoint, SyncState, same_end_point};
pub use virtual_object::VirtualObjectEndPoint;
