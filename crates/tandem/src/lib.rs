//! ## Crate layout
//! - `core`: virtual end-points, load states, data managers, commands,
//!   configuration and observability.
//! - `error`: the stable public error type.
//!
//! The `prelude` module mirrors the surface used by persistence layers that
//! host virtual one-to-one relation end-points.

pub use tandem_core as core;

pub mod error;

pub use error::Error;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        config::RelationConfig,
        endpoint::{
            EndPointContext, EndPointLoader, LookupEndPointLoader, ObjectEndPointCommand,
            RealEndPointRef, RealObjectEndPoint as _, RelationEndPointId,
            RelationEndPointProvider, StateUpdateRaisingVirtualObjectEndPoint,
            TransactionEventSink, VirtualEndPointStateUpdateListener, VirtualObjectEndPoint,
        },
        model::{Cardinality, RelationDefinition, RelationEndPointDefinition},
        types::{ObjectId, Ulid},
    };
    pub use crate::error::{Error, ErrorKind, ErrorOrigin};
}
