//! Core runtime for tandem: the load-state machine, data manager, commands and
//! change-notification wrapper behind the virtual side of one-to-one
//! relations, plus the configuration and telemetry they report through.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod endpoint;
pub mod error;
pub mod model;
pub mod obs;
pub mod types;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, loaders, sinks, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        endpoint::{
            ObjectEndPointCommand, RealObjectEndPoint, RelationEndPointId, VirtualObjectEndPoint,
        },
        model::{Cardinality, RelationDefinition, RelationEndPointDefinition},
        types::{ObjectId, Ulid},
    };
}
