//! Static relation metadata consumed by the end-point runtime.

pub mod relation;

pub use relation::{Cardinality, RelationDefinition, RelationEndPointDefinition};
