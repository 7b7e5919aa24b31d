mod ulid;

pub use ulid::{Ulid, UlidError};

use serde::Serialize;
use std::fmt;

///
/// ObjectId
///
/// Identity of one domain object: its class id plus a ULID value.
/// Within a single transaction there is at most one domain object per id,
/// so id equality is object identity.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ObjectId {
    pub class_id: &'static str,
    pub value: Ulid,
}

impl ObjectId {
    #[must_use]
    pub const fn new(class_id: &'static str, value: Ulid) -> Self {
        Self { class_id, value }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.class_id, self.value)
    }
}
