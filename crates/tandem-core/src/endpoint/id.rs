use crate::{model::RelationEndPointDefinition, types::ObjectId};
use std::fmt;

///
/// RelationEndPointId
///
/// Identity of one relation end-point slot: the owning object plus the
/// end-point definition. Immutable once created.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RelationEndPointId {
    pub object_id: ObjectId,
    pub definition: &'static RelationEndPointDefinition,
}

impl RelationEndPointId {
    #[must_use]
    pub const fn new(object_id: ObjectId, definition: &'static RelationEndPointDefinition) -> Self {
        Self {
            object_id,
            definition,
        }
    }

    #[must_use]
    pub const fn is_virtual(&self) -> bool {
        self.definition.is_virtual
    }

    #[must_use]
    pub const fn relation_id(&self) -> &'static str {
        self.definition.relation_id
    }

    #[must_use]
    pub const fn property_name(&self) -> &'static str {
        self.definition.property_name
    }
}

impl fmt::Display for RelationEndPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.object_id, self.definition)
    }
}
