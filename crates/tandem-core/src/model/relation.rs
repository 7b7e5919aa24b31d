use crate::error::{ErrorClass, ErrorOrigin, InternalError};
use std::fmt;

///
/// Cardinality
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Cardinality {
    One,
    Many,
}

///
/// RelationEndPointDefinition
/// Static metadata for one side of a bidirectional relation.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RelationEndPointDefinition {
    /// Stable relation id shared by both sides.
    pub relation_id: &'static str,
    /// Class owning the property.
    pub class_id: &'static str,
    /// Property name as used in diagnostics.
    pub property_name: &'static str,
    pub cardinality: Cardinality,
    /// Virtual end-points carry no foreign key of their own.
    pub is_virtual: bool,
    /// Class owning the opposite property.
    pub opposite_class_id: &'static str,
    pub opposite_property_name: &'static str,
}

impl RelationEndPointDefinition {
    /// Fully-qualified `Class.Property` label.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.class_id, self.property_name)
    }

    /// Fully-qualified `Class.Property` label of the opposite side.
    #[must_use]
    pub fn opposite_qualified_name(&self) -> String {
        format!("{}.{}", self.opposite_class_id, self.opposite_property_name)
    }
}

impl fmt::Display for RelationEndPointDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class_id, self.property_name)
    }
}

///
/// RelationDefinition
///
/// One bidirectional relation: both end-point definitions, mirrored by
/// class and property name.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RelationDefinition {
    pub id: &'static str,
    pub end_points: [RelationEndPointDefinition; 2],
}

impl RelationDefinition {
    /// Return the end-point definition opposite to `definition`, if it belongs
    /// to this relation.
    #[must_use]
    pub fn opposite_of(
        &self,
        definition: &RelationEndPointDefinition,
    ) -> Option<&RelationEndPointDefinition> {
        match &self.end_points {
            [a, b] if a == definition => Some(b),
            [a, b] if b == definition => Some(a),
            _ => None,
        }
    }

    /// Return the virtual end-point definition.
    #[must_use]
    pub fn virtual_end_point(&self) -> Option<&RelationEndPointDefinition> {
        self.end_points.iter().find(|def| def.is_virtual)
    }

    /// Return the real (foreign-key) end-point definition.
    #[must_use]
    pub fn real_end_point(&self) -> Option<&RelationEndPointDefinition> {
        self.end_points.iter().find(|def| !def.is_virtual)
    }

    /// Check that both sides describe one relation and mirror each other.
    pub fn validate(&self) -> Result<(), InternalError> {
        let [a, b] = &self.end_points;

        if a.relation_id != self.id || b.relation_id != self.id {
            return Err(InternalError::model_invariant(format!(
                "relation '{}' contains end-points of another relation ('{}', '{}')",
                self.id, a.relation_id, b.relation_id
            )));
        }

        let mirrored = a.opposite_class_id == b.class_id
            && a.opposite_property_name == b.property_name
            && b.opposite_class_id == a.class_id
            && b.opposite_property_name == a.property_name;
        if !mirrored {
            return Err(InternalError::model_invariant(format!(
                "relation '{}' end-points do not mirror each other: {a} <-> {b}",
                self.id
            )));
        }

        // a real end-point always holds exactly one foreign key
        match (a.is_virtual, b.is_virtual) {
            (true, true) | (false, false) => Err(InternalError::model_invariant(format!(
                "relation '{}' must have exactly one virtual end-point",
                self.id
            ))),
            _ => {
                let real = if a.is_virtual { b } else { a };
                if real.cardinality == Cardinality::One {
                    Ok(())
                } else {
                    Err(InternalError::new(
                        ErrorClass::Unsupported,
                        ErrorOrigin::Model,
                        format!("relation '{}' real end-point {real} must be single-valued", self.id),
                    ))
                }
            }
        }
    }
}

///
/// TESTS
///
