//! walk::filter
//!
//! Object-type filtering of reference walk entries.

use std::collections::HashSet;

use crate::git::{ObjectType, ReferenceField, WalkEntry, WalkInstruction};

use super::{WalkError, WalkInstructor};

/// Hands out entries whose object type is in the accepted set.
///
/// Entries lacking the object type field fail the walk with
/// [`WalkError::MissingField`]. An unrecognized type is skipped.
#[derive(Debug, Clone)]
pub struct ObjectTypeFilter {
    accepted: HashSet<ObjectType>,
}

impl ObjectTypeFilter {
    pub fn new(accepted: impl IntoIterator<Item = ObjectType>) -> Self {
        Self {
            accepted: accepted.into_iter().collect(),
        }
    }

    pub fn accepts(&self, kind: ObjectType) -> bool {
        self.accepted.contains(&kind)
    }
}

impl WalkInstructor for ObjectTypeFilter {
    fn instruct(&mut self, entry: &WalkEntry) -> Result<WalkInstruction, WalkError> {
        let raw = entry
            .get(&ReferenceField::ObjectType)
            .ok_or(WalkError::MissingField(ReferenceField::ObjectType))?;

        Ok(match raw.parse::<ObjectType>() {
            Ok(kind) if self.accepts(kind) => WalkInstruction::Handle,
            _ => WalkInstruction::Skip,
        })
    }
}
