//! walk
//!
//! Walk instructors: per-entry filtering decisions for reference walks.
//!
//! # Architecture
//!
//! A reference walk asks its instructor about every entry git produces and
//! only hands `Handle` entries to the caller. Instructors compose by
//! wrapping: [`paginate`] wraps any instructor with page boundaries, and
//! [`ObjectTypeFilter`] is a leaf instructor accepting a set of object
//! types. Any `FnMut(&WalkEntry) -> Result<WalkInstruction, WalkError>`
//! closure is an instructor too.
//!
//! # Example
//!
//! ```
//! use refkeep::git::{ObjectType, ReferenceField, WalkEntry, WalkInstruction};
//! use refkeep::walk::{paginate, ObjectTypeFilter, WalkInstructor};
//!
//! let filter = ObjectTypeFilter::new([ObjectType::Commit, ObjectType::Tag]);
//! let mut paged = paginate(filter, 1, 10).unwrap();
//!
//! let entry = WalkEntry::from([(ReferenceField::ObjectType, "tag".to_string())]);
//! assert_eq!(paged.instruct(&entry).unwrap(), WalkInstruction::Handle);
//! ```

mod filter;
mod pagination;

pub use filter::ObjectTypeFilter;
pub use pagination::{paginate, Paged, Paginator};

use thiserror::Error;

use crate::git::{ReferenceField, WalkEntry, WalkInstruction};

/// Errors raised by instructors.
///
/// An instructor error ends the walk; no partial result is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalkError {
    /// A walk entry lacks a field the instructor needs.
    #[error("ref field for {0} is missing")]
    MissingField(ReferenceField),

    /// `page * page_size` is not representable.
    #[error("page {page} with page size {page_size} is out of range")]
    PageOutOfRange { page: i32, page_size: i32 },
}

/// A filtering decision for reference walk entries.
pub trait WalkInstructor: Send {
    /// Decide what to do with `entry`.
    ///
    /// Returning an error stops the walk and fails it.
    fn instruct(&mut self, entry: &WalkEntry) -> Result<WalkInstruction, WalkError>;
}

impl<F> WalkInstructor for F
where
    F: FnMut(&WalkEntry) -> Result<WalkInstruction, WalkError> + Send,
{
    fn instruct(&mut self, entry: &WalkEntry) -> Result<WalkInstruction, WalkError> {
        self(entry)
    }
}

/// Instructor that hands every entry to the caller.
pub fn handle_all() -> impl WalkInstructor {
    |_: &WalkEntry| Ok::<_, WalkError>(WalkInstruction::Handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_instructors() {
        let mut seen = 0;
        let mut counting = |_: &WalkEntry| {
            seen += 1;
            Ok::<_, WalkError>(WalkInstruction::Skip)
        };
        let entry = WalkEntry::new();
        assert_eq!(counting.instruct(&entry).unwrap(), WalkInstruction::Skip);
        assert_eq!(counting.instruct(&entry).unwrap(), WalkInstruction::Skip);
        assert_eq!(seen, 2);
    }

    #[test]
    fn handle_all_handles() {
        let mut all = handle_all();
        let instructor: &mut dyn WalkInstructor = &mut all;
        assert_eq!(
            instructor.instruct(&WalkEntry::new()).unwrap(),
            WalkInstruction::Handle
        );
    }

    #[test]
    fn error_display() {
        assert_eq!(
            WalkError::MissingField(ReferenceField::ObjectType).to_string(),
            "ref field for objecttype is missing"
        );
        assert_eq!(
            WalkError::PageOutOfRange {
                page: 3,
                page_size: 4
            }
            .to_string(),
            "page 3 with page size 4 is out of range"
        );
    }
}
