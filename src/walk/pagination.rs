//! walk::pagination
//!
//! Page boundaries over the filtered output of another instructor.
//!
//! # Invariants
//!
//! - Only entries the inner instructor hands out are counted, so page
//!   boundaries don't move when the inner filter rejects entries.
//! - An entry the inner instructor rejects is never promoted to `Handle`.
//! - Once the page is full the walk is told to stop.

use crate::git::{WalkEntry, WalkInstruction};

use super::{WalkError, WalkInstructor};

/// An instructor that may or may not be paginated.
#[derive(Debug)]
pub enum Paged<I> {
    /// Pagination was not requested; the inner instructor runs unchanged.
    Disabled(I),
    /// The inner instructor wrapped with page boundaries.
    Enabled(Paginator<I>),
}

impl<I> Paged<I> {
    /// Whether page boundaries are applied.
    pub fn is_paginated(&self) -> bool {
        matches!(self, Paged::Enabled(_))
    }

    /// Number of handled entries after which the walk stops, if paginated.
    pub fn end_after(&self) -> Option<i32> {
        match self {
            Paged::Disabled(_) => None,
            Paged::Enabled(p) => Some(p.end_after),
        }
    }

    /// Unwrap the inner instructor.
    pub fn into_inner(self) -> I {
        match self {
            Paged::Disabled(inner) => inner,
            Paged::Enabled(p) => p.inner,
        }
    }
}

impl<I: WalkInstructor> WalkInstructor for Paged<I> {
    fn instruct(&mut self, entry: &WalkEntry) -> Result<WalkInstruction, WalkError> {
        match self {
            Paged::Disabled(inner) => inner.instruct(entry),
            Paged::Enabled(p) => p.instruct(entry),
        }
    }
}

/// Wraps an instructor with skip/stop semantics for one page.
#[derive(Debug)]
pub struct Paginator<I> {
    inner: I,
    start_after: i32,
    end_after: i32,
    count: i32,
}

impl<I: WalkInstructor> WalkInstructor for Paginator<I> {
    fn instruct(&mut self, entry: &WalkEntry) -> Result<WalkInstruction, WalkError> {
        let instruction = self.inner.instruct(entry)?;
        if instruction != WalkInstruction::Handle {
            return Ok(instruction);
        }

        // end_after fits in i32, and we stop right after passing it
        self.count += 1;

        Ok(if self.count <= self.start_after {
            WalkInstruction::Skip
        } else if self.count > self.end_after {
            WalkInstruction::Stop
        } else {
            WalkInstruction::Handle
        })
    }
}

/// Wrap `inner` with pagination for the 1-based `page` of `page_size`.
///
/// A `page_size` below 1 disables pagination and returns `inner` as is.
/// A `page` below 1 is treated as the first page.
///
/// # Errors
///
/// - [`WalkError::PageOutOfRange`] if `page * page_size` overflows `i32`
///
/// # Example
///
/// ```
/// use refkeep::walk::{handle_all, paginate};
///
/// assert!(!paginate(handle_all(), 3, 0).unwrap().is_paginated());
/// assert_eq!(paginate(handle_all(), 3, 20).unwrap().end_after(), Some(60));
/// assert!(paginate(handle_all(), i32::MAX, 2).is_err());
/// ```
pub fn paginate<I: WalkInstructor>(
    inner: I,
    page: i32,
    page_size: i32,
) -> Result<Paged<I>, WalkError> {
    if page_size < 1 {
        return Ok(Paged::Disabled(inner));
    }

    let page = page.max(1);
    let end_after = page
        .checked_mul(page_size)
        .ok_or(WalkError::PageOutOfRange { page, page_size })?;
    let start_after = end_after - page_size;

    Ok(Paged::Enabled(Paginator {
        inner,
        start_after,
        end_after,
        count: 0,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::ReferenceField;

    fn entry(n: usize) -> WalkEntry {
        WalkEntry::from([(ReferenceField::RefName, format!("refs/tags/t{n}"))])
    }

    /// Handles entries with an even index, skips the rest.
    fn even_only() -> impl WalkInstructor {
        |e: &WalkEntry| {
            let name = &e[&ReferenceField::RefName];
            let n: usize = name.trim_start_matches("refs/tags/t").parse().unwrap();
            Ok::<_, WalkError>(if n % 2 == 0 {
                WalkInstruction::Handle
            } else {
                WalkInstruction::Skip
            })
        }
    }

    fn run<I: WalkInstructor>(instructor: &mut I, total: usize) -> Vec<(usize, WalkInstruction)> {
        let mut out = Vec::new();
        for n in 0..total {
            let inst = instructor.instruct(&entry(n)).unwrap();
            out.push((n, inst));
            if inst == WalkInstruction::Stop {
                break;
            }
        }
        out
    }

    fn handled(trace: &[(usize, WalkInstruction)]) -> Vec<usize> {
        trace
            .iter()
            .filter(|(_, i)| *i == WalkInstruction::Handle)
            .map(|(n, _)| *n)
            .collect()
    }

    #[test]
    fn disabled_for_small_page_size() {
        for size in [0, -1, i32::MIN] {
            let paged = paginate(super::super::handle_all(), 1, size).unwrap();
            assert!(!paged.is_paginated());
            assert_eq!(paged.end_after(), None);
        }
    }

    #[test]
    fn disabled_returns_inner_unchanged() {
        let paged = paginate(even_only(), 5, 0).unwrap();
        let mut inner = paged.into_inner();
        let trace = run(&mut inner, 6);
        assert_eq!(handled(&trace), vec![0, 2, 4]);
    }

    #[test]
    fn first_page() {
        let mut paged = paginate(super::super::handle_all(), 1, 2).unwrap();
        let trace = run(&mut paged, 10);
        assert_eq!(handled(&trace), vec![0, 1]);
        assert_eq!(trace.last().unwrap(), &(2, WalkInstruction::Stop));
    }

    #[test]
    fn page_below_one_is_first_page() {
        let mut paged = paginate(super::super::handle_all(), -4, 3).unwrap();
        assert_eq!(paged.end_after(), Some(3));
        assert_eq!(handled(&run(&mut paged, 10)), vec![0, 1, 2]);
    }

    #[test]
    fn later_page_skips_earlier_entries() {
        let mut paged = paginate(super::super::handle_all(), 3, 2).unwrap();
        let trace = run(&mut paged, 10);
        assert_eq!(handled(&trace), vec![4, 5]);
        assert!(trace[..4]
            .iter()
            .all(|(_, i)| *i == WalkInstruction::Skip));
    }

    #[test]
    fn counts_only_filtered_entries() {
        // handled stream is 0, 2, 4, 6, 8, ...; page 2 of size 2 is 4, 6
        let mut paged = paginate(even_only(), 2, 2).unwrap();
        let trace = run(&mut paged, 20);
        assert_eq!(handled(&trace), vec![4, 6]);
        assert_eq!(trace.last().unwrap(), &(8, WalkInstruction::Stop));
    }

    #[test]
    fn inner_verdicts_propagate_unchanged() {
        let mut paged = paginate(even_only(), 1, 5).unwrap();
        assert_eq!(paged.instruct(&entry(1)).unwrap(), WalkInstruction::Skip);

        let mut stopping = paginate(
            |_: &WalkEntry| Ok::<_, WalkError>(WalkInstruction::Stop),
            1,
            5,
        )
        .unwrap();
        assert_eq!(stopping.instruct(&entry(0)).unwrap(), WalkInstruction::Stop);
    }

    #[test]
    fn inner_errors_propagate() {
        let mut failing = paginate(
            |_: &WalkEntry| {
                Err::<WalkInstruction, _>(WalkError::MissingField(ReferenceField::ObjectType))
            },
            1,
            5,
        )
        .unwrap();
        assert_eq!(
            failing.instruct(&entry(0)),
            Err(WalkError::MissingField(ReferenceField::ObjectType))
        );
    }

    #[test]
    fn last_page_is_short() {
        let mut paged = paginate(super::super::handle_all(), 2, 4).unwrap();
        assert_eq!(handled(&run(&mut paged, 6)), vec![4, 5]);
    }

    #[test]
    fn overflow_rejected() {
        assert_eq!(
            paginate(super::super::handle_all(), i32::MAX, 2).err().unwrap(),
            WalkError::PageOutOfRange {
                page: i32::MAX,
                page_size: 2
            }
        );
        assert!(paginate(super::super::handle_all(), i32::MAX, 1).is_ok());
    }
}
