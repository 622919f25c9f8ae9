//! Persistent (immutable) data structures.
//!
//! This module provides the immutable sequences that back the continuation
//! store of [`Program`](crate::control::Program):
//!
//! - [`PersistentList`]: Persistent singly-linked list
//! - [`TwoListQueue`]: Persistent queue over two lists
//! - [`CatenableSequence`]: Persistent sequence with O(1) concatenation
//!
//! # Structural Sharing
//!
//! Every operation returns a new version and leaves the receiver untouched.
//! New versions share their unchanged nodes with the old ones, so pushing,
//! linking and splitting never copy the whole structure.
//!
//! # Examples
//!
//! ## `PersistentList`
//!
//! ```rust
//! use catfree::persistent::PersistentList;
//!
//! let list = PersistentList::new().cons(3).cons(2).cons(1);
//! assert_eq!(list.head(), Some(&1));
//!
//! // Structural sharing: the original list is preserved
//! let extended = list.cons(0);
//! assert_eq!(list.len(), 3);     // Original unchanged
//! assert_eq!(extended.len(), 4); // New list
//! ```
//!
//! ## `TwoListQueue`
//!
//! ```rust
//! use catfree::persistent::TwoListQueue;
//!
//! let queue = TwoListQueue::new().push(1).push(2).push(3);
//! let (last, rest) = queue.pop_far().unwrap();
//! assert_eq!(last, 3);
//! assert_eq!(rest.len(), 2);
//! assert_eq!(queue.len(), 3); // Original unchanged
//! ```
//!
//! ## `CatenableSequence`
//!
//! ```rust
//! use catfree::persistent::CatenableSequence;
//!
//! let left: CatenableSequence<i32> = (1..=3).collect();
//! let right: CatenableSequence<i32> = (4..=6).collect();
//! let joined = left.link(&right);
//!
//! let collected: Vec<i32> = joined.iter().collect();
//! assert_eq!(collected, vec![1, 2, 3, 4, 5, 6]);
//! ```

// =============================================================================
// Sharing Primitives
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

/// Write-once cell used to memoize derived values on shared nodes.
///
/// Follows the same switch as [`ReferenceCounter`]: `OnceLock` with the
/// `arc` feature, `OnceCell` otherwise.
#[cfg(feature = "arc")]
pub(crate) type MemoCell<T> = std::sync::OnceLock<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type MemoCell<T> = std::cell::OnceCell<T>;

mod catenable;
mod list;
mod queue;

pub use catenable::CatenableSequence;
pub use catenable::CatenableSequenceIterator;
pub use list::PersistentList;
pub use list::PersistentListIterator;
pub use queue::TwoListQueue;
pub use queue::TwoListQueueIterator;

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentList<i32>: Send, Sync);
#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(TwoListQueue<i32>: Send, Sync);
#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(CatenableSequence<i32>: Send, Sync);

#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(CatenableSequence<i32>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod reference_counter_tests {
    use super::{MemoCell, ReferenceCounter};
    use rstest::rstest;

    #[rstest]
    fn test_reference_counter_strong_count() {
        let reference_counter: ReferenceCounter<i32> = ReferenceCounter::new(42);
        assert_eq!(ReferenceCounter::strong_count(&reference_counter), 1);
        let reference_counter_clone = reference_counter.clone();
        assert_eq!(ReferenceCounter::strong_count(&reference_counter), 2);
        drop(reference_counter_clone);
        assert_eq!(ReferenceCounter::strong_count(&reference_counter), 1);
    }

    #[rstest]
    fn test_memo_cell_initializes_once() {
        let cell: MemoCell<i32> = MemoCell::new();
        let mut calls = 0;
        assert_eq!(
            *cell.get_or_init(|| {
                calls += 1;
                7
            }),
            7
        );
        assert_eq!(*cell.get_or_init(|| 8), 7);
        assert_eq!(calls, 1);
    }
}
