//! Persistent catenable sequence.
//!
//! [`CatenableSequence`] supports O(1) worst-case concatenation and O(1)
//! amortized removal of its first element. A non-empty sequence is a head
//! element plus a [`TwoListQueue`] of child sequences:
//!
//! ```text
//! Node(1, [Node(2, []), Node(3, [Node(4, [])])])   ==   [1, 2, 3, 4]
//! ```
//!
//! Flattening the head followed by every child, in queue order, yields the
//! logical sequence. `link` only pushes onto the child queue; `uncons`
//! collapses the child queue into a single sequence with repeated `link`.
//! Each child is collapsed by at most one `uncons` of its parent, so a run of
//! N operations over M elements performs O(N + M) work in total.
//!
//! # Memoized Collapse
//!
//! Sequences are persistent and may be split many times. The collapsed tail
//! is therefore cached on the node the first time it is computed; splitting
//! the same shared sequence again returns the cached tail instead of
//! collapsing the children a second time.
//!
//! A node built by `link(a, b)` also remembers `a` and `b`. Its children are
//! those of `a` followed by `b`, so its tail is `link(tail(a), b)`. Splitting
//! it reuses the tail of the nearest such ancestor that is already cached,
//! and otherwise collapses `a` once and caches the result on `a`. Any number
//! of sequences derived from one shared ancestor and then split cost O(1)
//! each after the first:
//!
//! ```text
//! base = [0, 1, ..., n]
//! base.snoc(x).uncons()   // collapses base once, O(n)
//! base.snoc(y).uncons()   // link(tail(base), [y]), O(1)
//! ```
//!
//! Splitting many *distinct* intermediate versions of one chain, newest
//! first, still collapses each of them separately.

use std::fmt;
use std::iter::FromIterator;

use smallvec::SmallVec;

use super::{MemoCell, ReferenceCounter, TwoListQueue};

const DROP_INLINE_CAPACITY: usize = 8;
const RESOLVE_INLINE_CAPACITY: usize = 8;

struct Node<T> {
    head: T,
    children: TwoListQueue<CatenableSequence<T>>,
    origin: Option<Origin<T>>,
    collapsed: MemoCell<CatenableSequence<T>>,
}

/// Operands of the `link` that built a node.
///
/// The node's children are those of `source` followed by `linked`.
struct Origin<T> {
    source: CatenableSequence<T>,
    linked: CatenableSequence<T>,
}

impl<T> Origin<T> {
    fn source_node(&self) -> Option<&Node<T>> {
        self.source.root.as_deref()
    }
}

/// A persistent sequence with O(1) `link` and O(1) amortized `uncons`.
///
/// # Time Complexity
///
/// | Operation | Complexity      |
/// |-----------|-----------------|
/// | `link`    | O(1) worst case |
/// | `snoc`    | O(1) worst case |
/// | `uncons`  | O(1) amortized  |
///
/// # Examples
///
/// ```rust
/// use catfree::persistent::CatenableSequence;
///
/// let sequence = CatenableSequence::new().snoc(1).snoc(2).snoc(3);
/// let (first, rest) = sequence.uncons().unwrap();
/// assert_eq!(first, 1);
/// assert_eq!(rest.iter().collect::<Vec<_>>(), vec![2, 3]);
///
/// // The original is unchanged
/// assert_eq!(sequence.iter().collect::<Vec<_>>(), vec![1, 2, 3]);
/// ```
pub struct CatenableSequence<T> {
    root: Option<ReferenceCounter<Node<T>>>,
}

impl<T> CatenableSequence<T> {
    /// Creates an empty sequence (`Nil`).
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { root: None }
    }

    /// Creates a sequence holding exactly `item`.
    #[inline]
    #[must_use]
    pub fn singleton(item: T) -> Self {
        Self {
            root: Some(ReferenceCounter::new(Node {
                head: item,
                children: TwoListQueue::new(),
                origin: None,
                collapsed: MemoCell::new(),
            })),
        }
    }

    /// Returns `true` if the sequence holds no element.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the first element without removing it.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.root.as_ref().map(|node| &node.head)
    }
}

impl<T: Clone> CatenableSequence<T> {
    /// Concatenates `self` followed by `other`.
    ///
    /// If either operand is empty the other is returned. Otherwise the result
    /// keeps the head of `self` and pushes `other` onto its child queue.
    ///
    /// # Complexity
    ///
    /// O(1) worst case
    ///
    /// # Examples
    ///
    /// ```rust
    /// use catfree::persistent::CatenableSequence;
    ///
    /// let left: CatenableSequence<i32> = (1..=2).collect();
    /// let right: CatenableSequence<i32> = (3..=4).collect();
    /// let joined = left.link(&right);
    /// assert_eq!(joined.iter().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    /// ```
    #[must_use]
    pub fn link(&self, other: &Self) -> Self {
        match (&self.root, &other.root) {
            (None, _) => other.clone(),
            (_, None) => self.clone(),
            (Some(node), Some(_)) => Self {
                root: Some(ReferenceCounter::new(Node {
                    head: node.head.clone(),
                    children: node.children.push(other.clone()),
                    origin: Some(Origin {
                        source: self.clone(),
                        linked: other.clone(),
                    }),
                    collapsed: MemoCell::new(),
                })),
            },
        }
    }

    /// Appends `item` as the last element.
    ///
    /// # Complexity
    ///
    /// O(1) worst case
    #[inline]
    #[must_use]
    pub fn snoc(&self, item: T) -> Self {
        self.link(&Self::singleton(item))
    }

    /// Splits the sequence into its first element and the remaining sequence.
    ///
    /// Returns `None` if the sequence is empty.
    ///
    /// # Complexity
    ///
    /// O(1) amortized. The first split of a node costs at most O(children);
    /// the result is cached on the node, and on the sequence it was linked
    /// from, so splitting other sequences derived from that one is O(1).
    #[must_use]
    pub fn uncons(&self) -> Option<(T, Self)> {
        self.root.as_ref().map(|node| node.split())
    }

    /// Consuming variant of [`uncons`](Self::uncons).
    ///
    /// A uniquely owned root node is taken apart in place, moving the head out
    /// without cloning it and skipping the memo. A shared root falls back to
    /// the memoized split.
    pub(crate) fn into_uncons(mut self) -> Option<(T, Self)> {
        let node = self.root.take()?;
        match ReferenceCounter::try_unwrap(node) {
            Ok(Node {
                head,
                children,
                origin,
                collapsed,
            }) => {
                let rest = collapsed
                    .into_inner()
                    .unwrap_or_else(|| Self::rest_of(&children, origin.as_ref()));
                Some((head, rest))
            }
            Err(shared) => Some(shared.split()),
        }
    }

    /// Returns an iterator over the elements, first to last.
    ///
    /// Items are cloned out of the shared nodes.
    #[must_use]
    pub fn iter(&self) -> CatenableSequenceIterator<T> {
        CatenableSequenceIterator {
            remaining: self.clone(),
        }
    }

    fn collapse(children: &TwoListQueue<Self>) -> Self {
        children.fold_collapsing(Self::new(), |child, accumulator| child.link(&accumulator))
    }

    /// Computes the sequence that follows the head of a node.
    ///
    /// Walks the `source` chain up to the nearest ancestor whose tail is
    /// cached and replays the links below it, caching each ancestor on the
    /// way. If no ancestor is cached, the immediate source is collapsed and
    /// cached instead.
    fn rest_of(children: &TwoListQueue<Self>, origin: Option<&Origin<T>>) -> Self {
        let Some((origin, source)) = origin.and_then(|origin| Some((origin, origin.source_node()?)))
        else {
            return Self::collapse(children);
        };

        let mut unresolved: SmallVec<[(&Node<T>, &Self); RESOLVE_INLINE_CAPACITY]> =
            SmallVec::new();
        let mut current = source;
        let resolved = loop {
            if let Some(tail) = current.collapsed.get() {
                break tail.clone();
            }
            let parent = current
                .origin
                .as_ref()
                .and_then(|link| Some((link, link.source_node()?)));
            match parent {
                Some((link, parent)) => {
                    unresolved.push((current, &link.linked));
                    current = parent;
                }
                None => {
                    unresolved.clear();
                    break source
                        .collapsed
                        .get_or_init(|| Self::collapse(&source.children))
                        .clone();
                }
            }
        };

        let tail = unresolved
            .into_iter()
            .rev()
            .fold(resolved, |tail, (ancestor, linked)| {
                let tail = tail.link(linked);
                let _ = ancestor.collapsed.set(tail.clone());
                tail
            });
        tail.link(&origin.linked)
    }
}

impl<T: Clone> Node<T> {
    fn split(&self) -> (T, CatenableSequence<T>) {
        let rest = self
            .collapsed
            .get_or_init(|| CatenableSequence::rest_of(&self.children, self.origin.as_ref()))
            .clone();
        (self.head.clone(), rest)
    }
}

impl<T> Drop for CatenableSequence<T> {
    fn drop(&mut self) {
        let Some(root) = self.root.take() else {
            return;
        };
        let mut pending: SmallVec<[ReferenceCounter<Node<T>>; DROP_INLINE_CAPACITY]> =
            SmallVec::new();
        pending.push(root);

        while let Some(node) = pending.pop() {
            let Ok(Node {
                children,
                origin,
                collapsed,
                ..
            }) = ReferenceCounter::try_unwrap(node)
            else {
                continue;
            };
            let mut adopt = |mut child: Self| {
                if let Some(root) = child.root.take() {
                    pending.push(root);
                }
            };
            let (front, back) = children.into_lists();
            front.drain_unique(&mut adopt);
            back.drain_unique(&mut adopt);
            if let Some(Origin { source, linked }) = origin {
                adopt(source);
                adopt(linked);
            }
            if let Some(tail) = collapsed.into_inner() {
                adopt(tail);
            }
        }
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator over the elements of a [`CatenableSequence`], driven by
/// repeated `uncons`.
pub struct CatenableSequenceIterator<T> {
    remaining: CatenableSequence<T>,
}

impl<T: Clone> Iterator for CatenableSequenceIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let (item, rest) = self.remaining.uncons()?;
        self.remaining = rest;
        Some(item)
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Clone for CatenableSequence<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
        }
    }
}

impl<T> Default for CatenableSequence<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> FromIterator<T> for CatenableSequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |sequence, item| sequence.snoc(item))
    }
}

impl<T: Clone + PartialEq> PartialEq for CatenableSequence<T> {
    fn eq(&self, other: &Self) -> bool {
        let mut left = self.iter();
        let mut right = other.iter();
        loop {
            match (left.next(), right.next()) {
                (None, None) => return true,
                (Some(a), Some(b)) if a == b => {}
                _ => return false,
            }
        }
    }
}

impl<T: Clone + Eq> Eq for CatenableSequence<T> {}

impl<T: Clone + fmt::Debug> fmt::Debug for CatenableSequence<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn collect(sequence: &CatenableSequence<i32>) -> Vec<i32> {
        sequence.iter().collect()
    }

    fn shares_root(left: &CatenableSequence<i32>, right: &CatenableSequence<i32>) -> bool {
        match (&left.root, &right.root) {
            (Some(a), Some(b)) => ReferenceCounter::ptr_eq(a, b),
            _ => false,
        }
    }

    #[rstest]
    fn test_new_is_empty() {
        let sequence: CatenableSequence<i32> = CatenableSequence::new();
        assert!(sequence.is_empty());
        assert!(sequence.uncons().is_none());
        assert_eq!(sequence.first(), None);
    }

    #[rstest]
    fn test_singleton() {
        let sequence = CatenableSequence::singleton(5);
        assert_eq!(sequence.first(), Some(&5));
        let (head, rest) = sequence.uncons().unwrap();
        assert_eq!(head, 5);
        assert!(rest.is_empty());
    }

    #[rstest]
    fn test_link_with_empty_returns_other_operand() {
        let sequence: CatenableSequence<i32> = (1..=3).collect();
        let empty = CatenableSequence::new();
        assert!(shares_root(&sequence.link(&empty), &sequence));
        assert!(shares_root(&empty.link(&sequence), &sequence));
    }

    #[rstest]
    fn test_snoc_preserves_order() {
        let sequence = CatenableSequence::new().snoc(1).snoc(2).snoc(3);
        assert_eq!(collect(&sequence), vec![1, 2, 3]);
    }

    #[rstest]
    fn test_link_of_nested_sequences() {
        let a: CatenableSequence<i32> = (1..=2).collect();
        let b: CatenableSequence<i32> = (3..=4).collect();
        let c: CatenableSequence<i32> = (5..=6).collect();

        let left_nested = a.link(&b).link(&c);
        let right_nested = a.link(&b.link(&c));

        assert_eq!(collect(&left_nested), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(collect(&right_nested), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(left_nested, right_nested);
    }

    #[rstest]
    fn test_link_keeps_operands_intact() {
        let a: CatenableSequence<i32> = (1..=2).collect();
        let b: CatenableSequence<i32> = (3..=4).collect();
        let _ = a.link(&b);
        assert_eq!(collect(&a), vec![1, 2]);
        assert_eq!(collect(&b), vec![3, 4]);
    }

    #[rstest]
    fn test_uncons_of_shared_sequence_is_memoized() {
        let sequence: CatenableSequence<i32> = (1..=5).collect();
        let (_, first_rest) = sequence.uncons().unwrap();
        let (_, second_rest) = sequence.uncons().unwrap();
        assert!(shares_root(&first_rest, &second_rest));
    }

    #[rstest]
    fn test_uncons_of_derived_sequence_caches_tail_on_source() {
        let base: CatenableSequence<i32> = (0..100).collect();
        let (head, rest) = base.snoc(100).uncons().unwrap();

        assert_eq!(head, 0);
        assert_eq!(collect(&rest), (1..=100).collect::<Vec<_>>());
        let cached = base.root.as_ref().and_then(|node| node.collapsed.get());
        assert!(cached.is_some());
        assert_eq!(collect(&base), (0..100).collect::<Vec<_>>());
    }

    #[rstest]
    fn test_uncons_of_derived_sequence_through_several_links() {
        let base: CatenableSequence<i32> = (0..4).collect();
        let _ = base.uncons();

        let derived = base.snoc(4).link(&(5..7).collect()).snoc(7);
        let (head, rest) = derived.uncons().unwrap();
        assert_eq!(head, 0);
        assert_eq!(collect(&rest), (1..8).collect::<Vec<_>>());
    }

    // =========================================================================
    // Work Bounds
    // =========================================================================

    thread_local! {
        static CLONES: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
    }

    /// An element that counts how often it is cloned on the current thread.
    #[derive(Debug, PartialEq)]
    struct Tracked(usize);

    impl Clone for Tracked {
        fn clone(&self) -> Self {
            CLONES.with(|clones| clones.set(clones.get() + 1));
            Self(self.0)
        }
    }

    fn clones_during<R>(work: impl FnOnce() -> R) -> usize {
        let before = CLONES.with(std::cell::Cell::get);
        let _ = work();
        CLONES.with(std::cell::Cell::get) - before
    }

    fn snoc_built(length: usize) -> CatenableSequence<Tracked> {
        (0..length).map(Tracked).collect()
    }

    fn left_linked(length: usize) -> CatenableSequence<Tracked> {
        (0..length).fold(CatenableSequence::new(), |sequence, item| {
            sequence.link(&CatenableSequence::singleton(Tracked(item)))
        })
    }

    fn right_linked(length: usize) -> CatenableSequence<Tracked> {
        (0..length).rev().fold(CatenableSequence::new(), |sequence, item| {
            CatenableSequence::singleton(Tracked(item)).link(&sequence)
        })
    }

    #[rstest]
    fn test_sibling_splits_share_one_collapse() {
        let length = 10_000;
        let siblings = 1_000;
        let base = snoc_built(length);

        let work = clones_during(|| {
            for item in 0..siblings {
                let (head, _) = base.snoc(Tracked(length + item)).uncons().unwrap();
                assert_eq!(head, Tracked(0));
            }
        });

        // One collapse of `base` plus constant work per sibling.
        assert!(work <= 2 * length + 8 * siblings, "{work} clones");
    }

    #[rstest]
    #[case::snoc_built(snoc_built as fn(usize) -> CatenableSequence<Tracked>)]
    #[case::left_linked(left_linked as fn(usize) -> CatenableSequence<Tracked>)]
    #[case::right_linked(right_linked as fn(usize) -> CatenableSequence<Tracked>)]
    fn test_drain_work_grows_linearly(#[case] build: fn(usize) -> CatenableSequence<Tracked>) {
        let drain = |length: usize| {
            let sequence = build(length);
            clones_during(|| {
                assert_eq!(sequence.iter().count(), length);
            })
        };

        let single = drain(5_000);
        let doubled = drain(10_000);
        assert!(doubled <= 2 * single + 64, "{single} then {doubled} clones");
    }

    #[rstest]
    fn test_into_uncons_unique_moves_head() {
        let sequence: CatenableSequence<String> =
            ["a", "b"].into_iter().map(String::from).collect();
        let (head, rest) = sequence.into_uncons().unwrap();
        assert_eq!(head, "a");
        assert_eq!(rest.iter().collect::<Vec<_>>(), vec!["b".to_string()]);
    }

    #[rstest]
    fn test_into_uncons_shared_leaves_original_readable() {
        let sequence: CatenableSequence<i32> = (1..=3).collect();
        let (head, rest) = sequence.clone().into_uncons().unwrap();
        assert_eq!(head, 1);
        assert_eq!(collect(&rest), vec![2, 3]);
        assert_eq!(collect(&sequence), vec![1, 2, 3]);
    }

    #[rstest]
    fn test_interleaved_uncons_and_snoc() {
        let sequence = CatenableSequence::new().snoc(1).snoc(2);
        let (first, rest) = sequence.uncons().unwrap();
        let rest = rest.snoc(3).link(&CatenableSequence::singleton(4));
        assert_eq!(first, 1);
        assert_eq!(collect(&rest), vec![2, 3, 4]);
    }

    #[rstest]
    fn test_debug() {
        let sequence: CatenableSequence<i32> = (1..=3).collect();
        assert_eq!(format!("{sequence:?}"), "[1, 2, 3]");
    }

    #[rstest]
    fn test_drop_after_deep_collapse_does_not_overflow() {
        let mut sequence = CatenableSequence::new();
        for item in 0..500_000 {
            sequence = sequence.snoc(item);
        }
        let (head, rest) = sequence.uncons().unwrap();
        assert_eq!(head, 0);
        assert_eq!(rest.first(), Some(&1));
        drop(sequence);
        drop(rest);
    }
}
