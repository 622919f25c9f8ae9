//! Persistent queue built from two singly-linked lists.
//!
//! [`TwoListQueue`] keeps a `front` list and a `back` list. Its logical
//! content is `front` followed by `reverse(back)`:
//!
//! ```text
//! front: 1 -> 2 -> nil
//! back:  5 -> 4 -> 3 -> nil
//! logical order: [1, 2, 3, 4, 5]
//! ```
//!
//! `push` prepends to `back`, so the pushed element becomes the logical last.
//! `pop_far` removes the logical last element; when `back` runs dry, `front`
//! is reversed into `back` once. A list is reversed at most once per element
//! it carries, which bounds the amortized cost of a pop at O(1).

use std::fmt;

use super::PersistentList;

/// A persistent double-ended sequence over two [`PersistentList`]s.
///
/// # Time Complexity
///
/// | Operation  | Complexity      |
/// |------------|-----------------|
/// | `push`     | O(1) worst case |
/// | `pop_far`  | O(1) amortized  |
/// | `pop_near` | O(1) amortized  |
/// | `len`      | O(1)            |
///
/// # Examples
///
/// ```rust
/// use catfree::persistent::TwoListQueue;
///
/// let queue = TwoListQueue::new().push('a').push('b');
/// let (last, rest) = queue.pop_far().unwrap();
/// assert_eq!(last, 'b');
///
/// let (first, _) = rest.pop_near().unwrap();
/// assert_eq!(first, 'a');
/// ```
pub struct TwoListQueue<T> {
    front: PersistentList<T>,
    back: PersistentList<T>,
}

impl<T> TwoListQueue<T> {
    /// Creates an empty queue.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            front: PersistentList::new(),
            back: PersistentList::new(),
        }
    }

    /// Returns `true` when no element remains.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.front.is_empty() && self.back.is_empty()
    }

    /// Returns the number of elements in the queue.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.front.len() + self.back.len()
    }

    /// Appends `item` as the logical last element.
    ///
    /// # Complexity
    ///
    /// O(1) worst case
    #[inline]
    #[must_use]
    pub fn push(&self, item: T) -> Self {
        Self {
            front: self.front.clone(),
            back: self.back.cons(item),
        }
    }

    /// Returns an iterator over the elements in logical order.
    #[must_use]
    pub fn iter(&self) -> TwoListQueueIterator<'_, T> {
        let mut back: Vec<&T> = self.back.iter().collect();
        back.reverse();
        TwoListQueueIterator {
            front: self.front.iter(),
            back: back.into_iter(),
        }
    }

    /// Splits the queue into its two lists, consuming it.
    pub(crate) fn into_lists(self) -> (PersistentList<T>, PersistentList<T>) {
        (self.front, self.back)
    }
}

impl<T: Clone> TwoListQueue<T> {
    /// Removes the logical last element.
    ///
    /// Returns `None` if the queue is empty.
    ///
    /// # Complexity
    ///
    /// O(1) amortized; a single call may reverse `front` in O(n).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use catfree::persistent::TwoListQueue;
    ///
    /// let queue = TwoListQueue::new().push(1).push(2).push(3);
    /// let (item, rest) = queue.pop_far().unwrap();
    /// assert_eq!(item, 3);
    /// assert_eq!(rest.len(), 2);
    ///
    /// let empty: TwoListQueue<i32> = TwoListQueue::new();
    /// assert!(empty.pop_far().is_none());
    /// ```
    #[must_use]
    pub fn pop_far(&self) -> Option<(T, Self)> {
        if let Some((item, back)) = self.back.uncons() {
            return Some((
                item.clone(),
                Self {
                    front: self.front.clone(),
                    back,
                },
            ));
        }
        if self.front.is_empty() {
            return None;
        }
        let rotated = Self {
            front: PersistentList::new(),
            back: self.front.reverse(),
        };
        rotated.pop_far()
    }

    /// Removes the logical first element.
    ///
    /// Mirror image of [`pop_far`](Self::pop_far): when `front` is empty,
    /// `back` is reversed into `front` first.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use catfree::persistent::TwoListQueue;
    ///
    /// let queue = TwoListQueue::new().push(1).push(2).push(3);
    /// let (item, rest) = queue.pop_near().unwrap();
    /// assert_eq!(item, 1);
    /// assert_eq!(rest.iter().copied().collect::<Vec<_>>(), vec![2, 3]);
    /// ```
    #[must_use]
    pub fn pop_near(&self) -> Option<(T, Self)> {
        if let Some((item, front)) = self.front.uncons() {
            return Some((
                item.clone(),
                Self {
                    front,
                    back: self.back.clone(),
                },
            ));
        }
        if self.back.is_empty() {
            return None;
        }
        let rotated = Self {
            front: self.back.reverse(),
            back: PersistentList::new(),
        };
        rotated.pop_near()
    }

    /// Folds the whole queue from the logical last element to the first.
    ///
    /// Repeatedly pops the far end and feeds each item to
    /// `function(item, accumulator)`. Runs in O(len) total.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use catfree::persistent::TwoListQueue;
    ///
    /// let queue = TwoListQueue::new().push("a").push("b").push("c");
    /// let joined = queue.fold_collapsing(String::new(), |item, accumulator| {
    ///     format!("{item}{accumulator}")
    /// });
    /// assert_eq!(joined, "abc");
    /// ```
    pub fn fold_collapsing<B, F>(&self, seed: B, mut function: F) -> B
    where
        F: FnMut(T, B) -> B,
    {
        let mut accumulator = seed;
        let mut remaining = self.clone();
        while let Some((item, rest)) = remaining.pop_far() {
            accumulator = function(item, accumulator);
            remaining = rest;
        }
        accumulator
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator over references to elements of a [`TwoListQueue`], in
/// logical order.
pub struct TwoListQueueIterator<'a, T> {
    front: super::PersistentListIterator<'a, T>,
    back: std::vec::IntoIter<&'a T>,
}

impl<'a, T> Iterator for TwoListQueueIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.front.next().or_else(|| self.back.next())
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Clone for TwoListQueue<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            front: self.front.clone(),
            back: self.back.clone(),
        }
    }
}

impl<T> Default for TwoListQueue<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialEq> PartialEq for TwoListQueue<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq> Eq for TwoListQueue<T> {}

impl<T: fmt::Debug> fmt::Debug for TwoListQueue<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
