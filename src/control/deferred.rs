//! Deferred computations.
//!
//! [`Deferred<A>`] wraps a computation that produces an `A` when forced and
//! does nothing before that. It is the target type of
//! [`Program::into_deferred`](super::Program::into_deferred): folding a
//! program into `Deferred` yields a value that performs every effect only
//! when [`force`](Deferred::force) is called.
//!
//! # Examples
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use catfree::control::Deferred;
//!
//! let calls = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&calls);
//! let deferred = Deferred::new(move || {
//!     counter.set(counter.get() + 1);
//!     21
//! })
//! .map(|x| x * 2);
//!
//! assert_eq!(calls.get(), 0); // Nothing has run yet
//! assert_eq!(deferred.force(), 42);
//! assert_eq!(calls.get(), 1);
//! ```

use std::any::Any;
use std::fmt;

use super::Step;

/// A computation that runs when forced.
///
/// Forcing consumes the value, so a `Deferred` runs at most once.
pub struct Deferred<A> {
    thunk: Box<dyn FnOnce() -> A>,
}

impl<A> Deferred<A> {
    /// Creates a deferred computation from a thunk.
    #[must_use]
    pub fn new<F>(thunk: F) -> Self
    where
        F: FnOnce() -> A + 'static,
    {
        Self {
            thunk: Box::new(thunk),
        }
    }

    /// Wraps an already computed value.
    #[must_use]
    pub fn now(value: A) -> Self
    where
        A: 'static,
    {
        Self::new(move || value)
    }

    /// Runs the computation and returns its result.
    pub fn force(self) -> A {
        (self.thunk)()
    }

    /// Transforms the result without forcing.
    #[must_use]
    pub fn map<B, F>(self, function: F) -> Deferred<B>
    where
        A: 'static,
        F: FnOnce(A) -> B + 'static,
    {
        Deferred::new(move || function(self.force()))
    }

    /// Chains another deferred computation on the result without forcing.
    ///
    /// Forcing the result forces `self`, then the computation returned by
    /// `function`. Each link adds one frame while forcing, so long chains
    /// should be driven through [`unwind`](Deferred::unwind) instead.
    #[must_use]
    pub fn flat_map<B, F>(self, function: F) -> Deferred<B>
    where
        A: 'static,
        F: FnOnce(A) -> Deferred<B> + 'static,
    {
        Deferred::new(move || function(self.force()).force())
    }
}

impl<A: 'static> Deferred<A> {
    /// Stack-safe driver for a fold into `Deferred`.
    ///
    /// Returns a deferred computation that, when forced, runs the whole step
    /// chain in one loop, forcing each effect in turn.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::any::Any;
    ///
    /// use catfree::control::{Deferred, Program};
    ///
    /// enum Ask {
    ///     Number,
    /// }
    ///
    /// let program: Program<Ask, i32> = Program::lift(Ask::Number).map(|x: i32| x * 2);
    /// let deferred = program.fold_with_unwind(
    ///     |Ask::Number| Deferred::new(|| Box::new(21_i32) as Box<dyn Any>),
    ///     Deferred::now,
    ///     Deferred::unwind,
    /// );
    /// assert_eq!(deferred.force(), 42);
    /// ```
    #[must_use]
    pub fn unwind(step: Step<Deferred<Box<dyn Any>>, Self>) -> Self {
        Self::new(move || step.run(Deferred::force).force())
    }
}

impl<A> fmt::Debug for Deferred<A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_tuple("Deferred").field(&"<thunk>").finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[rstest]
    fn test_now_forces_to_value() {
        assert_eq!(Deferred::now(7).force(), 7);
    }

    #[rstest]
    fn test_new_does_not_run_before_force() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let writer = Rc::clone(&log);
        let deferred = Deferred::new(move || writer.borrow_mut().push("ran"));
        assert!(log.borrow().is_empty());
        deferred.force();
        assert_eq!(*log.borrow(), vec!["ran"]);
    }

    #[rstest]
    fn test_flat_map_runs_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let first_writer = Rc::clone(&log);
        let second_writer = Rc::clone(&log);
        let deferred = Deferred::new(move || {
            first_writer.borrow_mut().push(1);
            10
        })
        .flat_map(move |x| {
            Deferred::new(move || {
                second_writer.borrow_mut().push(2);
                x + 1
            })
        });
        assert!(log.borrow().is_empty());
        assert_eq!(deferred.force(), 11);
        assert_eq!(*log.borrow(), vec![1, 2]);
    }

    #[rstest]
    fn test_unwind_defers_all_effects() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let writer = Rc::clone(&log);
        let step: Step<Deferred<Box<dyn Any>>, Deferred<&str>> = Step::Next(
            Deferred::new(move || {
                writer.borrow_mut().push("effect");
                Box::new(()) as Box<dyn Any>
            }),
            Box::new(|_| Step::Done(Deferred::now("finished"))),
        );
        let deferred = Deferred::unwind(step);
        assert!(log.borrow().is_empty());
        assert_eq!(deferred.force(), "finished");
        assert_eq!(*log.borrow(), vec!["effect"]);
    }

    #[rstest]
    fn test_debug_hides_thunk() {
        assert_eq!(format!("{:?}", Deferred::now(1)), r#"Deferred("<thunk>")"#);
    }
}
