//! One step of a stack-safe fold.
//!
//! [`Program::fold_stack_safe`](super::Program::fold_stack_safe) does not run
//! a program; it translates it one effect at a time. Each [`Step`] is either
//! the translated final value or the translated next effect together with a
//! resumption that produces the following step once the effect's result is
//! known. Whoever drives the steps decides when (and whether) effects run.

use std::any::{Any, type_name};
use std::fmt;

/// Resumption of a [`Step::Next`]: receives the effect's result.
pub type Resume<M> = Box<dyn FnOnce(Box<dyn Any>) -> M>;

/// A single step of a stack-safe fold.
///
/// # Type Parameters
///
/// * `N` - Translation of one effect
/// * `M` - Translation of the final value
///
/// # Examples
///
/// ```rust
/// use std::any::Any;
///
/// use catfree::control::{Program, Step};
///
/// enum Ask {
///     Number,
/// }
///
/// let program: Program<Ask, i32> = Program::lift(Ask::Number).map(|x: i32| x + 1);
/// let step: Step<&'static str, i32> =
///     program.fold_stack_safe(|value| value, |Ask::Number| "number please");
///
/// let result = step.run(|request| {
///     assert_eq!(request, "number please");
///     Box::new(41_i32) as Box<dyn Any>
/// });
/// assert_eq!(result, 42);
/// ```
pub enum Step<N, M> {
    /// The fold is finished.
    Done(M),
    /// One translated effect, and how to continue once it has a result.
    Next(N, Resume<Self>),
}

impl<N, M> Step<N, M> {
    /// Returns `true` if no effect is left.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// Drives every step to completion.
    ///
    /// `force` turns each translated effect into its result. The driver is an
    /// explicit loop, so any number of steps runs in constant stack space.
    pub fn run<F>(self, mut force: F) -> M
    where
        F: FnMut(N) -> Box<dyn Any>,
    {
        let span = tracing::debug_span!("run_steps", result = type_name::<M>());
        let _entered = span.enter();

        let mut effects: u64 = 0;
        let mut current = self;
        loop {
            match current {
                Self::Done(value) => {
                    tracing::debug!(effects, "steps finished");
                    return value;
                }
                Self::Next(effect, resume) => {
                    effects += 1;
                    current = resume(force(effect));
                }
            }
        }
    }
}

impl<N: fmt::Debug, M: fmt::Debug> fmt::Debug for Step<N, M> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done(value) => formatter.debug_tuple("Done").field(value).finish(),
            Self::Next(effect, _) => formatter
                .debug_tuple("Next")
                .field(effect)
                .field(&"<resume>")
                .finish(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
