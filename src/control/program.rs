//! Free programs over an arbitrary effect signature.
//!
//! A [`Program<E, V>`] describes a computation as data: either a finished
//! value, or a suspended effect of type `E` together with what to do with its
//! result. Interpreting it is a separate step (see the interpreters on
//! [`Program`] in this module's sibling `interpret`).
//!
//! # Design
//!
//! ```text
//! Program<E, V> = RawNode       Done(value) | Suspended(effect, resume)
//!               + continuations CatenableSequence<erased A -> Program<E, B>>
//! ```
//!
//! `flat_map` never touches the raw node: it appends one continuation to the
//! catenable sequence in O(1). Normalization later pulls continuations off
//! the front one at a time, so left-nested and right-nested chains of binds
//! cost the same and nothing recurses per bind.
//!
//! # Examples
//!
//! ```rust
//! use catfree::control::Program;
//!
//! #[derive(Debug)]
//! enum Counter {
//!     Increment(u64),
//! }
//!
//! fn increment(value: u64) -> Program<Counter, u64> {
//!     Program::lift(Counter::Increment(value))
//! }
//!
//! let program = increment(0)
//!     .flat_map(increment)
//!     .flat_map(increment)
//!     .map(|count| count * 10);
//!
//! let result = program.execute(|effect| match effect {
//!     Counter::Increment(value) => Box::new(value + 1),
//! });
//! assert_eq!(result, 30);
//! ```

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use super::erasure::{
    Arrow, ErasedValue, ExtractArrow, FlatMapArrow, RestoreArrow, Shareable,
};
use crate::persistent::{CatenableSequence, ReferenceCounter};

/// Marker for the result type of a program whose type has been erased.
pub(crate) enum Erased {}

/// The raw node of a program.
enum RawNode<E> {
    Done(ReferenceCounter<dyn ErasedValue>),
    Suspended(ReferenceCounter<Suspension<E>>),
}

/// A suspended effect and the continuation receiving its result.
pub(crate) struct Suspension<E> {
    effect: E,
    resume: Arrow<E>,
}

/// A stack-safe free program yielding a value of type `V`.
///
/// # Type Parameters
///
/// * `E` - The effect signature (typically an enum of host operations)
/// * `V` - The result type of the program
///
/// # Laws
///
/// `Program` satisfies the Monad laws under every interpreter:
///
/// - **Left Identity**: `Program::pure(a).flat_map(f) == f(a)`
/// - **Right Identity**: `m.flat_map(Program::pure) == m`
/// - **Associativity**: `m.flat_map(f).flat_map(g) == m.flat_map(|x| f(x).flat_map(g))`
///
/// # Persistence
///
/// Programs are immutable. `clone` is O(1) and shares every node; combinators
/// build new programs around the shared parts. A program can be interpreted
/// any number of times, which is why values carried by a program must be
/// `Clone`.
///
/// # Stack Safety
///
/// `flat_map` is O(1) and non-recursive, and [`execute`](Program::execute)
/// runs in a loop, so programs of any length run in constant stack space.
pub struct Program<E, V> {
    node: RawNode<E>,
    continuations: CatenableSequence<Arrow<E>>,
    _result: PhantomData<fn() -> V>,
}

/// Canonical form produced by normalization.
pub(crate) enum Normalized<E> {
    /// No effect left; the erased final value.
    Done(Box<dyn Any>),
    /// The next effect to perform and how to continue afterwards.
    Suspended(Resumption<E>),
}

/// `Suspended(effect, a -> append_continuations(resume(a), pending))`.
pub(crate) struct Resumption<E> {
    suspension: ReferenceCounter<Suspension<E>>,
    pending: CatenableSequence<Arrow<E>>,
}

impl<E> Resumption<E> {
    /// The effect to hand to the interpreter.
    pub(crate) fn effect(&self) -> &E {
        &self.suspension.effect
    }

    /// Feeds the effect's result back in, yielding the rest of the program.
    pub(crate) fn resume<V>(self, value: Box<dyn Any>) -> Program<E, V> {
        self.suspension
            .resume
            .invoke(value)
            .append_continuations(&self.pending)
            .assume()
    }
}

impl<E, V> Program<E, V> {
    /// Lifts a pure value into a program (`return`/`pure`).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use catfree::control::Program;
    ///
    /// let program: Program<(), i32> = Program::pure(42);
    /// assert_eq!(program.execute(|()| Box::new(())), 42);
    /// ```
    #[must_use]
    pub fn pure(value: V) -> Self
    where
        V: Clone + Shareable + 'static,
    {
        Self {
            node: RawNode::Done(ReferenceCounter::new(value)),
            continuations: CatenableSequence::new(),
            _result: PhantomData,
        }
    }

    /// Returns `true` if the program is a bare value with nothing left to run.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self.node, RawNode::Done(_)) && self.continuations.is_empty()
    }

    /// Returns `true` if the program starts with an effect.
    #[must_use]
    pub const fn is_suspended(&self) -> bool {
        matches!(self.node, RawNode::Suspended(_))
    }

    pub(crate) fn erase(self) -> Program<E, Erased> {
        self.assume()
    }

    pub(crate) fn assume<W>(self) -> Program<E, W> {
        Program {
            node: self.node,
            continuations: self.continuations,
            _result: PhantomData,
        }
    }

    fn append_continuations(self, extra: &CatenableSequence<Arrow<E>>) -> Self {
        Self {
            node: self.node,
            continuations: self.continuations.link(extra),
            _result: PhantomData,
        }
    }

    /// Reduces the program to its next effect or its final value.
    ///
    /// Loops while the raw node is `Done`, feeding the value to the first
    /// pending continuation and prepending the continuation's own
    /// continuations to the remaining ones. Never mutates a shared node.
    pub(crate) fn normalize(self) -> Normalized<E> {
        let Self {
            mut node,
            mut continuations,
            ..
        } = self;

        loop {
            let value = match node {
                RawNode::Suspended(suspension) => {
                    return Normalized::Suspended(Resumption {
                        suspension,
                        pending: continuations,
                    });
                }
                RawNode::Done(value) => value,
            };

            let Some((next, rest)) = continuations.into_uncons() else {
                return Normalized::Done(value.into_any());
            };

            let Program {
                node: next_node,
                continuations: next_continuations,
                ..
            } = next.invoke(value.into_any());
            node = next_node;
            continuations = next_continuations.link(&rest);
        }
    }
}

impl<E: 'static, V: 'static> Program<E, V> {
    /// Lifts a single effect into a program that yields the effect's result.
    ///
    /// The handler must answer `effect` with a `Box<dyn Any>` holding a `V`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use catfree::control::Program;
    ///
    /// enum Console {
    ///     ReadLine,
    /// }
    ///
    /// let read: Program<Console, String> = Program::lift(Console::ReadLine);
    /// let line = read.execute(|Console::ReadLine| Box::new(String::from("hello")));
    /// assert_eq!(line, "hello");
    /// ```
    ///
    /// # Panics
    ///
    /// Interpreting the program panics if the handler answers with a value
    /// that is not a `V`.
    #[must_use]
    pub fn lift(effect: E) -> Self
    where
        V: Clone + Shareable,
    {
        let resume: Arrow<E> = ReferenceCounter::new(RestoreArrow::<V>::new());
        Self::suspended(effect, resume)
    }

    /// Lifts an effect with a custom restore function.
    ///
    /// `extract` converts the handler's type-erased answer into `V`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use catfree::control::Program;
    ///
    /// enum Command {
    ///     Ping,
    /// }
    ///
    /// let ping: Program<Command, bool> =
    ///     Program::lift_instruction(Command::Ping, |answer| answer.is::<()>());
    /// assert!(ping.execute(|Command::Ping| Box::new(())));
    /// ```
    #[must_use]
    pub fn lift_instruction<X>(effect: E, extract: X) -> Self
    where
        V: Clone + Shareable,
        X: Fn(Box<dyn Any>) -> V + Shareable + 'static,
    {
        let resume: Arrow<E> = ReferenceCounter::new(ExtractArrow::<V, X>::new(extract));
        Self::suspended(effect, resume)
    }

    fn suspended(effect: E, resume: Arrow<E>) -> Self {
        Self {
            node: RawNode::Suspended(ReferenceCounter::new(Suspension { effect, resume })),
            continuations: CatenableSequence::new(),
            _result: PhantomData,
        }
    }

    /// Chains a computation on the result (Monad `bind`).
    ///
    /// Appends `function` to the continuation sequence.
    ///
    /// # Complexity
    ///
    /// O(1) worst case, no recursion
    ///
    /// # Examples
    ///
    /// ```rust
    /// use catfree::control::Program;
    ///
    /// let program: Program<(), i32> = Program::pure(21).flat_map(|x| Program::pure(x * 2));
    /// assert_eq!(program.execute(|()| Box::new(())), 42);
    /// ```
    #[must_use]
    pub fn flat_map<B, F>(self, function: F) -> Program<E, B>
    where
        B: 'static,
        F: Fn(V) -> Program<E, B> + Shareable + 'static,
    {
        let arrow: Arrow<E> = ReferenceCounter::new(FlatMapArrow::<V, B, F>::new(function));
        Program {
            continuations: self.continuations.snoc(arrow),
            node: self.node,
            _result: PhantomData,
        }
    }

    /// Alias for [`flat_map`](Self::flat_map).
    #[inline]
    #[must_use]
    pub fn and_then<B, F>(self, function: F) -> Program<E, B>
    where
        B: 'static,
        F: Fn(V) -> Program<E, B> + Shareable + 'static,
    {
        self.flat_map(function)
    }

    /// Sequences two programs, discarding the result of the first.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use catfree::control::Program;
    ///
    /// let first: Program<(), &str> = Program::pure("ignored");
    /// let program = first.then(Program::pure(42));
    /// assert_eq!(program.execute(|()| Box::new(())), 42);
    /// ```
    #[must_use]
    pub fn then<B>(self, next: Program<E, B>) -> Program<E, B>
    where
        B: 'static,
        Program<E, B>: Shareable,
    {
        self.flat_map(move |_| next.clone())
    }

    /// Applies a function to the result (Functor `fmap`).
    ///
    /// Defined as `flat_map(|v| pure(function(v)))`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use catfree::control::Program;
    ///
    /// let program: Program<(), i32> = Program::pure(21).map(|x| x * 2);
    /// assert_eq!(program.execute(|()| Box::new(())), 42);
    /// ```
    #[must_use]
    pub fn map<B, F>(self, function: F) -> Program<E, B>
    where
        B: Clone + Shareable + 'static,
        F: Fn(V) -> B + Shareable + 'static,
    {
        self.flat_map(move |value| Program::pure(function(value)))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<E> Clone for RawNode<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Done(value) => Self::Done(ReferenceCounter::clone(value)),
            Self::Suspended(suspension) => Self::Suspended(ReferenceCounter::clone(suspension)),
        }
    }
}

impl<E, V> Clone for Program<E, V> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            continuations: self.continuations.clone(),
            _result: PhantomData,
        }
    }
}

impl<E: fmt::Debug, V> fmt::Debug for Program<E, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending = if self.continuations.is_empty() {
            "<none>"
        } else {
            "<sequence>"
        };
        match &self.node {
            RawNode::Done(_) => formatter
                .debug_struct("Done")
                .field("continuations", &pending)
                .finish(),
            RawNode::Suspended(suspension) => formatter
                .debug_struct("Suspended")
                .field("effect", &suspension.effect)
                .field("continuations", &pending)
                .finish(),
        }
    }
}

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(Program<String, i32>: Send, Sync, Shareable);

// =============================================================================
// Tests
// =============================================================================
