//! Type-erased values and continuations.
//!
//! A [`Program`] chains continuations whose input and output types differ
//! from link to link. To keep all of them in one
//! [`CatenableSequence`](crate::persistent::CatenableSequence), each
//! continuation is stored as a [`Continuation`] trait object that accepts a
//! `Box<dyn Any>` and produces a `Program<E, Erased>`.
//!
//! The boundary has two halves:
//!
//! - **erase**: effect handlers return their result as `Box<dyn Any>`;
//! - **restore**: the arrow installed when the effect was lifted downcasts
//!   that box back to the result type chosen at `lift` time.
//!
//! # Contract
//!
//! - `invoke` may be called any number of times (programs are persistent)
//! - Input type must match the type fixed when the arrow was built,
//!   otherwise the boundary panics with a message naming the expected type

use std::any::{Any, type_name};
use std::marker::PhantomData;

use super::program::{Erased, Program};
use crate::persistent::ReferenceCounter;

// =============================================================================
// Sharing Bound
// =============================================================================

/// Bound placed on every value and closure stored inside a [`Program`].
///
/// With the `arc` feature this is `Send + Sync`, so programs built from
/// shareable parts can cross threads. Without it the bound is empty.
#[cfg(feature = "arc")]
pub trait Shareable: Send + Sync {}

#[cfg(feature = "arc")]
impl<T: ?Sized + Send + Sync> Shareable for T {}

/// Bound placed on every value and closure stored inside a [`Program`].
///
/// With the `arc` feature this is `Send + Sync`, so programs built from
/// shareable parts can cross threads. Without it the bound is empty.
#[cfg(not(feature = "arc"))]
pub trait Shareable {}

#[cfg(not(feature = "arc"))]
impl<T: ?Sized> Shareable for T {}

// =============================================================================
// Erased Values
// =============================================================================

/// A pure value whose concrete type has been hidden.
///
/// Values are cloned out when the owning node is shared, and moved out when
/// the node is uniquely owned.
pub(crate) trait ErasedValue: Shareable {
    fn into_any(self: ReferenceCounter<Self>) -> Box<dyn Any>;
}

impl<T: Any + Clone + Shareable> ErasedValue for T {
    fn into_any(self: ReferenceCounter<Self>) -> Box<dyn Any> {
        match ReferenceCounter::try_unwrap(self) {
            Ok(value) => Box::new(value),
            Err(shared) => Box::new(T::clone(&shared)),
        }
    }
}

pub(crate) const EFFECT_RESULT: &str = "effect result type mismatch at lift boundary";
pub(crate) const CONTINUATION_INPUT: &str = "continuation input type mismatch";
pub(crate) const FINAL_RESULT: &str = "final result type mismatch";

/// Restores an erased value to `A`.
///
/// # Panics
///
/// Panics with `boundary` and the expected type name if the box does not hold
/// an `A`. Only a handler that answers an effect with the wrong type can get
/// here.
pub(crate) fn restore<A: 'static>(value: Box<dyn Any>, boundary: &'static str) -> A {
    match value.downcast::<A>() {
        Ok(value) => *value,
        Err(_) => panic!("{boundary}: expected `{}`", type_name::<A>()),
    }
}

// =============================================================================
// Continuations
// =============================================================================

/// A continuation with its input and output types erased.
pub(crate) trait Continuation<E>: Shareable {
    fn invoke(&self, input: Box<dyn Any>) -> Program<E, Erased>;
}

/// Shared handle to a type-erased continuation.
pub(crate) type Arrow<E> = ReferenceCounter<dyn Continuation<E>>;

/// `A -> Program<E, B>` supplied to `flat_map`.
pub(crate) struct FlatMapArrow<A, B, F> {
    function: F,
    _types: PhantomData<fn(A) -> B>,
}

impl<A, B, F> FlatMapArrow<A, B, F> {
    pub(crate) const fn new(function: F) -> Self {
        Self {
            function,
            _types: PhantomData,
        }
    }
}

impl<E, A: 'static, B, F> Continuation<E> for FlatMapArrow<A, B, F>
where
    F: Fn(A) -> Program<E, B> + Shareable,
{
    fn invoke(&self, input: Box<dyn Any>) -> Program<E, Erased> {
        let value = restore::<A>(input, CONTINUATION_INPUT);
        (self.function)(value).erase()
    }
}

/// `a -> pure(a)` installed by `lift`; restores the handler result by downcast.
pub(crate) struct RestoreArrow<A>(PhantomData<fn() -> A>);

impl<A> RestoreArrow<A> {
    pub(crate) const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E, A> Continuation<E> for RestoreArrow<A>
where
    A: Clone + Shareable + 'static,
{
    fn invoke(&self, input: Box<dyn Any>) -> Program<E, Erased> {
        Program::<E, A>::pure(restore::<A>(input, EFFECT_RESULT)).erase()
    }
}

/// `a -> pure(extract(a))` installed by `lift_instruction`.
pub(crate) struct ExtractArrow<A, X> {
    extract: X,
    _result: PhantomData<fn() -> A>,
}

impl<A, X> ExtractArrow<A, X> {
    pub(crate) const fn new(extract: X) -> Self {
        Self {
            extract,
            _result: PhantomData,
        }
    }
}

impl<E, A, X> Continuation<E> for ExtractArrow<A, X>
where
    A: Clone + Shareable + 'static,
    X: Fn(Box<dyn Any>) -> A + Shareable,
{
    fn invoke(&self, input: Box<dyn Any>) -> Program<E, Erased> {
        Program::<E, A>::pure((self.extract)(input)).erase()
    }
}

// =============================================================================
// Tests
// =============================================================================
