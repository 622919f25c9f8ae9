//! Interpreters for [`Program`].
//!
//! | Interpreter        | Stack use            | Target                       |
//! |--------------------|----------------------|------------------------------|
//! | `execute`          | constant             | the result value             |
//! | `try_execute`      | constant             | `Result` of the result value |
//! | `fold_into`        | one frame per effect | any target type              |
//! | `fold_stack_safe`  | constant             | a chain of [`Step`]s         |
//! | `fold_with_unwind` | driver-dependent     | whatever `unwind` returns    |
//! | `into_deferred`    | constant             | [`Deferred`]                 |
//!
//! Interpreters consume the program; clone it first to run it again.

use std::any::{Any, type_name};
use std::convert::Infallible;
use std::rc::Rc;

use super::erasure::{FINAL_RESULT, restore};
use super::program::{Erased, Normalized};
use super::{Deferred, Program, Resume, Step};

impl<E: 'static, V: 'static> Program<E, V> {
    /// Runs the program, answering each effect with `unwrap`.
    ///
    /// Effects are handled in program order, each exactly once.
    ///
    /// # Panics
    ///
    /// Panics if `unwrap` answers an effect with a value of a type other than
    /// the one fixed when the effect was lifted. Panics raised by `unwrap`
    /// itself or by any continuation propagate unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use catfree::control::Program;
    ///
    /// enum Log {
    ///     Write(String),
    /// }
    ///
    /// fn write(line: &str) -> Program<Log, ()> {
    ///     Program::lift(Log::Write(line.to_string()))
    /// }
    ///
    /// let program = write("A").then(write("B")).then(Program::pure(42));
    ///
    /// let mut lines = Vec::new();
    /// let result = program.execute(|Log::Write(line)| {
    ///     lines.push(line.clone());
    ///     Box::new(())
    /// });
    ///
    /// assert_eq!(result, 42);
    /// assert_eq!(lines, vec!["A", "B"]);
    /// ```
    pub fn execute<H>(self, mut unwrap: H) -> V
    where
        H: FnMut(&E) -> Box<dyn Any>,
    {
        match self.try_execute(|effect| Ok::<_, Infallible>(unwrap(effect))) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Runs the program with a fallible handler.
    ///
    /// The first `Err` stops the run and is returned unchanged; no further
    /// effect is handled.
    ///
    /// # Panics
    ///
    /// Same as [`execute`](Self::execute).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use catfree::control::Program;
    ///
    /// enum Disk {
    ///     Read(&'static str),
    /// }
    ///
    /// fn read(path: &'static str) -> Program<Disk, String> {
    ///     Program::lift(Disk::Read(path))
    /// }
    ///
    /// let program = read("a.txt").flat_map(|a| read("b.txt").map(move |b| format!("{a}{b}")));
    ///
    /// let result = program.try_execute(|Disk::Read(path)| match *path {
    ///     "a.txt" => Ok(Box::new(String::from("a"))),
    ///     missing => Err(format!("{missing} not found")),
    /// });
    /// assert_eq!(result, Err(String::from("b.txt not found")));
    /// ```
    pub fn try_execute<H, Failure>(self, mut unwrap: H) -> Result<V, Failure>
    where
        H: FnMut(&E) -> Result<Box<dyn Any>, Failure>,
    {
        let span = tracing::debug_span!("execute", result = type_name::<V>());
        let _entered = span.enter();

        let mut effects: u64 = 0;
        let mut program = self.erase();
        loop {
            match program.normalize() {
                Normalized::Done(value) => {
                    tracing::debug!(effects, "program finished");
                    return Ok(restore(value, FINAL_RESULT));
                }
                Normalized::Suspended(resumption) => {
                    effects += 1;
                    match unwrap(resumption.effect()) {
                        Ok(answer) => program = resumption.resume(answer),
                        Err(failure) => {
                            tracing::debug!(effects, "handler failed");
                            return Err(failure);
                        }
                    }
                }
            }
        }
    }

    /// Translates the program into a target type, one effect at a time.
    ///
    /// - `effect_transform` translates an effect into an `N`;
    /// - `pure_transform` translates the final value into an `M`;
    /// - `combine` receives a translated effect and the rest of the
    ///   translation, and must produce the combined `M`.
    ///
    /// Each effect adds one frame when `combine` calls its continuation, so
    /// use this only for programs of bounded length. Prefer
    /// [`fold_with_unwind`](Self::fold_with_unwind) otherwise.
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
    /// let program: Program<Ask, i32> = Program::lift(Ask::Number).map(|x: i32| x + 1);
    /// let deferred: Deferred<i32> = program.fold_into(
    ///     |Ask::Number| Deferred::new(|| Box::new(1_i32) as Box<dyn Any>),
    ///     Deferred::now,
    ///     |effect, rest| effect.flat_map(rest),
    /// );
    /// assert_eq!(deferred.force(), 2);
    /// ```
    pub fn fold_into<N, M, T, P, C>(self, effect_transform: T, pure_transform: P, combine: C) -> M
    where
        M: 'static,
        T: Fn(&E) -> N + 'static,
        P: Fn(V) -> M + 'static,
        C: Fn(N, Resume<M>) -> M + 'static,
    {
        let algebra = Rc::new(Folding {
            effect_transform,
            pure_transform,
            combine,
        });
        fold_recursive::<E, V, N, M, T, P, C>(&algebra, self.erase())
    }

    /// Translates the program into a chain of [`Step`]s without running it.
    ///
    /// Each `Step::Next` carries one translated effect; nothing is translated
    /// past it until its resumption is called. Combined with an iterative
    /// driver such as [`Step::run`] or [`Deferred::unwind`], any number of
    /// effects is handled in constant stack space.
    pub fn fold_stack_safe<N, M, P, T>(self, pure_transform: P, effect_transform: T) -> Step<N, M>
    where
        N: 'static,
        M: 'static,
        P: Fn(V) -> M + 'static,
        T: Fn(&E) -> N + 'static,
    {
        let algebra = Rc::new(Stepping {
            effect_transform,
            pure_transform,
        });
        next_step::<E, V, N, M, T, P>(algebra, self.erase())
    }

    /// Folds the program with [`fold_stack_safe`](Self::fold_stack_safe)
    /// and hands the first step to `unwind`.
    ///
    /// Stack safety is that of `unwind`: [`Deferred::unwind`] and drivers built
    /// on [`Step::run`] loop, a driver that recurses on every step does not.
    /// The span opened here covers translating the first step only; the
    /// effect count is reported by [`Step::run`] once the steps are driven.
    pub fn fold_with_unwind<N, M, R, T, P, U>(
        self,
        effect_transform: T,
        pure_transform: P,
        unwind: U,
    ) -> R
    where
        N: 'static,
        M: 'static,
        T: Fn(&E) -> N + 'static,
        P: Fn(V) -> M + 'static,
        U: FnOnce(Step<N, M>) -> R,
    {
        let span = tracing::debug_span!("fold_with_unwind", result = type_name::<V>());
        let _entered = span.enter();
        unwind(self.fold_stack_safe(pure_transform, effect_transform))
    }

    /// Folds the program into a [`Deferred`] that runs every effect only when
    /// forced.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::any::Any;
    /// use std::cell::RefCell;
    /// use std::rc::Rc;
    ///
    /// use catfree::control::{Deferred, Program};
    ///
    /// enum Log {
    ///     Write(&'static str),
    /// }
    ///
    /// let program = Program::<Log, ()>::lift(Log::Write("A"))
    ///     .then(Program::<Log, ()>::lift(Log::Write("B")))
    ///     .then(Program::pure(42));
    ///
    /// let lines = Rc::new(RefCell::new(Vec::new()));
    /// let sink = Rc::clone(&lines);
    /// let deferred = program.into_deferred(move |Log::Write(line)| {
    ///     let sink = Rc::clone(&sink);
    ///     let line = *line;
    ///     Deferred::new(move || {
    ///         sink.borrow_mut().push(line);
    ///         Box::new(()) as Box<dyn Any>
    ///     })
    /// });
    ///
    /// assert!(lines.borrow().is_empty());
    /// assert_eq!(deferred.force(), 42);
    /// assert_eq!(*lines.borrow(), vec!["A", "B"]);
    /// ```
    pub fn into_deferred<T>(self, effect_transform: T) -> Deferred<V>
    where
        T: Fn(&E) -> Deferred<Box<dyn Any>> + 'static,
    {
        self.fold_with_unwind(effect_transform, Deferred::now, Deferred::unwind)
    }
}

struct Folding<T, P, C> {
    effect_transform: T,
    pure_transform: P,
    combine: C,
}

struct Stepping<T, P> {
    effect_transform: T,
    pure_transform: P,
}

fn fold_recursive<E, V, N, M, T, P, C>(
    algebra: &Rc<Folding<T, P, C>>,
    program: Program<E, Erased>,
) -> M
where
    E: 'static,
    V: 'static,
    M: 'static,
    T: Fn(&E) -> N + 'static,
    P: Fn(V) -> M + 'static,
    C: Fn(N, Resume<M>) -> M + 'static,
{
    match program.normalize() {
        Normalized::Done(value) => (algebra.pure_transform)(restore(value, FINAL_RESULT)),
        Normalized::Suspended(resumption) => {
            let effect = (algebra.effect_transform)(resumption.effect());
            let shared = Rc::clone(algebra);
            let rest: Resume<M> = Box::new(move |answer| {
                fold_recursive::<E, V, N, M, T, P, C>(&shared, resumption.resume(answer))
            });
            (algebra.combine)(effect, rest)
        }
    }
}

fn next_step<E, V, N, M, T, P>(algebra: Rc<Stepping<T, P>>, program: Program<E, Erased>) -> Step<N, M>
where
    E: 'static,
    V: 'static,
    N: 'static,
    M: 'static,
    T: Fn(&E) -> N + 'static,
    P: Fn(V) -> M + 'static,
{
    match program.normalize() {
        Normalized::Done(value) => Step::Done((algebra.pure_transform)(restore(value, FINAL_RESULT))),
        Normalized::Suspended(resumption) => {
            let effect = (algebra.effect_transform)(resumption.effect());
            Step::Next(
                effect,
                Box::new(move |answer| {
                    next_step::<E, V, N, M, T, P>(algebra, resumption.resume(answer))
                }),
            )
        }
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

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Tally {
        Add(i64),
        Total,
    }

    fn add(amount: i64) -> Program<Tally, ()> {
        Program::lift(Tally::Add(amount))
    }

    fn total() -> Program<Tally, i64> {
        Program::lift(Tally::Total)
    }

    fn handle(state: &RefCell<i64>, effect: &Tally) -> Box<dyn Any> {
        match effect {
            Tally::Add(amount) => {
                *state.borrow_mut() += amount;
                Box::new(())
            }
            Tally::Total => Box::new(*state.borrow()),
        }
    }

    fn sample() -> Program<Tally, i64> {
        add(3).then(add(4)).then(total()).map(|sum| sum * 10)
    }

    #[rstest]
    fn test_execute_returns_final_value() {
        let state = RefCell::new(0);
        assert_eq!(sample().execute(|effect| handle(&state, effect)), 70);
        assert_eq!(*state.borrow(), 7);
    }

    #[rstest]
    fn test_execute_pure_program_handles_nothing() {
        let mut calls = 0;
        let result = Program::<Tally, &str>::pure("done").execute(|_| {
            calls += 1;
            Box::new(())
        });
        assert_eq!(result, "done");
        assert_eq!(calls, 0);
    }

    #[rstest]
    fn test_try_execute_stops_at_first_failure() {
        let mut seen = Vec::new();
        let result = sample().try_execute(|effect| {
            seen.push(effect.clone());
            match effect {
                Tally::Add(4) => Err("rejected"),
                Tally::Add(_) => Ok(Box::new(()) as Box<dyn Any>),
                Tally::Total => Ok(Box::new(0_i64) as Box<dyn Any>),
            }
        });
        assert_eq!(result, Err("rejected"));
        assert_eq!(seen, vec![Tally::Add(3), Tally::Add(4)]);
    }

    #[rstest]
    fn test_fold_into_matches_execute() {
        let state = Rc::new(RefCell::new(0));
        let handler_state = Rc::clone(&state);
        let folded: Deferred<i64> = sample().fold_into(
            move |effect| {
                let state = Rc::clone(&handler_state);
                let effect = effect.clone();
                Deferred::new(move || handle(&state, &effect))
            },
            Deferred::now,
            |effect, rest| effect.flat_map(rest),
        );
        assert_eq!(*state.borrow(), 0);
        assert_eq!(folded.force(), 70);
        assert_eq!(*state.borrow(), 7);
    }

    #[rstest]
    fn test_fold_into_eager_target() {
        let state = Rc::new(RefCell::new(0));
        let handler_state = Rc::clone(&state);
        let result: i64 = sample().fold_into(
            move |effect| handle(&handler_state, effect),
            |value| value,
            |answer, rest| rest(answer),
        );
        assert_eq!(result, 70);
    }

    #[rstest]
    fn test_fold_stack_safe_yields_one_step_per_effect() {
        let step = sample().fold_stack_safe(|value| value, Tally::clone);
        let mut effects = Vec::new();
        let state = RefCell::new(0);
        let result = step.run(|effect| {
            effects.push(effect.clone());
            handle(&state, &effect)
        });
        assert_eq!(result, 70);
        assert_eq!(effects, vec![Tally::Add(3), Tally::Add(4), Tally::Total]);
    }

    #[rstest]
    fn test_fold_stack_safe_translates_lazily() {
        let translated = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&translated);
        let step = sample().fold_stack_safe(
            |value| value,
            move |effect: &Tally| {
                *counter.borrow_mut() += 1;
                effect.clone()
            },
        );
        assert_eq!(*translated.borrow(), 1);
        assert!(!step.is_done());
    }

    #[rstest]
    fn test_into_deferred_runs_nothing_until_forced() {
        let state = Rc::new(RefCell::new(0));
        let handler_state = Rc::clone(&state);
        let deferred = sample().into_deferred(move |effect| {
            let state = Rc::clone(&handler_state);
            let effect = effect.clone();
            Deferred::new(move || handle(&state, &effect))
        });
        assert_eq!(*state.borrow(), 0);
        assert_eq!(deferred.force(), 70);
        assert_eq!(*state.borrow(), 7);
    }

    #[rstest]
    #[should_panic(expected = "effect result type mismatch at lift boundary")]
    fn test_fold_stack_safe_wrong_answer_panics() {
        let step = total().fold_stack_safe(|value| value, |_| ());
        let _ = step.run(|()| Box::new("not a number"));
    }
}
