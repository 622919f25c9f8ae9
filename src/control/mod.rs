//! Free programs and their interpreters.
//!
//! This module provides:
//!
//! - [`Program`]: A persistent free program over a host-defined effect type
//! - [`Step`]: One step of a stack-safe fold, with [`Resume`] as its resumption
//! - [`Deferred`]: A computation that runs when forced, used as a fold target
//! - [`Shareable`]: The bound on everything stored inside a program
//!
//! # Examples
//!
//! ## Running a Program
//!
//! ```rust
//! use catfree::control::Program;
//!
//! #[derive(Debug)]
//! enum Store {
//!     Get,
//!     Put(i32),
//! }
//!
//! fn get() -> Program<Store, i32> {
//!     Program::lift(Store::Get)
//! }
//!
//! fn put(value: i32) -> Program<Store, ()> {
//!     Program::lift(Store::Put(value))
//! }
//!
//! let program = get().flat_map(|x| put(x * 2)).then(get());
//!
//! let mut state = 21;
//! let result = program.execute(|command| match command {
//!     Store::Get => Box::new(state),
//!     Store::Put(value) => {
//!         state = *value;
//!         Box::new(())
//!     }
//! });
//! assert_eq!(result, 42);
//! ```
//!
//! ## Stack Safety
//!
//! ```rust
//! use catfree::control::Program;
//!
//! let mut program: Program<(), u64> = Program::pure(0);
//! for _ in 0..100_000 {
//!     program = program.flat_map(|n| Program::pure(n + 1));
//! }
//! assert_eq!(program.execute(|()| Box::new(())), 100_000);
//! ```

mod deferred;
mod erasure;
mod interpret;
mod program;
mod step;

pub use deferred::Deferred;
pub use erasure::Shareable;
pub use program::Program;
pub use step::{Resume, Step};
