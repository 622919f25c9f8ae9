//! # catfree
//!
//! Stack-safe free programs over persistent catenable sequences.
//!
//! ## Overview
//!
//! A host describes its side effects as an ordinary Rust type and builds
//! [`Program`](control::Program)s from them: pure values, lifted effects and
//! `flat_map` chains. A program is data; interpreters decide what its effects
//! mean. Binding is O(1) because continuations live in a persistent
//! catenable sequence, and every interpreter that needs to be stack-safe runs
//! as an explicit loop.
//!
//! - **Persistent Collections**: `PersistentList`, `TwoListQueue`,
//!   `CatenableSequence`
//! - **Programs**: `pure`, `lift`, `flat_map`, `map`, `then`
//! - **Interpreters**: `execute`, `try_execute`, `fold_into`,
//!   `fold_stack_safe`, `fold_with_unwind`, `into_deferred`
//!
//! ## Feature Flags
//!
//! - `persistent`: Persistent collections
//! - `control`: Programs and interpreters (implies `persistent`)
//! - `arc`: Share nodes with `Arc` and require `Send + Sync` contents
//!
//! ## Example
//!
//! ```rust
//! use catfree::prelude::*;
//!
//! enum Console {
//!     Print(String),
//! }
//!
//! fn print(line: &str) -> Program<Console, ()> {
//!     Program::lift(Console::Print(line.to_string()))
//! }
//!
//! let program = print("A").then(print("B")).then(Program::pure(42));
//!
//! let mut printed = Vec::new();
//! let result = program.execute(|Console::Print(line)| {
//!     printed.push(line.clone());
//!     Box::new(())
//! });
//!
//! assert_eq!(result, 42);
//! assert_eq!(printed, vec!["A", "B"]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// Note: Disabling redundant_closure_for_method_calls due to clippy 0.1.92 panic bug
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and traits.
///
/// # Usage
///
/// ```rust
/// use catfree::prelude::*;
/// ```
pub mod prelude {

    #[cfg(feature = "control")]
    pub use crate::control::*;

    #[cfg(feature = "persistent")]
    pub use crate::persistent::*;
}

#[cfg(feature = "control")]
pub mod control;

#[cfg(feature = "persistent")]
pub mod persistent;
