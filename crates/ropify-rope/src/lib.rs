//! Rope support for ropify.
//!
//! The refactoring itself runs inside a Python worker process that imports
//! rope. This crate finds a suitable interpreter, spawns and talks to the
//! worker, and exposes it through the `ropify-core` engine traits.

pub mod backend;
pub mod env;
pub mod worker;

mod error_bridges;

pub use backend::{RopeEngine, RopeSession};
pub use env::{resolve_python, PythonEnv, ResolutionOptions};
