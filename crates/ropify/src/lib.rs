//! ropify - move refactorings for Python projects from the command line.
//!
//! ## Modules
//!
//! - `commands` - Command handlers (move, move-module, show-imports)
//! - `terminal` - Line-based prompter for missing destinations

pub mod commands;
pub mod terminal;

pub use ropify_core::error::{ExitStatus, RopifyError, RopifyResult};
