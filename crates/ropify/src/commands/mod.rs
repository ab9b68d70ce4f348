//! CLI command implementations
//!
//! Each handler drives an already-open [`ProjectSession`] and writes its
//! report lines to `out`. Guard failures come back as `RopifyError::Guard`;
//! the binary prints them on stdout and exits 1.
//!
//! [`ProjectSession`]: ropify_core::engine::ProjectSession

pub mod move_definition;
pub mod move_module;
pub mod show_imports;

pub use move_definition::{run_move_definition, MoveDefinitionArgs};
pub use move_module::{run_move_module, MoveModuleArgs};
pub use show_imports::{run_show_imports, ShowImportsArgs};
