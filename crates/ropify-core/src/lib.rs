//! Core infrastructure for ropify.
//!
//! This crate provides the engine-agnostic pieces of the CLI:
//! - Error types and exit status mapping
//! - Project configuration (`.ropify/config.toml`)
//! - Path to resource resolution and offset conversion
//! - Engine capability traits (project session, move plans, change sets)
//! - Import candidate filtering and formatting
//! - Prompt abstraction for interactive destinations

pub mod config;
pub mod engine;
pub mod error;
pub mod imports;
pub mod interaction;
pub mod resource;

pub use config::{Config, RopifyConfig};
pub use engine::{ChangeSet, Engine, MoveKind, MovePlan, ProjectOptions, ProjectSession};
pub use error::{ExitStatus, RopifyError, RopifyResult};
pub use resource::{Resource, ResourceKind};
