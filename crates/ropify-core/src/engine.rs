//! Refactoring engine capability traits.
//!
//! Command handlers never talk to the refactoring library directly. They
//! drive a [`ProjectSession`] obtained from an [`Engine`], which exposes only
//! the operations the CLI needs:
//!
//! - resolve a path to a [`Resource`]
//! - begin a move anchored at a resource (and optional offset)
//! - compute a [`ChangeSet`] for a destination, then apply it
//! - query the name index for import candidates
//!
//! The rope-backed implementation lives in `ropify-rope`. Tests use
//! in-memory doubles.

use std::path::{Path, PathBuf};

use crate::error::RopifyResult;
use crate::resource::{resolve_resource, Resource, ResourceKind};

/// Options for opening a project session.
#[derive(Debug, Clone)]
pub struct ProjectOptions {
    /// Project root directory.
    pub root: PathBuf,
    /// Metadata folder override, relative to the root.
    pub ropefolder: Option<String>,
}

impl ProjectOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ProjectOptions {
            root: root.into(),
            ropefolder: None,
        }
    }

    pub fn with_ropefolder(mut self, ropefolder: Option<String>) -> Self {
        self.ropefolder = ropefolder;
        self
    }
}

/// What a move operation relocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// A module-level class, function or variable.
    Global,
    /// A whole module (or a name that resolves to an imported module).
    Module,
    /// A method; needs an attribute destination, not a file.
    Method,
}

/// A move operation built by the engine, not yet bound to a destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    /// Engine-side handle for the pending operation.
    pub handle: String,
    /// Human-readable name of the thing being moved.
    pub name: String,
    pub kind: MoveKind,
    /// Resource currently defining the symbol or module.
    pub origin: Resource,
}

/// A computed, not yet applied, set of file edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    /// Engine-side handle for the pending change set.
    pub handle: String,
    /// Engine description of the refactoring.
    pub description: String,
    /// Project-relative paths the change set touches.
    pub changed: Vec<String>,
}

/// An open session over an analyzable codebase.
pub trait ProjectSession {
    /// Canonical project root.
    fn root(&self) -> &Path;

    /// Map a file-system path to a project resource.
    fn resolve(&self, path: &Path, hint: ResourceKind) -> RopifyResult<Resource> {
        resolve_resource(self.root(), path, hint)
    }

    /// Build a move operation. `offset` is a character offset into the
    /// resource; `None` moves the whole module.
    fn begin_move(&mut self, resource: &Resource, offset: Option<usize>)
        -> RopifyResult<MovePlan>;

    /// Whether the engine treats `resource` as a Python source file.
    fn is_source_file(&mut self, resource: &Resource) -> RopifyResult<bool>;

    /// Compute the change set moving `plan` to `destination`.
    fn changes_for(&mut self, plan: &MovePlan, destination: &Resource) -> RopifyResult<ChangeSet>;

    /// Apply a change set to disk.
    fn apply(&mut self, changes: &ChangeSet) -> RopifyResult<()>;

    /// Fully-qualified module names that define `name`, in engine order.
    fn import_candidates(&mut self, name: &str) -> RopifyResult<Vec<String>>;
}

/// Factory for project sessions.
pub trait Engine {
    fn open(&self, options: &ProjectOptions) -> RopifyResult<Box<dyn ProjectSession>>;
}
