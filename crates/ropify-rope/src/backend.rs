//! Rope implementation of the engine capability traits.
//!
//! [`RopeEngine`] resolves an interpreter, spawns a worker and opens the
//! project in it. The resulting [`RopeSession`] forwards each operation to
//! the worker and maps its responses onto `ropify-core` types.

use std::path::{Path, PathBuf};

use ropify_core::engine::{ChangeSet, Engine, MoveKind, MovePlan, ProjectOptions, ProjectSession};
use ropify_core::error::{RopifyError, RopifyResult};
use ropify_core::resource::{Resource, ResourceKind};

use crate::env::{resolve_python, ResolutionOptions};
use crate::worker::{spawn_worker, ChangesInfo, MoveInfo, WorkerHandle};

/// Engine that runs rope in a Python worker process.
#[derive(Debug, Clone, Default)]
pub struct RopeEngine {
    options: ResolutionOptions,
}

impl RopeEngine {
    pub fn new(options: ResolutionOptions) -> Self {
        RopeEngine { options }
    }
}

impl Engine for RopeEngine {
    fn open(&self, options: &ProjectOptions) -> RopifyResult<Box<dyn ProjectSession>> {
        let python = resolve_python(&self.options)?;
        let root = options.root.canonicalize().map_err(|e| {
            RopifyError::invalid_args(format!(
                "project root {} cannot be opened: {}",
                options.root.display(),
                e
            ))
        })?;

        let mut worker = spawn_worker(python.interpreter())?;
        let reported = worker.open_project(&root, options.ropefolder.as_deref())?;
        tracing::info!(
            root = %root.display(),
            python = %python.version(),
            rope = python.rope_version().unwrap_or("unknown"),
            "opened rope project"
        );
        tracing::debug!(
            reported = %reported,
            worker = worker.worker_version().unwrap_or("unknown"),
            "rope project address"
        );

        Ok(Box::new(RopeSession { root, worker }))
    }
}

/// An open rope project backed by a live worker.
pub struct RopeSession {
    root: PathBuf,
    worker: WorkerHandle,
}

impl ProjectSession for RopeSession {
    fn root(&self) -> &Path {
        &self.root
    }

    fn begin_move(&mut self, resource: &Resource, offset: Option<usize>) -> RopifyResult<MovePlan> {
        let info = self.worker.create_move(resource.path(), offset)?;
        plan_from_info(info)
    }

    fn is_source_file(&mut self, resource: &Resource) -> RopifyResult<bool> {
        Ok(self
            .worker
            .is_python_file(resource.path(), kind_param(resource.kind()))?)
    }

    fn changes_for(&mut self, plan: &MovePlan, destination: &Resource) -> RopifyResult<ChangeSet> {
        let info = self.worker.get_changes(
            &plan.handle,
            destination.path(),
            kind_param(destination.kind()),
        )?;
        Ok(change_set_from_info(info))
    }

    fn apply(&mut self, changes: &ChangeSet) -> RopifyResult<()> {
        self.worker.apply_changes(&changes.handle)?;
        tracing::info!(files = changes.changed.len(), "applied change set");
        Ok(())
    }

    fn import_candidates(&mut self, name: &str) -> RopifyResult<Vec<String>> {
        Ok(self.worker.import_candidates(name)?)
    }
}

fn kind_param(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::File => "file",
        ResourceKind::Folder => "folder",
    }
}

fn parse_kind(kind: &str) -> RopifyResult<MoveKind> {
    match kind {
        "global" => Ok(MoveKind::Global),
        "module" => Ok(MoveKind::Module),
        "method" => Ok(MoveKind::Method),
        other => Err(RopifyError::internal(format!(
            "worker reported unknown move kind {:?}",
            other
        ))),
    }
}

fn plan_from_info(info: MoveInfo) -> RopifyResult<MovePlan> {
    let kind = parse_kind(&info.kind)?;
    // Packages are moved as their folder, everything else lives in a file.
    let origin_kind = if kind == MoveKind::Module && !info.origin.ends_with(".py") {
        ResourceKind::Folder
    } else {
        ResourceKind::File
    };
    Ok(MovePlan {
        handle: info.handle,
        name: info.name,
        kind,
        origin: Resource::new(info.origin, origin_kind),
    })
}

fn change_set_from_info(info: ChangesInfo) -> ChangeSet {
    ChangeSet {
        handle: info.handle,
        description: info.description,
        changed: info.changed,
    }
}
