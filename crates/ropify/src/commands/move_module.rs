//! Implementation of the `ropify move-module` command
//!
//! Moves a whole module (or package) into another package.

use std::io::Write;
use std::path::PathBuf;

use ropify_core::engine::ProjectSession;
use ropify_core::error::{RopifyError, RopifyResult};
use ropify_core::interaction::Prompter;
use ropify_core::resource::ResourceKind;

/// Prompt used when no `--destination` was given.
pub const DESTINATION_PROMPT: &str = "Enter the new package for the module";

/// Guard message for a destination that is not a folder.
pub const NOT_A_FOLDER: &str = "The destination must be a folder";

/// Parsed arguments for `ropify move-module`.
#[derive(Debug, Clone)]
pub struct MoveModuleArgs {
    /// Module file or package directory to move.
    pub resource: PathBuf,
    /// Target package; may not exist yet.
    pub destination: Option<PathBuf>,
}

/// Run the move-module command
pub fn run_move_module(
    session: &mut dyn ProjectSession,
    prompter: &dyn Prompter,
    out: &mut dyn Write,
    args: &MoveModuleArgs,
) -> RopifyResult<()> {
    let resource = session.resolve(&args.resource, ResourceKind::File)?;
    let plan = session.begin_move(&resource, None)?;

    writeln!(out, "Moving module `{}`", plan.name)?;
    writeln!(out, "Module `{}` is currently at: {}", plan.name, plan.origin)?;

    let destination_path = match &args.destination {
        Some(path) => path.clone(),
        None => PathBuf::from(prompter.ask_text(DESTINATION_PROMPT)?),
    };

    let destination = session.resolve(&destination_path, ResourceKind::Folder)?;
    if !destination.is_folder() {
        return Err(RopifyError::guard(NOT_A_FOLDER));
    }
    if !destination.exists() {
        tracing::info!(package = %destination, "destination package does not exist yet");
    }

    let changes = session.changes_for(&plan, &destination)?;
    tracing::debug!(description = %changes.description, files = ?changes.changed, "computed module move");
    session.apply(&changes)?;

    writeln!(out, "Module `{}` moved to: {}", plan.name, destination)?;
    Ok(())
}
