//! Implementation of the `ropify move` command
//!
//! Moves a module-level class, function or variable to another Python file
//! and rewrites its imports across the project.

use std::io::Write;
use std::path::PathBuf;

use ropify_core::engine::{MoveKind, ProjectSession};
use ropify_core::error::{RopifyError, RopifyResult};
use ropify_core::interaction::Prompter;
use ropify_core::resource::{engine_offset, ResourceKind};

/// Prompt used when no `--destination` was given.
pub const DESTINATION_PROMPT: &str = "Enter the new file for the definition";

/// Guard message for a destination that is not a Python file.
pub const NOT_A_PYTHON_FILE: &str = "The destination must be a python file";

/// Parsed arguments for `ropify move`.
#[derive(Debug, Clone)]
pub struct MoveDefinitionArgs {
    /// File containing the definition.
    pub resource: PathBuf,
    /// Zero-based byte offset of the definition's name.
    pub offset: usize,
    pub destination: Option<PathBuf>,
}

/// Run the move command
///
/// # Arguments
/// * `session` - Open project session
/// * `prompter` - Asks for the destination when `args.destination` is `None`
/// * `out` - Report stream
/// * `args` - Parsed command arguments
pub fn run_move_definition(
    session: &mut dyn ProjectSession,
    prompter: &dyn Prompter,
    out: &mut dyn Write,
    args: &MoveDefinitionArgs,
) -> RopifyResult<()> {
    let resource = session.resolve(&args.resource, ResourceKind::File)?;
    if resource.is_folder() {
        return Err(RopifyError::invalid_args(format!(
            "{} is a directory, expected a file",
            args.resource.display()
        )));
    }

    let data = std::fs::read(&args.resource)?;
    let offset = engine_offset(&data, args.offset)?;
    let plan = session.begin_move(&resource, Some(offset))?;

    match plan.kind {
        MoveKind::Global => {}
        MoveKind::Module => {
            return Err(RopifyError::guard(format!(
                "Cannot move module `{}` with this command; use `move-module` instead",
                plan.name
            )));
        }
        MoveKind::Method => {
            return Err(RopifyError::guard(format!(
                "Cannot move method `{}` to another file; only module-level definitions can be moved",
                plan.name
            )));
        }
    }

    writeln!(out, "Moving definition of `{}`", plan.name)?;
    writeln!(
        out,
        "Definition of `{}` is currently at: {}",
        plan.name, plan.origin
    )?;

    let destination_path = match &args.destination {
        Some(path) => path.clone(),
        None => PathBuf::from(prompter.ask_text(DESTINATION_PROMPT)?),
    };

    // Missing paths and directories fail the same guard as non-Python files.
    if !destination_path.is_file() {
        return Err(RopifyError::guard(NOT_A_PYTHON_FILE));
    }
    let destination = session.resolve(&destination_path, ResourceKind::File)?;
    if destination.is_folder() || !session.is_source_file(&destination)? {
        return Err(RopifyError::guard(NOT_A_PYTHON_FILE));
    }

    let changes = session.changes_for(&plan, &destination)?;
    tracing::debug!(description = %changes.description, files = ?changes.changed, "computed move");
    session.apply(&changes)?;

    writeln!(
        out,
        "Definition of `{}` moved to: {}",
        plan.name, destination
    )?;
    Ok(())
}
