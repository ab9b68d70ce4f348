//! Binary entry point for the ropify CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Move the definition at byte offset 120 of foo.py into bar.py
//! ropify move foo.py 120 --destination bar.py
//!
//! # Move a module into a package (prompts for the package when omitted)
//! ropify move-module util.py --destination pkg
//!
//! # List import statements that provide a name
//! ropify show-imports slugify
//! ```

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};

use ropify::commands::{
    run_move_definition, run_move_module, run_show_imports, MoveDefinitionArgs, MoveModuleArgs,
    ShowImportsArgs,
};
use ropify::terminal::TerminalPrompter;
use ropify_core::config::Config;
use ropify_core::engine::{Engine, ProjectOptions, ProjectSession};
use ropify_core::error::RopifyError;
use ropify_rope::{ResolutionOptions, RopeEngine};

// ============================================================================
// CLI Structure
// ============================================================================

/// Move Python definitions and modules with rope.
#[derive(Parser, Debug)]
#[command(name = "ropify", version, about = "Move Python definitions and modules with rope")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Python interpreter with rope installed.
    #[arg(long, global = true)]
    python: Option<PathBuf>,

    /// Log level for tracing output (RUST_LOG takes precedence).
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

/// Options naming the project every subcommand works on.
#[derive(Args, Debug, Clone)]
struct ProjectArgs {
    /// The project to work on.
    #[arg(long, default_value = ".", value_parser = existing_dir)]
    project: PathBuf,

    /// The location of the rope folder relative to the project root.
    #[arg(long)]
    ropefolder: Option<String>,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Move the definition of a class or function to another file.
    #[command(visible_aliases = ["move-symbol", "move-definition"])]
    Move {
        /// The file containing the definition.
        #[arg(value_parser = existing_file)]
        resource: PathBuf,

        /// Zero-based byte offset of the definition in the file.
        offset: usize,

        /// The file to move the definition to.
        #[arg(long)]
        destination: Option<PathBuf>,

        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Move a module into another package.
    MoveModule {
        /// The module file (or package directory) to move.
        #[arg(value_parser = existing_path)]
        resource: PathBuf,

        /// The package to move the module to.
        #[arg(long)]
        destination: Option<PathBuf>,

        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Show import statements that provide a name.
    #[command(visible_alias = "show-autoimports")]
    ShowImports {
        /// The name to look up.
        name: String,

        #[command(flatten)]
        project: ProjectArgs,
    },
}

impl Command {
    fn project(&self) -> &ProjectArgs {
        match self {
            Command::Move { project, .. }
            | Command::MoveModule { project, .. }
            | Command::ShowImports { project, .. } => project,
        }
    }
}

fn existing_dir(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.is_dir() {
        Ok(path)
    } else {
        Err(format!("directory '{}' does not exist", s))
    }
}

fn existing_file(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.is_file() {
        Ok(path)
    } else if path.is_dir() {
        Err(format!("'{}' is a directory, expected a file", s))
    } else {
        Err(format!("file '{}' does not exist", s))
    }
}

fn existing_path(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.exists() {
        Ok(path)
    } else {
        Err(format!("path '{}' does not exist", s))
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::from(err.exit_status().code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Guards are part of the report; everything else is a diagnostic.
fn report_error(err: &RopifyError) {
    if err.is_guard() {
        println!("{}", err);
        return;
    }
    eprintln!("error: {}", err);
    if let Some(traceback) = err.traceback() {
        eprintln!("{}", traceback.trim_end());
    }
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), RopifyError> {
    let project = cli.command.project();
    let config = Config::load_from_project(&project.project)?;

    let engine = RopeEngine::new(ResolutionOptions {
        python_path: cli.global.python.clone(),
        config_python: config.python(&project.project),
    });
    let options = ProjectOptions::new(&project.project)
        .with_ropefolder(config.ropefolder(project.ropefolder.as_deref()));
    let mut session = engine.open(&options)?;

    dispatch(cli.command, &config, session.as_mut())
}

fn dispatch(
    command: Command,
    config: &Config,
    session: &mut dyn ProjectSession,
) -> Result<(), RopifyError> {
    let mut out = io::stdout();
    match command {
        Command::Move {
            resource,
            offset,
            destination,
            ..
        } => run_move_definition(
            session,
            &TerminalPrompter::stdio(),
            &mut out,
            &MoveDefinitionArgs {
                resource,
                offset,
                destination,
            },
        ),
        Command::MoveModule {
            resource,
            destination,
            ..
        } => run_move_module(
            session,
            &TerminalPrompter::stdio(),
            &mut out,
            &MoveModuleArgs {
                resource,
                destination,
            },
        ),
        Command::ShowImports { name, .. } => run_show_imports(
            session,
            &mut out,
            &ShowImportsArgs {
                name,
                vendor_prefixes: config.ropify.vendor_prefixes.clone(),
            },
        ),
    }
}
