//! Python environment resolution.
//!
//! This module finds an interpreter that can import rope.
//!
//! ## Resolution Order
//!
//! 1. Explicit `--python` flag (CLI override)
//! 2. `$ROPIFY_PYTHON` environment variable
//! 3. `python` key in `.ropify/config.toml`
//! 4. `$VIRTUAL_ENV/bin/python` (user's active venv)
//! 5. `$CONDA_PREFIX/bin/python` (user's active conda)
//! 6. `python3` / `python` from `$PATH` (fallback)
//!
//! The first three are explicit choices: if one is set but unusable, resolution
//! fails instead of silently falling through to a different interpreter.
//!
//! ## Validation
//!
//! - Python version >= 3.8
//! - `import rope` succeeds

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Environment variable naming an interpreter explicitly.
pub const PYTHON_ENV_VAR: &str = "ROPIFY_PYTHON";

// ============================================================================
// Error Types
// ============================================================================

/// A single step in the resolution process.
#[derive(Debug, Clone)]
pub struct ResolutionStep {
    /// Source being checked (e.g., "$ROPIFY_PYTHON", "$PATH").
    pub source: String,
    /// What was found (if anything).
    pub found: Option<PathBuf>,
    /// Version found (if applicable).
    pub version: Option<String>,
    /// Why this step failed (if it failed).
    pub failure_reason: Option<String>,
}

impl ResolutionStep {
    /// Create a step that was not attempted (env var not set, etc).
    pub fn not_set(source: impl Into<String>) -> Self {
        ResolutionStep {
            source: source.into(),
            found: None,
            version: None,
            failure_reason: Some("not set".to_string()),
        }
    }

    /// Create a step where no interpreter was found.
    pub fn not_found(source: impl Into<String>) -> Self {
        ResolutionStep {
            source: source.into(),
            found: None,
            version: None,
            failure_reason: Some("not found".to_string()),
        }
    }

    /// Create a step where an interpreter was found but rejected.
    pub fn rejected(
        source: impl Into<String>,
        path: PathBuf,
        version: Option<String>,
        reason: impl Into<String>,
    ) -> Self {
        ResolutionStep {
            source: source.into(),
            found: Some(path),
            version,
            failure_reason: Some(reason.into()),
        }
    }
}

impl std::fmt::Display for ResolutionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: ", self.source)?;
        if let Some(ref path) = self.found {
            write!(f, "found {}", path.display())?;
            if let Some(ref version) = self.version {
                write!(f, " ({})", version)?;
            }
            if let Some(ref reason) = self.failure_reason {
                write!(f, " - {}", reason)?;
            }
        } else if let Some(ref reason) = self.failure_reason {
            write!(f, "{}", reason)?;
        }
        Ok(())
    }
}

/// Trace of all resolution steps attempted.
#[derive(Debug, Clone, Default)]
pub struct ResolutionTrace {
    /// Steps attempted during resolution.
    pub steps: Vec<ResolutionStep>,
}

impl ResolutionTrace {
    /// Add a step to the trace.
    pub fn add(&mut self, step: ResolutionStep) {
        self.steps.push(step);
    }

    /// Format the trace for display.
    pub fn format_trace(&self) -> String {
        let mut output = String::new();
        for (i, step) in self.steps.iter().enumerate() {
            output.push_str(&format!("  {}. {}\n", i + 1, step));
        }
        output
    }
}

/// Errors that can occur during Python environment resolution.
#[derive(Debug, Error)]
pub enum PythonEnvError {
    /// No usable Python interpreter found.
    #[error("{}", format_python_not_found_error(.trace))]
    PythonNotFound { trace: ResolutionTrace },

    /// An explicitly requested interpreter cannot be used.
    #[error("Python at {path} ({source_name}) cannot be used: {reason}")]
    ExplicitInterpreterUnusable {
        path: PathBuf,
        source_name: String,
        reason: String,
    },

    /// Failed to execute Python.
    #[error("failed to execute Python at {path}: {reason}")]
    ExecutionFailed { path: PathBuf, reason: String },

    /// Invalid Python version string.
    #[error("invalid Python version string: {version}")]
    InvalidVersion { version: String },
}

/// Format the "Python not found" error with actionable remediation.
fn format_python_not_found_error(trace: &ResolutionTrace) -> String {
    let mut msg = String::from("no Python interpreter with rope found\n\n");
    msg.push_str("ropify requires Python 3.8+ with rope installed.\n\n");

    if !trace.steps.is_empty() {
        msg.push_str("Resolution attempted:\n");
        msg.push_str(&trace.format_trace());
        msg.push('\n');
    }

    msg.push_str("Remediation:\n");
    msg.push_str("  a) Install rope: python3 -m pip install rope\n");
    msg.push_str("  b) Point at an interpreter: export ROPIFY_PYTHON=/path/to/python3\n");
    msg.push_str("  c) Pass it directly: ropify --python /path/to/python3 ...\n");

    msg
}

/// Result type for Python environment operations.
pub type PythonEnvResult<T> = Result<T, PythonEnvError>;

// ============================================================================
// Python Version
// ============================================================================

/// Parsed Python version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PythonVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PythonVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        PythonVersion {
            major,
            minor,
            patch,
        }
    }

    /// Minimum required Python version (3.8.0).
    pub fn minimum() -> Self {
        PythonVersion::new(3, 8, 0)
    }

    /// Parse a version string like "3.11.4" or "Python 3.11.4".
    pub fn parse(version_str: &str) -> PythonEnvResult<Self> {
        let version_str = version_str
            .strip_prefix("Python ")
            .unwrap_or(version_str)
            .trim();

        let invalid = || PythonEnvError::InvalidVersion {
            version: version_str.to_string(),
        };

        let parts: Vec<&str> = version_str.split('.').collect();
        if parts.len() < 2 {
            return Err(invalid());
        }

        let major = parts[0].parse::<u32>().map_err(|_| invalid())?;
        let minor = parts[1].parse::<u32>().map_err(|_| invalid())?;

        // Patch might carry a suffix like "3.11.4+" or "3.12.0rc1"
        let patch_digits: String = parts
            .get(2)
            .unwrap_or(&"0")
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        let patch = patch_digits.parse::<u32>().unwrap_or(0);

        Ok(PythonVersion::new(major, minor, patch))
    }

    /// Check if this version meets the minimum requirement.
    pub fn meets_minimum(&self) -> bool {
        *self >= Self::minimum()
    }
}

impl std::fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

// ============================================================================
// Resolution Source
// ============================================================================

/// Where the Python interpreter was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// From explicit `--python` flag.
    CliFlag,
    /// From `$ROPIFY_PYTHON` environment variable.
    EnvRopifyPython,
    /// From the project config file.
    ConfigFile,
    /// From `$VIRTUAL_ENV/bin/python`.
    VirtualEnv,
    /// From `$CONDA_PREFIX/bin/python`.
    CondaPrefix,
    /// From `python3` in `$PATH`.
    Path,
}

impl ResolutionSource {
    /// Explicit sources fail hard instead of falling through.
    pub fn is_explicit(&self) -> bool {
        matches!(
            self,
            ResolutionSource::CliFlag
                | ResolutionSource::EnvRopifyPython
                | ResolutionSource::ConfigFile
        )
    }
}

impl std::fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionSource::CliFlag => write!(f, "--python flag"),
            ResolutionSource::EnvRopifyPython => write!(f, "${}", PYTHON_ENV_VAR),
            ResolutionSource::ConfigFile => write!(f, ".ropify/config.toml"),
            ResolutionSource::VirtualEnv => write!(f, "$VIRTUAL_ENV"),
            ResolutionSource::CondaPrefix => write!(f, "$CONDA_PREFIX"),
            ResolutionSource::Path => write!(f, "$PATH"),
        }
    }
}

// ============================================================================
// Python Environment
// ============================================================================

/// A validated interpreter that can import rope.
#[derive(Debug, Clone)]
pub struct PythonEnv {
    interpreter: PathBuf,
    version: PythonVersion,
    rope_version: Option<String>,
    source: ResolutionSource,
}

impl PythonEnv {
    /// Get the Python interpreter path.
    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    pub fn version(&self) -> &PythonVersion {
        &self.version
    }

    /// Rope version, when the package reports one.
    pub fn rope_version(&self) -> Option<&str> {
        self.rope_version.as_deref()
    }

    /// Get where the interpreter was resolved from.
    pub fn source(&self) -> ResolutionSource {
        self.source
    }
}

// ============================================================================
// Resolution Options
// ============================================================================

/// Options for resolving the Python environment.
#[derive(Debug, Clone, Default)]
pub struct ResolutionOptions {
    /// Explicit Python path (from `--python`).
    pub python_path: Option<PathBuf>,
    /// Interpreter named in the project config.
    pub config_python: Option<PathBuf>,
}

impl ResolutionOptions {
    /// Create options with explicit Python path.
    pub fn with_python(path: impl Into<PathBuf>) -> Self {
        ResolutionOptions {
            python_path: Some(path.into()),
            config_python: None,
        }
    }
}

// ============================================================================
// Resolution Functions
// ============================================================================

/// Platform-specific Python binary names.
#[cfg(windows)]
const PYTHON_NAMES: &[&str] = &["python.exe", "python3.exe"];

#[cfg(not(windows))]
const PYTHON_NAMES: &[&str] = &["python3", "python"];

/// Platform-specific binary directory inside virtual environments.
#[cfg(windows)]
const VENV_BIN_DIR: &str = "Scripts";

#[cfg(not(windows))]
const VENV_BIN_DIR: &str = "bin";

/// Resolve a Python interpreter that can import rope.
pub fn resolve_python(options: &ResolutionOptions) -> PythonEnvResult<PythonEnv> {
    let mut trace = ResolutionTrace::default();

    // 1-3. Explicit choices
    let explicit = [
        (ResolutionSource::CliFlag, options.python_path.clone()),
        (
            ResolutionSource::EnvRopifyPython,
            std::env::var_os(PYTHON_ENV_VAR).map(PathBuf::from),
        ),
        (ResolutionSource::ConfigFile, options.config_python.clone()),
    ];
    for (source, path) in explicit {
        match path {
            Some(path) => return validate_explicit(&path, source),
            None => trace.add(ResolutionStep::not_set(source.to_string())),
        }
    }

    // 4-5. Active environments
    for (source, var) in [
        (ResolutionSource::VirtualEnv, "VIRTUAL_ENV"),
        (ResolutionSource::CondaPrefix, "CONDA_PREFIX"),
    ] {
        let Some(prefix) = std::env::var_os(var) else {
            trace.add(ResolutionStep::not_set(source.to_string()));
            continue;
        };
        let bin_dir = PathBuf::from(prefix).join(VENV_BIN_DIR);
        let candidates: Vec<PathBuf> = PYTHON_NAMES
            .iter()
            .map(|name| bin_dir.join(name))
            .filter(|path| path.exists())
            .collect();
        if candidates.is_empty() {
            trace.add(ResolutionStep::not_found(source.to_string()));
        }
        for candidate in candidates {
            match try_validate_python(&candidate, source) {
                Ok(env) => return Ok(env),
                Err(step) => trace.add(step),
            }
        }
    }

    // 6. $PATH
    let mut found_any_path = false;
    for name in PYTHON_NAMES {
        if let Ok(path) = which::which(name) {
            found_any_path = true;
            match try_validate_python(&path, ResolutionSource::Path) {
                Ok(env) => return Ok(env),
                Err(step) => trace.add(step),
            }
        }
    }
    if !found_any_path {
        trace.add(ResolutionStep::not_found("$PATH (python3/python)"));
    }

    Err(PythonEnvError::PythonNotFound { trace })
}

fn validate_explicit(path: &Path, source: ResolutionSource) -> PythonEnvResult<PythonEnv> {
    try_validate_python(path, source).map_err(|step| PythonEnvError::ExplicitInterpreterUnusable {
        path: path.to_path_buf(),
        source_name: source.to_string(),
        reason: step.failure_reason.unwrap_or_else(|| "unknown".to_string()),
    })
}

/// Validate an interpreter, returning a trace step describing any failure.
fn try_validate_python(path: &Path, source: ResolutionSource) -> Result<PythonEnv, ResolutionStep> {
    let reject = |version: Option<String>, reason: String| {
        ResolutionStep::rejected(source.to_string(), path.to_path_buf(), version, reason)
    };

    if !path.exists() {
        return Err(reject(None, "path does not exist".to_string()));
    }

    let version = get_python_version(path).map_err(|e| reject(None, e.to_string()))?;
    let version_str = version.to_string();

    if !version.meets_minimum() {
        return Err(reject(
            Some(version_str),
            format!("version too old (need {}+)", PythonVersion::minimum()),
        ));
    }

    let (rope_available, rope_version) =
        check_rope(path).map_err(|e| reject(Some(version_str.clone()), e.to_string()))?;
    if !rope_available {
        return Err(reject(Some(version_str), "rope not installed".to_string()));
    }

    tracing::info!(
        python = %path.display(),
        version = %version,
        source = %source,
        "resolved Python interpreter"
    );

    Ok(PythonEnv {
        interpreter: path.to_path_buf(),
        version,
        rope_version,
        source,
    })
}

/// Get Python version by running `python --version`.
pub fn get_python_version(python_path: &Path) -> PythonEnvResult<PythonVersion> {
    let output = Command::new(python_path)
        .arg("--version")
        .output()
        .map_err(|e| PythonEnvError::ExecutionFailed {
            path: python_path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(PythonEnvError::ExecutionFailed {
            path: python_path.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    // Python --version prints to stdout (3.4+) or stderr (older)
    let version_output = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr)
    } else {
        String::from_utf8_lossy(&output.stdout)
    };

    PythonVersion::parse(version_output.trim())
}

/// Check if rope is importable and get its version.
pub fn check_rope(python_path: &Path) -> PythonEnvResult<(bool, Option<String>)> {
    let output = Command::new(python_path)
        .args([
            "-c",
            "import rope; print(getattr(rope, 'VERSION', ''))",
        ])
        .output()
        .map_err(|e| PythonEnvError::ExecutionFailed {
            path: python_path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Ok((false, None));
    }

    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok((true, (!version.is_empty()).then_some(version)))
}

// ============================================================================
// Tests
// ============================================================================
