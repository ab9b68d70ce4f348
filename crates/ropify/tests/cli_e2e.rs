//! CLI end-to-end tests for ropify.
//!
//! These tests spawn the actual `ropify` binary and validate stdout, stderr
//! and exit codes.
//!
//! Exit code expectations:
//! - 0: Success
//! - 1: Guard violation (wrong destination kind, module via `move`, no imports)
//! - 2: Invalid arguments (missing paths, negative offsets, bad config)
//! - 4: No usable Python interpreter
//!
//! Tests that need a real Python with rope return early when none is found.

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Find a Python 3 that can import rope.
fn rope_python() -> Option<PathBuf> {
    let python = which::which("python3")
        .or_else(|_| which::which("python"))
        .ok()?;
    let ok = std::process::Command::new(&python)
        .args(["-c", "import rope"])
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false);
    ok.then_some(python)
}

fn ropify() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ropify"));
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Project with `foo.helper`, an empty `bar.py`, a package and a caller.
fn sample_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    std::fs::write(
        root.join("foo.py"),
        "def helper():\n    return 1\n\n\ndef other():\n    return 2\n",
    )
    .unwrap();
    std::fs::write(root.join("bar.py"), "").unwrap();
    std::fs::write(root.join("util.py"), "def slugify_text(s):\n    return s\n").unwrap();
    std::fs::write(
        root.join("main.py"),
        "import util\nfrom foo import helper\n\nprint(helper(), util.slugify_text('x'))\n",
    )
    .unwrap();
    std::fs::create_dir(root.join("pkg")).unwrap();
    std::fs::write(root.join("pkg/__init__.py"), "").unwrap();
    temp
}

fn read(root: &Path, rel: &str) -> String {
    std::fs::read_to_string(root.join(rel)).unwrap()
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

// ============================================================================
// Argument Validation
// ============================================================================

#[test]
fn help_lists_commands_and_aliases() {
    let output = ropify().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = stdout_of(&output);
    for name in ["move", "move-module", "show-imports"] {
        assert!(stdout.contains(name), "missing {} in help", name);
    }
    assert!(stdout.contains("show-autoimports"));
    assert!(stdout.contains("move-symbol"));
}

#[test]
fn missing_resource_exits_2() {
    let project = sample_project();
    let output = ropify()
        .current_dir(project.path())
        .args(["move", "missing.py", "0"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn negative_offset_exits_2() {
    let project = sample_project();
    let output = ropify()
        .current_dir(project.path())
        .args(["move", "foo.py", "-1"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(read(project.path(), "foo.py").contains("def helper"));
}

#[test]
fn missing_project_exits_2() {
    let output = ropify()
        .args(["show-imports", "helper", "--project", "/definitely/not/a/project"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn malformed_config_exits_2() {
    let project = sample_project();
    std::fs::create_dir(project.path().join(".ropify")).unwrap();
    std::fs::write(project.path().join(".ropify/config.toml"), "[ropify\n").unwrap();

    let output = ropify()
        .current_dir(project.path())
        .args(["show-imports", "helper"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("configuration error"), "stderr: {}", stderr);
}

#[test]
fn unusable_python_exits_4() {
    let project = sample_project();
    let output = ropify()
        .current_dir(project.path())
        .args(["--python", "/definitely/not/python3", "move", "foo.py", "4"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: "), "stderr: {}", stderr);
    assert!(stdout_of(&output).is_empty());
}

// ============================================================================
// Rope-backed Commands
// ============================================================================

#[test]
fn move_definition_to_file() {
    let Some(python) = rope_python() else {
        eprintln!("Skipping test: Python with rope not found");
        return;
    };

    let project = sample_project();
    let output = ropify()
        .current_dir(project.path())
        .env("ROPIFY_PYTHON", &python)
        .args(["move", "foo.py", "4", "--destination", "bar.py"])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        stdout_of(&output),
        "Moving definition of `helper`\n\
         Definition of `helper` is currently at: foo.py\n\
         Definition of `helper` moved to: bar.py\n"
    );
    assert!(read(project.path(), "bar.py").contains("def helper"));
    assert!(!read(project.path(), "foo.py").contains("def helper"));
    assert!(read(project.path(), "main.py").contains("from bar import helper"));
}

#[test]
fn move_definition_with_custom_ropefolder() {
    let Some(python) = rope_python() else {
        eprintln!("Skipping test: Python with rope not found");
        return;
    };

    let project = sample_project();
    let output = ropify()
        .current_dir(project.path())
        .env("ROPIFY_PYTHON", &python)
        .args([
            "move",
            "foo.py",
            "4",
            "--destination",
            "bar.py",
            "--ropefolder",
            ".custom",
        ])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(project.path().join(".custom").is_dir());
    assert!(!project.path().join(".ropeproject").exists());
    assert!(read(project.path(), "bar.py").contains("def helper"));
}

#[test]
fn move_definition_in_latin1_file() {
    let Some(python) = rope_python() else {
        eprintln!("Skipping test: Python with rope not found");
        return;
    };

    let project = sample_project();
    let mut data = b"# -*- coding: latin-1 -*-\r\n# caf".to_vec();
    data.push(0xe9);
    data.extend_from_slice(b"\r\ndef helper():\r\n    return 1\r\n");
    std::fs::write(project.path().join("foo.py"), &data).unwrap();
    // `helper` starts at byte 39.
    assert_eq!(&data[39..45], b"helper");

    let output = ropify()
        .current_dir(project.path())
        .env("ROPIFY_PYTHON", &python)
        .args(["move", "foo.py", "39", "--destination", "bar.py"])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout_of(&output).starts_with("Moving definition of `helper`\n"));
    let bar = std::fs::read(project.path().join("bar.py")).unwrap();
    assert!(String::from_utf8_lossy(&bar).contains("def helper"));
}

#[test]
fn move_definition_prompts_for_destination() {
    let Some(python) = rope_python() else {
        eprintln!("Skipping test: Python with rope not found");
        return;
    };

    let project = sample_project();
    let output = ropify()
        .current_dir(project.path())
        .env("ROPIFY_PYTHON", &python)
        .args(["move-symbol", "foo.py", "4"])
        .write_stdin("bar.py\n")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert_eq!(stdout.matches("Enter the new file for the definition").count(), 1);
    assert!(stdout.ends_with("Definition of `helper` moved to: bar.py\n"));
}

#[test]
fn move_definition_to_folder_is_guarded() {
    let Some(python) = rope_python() else {
        eprintln!("Skipping test: Python with rope not found");
        return;
    };

    let project = sample_project();
    let before = read(project.path(), "foo.py");
    let output = ropify()
        .current_dir(project.path())
        .env("ROPIFY_PYTHON", &python)
        .args(["move", "foo.py", "4", "--destination", "pkg"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout_of(&output).ends_with("The destination must be a python file\n"));
    assert_eq!(read(project.path(), "foo.py"), before);
}

#[test]
fn move_definition_of_module_is_redirected() {
    let Some(python) = rope_python() else {
        eprintln!("Skipping test: Python with rope not found");
        return;
    };

    let project = sample_project();
    // Offset 7 is the `util` in `import util`.
    let output = ropify()
        .current_dir(project.path())
        .env("ROPIFY_PYTHON", &python)
        .args(["move", "main.py", "7", "--destination", "bar.py"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout_of(&output),
        "Cannot move module `util` with this command; use `move-module` instead\n"
    );
    assert!(project.path().join("util.py").exists());
}

#[test]
fn move_module_into_package() {
    let Some(python) = rope_python() else {
        eprintln!("Skipping test: Python with rope not found");
        return;
    };

    let project = sample_project();
    let output = ropify()
        .current_dir(project.path())
        .env("ROPIFY_PYTHON", &python)
        .args(["move-module", "util.py", "--destination", "pkg"])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        stdout_of(&output),
        "Moving module `util`\n\
         Module `util` is currently at: util.py\n\
         Module `util` moved to: pkg\n"
    );
    assert!(project.path().join("pkg/util.py").exists());
    assert!(!project.path().join("util.py").exists());
}

#[test]
fn move_module_to_file_is_guarded() {
    let Some(python) = rope_python() else {
        eprintln!("Skipping test: Python with rope not found");
        return;
    };

    let project = sample_project();
    let output = ropify()
        .current_dir(project.path())
        .env("ROPIFY_PYTHON", &python)
        .args(["move-module", "util.py", "--destination", "bar.py"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout_of(&output).ends_with("The destination must be a folder\n"));
    assert!(project.path().join("util.py").exists());
}

#[test]
fn show_imports_lists_project_module() {
    let Some(python) = rope_python() else {
        eprintln!("Skipping test: Python with rope not found");
        return;
    };

    let project = sample_project();
    let output = ropify()
        .current_dir(project.path())
        .env("ROPIFY_PYTHON", &python)
        .args(["show-autoimports", "slugify_text"])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout_of(&output)
        .lines()
        .any(|line| line == "from util import slugify_text"));
}

#[test]
fn show_imports_without_candidates_exits_1() {
    let Some(python) = rope_python() else {
        eprintln!("Skipping test: Python with rope not found");
        return;
    };

    let project = sample_project();
    let output = ropify()
        .current_dir(project.path())
        .env("ROPIFY_PYTHON", &python)
        .args(["show-imports", "zz_no_such_name_anywhere"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout_of(&output),
        "No modules found for `zz_no_such_name_anywhere`\n"
    );
}
