//! Command-line interface: apply and fmt against files on disk.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const MODULE: &str = "import os\n\n\ndef cwd():\n    return os.getcwd()\n";
const MODELS: &str = "class User:\n    pass\n\n\nclass Group:\n    pass\n";

fn setup_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app.py"), MODULE).unwrap();
    fs::write(dir.path().join("models.py"), MODELS).unwrap();
    dir
}

fn pyedit(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pyedit"))
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .args(args)
        .output()
        .expect("failed to run pyedit")
}

#[test]
fn apply_inserts_import() {
    let dir = setup_workspace();
    let output = pyedit(
        dir.path(),
        &[
            "apply",
            "--file",
            "app.py",
            "--request",
            r#"{"operation": "insert_import", "params": {"imports": ["import sys"]}}"#,
        ],
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let text = fs::read_to_string(dir.path().join("app.py")).unwrap();
    assert!(text.starts_with("import os\nimport sys\n"));
}

#[test]
fn dry_run_writes_nothing() {
    let dir = setup_workspace();
    let output = pyedit(
        dir.path(),
        &[
            "apply",
            "--file",
            "models.py",
            "--dry-run",
            "--request",
            r#"{"operation": "delete_declaration", "params": {"declaration": "Group"}}"#,
        ],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DRY RUN"));
    assert!(stdout.contains("-class Group:"));
    assert_eq!(fs::read_to_string(dir.path().join("models.py")).unwrap(), MODELS);
}

#[test]
fn unknown_name_fails_without_writing() {
    let dir = setup_workspace();
    let output = pyedit(
        dir.path(),
        &[
            "apply",
            "--file",
            "models.py",
            "--request",
            r#"{"operation": "delete_declaration", "params": {"declaration": "Usr"}}"#,
        ],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("User"), "expected a suggestion in: {stderr}");
    assert_eq!(fs::read_to_string(dir.path().join("models.py")).unwrap(), MODELS);
}

#[test]
fn relocate_range_creates_destination() {
    let dir = setup_workspace();
    let output = pyedit(
        dir.path(),
        &[
            "apply",
            "--file",
            "app.py",
            "--dest",
            "util.py",
            "--request",
            r#"{"operation": "relocate_range", "params": {"start_line": 4, "end_line": 5, "insert_line": 1}}"#,
        ],
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        fs::read_to_string(dir.path().join("util.py")).unwrap(),
        "import os\n\ndef cwd():\n    return os.getcwd()\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("app.py")).unwrap(),
        "import os\n"
    );
}

#[test]
fn relocate_range_requires_destination() {
    let dir = setup_workspace();
    let output = pyedit(
        dir.path(),
        &[
            "apply",
            "--file",
            "app.py",
            "--request",
            r#"{"operation": "relocate_range", "params": {"start_line": 4, "end_line": 5, "insert_line": 1}}"#,
        ],
    );

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--dest"));
}

#[test]
fn fmt_check_reports_without_writing() {
    let dir = TempDir::new().unwrap();
    let messy = "def f():\n  return 'x'\n";
    fs::write(dir.path().join("messy.py"), messy).unwrap();

    let output = pyedit(dir.path(), &["fmt", "--check", "."]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("would reformat"));
    assert_eq!(fs::read_to_string(dir.path().join("messy.py")).unwrap(), messy);

    let output = pyedit(dir.path(), &["fmt", "."]);
    assert!(output.status.success());
    assert_eq!(
        fs::read_to_string(dir.path().join("messy.py")).unwrap(),
        "def f():\n    return \"x\"\n"
    );
}

#[test]
fn fmt_honors_pyproject_indent() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("pyproject.toml"),
        "[tool.pyedit.format]\nindent_width = 2\n",
    )
    .unwrap();
    fs::write(dir.path().join("mod.py"), "def f():\n    return 1\n").unwrap();

    let output = pyedit(dir.path(), &["fmt", "mod.py"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        fs::read_to_string(dir.path().join("mod.py")).unwrap(),
        "def f():\n  return 1\n"
    );
}

#[test]
fn relocate_routine_with_dest_equal_to_file_edits_in_place() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("shapes.py"),
        "class Circle:\n    def area(self):\n        return 3\n\n\nclass Square:\n    pass\n",
    )
    .unwrap();

    let output = pyedit(
        dir.path(),
        &[
            "apply",
            "--file",
            "shapes.py",
            "--dest",
            "./shapes.py",
            "--request",
            r#"{"operation": "relocate_routine", "params": {"routine": "area", "from": "Circle", "to": "Square"}}"#,
        ],
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        fs::read_to_string(dir.path().join("shapes.py")).unwrap(),
        "class Circle:\n    pass\n\nclass Square:\n    def area(self):\n        return 3\n"
    );
}
