// End-to-end runs of the built binary against throwaway fixture trees.
// `mcc` is a shell script that turns the digits of the source into the
// program's exit code.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const FAKE_MCC: &str = r#"#!/bin/sh
code=$(tr -cd '0-9' < "$1")
test -n "$code" || { echo "mcc: cannot compile $1" >&2; exit 1; }
printf '#!/bin/sh\nexit %s\n' "$code" > file
chmod +x file
"#;

fn fixture(root: &Path, rel_dir: &str, base: &str, source: &str) {
    let dir = root.join(rel_dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{base}.c")), source).unwrap();

    let mcc = dir.join("mcc");
    fs::write(&mcc, FAKE_MCC).unwrap();
    fs::set_permissions(&mcc, fs::Permissions::from_mode(0o755)).unwrap();
}

fn mccsnap(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mccsnap"))
        .args(args)
        .current_dir(cwd)
        .output()
        .unwrap_or_else(|e| panic!("failed to run mccsnap in {}: {}", cwd.display(), e))
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).to_string()
}

#[test]
fn single_case_end_to_end() {
    let dir = TempDir::new().unwrap();
    fixture(dir.path(), "t1", "add", "int main(void) { return 3; }\n");

    let out = mccsnap(dir.path(), &[]);
    let text = stdout(&out);

    assert!(out.status.success(), "stdout:\n{text}");
    assert_eq!(
        fs::read_to_string(dir.path().join("t1/add.received.txt")).unwrap(),
        "Return code of main:\n3\n"
    );
    assert!(text.starts_with("Total 1 test cases\n"), "stdout:\n{text}");
    assert!(
        text.contains("[1/1] Testing ./t1/add.c\nPass!\n"),
        "stdout:\n{text}"
    );
}

#[test]
fn record_format_is_exact() {
    let dir = TempDir::new().unwrap();
    fixture(dir.path(), "seven", "main", "return 7;\n");

    mccsnap(dir.path(), &[]);

    let bytes = fs::read(dir.path().join("seven/main.received.txt")).unwrap();
    assert_eq!(bytes, b"Return code of main:\n7\n");
}

#[test]
fn second_run_produces_identical_output() {
    let dir = TempDir::new().unwrap();
    fixture(dir.path(), "t1", "add", "return 3;\n");
    fixture(dir.path(), "t2", "mul", "return 42;\n");

    mccsnap(dir.path(), &[]);
    let first_add = fs::read(dir.path().join("t1/add.received.txt")).unwrap();
    let first_mul = fs::read(dir.path().join("t2/mul.received.txt")).unwrap();

    mccsnap(dir.path(), &[]);
    assert_eq!(fs::read(dir.path().join("t1/add.received.txt")).unwrap(), first_add);
    assert_eq!(fs::read(dir.path().join("t2/mul.received.txt")).unwrap(), first_mul);
}

#[test]
fn compile_failure_is_reported_and_skipped() {
    let dir = TempDir::new().unwrap();
    fixture(dir.path(), "a", "broken", "int main(void) { return x; }\n");
    fixture(dir.path(), "b", "fine", "return 1;\n");

    let out = mccsnap(dir.path(), &[]);
    let text = stdout(&out);

    assert!(!dir.path().join("a/broken.received.txt").exists());
    assert_eq!(
        fs::read_to_string(dir.path().join("b/fine.received.txt")).unwrap(),
        "Return code of main:\n1\n"
    );

    assert!(text.contains("Failed to compile ./a/broken.c"), "stdout:\n{text}");
    assert!(text.contains("[2/2] Testing ./b/fine.c"), "stdout:\n{text}");
    assert_eq!(text.matches("Pass!").count(), 2, "stdout:\n{text}");
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn counts_sibling_fixtures() {
    let dir = TempDir::new().unwrap();
    fixture(dir.path(), "left", "one", "return 1;\n");
    fixture(dir.path(), "right", "two", "return 2;\n");
    fs::write(dir.path().join("left/notes.txt"), "not a test\n").unwrap();

    let text = stdout(&mccsnap(dir.path(), &[]));

    assert!(text.starts_with("Total 2 test cases\n"), "stdout:\n{text}");
    let left = text.find("Testing ./left/one.c").unwrap();
    let right = text.find("Testing ./right/two.c").unwrap();
    assert!(left < right);
}

#[test]
fn signal_exit_is_recorded_as_negative_code() {
    let dir = TempDir::new().unwrap();
    let case = dir.path().join("killed");
    fs::create_dir_all(&case).unwrap();
    fs::write(case.join("killed.c"), "int main(void) { return *(int *)0; }\n").unwrap();
    let mcc = case.join("mcc");
    fs::write(
        &mcc,
        "#!/bin/sh\nprintf '#!/bin/sh\\nkill -KILL $$\\n' > file\nchmod +x file\n",
    )
    .unwrap();
    fs::set_permissions(&mcc, fs::Permissions::from_mode(0o755)).unwrap();

    mccsnap(dir.path(), &[]);

    assert_eq!(
        fs::read_to_string(case.join("killed.received.txt")).unwrap(),
        "Return code of main:\n-9\n"
    );
}

#[test]
fn compare_then_approve_round() {
    let dir = TempDir::new().unwrap();
    fixture(dir.path(), "t1", "add", "return 3;\n");

    let out = mccsnap(dir.path(), &["--compare"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout(&out).contains("Missing approved baseline"));

    let out = mccsnap(dir.path(), &["--approve"]);
    assert!(out.status.success(), "stdout:\n{}", stdout(&out));
    assert_eq!(
        fs::read_to_string(dir.path().join("t1/add.approaved.txt")).unwrap(),
        "Return code of main:\n3\n"
    );

    let out = mccsnap(dir.path(), &["--compare"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("Pass!"));

    fs::write(dir.path().join("t1/add.approaved.txt"), "Return code of main:\n4\n").unwrap();
    let out = mccsnap(dir.path(), &["--compare", "--quiet"]);
    let text = stdout(&out);
    assert_eq!(out.status.code(), Some(1));
    assert!(!text.contains("Testing"), "stdout:\n{text}");
    assert!(text.contains("Mismatch! ./t1/add.c"), "stdout:\n{text}");
    assert!(text.contains("Expected return code: 4 Actual return code: 3"));
}

#[test]
fn quiet_mode_still_shows_compile_failures() {
    let dir = TempDir::new().unwrap();
    fixture(dir.path(), "a", "broken", "int main(void) { return x; }\n");
    fixture(dir.path(), "b", "fine", "return 1;\n");

    let out = mccsnap(dir.path(), &["--quiet"]);
    let text = stdout(&out);

    assert_eq!(out.status.code(), Some(1));
    assert!(text.contains("Failed to compile ./a/broken.c"), "stdout:\n{text}");
    assert!(!text.contains("Testing"), "stdout:\n{text}");
    assert!(!text.contains("Pass!"), "stdout:\n{text}");
    assert!(text.contains("2 cases: 1 compiled, 1 failed to compile"), "stdout:\n{text}");
}

#[test]
fn approve_overwrites_stale_baseline() {
    let dir = TempDir::new().unwrap();
    fixture(dir.path(), "t1", "add", "return 3;\n");
    let approved = dir.path().join("t1/add.approaved.txt");
    fs::write(&approved, "Return code of main:\n4\n").unwrap();

    let out = mccsnap(dir.path(), &["--approve"]);
    let text = stdout(&out);

    assert!(out.status.success(), "stdout:\n{text}");
    assert!(text.contains("Approved ./t1/add.approaved.txt"), "stdout:\n{text}");
    assert_eq!(
        fs::read_to_string(&approved).unwrap(),
        "Return code of main:\n3\n"
    );

    let out = mccsnap(dir.path(), &["--compare"]);
    assert!(out.status.success(), "stdout:\n{}", stdout(&out));
}

#[test]
fn filter_and_report() {
    let dir = TempDir::new().unwrap();
    fixture(dir.path(), "t1", "add", "return 3;\n");
    fixture(dir.path(), "t2", "sub", "return 1;\n");

    let out = mccsnap(dir.path(), &["--filter", "t2/*", "--report", "out/report.json"]);
    let text = stdout(&out);

    assert!(text.starts_with("Total 1 test cases\n"), "stdout:\n{text}");
    assert!(!dir.path().join("t1/add.received.txt").exists());

    let raw = fs::read_to_string(dir.path().join("out/report.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(report["summary"]["total"], 1);
    assert_eq!(report["cases"][0]["source"], "./t2/sub.c");
    assert_eq!(report["cases"][0]["exit_code"], 1);
}

#[test]
fn missing_compiler_is_fatal() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("t1")).unwrap();
    fs::write(dir.path().join("t1/add.c"), "return 3;\n").unwrap();
    fs::create_dir_all(dir.path().join("t2")).unwrap();
    fs::write(dir.path().join("t2/later.c"), "return 1;\n").unwrap();

    let out = mccsnap(dir.path(), &[]);

    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).starts_with("mccsnap: failed to run"));
    assert!(!stdout(&out).contains("Testing ./t2/later.c"));
}

#[test]
fn shared_compiler_via_flag() {
    let tools = TempDir::new().unwrap();
    let compiler = tools.path().join("mcc");
    fs::write(&compiler, FAKE_MCC).unwrap();
    fs::set_permissions(&compiler, fs::Permissions::from_mode(0o755)).unwrap();

    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("t1")).unwrap();
    fs::write(dir.path().join("t1/add.c"), "return 3;\n").unwrap();

    let out = mccsnap(dir.path(), &["--mcc", compiler.to_str().unwrap()]);
    assert!(out.status.success(), "stdout:\n{}", stdout(&out));
    assert_eq!(
        fs::read_to_string(dir.path().join("t1/add.received.txt")).unwrap(),
        "Return code of main:\n3\n"
    );
}
