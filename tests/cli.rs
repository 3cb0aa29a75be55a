//! Tests for the `cprl` binary: file suffixes, sibling outputs, and exit codes.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

const DOUBLE: &str = "const N := 3; var x : Integer; begin x := N * 2; write x; end.";

fn cprl(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cprl"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("CPRL_LOG")
        .stdin(Stdio::null())
        .output()
        .unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_source(dir: &TempDir, name: &str, source: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, source).unwrap();
    path.to_string_lossy().into_owned()
}

fn base(dir: &TempDir, name: &str) -> String {
    dir.path().join(name).to_string_lossy().into_owned()
}

#[test]
fn test_compile_assemble_run_with_suffixes_appended() {
    let dir = tempfile::tempdir().unwrap();
    write_source(&dir, "double.cprl", DOUBLE);
    let prog = base(&dir, "double");

    let compiled = cprl(&["compile", &prog]);
    assert!(compiled.status.success(), "{}", stderr(&compiled));
    assert!(stderr(&compiled).contains("Starting compilation for double.cprl..."));
    assert!(stderr(&compiled).contains("Compilation complete."));
    assert!(dir.path().join("double.asm").exists());

    let assembled = cprl(&["assemble", &prog]);
    assert!(assembled.status.success(), "{}", stderr(&assembled));
    let log = stderr(&assembled);
    assert!(log.contains("Starting assembly for double.asm..."));
    assert!(log.contains("Performing optimizations..."));
    assert!(log.contains("Generating code..."));
    assert!(log.contains("Assembly complete."));
    assert!(dir.path().join("double.obj").exists());

    let ran = cprl(&["run", &prog]);
    assert!(ran.status.success(), "{}", stderr(&ran));
    assert_eq!(stdout(&ran), "6");
}

#[test]
fn test_explicit_suffix_is_not_doubled() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(&dir, "double.cprl", DOUBLE);

    let compiled = cprl(&["compile", &source]);
    assert!(compiled.status.success(), "{}", stderr(&compiled));
    assert!(dir.path().join("double.asm").exists());
    assert!(!dir.path().join("double.cprl.asm").exists());
}

#[test]
fn test_assemble_without_optimizations() {
    let dir = tempfile::tempdir().unwrap();
    write_source(&dir, "double.cprl", DOUBLE);
    let prog = base(&dir, "double");

    assert!(cprl(&["compile", &prog]).status.success());
    let assembled = cprl(&["assemble", "-opt:off", &prog]);
    assert!(assembled.status.success(), "{}", stderr(&assembled));
    assert!(!stderr(&assembled).contains("Performing optimizations..."));

    let ran = cprl(&["run", &prog]);
    assert_eq!(stdout(&ran), "6");
}

#[test]
fn test_disassemble_writes_listing() {
    let dir = tempfile::tempdir().unwrap();
    write_source(&dir, "double.cprl", DOUBLE);
    let prog = base(&dir, "double");

    assert!(cprl(&["compile", &prog]).status.success());
    assert!(cprl(&["assemble", &prog]).status.success());
    let disassembled = cprl(&["disassemble", &prog]);
    assert!(disassembled.status.success(), "{}", stderr(&disassembled));

    let listing = fs::read_to_string(dir.path().join("double.dis.txt")).unwrap();
    assert!(listing.starts_with("   0:  PROGRAM 4\n"));
    assert!(listing.trim_end().ends_with("HALT"));
}

#[test]
fn test_exec_reads_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let source = "var n : Integer; begin read n; writeln n + 1; end.";
    write_source(&dir, "inc.cprl", source);

    let mut child = Command::new(env!("CARGO_BIN_EXE_cprl"))
        .arg("exec")
        .arg(base(&dir, "inc"))
        .env("NO_COLOR", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"41\n").unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "42\n");
    // exec writes nothing next to the source
    assert!(!Path::new(&base(&dir, "inc.asm")).exists());
}

#[test]
fn test_compile_errors_terminate() {
    let dir = tempfile::tempdir().unwrap();
    write_source(&dir, "bad.cprl", "var x : Integer; begin y := 1; end.");

    let compiled = cprl(&["compile", &base(&dir, "bad")]);
    assert_eq!(compiled.status.code(), Some(1));
    let log = stderr(&compiled);
    assert!(log.contains("Identifier \"y\" has not been declared"));
    assert!(log.contains("*** Errors detected in bad.cprl -- compilation terminated. ***"));
    assert!(!dir.path().join("bad.asm").exists());
}

#[test]
fn test_assembly_errors_terminate() {
    let dir = tempfile::tempdir().unwrap();
    write_source(&dir, "bad.asm", "   BR nowhere\n   HALT\n");

    let assembled = cprl(&["assemble", &base(&dir, "bad")]);
    assert_eq!(assembled.status.code(), Some(1));
    let log = stderr(&assembled);
    assert!(log.contains("label \"nowhere\" has not been defined."));
    assert!(log.contains("*** Errors detected in bad.asm -- assembly terminated. ***"));
    assert!(!dir.path().join("bad.obj").exists());
}

#[test]
fn test_runtime_fault_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let source = "var x : Integer; begin write 7; x := 1 / x; end.";
    write_source(&dir, "fault.cprl", source);

    let ran = cprl(&["exec", &base(&dir, "fault")]);
    assert_eq!(ran.status.code(), Some(1));
    assert_eq!(stdout(&ran), "7");
    assert!(stderr(&ran).contains("*** FAULT: Divide by zero ***"));
}

#[test]
fn test_missing_file_and_bad_usage() {
    let dir = tempfile::tempdir().unwrap();

    let missing = cprl(&["run", &base(&dir, "nothing")]);
    assert_eq!(missing.status.code(), Some(1));
    assert!(stderr(&missing).contains("nothing.obj"));

    assert_eq!(cprl(&[]).status.code(), Some(1));
    assert_eq!(cprl(&["frobnicate", "x"]).status.code(), Some(1));
    assert_eq!(cprl(&["compile"]).status.code(), Some(1));
    assert_eq!(cprl(&["run", "-opt:on", "x"]).status.code(), Some(1));
}
