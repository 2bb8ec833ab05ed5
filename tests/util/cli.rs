use std::process::Command;

/// Runs the outbox binary with the given arguments, returning its stdout and stderr.
pub fn run(args: &[&str]) -> (Vec<u8>, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_outbox")).args(args).output().unwrap();
    assert!(output.status.success(), "outbox failed: {}", String::from_utf8_lossy(&output.stderr));
    (output.stdout, String::from_utf8_lossy(&output.stderr).to_string())
}

/// Runs the outbox binary and expects it to fail, returning its stderr.
pub fn run_failing(args: &[&str]) -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_outbox")).args(args).output().unwrap();
    assert!(!output.status.success());
    String::from_utf8_lossy(&output.stderr).to_string()
}
