use std::io::Write;
use std::process::{Command, Stdio};

/// Run the REPL binary with `input` on a redirected stdin and return its stdout
fn run_repl(input: &str) -> String {
    let mut child = Command::new(env!("CARGO_BIN_EXE_conslisp"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start conslisp");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("failed to write REPL input");

    let out = child.wait_with_output().expect("failed to wait for conslisp");
    if !out.status.success() {
        panic!(
            "conslisp exited with {}\nstderr:\n{}",
            out.status,
            String::from_utf8_lossy(&out.stderr)
        );
    }
    String::from_utf8_lossy(&out.stdout).into_owned()
}

#[test]
fn test_prompt_precedes_every_line_when_piped() {
    let stdout = run_repl("(+ 1 2)\n(setq x 5)\nx\n");
    assert_eq!(stdout, "> 3\n> 5\n> 5\n> ");
}

#[test]
fn test_piped_session_reports_errors_and_continues() {
    let stdout = run_repl("\nundefined\n(car '(a b))\n");
    assert_eq!(
        stdout,
        "> <error: empty input>\n> <error: undefined has no value>\n> a\n> "
    );
}

#[test]
fn test_quit_command_ends_piped_session() {
    let stdout = run_repl("1\n:quit\n2\n");
    assert_eq!(stdout, "> 1\n> ");
}
