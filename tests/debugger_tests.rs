use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

#[test]
fn debugs_countdown() {
    let mut cmd = Command::cargo_bin("lmc").unwrap();
    cmd.arg("debug")
        .arg("tests/files/countdown.lmc")
        .arg("--minimal")
        .arg("--command")
        .arg("break add loop; continue; continue; registers; quit");

    cmd.assert()
        .success()
        .stdout(contains("Output: 3"))
        .stdout(contains("Output: 2").not())
        .stderr(contains("Added breakpoint at line 3."))
        .stderr(contains("Reached breakpoint. Pausing execution."))
        .stderr(contains("Executed 3 instructions."))
        .stderr(contains("ACC 2\nPC 2\n"));
}

#[test]
fn continues_after_stepping_onto_breakpoint() {
    let mut cmd = Command::cargo_bin("lmc").unwrap();
    cmd.arg("debug")
        .arg("tests/files/countdown.lmc")
        .arg("--minimal")
        .arg("--command")
        .arg("break add loop; step 2; continue; registers");

    cmd.assert()
        .success()
        .stdout(contains("Output: 3"))
        .stdout(contains("Output: 2").not())
        .stderr(contains("Executed 3 instructions."))
        .stderr(contains("ACC 2\nPC 2\n"));
}

#[test]
fn steps_and_lists_labels() {
    let mut cmd = Command::cargo_bin("lmc").unwrap();
    cmd.arg("debug")
        .arg("tests/files/countdown.lmc")
        .arg("--minimal")
        .arg("--command")
        .arg("step 3\nlabels\nsource");

    cmd.assert()
        .success()
        .stdout(contains("Output: 3"))
        .stderr(contains("Executed 3 instructions."))
        .stderr(contains("loop         line 3"))
        .stderr(contains("count        line 7"))
        .stderr(contains("        SUB one"));
}

#[test]
fn runs_to_halt_and_resets() {
    let mut cmd = Command::cargo_bin("lmc").unwrap();
    cmd.arg("debug")
        .arg("tests/files/countdown.lmc")
        .arg("--minimal")
        .arg("--command")
        .arg("continue; step; reset; step 2; registers");

    cmd.assert()
        .success()
        .stdout(contains("Program Halted."))
        .stderr(contains("Program has halted. Use `reset` to run it again."))
        .stderr(contains("Reset program to initial state."))
        .stderr(contains("ACC 3\nPC 2\n"));
}

#[test]
fn reads_commands_from_stdin() {
    let mut cmd = Command::cargo_bin("lmc").unwrap();
    cmd.arg("debug")
        .arg("tests/files/countdown.lmc")
        .arg("--minimal")
        .write_stdin("break add 5\nbreak list\ncontinue\nmemory\n");

    cmd.assert()
        .success()
        .stderr(contains("Breakpoints:\n5\n"))
        .stderr(contains("Reached breakpoint. Pausing execution."))
        .stderr(contains("0 500 902 200 800 0 3 1 0 0"));
}

#[test]
fn reports_invalid_commands() {
    let mut cmd = Command::cargo_bin("lmc").unwrap();
    cmd.arg("debug")
        .arg("tests/files/countdown.lmc")
        .arg("--minimal")
        .arg("--command")
        .arg("jump 3; break add nowhere; step 0");

    cmd.assert()
        .success()
        .stderr(contains("Not a command: `jump`"))
        .stderr(contains("Label not found named `nowhere`."))
        .stderr(contains(
            "In command `step`: For argument `count`: Must be greater than zero",
        ))
        .stderr(contains("Type `help` for a list of commands."));
}

#[test]
fn prints_help_message() {
    let mut cmd = Command::cargo_bin("lmc").unwrap();
    cmd.arg("debug")
        .arg("tests/files/countdown.lmc")
        .arg("--minimal")
        .arg("--command")
        .arg("help");

    cmd.assert()
        .success()
        .stderr(contains(include_str!("../src/debugger/help.txt")));
}
