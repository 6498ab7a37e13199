use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::{contains, diff};

#[test]
fn runs_without_arguments() {
    let mut cmd = Command::cargo_bin("lmc").unwrap();
    cmd.assert().success();
}

#[test]
fn runs_countdown() {
    let mut cmd = Command::cargo_bin("lmc").unwrap();
    cmd.arg("run").arg("tests/files/countdown.lmc").arg("--minimal");

    cmd.assert().success().stdout(diff(
        "Output: 3\nOutput: 2\nOutput: 1\nOutput: 0\nProgram Halted.\n",
    ));
}

#[test]
fn runs_bare_path() {
    let mut cmd = Command::cargo_bin("lmc").unwrap();
    cmd.arg("tests/files/countdown.lmc");

    cmd.assert()
        .success()
        .stdout(contains("Output: 0"))
        .stdout(contains("Program Halted."));
}

#[test]
fn stops_at_end_of_program() {
    let mut cmd = Command::cargo_bin("lmc").unwrap();
    cmd.arg("run").arg("tests/files/no_halt.lmc").arg("--minimal");

    cmd.assert().success().stdout(diff("Output: 0\n"));
}

#[test]
fn reads_input_from_stdin() {
    let mut cmd = Command::cargo_bin("lmc").unwrap();
    cmd.arg("run")
        .arg("tests/files/add.lmc")
        .arg("--minimal")
        .write_stdin("3\n4\n");

    cmd.assert().success().stdout(diff(
        "Input: 3\nInput: 4\nOutput: 7\nProgram Halted.\n",
    ));
}

#[test]
fn end_of_input_cancels() {
    let mut cmd = Command::cargo_bin("lmc").unwrap();
    cmd.arg("run")
        .arg("tests/files/add.lmc")
        .arg("--minimal")
        .write_stdin("3\n");

    cmd.assert().success().stdout(diff(
        "Input: 3\nProgram terminated by user (INP cancelled).\n",
    ));
}

#[test]
fn rejects_non_integer_input() {
    let mut cmd = Command::cargo_bin("lmc").unwrap();
    cmd.arg("run")
        .arg("tests/files/add.lmc")
        .arg("--minimal")
        .write_stdin("three\n");

    cmd.assert()
        .failure()
        .stdout(contains("Error: Invalid input. Please enter an integer."))
        .stdout(contains("Program Halted.").not());
}

#[test]
fn reports_runtime_error() {
    let mut cmd = Command::cargo_bin("lmc").unwrap();
    cmd.arg("run").arg("tests/files/overflow.lmc").arg("--minimal");

    cmd.assert().failure().stdout(diff(
        "Runtime Error: Memory address out of bounds: 100 on line 2\n",
    ));
}

#[test]
fn reports_bad_data_on_load() {
    let mut cmd = Command::cargo_bin("lmc").unwrap();
    cmd.arg("run").arg("tests/files/broken.lmc").arg("--minimal");

    cmd.assert()
        .failure()
        .stdout(diff("Error: Invalid data value on line 6: lots\n"));
}

#[test]
fn minimal_from_environment() {
    let mut cmd = Command::cargo_bin("lmc").unwrap();
    cmd.env("LMC_MINIMAL", "1")
        .arg("run")
        .arg("tests/files/countdown.lmc");

    cmd.assert()
        .success()
        .stdout(contains("Running").not())
        .stdout(contains("Program Halted."));
}

#[test]
fn missing_file() {
    let mut cmd = Command::cargo_bin("lmc").unwrap();
    cmd.arg("run").arg("tests/files/nothing.lmc");

    cmd.assert()
        .failure()
        .stderr(contains("File does not exist"));
}

#[test]
fn checks_valid_program() {
    let mut cmd = Command::cargo_bin("lmc").unwrap();
    cmd.arg("check").arg("tests/files/countdown.lmc");

    cmd.assert()
        .success()
        .stdout(contains("no errors found!"));
}

#[test]
fn checks_broken_program() {
    let mut cmd = Command::cargo_bin("lmc").unwrap();
    cmd.arg("check").arg("tests/files/broken.lmc");

    cmd.assert()
        .failure()
        .stderr(contains("Instruction 'ADD' requires an operand."))
        .stderr(contains("Instruction 'OUT' does not take an operand."))
        .stderr(contains("Unknown instruction 'JMP'."))
        .stderr(contains("Duplicate label definition: 'start'."))
        .stderr(contains("Invalid data value."))
        .stderr(contains("Undefined label: 'finish'."))
        .stderr(contains("Found 6 errors"));
}

#[test]
fn slow_mode_shows_every_step() {
    let mut cmd = Command::cargo_bin("lmc").unwrap();
    cmd.arg("slow")
        .arg("tests/files/countdown.lmc")
        .arg("--delay")
        .arg("0")
        .arg("--minimal");

    cmd.assert()
        .success()
        .stdout(contains("Output: 3"))
        .stdout(contains("Program Halted."))
        .stderr(contains("ACC -1\nPC 5\n"))
        .stderr(contains("0 500 902 200 800 0 3 1 0 0"));
}
