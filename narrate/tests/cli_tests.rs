//! Integration tests for the narrate CLI

use assert_cmd::Command;

/// Test CLI argument parsing
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("narrate").unwrap();
    cmd.arg("--help");
    cmd.assert().success();
}

/// Test CLI version
#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("narrate").unwrap();
    cmd.arg("--version");
    cmd.assert().success();
}

/// Missing video file errors out
#[test]
fn test_missing_video_file() {
    let mut cmd = Command::cargo_bin("narrate").unwrap();
    cmd.arg("nonexistent_video.mp4");
    cmd.assert().failure();
}

/// No arguments errors out
#[test]
fn test_no_arguments() {
    let mut cmd = Command::cargo_bin("narrate").unwrap();
    cmd.assert().failure();
}

/// Unknown model names are rejected before any work starts
#[test]
fn test_unknown_model_name() {
    let dir = tempfile::tempdir().unwrap();
    let video = dir.path().join("clip.mp4");
    std::fs::write(&video, b"dummy").unwrap();

    let mut cmd = Command::cargo_bin("narrate").unwrap();
    cmd.arg(&video).arg("--model").arg("gigantic");
    cmd.assert().failure();
}

/// Test invalid arguments
#[test]
fn test_invalid_arguments() {
    let mut cmd = Command::cargo_bin("narrate").unwrap();
    cmd.arg("--invalid-flag");
    cmd.assert().failure();
}
