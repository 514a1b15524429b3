use std::process::Command;

#[test]
fn cli_compiles_without_warnings() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "warpflow"])
        .status()
        .expect("failed to invoke cargo check for the warpflow binary");

    assert!(status.success(), "cargo check --bin warpflow should succeed");
}

#[test]
fn tutorial_runs_to_completion() {
    let output = Command::new(env!("CARGO_BIN_EXE_warpflow"))
        .args(["tutorial", "--no-grid"])
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run the warpflow binary");

    assert!(output.status.success(), "tutorial exits cleanly");
    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    assert!(
        stdout.contains("finished on step 11 with 1 refused inputs, creator 3 joiner 2"),
        "summary line missing from:\n{stdout}"
    );
}

#[test]
fn malformed_transfer_strings_fail_with_a_message() {
    let output = Command::new(env!("CARGO_BIN_EXE_warpflow"))
        .args(["map", "decode", "grid:v1:4x4:e30"])
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run the warpflow binary");

    assert!(!output.status.success(), "decode must fail");
    let stderr = String::from_utf8(output.stderr).expect("utf-8 output");
    assert!(stderr.contains("map prefix 'grid' is not supported"), "{stderr}");
}
