use std::process::Command;

#[test]
fn cli_compiles_without_warnings() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "liminal"])
        .status()
        .expect("failed to invoke cargo check for liminal CLI binary");

    assert!(status.success(), "cargo check --bin liminal should succeed");
}

#[test]
fn short_walk_prints_json_summary() {
    let output = Command::new(env!("CARGO_BIN_EXE_liminal"))
        .args(["--seed", "7", "--steps", "4", "--json"])
        .output()
        .expect("failed to run liminal CLI binary");

    assert!(output.status.success(), "liminal exited with {:?}", output.status);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"steps\": 4"), "unexpected summary: {stdout}");
    assert!(stdout.contains("\"midpoint_swaps\": 4"), "unexpected summary: {stdout}");
}
