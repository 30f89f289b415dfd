use std::path::Path;
use std::process::{Command, Output};

const BIN: &str = env!("CARGO_BIN_EXE_trace2json");

const ALU_LINE: &str = r#"{"pc":"0x10","type":"aluOp","A":{"bank":1,"idx":1,"val":"0x1"},"D":{"bank":1,"idx":2,"val":"0x2"}}"#;

fn run(args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run trace2json")
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_ndjson_to_text_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("one.jsonl");
    std::fs::write(&input, format!("{}\n", ALU_LINE)).unwrap();
    let output = dir.path().join("one.txt");

    let result = run(&["--in", path_str(&input), "--out", path_str(&output)]);

    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));
    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.contains("type: aluOp"));
    assert!(String::from_utf8_lossy(&result.stderr).contains("records emitted=1"));
}

#[test]
fn test_stdout_when_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("one.jsonl");
    std::fs::write(&input, format!("{}\n", ALU_LINE)).unwrap();

    let result = run(&["--in", path_str(&input)]);

    assert!(result.status.success());
    let stdout = String::from_utf8(result.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 1);
    assert!(stdout.starts_with("[PC: 0x10 type: aluOp"));
}

#[test]
fn test_missing_pc_fails_with_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.jsonl");
    std::fs::write(
        &input,
        "{\"type\":\"aluOp\",\"A\":{\"bank\":1,\"idx\":1,\"val\":\"0x1\"},\"D\":{\"bank\":1,\"idx\":2,\"val\":\"0x2\"}}\n",
    )
    .unwrap();
    let output = dir.path().join("bad.txt");

    let result = run(&["--in", path_str(&input), "--out", path_str(&output)]);

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("SchemaError"), "stderr: {}", stderr);
    assert!(stderr.contains("`pc`"), "stderr: {}", stderr);
    assert!(stderr.contains("line 1"), "stderr: {}", stderr);
}

#[test]
fn test_limit_zero_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("one.jsonl");
    std::fs::write(&input, format!("{}\n", ALU_LINE)).unwrap();
    let output = dir.path().join("none.txt");

    let result = run(&[
        "--in",
        path_str(&input),
        "--out",
        path_str(&output),
        "--limit",
        "0",
    ]);

    assert!(result.status.success());
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "");
}

#[test]
fn test_unknown_format_name_rejected_by_parser() {
    let result = run(&["--in", "whatever.jsonl", "--from", "stf"]);
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("stf"));
}

#[test]
fn test_case_sensitive_extensions_from_env() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ONE.JSONL");
    std::fs::write(&input, format!("{}\n", ALU_LINE)).unwrap();
    let output = dir.path().join("ONE.TXT");

    // Case-sensitive: the output extension is unknown, so the default
    // route (NDJSON -> text) still applies; the source is sniffed.
    let result = Command::new(BIN)
        .args(["--in", path_str(&input), "--out", path_str(&output), "-v"])
        .env(trace2json::utils::config::CASE_SENSITIVE_EXT_ENV, "1")
        .env_remove("RUST_LOG")
        .output()
        .unwrap();

    assert!(result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("content looks like ndjson"), "stderr: {}", stderr);
    assert!(std::fs::read_to_string(&output).unwrap().contains("type: aluOp"));
}
