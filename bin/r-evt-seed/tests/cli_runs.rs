//! ---
//! evt_section: "15-testing-qa-runbook"
//! evt_subsection: "integration-tests"
//! evt_type: "source"
//! evt_scope: "code"
//! evt_description: "Runs the seeding binary end to end and checks its log output."
//! evt_version: "v0.1.0"
//! evt_owner: "tbd"
//! ---
use std::net::TcpListener;
use std::path::Path;
use std::process::Command;

/// Run r-evt-seed from `dir` with a clean environment. Returns (success, stdout, stderr).
fn run_seed(dir: &Path, args: &[&str]) -> (bool, String, String) {
    let out = Command::new(env!("CARGO_BIN_EXE_r-evt-seed"))
        .current_dir(dir)
        .args(args)
        .env_remove("R_EVT_CONFIG")
        .env_remove("RUST_LOG")
        .env_remove("INFLUXDB_URL")
        .env_remove("INFLUXDB_TOKEN")
        .env_remove("INFLUXDB_ORG")
        .env_remove("INFLUXDB_BUCKET")
        .env("R_EVT_LOG", "info")
        .output()
        .expect("run r-evt-seed");
    (
        out.status.success(),
        String::from_utf8_lossy(&out.stdout).into_owned(),
        String::from_utf8_lossy(&out.stderr).into_owned(),
    )
}

fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

#[test]
fn unreachable_influx_logs_failure_and_summary() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = closed_port_url();
    for _ in 0..5 {
        let (ok, _stdout, stderr) = run_seed(
            dir.path(),
            &["--url", &url, "--token", "t", "--org", "o", "--bucket", "b", "--seed", "1"],
        );
        assert!(ok, "write failures are not fatal by default: {stderr}");
        assert!(
            stderr.contains("failed to write telemetry batch"),
            "missing failure line: {stderr}"
        );
        assert!(
            stderr.trim_end().ends_with("data push complete"),
            "missing final summary: {stderr}"
        );
        assert!(!stderr.contains('\u{1b}'), "escape codes in redirected stderr");
    }
}

#[test]
fn fail_on_error_exits_non_zero_after_logging() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = closed_port_url();
    let (ok, _stdout, stderr) = run_seed(
        dir.path(),
        &["--url", &url, "--token", "t", "--org", "o", "--bucket", "b", "--fail-on-error"],
    );
    assert!(!ok);
    assert!(stderr.contains("failed to write telemetry batch"));
    assert!(stderr.contains("data push complete"));
    assert!(stderr.contains("failed to write 288 records"));
}

#[test]
fn dry_run_to_file_always_logs_summary() {
    let dir = tempfile::tempdir().expect("tempdir");
    for _ in 0..5 {
        let (ok, stdout, stderr) = run_seed(dir.path(), &["--dry-run", "--output", "seed.lp"]);
        assert!(ok, "{stderr}");
        assert!(stdout.is_empty());
        assert!(stderr.contains("data push complete"), "{stderr}");
        let exported = std::fs::read_to_string(dir.path().join("seed.lp")).expect("export");
        assert_eq!(exported.lines().count(), 288);
    }
}

#[test]
fn non_http_url_stops_before_generation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (ok, _stdout, stderr) = run_seed(
        dir.path(),
        &["--url", "mailto:ops@example.com", "--token", "t", "--org", "o", "--bucket", "b"],
    );
    assert!(!ok);
    assert!(stderr.contains("unsupported scheme"), "{stderr}");
    assert!(!stderr.contains("generating telemetry"));
}
