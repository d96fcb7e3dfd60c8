//! End-to-end tests for the `meshcni` binary.
//!
//! Runs the compiled binary and checks stdout and exit codes.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn meshcni(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_meshcni"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env("RUST_LOG", "error")
        .output()
        .expect("should run meshcni binary")
}

fn missing_config(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("absent.toml")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_resolve_with_defaults_when_config_missing() {
    let dir = TempDir::new().expect("should create temp dir");
    let output = meshcni(
        &missing_config(&dir),
        &[
            "--output",
            "json",
            "resolve",
            "-a",
            "sidecar.istio.io/interceptionMode=TPROXY",
            "--port",
            "80",
            "--port",
            "443",
        ],
    );

    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    assert_eq!(json["config"]["redirectMode"], "TPROXY");
    assert_eq!(json["config"]["includePorts"], "80,443");
    assert_eq!(json["config"]["noRedirectUid"], "1337");
}

#[test]
fn test_resolve_invalid_annotation_exits_3() {
    let dir = TempDir::new().expect("should create temp dir");
    let output = meshcni(
        &missing_config(&dir),
        &["resolve", "-a", "sidecar.istio.io/interceptionMode=BOGUS"],
    );
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("BOGUS"));
}

#[test]
fn test_include_ports_fallback_requires_flag() {
    let dir = TempDir::new().expect("should create temp dir");
    let config = missing_config(&dir);
    let base = [
        "--output",
        "json",
        "resolve",
        "-a",
        "traffic.sidecar.istio.io/includeInboundPorts=70000",
        "--port",
        "8080",
    ];

    let output = meshcni(&config, &base);
    assert_eq!(output.status.code(), Some(3));

    let mut with_flag = base.to_vec();
    with_flag.push("--allow-port-fallback");
    let output = meshcni(&config, &with_flag);
    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    assert_eq!(json["config"]["includePorts"], "8080");
    assert!(json["fallback"].as_str().unwrap_or_default().contains("70000"));
}

#[test]
fn test_later_field_error_still_reports_include_ports() {
    let dir = TempDir::new().expect("should create temp dir");
    let output = meshcni(
        &missing_config(&dir),
        &[
            "resolve",
            "-a",
            "traffic.sidecar.istio.io/includeInboundPorts=70000",
            "-a",
            "traffic.sidecar.istio.io/excludeInboundPorts=*",
            "--port",
            "8080",
            "--allow-port-fallback",
        ],
    );
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("excludePorts"), "stderr: {stderr}");
    assert!(stderr.contains("70000"), "stderr: {stderr}");
}

#[test]
fn test_render_prints_invocation() {
    let dir = TempDir::new().expect("should create temp dir");
    let output = meshcni(
        &missing_config(&dir),
        &["render", "--netns", "/var/run/netns/cni-1", "--proxy-uid", "5000"],
    );
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("nsenter --net=/var/run/netns/cni-1 /opt/cni/bin/istio-iptables.sh"));
    assert!(stdout.contains("-u 5000"));
}

#[test]
fn test_annotations_file_is_read() {
    let dir = TempDir::new().expect("should create temp dir");
    let annotations = dir.path().join("pod.json");
    fs::write(
        &annotations,
        r#"{"traffic.sidecar.istio.io/excludeOutboundIPRanges": "10.96.0.0/12"}"#,
    )
    .expect("should write annotations");

    let output = meshcni(
        &missing_config(&dir),
        &[
            "--output",
            "json",
            "render",
            "--netns",
            "/proc/1/ns/net",
            "--annotations",
            annotations.to_str().expect("utf-8 path"),
        ],
    );
    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    let args = json["invocation"]["args"].as_array().expect("args array");
    let x = args.iter().position(|a| a == "-x").expect("-x flag");
    assert_eq!(args[x + 1], "10.96.0.0/12");
}

#[test]
fn test_config_validate_reports_invalid_file() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("meshcni.toml");
    fs::write(&path, "[redirect]\ntarget_port = \"not-a-port\"\n").expect("should write config");

    let output = meshcni(&path, &["config", "validate"]);
    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("INVALID"));
}

#[test]
fn test_config_validate_missing_file_exits_2() {
    let dir = TempDir::new().expect("should create temp dir");
    let output = meshcni(&missing_config(&dir), &["config", "validate"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_config_show_section_json() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("meshcni.toml");
    fs::write(&path, "[general]\nlog_format = \"pretty\"\n").expect("should write config");

    let output = meshcni(&path, &["--output", "json", "config", "show", "--section", "redirect"]);
    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    assert_eq!(json["section"], "redirect");
}

#[cfg(unix)]
#[test]
fn test_redirect_failure_exits_4() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("meshcni.toml");
    // sh 는 --net 옵션을 거부하고 실패 종료
    fs::write(&path, "[redirect]\nnsenter_path = \"sh\"\n").expect("should write config");

    let output = meshcni(&path, &["redirect", "--netns", "/var/run/netns/cni-1"]);
    assert_eq!(output.status.code(), Some(4));
}

#[cfg(unix)]
#[test]
fn test_redirect_success() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("meshcni.toml");
    fs::write(&path, "[redirect]\nnsenter_path = \"true\"\n").expect("should write config");

    let output = meshcni(
        &path,
        &["--output", "json", "redirect", "--netns", "/var/run/netns/cni-1"],
    );
    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    assert_eq!(json["result"]["success"], true);
    assert_eq!(json["invocation"]["program"], "true");
}

#[test]
fn test_redirect_missing_tool_exits_4() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("meshcni.toml");
    fs::write(
        &path,
        "[redirect]\nnsenter_path = \"/nonexistent/meshcni-nsenter\"\n",
    )
    .expect("should write config");

    let output = meshcni(&path, &["redirect", "--netns", "/var/run/netns/cni-1"]);
    assert_eq!(output.status.code(), Some(4));
}
