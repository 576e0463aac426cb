//! Unit tests for CLI commands

use crate::cli::{run_with_writer, Cli, Commands};
use clap::Parser;
use std::io::Write;

const MANIFEST: &str = r#"
middleware: [tracing, metrics]
routes:
  - methods: [GET, POST]
    pattern: /
    handler: Home::index
groups:
  - prefix: /api
    routes:
      - methods: GET
        pattern: /user/{id:\d+}
        handler: Users::show
"#;

fn manifest_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(MANIFEST.as_bytes()).unwrap();
    file
}

fn run(args: &[&str]) -> String {
    let cli = Cli::try_parse_from(args).unwrap();
    let mut out = Vec::new();
    run_with_writer(&cli, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_resolve_command_defaults() {
    let cli = Cli::try_parse_from(["waypoint", "resolve", "--manifest", "r.yaml", "--path", "/"])
        .unwrap();
    match cli.command {
        Commands::Resolve {
            method, run, headers, ..
        } => {
            assert_eq!(method, "GET");
            assert!(!run);
            assert!(headers.is_empty());
        }
        Commands::Routes { .. } => panic!("Expected Resolve command"),
    }
}

#[test]
fn test_routes_lists_rules_in_order() {
    let file = manifest_file();
    let path = file.path().to_str().unwrap();
    let output = run(&["waypoint", "routes", "--manifest", path]);
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(
        lines,
        vec![
            "GET / -> Home::index",
            "POST / -> Home::index",
            "GET /api/user/{id:\\d+} -> Users::show",
        ]
    );
}

#[test]
fn test_resolve_prints_params_and_allowed_methods() {
    let file = manifest_file();
    let path = file.path().to_str().unwrap();

    let found = run(&["waypoint", "resolve", "-m", path, "-p", "/api/user/42"]);
    assert!(found.starts_with("Found GET /api/user/{id:\\d+} -> Users::show"));
    assert!(found.contains("  id = 42"));

    let not_allowed = run(&["waypoint", "resolve", "-m", path, "-X", "PUT", "-p", "/"]);
    assert_eq!(not_allowed.trim(), "MethodNotAllowed allowed=GET, POST");

    let missing = run(&["waypoint", "resolve", "-m", path, "-p", "/nope"]);
    assert_eq!(missing.trim(), "NotFound");
}

#[test]
fn test_resolve_run_executes_echo_handler() {
    let file = manifest_file();
    let path = file.path().to_str().unwrap();
    let output = run(&[
        "waypoint",
        "resolve",
        "-m",
        path,
        "-p",
        "/api/user/7?tab=posts",
        "-H",
        "x-trace: abc",
        "--run",
    ]);
    assert!(output.starts_with("HTTP 200 OK"));
    assert!(output.contains("\"handler\":\"Users::show\""));
    assert!(output.contains("\"id\":\"7\""));
}

#[test]
fn test_malformed_header_is_rejected() {
    let file = manifest_file();
    let path = file.path().to_str().unwrap();
    let cli = Cli::try_parse_from(["waypoint", "resolve", "-m", path, "-p", "/", "-H", "nocolon"])
        .unwrap();
    let mut out = Vec::new();
    assert!(run_with_writer(&cli, &mut out).is_err());
}

#[test]
fn test_resolve_run_uses_html_fallbacks() {
    let file = manifest_file();
    let path = file.path().to_str().unwrap();

    let missing = run(&["waypoint", "resolve", "-m", path, "-p", "/nope", "--run"]);
    assert!(missing.starts_with("HTTP 404 Not Found"));
    assert!(missing.contains("<h1>404 Not Found</h1>"));

    let not_allowed = run(&["waypoint", "resolve", "-m", path, "-X", "PUT", "-p", "/", "--run"]);
    assert!(not_allowed.starts_with("HTTP 405 Method Not Allowed"));
    assert!(not_allowed.contains("Allow: GET, POST"));
    assert!(not_allowed.contains("<h1>405 Method Not Allowed</h1>"));
}
