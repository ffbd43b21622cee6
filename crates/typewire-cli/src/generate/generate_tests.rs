#![allow(non_snake_case)]

use super::*;
use std::fs;

const MODELS: &str = r#"
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    pub struct Person {
        pub name: String,
    }

    #[derive(Deserialize)]
    pub struct PersonPath {
        pub id: String,
    }

    #[derive(Serialize, Deserialize)]
    pub struct Envelope {
        #[serde(rename = "type")]
        pub kind: String,
        pub payload: serde_json::Value,
    }
"#;

const ENDPOINTS: &str = r#"
[[sources]]
package = "api"
path = "models.rs"

[[http]]
name = "getPerson"
method = "GET"
path = "/person/:id"
path_params = "PersonPath"

[[http.responses]]
status = 200
body = "Person"

[[socket]]
name = "people"
path = "/ws/people"
client_message = "Envelope"
server_message = "Envelope"
message_types = ["watch"]

[socket.client_payloads]
watch = "String"

[socket.server_payloads]
watch = "Person"
"#;

/// Manifest text with the given `[generator]` body
fn manifest(generator: &str) -> String {
    format!("output = \"out\"\n\n[generator]\n{generator}\n{ENDPOINTS}")
}

fn project(manifest: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("models.rs"), MODELS).unwrap();
    fs::write(dir.path().join("typewire.toml"), manifest).unwrap();
    dir
}

fn options(dir: &Path) -> GenerateOptions {
    GenerateOptions {
        manifest: Some(dir.join("typewire.toml")),
        output: None,
        no_format: true,
    }
}

#[test]
fn generate___valid_project___writes_three_artifacts() {
    let dir = project(&manifest(""));

    let written = generate(&options(dir.path())).unwrap();

    let out = dir.path().join("out");
    assert_eq!(
        written,
        vec![
            out.join("http.ts"),
            out.join("socket.ts"),
            out.join("shared.ts")
        ]
    );
    let shared = fs::read_to_string(out.join("shared.ts")).unwrap();
    assert!(shared.contains("export interface Person {"));
    let http = fs::read_to_string(out.join("http.ts")).unwrap();
    assert!(http.contains("from './shared';"));
}

#[test]
fn generate___output_option___overrides_manifest() {
    let dir = project(&manifest(""));
    let target = dir.path().join("elsewhere");

    let written = generate(&GenerateOptions {
        output: Some(target.clone()),
        ..options(dir.path())
    })
    .unwrap();

    assert!(written.iter().all(|p| p.starts_with(&target)));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn generate___split_mode___no_shared_file() {
    let dir = project(&manifest("unified = false"));

    let written = generate(&options(dir.path())).unwrap();

    assert_eq!(written.len(), 2);
    assert!(!dir.path().join("out/shared.ts").exists());
}

#[test]
fn generate___missing_payload___writes_nothing() {
    let broken = manifest("").replace("message_types = [\"watch\"]", "message_types = [\"watch\", \"stop\"]");
    let dir = project(&broken);

    let err = generate(&options(dir.path())).unwrap_err();

    assert!(format!("{err:#}").contains("stop"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn generate___missing_manifest___fails_with_path() {
    let dir = tempfile::tempdir().unwrap();

    let err = generate(&options(dir.path())).unwrap_err();

    assert!(format!("{err:#}").contains("typewire.toml"));
}

#[cfg(unix)]
#[test]
fn generate___formatter_configured___applied_unless_disabled() {
    let dir = project(&manifest(r#"formatter = ["sh", "-c", "tr a-z A-Z"]"#));

    generate(&GenerateOptions {
        no_format: false,
        ..options(dir.path())
    })
    .unwrap();
    let formatted = fs::read_to_string(dir.path().join("out/shared.ts")).unwrap();
    assert!(formatted.contains("EXPORT INTERFACE PERSON {"));

    generate(&options(dir.path())).unwrap();
    let plain = fs::read_to_string(dir.path().join("out/shared.ts")).unwrap();
    assert!(plain.contains("export interface Person {"));
}

#[cfg(unix)]
#[test]
fn generate___failing_formatter___keeps_unformatted_output() {
    let dir = project(&manifest(r#"formatter = ["false"]"#));

    generate(&GenerateOptions {
        no_format: false,
        ..options(dir.path())
    })
    .unwrap();

    let shared = fs::read_to_string(dir.path().join("out/shared.ts")).unwrap();
    assert!(shared.contains("export interface Person {"));
}

#[cfg(unix)]
#[test]
fn generate___hung_formatter___killed_at_configured_timeout() {
    let dir = project(&manifest(
        "formatter = [\"sh\", \"-c\", \"exec sleep 30\"]\nformatter_timeout_ms = 100",
    ));
    let started = std::time::Instant::now();

    generate(&GenerateOptions {
        no_format: false,
        ..options(dir.path())
    })
    .unwrap();

    assert!(started.elapsed() < std::time::Duration::from_secs(10));
    let shared = fs::read_to_string(dir.path().join("out/shared.ts")).unwrap();
    assert!(shared.contains("export interface Person {"));
}
