//! CLI Integration Tests
//!
//! These tests run the built `typewire` binary against a project in a
//! temporary directory:
//! - `check` validates without writing
//! - `generate` writes every artifact next to the manifest
//! - failures exit non-zero and leave no output behind

#![allow(non_snake_case)]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const MODELS: &str = r#"
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Person {
        pub full_name: String,
        pub nick_name: Option<String>,
    }
"#;

const MANIFEST: &str = r#"
[[sources]]
package = "api"
path = "src/models.rs"

[[http]]
name = "listPeople"
method = "GET"
path = "/people"

[[http.responses]]
status = 200
body = "Vec<Person>"
"#;

fn typewire(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_typewire"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn project(manifest: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/models.rs"), MODELS).unwrap();
    fs::write(dir.path().join("typewire.toml"), manifest).unwrap();
    dir
}

#[test]
fn check___valid_manifest___succeeds_without_writing() {
    let dir = project(MANIFEST);

    let output = typewire(dir.path(), &["check"]);

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Manifest is valid!"));
    assert!(stdout.contains("http.ts"));
    assert!(!dir.path().join("generated").exists());
}

#[test]
fn generate___default_paths___writes_generated_dir() {
    let dir = project(MANIFEST);

    let output = typewire(dir.path(), &["generate", "--no-format"]);

    assert!(output.status.success(), "{output:?}");
    let shared = fs::read_to_string(dir.path().join("generated/shared.ts")).unwrap();
    assert!(shared.contains("fullName: string;"));
    assert!(shared.contains("nickName?: string | null;"));
    assert!(dir.path().join("generated/http.ts").exists());
}

#[test]
fn generate___explicit_manifest_and_output___honored() {
    let dir = project(MANIFEST);
    let nested = dir.path().join("config");
    fs::create_dir_all(&nested).unwrap();
    fs::write(
        nested.join("api.toml"),
        MANIFEST.replace("src/models.rs", "../src/models.rs"),
    )
    .unwrap();

    let output = typewire(
        dir.path(),
        &["generate", "-m", "config/api.toml", "-o", "client", "--no-format"],
    );

    assert!(output.status.success(), "{output:?}");
    assert!(dir.path().join("client/http.ts").exists());
}

#[test]
fn generate___unknown_type___fails_and_writes_nothing() {
    let dir = project(&MANIFEST.replace("Vec<Person>", "Vec<Human>"));

    let output = typewire(dir.path(), &["generate"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("listPeople"), "{stderr}");
    assert!(!dir.path().join("generated").exists());
}

#[test]
fn check___missing_manifest___fails() {
    let dir = tempfile::tempdir().unwrap();

    let output = typewire(dir.path(), &["check"]);

    assert!(!output.status.success());
}
