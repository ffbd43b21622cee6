//! Generation Integration Tests
//!
//! These tests drive the whole pipeline the way the CLI does:
//! - Rust source parsed into descriptors
//! - HTTP and socket endpoints validated and synthesized
//! - Shared definitions merged and artifacts written to disk

#![allow(non_snake_case)]

use serde_json::json;
use typewire_codegen::prelude::*;
use typewire_codegen::registry::TypeRegistry;
use typewire_core::{ErrorCategory, FieldDescriptor, PrimitiveKind, TypeDescriptor, UnionConstraint};

const MODELS: &str = r#"
    use serde::{Deserialize, Serialize};

    /// A person record.
    #[derive(Serialize, Deserialize)]
    pub struct Person {
        #[serde(rename = "personID")]
        pub person_id: String,
        #[serde(rename = "traceID")]
        pub trace_id: Option<String>,
    }

    #[derive(Deserialize)]
    pub struct PersonPath {
        #[serde(rename = "ID")]
        pub id: String,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TraceHeaders {
        #[typewire(param = "X-Trace-Id")]
        pub trace_id: Option<String>,
    }

    #[derive(Serialize, Deserialize)]
    pub struct ClientMessage {
        #[serde(rename = "type")]
        pub kind: String,
        pub payload: serde_json::Value,
    }

    #[derive(Serialize, Deserialize)]
    pub struct ServerMessage {
        #[serde(rename = "type")]
        pub kind: String,
        pub payload: serde_json::Value,
    }

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Mood { Happy, Grumpy }

    #[derive(Serialize, Deserialize)]
    pub struct Chat {
        pub text: String,
        pub mood: Mood,
        pub author: Person,
    }
"#;

fn sources() -> SourceSet {
    let mut set = SourceSet::new();
    set.add_source("api", MODELS).unwrap();
    set
}

fn input(set: &SourceSet) -> GenerationInput {
    GenerationInput::new()
        .with_http(
            RawEndpoint::new("getPerson", "GET", "/person/:id")
                .with_path_params(set.resolve_named("PersonPath").unwrap())
                .with_headers(set.resolve_named("TraceHeaders").unwrap())
                .with_response(200, Some(set.resolve_named("Person").unwrap())),
        )
        .with_http(
            RawEndpoint::new("listPeople", "GET", "/people")
                .with_response(200, Some(set.resolve("Vec<Person>").unwrap())),
        )
        .with_socket(
            RawSocketEndpoint::new(
                "chat",
                "/ws/chat",
                set.resolve_named("ClientMessage").unwrap(),
                set.resolve_named("ServerMessage").unwrap(),
            )
            .with_message(
                "chat",
                set.resolve_named("Chat").unwrap(),
                set.resolve_named("Chat").unwrap(),
            ),
        )
}

fn contents<'a>(artifacts: &'a [Artifact], name: &str) -> &'a str {
    &artifacts
        .iter()
        .find(|a| a.file_name == name)
        .unwrap()
        .contents
}

#[test]
fn pipeline___placeholder_reads_renamed_path_field() {
    let set = sources();
    let artifacts = generate(&input(&set), &GeneratorConfig::default()).unwrap();

    let http = contents(&artifacts, "http.ts");
    assert!(http.contains("params.path.ID"));
    assert!(!http.contains("params.path.id"));
    assert!(http.contains("pathParams: ['ID'] as const"));
    assert!(http.contains("collectParams(params.headers, { traceId: 'X-Trace-Id' })"));
}

#[test]
fn pipeline___person_is_defined_once_across_files() {
    let set = sources();
    let artifacts = generate(&input(&set), &GeneratorConfig::default()).unwrap();

    let all: String = artifacts.iter().map(|a| a.contents.as_str()).collect();
    assert_eq!(all.matches("export interface Person {").count(), 1);
    assert!(contents(&artifacts, "shared.ts").contains("/** A person record. */"));
}

#[test]
fn pipeline___enum_field_becomes_literal_union() {
    let set = sources();
    let artifacts = generate(&input(&set), &GeneratorConfig::default()).unwrap();

    assert!(contents(&artifacts, "shared.ts").contains("mood: 'happy' | 'grumpy';"));
}

#[test]
fn pipeline___socket_client_is_typed() {
    let set = sources();
    let artifacts = generate(&input(&set), &GeneratorConfig::default()).unwrap();

    let socket = contents(&artifacts, "socket.ts");
    assert!(socket.contains("export class ChatSocket extends TypedSocket<ChatClientEvent, ChatServerEvent> {"));
    assert!(socket.contains("  onChat("));
    assert!(socket.contains("  onChatPayload("));
    assert!(socket.contains("  sendChat(payload: Chat): void {"));
}

#[test]
fn pipeline___output_is_byte_identical_across_runs() {
    let config = GeneratorConfig::default().with_base_path("/api");

    let first = generate(&input(&sources()), &config).unwrap();
    let second = generate(&input(&sources()), &config).unwrap();

    assert_eq!(first, second);
}

#[test]
fn pipeline___writes_files_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let set = sources();
    let artifacts = generate(&input(&set), &GeneratorConfig::default()).unwrap();

    let written = write_artifacts(dir.path(), &artifacts).unwrap();

    assert_eq!(written.len(), 3);
    for path in written {
        assert!(path.exists(), "{}", path.display());
    }
}

#[test]
fn pipeline___failed_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let set = sources();
    let mut raw = RawSocketEndpoint::new(
        "broken",
        "/ws/broken",
        set.resolve_named("ClientMessage").unwrap(),
        set.resolve_named("ServerMessage").unwrap(),
    )
    .with_message("a", TypeDescriptor::string(), TypeDescriptor::string());
    raw.message_types.push("b".into());
    raw.server_payloads.insert("b".into(), TypeDescriptor::string());
    let input = input(&set).with_socket(raw);

    let result = generate(&input, &GeneratorConfig::default())
        .and_then(|artifacts| write_artifacts(dir.path(), &artifacts));

    let err = result.unwrap_err();
    assert!(err.to_string().contains("`b`"));
    assert_eq!(err.category(), ErrorCategory::DescriptorValidation);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn pipeline___mixed_union_names_the_field() {
    let query = TypeDescriptor::anonymous(vec![
        FieldDescriptor::new("score", TypeDescriptor::primitive(PrimitiveKind::Any))
            .with_union(UnionConstraint::new(["1", "2.5", "true"])),
    ]);
    let input = GenerationInput::new().with_http(
        RawEndpoint::new("rate", "GET", "/rate").with_query(query),
    );

    let err = generate(&input, &GeneratorConfig::default()).unwrap_err();

    assert!(matches!(
        err.root(),
        GenError::HeterogeneousUnion { field, .. } if field == "score"
    ));
    assert!(err.to_string().contains("`score`"));
}

#[test]
fn pipeline___numeric_union_accepts_mixed_number_forms() {
    let query = TypeDescriptor::anonymous(vec![
        FieldDescriptor::new("score", TypeDescriptor::primitive(PrimitiveKind::Float))
            .with_union(UnionConstraint::new(["1", "2.5"])),
    ]);
    let input = GenerationInput::new().with_http(
        RawEndpoint::new("rate", "GET", "/rate").with_query(query),
    );

    let artifacts = generate(&input, &GeneratorConfig::default()).unwrap();

    assert!(contents(&artifacts, "http.ts").contains("score: 1 | 2.5"));
}

#[test]
fn validator___person_guard_semantics() {
    let set = sources();
    let mut registry = TypeRegistry::new(Int64Mode::Number);
    let name = registry.register(&set.resolve_named("Person").unwrap()).unwrap();

    assert!(!registry.validates(&name, &json!({})));
    assert!(registry.validates(&name, &json!({"personID": "x"})));
    assert!(registry.validates(&name, &json!({"personID": "x", "traceID": "y"})));
    assert!(registry.validates(&name, &json!({"personID": "x", "traceID": null})));
    assert!(!registry.validates(&name, &json!({"personID": 1})));
}
