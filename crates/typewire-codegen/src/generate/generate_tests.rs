#![allow(non_snake_case)]

use super::*;
use typewire_core::{
    Direction, FieldDescriptor, GenError, NamedType, PrimitiveKind, TypeDescriptor,
    UnionConstraint,
};

fn person() -> TypeDescriptor {
    TypeDescriptor::named(NamedType::new(
        "api",
        "Person",
        vec![
            FieldDescriptor::new("personID", TypeDescriptor::string()),
            FieldDescriptor::new(
                "scores",
                TypeDescriptor::map(PrimitiveKind::String, TypeDescriptor::primitive(PrimitiveKind::Int)),
            ),
            FieldDescriptor::new("role", TypeDescriptor::string())
                .with_union(UnionConstraint::new(["admin", "member"])),
        ],
    ))
}

fn envelope(name: &str) -> TypeDescriptor {
    TypeDescriptor::named(NamedType::new(
        "ws",
        name,
        vec![
            FieldDescriptor::new("type", TypeDescriptor::string()),
            FieldDescriptor::new("payload", TypeDescriptor::primitive(PrimitiveKind::Any)),
        ],
    ))
}

fn input() -> GenerationInput {
    GenerationInput::new()
        .with_http(
            RawEndpoint::new("getPerson", "GET", "/person/:id")
                .with_path_params(TypeDescriptor::anonymous(vec![FieldDescriptor::new(
                    "ID",
                    TypeDescriptor::string(),
                )]))
                .with_response(200, Some(person())),
        )
        .with_socket(
            RawSocketEndpoint::new("people", "/ws/people", envelope("ClientMessage"), envelope("ServerMessage"))
                .with_message("update", person(), person()),
        )
}

fn file<'a>(artifacts: &'a [Artifact], name: &str) -> &'a Artifact {
    artifacts
        .iter()
        .find(|a| a.file_name == name)
        .unwrap_or_else(|| panic!("missing {name}"))
}

#[test]
fn generate___unified_produces_three_files() {
    let artifacts = generate(&input(), &GeneratorConfig::default()).unwrap();

    let names: Vec<_> = artifacts.iter().map(|a| a.file_name.as_str()).collect();
    assert_eq!(names, vec!["http.ts", "socket.ts", "shared.ts"]);
}

#[test]
fn generate___shared_type_emitted_once_and_imported_by_both() {
    let artifacts = generate(&input(), &GeneratorConfig::default()).unwrap();

    let shared = &file(&artifacts, "shared.ts").contents;
    assert_eq!(shared.matches("export interface Person {").count(), 1);
    assert_eq!(shared.matches("export function isPerson(").count(), 1);

    for name in ["http.ts", "socket.ts"] {
        let contents = &file(&artifacts, name).contents;
        assert!(!contents.contains("export interface Person {"), "{name}");
        assert!(contents.contains("from './shared';"), "{name}");
    }
}

#[test]
fn generate___socket_imports_server_envelope_guard() {
    let artifacts = generate(&input(), &GeneratorConfig::default()).unwrap();

    let socket = &file(&artifacts, "socket.ts").contents;
    let import = socket
        .lines()
        .find(|l| l.starts_with("import"))
        .unwrap();
    assert!(import.contains("isServerMessage"));
    assert!(import.contains("Person"));
    assert!(!import.contains("ensurePerson"));
}

#[test]
fn generate___split_mode_keeps_regions() {
    let config = GeneratorConfig::default().with_unified(false);

    let artifacts = generate(&input(), &config).unwrap();

    assert_eq!(artifacts.len(), 2);
    for artifact in &artifacts {
        assert!(artifact.contents.contains("export interface Person {"));
        assert!(!artifact.contents.contains("import {"));
    }
}

#[test]
fn generate___is_deterministic() {
    let config = GeneratorConfig::default();

    let first = generate(&input(), &config).unwrap();
    let second = generate(&input(), &config).unwrap();

    assert_eq!(first, second);
}

#[test]
fn generate___http_only_still_unifies() {
    let mut input = input();
    input.sockets.clear();

    let artifacts = generate(&input, &GeneratorConfig::default()).unwrap();

    let names: Vec<_> = artifacts.iter().map(|a| a.file_name.as_str()).collect();
    assert_eq!(names, vec!["http.ts", "shared.ts"]);
}

#[test]
fn generate___empty_input_produces_nothing() {
    let artifacts = generate(&GenerationInput::new(), &GeneratorConfig::default()).unwrap();

    assert!(artifacts.is_empty());
}

#[test]
fn generate___missing_payload_fails_whole_run() {
    let mut raw = RawSocketEndpoint::new("chat", "/ws", envelope("In"), envelope("Out"))
        .with_message("a", TypeDescriptor::string(), TypeDescriptor::string());
    raw.message_types.push("b".into());
    raw.server_payloads.insert("b".into(), TypeDescriptor::string());
    let input = input().with_socket(raw);

    let err = generate(&input, &GeneratorConfig::default()).unwrap_err();

    assert_eq!(
        err.root(),
        &GenError::MissingPayload {
            message_type: "b".into(),
            direction: Direction::Client,
        }
    );
    assert!(err.to_string().contains("`b`"));
}

#[test]
fn generate___invalid_config_is_rejected_first() {
    let config = GeneratorConfig {
        http_file: "out.ts".into(),
        socket_file: "out.ts".into(),
        ..GeneratorConfig::default()
    };

    let err = generate(&input(), &config).unwrap_err();

    assert!(matches!(err, GenError::Config(_)));
}

#[test]
fn generate___socket_unit_names_stay_clear_of_http_types() {
    let clash = TypeDescriptor::named(NamedType::new(
        "api",
        "PeopleSocket",
        vec![FieldDescriptor::new("id", TypeDescriptor::string())],
    ));
    let mut input = input();
    input.http[0] = input.http[0].clone().with_request(clash);
    input.http[0].method = "POST".into();

    let artifacts = generate(&input, &GeneratorConfig::default()).unwrap();

    let shared = &file(&artifacts, "shared.ts").contents;
    assert!(shared.contains("export interface PeopleSocket2 {"));
    assert!(file(&artifacts, "socket.ts").contents.contains("export class PeopleSocket extends"));
}

#[test]
fn generate___same_name_different_shapes_across_files___both_kept() {
    let http_person = TypeDescriptor::named(NamedType::new(
        "api",
        "Person",
        vec![FieldDescriptor::new("name", TypeDescriptor::string())],
    ));
    let socket_person = TypeDescriptor::named(NamedType::new(
        "ws",
        "Person",
        vec![FieldDescriptor::new("age", TypeDescriptor::primitive(PrimitiveKind::Int))],
    ));
    let input = GenerationInput::new()
        .with_http(RawEndpoint::new("getPerson", "GET", "/person").with_response(200, Some(http_person)))
        .with_socket(
            RawSocketEndpoint::new("people", "/ws/people", envelope("ClientMessage"), envelope("ServerMessage"))
                .with_message("update", socket_person.clone(), socket_person),
        );

    let artifacts = generate(&input, &GeneratorConfig::default()).unwrap();

    let shared = &file(&artifacts, "shared.ts").contents;
    assert!(shared.contains("export interface Person {\n  name: string;\n}"), "{shared}");
    assert!(shared.contains("export interface Person2 {\n  age: number;\n}"), "{shared}");
    assert!(shared.contains("export function isPerson2("));
    let socket = &file(&artifacts, "socket.ts").contents;
    let import = socket.lines().find(|l| l.starts_with("import")).unwrap();
    assert!(import.contains("Person2"), "{import}");
    assert!(!import.split(|c: char| !c.is_alphanumeric()).any(|w| w == "Person"), "{import}");
}

#[test]
fn generate___same_name_different_shapes_split_mode___each_file_keeps_plain_name() {
    let other = TypeDescriptor::named(NamedType::new(
        "ws",
        "Person",
        vec![FieldDescriptor::new("age", TypeDescriptor::primitive(PrimitiveKind::Int))],
    ));
    let mut input = input();
    input.sockets[0] = input.sockets[0].clone().with_message("other", other.clone(), other);
    let config = GeneratorConfig::default().with_unified(false);

    let artifacts = generate(&input, &config).unwrap();

    let socket = &file(&artifacts, "socket.ts").contents;
    assert!(socket.contains("export interface Person {"));
    assert!(socket.contains("export interface Person2 {"));
    assert!(!file(&artifacts, "http.ts").contents.contains("Person2"));
}
