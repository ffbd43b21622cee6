//! Socket client synthesis.

use super::{MessageDescriptor, SocketEndpointDescriptor};
use crate::artifact::{Artifact, assemble};
use crate::registry::{NameTable, TypeRegistry};
use crate::ts::{doc_comment, string_literal};
use crate::validate::guard_name;
use typewire_core::naming::{to_camel_case, to_pascal_case};
use typewire_core::{EndpointRef, GenResult, GeneratorConfig};

const RUNTIME: &str = include_str!("runtime.ts");

/// Top-level names declared by the socket runtime
pub const RUNTIME_NAMES: &[&str] = &[
    "Unsubscribe",
    "SocketHooks",
    "PayloadOptions",
    "Listener",
    "TypedSocket",
    "joinUrl",
];

/// Builds the socket client artifact
#[derive(Debug)]
pub struct SocketSynthesizer<'a> {
    config: &'a GeneratorConfig,
    registry: TypeRegistry,
}

/// Names of the declarations generated for one endpoint
struct UnitNames {
    class: String,
    client_event: String,
    server_event: String,
    metadata: String,
    factory: String,
}

impl UnitNames {
    fn for_endpoint(name: &str) -> Self {
        let pascal = to_pascal_case(name);
        Self {
            class: format!("{pascal}Socket"),
            client_event: format!("{pascal}ClientEvent"),
            server_event: format!("{pascal}ServerEvent"),
            metadata: format!("{}Endpoint", to_camel_case(name)),
            factory: format!("connect{pascal}"),
        }
    }
}

impl<'a> SocketSynthesizer<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        let mut registry = TypeRegistry::new(config.int64);
        registry.reserve(RUNTIME_NAMES.iter().copied());
        Self { config, registry }
    }

    /// Keep additional names away from registered types
    pub fn reserve<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registry.reserve(names);
    }

    /// Top-level names the units for these endpoints declare
    pub fn unit_names(endpoints: &[SocketEndpointDescriptor]) -> Vec<String> {
        endpoints
            .iter()
            .flat_map(|e| {
                let names = UnitNames::for_endpoint(&e.name);
                [
                    names.class,
                    names.client_event,
                    names.server_event,
                    names.metadata,
                    names.factory,
                ]
            })
            .collect()
    }

    /// Allocate type names after the ones another synthesizer handed out
    pub fn with_names(mut self, names: NameTable) -> Self {
        self.registry.adopt_names(names);
        self
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Render the artifact for a set of validated socket endpoints
    pub fn synthesize(self, endpoints: &[SocketEndpointDescriptor]) -> GenResult<Artifact> {
        self.synthesize_with_names(endpoints).map(|(artifact, _)| artifact)
    }

    /// Render the artifact and hand back the type names it allocated
    pub fn synthesize_with_names(
        mut self,
        endpoints: &[SocketEndpointDescriptor],
    ) -> GenResult<(Artifact, NameTable)> {
        self.registry.reserve(Self::unit_names(endpoints));

        let mut units = Vec::with_capacity(endpoints.len());
        for (index, endpoint) in endpoints.iter().enumerate() {
            let unit = self
                .unit(endpoint)
                .map_err(|e| e.in_endpoint(EndpointRef::socket(index, &endpoint.name)))?;
            units.push(unit);
        }

        let mut body = RUNTIME.trim_end().to_string();
        for unit in units {
            body.push_str("\n\n");
            body.push_str(&unit);
        }

        tracing::debug!(
            endpoints = endpoints.len(),
            types = self.registry.len(),
            "synthesized socket client"
        );

        let artifact = Artifact::new(
            self.config.socket_file.clone(),
            assemble(&self.config.banner, &self.registry.emit(), &body),
        );
        Ok((artifact, self.registry.into_names()))
    }

    fn unit(&mut self, endpoint: &SocketEndpointDescriptor) -> GenResult<String> {
        let client = self.registry.register(&endpoint.client_message)?;
        let server = self.registry.register(&endpoint.server_message)?;
        let names = UnitNames::for_endpoint(&endpoint.name);

        if endpoint.is_typed() {
            self.typed_unit(endpoint, &names, &server)
        } else {
            Ok(untyped_unit(endpoint, &names, &client, &server))
        }
    }

    fn typed_unit(
        &mut self,
        endpoint: &SocketEndpointDescriptor,
        names: &UnitNames,
        server_envelope: &str,
    ) -> GenResult<String> {
        let mut client_variants = Vec::with_capacity(endpoint.messages.len());
        let mut server_variants = Vec::with_capacity(endpoint.messages.len());
        let mut payloads = Vec::with_capacity(endpoint.messages.len());
        for message in &endpoint.messages {
            let client = self.registry.render(&message.client_payload)?.type_text;
            let server = self.registry.render(&message.server_payload)?.type_text;
            client_variants.push(variant(&message.tag, &client));
            server_variants.push(variant(&message.tag, &server));
            payloads.push((message, client, server));
        }

        let mut out = String::new();
        out.push_str(&event_union(&names.client_event, &client_variants));
        out.push_str("\n\n");
        out.push_str(&event_union(&names.server_event, &server_variants));
        out.push_str("\n\n");

        let class = &names.class;
        let server_event = &names.server_event;
        out.push_str(&doc_comment(&endpoint.docs, ""));
        out.push_str(&format!(
            "export class {class} extends TypedSocket<{}, {server_event}> {{\n",
            names.client_event
        ));
        out.push_str(&format!(
            "  static readonly endpointName = {};\n",
            string_literal(&endpoint.name)
        ));
        out.push_str(&format!(
            "  static readonly path = {};\n",
            string_literal(&endpoint.full_path)
        ));
        let tags = endpoint
            .messages
            .iter()
            .map(|m| string_literal(&m.tag))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("  static readonly messageTypes = [{tags}] as const;\n\n"));
        out.push_str(&format!(
            "  static connect(baseUrl: string, hooks: SocketHooks = {{}}): {class} {{\n    return new {class}(joinUrl(baseUrl, {class}.path), hooks);\n  }}\n"
        ));

        let envelope_guard = guard_name(server_envelope);
        for (message, client, server) in &payloads {
            out.push('\n');
            out.push_str(&message_methods(
                message,
                server_event,
                &envelope_guard,
                client,
                server,
            ));
        }
        out.push('}');

        Ok(out)
    }
}

fn variant(tag: &str, payload: &str) -> String {
    format!("{{ type: {}; payload: {payload} }}", string_literal(tag))
}

fn event_union(name: &str, variants: &[String]) -> String {
    let mut out = format!("export type {name} =");
    for variant in variants {
        out.push_str(&format!("\n  | {variant}"));
    }
    out.push(';');
    out
}

fn message_methods(
    message: &MessageDescriptor,
    server_event: &str,
    envelope_guard: &str,
    client_payload: &str,
    server_payload: &str,
) -> String {
    let tag = string_literal(&message.tag);
    let suffix = &message.suffix;
    let narrowed = format!("Extract<{server_event}, {{ type: {tag} }}>");

    let mut out = String::new();
    out.push_str(&format!(
        "  on{suffix}(listener: (message: {narrowed}) => void, validate?: (message: unknown) => boolean): Unsubscribe {{\n"
    ));
    out.push_str(&format!(
        "    return this.onType({tag}, listener as (message: {server_event}) => void, validate);\n  }}\n\n"
    ));
    out.push_str(&format!(
        "  on{suffix}Payload(listener: (payload: {server_payload}) => void, options: PayloadOptions<{server_payload}> = {{}}): Unsubscribe {{\n"
    ));
    out.push_str(&format!(
        "    return this.onPayload<{server_payload}>({tag}, listener, {{ validateEnvelope: {envelope_guard}, ...options }});\n  }}\n\n"
    ));
    out.push_str(&format!(
        "  send{suffix}(payload: {client_payload}): void {{\n    this.send({{ type: {tag}, payload }});\n  }}\n"
    ));
    out
}

fn untyped_unit(
    endpoint: &SocketEndpointDescriptor,
    names: &UnitNames,
    client: &str,
    server: &str,
) -> String {
    let metadata = &names.metadata;
    let mut out = doc_comment(&endpoint.docs, "");
    out.push_str(&format!(
        "export const {metadata} = {{\n  name: {},\n  path: {},\n}} as const;\n\n",
        string_literal(&endpoint.name),
        string_literal(&endpoint.full_path)
    ));
    out.push_str(&format!(
        "export function {}(baseUrl: string, hooks: SocketHooks = {{}}): TypedSocket<{client}, {server}> {{\n  return new TypedSocket<{client}, {server}>(joinUrl(baseUrl, {metadata}.path), hooks);\n}}",
        names.factory
    ));
    out
}
