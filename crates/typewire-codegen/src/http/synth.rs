//! HTTP client synthesis.

use super::{ContentKind, EndpointDescriptor, PathSegment};
use crate::artifact::{Artifact, assemble};
use crate::registry::{NameTable, Rendered, TypeRegistry};
use crate::ts::{doc_comment, property_access, property_key, string_literal, template_text};
use std::collections::BTreeMap;
use typewire_core::naming::to_pascal_case;
use typewire_core::{EndpointRef, GenResult, GeneratorConfig, TypeDescriptor};

const RUNTIME: &str = include_str!("runtime.ts");

/// Top-level names declared by the HTTP runtime
pub const RUNTIME_NAMES: &[&str] = &[
    "HttpMethod",
    "ContentKind",
    "RequestConfig",
    "TransformHooks",
    "HttpError",
    "collectParams",
    "withQuery",
    "defaultContentType",
    "encodeBody",
    "toRequestInit",
    "decodeResponse",
    "send",
];

/// Builds the HTTP client artifact
#[derive(Debug)]
pub struct HttpSynthesizer<'a> {
    config: &'a GeneratorConfig,
    registry: TypeRegistry,
}

/// A parameter group as it appears in the params interface
struct Group {
    key: &'static str,
    type_text: String,
    required: bool,
    renames: BTreeMap<String, String>,
}

impl<'a> HttpSynthesizer<'a> {
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
    pub fn unit_names(endpoints: &[EndpointDescriptor]) -> Vec<String> {
        endpoints
            .iter()
            .flat_map(|e| [e.name.clone(), params_name(&e.name)])
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

    /// Render the artifact for a set of validated endpoints
    pub fn synthesize(self, endpoints: &[EndpointDescriptor]) -> GenResult<Artifact> {
        self.synthesize_with_names(endpoints).map(|(artifact, _)| artifact)
    }

    /// Render the artifact and hand back the type names it allocated
    pub fn synthesize_with_names(
        mut self,
        endpoints: &[EndpointDescriptor],
    ) -> GenResult<(Artifact, NameTable)> {
        self.registry.reserve(Self::unit_names(endpoints));

        let mut units = Vec::with_capacity(endpoints.len());
        for (index, endpoint) in endpoints.iter().enumerate() {
            let unit = self
                .unit(endpoint)
                .map_err(|e| e.in_endpoint(EndpointRef::http(index, &endpoint.name)))?;
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
            "synthesized http client"
        );

        let artifact = Artifact::new(
            self.config.http_file.clone(),
            assemble(&self.config.banner, &self.registry.emit(), &body),
        );
        Ok((artifact, self.registry.into_names()))
    }

    fn unit(&mut self, endpoint: &EndpointDescriptor) -> GenResult<String> {
        let groups = self.groups(endpoint)?;
        let params_type = params_name(&endpoint.name);
        let params_default = if groups.iter().any(|g| g.required) {
            ""
        } else {
            " = {}"
        };

        let body_type = match &endpoint.request {
            Some(ty) => Some(self.request_payload(ty, endpoint.request_content)?),
            None => None,
        };
        let response = match endpoint.primary_response().and_then(|r| r.body.as_ref()) {
            Some(ty) => Some(self.response_payload(ty, endpoint.response_content)?),
            None => None,
        };
        let response_type = response
            .as_ref()
            .map(|(text, _)| text.clone())
            .unwrap_or_else(|| "void".to_string());

        let name = &endpoint.name;
        let mut out = String::new();

        // Params interface
        if groups.is_empty() {
            out.push_str(&format!(
                "export type {params_type} = Record<string, never>;\n\n"
            ));
        } else {
            out.push_str(&format!("export interface {params_type} {{\n"));
            for group in &groups {
                let separator = if group.required { ":" } else { "?:" };
                out.push_str(&format!("  {}{separator} {};\n", group.key, group.type_text));
            }
            out.push_str("}\n\n");
        }

        // Endpoint unit
        out.push_str(&doc_comment(&endpoint.docs, ""));
        out.push_str(&format!("export const {name} = {{\n"));
        out.push_str(&format!("  name: {},\n", string_literal(name)));
        out.push_str(&format!("  method: '{}' as const,\n", endpoint.method));
        out.push_str(&format!("  path: {},\n", string_literal(&endpoint.full_path)));
        out.push_str(&format!("  pathParams: [{}] as const,\n", self.path_param_list(endpoint)));
        out.push_str(&format!(
            "  requestKind: '{}' as const,\n",
            endpoint.request_content
        ));
        out.push_str(&format!(
            "  responseKind: '{}' as const,\n",
            endpoint.response_content
        ));

        out.push_str(&format!(
            "  buildUrl(params: {params_type}{params_default}): string {{\n    return `{}`;\n  }},\n",
            url_template(endpoint)
        ));

        let body_param = body_type
            .as_ref()
            .map(|ty| format!(", body: {ty}"))
            .unwrap_or_default();
        out.push_str(&format!(
            "  buildRequest(params: {params_type}{params_default}{body_param}): RequestConfig {{\n"
        ));
        out.push_str("    return {\n");
        out.push_str(&format!("      method: '{}',\n", endpoint.method));
        out.push_str(&format!("      url: {name}.buildUrl(params),\n"));
        for key in ["query", "headers", "cookies"] {
            let value = match groups.iter().find(|g| g.key == key) {
                Some(group) => format!(
                    "collectParams(params.{key}, {})",
                    rename_table(&group.renames)
                ),
                None => "{}".to_string(),
            };
            out.push_str(&format!("      {key}: {value},\n"));
        }
        if body_type.is_some() {
            out.push_str("      body,\n");
        }
        out.push_str(&format!(
            "      contentKind: '{}',\n",
            endpoint.request_content
        ));
        out.push_str(&format!(
            "      responseKind: '{}',\n",
            endpoint.response_content
        ));
        // Without a declared 2xx the result comes from an error status, so
        // that status must not be raised as an HttpError
        if let Some(primary) = endpoint.primary_response().filter(|r| !r.is_success()) {
            out.push_str(&format!("      expectedStatus: {},\n", primary.status));
        }
        out.push_str("    };\n  },\n");

        if let Some((type_text, Some(rendered))) = &response {
            out.push_str(&format!(
                "  validateResponse(value: unknown): value is {type_text} {{\n    return {};\n  }},\n",
                rendered.check.render("value", 0)
            ));
        }

        let body_arg = if body_type.is_some() { ", body" } else { "" };
        out.push_str(&format!(
            "  async execute(params: {params_type}{params_default}{body_param}, hooks: TransformHooks = {{}}): Promise<{response_type}> {{\n"
        ));
        match &response {
            None => {
                out.push_str(&format!(
                    "    await send({name}.buildRequest(params{body_arg}), hooks);\n"
                ));
            }
            Some((type_text, validated)) => {
                out.push_str(&format!(
                    "    const data = await send({name}.buildRequest(params{body_arg}), hooks);\n"
                ));
                if validated.is_some() {
                    out.push_str(&format!(
                        "    if (hooks.validateResponse === true && !{name}.validateResponse(data)) {{\n      throw new TypeError({});\n    }}\n",
                        string_literal(&format!("{name}: response does not match {type_text}"))
                    ));
                }
                out.push_str(&format!("    return data as {type_text};\n"));
            }
        }
        out.push_str("  },\n};");

        Ok(out)
    }

    fn groups(&mut self, endpoint: &EndpointDescriptor) -> GenResult<Vec<Group>> {
        let mut groups = Vec::new();
        for (key, ty) in endpoint.params.iter() {
            let rendered = self.registry.render(ty)?;
            let fields = ty.fields().unwrap_or(&[]);
            let renames = fields
                .iter()
                .filter(|f| f.param_key() != f.name)
                .map(|f| (f.name.clone(), f.param_key().to_string()))
                .collect();
            let required = fields.iter().any(|f| !f.optional);
            groups.push(Group {
                key,
                type_text: rendered.type_text,
                required,
                renames,
            });
        }
        Ok(groups)
    }

    /// Request body type for the declared content kind
    fn request_payload(&mut self, ty: &TypeDescriptor, kind: ContentKind) -> GenResult<String> {
        match kind.request_type() {
            Some(text) => Ok(text.to_string()),
            None => Ok(self.registry.render(ty)?.type_text),
        }
    }

    /// Response type, plus the structural check when the body is JSON
    fn response_payload(
        &mut self,
        ty: &TypeDescriptor,
        kind: ContentKind,
    ) -> GenResult<(String, Option<Rendered>)> {
        match kind.response_type() {
            Some(text) => Ok((text.to_string(), None)),
            None => {
                let rendered = self.registry.render(ty)?;
                Ok((rendered.type_text.clone(), Some(rendered)))
            }
        }
    }

    fn path_param_list(&self, endpoint: &EndpointDescriptor) -> String {
        endpoint
            .params
            .path
            .as_ref()
            .and_then(|ty| ty.fields())
            .unwrap_or(&[])
            .iter()
            .map(|f| string_literal(&f.name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Name of the params interface for an endpoint
pub(crate) fn params_name(endpoint: &str) -> String {
    format!("{}Params", to_pascal_case(endpoint))
}

/// Template literal body that substitutes encoded path parameters
fn url_template(endpoint: &EndpointDescriptor) -> String {
    let mut out = String::new();
    for segment in &endpoint.segments {
        match segment {
            PathSegment::Literal(text) => out.push_str(&template_text(text)),
            PathSegment::Placeholder(placeholder) => {
                let field = endpoint.binding(placeholder).unwrap_or(placeholder);
                out.push_str(&format!(
                    "${{encodeURIComponent(String({}))}}",
                    property_access("params.path", field)
                ));
            }
        }
    }
    out
}

fn rename_table(renames: &BTreeMap<String, String>) -> String {
    if renames.is_empty() {
        return "{}".to_string();
    }
    let entries = renames
        .iter()
        .map(|(field, key)| format!("{}: {}", property_key(field), string_literal(key)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{ {entries} }}")
}
