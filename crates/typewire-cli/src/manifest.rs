//! Manifest parsing and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use typewire_codegen::http::{ContentKind, RawEndpoint, RawResponse};
use typewire_codegen::socket::RawSocketEndpoint;
use typewire_codegen::{GenerationInput, SourceSet};
use typewire_core::{GeneratorConfig, TypeDescriptor};

/// Default manifest file name
pub const DEFAULT_MANIFEST: &str = "typewire.toml";

/// Default output directory, relative to the manifest
pub const DEFAULT_OUTPUT: &str = "generated";

/// typewire.toml manifest structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Output directory, relative to the manifest
    #[serde(default)]
    pub output: Option<String>,

    #[serde(default)]
    pub sources: Vec<SourceEntry>,

    #[serde(default)]
    pub http: Vec<HttpEntry>,

    #[serde(default)]
    pub socket: Vec<SocketEntry>,
}

/// A Rust file whose serde types can be referenced by name
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceEntry {
    pub package: String,
    pub path: String,
}

/// A type reference: a Rust type expression, or an inline table of
/// field name to type expression
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TypeRef {
    Expr(String),
    Inline(BTreeMap<String, String>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpEntry {
    pub name: String,
    pub method: String,
    pub path: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub path_params: Option<TypeRef>,

    #[serde(default)]
    pub query: Option<TypeRef>,

    #[serde(default)]
    pub headers: Option<TypeRef>,

    #[serde(default)]
    pub cookies: Option<TypeRef>,

    #[serde(default)]
    pub request: Option<TypeRef>,

    #[serde(default)]
    pub request_content: ContentKind,

    #[serde(default)]
    pub response_content: ContentKind,

    #[serde(default)]
    pub responses: Vec<ResponseEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseEntry {
    pub status: u16,

    #[serde(default)]
    pub body: Option<TypeRef>,

    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SocketEntry {
    pub name: String,
    pub path: String,

    #[serde(default)]
    pub description: Option<String>,

    pub client_message: TypeRef,
    pub server_message: TypeRef,

    #[serde(default)]
    pub message_types: Vec<String>,

    #[serde(default)]
    pub client_payloads: BTreeMap<String, TypeRef>,

    #[serde(default)]
    pub server_payloads: BTreeMap<String, TypeRef>,
}

impl Manifest {
    /// Load manifest from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read manifest: {:?}", path.as_ref()))?;

        Self::from_str(&content)
    }

    /// Parse manifest from string
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse manifest")
    }

    /// Validate the manifest
    ///
    /// Only checks what the generator cannot: endpoint-level consistency is
    /// validated during generation.
    pub fn validate(&self) -> Result<()> {
        self.generator
            .validate()
            .context("Invalid [generator] section")?;

        for source in &self.sources {
            if source.package.is_empty() {
                anyhow::bail!("Source package cannot be empty (path: {})", source.path);
            }
            if source.path.is_empty() {
                anyhow::bail!("Source path cannot be empty (package: {})", source.package);
            }
        }

        if self.http.is_empty() && self.socket.is_empty() {
            anyhow::bail!("Manifest declares no [[http]] or [[socket]] endpoints");
        }

        Ok(())
    }

    /// Parse every source file; relative paths resolve against `base_dir`
    pub fn load_sources(&self, base_dir: &Path) -> Result<SourceSet> {
        let mut set = SourceSet::new();
        for source in &self.sources {
            let path = resolve_path(base_dir, &source.path);
            let added = set
                .add_file(&source.package, &path)
                .with_context(|| format!("Failed to load source {}", path.display()))?;
            tracing::debug!(package = %source.package, path = %path.display(), types = added, "loaded source");
        }
        Ok(set)
    }

    /// Build generator input from the endpoint tables
    pub fn to_input(&self, set: &SourceSet) -> Result<GenerationInput> {
        let mut input = GenerationInput::new();
        for entry in &self.http {
            let endpoint = entry
                .to_raw(set)
                .with_context(|| format!("In [[http]] endpoint `{}`", entry.name))?;
            input = input.with_http(endpoint);
        }
        for entry in &self.socket {
            let endpoint = entry
                .to_raw(set)
                .with_context(|| format!("In [[socket]] endpoint `{}`", entry.name))?;
            input = input.with_socket(endpoint);
        }
        Ok(input)
    }

    /// Output directory: the manifest's `output`, or [`DEFAULT_OUTPUT`]
    pub fn output_dir(&self, base_dir: &Path) -> PathBuf {
        resolve_path(base_dir, self.output.as_deref().unwrap_or(DEFAULT_OUTPUT))
    }
}

impl TypeRef {
    /// Resolve to a descriptor
    pub fn resolve(&self, set: &SourceSet) -> Result<TypeDescriptor> {
        match self {
            TypeRef::Expr(expr) => set
                .resolve(expr)
                .with_context(|| format!("Cannot resolve type `{expr}`")),
            TypeRef::Inline(fields) => {
                let fields = fields
                    .iter()
                    .map(|(name, expr)| {
                        set.resolve_field(name, expr)
                            .with_context(|| format!("Cannot resolve field `{name}: {expr}`"))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(TypeDescriptor::anonymous(fields))
            }
        }
    }
}

fn resolve_optional(
    set: &SourceSet,
    type_ref: &Option<TypeRef>,
    what: &str,
) -> Result<Option<TypeDescriptor>> {
    type_ref
        .as_ref()
        .map(|t| t.resolve(set).with_context(|| format!("Field `{what}`")))
        .transpose()
}

impl HttpEntry {
    fn to_raw(&self, set: &SourceSet) -> Result<RawEndpoint> {
        let mut endpoint = RawEndpoint::new(&self.name, &self.method, &self.path)
            .with_request_content(self.request_content)
            .with_response_content(self.response_content);
        endpoint.description = self.description.clone();
        endpoint.path_params = resolve_optional(set, &self.path_params, "path_params")?;
        endpoint.query = resolve_optional(set, &self.query, "query")?;
        endpoint.headers = resolve_optional(set, &self.headers, "headers")?;
        endpoint.cookies = resolve_optional(set, &self.cookies, "cookies")?;
        endpoint.request = resolve_optional(set, &self.request, "request")?;

        for response in &self.responses {
            let what = format!("responses[{}].body", response.status);
            endpoint.responses.push(RawResponse {
                status: response.status,
                description: response.description.clone(),
                body: resolve_optional(set, &response.body, &what)?,
            });
        }
        Ok(endpoint)
    }
}

impl SocketEntry {
    fn to_raw(&self, set: &SourceSet) -> Result<RawSocketEndpoint> {
        let client = self
            .client_message
            .resolve(set)
            .context("Field `client_message`")?;
        let server = self
            .server_message
            .resolve(set)
            .context("Field `server_message`")?;

        let mut endpoint = RawSocketEndpoint::new(&self.name, &self.path, client, server);
        endpoint.description = self.description.clone();
        endpoint.message_types = self.message_types.clone();
        endpoint.client_payloads = resolve_payloads(set, &self.client_payloads, "client_payloads")?;
        endpoint.server_payloads = resolve_payloads(set, &self.server_payloads, "server_payloads")?;
        Ok(endpoint)
    }
}

fn resolve_payloads(
    set: &SourceSet,
    payloads: &BTreeMap<String, TypeRef>,
    what: &str,
) -> Result<BTreeMap<String, TypeDescriptor>> {
    payloads
        .iter()
        .map(|(tag, type_ref)| {
            let ty = type_ref
                .resolve(set)
                .with_context(|| format!("Field `{what}.{tag}`"))?;
            Ok::<_, anyhow::Error>((tag.clone(), ty))
        })
        .collect()
}

fn resolve_path(base_dir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Directory containing the manifest, for resolving relative paths
pub fn base_dir(manifest_path: &Path) -> PathBuf {
    match manifest_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Check command implementation
pub fn check(manifest_path: Option<PathBuf>) -> Result<()> {
    let path = manifest_path.unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST));

    println!("Checking manifest: {}", path.display());

    let manifest = Manifest::from_file(&path)?;
    manifest.validate()?;

    let sources = manifest.load_sources(&base_dir(&path))?;
    let input = manifest.to_input(&sources)?;
    let artifacts =
        typewire_codegen::generate(&input, &manifest.generator).context("Generation failed")?;

    println!("✓ Sources: {} ({} types)", manifest.sources.len(), sources.len());
    println!("✓ HTTP endpoints: {}", manifest.http.len());
    println!("✓ Socket endpoints: {}", manifest.socket.len());
    for artifact in &artifacts {
        println!("✓ Would write: {}", artifact.file_name);
    }
    println!("\nManifest is valid!");

    Ok(())
}
