//! HTTP endpoint model and client synthesis.
//!
//! Raw endpoint declarations ([`RawEndpoint`]) are checked and normalized into
//! [`EndpointDescriptor`]s by [`extract_endpoints`]; the synthesizer then turns
//! the descriptors into one TypeScript artifact holding a shared runtime and
//! one self-contained unit per endpoint.

mod extract;
mod synth;

pub use extract::{extract_endpoint, extract_endpoints, parse_path};
pub use synth::{HttpSynthesizer, RUNTIME_NAMES};

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use typewire_core::{GenError, TypeDescriptor};

/// HTTP verb of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            _ => Err(GenError::InvalidMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body encoding of a request or response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    #[default]
    Json,
    Multipart,
    #[serde(alias = "url-encoded-form", alias = "urlencoded")]
    Form,
    Text,
    #[serde(alias = "raw-bytes")]
    Bytes,
    Stream,
}

impl ContentKind {
    /// Tag used for this kind in generated code
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Json => "json",
            ContentKind::Multipart => "multipart",
            ContentKind::Form => "form",
            ContentKind::Text => "text",
            ContentKind::Bytes => "bytes",
            ContentKind::Stream => "stream",
        }
    }

    /// Body parameter type for kinds that do not carry a typed JSON value
    pub fn request_type(&self) -> Option<&'static str> {
        match self {
            ContentKind::Json => None,
            ContentKind::Multipart => Some("FormData"),
            ContentKind::Form => Some("URLSearchParams | Record<string, string>"),
            ContentKind::Text => Some("string"),
            ContentKind::Bytes => Some("Blob | ArrayBuffer | Uint8Array"),
            ContentKind::Stream => Some("ReadableStream<Uint8Array>"),
        }
    }

    /// Decoded response type for kinds that do not carry a typed JSON value
    pub fn response_type(&self) -> Option<&'static str> {
        match self {
            ContentKind::Json => None,
            ContentKind::Multipart => Some("FormData"),
            ContentKind::Form => Some("URLSearchParams"),
            ContentKind::Text => Some("string"),
            ContentKind::Bytes => Some("ArrayBuffer"),
            ContentKind::Stream => Some("ReadableStream<Uint8Array> | null"),
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared response
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub description: Option<String>,
    /// Body type, `None` for responses without a body
    pub body: Option<TypeDescriptor>,
}

/// An HTTP endpoint as declared, before validation
#[derive(Debug, Clone, PartialEq)]
pub struct RawEndpoint {
    /// Identifier of the generated unit
    pub name: String,
    pub method: String,
    /// Path template with `:name` or `{name}` placeholders
    pub path: String,
    pub description: Option<String>,
    pub path_params: Option<TypeDescriptor>,
    pub query: Option<TypeDescriptor>,
    pub headers: Option<TypeDescriptor>,
    pub cookies: Option<TypeDescriptor>,
    pub request: Option<TypeDescriptor>,
    pub responses: Vec<RawResponse>,
    pub request_content: ContentKind,
    pub response_content: ContentKind,
}

impl RawEndpoint {
    pub fn new(name: impl Into<String>, method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: method.into(),
            path: path.into(),
            description: None,
            path_params: None,
            query: None,
            headers: None,
            cookies: None,
            request: None,
            responses: Vec::new(),
            request_content: ContentKind::Json,
            response_content: ContentKind::Json,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_path_params(mut self, ty: TypeDescriptor) -> Self {
        self.path_params = Some(ty);
        self
    }

    pub fn with_query(mut self, ty: TypeDescriptor) -> Self {
        self.query = Some(ty);
        self
    }

    pub fn with_headers(mut self, ty: TypeDescriptor) -> Self {
        self.headers = Some(ty);
        self
    }

    pub fn with_cookies(mut self, ty: TypeDescriptor) -> Self {
        self.cookies = Some(ty);
        self
    }

    pub fn with_request(mut self, ty: TypeDescriptor) -> Self {
        self.request = Some(ty);
        self
    }

    pub fn with_response(mut self, status: u16, body: Option<TypeDescriptor>) -> Self {
        self.responses.push(RawResponse {
            status,
            description: None,
            body,
        });
        self
    }

    pub fn with_request_content(mut self, kind: ContentKind) -> Self {
        self.request_content = kind;
        self
    }

    pub fn with_response_content(mut self, kind: ContentKind) -> Self {
        self.response_content = kind;
        self
    }
}

/// Piece of a path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Literal(String),
    Placeholder(String),
}

/// A path placeholder and the path parameter field it reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderBinding {
    pub placeholder: String,
    /// Wire name of the bound field
    pub field: String,
}

/// Parameter groups of an endpoint; each is struct-shaped when present
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamGroups {
    pub path: Option<TypeDescriptor>,
    pub query: Option<TypeDescriptor>,
    pub headers: Option<TypeDescriptor>,
    pub cookies: Option<TypeDescriptor>,
}

impl ParamGroups {
    /// Groups in emission order, paired with their property name
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &TypeDescriptor)> {
        [
            ("path", self.path.as_ref()),
            ("query", self.query.as_ref()),
            ("headers", self.headers.as_ref()),
            ("cookies", self.cookies.as_ref()),
        ]
        .into_iter()
        .filter_map(|(key, ty)| ty.map(|ty| (key, ty)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseDescriptor {
    pub status: u16,
    pub description: Option<String>,
    pub body: Option<TypeDescriptor>,
}

impl ResponseDescriptor {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A validated HTTP endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointDescriptor {
    pub name: String,
    pub method: HttpMethod,
    /// Path as declared
    pub path: String,
    /// Base path joined with the declared path
    pub full_path: String,
    pub segments: Vec<PathSegment>,
    pub bindings: Vec<PlaceholderBinding>,
    pub params: ParamGroups,
    pub request: Option<TypeDescriptor>,
    pub responses: Vec<ResponseDescriptor>,
    pub request_content: ContentKind,
    pub response_content: ContentKind,
    pub docs: Vec<String>,
}

impl EndpointDescriptor {
    /// First 2xx response, else the first declared one
    pub fn primary_response(&self) -> Option<&ResponseDescriptor> {
        self.responses
            .iter()
            .find(|r| r.is_success())
            .or_else(|| self.responses.first())
    }

    /// Field bound to a placeholder
    pub fn binding(&self, placeholder: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.placeholder == placeholder)
            .map(|b| b.field.as_str())
    }
}
