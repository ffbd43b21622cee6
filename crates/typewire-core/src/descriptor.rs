//! Closed descriptor model for server-side data shapes
//!
//! A [`TypeDescriptor`] is built once per generation run, either from Rust
//! sources or from a manifest, and is never mutated afterwards. Named
//! descriptors are shared through [`Arc`] so every reference to the same
//! declared type sees the same cached structural signature.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Scalar kinds a descriptor can bottom out in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    String,
    Bool,
    /// Integers that fit a JavaScript number without loss
    Int,
    Float,
    /// 64-bit and wider integers
    Int64,
    /// Opaque byte blob, travels as an encoded string
    Bytes,
    Timestamp,
    /// Arbitrary JSON value
    Any,
}

impl PrimitiveKind {
    /// Stable token used inside structural signatures
    pub fn signature(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Int64 => "int64",
            PrimitiveKind::Bytes => "bytes",
            PrimitiveKind::Timestamp => "timestamp",
            PrimitiveKind::Any => "any",
        }
    }

    /// Whether values of this kind are numbers on the wire (ignoring int64 mode)
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Int | PrimitiveKind::Float | PrimitiveKind::Int64
        )
    }
}

impl std::fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.signature())
    }
}

/// Kind shared by every literal of a union constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    String,
    Number,
    Boolean,
}

impl LiteralKind {
    /// The `typeof` tag for this literal kind
    pub fn type_of(&self) -> &'static str {
        match self {
            LiteralKind::String => "string",
            LiteralKind::Number => "number",
            LiteralKind::Boolean => "boolean",
        }
    }
}

impl std::fmt::Display for LiteralKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_of())
    }
}

/// Abstract description of a data shape
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    /// A declared struct with a stable identity, eligible for deduplication
    Named(Arc<NamedType>),
    /// An inline struct shape, rendered in place and never registered
    Anonymous(Vec<FieldDescriptor>),
    Slice(Box<TypeDescriptor>),
    Map {
        key: PrimitiveKind,
        element: Box<TypeDescriptor>,
    },
    /// A nullable value; never wraps another `Optional`
    Optional(Box<TypeDescriptor>),
}

impl TypeDescriptor {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        TypeDescriptor::Primitive(kind)
    }

    pub fn string() -> Self {
        TypeDescriptor::Primitive(PrimitiveKind::String)
    }

    pub fn named(named: NamedType) -> Self {
        TypeDescriptor::Named(Arc::new(named))
    }

    pub fn anonymous(fields: Vec<FieldDescriptor>) -> Self {
        TypeDescriptor::Anonymous(fields)
    }

    pub fn slice(element: TypeDescriptor) -> Self {
        TypeDescriptor::Slice(Box::new(element))
    }

    pub fn map(key: PrimitiveKind, element: TypeDescriptor) -> Self {
        TypeDescriptor::Map {
            key,
            element: Box::new(element),
        }
    }

    /// Wrap in `Optional`, collapsing an already optional descriptor
    pub fn optional(inner: TypeDescriptor) -> Self {
        match inner {
            TypeDescriptor::Optional(_) => inner,
            other => TypeDescriptor::Optional(Box::new(other)),
        }
    }

    /// Fields of a struct-shaped descriptor (named or anonymous)
    pub fn fields(&self) -> Option<&[FieldDescriptor]> {
        match self {
            TypeDescriptor::Named(named) => Some(&named.fields),
            TypeDescriptor::Anonymous(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn is_struct(&self) -> bool {
        self.fields().is_some()
    }

    /// Short human-readable description used in diagnostics
    pub fn describe(&self) -> String {
        match self {
            TypeDescriptor::Primitive(kind) => kind.to_string(),
            TypeDescriptor::Named(named) => format!("struct {}", named.qualified_name()),
            TypeDescriptor::Anonymous(_) => "anonymous struct".to_string(),
            TypeDescriptor::Slice(element) => format!("slice of {}", element.describe()),
            TypeDescriptor::Map { element, .. } => format!("map of {}", element.describe()),
            TypeDescriptor::Optional(inner) => format!("optional {}", inner.describe()),
        }
    }

    /// Canonical structural signature, the dedup key of the type registry
    pub fn signature(&self) -> String {
        match self {
            TypeDescriptor::Primitive(kind) => kind.signature().to_string(),
            TypeDescriptor::Named(named) => {
                format!("@{}{}", named.qualified_name(), named.signature())
            }
            TypeDescriptor::Anonymous(fields) => fields_signature(fields),
            TypeDescriptor::Slice(element) => format!("[]{}", element.signature()),
            TypeDescriptor::Map { key, element } => {
                format!("map[{}]{}", key.signature(), element.signature())
            }
            TypeDescriptor::Optional(inner) => format!("?{}", inner.signature()),
        }
    }

    /// Visit every field reachable from this descriptor
    ///
    /// Each named type is walked once, so shared types are not revisited.
    pub fn visit_fields<E>(
        &self,
        visit: &mut impl FnMut(&FieldDescriptor) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut seen = HashSet::new();
        self.visit_fields_inner(visit, &mut seen)
    }

    fn visit_fields_inner<E>(
        &self,
        visit: &mut impl FnMut(&FieldDescriptor) -> Result<(), E>,
        seen: &mut HashSet<String>,
    ) -> Result<(), E> {
        match self {
            TypeDescriptor::Primitive(_) => Ok(()),
            TypeDescriptor::Named(named) => {
                if !seen.insert(format!("{}{}", named.qualified_name(), named.signature())) {
                    return Ok(());
                }
                visit_all(&named.fields, visit, seen)
            }
            TypeDescriptor::Anonymous(fields) => visit_all(fields, visit, seen),
            TypeDescriptor::Slice(element) | TypeDescriptor::Map { element, .. } => {
                element.visit_fields_inner(visit, seen)
            }
            TypeDescriptor::Optional(inner) => inner.visit_fields_inner(visit, seen),
        }
    }
}

fn visit_all<E>(
    fields: &[FieldDescriptor],
    visit: &mut impl FnMut(&FieldDescriptor) -> Result<(), E>,
    seen: &mut HashSet<String>,
) -> Result<(), E> {
    for field in fields {
        visit(field)?;
        field.ty.visit_fields_inner(visit, seen)?;
    }
    Ok(())
}

/// Signature of a field list, independent of declaration order
fn fields_signature(fields: &[FieldDescriptor]) -> String {
    let mut parts: Vec<String> = fields.iter().map(FieldDescriptor::signature).collect();
    parts.sort();
    format!("{{{}}}", parts.join(";"))
}

/// A declared struct
#[derive(Debug, Clone)]
pub struct NamedType {
    /// Module or package the type was declared in
    pub package: String,

    /// Declared type name
    pub name: String,

    /// Documentation lines
    pub docs: Vec<String>,

    /// Fields in declaration order
    pub fields: Vec<FieldDescriptor>,

    signature: OnceCell<String>,
}

impl NamedType {
    pub fn new(
        package: impl Into<String>,
        name: impl Into<String>,
        fields: Vec<FieldDescriptor>,
    ) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            docs: Vec::new(),
            fields,
            signature: OnceCell::new(),
        }
    }

    pub fn with_docs(mut self, docs: Vec<String>) -> Self {
        self.docs = docs;
        self
    }

    /// `package.Name`, or just `Name` for types without a package
    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }

    /// Structural signature of the field set, computed on first use
    pub fn signature(&self) -> &str {
        self.signature.get_or_init(|| fields_signature(&self.fields))
    }
}

impl PartialEq for NamedType {
    fn eq(&self, other: &Self) -> bool {
        self.package == other.package
            && self.name == other.name
            && self.docs == other.docs
            && self.fields == other.fields
    }
}

/// A field of a struct-shaped descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Wire name after rename mapping
    pub name: String,

    /// Declared identifier before rename mapping
    pub source_name: String,

    /// Whether the field may be absent
    pub optional: bool,

    /// Field type
    pub ty: TypeDescriptor,

    /// Documentation lines
    pub docs: Vec<String>,

    /// Key used when the field travels as a query, header, or cookie parameter
    pub param_name: Option<String>,

    /// Enumerated literal constants the field is restricted to
    pub union: Option<UnionConstraint>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        let name = name.into();
        Self {
            source_name: name.clone(),
            name,
            optional: false,
            ty,
            docs: Vec::new(),
            param_name: None,
            union: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_source_name(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = source_name.into();
        self
    }

    pub fn with_docs(mut self, docs: Vec<String>) -> Self {
        self.docs = docs;
        self
    }

    pub fn with_param_name(mut self, param_name: impl Into<String>) -> Self {
        self.param_name = Some(param_name.into());
        self
    }

    pub fn with_union(mut self, union: UnionConstraint) -> Self {
        self.union = Some(union);
        self
    }

    /// Name the field carries as a query, header, or cookie key
    pub fn param_key(&self) -> &str {
        self.param_name.as_deref().unwrap_or(&self.name)
    }

    pub fn signature(&self) -> String {
        let mut sig = self.name.clone();
        if self.optional {
            sig.push('?');
        }
        sig.push(':');
        sig.push_str(&self.ty.signature());
        if let Some(union) = &self.union {
            sig.push('=');
            sig.push_str(&union.signature());
        }
        sig
    }
}

/// Ordered literal tokens attached to a field
///
/// Tokens are raw text; their interpretation depends on the field kind and
/// happens in the union synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionConstraint {
    pub tokens: Vec<String>,
}

impl UnionConstraint {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a whitespace or comma separated token list
    ///
    /// Single or double quotes group a token containing spaces; the quotes are
    /// kept so the synthesizer can tell an explicit string literal apart.
    pub fn parse(spec: &str) -> Self {
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut quote: Option<char> = None;

        for c in spec.chars() {
            match quote {
                Some(q) => {
                    current.push(c);
                    if c == q {
                        quote = None;
                    }
                }
                None if c == '\'' || c == '"' => {
                    quote = Some(c);
                    current.push(c);
                }
                None if c.is_whitespace() || c == ',' => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                }
                None => current.push(c),
            }
        }
        if !current.is_empty() {
            tokens.push(current);
        }

        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn signature(&self) -> String {
        self.tokens.join("|")
    }
}
