//! Type registry: renders descriptors to TypeScript and deduplicates named types.
//!
//! Each distinct named type (keyed on qualified name plus structural
//! signature) is emitted once as an interface followed by its guard and
//! assertion functions. Nested named types are registered before the types
//! that reference them, so definitions come out dependencies-first.
//!
//! Two structurally different types that share a simple name get distinct
//! output names: the first keeps the name and later ones get a numeric
//! suffix (`Person`, `Person2`, ...). Registries that feed one unified
//! export share a [`NameTable`], so the rule holds across artifacts too.

use crate::ts::{array_of, doc_comment, nullable, property_key};
use crate::union::{self, LiteralUnion};
use crate::validate::{Check, CheckLookup, FieldCheck, ensure_name, guard_name, render_guards};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use typewire_core::naming::{is_identifier, to_pascal_case};
use typewire_core::{
    FieldDescriptor, GenError, GenResult, Int64Mode, NamedType, PrimitiveKind, TypeDescriptor,
};

/// Built-in TypeScript and DOM types the generated runtimes refer to.
///
/// A registered type with one of these names would shadow the global inside
/// the generated module.
pub const GLOBAL_NAMES: &[&str] = &[
    "Array",
    "ArrayBuffer",
    "ArrayBufferLike",
    "ArrayBufferView",
    "Blob",
    "BodyInit",
    "Boolean",
    "CloseEvent",
    "Date",
    "Error",
    "Event",
    "FormData",
    "Headers",
    "JSON",
    "Map",
    "MessageEvent",
    "Number",
    "Object",
    "Partial",
    "Promise",
    "ReadableStream",
    "Readonly",
    "Record",
    "Request",
    "RequestInit",
    "Response",
    "Set",
    "String",
    "Symbol",
    "TypeError",
    "URL",
    "URLSearchParams",
    "Uint8Array",
    "WebSocket",
];

/// A descriptor rendered to TypeScript
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    /// Type expression usable in annotations
    pub type_text: String,
    pub check: Check,
}

/// One registered named type
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    /// Output name, unique within the registry
    pub name: String,
    /// `package.Name#signature` identity of the source type
    pub key: String,
    /// Interface, guard, and assertion declarations in emission order
    pub declarations: Vec<String>,
}

/// Output names handed out so far, by type identity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameTable {
    by_key: HashMap<String, String>,
    used: HashSet<String>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name already given to the type with this `package.Name#signature` key
    pub fn name_for(&self, key: &str) -> Option<&str> {
        self.by_key.get(key).map(String::as_str)
    }

    pub fn is_used(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    fn is_free(&self, name: &str) -> bool {
        !self.used.contains(name)
            && !self.used.contains(&guard_name(name))
            && !self.used.contains(&ensure_name(name))
    }

    /// Claim a name and its guard and assertion function names
    fn claim(&mut self, key: String, name: &str) {
        self.used.insert(name.to_string());
        self.used.insert(guard_name(name));
        self.used.insert(ensure_name(name));
        self.by_key.insert(key, name.to_string());
    }
}

/// Per-artifact registry of rendered types
#[derive(Debug, Default)]
pub struct TypeRegistry {
    int64: Int64Mode,
    definitions: Vec<Definition>,
    by_key: HashMap<String, usize>,
    names: NameTable,
    checks: HashMap<String, Check>,
}

impl TypeRegistry {
    pub fn new(int64: Int64Mode) -> Self {
        let mut registry = Self {
            int64,
            ..Self::default()
        };
        registry.reserve(GLOBAL_NAMES.iter().copied());
        registry
    }

    /// Continue allocating from names another registry already handed out.
    ///
    /// A type registered there keeps its name here; a different type with
    /// the same simple name gets a suffix.
    pub fn adopt_names(&mut self, names: NameTable) {
        self.names.by_key.extend(names.by_key);
        self.names.used.extend(names.used);
    }

    pub fn names(&self) -> &NameTable {
        &self.names
    }

    pub fn into_names(self) -> NameTable {
        self.names
    }

    pub fn int64_mode(&self) -> Int64Mode {
        self.int64
    }

    /// Keep names away from registered types, including their guard functions
    pub fn reserve<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.used.extend(names.into_iter().map(Into::into));
    }

    /// Register a named descriptor and return its output name
    pub fn register(&mut self, ty: &TypeDescriptor) -> GenResult<String> {
        match ty {
            TypeDescriptor::Named(named) => self.register_named(named),
            other => Err(GenError::Resolution(format!(
                "only named types can be registered, found {}",
                other.describe()
            ))),
        }
    }

    /// Render any descriptor, registering the named types it references
    pub fn render(&mut self, ty: &TypeDescriptor) -> GenResult<Rendered> {
        match ty {
            TypeDescriptor::Primitive(kind) => Ok(self.primitive(*kind)),
            TypeDescriptor::Named(named) => {
                let name = self.register_named(named)?;
                Ok(Rendered {
                    type_text: name.clone(),
                    check: Check::Ref(name),
                })
            }
            TypeDescriptor::Anonymous(fields) => self.render_anonymous(fields),
            TypeDescriptor::Slice(element) => {
                let inner = self.render(element)?;
                Ok(Rendered {
                    type_text: array_of(&inner.type_text),
                    check: Check::Array(Box::new(inner.check)),
                })
            }
            TypeDescriptor::Map { element, .. } => {
                let inner = self.render(element)?;
                Ok(Rendered {
                    type_text: format!("Record<string, {}>", inner.type_text),
                    check: Check::Record(Box::new(inner.check)),
                })
            }
            TypeDescriptor::Optional(inner) => {
                let inner = self.render(inner)?;
                Ok(Rendered {
                    type_text: nullable(&inner.type_text),
                    check: Check::Nullable(Box::new(inner.check)),
                })
            }
        }
    }

    /// Registered definitions, dependencies first
    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }

    /// Every declaration in emission order
    pub fn declarations(&self) -> impl Iterator<Item = &str> {
        self.definitions
            .iter()
            .flat_map(|d| d.declarations.iter().map(String::as_str))
    }

    /// All declarations separated by blank lines
    pub fn emit(&self) -> String {
        self.declarations().collect::<Vec<_>>().join("\n\n")
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Structural check behind the guard of a registered type
    pub fn check_for(&self, name: &str) -> Option<&Check> {
        self.checks.get(name)
    }

    /// Evaluate the guard of a registered type against a JSON value
    pub fn validates(&self, name: &str, value: &Value) -> bool {
        self.check_for(name)
            .is_some_and(|check| check.accepts(value, self))
    }

    fn primitive(&self, kind: PrimitiveKind) -> Rendered {
        let (type_text, check) = match kind {
            PrimitiveKind::String | PrimitiveKind::Bytes | PrimitiveKind::Timestamp => {
                ("string", Check::TypeOf("string"))
            }
            PrimitiveKind::Bool => ("boolean", Check::TypeOf("boolean")),
            PrimitiveKind::Int | PrimitiveKind::Float => ("number", Check::TypeOf("number")),
            PrimitiveKind::Int64 => match self.int64 {
                Int64Mode::Number => ("number", Check::TypeOf("number")),
                Int64Mode::String => ("string", Check::TypeOf("string")),
            },
            PrimitiveKind::Any => ("unknown", Check::Any),
        };
        Rendered {
            type_text: type_text.to_string(),
            check,
        }
    }

    fn register_named(&mut self, named: &NamedType) -> GenResult<String> {
        if named.name.trim().is_empty() {
            return Err(GenError::Resolution(format!(
                "named type in package `{}` has an empty name",
                named.package
            )));
        }

        let key = format!("{}#{}", named.qualified_name(), named.signature());
        if let Some(&index) = self.by_key.get(&key) {
            return Ok(self.definitions[index].name.clone());
        }

        let mut members = Vec::with_capacity(named.fields.len());
        let mut checks = Vec::with_capacity(named.fields.len());
        for field in &named.fields {
            let rendered = self.render_field(field)?;
            members.push(member_line(field, &rendered.type_text));
            checks.push(FieldCheck::new(&field.name, field.optional, rendered.check));
        }

        let name = match self.names.name_for(&key) {
            Some(shared) => shared.to_string(),
            None => {
                let name = self.allocate_name(&named.name);
                self.names.claim(key.clone(), &name);
                name
            }
        };
        if name != named.name {
            tracing::debug!(
                source = %named.qualified_name(),
                output = %name,
                "renamed colliding type"
            );
        }

        let mut interface = doc_comment(&named.docs, "");
        if members.is_empty() {
            interface.push_str(&format!("export interface {name} {{}}"));
        } else {
            interface.push_str(&format!("export interface {name} {{\n"));
            for member in &members {
                interface.push_str(member);
            }
            interface.push('}');
        }
        let [guard, ensure] = render_guards(&name, &checks);

        self.checks.insert(name.clone(), Check::Object(checks));
        self.by_key.insert(key.clone(), self.definitions.len());
        self.definitions.push(Definition {
            name: name.clone(),
            key,
            declarations: vec![interface, guard, ensure],
        });

        Ok(name)
    }

    fn render_anonymous(&mut self, fields: &[FieldDescriptor]) -> GenResult<Rendered> {
        if fields.is_empty() {
            return Ok(Rendered {
                type_text: "Record<string, never>".to_string(),
                check: Check::Object(Vec::new()),
            });
        }

        let mut parts = Vec::with_capacity(fields.len());
        let mut checks = Vec::with_capacity(fields.len());
        for field in fields {
            let rendered = self.render_field(field)?;
            let (separator, ty) = member_parts(field, &rendered.type_text);
            parts.push(format!("{}{separator} {ty}", property_key(&field.name)));
            checks.push(FieldCheck::new(&field.name, field.optional, rendered.check));
        }

        Ok(Rendered {
            type_text: format!("{{ {} }}", parts.join("; ")),
            check: Check::Object(checks),
        })
    }

    /// Render a field type, narrowing it when a literal union is attached
    fn render_field(&mut self, field: &FieldDescriptor) -> GenResult<Rendered> {
        match union::synthesize(field, self.int64)? {
            Some(literals) => narrow(&field.ty, &literals).ok_or_else(|| {
                GenError::UnionOnNonScalar {
                    field: field.name.clone(),
                    found: field.ty.describe(),
                }
            }),
            None => self.render(&field.ty),
        }
    }

    fn allocate_name(&self, declared: &str) -> String {
        let base = if is_identifier(declared) {
            declared.to_string()
        } else {
            let pascal = to_pascal_case(declared);
            if is_identifier(&pascal) {
                pascal
            } else {
                format!("T{pascal}")
            }
        };

        let mut candidate = base.clone();
        let mut counter = 2;
        while !self.names.is_free(&candidate) {
            candidate = format!("{base}{counter}");
            counter += 1;
        }
        candidate
    }
}

impl CheckLookup for TypeRegistry {
    fn lookup(&self, name: &str) -> Option<&Check> {
        self.checks.get(name)
    }
}

/// Apply a literal union to the scalar inside a field type
fn narrow(ty: &TypeDescriptor, literals: &LiteralUnion) -> Option<Rendered> {
    match ty {
        TypeDescriptor::Primitive(_) => Some(Rendered {
            type_text: literals.type_text(),
            check: Check::Literals(literals.clone()),
        }),
        TypeDescriptor::Slice(element) => narrow(element, literals).map(|inner| Rendered {
            type_text: array_of(&inner.type_text),
            check: Check::Array(Box::new(inner.check)),
        }),
        TypeDescriptor::Optional(inner) => narrow(inner, literals).map(|inner| Rendered {
            type_text: nullable(&inner.type_text),
            check: Check::Nullable(Box::new(inner.check)),
        }),
        _ => None,
    }
}

fn member_parts(field: &FieldDescriptor, type_text: &str) -> (&'static str, String) {
    if field.optional {
        ("?:", nullable(type_text))
    } else {
        (":", type_text.to_string())
    }
}

fn member_line(field: &FieldDescriptor, type_text: &str) -> String {
    let (separator, ty) = member_parts(field, type_text);
    format!(
        "{}  {}{separator} {ty};\n",
        doc_comment(&field.docs, "  "),
        property_key(&field.name)
    )
}
