//! Descriptors from Rust source.
//!
//! Parses Rust files with [`syn`] and turns the structs that derive
//! `Serialize` or `Deserialize` into [`TypeDescriptor`]s, following the serde
//! attributes that change the wire shape.
//!
//! # Examples
//!
//! ```
//! use typewire_codegen::source::SourceSet;
//!
//! let mut set = SourceSet::new();
//! set.add_source(
//!     "api",
//!     r#"
//!         #[derive(Serialize)]
//!         #[serde(rename_all = "camelCase")]
//!         pub struct Person {
//!             pub person_id: String,
//!             pub nickname: Option<String>,
//!         }
//!     "#,
//! )
//! .unwrap();
//!
//! let person = set.resolve("Vec<Person>").unwrap();
//! assert_eq!(person.describe(), "slice of struct api.Person");
//! ```
//!
//! # Supported attributes
//!
//! - `#[serde(rename = "...")]` on structs, fields, and enum variants
//! - `#[serde(rename_all = "...")]` on structs and enums
//! - `#[serde(skip)]` and `#[serde(skip_serializing)]`
//! - `#[serde(default)]` and `#[serde(skip_serializing_if = "...")]`, which
//!   make a field optional
//! - `#[serde(flatten)]` on struct-typed fields
//! - `#[typewire(oneof = "a b 'c d'")]` for literal unions
//! - `#[typewire(param = "X-Trace-Id")]` for parameter keys
//!
//! # Limitations
//!
//! - Enums map to literal unions and must not carry data
//! - Tuple structs and generic structs are not supported
//! - Recursive types are rejected

use std::collections::{HashMap, HashSet};
use std::path::Path;
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::punctuated::Punctuated;
use syn::{Attribute, Fields, GenericArgument, Item, LitStr, Meta, PathArguments, Token, Type};
use typewire_core::{
    FieldDescriptor, GenError, GenResult, NamedType, PrimitiveKind, TypeDescriptor,
    UnionConstraint,
};

/// Parsed Rust types available for resolution
#[derive(Debug, Default)]
pub struct SourceSet {
    items: Vec<SourceItem>,
    by_ident: HashMap<String, Vec<usize>>,
}

#[derive(Debug)]
struct SourceItem {
    package: String,
    ident: String,
    kind: ItemKind,
}

#[derive(Debug)]
enum ItemKind {
    Struct(SourceStruct),
    /// Wire names of the variants, or `None` when a variant carries data
    Enum(Option<Vec<String>>),
}

#[derive(Debug)]
struct SourceStruct {
    /// Name after `#[serde(rename)]`
    wire_name: String,
    docs: Vec<String>,
    fields: Vec<SourceField>,
    generic: bool,
    tuple: bool,
}

#[derive(Debug)]
struct SourceField {
    ident: String,
    wire_name: String,
    ty: Type,
    docs: Vec<String>,
    defaulted: bool,
    flatten: bool,
    oneof: Option<String>,
    param: Option<String>,
}

/// Attributes collected from `#[serde(...)]` and `#[typewire(...)]`
#[derive(Debug, Default)]
struct Attrs {
    rename: Option<String>,
    rename_all: Option<RenameRule>,
    skip: bool,
    defaulted: bool,
    flatten: bool,
    oneof: Option<String>,
    param: Option<String>,
}

/// Case conversions accepted by `#[serde(rename_all)]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    pub fn parse(rule: &str) -> Option<Self> {
        Some(match rule {
            "lowercase" => RenameRule::Lower,
            "UPPERCASE" => RenameRule::Upper,
            "PascalCase" => RenameRule::Pascal,
            "camelCase" => RenameRule::Camel,
            "snake_case" => RenameRule::Snake,
            "SCREAMING_SNAKE_CASE" => RenameRule::ScreamingSnake,
            "kebab-case" => RenameRule::Kebab,
            "SCREAMING-KEBAB-CASE" => RenameRule::ScreamingKebab,
            _ => return None,
        })
    }

    /// Apply to a snake_case field name
    pub fn apply_to_field(&self, field: &str) -> String {
        match self {
            RenameRule::Lower | RenameRule::Snake => field.to_string(),
            RenameRule::Upper | RenameRule::ScreamingSnake => field.to_ascii_uppercase(),
            RenameRule::Pascal => field.split('_').map(capitalize).collect(),
            RenameRule::Camel => {
                let pascal: String = field.split('_').map(capitalize).collect();
                lower_first(&pascal)
            }
            RenameRule::Kebab => field.replace('_', "-"),
            RenameRule::ScreamingKebab => field.replace('_', "-").to_ascii_uppercase(),
        }
    }

    /// Apply to a PascalCase variant name
    pub fn apply_to_variant(&self, variant: &str) -> String {
        match self {
            RenameRule::Pascal => variant.to_string(),
            RenameRule::Lower => variant.to_ascii_lowercase(),
            RenameRule::Upper => variant.to_ascii_uppercase(),
            RenameRule::Camel => lower_first(variant),
            RenameRule::Snake => {
                let mut out = String::new();
                for (i, c) in variant.char_indices() {
                    if i > 0 && c.is_uppercase() {
                        out.push('_');
                    }
                    out.push(c.to_ascii_lowercase());
                }
                out
            }
            RenameRule::ScreamingSnake => RenameRule::Snake
                .apply_to_variant(variant)
                .to_ascii_uppercase(),
            RenameRule::Kebab => RenameRule::Snake.apply_to_variant(variant).replace('_', "-"),
            RenameRule::ScreamingKebab => RenameRule::ScreamingSnake
                .apply_to_variant(variant)
                .replace('_', "-"),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lower_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a Rust file and add its types under `package`
    ///
    /// Returns how many types were added.
    pub fn add_file(&mut self, package: &str, path: &Path) -> GenResult<usize> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GenError::Io(format!("failed to read {}: {e}", path.display())))?;
        self.add_source(package, &content)
            .map_err(|e| match e {
                GenError::Resolution(msg) => {
                    GenError::Resolution(format!("{}: {msg}", path.display()))
                }
                other => other,
            })
    }

    /// Parse Rust source text and add its types under `package`
    pub fn add_source(&mut self, package: &str, source: &str) -> GenResult<usize> {
        let file = syn::parse_file(source)
            .map_err(|e| GenError::Resolution(format!("failed to parse Rust source: {e}")))?;

        let before = self.items.len();
        self.collect(package, &file.items)?;
        let added = self.items.len() - before;

        tracing::debug!(package = %package, types = added, "parsed source");
        Ok(added)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Resolve a Rust type expression such as `Vec<api::Person>`
    pub fn resolve(&self, expr: &str) -> GenResult<TypeDescriptor> {
        let ty = parse_type(expr)?;
        let resolved = Resolver::new(self).resolve(&ty, None)?;
        Ok(resolved.ty)
    }

    /// Resolve a struct by name, optionally qualified as `package::Name`
    pub fn resolve_named(&self, name: &str) -> GenResult<TypeDescriptor> {
        let resolved = self.resolve(name)?;
        match resolved {
            TypeDescriptor::Named(_) => Ok(resolved),
            other => Err(GenError::Resolution(format!(
                "`{name}` must name a struct, found {}",
                other.describe()
            ))),
        }
    }

    /// Build a field from a Rust type expression
    ///
    /// `Option<T>` makes the field optional, and unit enums become literal
    /// unions on the field.
    pub fn resolve_field(&self, name: &str, expr: &str) -> GenResult<FieldDescriptor> {
        let ty = parse_type(expr)?;
        let mut resolver = Resolver::new(self);
        let (inner, optional) = match option_inner(&ty) {
            Some(inner) => (inner, true),
            None => (&ty, false),
        };
        let resolved = resolver.resolve(inner, None)?;
        let mut field = FieldDescriptor::new(name, resolved.ty);
        if optional {
            field = field.optional();
        }
        if let Some(union) = resolved.union {
            field = field.with_union(union);
        }
        Ok(field)
    }

    fn collect(&mut self, package: &str, items: &[Item]) -> GenResult<()> {
        for item in items {
            match item {
                Item::Struct(s) if derives_serde(&s.attrs) => {
                    let parsed = parse_struct(s)?;
                    self.push(package, s.ident.unraw().to_string(), ItemKind::Struct(parsed));
                }
                Item::Enum(e) if derives_serde(&e.attrs) => {
                    let variants = parse_enum(e)?;
                    self.push(package, e.ident.unraw().to_string(), ItemKind::Enum(variants));
                }
                Item::Mod(m) => {
                    if let Some((_, nested)) = &m.content {
                        self.collect(package, nested)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn push(&mut self, package: &str, ident: String, kind: ItemKind) {
        self.by_ident
            .entry(ident.clone())
            .or_default()
            .push(self.items.len());
        self.items.push(SourceItem {
            package: package.to_string(),
            ident,
            kind,
        });
    }

    /// Find an item by identifier, preferring the given package
    fn lookup(&self, path: &syn::Path, package: Option<&str>) -> GenResult<Option<usize>> {
        let Some(last) = path.segments.last() else {
            return Ok(None);
        };
        let ident = last.ident.unraw().to_string();
        let Some(candidates) = self.by_ident.get(&ident) else {
            return Ok(None);
        };

        let qualifier = (path.segments.len() > 1)
            .then(|| path.segments[path.segments.len() - 2].ident.unraw().to_string());
        if let Some(qualifier) = &qualifier {
            if let Some(&index) = candidates
                .iter()
                .find(|&&i| &self.items[i].package == qualifier)
            {
                return Ok(Some(index));
            }
        }

        if let Some(package) = package {
            if let Some(&index) = candidates.iter().find(|&&i| self.items[i].package == package) {
                return Ok(Some(index));
            }
        }

        match candidates.as_slice() {
            [only] => Ok(Some(*only)),
            many => {
                let packages = many
                    .iter()
                    .map(|&i| self.items[i].package.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(GenError::Resolution(format!(
                    "type `{ident}` is defined in several packages ({packages}); qualify it as `package::{ident}`"
                )))
            }
        }
    }
}

fn parse_type(expr: &str) -> GenResult<Type> {
    syn::parse_str::<Type>(expr)
        .map_err(|e| GenError::Resolution(format!("invalid type expression `{expr}`: {e}")))
}

fn parse_struct(s: &syn::ItemStruct) -> GenResult<SourceStruct> {
    let attrs = parse_attrs(&s.attrs)?;
    let ident = s.ident.unraw().to_string();
    let mut out = SourceStruct {
        wire_name: attrs.rename.unwrap_or_else(|| ident.clone()),
        docs: extract_docs(&s.attrs),
        fields: Vec::new(),
        generic: !s.generics.params.is_empty(),
        tuple: false,
    };

    match &s.fields {
        Fields::Named(fields) => {
            for f in &fields.named {
                let Some(field_ident) = &f.ident else {
                    continue;
                };
                let field_attrs = parse_attrs(&f.attrs)?;
                if field_attrs.skip {
                    continue;
                }
                let field_ident = field_ident.unraw().to_string();
                let wire_name = match (field_attrs.rename, attrs.rename_all) {
                    (Some(rename), _) => rename,
                    (None, Some(rule)) => rule.apply_to_field(&field_ident),
                    (None, None) => field_ident.clone(),
                };
                out.fields.push(SourceField {
                    ident: field_ident,
                    wire_name,
                    ty: f.ty.clone(),
                    docs: extract_docs(&f.attrs),
                    defaulted: field_attrs.defaulted || attrs.defaulted,
                    flatten: field_attrs.flatten,
                    oneof: field_attrs.oneof,
                    param: field_attrs.param,
                });
            }
        }
        Fields::Unnamed(_) => out.tuple = true,
        Fields::Unit => {}
    }

    Ok(out)
}

fn parse_enum(e: &syn::ItemEnum) -> GenResult<Option<Vec<String>>> {
    let attrs = parse_attrs(&e.attrs)?;
    let mut variants = Vec::with_capacity(e.variants.len());
    for variant in &e.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Ok(None);
        }
        let variant_attrs = parse_attrs(&variant.attrs)?;
        if variant_attrs.skip {
            continue;
        }
        let ident = variant.ident.unraw().to_string();
        variants.push(match (variant_attrs.rename, attrs.rename_all) {
            (Some(rename), _) => rename,
            (None, Some(rule)) => rule.apply_to_variant(&ident),
            (None, None) => ident,
        });
    }
    Ok(Some(variants))
}

/// Whether the item derives serde's `Serialize` or `Deserialize`
fn derives_serde(attrs: &[Attribute]) -> bool {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("derive"))
        .filter_map(|attr| {
            attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
                .ok()
        })
        .flatten()
        .any(|path| {
            path.segments
                .last()
                .is_some_and(|s| s.ident == "Serialize" || s.ident == "Deserialize")
        })
}

/// Extract documentation comments from attributes.
fn extract_docs(attrs: &[Attribute]) -> Vec<String> {
    let mut docs = Vec::new();

    for attr in attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }
        if let Meta::NameValue(meta) = &attr.meta {
            if let syn::Expr::Lit(expr_lit) = &meta.value {
                if let syn::Lit::Str(lit_str) = &expr_lit.lit {
                    let doc = lit_str.value();
                    let doc = doc.trim();
                    if !doc.is_empty() {
                        docs.push(doc.to_string());
                    }
                }
            }
        }
    }

    docs
}

fn parse_attrs(attrs: &[Attribute]) -> GenResult<Attrs> {
    let mut out = Attrs::default();
    for attr in attrs {
        let result = if attr.path().is_ident("serde") {
            attr.parse_nested_meta(|meta| serde_meta(&mut out, meta))
        } else if attr.path().is_ident("typewire") {
            attr.parse_nested_meta(|meta| typewire_meta(&mut out, meta))
        } else {
            continue;
        };
        result.map_err(|e| GenError::Resolution(format!("invalid attribute: {e}")))?;
    }
    Ok(out)
}

fn serde_meta(out: &mut Attrs, meta: ParseNestedMeta) -> syn::Result<()> {
    if meta.path.is_ident("rename") {
        out.rename = serialize_value(&meta)?.or(out.rename.take());
    } else if meta.path.is_ident("rename_all") {
        if let Some(rule) = serialize_value(&meta)? {
            out.rename_all = Some(
                RenameRule::parse(&rule)
                    .ok_or_else(|| meta.error(format!("unknown rename_all rule `{rule}`")))?,
            );
        }
    } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
        out.skip = true;
    } else if meta.path.is_ident("default") || meta.path.is_ident("skip_serializing_if") {
        out.defaulted = true;
        skip_meta(meta)?;
    } else if meta.path.is_ident("flatten") {
        out.flatten = true;
    } else {
        skip_meta(meta)?;
    }
    Ok(())
}

fn typewire_meta(out: &mut Attrs, meta: ParseNestedMeta) -> syn::Result<()> {
    if meta.path.is_ident("oneof") {
        out.oneof = Some(meta.value()?.parse::<LitStr>()?.value());
    } else if meta.path.is_ident("param") {
        out.param = Some(meta.value()?.parse::<LitStr>()?.value());
    } else {
        return Err(meta.error("unknown typewire attribute; expected `oneof` or `param`"));
    }
    Ok(())
}

/// Value of `key = "x"`, or the `serialize` half of `key(serialize = "x", ...)`
fn serialize_value(meta: &ParseNestedMeta) -> syn::Result<Option<String>> {
    if meta.input.peek(Token![=]) {
        return Ok(Some(meta.value()?.parse::<LitStr>()?.value()));
    }
    let mut value = None;
    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("serialize") {
            value = Some(inner.value()?.parse::<LitStr>()?.value());
            Ok(())
        } else {
            skip_meta(inner)
        }
    })?;
    Ok(value)
}

/// Consume an attribute this module does not interpret
fn skip_meta(meta: ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(skip_meta)?;
    }
    Ok(())
}

/// Generic type arguments of a path segment, lifetimes excluded
fn type_args(segment: &syn::PathSegment) -> Vec<&Type> {
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .filter_map(|arg| match arg {
                GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Inner type of `Option<T>`
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    type_args(segment).into_iter().next()
}

fn is_u8(ty: &Type) -> bool {
    matches!(ty, Type::Path(p) if p.path.is_ident("u8"))
}

fn render_type(ty: &Type) -> String {
    quote::quote!(#ty).to_string()
}

/// A resolved type plus the literal union it implies
struct Resolved {
    ty: TypeDescriptor,
    union: Option<UnionConstraint>,
}

impl Resolved {
    fn plain(ty: TypeDescriptor) -> Self {
        Self { ty, union: None }
    }
}

/// Walks type expressions, caching structs and rejecting cycles
struct Resolver<'a> {
    set: &'a SourceSet,
    stack: Vec<usize>,
    cache: HashMap<usize, TypeDescriptor>,
}

impl<'a> Resolver<'a> {
    fn new(set: &'a SourceSet) -> Self {
        Self {
            set,
            stack: Vec::new(),
            cache: HashMap::new(),
        }
    }

    fn resolve(&mut self, ty: &Type, package: Option<&str>) -> GenResult<Resolved> {
        match ty {
            Type::Path(path) if path.qself.is_none() => self.resolve_path(&path.path, package),
            Type::Reference(r) => self.resolve(&r.elem, package),
            Type::Paren(p) => self.resolve(&p.elem, package),
            Type::Group(g) => self.resolve(&g.elem, package),
            Type::Array(a) if is_u8(&a.elem) => {
                Ok(Resolved::plain(TypeDescriptor::primitive(PrimitiveKind::Bytes)))
            }
            Type::Slice(s) if is_u8(&s.elem) => {
                Ok(Resolved::plain(TypeDescriptor::primitive(PrimitiveKind::Bytes)))
            }
            Type::Array(a) => self.sequence(&a.elem, package),
            Type::Slice(s) => self.sequence(&s.elem, package),
            other => Err(GenError::Resolution(format!(
                "unsupported type `{}`",
                render_type(other)
            ))),
        }
    }

    fn resolve_path(&mut self, path: &syn::Path, package: Option<&str>) -> GenResult<Resolved> {
        let Some(segment) = path.segments.last() else {
            return Err(GenError::Resolution("empty type path".into()));
        };
        let ident = segment.ident.unraw().to_string();
        let args = type_args(segment);

        if let Some(kind) = scalar(&ident) {
            return Ok(Resolved::plain(TypeDescriptor::primitive(kind)));
        }

        match (ident.as_str(), args.as_slice()) {
            ("Option", [inner]) => {
                let resolved = self.resolve(inner, package)?;
                return Ok(Resolved {
                    ty: TypeDescriptor::optional(resolved.ty),
                    union: resolved.union,
                });
            }
            ("Vec" | "VecDeque" | "LinkedList", [inner]) if is_u8(inner) => {
                return Ok(Resolved::plain(TypeDescriptor::primitive(PrimitiveKind::Bytes)));
            }
            ("Vec" | "VecDeque" | "LinkedList" | "HashSet" | "BTreeSet" | "IndexSet", [inner]) => {
                return self.sequence(inner, package);
            }
            ("HashMap" | "BTreeMap" | "IndexMap", [key, value, ..]) => {
                let key_kind = self.map_key(key, package)?;
                let value = self.resolve(value, package)?;
                return Ok(Resolved::plain(TypeDescriptor::map(key_kind, value.ty)));
            }
            ("Box" | "Arc" | "Rc" | "Cow", [inner]) => return self.resolve(inner, package),
            _ => {}
        }

        match self.set.lookup(path, package)? {
            Some(index) => self.resolve_item(index),
            None => Err(GenError::Resolution(format!(
                "unknown type `{}`",
                render_type(&Type::Path(syn::TypePath {
                    qself: None,
                    path: path.clone(),
                }))
            ))),
        }
    }

    fn sequence(&mut self, element: &Type, package: Option<&str>) -> GenResult<Resolved> {
        let resolved = self.resolve(element, package)?;
        Ok(Resolved {
            ty: TypeDescriptor::slice(resolved.ty),
            union: resolved.union,
        })
    }

    fn map_key(&mut self, key: &Type, package: Option<&str>) -> GenResult<PrimitiveKind> {
        match self.resolve(key, package)?.ty {
            TypeDescriptor::Primitive(kind) if kind != PrimitiveKind::Any => Ok(kind),
            other => Err(GenError::Resolution(format!(
                "map keys must be scalar, found {}",
                other.describe()
            ))),
        }
    }

    fn resolve_item(&mut self, index: usize) -> GenResult<Resolved> {
        let set = self.set;
        let item = &set.items[index];
        match &item.kind {
            ItemKind::Enum(Some(variants)) => {
                let tokens = variants.iter().map(|v| quote_token(v));
                Ok(Resolved {
                    ty: TypeDescriptor::string(),
                    union: Some(UnionConstraint::new(tokens)),
                })
            }
            ItemKind::Enum(None) => Err(GenError::Resolution(format!(
                "enum `{}` carries data; only unit enums map to literal unions",
                item.ident
            ))),
            ItemKind::Struct(_) => Ok(Resolved::plain(self.resolve_struct(index)?)),
        }
    }

    fn resolve_struct(&mut self, index: usize) -> GenResult<TypeDescriptor> {
        if let Some(cached) = self.cache.get(&index) {
            return Ok(cached.clone());
        }
        let set = self.set;
        let item = &set.items[index];
        let ItemKind::Struct(s) = &item.kind else {
            return Err(GenError::Resolution(format!("`{}` is not a struct", item.ident)));
        };

        if let Some(at) = self.stack.iter().position(|&i| i == index) {
            let cycle = self.stack[at..]
                .iter()
                .chain(std::iter::once(&index))
                .map(|&i| set.items[i].ident.as_str())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(GenError::Resolution(format!(
                "recursive type `{cycle}` is not supported"
            )));
        }
        if s.generic {
            return Err(GenError::Resolution(format!(
                "generic struct `{}` is not supported",
                item.ident
            )));
        }
        if s.tuple {
            return Err(GenError::Resolution(format!(
                "tuple struct `{}` is not supported",
                item.ident
            )));
        }

        self.stack.push(index);
        let fields = self.struct_fields(&item.package, s);
        self.stack.pop();

        let named = NamedType::new(item.package.clone(), s.wire_name.clone(), fields?)
            .with_docs(s.docs.clone());
        let descriptor = TypeDescriptor::named(named);
        self.cache.insert(index, descriptor.clone());
        Ok(descriptor)
    }

    fn struct_fields(&mut self, package: &str, s: &SourceStruct) -> GenResult<Vec<FieldDescriptor>> {
        let mut fields = Vec::with_capacity(s.fields.len());
        let mut seen = HashSet::new();
        for field in &s.fields {
            let resolved = if field.flatten {
                self.flattened(package, field)?
            } else {
                vec![self.field(package, field)?]
            };
            for f in resolved {
                if !seen.insert(f.name.clone()) {
                    return Err(GenError::Resolution(format!(
                        "field `{}` appears more than once on the wire",
                        f.name
                    )));
                }
                fields.push(f);
            }
        }
        Ok(fields)
    }

    fn field(&mut self, package: &str, field: &SourceField) -> GenResult<FieldDescriptor> {
        let (inner, is_option) = match option_inner(&field.ty) {
            Some(inner) => (inner, true),
            None => (&field.ty, false),
        };
        let resolved = self
            .resolve(inner, Some(package))
            .map_err(|e| match e {
                GenError::Resolution(msg) => {
                    GenError::Resolution(format!("field `{}`: {msg}", field.ident))
                }
                other => other,
            })?;

        let mut out = FieldDescriptor::new(field.wire_name.clone(), resolved.ty)
            .with_docs(field.docs.clone());
        if field.wire_name != field.ident {
            out = out.with_source_name(field.ident.clone());
        }
        if is_option || field.defaulted {
            out = out.optional();
        }
        if let Some(param) = &field.param {
            out = out.with_param_name(param.clone());
        }
        let union = match &field.oneof {
            Some(spec) => Some(UnionConstraint::parse(spec)),
            None => resolved.union,
        };
        if let Some(union) = union {
            out = out.with_union(union);
        }
        Ok(out)
    }

    fn flattened(&mut self, package: &str, field: &SourceField) -> GenResult<Vec<FieldDescriptor>> {
        let (inner, is_option) = match option_inner(&field.ty) {
            Some(inner) => (inner, true),
            None => (&field.ty, false),
        };
        let resolved = self.resolve(inner, Some(package))?;
        let Some(nested) = resolved.ty.fields() else {
            return Err(GenError::Resolution(format!(
                "flattened field `{}` must be a struct, found {}",
                field.ident,
                resolved.ty.describe()
            )));
        };
        Ok(nested
            .iter()
            .cloned()
            .map(|f| if is_option { f.optional() } else { f })
            .collect())
    }
}

/// Primitive kind of a scalar type name
fn scalar(ident: &str) -> Option<PrimitiveKind> {
    Some(match ident {
        "String" | "str" | "char" | "Uuid" | "PathBuf" | "Url" => PrimitiveKind::String,
        "bool" => PrimitiveKind::Bool,
        "i8" | "i16" | "i32" | "u8" | "u16" | "u32" => PrimitiveKind::Int,
        "i64" | "u64" | "i128" | "u128" | "isize" | "usize" => PrimitiveKind::Int64,
        "f32" | "f64" => PrimitiveKind::Float,
        "DateTime" | "NaiveDateTime" | "NaiveDate" | "NaiveTime" | "SystemTime"
        | "OffsetDateTime" | "PrimitiveDateTime" => PrimitiveKind::Timestamp,
        "Value" => PrimitiveKind::Any,
        "Bytes" | "ByteBuf" => PrimitiveKind::Bytes,
        _ => return None,
    })
}

fn quote_token(value: &str) -> String {
    if value.contains('\'') {
        format!("\"{value}\"")
    } else {
        format!("'{value}'")
    }
}
