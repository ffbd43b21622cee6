//! Runtime validator synthesis.
//!
//! Every rendered type has a [`Check`] describing what a conforming JSON value
//! looks like. The same tree is rendered to a TypeScript guard expression and
//! evaluated in Rust by [`Check::accepts`], so the emitted validators can be
//! exercised without a JavaScript runtime.

use crate::ts::{index_access, string_literal};
use crate::union::LiteralUnion;
use serde_json::Value;
use std::collections::HashMap;

/// Structural check for a JSON value
#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    /// Anything, including `null`
    Any,
    /// `typeof value === tag`
    TypeOf(&'static str),
    /// Delegate to the guard of a registered type
    Ref(String),
    Literals(LiteralUnion),
    Array(Box<Check>),
    /// Plain object whose values all pass the element check
    Record(Box<Check>),
    Nullable(Box<Check>),
    /// Plain object with the listed fields
    Object(Vec<FieldCheck>),
}

/// Check applied to one property of an object
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCheck {
    pub key: String,
    /// Absent and `null` are both accepted
    pub optional: bool,
    pub check: Check,
}

/// Resolves [`Check::Ref`] targets during evaluation
pub trait CheckLookup {
    fn lookup(&self, name: &str) -> Option<&Check>;
}

impl CheckLookup for HashMap<String, Check> {
    fn lookup(&self, name: &str) -> Option<&Check> {
        self.get(name)
    }
}

/// Lookup for checks that contain no references
impl CheckLookup for () {
    fn lookup(&self, _name: &str) -> Option<&Check> {
        None
    }
}

/// Name of the guard function for a registered type
pub fn guard_name(type_name: &str) -> String {
    format!("is{type_name}")
}

/// Name of the throwing assertion for a registered type
pub fn ensure_name(type_name: &str) -> String {
    format!("ensure{type_name}")
}

impl Check {
    /// Render a boolean TypeScript expression testing `expr`.
    ///
    /// `depth` keeps lambda parameter names unique in nested containers.
    pub fn render(&self, expr: &str, depth: usize) -> String {
        match self {
            Check::Any => "true".to_string(),
            Check::TypeOf(tag) => format!("typeof {expr} === '{tag}'"),
            Check::Ref(name) => format!("{}({expr})", guard_name(name)),
            Check::Literals(union) => union.validator_expr(expr),
            Check::Array(element) => {
                if **element == Check::Any {
                    return format!("Array.isArray({expr})");
                }
                let var = format!("e{depth}");
                format!(
                    "(Array.isArray({expr}) && ({expr} as unknown[]).every(({var}: unknown) => {}))",
                    element.render(&var, depth + 1)
                )
            }
            Check::Record(element) => {
                let object = object_test(expr);
                if **element == Check::Any {
                    return format!("({object})");
                }
                let var = format!("e{depth}");
                format!(
                    "({object} && Object.values({expr} as Record<string, unknown>).every(({var}: unknown) => {}))",
                    element.render(&var, depth + 1)
                )
            }
            Check::Nullable(inner) => {
                format!("({expr} === null || {})", inner.render(expr, depth))
            }
            Check::Object(fields) => {
                let mut parts = vec![object_test(expr)];
                let record = format!("({expr} as Record<string, unknown>)");
                for field in fields {
                    parts.push(field.render(&index_access(&record, &field.key), depth));
                }
                format!("({})", parts.join(" && "))
            }
        }
    }

    /// Evaluate the check against a JSON value
    pub fn accepts(&self, value: &Value, lookup: &dyn CheckLookup) -> bool {
        match self {
            Check::Any => true,
            Check::TypeOf(tag) => match *tag {
                "string" => value.is_string(),
                "number" => value.is_number(),
                "boolean" => value.is_boolean(),
                "object" => value.is_object() || value.is_array() || value.is_null(),
                _ => false,
            },
            Check::Ref(name) => lookup
                .lookup(name)
                .is_some_and(|check| check.accepts(value, lookup)),
            Check::Literals(union) => union.accepts(value),
            Check::Array(element) => value
                .as_array()
                .is_some_and(|items| items.iter().all(|v| element.accepts(v, lookup))),
            Check::Record(element) => value
                .as_object()
                .is_some_and(|map| map.values().all(|v| element.accepts(v, lookup))),
            Check::Nullable(inner) => value.is_null() || inner.accepts(value, lookup),
            Check::Object(fields) => value
                .as_object()
                .is_some_and(|map| fields.iter().all(|f| f.accepts(map.get(&f.key), lookup))),
        }
    }
}

impl FieldCheck {
    pub fn new(key: impl Into<String>, optional: bool, check: Check) -> Self {
        Self {
            key: key.into(),
            optional,
            check,
        }
    }

    /// Expression testing the property read by `access`
    pub fn render(&self, access: &str, depth: usize) -> String {
        let inner = self.check.render(access, depth);
        if self.optional {
            format!("({access} === undefined || {access} === null || {inner})")
        } else {
            inner
        }
    }

    pub fn accepts(&self, value: Option<&Value>, lookup: &dyn CheckLookup) -> bool {
        match value {
            None => self.optional,
            Some(Value::Null) if self.optional => true,
            Some(v) => self.check.accepts(v, lookup),
        }
    }
}

fn object_test(expr: &str) -> String {
    format!("typeof {expr} === 'object' && {expr} !== null && !Array.isArray({expr})")
}

/// Render the guard and assertion functions for a registered struct type.
///
/// Returns two declarations without blank lines inside either.
pub fn render_guards(type_name: &str, fields: &[FieldCheck]) -> [String; 2] {
    let guard = guard_name(type_name);
    let mut out = format!("export function {guard}(value: unknown): value is {type_name} {{\n");
    out.push_str(
        "  if (typeof value !== 'object' || value === null || Array.isArray(value)) return false;\n",
    );
    if !fields.is_empty() {
        out.push_str("  const o = value as Record<string, unknown>;\n");
    }
    for field in fields {
        let test = field.render(&index_access("o", &field.key), 0);
        out.push_str(&format!("  if (!{}) return false;\n", parenthesize(&test)));
    }
    out.push_str("  return true;\n}");

    let ensure = format!(
        "export function {}(value: unknown): {type_name} {{\n  if (!{guard}(value)) throw new TypeError({});\n  return value;\n}}",
        ensure_name(type_name),
        string_literal(&format!("value is not a valid {type_name}")),
    );

    [out, ensure]
}

fn parenthesize(expr: &str) -> String {
    if expr.starts_with('(') && expr.ends_with(')') && balanced_outer(expr) {
        expr.to_string()
    } else {
        format!("({expr})")
    }
}

/// Whether the first paren closes at the very end of the expression
fn balanced_outer(expr: &str) -> bool {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let last = expr.len() - 1;
    for (i, c) in expr.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && i != last {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
