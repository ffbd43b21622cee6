//! Literal-union synthesis.
//!
//! A field carrying a [`UnionConstraint`] is narrowed from its scalar type to
//! a closed set of literals. Tokens are interpreted according to the field's
//! kind; a token that does not fit that kind rejects the whole constraint.
//!
//! | Field kind | Token interpretation |
//! |------------|----------------------|
//! | string, bytes, timestamp | verbatim, surrounding quotes stripped |
//! | bool | `true` / `false` only |
//! | int, float, int64 (number mode) | finite decimal numbers |
//! | int64 (string mode) | integers, rendered as string literals |
//! | any | inferred per token, all tokens must agree |

use crate::ts::string_literal;
use serde_json::Value;
use typewire_core::{
    FieldDescriptor, GenError, GenResult, Int64Mode, LiteralKind, PrimitiveKind, TypeDescriptor,
    UnionConstraint,
};

/// A single literal member of a union
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl Literal {
    pub fn kind(&self) -> LiteralKind {
        match self {
            Literal::Str(_) => LiteralKind::String,
            Literal::Num(_) => LiteralKind::Number,
            Literal::Bool(_) => LiteralKind::Boolean,
        }
    }

    /// TypeScript source text of the literal
    pub fn to_ts(&self) -> String {
        match self {
            Literal::Str(s) => string_literal(s),
            Literal::Num(n) => format_number(*n),
            Literal::Bool(b) => b.to_string(),
        }
    }

    /// Whether a JSON value equals this literal
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Literal::Str(s), Value::String(v)) => s == v,
            (Literal::Num(n), Value::Number(v)) => v.as_f64() == Some(*n),
            (Literal::Bool(b), Value::Bool(v)) => b == v,
            _ => false,
        }
    }
}

/// Closed, homogeneous set of literals
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralUnion {
    kind: LiteralKind,
    literals: Vec<Literal>,
}

impl LiteralUnion {
    pub fn kind(&self) -> LiteralKind {
        self.kind
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    /// Type text such as `'a' | 'b'`
    pub fn type_text(&self) -> String {
        self.literals
            .iter()
            .map(Literal::to_ts)
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// Validator expression testing `expr` against the literal set
    pub fn validator_expr(&self, expr: &str) -> String {
        let alternatives = self
            .literals
            .iter()
            .map(|l| format!("{expr} === {}", l.to_ts()))
            .collect::<Vec<_>>()
            .join(" || ");
        format!(
            "(typeof {expr} === '{}' && ({alternatives}))",
            self.kind.type_of()
        )
    }

    pub fn accepts(&self, value: &Value) -> bool {
        self.literals.iter().any(|l| l.matches(value))
    }
}

/// Build the literal union for a constrained field.
///
/// Fails with an error naming the field when the constraint is empty, sits on
/// a non-scalar field, or contains a token of the wrong kind.
pub fn synthesize(field: &FieldDescriptor, int64: Int64Mode) -> GenResult<Option<LiteralUnion>> {
    let Some(constraint) = &field.union else {
        return Ok(None);
    };
    from_constraint(&field.name, &field.ty, constraint, int64).map(Some)
}

/// Reject invalid literal unions anywhere inside a descriptor
pub fn validate_descriptor(ty: &TypeDescriptor, int64: Int64Mode) -> GenResult<()> {
    ty.visit_fields(&mut |field: &FieldDescriptor| synthesize(field, int64).map(|_| ()))
}

pub fn from_constraint(
    field: &str,
    ty: &TypeDescriptor,
    constraint: &UnionConstraint,
    int64: Int64Mode,
) -> GenResult<LiteralUnion> {
    if constraint.is_empty() {
        return Err(GenError::EmptyUnion {
            field: field.to_string(),
        });
    }

    let kind = scalar_kind(ty).ok_or_else(|| GenError::UnionOnNonScalar {
        field: field.to_string(),
        found: ty.describe(),
    })?;

    let mut union: Option<LiteralUnion> = None;
    for token in &constraint.tokens {
        let literal = interpret(field, kind, int64, token, union.as_ref().map(|u| u.kind))?;
        let target = union.get_or_insert_with(|| LiteralUnion {
            kind: literal.kind(),
            literals: Vec::new(),
        });
        if !target.literals.contains(&literal) {
            target.literals.push(literal);
        }
    }

    union.ok_or_else(|| GenError::EmptyUnion {
        field: field.to_string(),
    })
}

/// The primitive a union applies to; slices constrain their elements
fn scalar_kind(ty: &TypeDescriptor) -> Option<PrimitiveKind> {
    match ty {
        TypeDescriptor::Primitive(kind) => Some(*kind),
        TypeDescriptor::Optional(inner) | TypeDescriptor::Slice(inner) => scalar_kind(inner),
        _ => None,
    }
}

fn interpret(
    field: &str,
    kind: PrimitiveKind,
    int64: Int64Mode,
    token: &str,
    established: Option<LiteralKind>,
) -> GenResult<Literal> {
    let classified = classify(token);
    let mismatch = |expected: &str, found: LiteralKind| GenError::HeterogeneousUnion {
        field: field.to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
        token: token.to_string(),
    };

    match kind {
        PrimitiveKind::String | PrimitiveKind::Bytes | PrimitiveKind::Timestamp => {
            Ok(Literal::Str(unquote(token).to_string()))
        }
        PrimitiveKind::Bool => match classified {
            Literal::Bool(_) => Ok(classified),
            other => Err(mismatch("boolean", other.kind())),
        },
        PrimitiveKind::Int64 if int64 == Int64Mode::String => match token.parse::<i128>() {
            Ok(value) => Ok(Literal::Str(value.to_string())),
            Err(_) => Err(mismatch("integer", classified.kind())),
        },
        PrimitiveKind::Int | PrimitiveKind::Float | PrimitiveKind::Int64 => match classified {
            Literal::Num(_) => Ok(classified),
            other => Err(mismatch("number", other.kind())),
        },
        PrimitiveKind::Any => match established {
            Some(expected) if expected != classified.kind() => {
                Err(mismatch(expected.type_of(), classified.kind()))
            }
            _ => Ok(classified),
        },
    }
}

/// Infer the literal a bare token denotes
fn classify(token: &str) -> Literal {
    if is_quoted(token) {
        return Literal::Str(unquote(token).to_string());
    }
    match token {
        "true" => return Literal::Bool(true),
        "false" => return Literal::Bool(false),
        _ => {}
    }
    match token.parse::<f64>() {
        Ok(n) if n.is_finite() && looks_numeric(token) => Literal::Num(n),
        _ => Literal::Str(token.to_string()),
    }
}

/// Rust also parses `inf` and `NaN`; only accept decimal notation
fn looks_numeric(token: &str) -> bool {
    token
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
}

fn is_quoted(token: &str) -> bool {
    token.len() >= 2
        && ((token.starts_with('\'') && token.ends_with('\''))
            || (token.starts_with('"') && token.ends_with('"')))
}

fn unquote(token: &str) -> &str {
    if is_quoted(token) {
        &token[1..token.len() - 1]
    } else {
        token
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
