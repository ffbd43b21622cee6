//! Endpoint validation and normalization.

use super::{
    EndpointDescriptor, HttpMethod, ParamGroups, PathSegment, PlaceholderBinding,
    ResponseDescriptor, RawEndpoint,
};
use crate::union;
use std::collections::HashSet;
use typewire_core::naming::is_identifier;
use typewire_core::{
    EndpointRef, FieldDescriptor, GenError, GenResult, GeneratorConfig, TypeDescriptor,
};

/// Validate every endpoint, failing on the first inconsistency
pub fn extract_endpoints(
    raws: &[RawEndpoint],
    config: &GeneratorConfig,
) -> GenResult<Vec<EndpointDescriptor>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(raws.len());
    for (index, raw) in raws.iter().enumerate() {
        let endpoint = extract_endpoint(index, raw, config)?;
        if !seen.insert(endpoint.name.clone()) {
            return Err(GenError::DuplicateEndpoint(endpoint.name.clone())
                .in_endpoint(EndpointRef::http(index, &raw.name)));
        }
        out.push(endpoint);
    }
    Ok(out)
}

/// Validate one endpoint declaration
///
/// Errors are wrapped with the endpoint's index and name.
pub fn extract_endpoint(
    index: usize,
    raw: &RawEndpoint,
    config: &GeneratorConfig,
) -> GenResult<EndpointDescriptor> {
    extract_inner(raw, config).map_err(|e| e.in_endpoint(EndpointRef::http(index, &raw.name)))
}

fn extract_inner(raw: &RawEndpoint, config: &GeneratorConfig) -> GenResult<EndpointDescriptor> {
    if !is_identifier(&raw.name) {
        return Err(GenError::InvalidName(raw.name.clone()));
    }

    let method: HttpMethod = raw.method.parse()?;

    if raw.path.trim().is_empty() {
        return Err(GenError::EmptyPath);
    }

    let params = ParamGroups {
        path: struct_group("path parameters", raw.path_params.as_ref())?,
        query: struct_group("query parameters", raw.query.as_ref())?,
        headers: struct_group("header parameters", raw.headers.as_ref())?,
        cookies: struct_group("cookie parameters", raw.cookies.as_ref())?,
    };

    let full_path = config.full_path(&raw.path);
    let segments = parse_path(&full_path);
    let bindings = bind_placeholders(&segments, params.path.as_ref())?;

    let mut descriptors: Vec<&TypeDescriptor> = params.iter().map(|(_, ty)| ty).collect();
    descriptors.extend(raw.request.as_ref());
    descriptors.extend(raw.responses.iter().filter_map(|r| r.body.as_ref()));
    for ty in descriptors {
        union::validate_descriptor(ty, config.int64)?;
    }

    let responses = raw
        .responses
        .iter()
        .map(|r| ResponseDescriptor {
            status: r.status,
            description: r.description.clone(),
            body: r.body.clone(),
        })
        .collect();

    Ok(EndpointDescriptor {
        name: raw.name.clone(),
        method,
        path: raw.path.trim().to_string(),
        full_path,
        segments,
        bindings,
        params,
        request: raw.request.clone(),
        responses,
        request_content: raw.request_content,
        response_content: raw.response_content,
        docs: raw
            .description
            .as_deref()
            .map(|d| d.lines().map(|l| l.trim().to_string()).collect())
            .unwrap_or_default(),
    })
}

fn struct_group(target: &str, ty: Option<&TypeDescriptor>) -> GenResult<Option<TypeDescriptor>> {
    match ty {
        None => Ok(None),
        Some(ty) if ty.is_struct() => Ok(Some(ty.clone())),
        Some(other) => Err(GenError::NonStructTarget {
            target: target.to_string(),
            found: other.describe(),
        }),
    }
}

/// Split a path template into literal text and placeholders.
///
/// `:name` placeholders end at the first character that cannot appear in an
/// identifier; `{name}` placeholders may appear anywhere. An unclosed brace
/// is kept as literal text.
///
/// # Examples
///
/// ```
/// use typewire_codegen::http::{PathSegment, parse_path};
///
/// assert_eq!(
///     parse_path("/person/:id"),
///     vec![
///         PathSegment::Literal("/person/".into()),
///         PathSegment::Placeholder("id".into()),
///     ]
/// );
/// ```
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let chars: Vec<char> = path.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == ':' && chars.get(i + 1).is_some_and(|n| is_name_start(*n)) {
            let start = i + 1;
            let mut end = start;
            while end < chars.len() && is_name_char(chars[end]) {
                end += 1;
            }
            flush_literal(&mut segments, &mut literal);
            segments.push(PathSegment::Placeholder(chars[start..end].iter().collect()));
            i = end;
            continue;
        }
        if c == '{' {
            if let Some(close) = chars[i + 1..].iter().position(|&n| n == '}') {
                let name: String = chars[i + 1..i + 1 + close].iter().collect();
                let name = name.trim();
                if !name.is_empty() {
                    flush_literal(&mut segments, &mut literal);
                    segments.push(PathSegment::Placeholder(name.to_string()));
                    i += close + 2;
                    continue;
                }
            }
        }
        literal.push(c);
        i += 1;
    }
    flush_literal(&mut segments, &mut literal);
    segments
}

fn flush_literal(segments: &mut Vec<PathSegment>, literal: &mut String) {
    if !literal.is_empty() {
        segments.push(PathSegment::Literal(std::mem::take(literal)));
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Map every placeholder to exactly one path parameter field.
///
/// Matching is case-insensitive against the wire name and the declared name.
fn bind_placeholders(
    segments: &[PathSegment],
    path_params: Option<&TypeDescriptor>,
) -> GenResult<Vec<PlaceholderBinding>> {
    let fields: &[FieldDescriptor] = path_params.and_then(|t| t.fields()).unwrap_or(&[]);
    let mut bindings: Vec<PlaceholderBinding> = Vec::new();

    for segment in segments {
        let PathSegment::Placeholder(placeholder) = segment else {
            continue;
        };
        if bindings.iter().any(|b| &b.placeholder == placeholder) {
            continue;
        }

        let candidates: Vec<&FieldDescriptor> = fields
            .iter()
            .filter(|f| {
                f.name.eq_ignore_ascii_case(placeholder)
                    || f.source_name.eq_ignore_ascii_case(placeholder)
            })
            .collect();

        match candidates.as_slice() {
            [] => {
                return Err(GenError::UnmappedPlaceholder {
                    placeholder: placeholder.clone(),
                });
            }
            [field] => bindings.push(PlaceholderBinding {
                placeholder: placeholder.clone(),
                field: field.name.clone(),
            }),
            many => {
                return Err(GenError::AmbiguousPlaceholder {
                    placeholder: placeholder.clone(),
                    candidates: many
                        .iter()
                        .map(|f| f.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            }
        }
    }

    Ok(bindings)
}
