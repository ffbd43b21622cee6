//! TypeScript source text helpers shared by the synthesizers.

use typewire_core::naming::is_identifier;

/// Render a single-quoted TypeScript string literal.
///
/// # Examples
///
/// ```
/// use typewire_codegen::ts::string_literal;
///
/// assert_eq!(string_literal("chat"), "'chat'");
/// assert_eq!(string_literal("it's"), r"'it\'s'");
/// ```
pub fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Escape text placed between the backticks of a template literal.
pub fn template_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

/// Property key as written in an interface or object literal.
pub fn property_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        string_literal(name)
    }
}

/// Property read on an object whose type declares the property.
///
/// Uses dot access where the key allows it.
pub fn property_access(object: &str, name: &str) -> String {
    if is_identifier(name) {
        format!("{object}.{name}")
    } else {
        format!("{object}[{}]", string_literal(name))
    }
}

/// Bracket read on an untyped record.
pub fn index_access(object: &str, name: &str) -> String {
    format!("{object}[{}]", string_literal(name))
}

/// Render a JSDoc block at the given indentation, or nothing for empty docs.
pub fn doc_comment(lines: &[String], indent: &str) -> String {
    let lines: Vec<String> = lines.iter().map(|l| l.replace("*/", "*\\/")).collect();
    match lines.as_slice() {
        [] => String::new(),
        [single] => format!("{indent}/** {single} */\n"),
        many => {
            let mut out = format!("{indent}/**\n");
            for line in many {
                if line.is_empty() {
                    out.push_str(&format!("{indent} *\n"));
                } else {
                    out.push_str(&format!("{indent} * {line}\n"));
                }
            }
            out.push_str(&format!("{indent} */\n"));
            out
        }
    }
}

/// Wrap an element type in array syntax, using `Array<T>` for compound types.
pub fn array_of(element: &str) -> String {
    if element.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
        format!("{element}[]")
    } else {
        format!("Array<{element}>")
    }
}

/// Append `| null` unless the type already admits null.
pub fn nullable(ty: &str) -> String {
    if ty.ends_with(" | null") {
        ty.to_string()
    } else {
        format!("{ty} | null")
    }
}
