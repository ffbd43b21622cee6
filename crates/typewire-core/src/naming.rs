//! Naming convention utilities for code generation.
//!
//! # Supported Conversions
//!
//! | Input | Function | Output |
//! |-------|----------|--------|
//! | `snake_case` | [`to_camel_case`] | `camelCase` |
//! | `snake_case`, `kebab-case`, `dot.separated` | [`to_pascal_case`] | `PascalCase` |
//! | `word` | [`capitalize`] | `Word` |
//! | `user.joined` | [`to_method_suffix`] | `UserJoined` |

/// Convert snake_case to camelCase.
///
/// # Examples
///
/// ```
/// use typewire_core::naming::to_camel_case;
///
/// assert_eq!(to_camel_case("hello_world"), "helloWorld");
/// assert_eq!(to_camel_case("display_name"), "displayName");
/// assert_eq!(to_camel_case("already"), "already");
/// ```
pub fn to_camel_case(s: &str) -> String {
    let mut result = String::new();
    let mut capitalize_next = false;

    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push_str(&c.to_uppercase().to_string());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    result
}

/// Convert a string to PascalCase.
///
/// Any non-alphanumeric character separates words; the case of letters
/// inside a word is preserved, so `getPerson` becomes `GetPerson`.
///
/// # Examples
///
/// ```
/// use typewire_core::naming::to_pascal_case;
///
/// assert_eq!(to_pascal_case("hello_world"), "HelloWorld");
/// assert_eq!(to_pascal_case("hello-world"), "HelloWorld");
/// assert_eq!(to_pascal_case("chat.message"), "ChatMessage");
/// assert_eq!(to_pascal_case("getPerson"), "GetPerson");
/// ```
pub fn to_pascal_case(s: &str) -> String {
    s.split(|c: char| !c.is_alphanumeric())
        .map(capitalize)
        .collect()
}

/// Capitalize the first letter of a string.
///
/// # Examples
///
/// ```
/// use typewire_core::naming::capitalize;
///
/// assert_eq!(capitalize("hello"), "Hello");
/// assert_eq!(capitalize(""), "");
/// ```
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Convert a message type tag into a method name suffix.
///
/// The result is always a valid identifier tail: tags that start with a digit
/// or contain no alphanumerics get an underscore prefix.
///
/// # Examples
///
/// ```
/// use typewire_core::naming::to_method_suffix;
///
/// assert_eq!(to_method_suffix("user.joined"), "UserJoined");
/// assert_eq!(to_method_suffix("chat"), "Chat");
/// assert_eq!(to_method_suffix("2fa"), "_2fa");
/// ```
pub fn to_method_suffix(tag: &str) -> String {
    let pascal = to_pascal_case(tag);
    match pascal.chars().next() {
        Some(c) if !c.is_ascii_digit() => pascal,
        _ => format!("_{pascal}"),
    }
}

/// Check whether a string is a plain identifier usable with dot access.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn to_camel_case___converts_snake_case() {
        assert_eq!(to_camel_case("hello_world"), "helloWorld");
        assert_eq!(to_camel_case("display_name"), "displayName");
        assert_eq!(to_camel_case("foo_bar_baz"), "fooBarBaz");
    }

    #[test]
    fn to_camel_case___handles_consecutive_underscores() {
        assert_eq!(to_camel_case("foo__bar"), "fooBar");
        assert_eq!(to_camel_case("_leading"), "Leading");
        assert_eq!(to_camel_case("trailing_"), "trailing");
    }

    #[test]
    fn to_pascal_case___converts_separated_words() {
        assert_eq!(to_pascal_case("display_name"), "DisplayName");
        assert_eq!(to_pascal_case("chat-room"), "ChatRoom");
        assert_eq!(to_pascal_case("order.item.add"), "OrderItemAdd");
    }

    #[test]
    fn to_pascal_case___preserves_inner_case() {
        assert_eq!(to_pascal_case("getPerson"), "GetPerson");
        assert_eq!(to_pascal_case("HTTPServer"), "HTTPServer");
    }

    #[test]
    fn to_pascal_case___handles_empty() {
        assert_eq!(to_pascal_case(""), "");
        assert_eq!(to_pascal_case("--"), "");
    }

    #[test]
    fn capitalize___preserves_rest_of_string() {
        assert_eq!(capitalize("helloWorld"), "HelloWorld");
        assert_eq!(capitalize("ALLCAPS"), "ALLCAPS");
        assert_eq!(capitalize("a"), "A");
    }

    #[test]
    fn to_method_suffix___collapses_separators() {
        assert_eq!(to_method_suffix("user-joined"), "UserJoined");
        assert_eq!(to_method_suffix("user_joined"), "UserJoined");
        assert_eq!(to_method_suffix("user.joined"), "UserJoined");
    }

    #[test]
    fn to_method_suffix___prefixes_non_letter_start() {
        assert_eq!(to_method_suffix("404"), "_404");
        assert_eq!(to_method_suffix("!!"), "_");
    }

    #[test]
    fn is_identifier___accepts_plain_names() {
        assert!(is_identifier("ID"));
        assert!(is_identifier("personID"));
        assert!(is_identifier("_x$"));
    }

    #[test]
    fn is_identifier___rejects_other_text() {
        assert!(!is_identifier(""));
        assert!(!is_identifier("1a"));
        assert!(!is_identifier("X-Trace-Id"));
        assert!(!is_identifier("a b"));
    }
}
