//! # Objective-C Naming
//!
//! Conversion of schema identifiers into valid Objective-C names: case
//! conversion, invalid-character stripping, reserved-word escaping, and the
//! suffix attachment used by the global name-collision pass.

use heck::{ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};

/// C / Objective-C keywords that cannot be used as bare identifiers, plus
/// `description`, which collides with `NSObject`.
pub const RESERVED_WORDS: &[&str] = &[
    "if", "else", "switch", "case", "default", "break", "int", "float", "char", "double", "long",
    "for", "while", "do", "void", "goto", "auto", "signed", "const", "extern", "register",
    "unsigned", "return", "continue", "enum", "sizeof", "struct", "typedef", "union", "volatile",
    "description",
];

/// True when the identifier is a reserved word.
pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// Appends the escape suffix when the name is reserved.
pub fn escape_reserved_name(name: &str, suffix: &str) -> String {
    if is_reserved_word(name) {
        format!("{}{}", name, suffix)
    } else {
        name.to_string()
    }
}

/// Strips every character that cannot appear in an identifier.
fn remove_invalid_characters(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Converts a schema name to a property name (camelCase).
pub fn property_name(name: &str) -> String {
    if name.trim().is_empty() {
        return name.to_string();
    }
    remove_invalid_characters(&escape_reserved_name(name, "Property").to_lower_camel_case())
}

/// Converts a schema name to a method name (camelCase).
pub fn method_name(name: &str) -> String {
    if name.trim().is_empty() {
        return name.to_string();
    }
    remove_invalid_characters(&escape_reserved_name(name, "Method").to_lower_camel_case())
}

/// Converts a schema name to a parameter or local variable name (camelCase).
pub fn variable_name(name: &str) -> String {
    if name.trim().is_empty() {
        return name.to_string();
    }
    remove_invalid_characters(&escape_reserved_name(name, "Variable").to_lower_camel_case())
}

/// Converts a schema name to a valid Objective-C type name (PascalCase).
pub fn type_name(name: &str) -> String {
    if name.trim().is_empty() {
        return name.to_string();
    }
    remove_invalid_characters(&escape_reserved_name(name, "Type").to_upper_camel_case())
}

/// Converts a schema name to an operation-group name: PascalCase with a
/// pluralizing `s` appended when missing.
pub fn method_group_name(name: &str) -> String {
    if name.trim().is_empty() {
        return name.to_string();
    }
    let mut name = type_name(name);
    if !name.ends_with('s') && !name.ends_with('S') {
        name.push('s');
    }
    name
}

/// Converts an enum member name to SCREAMING_SNAKE_CASE.
pub fn enum_member_name(name: &str) -> String {
    if name.trim().is_empty() {
        return name.to_string();
    }
    let cleaned: String = name
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect();
    remove_invalid_characters(&cleaned).to_shouty_snake_case()
}

/// The service-type name for the client.
pub fn service_name(name: &str) -> String {
    if name.trim().is_empty() {
        return name.to_string();
    }
    format!("{}Service", type_name(name))
}

/// Lowercase phrase form of an identifier, for generated documentation.
pub fn to_phrase(name: &str) -> String {
    name.to_snake_case().replace('_', " ")
}

/// Strips a leading namespace/package prefix from a type name, case
/// insensitively, as long as a usable name remains.
pub fn trim_package_name(name: &str, package: &str) -> String {
    if package.is_empty() || name.len() <= package.len() {
        return name.to_string();
    }
    if name.to_lowercase().starts_with(&package.to_lowercase()) {
        name[package.len()..].to_string()
    } else {
        name.to_string()
    }
}

/// Attaches a disambiguating suffix to an exported name.
///
/// Reserved words are escaped first. The suffix is attached only when the
/// name is already in use by another exported item and does not equal the
/// package name itself.
pub fn attach_type_name(name: &str, package_name: &str, name_in_use: bool, attachment: &str) -> String {
    let name = escape_reserved_name(name, "Type");
    if name_in_use && !name.eq_ignore_ascii_case(package_name) {
        format!("{}{}", name, attachment)
    } else {
        name
    }
}
