//! Placeholder rendering for prompt templates.

use std::collections::BTreeMap;

use minijinja::Environment;

use crate::error::Result;

/// Renders `{{name}}` placeholders in `content`.
///
/// Placeholders without a supplied value render as empty strings.
pub fn render(content: &str, variables: &BTreeMap<String, String>) -> Result<String> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    Ok(env.render_str(content, variables)?)
}

/// Placeholder names used in `content`, in order of first appearance.
///
/// Only simple `{{ identifier }}` expressions are recognized.
pub fn extract_variables(content: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = content;

    while let Some(start) = rest.find("{{") {
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            break;
        };
        let name = after_open[..end].trim();
        if is_identifier(name) && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        rest = &after_open[end + 2..];
    }

    names
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
