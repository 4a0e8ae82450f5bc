//! String utility functions shared by the bootstrap pipeline.

use once_cell::sync::Lazy;
use regex::Regex;

static CAMEL_LOWER_UPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());
static DISALLOWED_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());
static FIRST_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]{0,3}#{1,6}[ \t]+(.+?)[ \t]*#*[ \t]*$").unwrap());

const MAX_SLUG_LENGTH: usize = 64;

/// Turn a display name into a stable agent id.
///
/// Splits camelCase, lowercases, collapses every run of non-alphanumeric
/// characters into a single `-` and trims leading/trailing separators.
/// Returns an empty string when nothing alphanumeric survives.
pub fn slugify(name: &str) -> String {
    let ascii_name: String = name.chars().filter(|c| c.is_ascii()).collect();
    let split = CAMEL_LOWER_UPPER.replace_all(&ascii_name, "${1}-${2}");
    let lowered = split.to_lowercase();
    let replaced = DISALLOWED_CHARS.replace_all(&lowered, "-");
    let trimmed = replaced.trim_matches('-');

    if trimmed.len() > MAX_SLUG_LENGTH {
        trimmed[..MAX_SLUG_LENGTH].trim_end_matches('-').to_string()
    } else {
        trimmed.to_string()
    }
}

/// Text of the first markdown heading (any level), if there is one.
pub fn first_heading(markdown: &str) -> Option<String> {
    FIRST_HEADING
        .captures(markdown)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// First paragraph of a markdown body that is not a heading, a fence or a
/// list item. Lines of the paragraph are joined with single spaces.
pub fn first_paragraph(markdown: &str) -> Option<String> {
    let mut lines: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in markdown.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            in_fence = !in_fence;
            if !lines.is_empty() {
                break;
            }
            continue;
        }
        if in_fence {
            continue;
        }
        if trimmed.is_empty() {
            if !lines.is_empty() {
                break;
            }
            continue;
        }
        if trimmed.starts_with('#')
            || trimmed.starts_with("- ")
            || trimmed.starts_with("* ")
            || trimmed.starts_with('>')
        {
            if !lines.is_empty() {
                break;
            }
            continue;
        }
        lines.push(trimmed);
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join(" "))
    }
}
