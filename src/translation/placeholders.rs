/*!
 * Placeholder consistency between a source string and its translation.
 *
 * Mismatches are reported, never rejected: some languages legitimately
 * reorder or drop markup, so the driver only logs and counts them.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Qt arguments, printf specifiers, braced arguments and HTML tags
static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"%L?\d+|%n|%[sdif]|\{[A-Za-z0-9_]*\}|</?[A-Za-z][^<>]*>")
        .expect("Invalid placeholder regex")
});

/// Tokens present on one side only
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlaceholderMismatch {
    /// In the source but not in the translation
    pub missing: Vec<String>,
    /// In the translation but not in the source
    pub unexpected: Vec<String>,
}

impl std::fmt::Display for PlaceholderMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "missing [{}], unexpected [{}]", self.missing.join(", "), self.unexpected.join(", "))
    }
}

/// Placeholder tokens of `text`, sorted
pub fn extract_placeholders(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = PLACEHOLDER_REGEX
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();
    if has_accelerator(text) {
        tokens.push("&".to_string());
    }
    tokens.sort();
    tokens
}

/// Whether `text` has a `&` keyboard accelerator (`&&` is a literal ampersand)
fn has_accelerator(text: &str) -> bool {
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '&' {
            continue;
        }
        match chars.peek() {
            Some('&') => {
                chars.next();
            }
            Some(next) if next.is_alphanumeric() => return true,
            _ => {}
        }
    }
    false
}

/// Compare the placeholders of `source` and `translation`
pub fn check_placeholders(source: &str, translation: &str) -> Option<PlaceholderMismatch> {
    let mut expected = extract_placeholders(source);
    let mut unexpected = Vec::new();

    for token in extract_placeholders(translation) {
        match expected.iter().position(|t| *t == token) {
            Some(pos) => {
                expected.remove(pos);
            }
            None => unexpected.push(token),
        }
    }

    if expected.is_empty() && unexpected.is_empty() {
        None
    } else {
        Some(PlaceholderMismatch { missing: expected, unexpected })
    }
}
