/*!
 * Parsing of provider completions into indexed translations.
 *
 * A completion must contain one JSON object mapping every batch index to a
 * non-empty string. Markdown fences or prose around the object are tolerated:
 * the text from the first `{` to the last `}` is parsed. Keys are read in
 * order with their duplicates, so a repeated index is reported instead of
 * silently overwriting the first one.
 */

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};

use crate::errors::ResponseFormatError;

/// Object entries in document order, duplicates kept
struct RawEntries(Vec<(String, serde_json::Value)>);

impl<'de> Deserialize<'de> for RawEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RawEntries;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a JSON object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, serde_json::Value>()? {
                    entries.push((key, value));
                }
                Ok(RawEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Slice from the first `{` to the last `}`
fn json_object_slice(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    response.get(start..=end)
}

fn preview(response: &str) -> String {
    let trimmed = response.trim();
    let mut preview: String = trimmed.chars().take(80).collect();
    if trimmed.chars().count() > 80 {
        preview.push_str("...");
    }
    preview
}

/// Parse `response` into exactly `expected` translations keyed `0..expected`
pub fn parse_response(
    response: &str,
    expected: usize,
) -> Result<BTreeMap<usize, String>, ResponseFormatError> {
    let slice = json_object_slice(response)
        .ok_or_else(|| ResponseFormatError::NotAnObject(preview(response)))?;
    let RawEntries(entries) = serde_json::from_str(slice)
        .map_err(|e| ResponseFormatError::NotAnObject(format!("{} ({})", e, preview(response))))?;

    let mut translations = BTreeMap::new();
    let mut empty = Vec::new();

    for (key, value) in entries {
        let index: usize = key
            .trim()
            .parse()
            .map_err(|_| ResponseFormatError::InvalidIndex(key.clone()))?;

        let text = match value {
            serde_json::Value::String(text) => text,
            _ => String::new(),
        };
        if text.trim().is_empty() {
            empty.push(index);
        }

        if translations.insert(index, text).is_some() {
            return Err(ResponseFormatError::DuplicateIndex(index));
        }
    }

    if translations.len() != expected {
        return Err(ResponseFormatError::CountMismatch {
            expected,
            actual: translations.len(),
        });
    }

    if let Some(index) = translations.keys().find(|i| **i >= expected) {
        return Err(ResponseFormatError::UnexpectedIndex(*index));
    }

    if let Some(missing) = (0..expected).find(|i| !translations.contains_key(i)) {
        return Err(ResponseFormatError::MissingIndex(missing));
    }

    if let Some(index) = empty.into_iter().min() {
        return Err(ResponseFormatError::EmptyTranslation(index));
    }

    Ok(translations)
}
