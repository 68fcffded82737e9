/*!
 * Serialization of a [`Document`] back to the `.ts` format.
 *
 * The output is the original file text with a small set of splices: the root
 * start tag when the language changes, and the `<translation>` element of every
 * unit translated during this run. Everything else is copied byte for byte.
 */

use std::io::Write;
use std::ops::Range;
use std::path::Path;

use quick_xml::escape::escape;
use tempfile::NamedTempFile;

use crate::errors::DocumentError;
use super::model::{Document, RootTag, TranslationUnit};

/// A replacement of `range` in the original text
struct Splice {
    range: Range<usize>,
    text: String,
}

pub(crate) fn render(document: &Document, target_language: &str) -> String {
    let mut splices = Vec::new();

    if document.language.as_deref() != Some(target_language) {
        splices.push(Splice {
            range: document.root.span.clone(),
            text: render_root_tag(&document.root, target_language),
        });
    }

    for unit in document.contexts.iter().flat_map(|c| c.units.iter()) {
        if !unit.modified {
            continue;
        }
        let range = match &unit.translation_span {
            Some(span) => span.clone(),
            None => unit.message_end..unit.message_end,
        };
        splices.push(Splice { range, text: render_translation(unit) });
    }

    splices.sort_by_key(|s| s.range.start);

    let raw = document.raw.as_str();
    let mut output = String::with_capacity(raw.len() + 3 + splices.iter().map(|s| s.text.len()).sum::<usize>());
    if document.bom {
        output.push('\u{feff}');
    }
    let mut cursor = 0;
    for splice in splices {
        output.push_str(&raw[cursor..splice.range.start]);
        output.push_str(&splice.text);
        cursor = splice.range.end;
    }
    output.push_str(&raw[cursor..]);
    output
}

/// Rebuild `<TS ...>` with `language` replaced, keeping attribute order
fn render_root_tag(root: &RootTag, target_language: &str) -> String {
    let language = escape(target_language);
    let mut tag = String::from("<TS");
    let mut replaced = false;

    for (key, value) in &root.attributes {
        if key == "language" {
            tag.push_str(&format!(" language=\"{}\"", language));
            replaced = true;
        } else {
            tag.push_str(&format!(" {}=\"{}\"", key, value.replace('"', "&quot;")));
        }
    }
    if !replaced {
        tag.push_str(&format!(" language=\"{}\"", language));
    }

    tag.push_str(if root.self_closing { "/>" } else { ">" });
    tag
}

/// Escape `text` for element content.
///
/// Control characters XML 1.0 cannot carry become `<byte value="xNN"/>`,
/// the form the reader decodes.
fn escape_text(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut plain_start = 0;
    for (i, ch) in text.char_indices() {
        if ch < '\u{20}' && !matches!(ch, '\t' | '\n' | '\r') {
            output.push_str(&escape(&text[plain_start..i]));
            output.push_str(&format!("<byte value=\"x{:x}\"/>", ch as u32));
            plain_start = i + ch.len_utf8();
        }
    }
    output.push_str(&escape(&text[plain_start..]));
    output
}

fn render_translation(unit: &TranslationUnit) -> String {
    let text = escape_text(unit.translation.as_str());
    if unit.numerus {
        let forms = unit.numerus_forms.max(1);
        let mut element = String::from("<translation>");
        for _ in 0..forms {
            element.push_str(&format!("<numerusform>{}</numerusform>", text));
        }
        element.push_str("</translation>");
        element
    } else {
        format!("<translation>{}</translation>", text)
    }
}

/// Write `content` to `path` through a temporary file in the same directory
pub(crate) fn write_atomically(path: &Path, content: &str) -> Result<(), DocumentError> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(directory)?;

    let mut temp = NamedTempFile::new_in(directory)?;
    temp.write_all(content.as_bytes())?;
    temp.flush()?;
    temp.persist(path).map_err(|e| DocumentError::Io(e.error))?;
    Ok(())
}
