/*!
 * Event-driven reader for the Linguist `.ts` schema.
 *
 * Besides building the model, the reader records the byte spans of the root
 * start tag and of every `<translation>` element so the writer can splice new
 * content into the untouched original text.
 */

// Linguist .ts format reference: https://doc.qt.io/qt-6/linguist-ts-file-format.html

use std::ops::Range;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::errors::DocumentError;
use super::model::{Context, Document, Location, RootTag, TranslationUnit, UnitStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    ContextName,
    Source,
    Comment,
    ExtraComment,
    Translation,
    NumerusForm,
}

/// Text being collected for the element at `depth`
struct Capture {
    field: Field,
    depth: usize,
    text: String,
}

#[derive(Default)]
struct MessageBuilder {
    source: Option<String>,
    comment: Option<String>,
    extra_comment: Option<String>,
    locations: Vec<Location>,
    numerus: bool,
    has_translation: bool,
    translation_type: Option<String>,
    translation_start: usize,
    translation_span: Option<Range<usize>>,
    translation_text: String,
    numerus_forms: usize,
    first_form: Option<String>,
}

#[derive(Default)]
struct ContextBuilder {
    name: Option<String>,
    units: Vec<TranslationUnit>,
}

struct TsParser<'a> {
    content: &'a str,
    stack: Vec<String>,
    root: Option<RootTag>,
    version: Option<String>,
    source_language: Option<String>,
    language: Option<String>,
    contexts: Vec<Context>,
    context: Option<ContextBuilder>,
    message: Option<MessageBuilder>,
    capture: Option<Capture>,
}

/// UTF-8 byte order mark some editors put in front of `.ts` files
const BOM: char = '\u{feff}';

pub(crate) fn parse_document(content: &str) -> Result<Document, DocumentError> {
    // Spans are relative to the text after the mark; the writer puts it back
    let (bom, content) = match content.strip_prefix(BOM) {
        Some(rest) => (true, rest),
        None => (false, content),
    };
    let mut reader = Reader::from_str(content);
    let mut parser = TsParser::new(content);

    loop {
        let event = reader.read_event().map_err(|e| DocumentError::Parse {
            position: reader.buffer_position() as usize,
            message: e.to_string(),
        })?;
        let end = reader.buffer_position() as usize;

        match event {
            Event::Start(e) => {
                let span = parser.tag_start(end)..end;
                parser.open(&e, span, false)?;
            }
            Event::Empty(e) => {
                let span = parser.tag_start(end)..end;
                parser.open(&e, span.clone(), true)?;
                parser.close(span)?;
            }
            Event::End(_) => {
                let span = parser.tag_start(end)..end;
                parser.close(span)?;
            }
            Event::Text(e) => {
                if parser.capturing_here() {
                    let text = decode_text(&e, end)?;
                    parser.push_text(&text);
                }
            }
            Event::CData(e) => {
                if parser.capturing_here() {
                    let text = utf8(&e, end)?.to_string();
                    parser.push_text(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    parser.finish(bom)
}

impl<'a> TsParser<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            content,
            stack: Vec::new(),
            root: None,
            version: None,
            source_language: None,
            language: None,
            contexts: Vec::new(),
            context: None,
            message: None,
            capture: None,
        }
    }

    /// Offset of the `<` opening the tag that ends at `end`.
    ///
    /// `<` cannot occur inside attribute values, so the last one before the
    /// tag end is the tag start.
    fn tag_start(&self, end: usize) -> usize {
        self.content[..end].rfind('<').unwrap_or(0)
    }

    fn capturing_here(&self) -> bool {
        self.capture
            .as_ref()
            .is_some_and(|c| c.depth == self.stack.len())
    }

    fn push_text(&mut self, text: &str) {
        if let Some(capture) = self.capture.as_mut() {
            capture.text.push_str(text);
        }
    }

    fn start_capture(&mut self, field: Field) {
        self.capture = Some(Capture { field, depth: self.stack.len(), text: String::new() });
    }

    fn open(&mut self, e: &BytesStart<'_>, span: Range<usize>, self_closing: bool) -> Result<(), DocumentError> {
        let name = utf8(e.name().as_ref(), span.start)?.to_string();
        let parent = self.stack.last().cloned();

        match (parent.as_deref(), name.as_str()) {
            (None, "TS") => {
                if self.root.is_some() {
                    return Err(DocumentError::Schema("more than one <TS> root element".to_string()));
                }
                let attributes = raw_attributes(e, span.start)?;
                self.version = find_attribute(&attributes, "version", span.start)?;
                self.language = find_attribute(&attributes, "language", span.start)?;
                self.source_language = find_attribute(&attributes, "sourcelanguage", span.start)?;
                if self.version.is_none() {
                    return Err(DocumentError::Schema("<TS> element has no version attribute".to_string()));
                }
                self.root = Some(RootTag { span, attributes, self_closing });
            }
            (None, other) => {
                return Err(DocumentError::Schema(format!(
                    "root element is <{}>, expected <TS>",
                    other
                )));
            }
            (Some("TS"), "context") => {
                self.context = Some(ContextBuilder::default());
            }
            (Some("TS"), "message") => {
                return Err(DocumentError::Schema("<message> outside of a <context>".to_string()));
            }
            (Some("context"), "name") => {
                self.stack.push(name);
                self.start_capture(Field::ContextName);
                return Ok(());
            }
            (Some("context"), "message") => {
                let attributes = raw_attributes(e, span.start)?;
                let numerus = find_attribute(&attributes, "numerus", span.start)?;
                self.message = Some(MessageBuilder {
                    numerus: numerus.as_deref() == Some("yes"),
                    ..Default::default()
                });
            }
            (Some("message"), field_name) => {
                let field = match field_name {
                    "source" => Some(Field::Source),
                    "comment" => Some(Field::Comment),
                    "extracomment" => Some(Field::ExtraComment),
                    "translation" => {
                        let attributes = raw_attributes(e, span.start)?;
                        let translation_type = find_attribute(&attributes, "type", span.start)?;
                        if let Some(message) = self.message.as_mut() {
                            message.has_translation = true;
                            message.translation_type = translation_type;
                            message.translation_start = span.start;
                        }
                        Some(Field::Translation)
                    }
                    "location" => {
                        let attributes = raw_attributes(e, span.start)?;
                        let location = Location {
                            filename: find_attribute(&attributes, "filename", span.start)?,
                            line: find_attribute(&attributes, "line", span.start)?,
                        };
                        if let Some(message) = self.message.as_mut() {
                            message.locations.push(location);
                        }
                        None
                    }
                    _ => None,
                };
                self.stack.push(name);
                if let Some(field) = field {
                    self.start_capture(field);
                }
                return Ok(());
            }
            (Some("translation"), "numerusform") => {
                let first = match self.message.as_mut() {
                    Some(message) => {
                        message.numerus_forms += 1;
                        message.numerus_forms == 1
                    }
                    None => false,
                };
                self.stack.push(name);
                if first {
                    self.start_capture(Field::NumerusForm);
                }
                return Ok(());
            }
            (Some("translation") | Some("numerusform"), "lengthvariant") if self.capturing_here() => {
                // The first (longest) variant stands for the translation
                let field = self.capture.as_ref().map(|c| c.field);
                self.stack.push(name);
                if let Some(field) = field {
                    self.start_capture(field);
                }
                return Ok(());
            }
            (Some(_), "byte") if self.capturing_here() => {
                // Control characters are written as <byte value="x1b"/>
                let attributes = raw_attributes(e, span.start)?;
                if let Some(value) = find_attribute(&attributes, "value", span.start)? {
                    let code = match value.strip_prefix('x') {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => value.parse::<u32>().ok(),
                    };
                    match code.and_then(char::from_u32) {
                        Some(ch) => self.push_text(&ch.to_string()),
                        None => {
                            return Err(DocumentError::Schema(format!("invalid <byte> value {:?}", value)));
                        }
                    }
                }
            }
            _ => {}
        }

        self.stack.push(name);
        Ok(())
    }

    fn close(&mut self, span: Range<usize>) -> Result<(), DocumentError> {
        let depth = self.stack.len();
        let Some(name) = self.stack.pop() else {
            return Err(DocumentError::Parse {
                position: span.start,
                message: "unexpected end tag".to_string(),
            });
        };
        let parent = self.stack.last().cloned();

        if self.capture.as_ref().is_some_and(|c| c.depth == depth) {
            if let Some(capture) = self.capture.take() {
                self.store_capture(capture);
            }
        }

        match (parent.as_deref(), name.as_str()) {
            (Some("message"), "translation") => {
                if let Some(message) = self.message.as_mut() {
                    message.translation_span = Some(message.translation_start..span.end);
                }
            }
            (Some("context"), "message") => {
                let message = self.message.take().unwrap_or_default();
                let unit = build_unit(message, span.start, self.context_label())?;
                if let Some(context) = self.context.as_mut() {
                    context.units.push(unit);
                }
            }
            (Some("TS"), "context") => {
                let context = self.context.take().unwrap_or_default();
                let name = context.name.ok_or_else(|| {
                    DocumentError::Schema(format!(
                        "context #{} has no <name> element",
                        self.contexts.len() + 1
                    ))
                })?;
                self.contexts.push(Context { name, units: context.units });
            }
            _ => {}
        }

        Ok(())
    }

    fn store_capture(&mut self, capture: Capture) {
        if capture.field == Field::ContextName {
            if let Some(context) = self.context.as_mut() {
                context.name = Some(capture.text);
            }
            return;
        }
        let Some(message) = self.message.as_mut() else {
            return;
        };
        match capture.field {
            Field::Source => message.source = Some(capture.text),
            Field::Comment => message.comment = Some(capture.text),
            Field::ExtraComment => message.extra_comment = Some(capture.text),
            Field::Translation => message.translation_text = capture.text,
            Field::NumerusForm => message.first_form = Some(capture.text),
            Field::ContextName => {}
        }
    }

    fn context_label(&self) -> String {
        self.context
            .as_ref()
            .and_then(|c| c.name.clone())
            .unwrap_or_else(|| format!("#{}", self.contexts.len() + 1))
    }

    fn finish(self, bom: bool) -> Result<Document, DocumentError> {
        if let Some(open) = self.stack.last() {
            return Err(DocumentError::Parse {
                position: self.content.len(),
                message: format!("unexpected end of document, <{}> is not closed", open),
            });
        }
        let root = self
            .root
            .ok_or_else(|| DocumentError::Schema("missing <TS> root element".to_string()))?;

        Ok(Document {
            raw: self.content.to_string(),
            bom,
            root,
            version: self.version.unwrap_or_default(),
            source_language: self.source_language,
            language: self.language,
            contexts: self.contexts,
        })
    }
}

fn build_unit(message: MessageBuilder, message_end: usize, context: String) -> Result<TranslationUnit, DocumentError> {
    let source_text = message.source.ok_or_else(|| {
        DocumentError::Schema(format!("message without <source> in context '{}'", context))
    })?;

    let translation = if message.numerus {
        message.first_form.unwrap_or_default()
    } else {
        message.translation_text
    };

    let status = if !message.has_translation {
        UnitStatus::Unfinished
    } else {
        match message.translation_type.as_deref() {
            Some("unfinished") => UnitStatus::Unfinished,
            Some("obsolete") | Some("vanished") => UnitStatus::Obsolete,
            Some(other) => {
                return Err(DocumentError::Schema(format!(
                    "unknown translation type {:?} for '{}'",
                    other, source_text
                )));
            }
            None if translation.is_empty() => UnitStatus::Unfinished,
            None => UnitStatus::Translated,
        }
    };

    Ok(TranslationUnit {
        source_text,
        comment: message.comment,
        extra_comment: message.extra_comment,
        locations: message.locations,
        translation,
        status,
        numerus: message.numerus,
        numerus_forms: message.numerus_forms,
        translation_span: message.translation_span,
        message_end,
        modified: false,
    })
}

fn utf8(bytes: &[u8], position: usize) -> Result<&str, DocumentError> {
    std::str::from_utf8(bytes).map_err(|e| DocumentError::Parse { position, message: e.to_string() })
}

fn decode_text(bytes: &[u8], position: usize) -> Result<String, DocumentError> {
    let raw = utf8(bytes, position)?;
    unescape(raw)
        .map(|text| text.into_owned())
        .map_err(|e| DocumentError::Parse { position, message: e.to_string() })
}

/// Attributes in file order with their values still escaped
fn raw_attributes(e: &BytesStart<'_>, position: usize) -> Result<Vec<(String, String)>, DocumentError> {
    e.attributes()
        .map(|attr| {
            let attr = attr.map_err(|err| DocumentError::Parse { position, message: err.to_string() })?;
            let key = utf8(attr.key.as_ref(), position)?.to_string();
            let value = utf8(&attr.value, position)?.to_string();
            Ok((key, value))
        })
        .collect()
}

fn find_attribute(attributes: &[(String, String)], key: &str, position: usize) -> Result<Option<String>, DocumentError> {
    match attributes.iter().find(|(k, _)| k == key) {
        Some((_, raw)) => Ok(Some(decode_text(raw.as_bytes(), position)?)),
        None => Ok(None),
    }
}
