/*!
 * In-memory model of a Qt Linguist `.ts` document.
 *
 * The model keeps the original file text alongside the parsed contexts so
 * that serialization can reproduce every byte the translator did not touch.
 */

use std::fmt;
use std::ops::Range;
use std::path::Path;

use log::debug;

use crate::errors::DocumentError;

/// Translation state of a single message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitStatus {
    /// Needs a translation (`type="unfinished"`, or empty without a type)
    Unfinished,
    /// Has a final translation
    Translated,
    /// Kept for history only (`type="obsolete"` or `type="vanished"`)
    Obsolete,
}

/// A `<location>` entry, carried through untouched
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    /// Source file the string was extracted from
    pub filename: Option<String>,
    /// Line number, as written in the file
    pub line: Option<String>,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.filename, &self.line) {
            (Some(file), Some(line)) => write!(f, "{}:{}", file, line),
            (Some(file), None) => write!(f, "{}", file),
            (None, Some(line)) => write!(f, "line {}", line),
            (None, None) => Ok(()),
        }
    }
}

/// Position of a unit inside a document: (context index, unit index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId {
    /// Index of the context in document order
    pub context: usize,
    /// Index of the message inside its context
    pub unit: usize,
}

impl UnitId {
    pub fn new(context: usize, unit: usize) -> Self {
        Self { context, unit }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.context, self.unit)
    }
}

/// One translatable message
#[derive(Debug, Clone)]
pub struct TranslationUnit {
    pub(crate) source_text: String,
    pub(crate) comment: Option<String>,
    pub(crate) extra_comment: Option<String>,
    pub(crate) locations: Vec<Location>,
    pub(crate) translation: String,
    pub(crate) status: UnitStatus,
    pub(crate) numerus: bool,
    pub(crate) numerus_forms: usize,
    /// Byte range of the original `<translation>` element, if there was one
    pub(crate) translation_span: Option<Range<usize>>,
    /// Byte offset of the `</message>` end tag
    pub(crate) message_end: usize,
    pub(crate) modified: bool,
}

impl TranslationUnit {
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Disambiguation comment; part of the unit's identity
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Developer note (`<extracomment>`)
    pub fn extra_comment(&self) -> Option<&str> {
        self.extra_comment.as_deref()
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn translation(&self) -> &str {
        &self.translation
    }

    pub fn status(&self) -> UnitStatus {
        self.status
    }

    /// Plural message (`numerus="yes"`)
    pub fn is_numerus(&self) -> bool {
        self.numerus
    }

    /// Identity of the unit within its context
    pub fn key(&self) -> (&str, Option<&str>) {
        (&self.source_text, self.comment.as_deref())
    }
}

/// A named group of messages
#[derive(Debug, Clone)]
pub struct Context {
    pub(crate) name: String,
    pub(crate) units: Vec<TranslationUnit>,
}

impl Context {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn units(&self) -> &[TranslationUnit] {
        &self.units
    }
}

/// Root `<TS>` start tag as found in the file
#[derive(Debug, Clone)]
pub(crate) struct RootTag {
    /// Byte range of the whole start tag
    pub(crate) span: Range<usize>,
    /// Attributes in file order, values still escaped
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) self_closing: bool,
}

/// Message counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageStats {
    pub translated: usize,
    pub unfinished: usize,
    pub obsolete: usize,
}

impl MessageStats {
    pub fn total(&self) -> usize {
        self.translated + self.unfinished + self.obsolete
    }
}

/// A parsed `.ts` file
#[derive(Debug, Clone)]
pub struct Document {
    /// File text after the byte order mark, if any
    pub(crate) raw: String,
    /// The file started with a UTF-8 byte order mark
    pub(crate) bom: bool,
    pub(crate) root: RootTag,
    pub(crate) version: String,
    pub(crate) source_language: Option<String>,
    pub(crate) language: Option<String>,
    pub(crate) contexts: Vec<Context>,
}

impl Document {
    /// Read and parse a `.ts` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let document = Self::parse(&content)?;
        debug!(
            "Loaded {:?}: {} contexts, {} messages",
            path,
            document.contexts.len(),
            document.total_units()
        );
        Ok(document)
    }

    /// Parse a `.ts` document held in memory
    pub fn parse(content: &str) -> Result<Self, DocumentError> {
        super::parser::parse_document(content)
    }

    /// Format version (`version` attribute of the root)
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Source language attribute, if present
    pub fn source_language(&self) -> Option<&str> {
        self.source_language.as_deref()
    }

    /// Target language attribute as loaded, if present
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    pub fn total_units(&self) -> usize {
        self.contexts.iter().map(|c| c.units.len()).sum()
    }

    pub fn unit(&self, id: UnitId) -> Option<&TranslationUnit> {
        self.contexts.get(id.context)?.units.get(id.unit)
    }

    /// Name of the context holding `id`
    pub fn context_name(&self, id: UnitId) -> Option<&str> {
        self.contexts.get(id.context).map(|c| c.name.as_str())
    }

    /// All unfinished units, in context order then message order.
    ///
    /// The translation driver maps responses back through this order.
    pub fn units_needing_translation(&self) -> Vec<UnitId> {
        self.contexts
            .iter()
            .enumerate()
            .flat_map(|(ci, context)| {
                context
                    .units
                    .iter()
                    .enumerate()
                    .filter(|(_, unit)| unit.status == UnitStatus::Unfinished)
                    .map(move |(ui, _)| UnitId::new(ci, ui))
            })
            .collect()
    }

    /// Store a translation and mark the unit finished.
    ///
    /// Returns `false` when `id` does not name a unit of this document.
    pub fn apply_translation(&mut self, id: UnitId, text: impl Into<String>) -> bool {
        let Some(unit) = self
            .contexts
            .get_mut(id.context)
            .and_then(|c| c.units.get_mut(id.unit))
        else {
            return false;
        };
        unit.translation = text.into();
        unit.status = UnitStatus::Translated;
        unit.modified = true;
        true
    }

    pub fn stats(&self) -> MessageStats {
        let mut stats = MessageStats::default();
        for unit in self.contexts.iter().flat_map(|c| c.units.iter()) {
            match unit.status {
                UnitStatus::Translated => stats.translated += 1,
                UnitStatus::Unfinished => stats.unfinished += 1,
                UnitStatus::Obsolete => stats.obsolete += 1,
            }
        }
        stats
    }

    /// Serialize with the target-language attribute set to `target_language`
    pub fn to_xml_string(&self, target_language: &str) -> String {
        super::writer::render(self, target_language)
    }

    /// Serialize and write atomically to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P, target_language: &str) -> Result<(), DocumentError> {
        super::writer::write_atomically(path.as_ref(), &self.to_xml_string(target_language))
    }
}
