/*!
 * Prompt templates for user interface string translation.
 *
 * The system prompt carries the role, guidelines and output contract; the
 * user message carries the batch itself as a JSON request so every entry is
 * tied to its index unambiguously.
 */

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::language_utils;
use crate::translation::batch::Batch;

/// A rendered prompt: system instruction plus user message
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// System prompt template for software localization.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// The default system prompt for user interface translation.
    pub const SOFTWARE_TRANSLATOR: &'static str = r#"You are a professional translator with expertise in software localization.
Translate user interface strings from {source_language} to {target_language}.

## Translation Guidelines
- Maintain consistent terminology throughout the interface
- Preserve any technical terms or proper nouns
- Keep the same level of formality as the source text
- Ensure translations fit the UI context (length, formatting)
- Maintain the same tone and style as the original
- Use the context, comment and description of each entry to pick the right meaning

## Placeholders and Markup
Copy these tokens verbatim into the translation, never translate or renumber them:
- Qt arguments such as %1, %2, %L1 and the plural count %n
- printf-style specifiers such as %s and %d
- Braced arguments such as {0} or {name}
- HTML tags such as <b>, </b> or <br/>
- The & keyboard accelerator marker (keep exactly one & when the source has one)

## Plural Entries
Entries marked "plural" contain %n. Return a single translation that keeps %n.

## Output Requirements
- Return ONLY a JSON object that maps every entry index (as a string key) to its translation
- Provide exactly one non-empty translation per index, and no other keys
- Do not include explanations, notes or any text outside the JSON object"#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Create the default software translator template.
    pub fn software_translator() -> Self {
        Self::new(Self::SOFTWARE_TRANSLATOR)
    }

    /// Render the template with the given variables.
    pub fn render(&self, source_language: &str, target_language: &str) -> String {
        self.template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::software_translator()
    }
}

/// Style guidance for target languages with known conventions
pub fn language_style_notes(target_language: &str) -> Option<&'static str> {
    let language = language_utils::parse_locale_code(target_language)
        .map(|l| l.language)
        .unwrap_or_else(|_| target_language.to_lowercase());

    match language.as_str() {
        "de" | "deu" => Some(
            "Use the formal 'Sie' form for user instructions and messages.\n\
             Use standard German computing terminology for technical terms.\n\
             Capitalize nouns as German grammar requires.",
        ),
        "es" | "spa" => Some(
            "Use neutral Spanish understood across regions.\n\
             Use the formal 'usted' form for user instructions and messages.\n\
             Translate technical terms consistently across the interface.",
        ),
        "fr" | "fra" => Some(
            "Use the formal 'vous' form for user instructions and messages.\n\
             Follow French punctuation rules (spaces before : ; ! ?).\n\
             Use standard French computing terminology for technical terms.",
        ),
        "cs" | "ces" => Some(
            "Use the formal 'vy' form for user instructions and messages.\n\
             Use standard Czech computing terminology and proper diacritics.\n\
             Capitalize only the first word of a sentence and proper nouns.",
        ),
        _ => None,
    }
}

/// Human readable name for a locale code, falling back to the code itself
fn display_language(code: &str) -> String {
    language_utils::get_language_name(code)
        .map(|name| format!("{} [{}]", name, code))
        .unwrap_or_else(|_| code.to_string())
}

/// Builder for constructing translation prompts with context.
#[derive(Debug, Clone)]
pub struct TranslationPromptBuilder {
    source_language: String,
    target_language: String,
    application_context: Option<String>,
    glossary: BTreeMap<String, String>,
    entries_to_translate: Vec<EntryToTranslate>,
}

impl TranslationPromptBuilder {
    /// Create a new prompt builder.
    pub fn new(source_language: &str, target_language: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            application_context: None,
            glossary: BTreeMap::new(),
            entries_to_translate: Vec::new(),
        }
    }

    /// Describe the application the strings belong to.
    pub fn with_application_context(mut self, context: &str) -> Self {
        let context = context.trim();
        self.application_context = (!context.is_empty()).then(|| context.to_string());
        self
    }

    /// Set preferred translations for terms.
    pub fn with_glossary(mut self, glossary: &BTreeMap<String, String>) -> Self {
        self.glossary = glossary.clone();
        self
    }

    /// Set the entries to translate from a batch; entry `i` is item `i`.
    pub fn with_batch(mut self, batch: &Batch) -> Self {
        self.entries_to_translate = batch
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| EntryToTranslate {
                index,
                source: item.source_text.clone(),
                context: item.context_name.clone(),
                comment: item.comment.clone(),
                description: item.extra_comment.clone(),
                location: item.location.as_ref().map(|l| l.to_string()).filter(|l| !l.is_empty()),
                plural: item.numerus,
            })
            .collect();
        self
    }

    /// Build the system prompt.
    pub fn build_system_prompt(&self) -> String {
        let mut prompt = PromptTemplate::software_translator().render(
            &display_language(&self.source_language),
            &display_language(&self.target_language),
        );

        if let Some(context) = &self.application_context {
            prompt.push_str("\n\n## Application Context\n");
            prompt.push_str(context);
        }

        if let Some(notes) = language_style_notes(&self.target_language) {
            prompt.push_str("\n\n## Language Style\n");
            prompt.push_str(notes);
        }

        if !self.glossary.is_empty() {
            prompt.push_str("\n\n## Glossary\nUse these translations for the following terms:\n");
            for (term, translation) in &self.glossary {
                prompt.push_str(&format!("- \"{}\" -> \"{}\"\n", term, translation));
            }
        }

        prompt
    }

    /// Build the user prompt: a heading line followed by the JSON request.
    pub fn build_user_prompt(&self) -> String {
        let request = TranslationRequest {
            task: "translate_ui_strings".to_string(),
            source_language: self.source_language.clone(),
            target_language: self.target_language.clone(),
            entries_to_translate: self.entries_to_translate.clone(),
        };

        let body = serde_json::to_string_pretty(&request).unwrap_or_else(|_| "{}".to_string());
        format!(
            "Translate the {} entries below. Reply with the JSON object of translations keyed by index, nothing else.\n\n{}",
            self.entries_to_translate.len(),
            body
        )
    }

    /// Build both system and user prompts.
    pub fn build(&self) -> Prompt {
        Prompt {
            system: self.build_system_prompt(),
            user: self.build_user_prompt(),
        }
    }
}

/// Prompt for `batch` without application context or glossary
pub fn build_prompt(batch: &Batch, source_language: &str, target_language: &str) -> Prompt {
    TranslationPromptBuilder::new(source_language, target_language)
        .with_batch(batch)
        .build()
}

/// Translation request structure for JSON communication with the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    /// Task identifier
    pub task: String,

    /// Source language
    pub source_language: String,

    /// Target language
    pub target_language: String,

    /// Entries to translate
    pub entries_to_translate: Vec<EntryToTranslate>,
}

impl TranslationRequest {
    /// Recover the request embedded in a user message
    pub fn from_user_prompt(user: &str) -> Option<Self> {
        let start = user.find('{')?;
        let end = user.rfind('}')?;
        serde_json::from_str(user.get(start..=end)?).ok()
    }
}

/// An entry to translate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryToTranslate {
    /// Index the translation must be returned under
    pub index: usize,

    /// Text to translate
    pub source: String,

    /// UI component (context name)
    pub context: String,

    /// Disambiguation comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// Developer description (extra comment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Source file and line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Plural entry containing %n
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub plural: bool,
}
