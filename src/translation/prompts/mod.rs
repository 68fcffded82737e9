/*!
 * Prompt engineering for user interface translation.
 *
 * This module provides:
 * - The system prompt template with guidelines and output contract
 * - Dynamic prompt construction from a batch and configuration
 * - Language-specific style guidance
 */

pub mod templates;

// Re-export main types
pub use templates::{
    EntryToTranslate, Prompt, PromptTemplate, TranslationPromptBuilder, TranslationRequest,
    build_prompt, language_style_notes,
};
