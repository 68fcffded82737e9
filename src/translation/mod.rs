/*!
 * Translation of Linguist documents using AI providers.
 *
 * This module contains the translation driver. It is split into several
 * submodules:
 *
 * - `core`: The translation service, retry policy and run report
 * - `batch`: Splitting units into request-sized batches
 * - `prompts`: Prompt templates and builders for translation
 * - `response`: Aligning completions with batch indices
 * - `placeholders`: Placeholder consistency checks
 */

// Re-export main types for easier usage
pub use self::batch::{Batch, BatchItem, make_batches};
pub use self::core::{
    BatchFailure, IncompleteTranslation, TranslationOptions, TranslationReport, TranslationService,
};
pub use self::prompts::{Prompt, TranslationPromptBuilder, build_prompt};
pub use self::response::parse_response;

// Submodules
pub mod batch;
pub mod core;
pub mod placeholders;
pub mod prompts;
pub mod response;
