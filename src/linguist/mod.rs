/*!
 * Qt Linguist translation source (`.ts`) documents.
 *
 * - `model`: contexts, messages and their translation state
 * - `parser`: reading the XML schema
 * - `writer`: writing the document back with only translations changed
 */

pub use self::model::{
    Context, Document, Location, MessageStats, TranslationUnit, UnitId, UnitStatus,
};

pub mod model;
mod parser;
mod writer;
