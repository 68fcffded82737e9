/*!
 * Batching of translation units.
 *
 * Units that need translation are gathered in document order and split into
 * contiguous batches; each batch becomes one provider request.
 */

use log::debug;

use crate::app_config::BatchConfig;
use crate::linguist::{Document, Location, UnitId};

/// One unit as it is sent to the provider
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    /// Unit this item translates
    pub id: UnitId,
    pub source_text: String,
    /// Name of the context (UI component) the unit belongs to
    pub context_name: String,
    pub comment: Option<String>,
    pub extra_comment: Option<String>,
    /// First `<location>` of the unit
    pub location: Option<Location>,
    pub numerus: bool,
}

impl BatchItem {
    /// Snapshot the unit `id` of `document`
    pub fn from_unit(document: &Document, id: UnitId) -> Option<Self> {
        let unit = document.unit(id)?;
        Some(Self {
            id,
            source_text: unit.source_text().to_string(),
            context_name: document.context_name(id).unwrap_or_default().to_string(),
            comment: unit.comment().map(str::to_string),
            extra_comment: unit.extra_comment().map(str::to_string),
            location: unit.locations().first().cloned(),
            numerus: unit.is_numerus(),
        })
    }
}

/// A contiguous run of units translated in one request.
///
/// Item `i` of the batch is sent under index `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// 1-based position of the batch in the run
    pub number: usize,
    pub items: Vec<BatchItem>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Items for every unit that needs translation, in document order.
///
/// Units with an empty or blank source have nothing to translate and are left
/// as they are.
pub fn collect_items(document: &Document) -> Vec<BatchItem> {
    document
        .units_needing_translation()
        .into_iter()
        .filter_map(|id| BatchItem::from_unit(document, id))
        .filter(|item| {
            let blank = item.source_text.trim().is_empty();
            if blank {
                debug!("Skipping unit {} with an empty source", item.id);
            }
            !blank
        })
        .collect()
}

/// Split `items` into batches of at most `batch_size`.
///
/// `None` puts everything in a single batch. No items yields no batches.
pub fn make_batches(items: Vec<BatchItem>, batch_size: Option<usize>) -> Vec<Batch> {
    if items.is_empty() {
        return Vec::new();
    }

    let size = batch_size.unwrap_or(items.len()).max(1);
    items
        .chunks(size)
        .enumerate()
        .map(|(i, chunk)| Batch {
            number: i + 1,
            items: chunk.to_vec(),
        })
        .collect()
}

/// Batches for `document` according to the batching configuration
pub fn batches_for(document: &Document, config: &BatchConfig) -> Vec<Batch> {
    make_batches(collect_items(document), config.effective_batch_size())
}
