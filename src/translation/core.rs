/*!
 * Core translation functionality.
 *
 * `TranslationService` drives a document through the provider: one request
 * per batch, retries with exponential backoff for transient failures, and
 * results applied to the document in batch order.
 */

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use rand::Rng;
use tokio::sync::Mutex as AsyncMutex;

use crate::app_config::{BatchConfig, Config};
use crate::errors::TranslationError;
use crate::linguist::{Document, UnitId, UnitStatus};
use crate::providers::Provider;

use super::batch::{self, Batch};
use super::placeholders::check_placeholders;
use super::prompts::{Prompt, TranslationPromptBuilder};
use super::response::parse_response;

/// Options for a translation run
#[derive(Debug, Clone)]
pub struct TranslationOptions {
    pub source_language: String,
    pub target_language: String,
    /// Retries after the first attempt
    pub retry_count: u32,
    /// Base backoff, doubled on each retry
    pub retry_backoff_ms: u64,
    /// Minimum spacing between provider requests
    pub rate_limit_delay_ms: u64,
    /// Maximum batch requests in flight
    pub concurrent_requests: usize,
    pub application_context: String,
    pub glossary: BTreeMap<String, String>,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self::from_config(&Config::default(), &Config::default().target_language)
    }
}

impl TranslationOptions {
    /// Options for translating into `target_language` under `config`
    pub fn from_config(config: &Config, target_language: &str) -> Self {
        let common = &config.translation.common;
        Self {
            source_language: config.source_language.clone(),
            target_language: target_language.to_string(),
            retry_count: common.retry_count,
            retry_backoff_ms: common.retry_backoff_ms,
            rate_limit_delay_ms: common.rate_limit_delay_ms,
            concurrent_requests: common.concurrent_requests.max(1),
            application_context: common.application_context.clone(),
            glossary: config
                .translation
                .glossary_for(target_language)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// A batch that ran out of attempts
#[derive(Debug, Clone)]
pub struct BatchFailure {
    /// 1-based batch number
    pub batch: usize,
    pub attempts: u32,
    /// Units the batch would have translated
    pub units: Vec<UnitId>,
    /// Last error
    pub message: String,
}

/// Requested units left without a translation after a run
#[derive(Debug, Clone, PartialEq)]
pub struct IncompleteTranslation {
    pub missing: Vec<UnitId>,
}

impl fmt::Display for IncompleteTranslation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} unit(s) left untranslated", self.missing.len())
    }
}

/// Outcome of translating one document
#[derive(Debug, Clone, Default)]
pub struct TranslationReport {
    /// Units in the document
    pub total_units: usize,
    /// Units that needed translation
    pub requested: usize,
    /// Units translated during the run
    pub translated: usize,
    pub batches: usize,
    pub failed_batches: Vec<BatchFailure>,
    /// Completeness warning, present when any requested unit is still empty
    pub incomplete: Option<IncompleteTranslation>,
    /// Translations whose placeholders differ from the source
    pub placeholder_warnings: usize,
    pub elapsed: Duration,
}

impl TranslationReport {
    /// No failed batch and no gap
    pub fn is_complete(&self) -> bool {
        self.failed_batches.is_empty() && self.incomplete.is_none()
    }
}

/// Translation service driving a provider over a document
#[derive(Debug, Clone)]
pub struct TranslationService {
    provider: Arc<dyn Provider>,

    /// Options for this run
    pub options: TranslationOptions,

    /// Time of the last provider request, for request spacing
    last_request: Arc<AsyncMutex<Option<Instant>>>,
}

impl TranslationService {
    /// Create a new translation service
    pub fn new(provider: Arc<dyn Provider>, options: TranslationOptions) -> Self {
        Self {
            provider,
            options,
            last_request: Arc::new(AsyncMutex::new(None)),
        }
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Build the prompt for a batch
    pub fn build_prompt(&self, batch: &Batch) -> Prompt {
        TranslationPromptBuilder::new(&self.options.source_language, &self.options.target_language)
            .with_application_context(&self.options.application_context)
            .with_glossary(&self.options.glossary)
            .with_batch(batch)
            .build()
    }

    /// Wait until `rate_limit_delay_ms` has passed since the previous request
    async fn wait_for_slot(&self) {
        if self.options.rate_limit_delay_ms == 0 {
            return;
        }
        let spacing = Duration::from_millis(self.options.rate_limit_delay_ms);
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < spacing {
                tokio::time::sleep(spacing - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Backoff before retry number `attempt` (1-based), with up to 25% jitter
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.options.retry_backoff_ms;
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = base.saturating_mul(1u64 << exponent);
        let jitter = if base == 0 { 0 } else { rand::rng().random_range(0..=base / 4) };
        Duration::from_millis(delay.saturating_add(jitter))
    }

    /// One request for `batch`: send the prompt and align the completion.
    ///
    /// The returned map holds one translation per batch index.
    pub async fn translate_batch(&self, batch: &Batch) -> Result<BTreeMap<usize, String>, TranslationError> {
        let prompt = self.build_prompt(batch);
        self.wait_for_slot().await;

        debug!(
            "Sending batch {} ({} units) to {}",
            batch.number,
            batch.len(),
            self.provider.name()
        );
        let completion = self.provider.complete(&prompt).await?;
        debug!("Batch {} response: {}", batch.number, completion);

        Ok(parse_response(&completion, batch.len())?)
    }

    /// [`translate_batch`](Self::translate_batch) with the retry policy applied.
    ///
    /// Fails with [`TranslationError::Failed`] once attempts run out or the
    /// error is not worth retrying.
    pub async fn translate_batch_with_retry(&self, batch: &Batch) -> Result<BTreeMap<usize, String>, TranslationError> {
        let max_attempts = self.options.retry_count.saturating_add(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.translate_batch(batch).await {
                Ok(translations) => return Ok(translations),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        "Batch {} attempt {}/{} failed: {}. Retrying in {}ms",
                        batch.number,
                        attempt,
                        max_attempts,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return Err(TranslationError::Failed {
                        batch: batch.number,
                        attempts: attempt,
                        source: Box::new(e),
                    });
                }
            }
        }
    }

    /// Translate every unit of `document` that needs it
    pub async fn translate_document(
        &self,
        document: &mut Document,
        batch_config: &BatchConfig,
        progress_callback: impl Fn(usize, usize),
    ) -> TranslationReport {
        let batches = batch::batches_for(document, batch_config);
        self.translate_batches(document, batches, progress_callback).await
    }

    /// Run `batches` against `document`, applying results in batch order
    pub async fn translate_batches(
        &self,
        document: &mut Document,
        batches: Vec<Batch>,
        progress_callback: impl Fn(usize, usize),
    ) -> TranslationReport {
        let start_time = Instant::now();
        let requested: Vec<UnitId> = batches.iter().flat_map(|b| b.items.iter().map(|i| i.id)).collect();
        let total_batches = batches.len();

        let mut report = TranslationReport {
            total_units: document.total_units(),
            requested: requested.len(),
            batches: total_batches,
            ..Default::default()
        };

        if total_batches == 0 {
            info!("Nothing to translate");
            return report;
        }

        info!(
            "Translating {} unit(s) in {} batch(es) to {} with {}",
            requested.len(),
            total_batches,
            self.options.target_language,
            self.provider.name()
        );
        progress_callback(0, total_batches);

        let concurrency = self.options.concurrent_requests.max(1);
        let mut results = stream::iter(batches)
            .map(|batch| async move {
                let result = self.translate_batch_with_retry(&batch).await;
                (batch, result)
            })
            .buffered(concurrency);

        let mut completed = 0;
        while let Some((batch, result)) = results.next().await {
            match result {
                Ok(translations) => self.apply_batch(document, &batch, translations, &mut report),
                Err(e) => {
                    error!("{}", e);
                    let attempts = match &e {
                        TranslationError::Failed { attempts, .. } => *attempts,
                        _ => 1,
                    };
                    report.failed_batches.push(BatchFailure {
                        batch: batch.number,
                        attempts,
                        units: batch.items.iter().map(|i| i.id).collect(),
                        message: e.to_string(),
                    });
                }
            }
            completed += 1;
            progress_callback(completed, total_batches);
        }

        let missing: Vec<UnitId> = requested
            .into_iter()
            .filter(|id| {
                document
                    .unit(*id)
                    .map(|u| u.status() != UnitStatus::Translated || u.translation().trim().is_empty())
                    .unwrap_or(true)
            })
            .collect();
        if !missing.is_empty() {
            let incomplete = IncompleteTranslation { missing };
            warn!("Incomplete translation: {}", incomplete);
            report.incomplete = Some(incomplete);
        }

        report.elapsed = start_time.elapsed();
        report
    }

    fn apply_batch(
        &self,
        document: &mut Document,
        batch: &Batch,
        translations: BTreeMap<usize, String>,
        report: &mut TranslationReport,
    ) {
        for (index, text) in translations {
            let Some(item) = batch.items.get(index) else {
                continue;
            };
            if let Some(mismatch) = check_placeholders(&item.source_text, &text) {
                warn!(
                    "Placeholder mismatch in {:?} -> {:?}: {}",
                    item.source_text, text, mismatch
                );
                report.placeholder_warnings += 1;
            }
            if document.apply_translation(item.id, text) {
                report.translated += 1;
            }
        }
        debug!("Applied batch {} ({} units)", batch.number, batch.len());
    }
}
