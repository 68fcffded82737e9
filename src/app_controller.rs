use anyhow::{Result, Context};
use log::{error, warn, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use indicatif::{ProgressBar, ProgressStyle, MultiProgress};

use crate::app_config::Config;
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::linguist::Document;
use crate::providers::{self, Provider};
use crate::translation::{TranslationOptions, TranslationReport, TranslationService};

// @module: Application controller for translation file processing

/// What happened to one input file
#[derive(Debug)]
pub enum FileOutcome {
    /// The file was translated and written to `output`
    Translated {
        output: PathBuf,
        report: TranslationReport,
    },
    /// The output already existed and `force` was not given
    Skipped { output: PathBuf },
}

/// Totals over all files of a run
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub files_translated: usize,
    pub files_skipped: usize,
    /// Files that could not be processed at all (parse or I/O errors)
    pub files_failed: usize,
    /// Files written with at least one failed batch or untranslated unit
    pub files_incomplete: usize,
    pub units_translated: usize,
    pub failed_batches: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Translated { report, .. } => {
                self.files_translated += 1;
                self.units_translated += report.translated;
                self.failed_batches += report.failed_batches.len();
                if !report.is_complete() {
                    self.files_incomplete += 1;
                }
            }
            FileOutcome::Skipped { .. } => self.files_skipped += 1,
        }
    }

    /// Whether the process should exit with a failure status
    pub fn has_failures(&self) -> bool {
        self.files_failed > 0 || self.failed_batches > 0
    }
}

/// Main application controller for `.ts` translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Provider shared by every file of the run
    provider: Arc<dyn Provider>,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let provider: Arc<dyn Provider> = Arc::from(providers::create_provider(&config.translation)?);
        Ok(Self::with_provider(config, provider))
    }

    /// Create a controller around an existing provider
    pub fn with_provider(config: Config, provider: Arc<dyn Provider>) -> Self {
        Self { config, provider }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check that the provider answers
    pub async fn test_connection(&self) -> Result<()> {
        self.provider
            .test_connection()
            .await
            .with_context(|| format!("Connection test against {} failed", self.provider.name()))
    }

    /// Translate one file into the configured target language
    pub async fn run(&self, input_file: &Path, output_file: Option<&Path>, force_overwrite: bool) -> Result<RunSummary> {
        let target_language = self.config.target_language.clone();
        let output_path = match output_file {
            Some(path) => path.to_path_buf(),
            None => {
                let file_name = FileManager::output_file_name(input_file, &self.config.output_suffix, &target_language, false);
                FileManager::generate_output_path(input_file, None, &file_name)
            }
        };

        let multi_progress = MultiProgress::new();
        let outcome = self
            .translate_file(input_file, &output_path, &target_language, force_overwrite, &multi_progress)
            .await?;

        let mut summary = RunSummary::default();
        summary.record(&outcome);
        Ok(summary)
    }

    /// Translate every `.ts` file of `input_dir` into each of `target_languages`.
    ///
    /// Outputs mirror the input tree under `output_dir`, or sit next to their
    /// inputs when no output directory is given. A file that cannot be read is
    /// logged and counted, and the run moves on to the next one.
    pub async fn run_folder(
        &self,
        input_dir: &Path,
        output_dir: Option<&Path>,
        recursive: bool,
        target_languages: &[String],
        force_overwrite: bool,
    ) -> Result<RunSummary> {
        let start_time = std::time::Instant::now();
        let mut summary = RunSummary::default();

        let targets: Vec<String> = if !target_languages.is_empty() {
            target_languages.to_vec()
        } else if !self.config.target_languages.is_empty() {
            self.config.target_languages.clone()
        } else {
            vec![self.config.target_language.clone()]
        };
        let tag_language = targets.len() > 1;

        let (files, previous_outputs): (Vec<PathBuf>, Vec<PathBuf>) = FileManager::find_ts_files(input_dir, recursive)?
            .into_iter()
            .partition(|file| !FileManager::is_translated_output(file, &self.config.output_suffix, &targets));
        for file in &previous_outputs {
            info!("Skipping {:?}: written by an earlier run", file);
        }

        if files.is_empty() {
            warn!("No .ts files found in {:?}", input_dir);
            return Ok(summary);
        }

        info!("Found {} file(s), {} target language(s)", files.len(), targets.len());

        let multi_progress = MultiProgress::new();
        let total_jobs = (files.len() * targets.len()) as u64;
        let folder_progress = multi_progress.add(ProgressBar::new(total_jobs));
        let folder_style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_progress.set_style(folder_style.progress_chars("#>-"));

        for file in &files {
            for target_language in &targets {
                let file_name = FileManager::output_file_name(file, &self.config.output_suffix, target_language, tag_language);
                let output_path = match output_dir {
                    Some(root) => FileManager::mirrored_output_path(file, input_dir, root, &file_name),
                    None => FileManager::generate_output_path(file, None, &file_name),
                };

                folder_progress.set_message(format!(
                    "{} -> {}",
                    file.file_name().unwrap_or_default().to_string_lossy(),
                    target_language
                ));

                match self
                    .translate_file(file, &output_path, target_language, force_overwrite, &multi_progress)
                    .await
                {
                    Ok(outcome) => summary.record(&outcome),
                    Err(e) => {
                        error!("Failed to process {:?}: {:#}", file, e);
                        summary.files_failed += 1;
                    }
                }
                folder_progress.inc(1);
            }
        }

        folder_progress.finish_and_clear();

        info!(
            "Processed {} file(s) in {}: {} translated, {} skipped, {} failed, {} incomplete",
            files.len(),
            Self::format_duration(start_time.elapsed()),
            summary.files_translated,
            summary.files_skipped,
            summary.files_failed,
            summary.files_incomplete
        );

        Ok(summary)
    }

    /// Translate `input_file` into `target_language` and write `output_path`.
    ///
    /// A malformed input fails before any provider request. Batch failures do
    /// not: the file is written with the affected units left unfinished.
    pub async fn translate_file(
        &self,
        input_file: &Path,
        output_path: &Path,
        target_language: &str,
        force_overwrite: bool,
        multi_progress: &MultiProgress,
    ) -> Result<FileOutcome> {
        if !FileManager::file_exists(input_file) {
            return Err(AppError::File(format!("Input file does not exist: {:?}", input_file)).into());
        }

        if output_path.exists() && !force_overwrite {
            warn!("Skipping {:?}, output already exists (use -f to force overwrite)", output_path);
            return Ok(FileOutcome::Skipped { output: output_path.to_path_buf() });
        }

        let mut document = Document::load(input_file)
            .with_context(|| format!("Failed to load translation file: {:?}", input_file))?;

        let stats = document.stats();
        info!(
            "{}: {} unit(s), {} translated, {} unfinished, {} obsolete",
            input_file.display(),
            stats.total(),
            stats.translated,
            stats.unfinished,
            stats.obsolete
        );

        let options = TranslationOptions::from_config(&self.config, target_language);
        let service = TranslationService::new(self.provider.clone(), options);

        info!(
            "Translating to {} with {} - {}",
            target_language,
            self.config.translation.provider.display_name(),
            self.config.translation.get_model()
        );

        let progress_bar = multi_progress.add(ProgressBar::new(0));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("#>-"));
        progress_bar.set_message("Translating");

        let pb = progress_bar.clone();
        let report = service
            .translate_document(&mut document, &self.config.batch, move |completed, total| {
                pb.set_length(total as u64);
                pb.set_position(completed as u64);
            })
            .await;

        progress_bar.finish_and_clear();

        document
            .save(output_path, target_language)
            .with_context(|| format!("Failed to write translation file: {:?}", output_path))?;

        Self::log_report(&report, output_path);

        Ok(FileOutcome::Translated {
            output: output_path.to_path_buf(),
            report,
        })
    }

    fn log_report(report: &TranslationReport, output_path: &Path) {
        for failure in &report.failed_batches {
            error!(
                "Batch {} failed after {} attempt(s), {} unit(s) left unfinished: {}",
                failure.batch,
                failure.attempts,
                failure.units.len(),
                failure.message
            );
        }
        if let Some(incomplete) = &report.incomplete {
            warn!("{}: {}", output_path.display(), incomplete);
        }
        if report.placeholder_warnings > 0 {
            warn!("{} translation(s) with placeholder differences", report.placeholder_warnings);
        }

        info!(
            "Translated {}/{} unit(s) in {}: {}",
            report.translated,
            report.requested,
            Self::format_duration(report.elapsed),
            output_path.display()
        );
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
