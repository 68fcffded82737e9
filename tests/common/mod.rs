/*!
 * Common test utilities for the ts-translator test suite
 */

use std::path::{Path, PathBuf};
use std::fs;
use std::sync::Arc;
use anyhow::Result;
use tempfile::TempDir;

use ts_translator::app_config::{BatchMode, Config};
use ts_translator::providers::mock::MockProvider;
use ts_translator::translation::{TranslationOptions, TranslationService};

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// A `.ts` document with one context holding an unfinished message per source
pub fn ts_document(language: &str, sources: &[&str]) -> String {
    let mut content = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE TS>\n");
    content.push_str(&format!("<TS version=\"2.1\" language=\"{}\" sourcelanguage=\"en_US\">\n", language));
    content.push_str("<context>\n    <name>MainWindow</name>\n");
    for (i, source) in sources.iter().enumerate() {
        content.push_str("    <message>\n");
        content.push_str(&format!("        <location filename=\"../src/mainwindow.cpp\" line=\"{}\"/>\n", 10 + i));
        content.push_str(&format!("        <source>{}</source>\n", source));
        content.push_str("        <translation type=\"unfinished\"></translation>\n");
        content.push_str("    </message>\n");
    }
    content.push_str("</context>\n</TS>\n");
    content
}

/// The three-string menu document used across scenarios
pub fn sample_menu_document() -> String {
    ts_document("en_US", &["Save", "Cancel", "About"])
}

/// Configuration with no backoff, suitable for fast retry tests
pub fn test_config(target_language: &str) -> Config {
    let mut config = Config::default();
    config.target_language = target_language.to_string();
    config.translation.common.retry_backoff_ms = 0;
    config.translation.common.retry_count = 1;
    config.translation.active_provider_config_mut().api_key = "test-key".to_string();
    config
}

/// Configuration splitting files into batches of `batch_size`
pub fn multi_batch_config(target_language: &str, batch_size: usize) -> Config {
    let mut config = test_config(target_language);
    config.batch.mode = BatchMode::Multi;
    config.batch.batch_size = batch_size;
    config
}

/// Translation service over `mock` for `config`
pub fn service_with(mock: Arc<MockProvider>, config: &Config) -> TranslationService {
    TranslationService::new(mock, TranslationOptions::from_config(config, &config.target_language))
}

/// Route library logs to the test output when RUST_LOG is set
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
