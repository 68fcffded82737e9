/*!
 * Tests for the translation driver using the scripted mock provider
 */

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use ts_translator::errors::{ProviderError, ResponseFormatError, TranslationError};
use ts_translator::linguist::{Document, UnitId, UnitStatus};
use ts_translator::providers::mock::MockProvider;
use ts_translator::translation::batch::{batches_for, collect_items};
use ts_translator::translation::prompts::TranslationRequest;
use ts_translator::translation::{make_batches, parse_response};

use crate::common;

#[test]
fn test_make_batches_withDocumentUnits_shouldCoverEveryUnitOnce() {
    let sources: Vec<String> = (0..23).map(|i| format!("String {}", i)).collect();
    let refs: Vec<&str> = sources.iter().map(String::as_str).collect();
    let doc = Document::parse(&common::ts_document("en_US", &refs)).unwrap();

    let batches = make_batches(collect_items(&doc), Some(5));
    let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
    assert_eq!(sizes, vec![5, 5, 5, 5, 3]);

    let ids: Vec<UnitId> = batches.iter().flat_map(|b| b.items.iter().map(|i| i.id)).collect();
    assert_eq!(ids, doc.units_needing_translation());
}

#[test]
fn test_parse_response_withRealisticCompletion_shouldAlign() {
    let completion = "```json\n{\"0\": \"Enregistrer\", \"1\": \"Annuler\", \"2\": \"À propos\"}\n```";
    let parsed = parse_response(completion, 3).unwrap();
    assert_eq!(parsed.values().cloned().collect::<Vec<_>>(), vec!["Enregistrer", "Annuler", "À propos"]);
}

#[tokio::test]
async fn test_translate_document_withWorkingProvider_shouldTranslateAll() {
    common::init_logging();
    let config = common::test_config("fr_FR");
    let mock = Arc::new(MockProvider::working());
    let service = common::service_with(mock.clone(), &config);

    let mut doc = Document::parse(&common::sample_menu_document()).unwrap();
    let report = service.translate_document(&mut doc, &config.batch, |_, _| {}).await;

    assert!(report.is_complete());
    assert_eq!(report.requested, 3);
    assert_eq!(report.translated, 3);
    assert_eq!(report.batches, 1);
    assert_eq!(mock.request_count(), 1);
    assert_eq!(doc.unit(UnitId::new(0, 2)).unwrap().translation(), "[TRANSLATED] About");
    assert!(doc.units_needing_translation().is_empty());
}

#[tokio::test]
async fn test_translate_document_withEmptySource_shouldTranslateTheRest() {
    let config = common::test_config("fr_FR");
    let mock = Arc::new(MockProvider::working());
    mock.push_text(r#"{"0":"Enregistrer"}"#);
    let service = common::service_with(mock.clone(), &config);

    let mut doc = Document::parse(&common::ts_document("en_US", &["Save", ""])).unwrap();
    let report = service.translate_document(&mut doc, &config.batch, |_, _| {}).await;

    assert!(report.is_complete());
    assert_eq!(report.requested, 1);
    assert_eq!(report.translated, 1);
    assert_eq!(mock.request_count(), 1);
    assert_eq!(doc.unit(UnitId::new(0, 0)).unwrap().translation(), "Enregistrer");
    assert_eq!(doc.units_needing_translation(), vec![UnitId::new(0, 1)]);

    let request = TranslationRequest::from_user_prompt(&mock.prompts()[0].user).unwrap();
    assert_eq!(request.entries_to_translate.len(), 1);
}

#[tokio::test]
async fn test_translate_document_shouldSendContextInPrompt() {
    let mut config = common::test_config("de_DE");
    config.translation.common.application_context = "Eye tracking software".to_string();
    let mut glossary = BTreeMap::new();
    glossary.insert("calibration".to_string(), "Kalibrierung".to_string());
    config.translation.common.glossary.insert("de_DE".to_string(), glossary);

    let mock = Arc::new(MockProvider::working());
    let service = common::service_with(mock.clone(), &config);
    let mut doc = Document::parse(&common::ts_document("en_US", &["Start calibration"])).unwrap();
    service.translate_document(&mut doc, &config.batch, |_, _| {}).await;

    let prompts = mock.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].system.contains("Eye tracking software"));
    assert!(prompts[0].system.contains("Kalibrierung"));
    assert!(prompts[0].system.contains("'Sie'"));

    let request = TranslationRequest::from_user_prompt(&prompts[0].user).unwrap();
    assert_eq!(request.target_language, "de_DE");
    assert_eq!(request.entries_to_translate[0].context, "MainWindow");
    assert_eq!(request.entries_to_translate[0].location.as_deref(), Some("../src/mainwindow.cpp:10"));
}

#[tokio::test]
async fn test_translate_document_withShortResponse_shouldFailBatchAndKeepUnitsUnfinished() {
    let config = common::test_config("fr_FR");
    let mock = Arc::new(MockProvider::working());
    let short = MockProvider::json_response(&["Enregistrer", "Annuler"]);
    mock.push_text(short.clone());
    mock.push_text(short);
    let service = common::service_with(mock.clone(), &config);

    let mut doc = Document::parse(&common::sample_menu_document()).unwrap();
    let report = service.translate_document(&mut doc, &config.batch, |_, _| {}).await;

    assert_eq!(mock.request_count(), 2);
    assert_eq!(report.failed_batches.len(), 1);
    assert_eq!(report.failed_batches[0].attempts, 2);
    assert_eq!(report.failed_batches[0].units.len(), 3);
    assert_eq!(report.translated, 0);
    assert_eq!(report.incomplete.as_ref().map(|i| i.missing.len()), Some(3));
    assert_eq!(doc.units_needing_translation().len(), 3);
}

#[tokio::test]
async fn test_translate_batch_with_retry_shouldReportFormatError() {
    let config = common::test_config("fr_FR");
    let mock = Arc::new(MockProvider::working());
    mock.push_text(r#"{"0": "a", "0": "b"}"#);
    mock.push_text(r#"{"0": "a", "0": "b"}"#);
    let service = common::service_with(mock.clone(), &config);

    let doc = Document::parse(&common::ts_document("en_US", &["A", "B"])).unwrap();
    let batch = make_batches(collect_items(&doc), None).remove(0);
    let error = service.translate_batch_with_retry(&batch).await.unwrap_err();

    match error {
        TranslationError::Failed { batch, attempts, source } => {
            assert_eq!(batch, 1);
            assert_eq!(attempts, 2);
            assert!(matches!(
                *source,
                TranslationError::ResponseFormat(ResponseFormatError::DuplicateIndex(0))
            ));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_translate_document_withMultiBatchFailure_shouldKeepOtherBatches() {
    let config = common::multi_batch_config("fr_FR", 10);
    let sources: Vec<String> = (0..25).map(|i| format!("Label {}", i)).collect();
    let refs: Vec<&str> = sources.iter().map(String::as_str).collect();
    let mut doc = Document::parse(&common::ts_document("en_US", &refs)).unwrap();

    let batches = batches_for(&doc, &config.batch);
    assert_eq!(batches.iter().map(|b| b.len()).collect::<Vec<_>>(), vec![10, 10, 5]);

    let mock = Arc::new(MockProvider::working());
    // Batch 1 answers from the behavior, batch 2 fails on both attempts
    let first: Vec<String> = (0..10).map(|i| format!("Étiquette {}", i)).collect();
    let first_refs: Vec<&str> = first.iter().map(String::as_str).collect();
    mock.push_text(MockProvider::json_response(&first_refs));
    mock.push_error(ProviderError::ApiError { status_code: 503, message: "overloaded".to_string() });
    mock.push_error(ProviderError::ApiError { status_code: 503, message: "overloaded".to_string() });

    let service = common::service_with(mock.clone(), &config);
    let mut progress = Vec::new();
    let report = {
        let progress_log = std::sync::Mutex::new(&mut progress);
        service
            .translate_batches(&mut doc, batches, |done, total| {
                if let Ok(mut log) = progress_log.lock() {
                    log.push((done, total));
                }
            })
            .await
    };

    assert_eq!(progress.last(), Some(&(3, 3)));
    assert_eq!(report.batches, 3);
    assert_eq!(report.failed_batches.len(), 1);
    assert_eq!(report.failed_batches[0].batch, 2);
    assert_eq!(report.translated, 15);
    assert_eq!(report.incomplete.as_ref().map(|i| i.missing.len()), Some(10));

    assert_eq!(doc.unit(UnitId::new(0, 0)).unwrap().translation(), "Étiquette 0");
    assert_eq!(doc.unit(UnitId::new(0, 10)).unwrap().status(), UnitStatus::Unfinished);
    assert_eq!(doc.unit(UnitId::new(0, 24)).unwrap().translation(), "[TRANSLATED] Label 24");
}

#[tokio::test]
async fn test_translate_document_withConcurrency_shouldApplyInBatchOrder() {
    let mut config = common::multi_batch_config("es_ES", 2);
    config.translation.common.concurrent_requests = 3;
    let mock = Arc::new(MockProvider::working().with_delay(Duration::from_millis(10)));
    let service = common::service_with(mock.clone(), &config);

    let mut doc = Document::parse(&common::ts_document("en_US", &["A", "B", "C", "D", "E", "F", "G"])).unwrap();
    let report = service.translate_document(&mut doc, &config.batch, |_, _| {}).await;

    assert!(report.is_complete());
    assert_eq!(report.batches, 4);
    assert_eq!(mock.request_count(), 4);
    let translations: Vec<String> = doc.contexts()[0].units().iter().map(|u| u.translation().to_string()).collect();
    assert_eq!(translations[6], "[TRANSLATED] G");
}

#[tokio::test]
async fn test_translate_document_withPlaceholderDrift_shouldWarnNotReject() {
    let config = common::test_config("fr_FR");
    let mock = Arc::new(MockProvider::working());
    mock.push_text(MockProvider::json_response(&["Supprimer le fichier ?"]));
    let service = common::service_with(mock, &config);

    let mut doc = Document::parse(&common::ts_document("en_US", &["Delete %1?"])).unwrap();
    let report = service.translate_document(&mut doc, &config.batch, |_, _| {}).await;

    assert!(report.is_complete());
    assert_eq!(report.placeholder_warnings, 1);
    assert_eq!(doc.unit(UnitId::new(0, 0)).unwrap().status(), UnitStatus::Translated);
}

#[tokio::test]
async fn test_translate_document_withNothingToDo_shouldNotCallProvider() {
    let config = common::test_config("fr_FR");
    let mock = Arc::new(MockProvider::failing());
    let service = common::service_with(mock.clone(), &config);

    let mut doc = Document::parse("<TS version=\"2.1\"><context><name>C</name><message><source>A</source><translation>B</translation></message></context></TS>").unwrap();
    let report = service.translate_document(&mut doc, &config.batch, |_, _| {}).await;

    assert!(report.is_complete());
    assert_eq!(report.requested, 0);
    assert_eq!(mock.request_count(), 0);
}

#[test]
fn test_rate_limit_delay_shouldSpaceRequests() {
    let mut config = common::multi_batch_config("fr_FR", 1);
    config.translation.common.rate_limit_delay_ms = 30;
    let mock = Arc::new(MockProvider::working());
    let service = common::service_with(mock.clone(), &config);
    let mut doc = Document::parse(&common::ts_document("en_US", &["A", "B", "C"])).unwrap();

    let start = std::time::Instant::now();
    let report = tokio_test::block_on(service.translate_document(&mut doc, &config.batch, |_, _| {}));

    assert!(report.is_complete());
    assert!(start.elapsed() >= Duration::from_millis(60));
}
