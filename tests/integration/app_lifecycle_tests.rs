/*!
 * Controller lifecycle: single files, skipped outputs and folder runs
 */

use std::sync::Arc;

use ts_translator::app_controller::Controller;
use ts_translator::linguist::Document;
use ts_translator::providers::Provider;
use ts_translator::providers::mock::MockProvider;

use crate::common;

fn controller(config: ts_translator::app_config::Config, mock: Arc<MockProvider>) -> Controller {
    let provider: Arc<dyn Provider> = mock;
    Controller::with_provider(config, provider)
}

#[tokio::test]
async fn test_controller_run_withSingleFile_shouldWriteSuffixedOutput() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(temp_dir.path(), "app_en.ts", &common::sample_menu_document()).unwrap();

    let mock = Arc::new(MockProvider::working());
    let controller = controller(common::test_config("es_ES"), mock.clone());
    let summary = controller.run(&input, None, false).await.unwrap();

    assert_eq!(summary.files_translated, 1);
    assert_eq!(summary.units_translated, 3);
    assert!(!summary.has_failures());

    let output = temp_dir.path().join("app_en_translated.ts");
    let doc = Document::load(&output).unwrap();
    assert_eq!(doc.language(), Some("es_ES"));
    assert!(doc.units_needing_translation().is_empty());
}

#[tokio::test]
async fn test_controller_run_withExistingOutput_shouldSkipUnlessForced() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(temp_dir.path(), "app.ts", &common::sample_menu_document()).unwrap();
    let output = common::create_test_file(temp_dir.path(), "out/app_fr.ts", "keep me").unwrap();

    let mock = Arc::new(MockProvider::working());
    let controller = controller(common::test_config("fr_FR"), mock.clone());

    let summary = controller.run(&input, Some(&output), false).await.unwrap();
    assert_eq!(summary.files_skipped, 1);
    assert_eq!(mock.request_count(), 0);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "keep me");

    let summary = controller.run(&input, Some(&output), true).await.unwrap();
    assert_eq!(summary.files_translated, 1);
    assert!(std::fs::read_to_string(&output).unwrap().contains("[TRANSLATED] Cancel"));
}

#[tokio::test]
async fn test_controller_run_withMalformedInput_shouldFailBeforeProviderCall() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(temp_dir.path(), "broken.ts", "<TS version=\"2.1\"><context>").unwrap();

    let mock = Arc::new(MockProvider::working());
    let controller = controller(common::test_config("fr_FR"), mock.clone());

    assert!(controller.run(&input, None, false).await.is_err());
    assert_eq!(mock.request_count(), 0);
    assert!(!temp_dir.path().join("broken_translated.ts").exists());
}

#[tokio::test]
async fn test_controller_run_withFailingProvider_shouldStillWriteAndReportFailure() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(temp_dir.path(), "app.ts", &common::sample_menu_document()).unwrap();

    let mock = Arc::new(MockProvider::failing());
    let controller = controller(common::test_config("fr_FR"), mock.clone());
    let summary = controller.run(&input, None, false).await.unwrap();

    assert!(summary.has_failures());
    assert_eq!(summary.files_incomplete, 1);
    assert_eq!(mock.request_count(), 2);

    let doc = Document::load(temp_dir.path().join("app_translated.ts")).unwrap();
    assert_eq!(doc.units_needing_translation().len(), 3);
}

#[tokio::test]
async fn test_controller_run_folder_withTwoTargets_shouldMirrorTree() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input_dir = temp_dir.path().join("i18n");
    let output_dir = temp_dir.path().join("out");
    common::create_test_file(&input_dir, "main.ts", &common::sample_menu_document()).unwrap();
    common::create_test_file(&input_dir, "plugins/camera.ts", &common::ts_document("en_US", &["Start"])).unwrap();
    common::create_test_file(&input_dir, "plugins/readme.txt", "not a translation").unwrap();

    let mock = Arc::new(MockProvider::working());
    let controller = controller(common::test_config("fr_FR"), mock.clone());
    let targets = vec!["de_DE".to_string(), "cs_CZ".to_string()];
    let summary = controller
        .run_folder(&input_dir, Some(&output_dir), true, &targets, false)
        .await
        .unwrap();

    assert_eq!(summary.files_translated, 4);
    assert_eq!(summary.units_translated, 8);
    assert_eq!(mock.request_count(), 4);

    let camera_cs = Document::load(output_dir.join("plugins").join("camera_translated_cs_CZ.ts")).unwrap();
    assert_eq!(camera_cs.language(), Some("cs_CZ"));
    assert!(output_dir.join("main_translated_de_DE.ts").exists());
    assert!(output_dir.join("main_translated_cs_CZ.ts").exists());
}

#[tokio::test]
async fn test_controller_run_folder_withBrokenFile_shouldContinue() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input_dir = temp_dir.path();
    common::create_test_file(input_dir, "a_broken.ts", "<TS version=\"2.1\"><context>").unwrap();
    common::create_test_file(input_dir, "b_good.ts", &common::sample_menu_document()).unwrap();

    let mock = Arc::new(MockProvider::working());
    let mut config = common::test_config("it_IT");
    config.output_suffix = "_{lang}".to_string();
    let controller = controller(config, mock);

    let summary = controller.run_folder(input_dir, None, false, &[], false).await.unwrap();

    assert_eq!(summary.files_failed, 1);
    assert_eq!(summary.files_translated, 1);
    assert!(summary.has_failures());
    assert!(input_dir.join("b_good_it_IT.ts").exists());
}

#[tokio::test]
async fn test_controller_run_folder_withPreviousOutputs_shouldNotTranslateThemAgain() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input_dir = temp_dir.path();
    common::create_test_file(input_dir, "app.ts", &common::sample_menu_document()).unwrap();

    let mock = Arc::new(MockProvider::working());
    let controller = controller(common::test_config("fr_FR"), mock.clone());

    let first = controller.run_folder(input_dir, None, false, &[], false).await.unwrap();
    assert_eq!(first.files_translated, 1);
    assert!(input_dir.join("app_translated.ts").exists());

    let second = controller.run_folder(input_dir, None, false, &[], true).await.unwrap();
    assert_eq!(second.files_translated, 1);
    assert_eq!(mock.request_count(), 2);
    assert!(!input_dir.join("app_translated_translated.ts").exists());
}
