/*!
 * Tests for the Linguist document model through the public API
 */

use ts_translator::errors::DocumentError;
use ts_translator::linguist::{Document, UnitId, UnitStatus};

use crate::common;

const MIXED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.1" language="de_DE">
<context>
    <name>SettingsDialog</name>
    <message>
        <location filename="../src/settings.cpp" line="41"/>
        <source>&amp;Apply</source>
        <comment>button</comment>
        <translation>&amp;Übernehmen</translation>
    </message>
    <message>
        <source>Camera</source>
        <extracomment>Tab title</extracomment>
        <translation type="unfinished"></translation>
    </message>
    <message>
        <source>Old label</source>
        <translation type="vanished">Alte Beschriftung</translation>
    </message>
</context>
<context>
    <name>Calibration</name>
    <message>
        <source>Look at the dot</source>
        <translation></translation>
    </message>
    <message>
        <source>Retry &lt;b&gt;now&lt;/b&gt;</source>
        <translation type="obsolete">Jetzt wiederholen</translation>
    </message>
</context>
</TS>
"#;

#[test]
fn test_document_parse_withMixedStates_shouldClassifyUnits() {
    let doc = Document::parse(MIXED).unwrap();

    assert_eq!(doc.version(), "2.1");
    assert_eq!(doc.language(), Some("de_DE"));
    assert_eq!(doc.contexts().len(), 2);
    assert_eq!(doc.total_units(), 5);

    let apply = doc.unit(UnitId::new(0, 0)).unwrap();
    assert_eq!(apply.source_text(), "&Apply");
    assert_eq!(apply.comment(), Some("button"));
    assert_eq!(apply.translation(), "&Übernehmen");
    assert_eq!(apply.status(), UnitStatus::Translated);
    assert_eq!(apply.locations()[0].line.as_deref(), Some("41"));

    assert_eq!(doc.unit(UnitId::new(0, 1)).unwrap().extra_comment(), Some("Tab title"));
    assert_eq!(doc.unit(UnitId::new(0, 2)).unwrap().status(), UnitStatus::Obsolete);
    assert_eq!(doc.unit(UnitId::new(1, 1)).unwrap().source_text(), "Retry <b>now</b>");

    let stats = doc.stats();
    assert_eq!((stats.translated, stats.unfinished, stats.obsolete), (1, 2, 2));
}

#[test]
fn test_units_needing_translation_shouldFollowDocumentOrder() {
    let doc = Document::parse(MIXED).unwrap();
    assert_eq!(
        doc.units_needing_translation(),
        vec![UnitId::new(0, 1), UnitId::new(1, 0)]
    );
}

#[test]
fn test_save_withoutChanges_shouldBeByteIdentical() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(temp_dir.path(), "settings_de.ts", MIXED).unwrap();
    let output = temp_dir.path().join("out.ts");

    let doc = Document::load(&input).unwrap();
    doc.save(&output, "de_DE").unwrap();

    assert_eq!(std::fs::read(&output).unwrap(), MIXED.as_bytes());
}

#[test]
fn test_apply_translation_shouldOnlyTouchThatUnit() {
    let mut doc = Document::parse(MIXED).unwrap();
    assert!(doc.apply_translation(UnitId::new(1, 0), "Schauen Sie auf den Punkt"));
    assert!(!doc.apply_translation(UnitId::new(7, 0), "nowhere"));

    let output = doc.to_xml_string("de_DE");
    let expected = MIXED.replace(
        "<source>Look at the dot</source>\n        <translation></translation>",
        "<source>Look at the dot</source>\n        <translation>Schauen Sie auf den Punkt</translation>",
    );
    assert_eq!(output, expected);

    let reparsed = Document::parse(&output).unwrap();
    assert_eq!(reparsed.units_needing_translation(), vec![UnitId::new(0, 1)]);
}

#[test]
fn test_document_parse_withBrokenInput_shouldFail() {
    let cases = [
        ("<TS version=\"2.1\"><context><name>A</name></TS>", "mismatched"),
        ("<TS version=\"2.1\"><context><message><source>x</source></message></context></TS>", "no name"),
        ("<TS version=\"2.1\"><context><name>A</name><message><comment>c</comment></message></context></TS>", "no source"),
        ("<TS><context><name>A</name></context></TS>", "no version"),
        ("<ts version=\"2.1\"></ts>", "wrong root"),
        ("<TS version=\"2.1\"><context><name>A &bogus; B</name></context></TS>", "bad escape"),
    ];

    for (input, label) in cases {
        assert!(Document::parse(input).is_err(), "{} should be rejected", label);
    }

    assert!(matches!(
        Document::parse("<ts version=\"2.1\"></ts>"),
        Err(DocumentError::Schema(_))
    ));
}

#[test]
fn test_document_load_withInvalidUtf8_shouldFail() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = temp_dir.path().join("latin1.ts");
    std::fs::write(&path, b"<TS version=\"2.1\"><context><name>\xe9</name></context></TS>").unwrap();
    assert!(Document::load(&path).is_err());
}
