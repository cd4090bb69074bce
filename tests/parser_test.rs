//! Integration tests for script document parsing


use fixtures::{parser, script_doc, write_json};
use robert_interpreter::{
    Composition, Document, Locator, ParserSettings, ScriptError, StructureError,
};
use serde_json::json;
use std::sync::Arc;

#[test]
fn test_parse_basic_script() {
    let parser = parser();
    let doc = script_doc(json!([
        {"type": "get", "url": "https://example.com/"},
        {"type": "clickElement", "locator": {"type": "id", "value": "submit"}},
        {"type": "verifyTitle", "title": "Home", "negated": true}
    ]));

    let scripts = parser.parse(&doc, None).expect("script should parse");
    assert_eq!(scripts.len(), 1);

    let script = &scripts[0];
    assert_eq!(script.steps().len(), 3);
    assert!(script.name().is_none());
    assert!(script.close_context());
    assert!(!script.reuse_context());

    let get = &script.steps()[0];
    assert_eq!(get.type_name(), "get");
    assert_eq!(get.string_param("url"), Some("https://example.com/"));
    assert!(!get.negated());
    assert!(get.unit().composition().is_none());

    let click = &script.steps()[1];
    assert_eq!(
        click.locator_param("locator"),
        Some(&Locator::new("id", "submit"))
    );
    assert!(click.string_params().is_empty());

    let verify = &script.steps()[2];
    assert!(verify.negated());
    assert_eq!(verify.unit().composition(), Some(Composition::Verify));
    assert_eq!(verify.string_param("title"), Some("Home"));
    assert!(!verify.string_params().contains_key("negated"));
    println!("✅ Parsed script with {} steps", script.steps().len());
}

#[test]
fn test_step_count_matches_input() {
    let parser = parser();
    for count in [0usize, 1, 5, 20] {
        let steps: Vec<_> = (0..count)
            .map(|i| json!({"type": "get", "url": format!("https://example.com/{}", i)}))
            .collect();
        let script = parser
            .parse_script(&script_doc(json!(steps)), None)
            .expect("script should parse");
        assert_eq!(script.steps().len(), count);
        assert_eq!(
            script.steps().last().and_then(|s| s.string_param("url")),
            count
                .checked_sub(1)
                .map(|i| format!("https://example.com/{}", i))
                .as_deref()
        );
    }
}

#[test]
fn test_steps_share_resolved_units() {
    let parser = parser();
    let doc = script_doc(json!([
        {"type": "get", "url": "a"},
        {"type": "get", "url": "b"}
    ]));

    let script = parser.parse_script(&doc, None).unwrap();
    assert!(Arc::ptr_eq(script.steps()[0].unit(), script.steps()[1].unit()));
    assert_eq!(parser.step_types().cached(), 1);
}

#[test]
fn test_scalar_params_become_strings() {
    let parser = parser();
    let doc = script_doc(json!([{"type": "get", "url": "x", "timeout": 30, "force": false}]));

    let script = parser.parse_script(&doc, None).unwrap();
    let step = &script.steps()[0];
    assert_eq!(step.string_param("timeout"), Some("30"));
    assert_eq!(step.string_param("force"), Some("false"));
}

#[test]
fn test_object_without_locator_fields_is_malformed() {
    let parser = parser();
    let doc = script_doc(json!([{"type": "clickElement", "locator": {"type": "id"}}]));

    let err = parser.parse(&doc, None).unwrap_err();
    match err {
        ScriptError::MalformedScript {
            source: StructureError::WrongType { field, .. },
            ..
        } => assert_eq!(field, "steps[0].locator"),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_format_version_three_is_unsupported() {
    let parser = parser();
    let mut doc = script_doc(json!([{"type": "get", "url": "x"}]));
    doc["formatVersion"] = json!(3);

    let err = parser.parse(&doc, None).unwrap_err();
    assert!(matches!(err, ScriptError::UnsupportedVersion { .. }));
    println!("✅ Rejected format version: {}", err);
}

#[test]
fn test_numeric_format_versions_go_through_range_check() {
    let parser = parser();
    for version in [json!(-1), json!(3.5), json!("-1"), json!(0)] {
        let mut doc = script_doc(json!([{"type": "get", "url": "x"}]));
        doc["formatVersion"] = version.clone();
        let err = parser.parse(&doc, None).unwrap_err();
        assert!(
            matches!(err, ScriptError::UnsupportedVersion { .. }),
            "{} gave {}",
            version,
            err
        );
        println!("✅ Rejected format version {}: {}", version, err);
    }

    for version in [json!(2.0), json!("2"), json!(" 1 ")] {
        let mut doc = script_doc(json!([{"type": "get", "url": "x"}]));
        doc["formatVersion"] = version;
        assert!(parser.parse(&doc, None).is_ok());
    }
}

#[test]
fn test_non_numeric_format_version_is_malformed() {
    let parser = parser();
    for version in [json!("two"), json!(true), json!([2])] {
        let mut doc = script_doc(json!([]));
        doc["formatVersion"] = version;
        let err = parser.parse(&doc, None).unwrap_err();
        assert!(matches!(
            err,
            ScriptError::MalformedScript {
                source: StructureError::WrongType { ref field, .. },
                ..
            } if field == "formatVersion"
        ));
    }
}

#[test]
fn test_selenium_version_must_be_two() {
    let parser = parser();
    for version in [json!("1"), json!(2)] {
        let mut doc = script_doc(json!([]));
        doc["seleniumVersion"] = version;
        let err = parser.parse(&doc, None).unwrap_err();
        assert!(matches!(err, ScriptError::UnsupportedVersion { .. }));
    }
}

#[test]
fn test_version_checked_before_steps() {
    let parser = parser();
    let mut doc = script_doc(json!([{"type": "noSuchStep"}]));
    doc["formatVersion"] = json!(7);

    let err = parser.parse(&doc, None).unwrap_err();
    assert!(matches!(err, ScriptError::UnsupportedVersion { .. }));
    assert_eq!(parser.step_types().cached(), 0);
}

#[test]
fn test_legacy_settings_accept_only_version_one() {
    let parser = parser().with_settings(ParserSettings::legacy()).unwrap();

    let doc = script_doc(json!([{"type": "get", "url": "x"}]));
    let err = parser.parse(&doc, None).unwrap_err();
    assert!(matches!(err, ScriptError::UnsupportedVersion { .. }));

    let mut doc = doc;
    doc["formatVersion"] = json!(1);
    assert!(parser.parse(&doc, None).is_ok());
}

#[test]
fn test_missing_required_fields() {
    let parser = parser();
    let cases = vec![
        (json!({"formatVersion": 1, "steps": []}), "seleniumVersion"),
        (json!({"seleniumVersion": "2", "steps": []}), "formatVersion"),
        (json!({"seleniumVersion": "2", "formatVersion": 1}), "steps"),
        (script_doc(json!([{"url": "x"}])), "steps[0].type"),
    ];

    for (doc, field) in cases {
        let err = parser.parse(&doc, None).unwrap_err();
        match err {
            ScriptError::MalformedScript {
                source: StructureError::MissingField(missing),
                ..
            } => assert_eq!(missing, field),
            other => panic!("expected missing {}, got {}", field, other),
        }
        println!("✅ Caught missing field: {}", field);
    }
}

#[test]
fn test_unknown_step_type() {
    let parser = parser();
    let doc = script_doc(json!([{"type": "dragAndDrop"}]));

    let err = parser.parse(&doc, None).unwrap_err();
    assert!(matches!(err, ScriptError::NotImplemented { ref name } if name == "dragAndDrop"));
}

#[test]
fn test_invalid_json_text() {
    let parser = parser();
    let err = parser.parse_str(r#"{"seleniumVersion": "2",}"#, None).unwrap_err();
    assert!(matches!(
        err,
        ScriptError::MalformedScript {
            source: StructureError::Json(_),
            ..
        }
    ));
}

#[test]
fn test_parse_reader_from_bytes() {
    let parser = parser();
    let doc = script_doc(json!([
        {"type": "get", "url": "https://example.com"},
        {"type": "verifyTitle", "title": "Example"}
    ]));
    let text = doc.to_string();

    let scripts = parser.parse_reader(text.as_bytes(), None).unwrap();
    assert_eq!(scripts.len(), 1);
    assert_eq!(scripts[0].steps().len(), 2);
    assert_eq!(
        scripts[0].steps()[1].unit().composition(),
        Some(Composition::Verify)
    );

    let err = parser.parse_reader(&b"{\"steps\": ["[..], None).unwrap_err();
    assert!(matches!(
        err,
        ScriptError::MalformedScript {
            source: StructureError::Json(_),
            ..
        }
    ));
}

#[test]
fn test_data_rows_feed_substitution() {
    let parser = parser();
    let doc = json!({
        "seleniumVersion": "2",
        "formatVersion": 2,
        "data": {"source": "layered"},
        "steps": [
            {"type": "get", "url": "a${x}b${y}c"},
            {"type": "clickElement", "locator": {"type": "id", "value": "${x}"}}
        ]
    });

    let script = parser.parse_script(&doc, None).unwrap();
    assert_eq!(script.data_rows().len(), 2);
    assert_eq!(script.steps()[0].string_param("url"), Some("a1b3c"));
    // Locators are taken verbatim
    assert_eq!(
        script.steps()[1].locator_param("locator").map(Locator::value),
        Some("${x}")
    );
}

#[test]
fn test_source_config_is_flattened() {
    let parser = parser();
    let doc = json!({
        "seleniumVersion": "2",
        "formatVersion": 2,
        "data": {
            "source": "manual",
            "configs": {
                "manual": {"user": "alice", "pin": 1234},
                "csv": {"path": "ignored.csv"}
            }
        },
        "steps": [{"type": "get", "url": "/login/${user}/${pin}"}]
    });

    let script = parser.parse_script(&doc, None).unwrap();
    assert_eq!(script.data_rows().len(), 1);
    assert!(!script.data_rows()[0].contains_key("path"));
    assert_eq!(script.steps()[0].string_param("url"), Some("/login/alice/1234"));
}

#[test]
fn test_source_configs_must_be_an_object() {
    let parser = parser();
    let doc = json!({
        "seleniumVersion": "2",
        "formatVersion": 2,
        "data": {"source": "manual", "configs": 5},
        "steps": []
    });

    let err = parser.parse(&doc, None).unwrap_err();
    match err {
        ScriptError::MalformedScript {
            source: StructureError::WrongType { field, .. },
            ..
        } => assert_eq!(field, "data.configs"),
        other => panic!("expected a wrong-type configs error, got {}", other),
    }
}

#[test]
fn test_missing_binding_aborts_parse() {
    let parser = parser();
    let doc = script_doc(json!([{"type": "get", "url": "${nowhere}"}]));

    let err = parser.parse(&doc, None).unwrap_err();
    assert!(matches!(err, ScriptError::MissingBinding { ref name } if name == "nowhere"));
}

#[test]
fn test_data_source_failures() {
    let parser = parser();

    let doc = json!({
        "seleniumVersion": "2", "formatVersion": 2,
        "data": {"source": "xml"}, "steps": []
    });
    let err = parser.parse(&doc, None).unwrap_err();
    assert!(matches!(err, ScriptError::NotImplemented { ref name } if name == "xml"));

    let doc = json!({
        "seleniumVersion": "2", "formatVersion": 2,
        "data": {"source": "title"}, "steps": []
    });
    let err = parser.parse(&doc, None).unwrap_err();
    assert!(matches!(
        err,
        ScriptError::TypeMismatch {
            expected: "DataSource",
            ..
        }
    ));

    let doc = json!({
        "seleniumVersion": "2", "formatVersion": 2,
        "data": {"source": "broken"}, "steps": []
    });
    let err = parser.parse(&doc, None).unwrap_err();
    assert!(matches!(err, ScriptError::DataSourceFailed { ref source_name, .. } if source_name == "broken"));
}

#[test]
fn test_custom_variable_tokens() {
    let parser = parser().with_variable_tokens("[[", "]]").unwrap();
    let doc = json!({
        "seleniumVersion": "2",
        "formatVersion": 2,
        "data": {"source": "layered"},
        "steps": [{"type": "get", "url": "[[y]]/${x}"}]
    });

    let script = parser.parse_script(&doc, None).unwrap();
    assert_eq!(script.steps()[0].string_param("url"), Some("3/${x}"));

    assert!(matches!(
        parser.with_variable_tokens("", "]]"),
        Err(ScriptError::InvalidConfig(_))
    ));
}

#[test]
fn test_parse_file_names_script_and_resolves_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let doc = json!({
        "seleniumVersion": "2",
        "formatVersion": 1,
        "data": {"source": "where"},
        "steps": [{"type": "get", "url": "file://${dir}"}]
    });
    let path = write_json(dir.path(), "login.json", &doc);

    let scripts = parser().parse_file(&path).unwrap();
    let script = &scripts[0];
    assert_eq!(script.name(), Some(path.display().to_string().as_str()));
    assert_eq!(
        script.steps()[0].string_param("url"),
        Some(format!("file://{}", dir.path().display()).as_str())
    );
}

#[test]
fn test_parse_script_signals_suite() {
    let parser = parser();
    let doc = fixtures::suite_doc(&["a.json", "b.json"], false);

    let err = parser.parse_script(&doc, None).unwrap_err();
    match err {
        ScriptError::SuiteDetected { paths } => assert_eq!(paths, vec!["a.json", "b.json"]),
        other => panic!("expected suite signal, got {}", other),
    }

    match parser.parse_document(&doc, None).unwrap() {
        Document::Suite(suite) => assert_eq!(suite.entries.len(), 2),
        Document::Script(_) => panic!("suite parsed as script"),
    }
}
