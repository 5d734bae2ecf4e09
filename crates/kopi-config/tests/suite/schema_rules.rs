use kopi_config::json_schema;

#[test]
fn json_schema_describes_match_modes() {
    let value = serde_json::to_value(json_schema()).expect("schema serializes");

    let mode = value
        .pointer("/definitions/MatchMode")
        .expect("MatchMode definition exists");
    let text = mode.to_string();
    for variant in ["prefix", "camel_case", "subsequence"] {
        assert!(text.contains(variant), "missing {variant} in {text}");
    }
}

#[test]
fn json_schema_requires_triggers_when_identifier_popup_is_off() {
    let value = serde_json::to_value(json_schema()).expect("schema serializes");

    let rules = value
        .pointer("/allOf")
        .and_then(|v| v.as_array())
        .expect("semantic constraints are attached");
    let trigger_rule = rules
        .iter()
        .find_map(|rule| rule.pointer("/then/properties/ranking/properties/completion_triggers"))
        .expect("completion_triggers rule exists");
    assert_eq!(trigger_rule.get("minLength").and_then(|v| v.as_u64()), Some(1));
}
