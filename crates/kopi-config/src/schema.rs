use schemars::schema::{RootSchema, Schema};
use schemars::schema_for;
use serde_json::json;

use crate::KopiConfig;

/// JSON schema for `kopi.toml`, for editor TOML integrations and CI validation.
#[must_use]
pub fn json_schema() -> RootSchema {
    let mut schema = schema_for!(KopiConfig);
    apply_semantic_constraints(&mut schema);
    schema
}

fn apply_semantic_constraints(schema: &mut RootSchema) {
    // JSON Schema does not apply defaults, so this only fires when both keys are explicit.
    push_all_of(
        schema,
        schema_from_json(json!({
            "if": {
                "required": ["ranking"],
                "properties": {
                    "ranking": {
                        "required": ["auto_popup_on_identifier_part"],
                        "properties": {
                            "auto_popup_on_identifier_part": { "const": false }
                        }
                    }
                }
            },
            "then": {
                "properties": {
                    "ranking": {
                        "properties": {
                            "completion_triggers": { "type": "string", "minLength": 1 }
                        }
                    }
                }
            }
        })),
    );
}

fn schema_from_json(value: serde_json::Value) -> Schema {
    serde_json::from_value(value).unwrap_or(Schema::Bool(true))
}

fn push_all_of(schema: &mut RootSchema, extra: Schema) {
    schema
        .schema
        .subschemas()
        .all_of
        .get_or_insert_with(Vec::new)
        .push(extra);
}
