//! Shape check for configuration blobs arriving from outside the editor
//! (imports, hand-edited records). Every branch is optional; only the types
//! of what is present are enforced.

use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

static CONFIG_BLOB_SCHEMA: Lazy<Value> = Lazy::new(|| {
    let visibility_node = json!({
        "anyOf": [
            { "type": "boolean" },
            { "type": "array", "items": { "type": ["boolean", "null"] } },
            { "type": "object", "additionalProperties": { "$ref": "#/definitions/visibilityNode" } }
        ]
    });

    json!({
        "type": "object",
        "definitions": {
            "visibilityNode": visibility_node,
            "color": { "type": "string", "minLength": 1 }
        },
        "properties": {
            "branding": {
                "type": "object",
                "properties": {
                    "showLogo": { "type": "boolean" },
                    "logoUrl": { "type": "string" },
                    "showCompanyName": { "type": "boolean" },
                    "customWelcomeMessage": { "type": "string" },
                    "companyDescription": { "type": "string" }
                }
            },
            "theme": {
                "type": "object",
                "properties": {
                    "primaryColor": { "$ref": "#/definitions/color" },
                    "backgroundColor": { "$ref": "#/definitions/color" },
                    "textColor": { "$ref": "#/definitions/color" }
                }
            },
            "layout": {
                "type": "object",
                "properties": {
                    "enableKPIs": { "type": "boolean" },
                    "enableCharts": { "type": "boolean" },
                    "enableActivity": { "type": "boolean" },
                    "enableQuickActions": { "type": "boolean" },
                    "enableTaskStats": { "type": "boolean" },
                    "enableProgressOverview": { "type": "boolean" },
                    "widgetVisibility": {
                        "type": "object",
                        "additionalProperties": { "$ref": "#/definitions/visibilityNode" }
                    }
                }
            },
            "kpis": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id", "title", "value", "type"],
                    "properties": {
                        "id": { "type": "string", "minLength": 1 },
                        "title": { "type": "string" },
                        "value": { "type": "string" },
                        "type": { "enum": ["number", "currency", "percentage", "text"] },
                        "description": { "type": ["string", "null"] }
                    }
                }
            },
            "announcements": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id", "title", "content", "type", "isActive", "createdAt"],
                    "properties": {
                        "id": { "type": "string", "minLength": 1 },
                        "title": { "type": "string" },
                        "content": { "type": "string" },
                        "type": { "enum": ["info", "success", "warning", "error"] },
                        "isActive": { "type": "boolean" },
                        "createdAt": { "type": "string", "format": "date-time" }
                    }
                }
            }
        }
    })
});

static COMPILED_CONFIG_BLOB_SCHEMA: Lazy<Result<JSONSchema, String>> = Lazy::new(|| {
    JSONSchema::compile(&CONFIG_BLOB_SCHEMA)
        .map_err(|error| format!("Failed to compile dashboard config schema: {}", error))
});

/// Returns one message per schema violation; empty means the blob is usable as-is.
pub fn validate_config_blob(blob: &Value) -> Vec<String> {
    let compiled = match COMPILED_CONFIG_BLOB_SCHEMA.as_ref() {
        Ok(compiled) => compiled,
        Err(error) => return vec![error.clone()],
    };

    let mut errors: Vec<String> = compiled
        .validate(blob)
        .err()
        .map(|errors| {
            errors
                .map(|error| {
                    let path = error.instance_path.to_string();
                    if path.is_empty() {
                        error.to_string()
                    } else {
                        format!("{}: {}", path, error)
                    }
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    errors.extend(duplicate_kpi_ids(blob));
    errors
}

fn duplicate_kpi_ids(blob: &Value) -> Vec<String> {
    let Some(kpis) = blob.get("kpis").and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut seen = std::collections::BTreeSet::new();
    kpis.iter()
        .filter_map(|kpi| kpi.get("id").and_then(Value::as_str))
        .filter(|id| !seen.insert(*id))
        .map(|id| format!("/kpis: duplicate KPI id '{}'", id))
        .collect()
}
