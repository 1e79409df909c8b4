use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::models::{FieldDefinition, FieldType};

/// Check a candidate document against the schema's enabled fields.
///
/// Keys that are not part of the schema, or that belong to disabled fields,
/// pass through untouched. A JSON null counts as "no value" everywhere: it
/// fails a required check but is never matched against an enum list.
pub fn validate_against_schema(
    document: &Map<String, Value>,
    fields: &[FieldDefinition],
) -> AppResult<()> {
    for field in fields {
        if field.enabled && field.required {
            let missing = document.get(&field.key).map_or(true, Value::is_null);
            if missing {
                return Err(AppError::Validation(format!(
                    "Missing required field: {}",
                    field.key
                )));
            }
        }
    }

    for (key, value) in document {
        if value.is_null() {
            continue;
        }
        let Some(field) = fields.iter().find(|f| f.enabled && f.key == *key) else {
            continue;
        };
        if field.field_type != FieldType::Enum {
            continue;
        }
        // An empty or absent allowed-list means no constraint
        let allowed = match &field.enum_values {
            Some(values) if !values.is_empty() => values,
            _ => continue,
        };
        let is_member = value.as_str().is_some_and(|v| allowed.iter().any(|a| a == v));
        if !is_member {
            return Err(AppError::Validation(format!(
                "Invalid enum for {key}: {value}. Allowed: {allowed:?}"
            )));
        }
    }

    Ok(())
}
