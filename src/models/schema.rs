use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Date,
    Datetime,
    Enum,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Enum => "enum",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "string" => Some(FieldType::String),
            "number" => Some(FieldType::Number),
            "integer" => Some(FieldType::Integer),
            "boolean" => Some(FieldType::Boolean),
            "date" => Some(FieldType::Date),
            "datetime" => Some(FieldType::Datetime),
            "enum" => Some(FieldType::Enum),
            _ => None,
        }
    }
}

/// One schema field. `required` is only enforced while `enabled` is true;
/// disabled fields keep their row (and key) but drop out of validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub enabled: bool,
    pub description: Option<String>,
    pub enum_values: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct SchemaVersion {
    pub version: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateFieldRequest {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub description: Option<String>,
    pub enum_values: Option<Vec<String>>,
}

fn default_enabled() -> bool {
    true
}

/// Partial field update. Attributes left out (or sent as null) are untouched;
/// there is no way to unset an attribute through this shape.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateFieldRequest {
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub field_type: Option<FieldType>,
    pub required: Option<bool>,
    pub enabled: Option<bool>,
    pub description: Option<String>,
    pub enum_values: Option<Vec<String>>,
}

impl UpdateFieldRequest {
    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.field_type.is_none()
            && self.required.is_none()
            && self.enabled.is_none()
            && self.description.is_none()
            && self.enum_values.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteFieldQuery {
    #[serde(default)]
    pub hard: bool,
}

#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub name: String,
    pub version: String,
    pub updated_at: DateTime<Utc>,
    pub fields: Vec<FieldDefinition>,
}
