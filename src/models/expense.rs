use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

/// Full document accepted on expense creation. `date`, `amount` and
/// `currency` are mandatory at this transport layer; everything else flows
/// into the stored document as-is, including the open `extra` bag.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExpenseInput {
    pub date: NaiveDate,
    pub amount: f64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Map<String, Value>>,
}

impl ExpenseInput {
    pub fn into_document(self) -> serde_json::Result<Map<String, Value>> {
        let value = serde_json::to_value(self)?;
        Ok(value.as_object().cloned().unwrap_or_default())
    }
}

/// Fully partial variant of [`ExpenseInput`] used by expense updates. Only
/// keys carrying a non-null value take part in the merge.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ExpensePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Map<String, Value>>,
}

impl ExpensePatch {
    pub fn into_document(self) -> serde_json::Result<Map<String, Value>> {
        let value = serde_json::to_value(self)?;
        Ok(value.as_object().cloned().unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateExpenseRequest {
    pub status: Option<String>,
    pub data: Option<ExpensePatch>,
}

#[derive(Debug, Deserialize)]
pub struct ExpenseFilters {
    #[serde(rename = "from")]
    pub from_date: Option<NaiveDate>,
    #[serde(rename = "to")]
    pub to_date: Option<NaiveDate>,
    pub vendor: Option<String>,
    pub client: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub q: Option<String>,
    /// Accepted but ignored; pagination is not implemented.
    pub cursor: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

/// Persisted expense row: fixed envelope plus the JSON-serialized open body.
#[derive(Debug, FromRow)]
pub struct ExpenseRow {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub schema_version: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct CreateExpenseResponse {
    pub id: String,
    pub status: String,
    pub stored: bool,
}

#[derive(Debug, Serialize)]
pub struct ExpenseListResponse {
    pub items: Vec<Value>,
    pub next_cursor: Option<String>,
}
