use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Closed set of value spaces an alias can normalize into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasKind {
    Vendor,
    Client,
    Category,
    Subcategory,
    PaymentMethod,
    Concept,
    Project,
    CostCenter,
}

impl AliasKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AliasKind::Vendor => "vendor",
            AliasKind::Client => "client",
            AliasKind::Category => "category",
            AliasKind::Subcategory => "subcategory",
            AliasKind::PaymentMethod => "payment_method",
            AliasKind::Concept => "concept",
            AliasKind::Project => "project",
            AliasKind::CostCenter => "cost_center",
        }
    }
}

/// Stored alias; `alias` is lowercased at write time.
#[derive(Debug, Serialize, FromRow)]
pub struct Alias {
    pub id: String,
    pub kind: String,
    pub alias: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAliasRequest {
    pub kind: AliasKind,
    pub alias: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct AliasFilters {
    pub kind: Option<String>,
    pub alias: Option<String>,
    pub value: Option<String>,
    pub cursor: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Serialize)]
pub struct AliasListResponse {
    pub items: Vec<Alias>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteAliasResponse {
    pub deleted: bool,
    pub id: String,
}
