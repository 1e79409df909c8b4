use chrono::{NaiveDate, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::database::Database;
use crate::error::AppResult;
use crate::models::{ExpenseFilters, ExpenseRow};

fn new_expense_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("exp_{}", &hex[..16])
}

pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, 200)
}

/// Persist a validated document stamped with the given schema version.
/// Returns the generated id.
pub async fn insert(
    db: &Database,
    document: &Map<String, Value>,
    schema_version: &str,
) -> AppResult<String> {
    let id = new_expense_id();
    let now = Utc::now();
    let data = serde_json::to_string(document)?;

    sqlx::query(
        "INSERT INTO expenses (id, created_at, updated_at, schema_version, data)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(now)
    .bind(now)
    .bind(schema_version)
    .bind(data)
    .execute(db)
    .await?;

    Ok(id)
}

pub async fn get(db: &Database, id: &str) -> AppResult<Option<ExpenseRow>> {
    let row = sqlx::query_as::<_, ExpenseRow>(
        "SELECT id, created_at, updated_at, schema_version, data FROM expenses WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Overwrite the document of an existing expense, refreshing `updated_at`
/// and re-stamping the schema version.
pub async fn update(
    db: &Database,
    id: &str,
    document: &Map<String, Value>,
    schema_version: &str,
) -> AppResult<()> {
    let data = serde_json::to_string(document)?;
    sqlx::query("UPDATE expenses SET updated_at = ?, schema_version = ?, data = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(schema_version)
        .bind(data)
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

/// Newest-first listing. The limit bounds the rows fetched; the remaining
/// filters are applied in memory afterwards, so a heavily filtered page can
/// come back short.
pub async fn list(db: &Database, filters: &ExpenseFilters) -> AppResult<Vec<Value>> {
    let rows: Vec<ExpenseRow> = sqlx::query_as(
        "SELECT id, created_at, updated_at, schema_version, data
         FROM expenses ORDER BY created_at DESC LIMIT ?",
    )
    .bind(clamp_limit(filters.limit))
    .fetch_all(db)
    .await?;

    let mut items = Vec::new();
    for row in rows {
        let data: Map<String, Value> = serde_json::from_str(&row.data)?;
        if !matches_filters(&data, filters) {
            continue;
        }
        items.push(flatten(row, data));
    }
    Ok(items)
}

/// Envelope plus flattened document, the shape returned by reads.
pub fn into_document(row: ExpenseRow) -> AppResult<Value> {
    let data: Map<String, Value> = serde_json::from_str(&row.data)?;
    Ok(flatten(row, data))
}

fn flatten(row: ExpenseRow, data: Map<String, Value>) -> Value {
    let mut doc = Map::new();
    doc.insert("id".to_string(), Value::String(row.id));
    doc.insert(
        "created_at".to_string(),
        Value::String(row.created_at.to_rfc3339()),
    );
    doc.insert(
        "updated_at".to_string(),
        Value::String(row.updated_at.to_rfc3339()),
    );
    doc.insert(
        "schema_version".to_string(),
        Value::String(row.schema_version),
    );
    doc.extend(data);
    Value::Object(doc)
}

fn matches_filters(data: &Map<String, Value>, filters: &ExpenseFilters) -> bool {
    if filters.from_date.is_some() || filters.to_date.is_some() {
        // records without a readable date never match a date-bounded query
        let Some(date) = data
            .get("date")
            .and_then(Value::as_str)
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        else {
            return false;
        };
        if filters.from_date.is_some_and(|from| date < from) {
            return false;
        }
        if filters.to_date.is_some_and(|to| date > to) {
            return false;
        }
    }

    let exact = [
        (&filters.vendor, "vendor"),
        (&filters.client, "client"),
        (&filters.category, "category"),
        (&filters.status, "status"),
    ];
    for (wanted, key) in exact {
        if let Some(wanted) = wanted {
            let actual = data.get(key).and_then(Value::as_str).unwrap_or("");
            if actual.to_lowercase() != wanted.to_lowercase() {
                return false;
            }
        }
    }

    if let Some(q) = &filters.q {
        let blob = Value::Object(data.clone()).to_string().to_lowercase();
        if !blob.contains(&q.to_lowercase()) {
            return false;
        }
    }

    true
}
