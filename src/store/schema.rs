use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::models::{CreateFieldRequest, FieldDefinition, FieldType, SchemaVersion, UpdateFieldRequest};

/// The only schema name this service manages.
pub const SCHEMA_NAME: &str = "expense";

#[derive(FromRow)]
struct FieldRow {
    key: String,
    label: String,
    field_type: String,
    required: bool,
    enabled: bool,
    description: Option<String>,
    enum_values: Option<String>,
}

impl FieldRow {
    fn into_definition(self) -> AppResult<FieldDefinition> {
        let field_type = FieldType::parse(&self.field_type).ok_or_else(|| {
            AppError::Internal(format!("unknown field type stored for {}", self.key))
        })?;
        let enum_values = self
            .enum_values
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        Ok(FieldDefinition {
            key: self.key,
            label: self.label,
            field_type,
            required: self.required,
            enabled: self.enabled,
            description: self.description,
            enum_values,
        })
    }
}

/// All field definitions, enabled or not, in insertion order.
pub async fn list_fields(db: &Database) -> AppResult<Vec<FieldDefinition>> {
    let rows: Vec<FieldRow> = sqlx::query_as(
        "SELECT key, label, type AS field_type, required, enabled, description, enum_values
         FROM schema_fields ORDER BY rowid",
    )
    .fetch_all(db)
    .await?;
    rows.into_iter().map(FieldRow::into_definition).collect()
}

pub async fn get_field(db: &Database, key: &str) -> AppResult<Option<FieldDefinition>> {
    let row: Option<FieldRow> = sqlx::query_as(
        "SELECT key, label, type AS field_type, required, enabled, description, enum_values
         FROM schema_fields WHERE key = ?",
    )
    .bind(key)
    .fetch_optional(db)
    .await?;
    row.map(FieldRow::into_definition).transpose()
}

/// Insert a new field definition and bump the schema version. The key must
/// not exist yet, regardless of enabled state.
pub async fn create_field(db: &Database, req: CreateFieldRequest) -> AppResult<()> {
    let existing: Option<String> = sqlx::query_scalar("SELECT key FROM schema_fields WHERE key = ?")
        .bind(&req.key)
        .fetch_optional(db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Field key already exists".to_string()));
    }

    let enum_values = req
        .enum_values
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    sqlx::query(
        "INSERT INTO schema_fields (key, label, type, required, enabled, description, enum_values)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&req.key)
    .bind(&req.label)
    .bind(req.field_type.as_str())
    .bind(req.required)
    .bind(req.enabled)
    .bind(&req.description)
    .bind(enum_values)
    .execute(db)
    .await?;

    bump_version(db).await?;
    Ok(())
}

/// Apply a partial update. Attributes absent from the request keep their
/// current value. An empty change set succeeds without bumping the version.
pub async fn update_field(
    db: &Database,
    key: &str,
    changes: UpdateFieldRequest,
) -> AppResult<()> {
    let existing = get_field(db, key)
        .await?
        .ok_or_else(|| AppError::NotFound("Field not found".to_string()))?;

    if changes.is_empty() {
        return Ok(());
    }

    let label = changes.label.unwrap_or(existing.label);
    let field_type = changes.field_type.unwrap_or(existing.field_type);
    let required = changes.required.unwrap_or(existing.required);
    let enabled = changes.enabled.unwrap_or(existing.enabled);
    let description = changes.description.or(existing.description);
    let enum_values = changes
        .enum_values
        .or(existing.enum_values)
        .map(|v| serde_json::to_string(&v))
        .transpose()?;

    sqlx::query(
        "UPDATE schema_fields
         SET label = ?, type = ?, required = ?, enabled = ?, description = ?, enum_values = ?
         WHERE key = ?",
    )
    .bind(label)
    .bind(field_type.as_str())
    .bind(required)
    .bind(enabled)
    .bind(description)
    .bind(enum_values)
    .bind(key)
    .execute(db)
    .await?;

    bump_version(db).await?;
    Ok(())
}

/// Soft delete disables the field; hard delete removes the row (the key
/// becomes reusable, which existing records may still reference).
pub async fn delete_field(db: &Database, key: &str, hard: bool) -> AppResult<()> {
    let existing: Option<String> = sqlx::query_scalar("SELECT key FROM schema_fields WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;
    if existing.is_none() {
        return Err(AppError::NotFound("Field not found".to_string()));
    }

    if hard {
        sqlx::query("DELETE FROM schema_fields WHERE key = ?")
            .bind(key)
            .execute(db)
            .await?;
    } else {
        sqlx::query("UPDATE schema_fields SET enabled = 0 WHERE key = ?")
            .bind(key)
            .execute(db)
            .await?;
    }

    bump_version(db).await?;
    Ok(())
}

/// Next version identifier: `<date>.<counter>`, with the counter restarting
/// at 1 on a new UTC day. An unparseable counter suffix resets to 1 instead
/// of surfacing an error.
pub fn next_version(previous: Option<&str>, today: NaiveDate) -> String {
    let today = today.format("%Y-%m-%d").to_string();
    match previous {
        Some(prev) if prev.starts_with(&today) => {
            match prev.rsplit('.').next().and_then(|n| n.parse::<u64>().ok()) {
                Some(n) => format!("{today}.{}", n + 1),
                None => format!("{today}.1"),
            }
        }
        _ => format!("{today}.1"),
    }
}

pub async fn bump_version(db: &Database) -> AppResult<SchemaVersion> {
    let previous: Option<String> =
        sqlx::query_scalar("SELECT version FROM schema_meta WHERE name = ?")
            .bind(SCHEMA_NAME)
            .fetch_optional(db)
            .await?;

    let version = next_version(previous.as_deref(), Utc::now().date_naive());
    let updated_at = Utc::now();

    sqlx::query(
        "INSERT INTO schema_meta (name, version, updated_at) VALUES (?, ?, ?)
         ON CONFLICT(name) DO UPDATE SET version = excluded.version, updated_at = excluded.updated_at",
    )
    .bind(SCHEMA_NAME)
    .bind(&version)
    .bind(updated_at)
    .execute(db)
    .await?;

    Ok(SchemaVersion { version, updated_at })
}

/// Stored version, bootstrapping the row with a first bump when none exists.
pub async fn current_version(db: &Database) -> AppResult<SchemaVersion> {
    let row: Option<(String, DateTime<Utc>)> =
        sqlx::query_as("SELECT version, updated_at FROM schema_meta WHERE name = ?")
            .bind(SCHEMA_NAME)
            .fetch_optional(db)
            .await?;

    match row {
        Some((version, updated_at)) => Ok(SchemaVersion { version, updated_at }),
        None => bump_version(db).await,
    }
}
