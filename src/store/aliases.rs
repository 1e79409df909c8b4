use chrono::Utc;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Alias, AliasFilters, AliasKind};

fn new_alias_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("al_{}", &hex[..16])
}

/// Insert a new alias, lowercasing the alias text. The `(kind, alias)`
/// uniqueness pre-check and the insert are two separate statements; no unique
/// index backs them up.
pub async fn create(
    db: &Database,
    kind: AliasKind,
    alias: &str,
    value: &str,
) -> AppResult<Alias> {
    let normalized = alias.to_lowercase();

    let existing: Option<String> =
        sqlx::query_scalar("SELECT id FROM aliases WHERE kind = ? AND alias = ?")
            .bind(kind.as_str())
            .bind(&normalized)
            .fetch_optional(db)
            .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Alias already exists".to_string()));
    }

    let id = new_alias_id();
    let created_at = Utc::now();
    sqlx::query("INSERT INTO aliases (id, kind, alias, value, created_at) VALUES (?, ?, ?, ?, ?)")
        .bind(&id)
        .bind(kind.as_str())
        .bind(&normalized)
        .bind(value)
        .bind(created_at)
        .execute(db)
        .await?;

    Ok(Alias {
        id,
        kind: kind.as_str().to_string(),
        alias: normalized,
        value: value.to_string(),
        created_at,
    })
}

/// Newest-first listing; limit bounds the fetch, filters apply in memory.
pub async fn list(db: &Database, filters: &AliasFilters) -> AppResult<Vec<Alias>> {
    let rows: Vec<Alias> = sqlx::query_as(
        "SELECT id, kind, alias, value, created_at FROM aliases ORDER BY created_at DESC LIMIT ?",
    )
    .bind(filters.limit.clamp(1, 200))
    .fetch_all(db)
    .await?;

    Ok(rows
        .into_iter()
        .filter(|alias| matches_filters(alias, filters))
        .collect())
}

fn matches_filters(alias: &Alias, filters: &AliasFilters) -> bool {
    if filters.kind.as_ref().is_some_and(|kind| *kind != alias.kind) {
        return false;
    }
    if filters
        .alias
        .as_ref()
        .is_some_and(|a| !alias.alias.contains(&a.to_lowercase()))
    {
        return false;
    }
    if filters
        .value
        .as_ref()
        .is_some_and(|v| !alias.value.to_lowercase().contains(&v.to_lowercase()))
    {
        return false;
    }
    true
}

pub async fn delete(db: &Database, id: &str) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM aliases WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Not found".to_string()));
    }
    Ok(())
}
