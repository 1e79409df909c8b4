use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::error::AppResult;
use crate::store;

pub type Database = Pool<Sqlite>;

pub async fn create_database_pool(database_url: &str) -> Result<Database, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    // Test the connection
    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    log::info!("Database connection established");
    Ok(pool)
}

/// Create the four collections if they do not exist yet, then seed the
/// default expense schema on a fresh database.
pub async fn init_db(db: &Database) -> AppResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_meta (
            name TEXT PRIMARY KEY,
            version TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(db)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_fields (
            key TEXT PRIMARY KEY,
            label TEXT NOT NULL,
            type TEXT NOT NULL,
            required INTEGER NOT NULL DEFAULT 0,
            enabled INTEGER NOT NULL DEFAULT 1,
            description TEXT,
            enum_values TEXT
        )",
    )
    .execute(db)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS expenses (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            schema_version TEXT NOT NULL,
            data TEXT NOT NULL
        )",
    )
    .execute(db)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS aliases (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            alias TEXT NOT NULL,
            value TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
    )
    .execute(db)
    .await?;

    // Lookup index only; uniqueness of (kind, alias) is a write-time pre-check
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_aliases_kind_alias ON aliases (kind, alias)")
        .execute(db)
        .await?;

    seed_schema_if_empty(db).await
}

async fn seed_schema_if_empty(db: &Database) -> AppResult<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_fields")
        .fetch_one(db)
        .await?;
    if count > 0 {
        return Ok(());
    }

    // (key, label, type, required, description, enum_values)
    let fields: [(&str, &str, &str, bool, &str, Option<&str>); 10] = [
        ("date", "Date", "date", true, "Expense date", None),
        ("amount", "Amount", "number", true, "Total amount", None),
        ("currency", "Currency", "enum", true, "Currency code", Some(r#"["ARS","USD"]"#)),
        ("vendor", "Vendor", "string", false, "Vendor / merchant", None),
        ("category", "Category", "string", false, "Main category", None),
        ("payment_method", "Payment method", "string", false, "Cash / card / etc.", None),
        ("client", "Client", "string", false, "Client (if billable)", None),
        ("concept", "Concept", "string", false, "Short description", None),
        ("notes", "Notes", "string", false, "Free-form notes", None),
        (
            "status",
            "Status",
            "enum",
            false,
            "pending_confirmation/confirmed/rejected",
            Some(r#"["pending_confirmation","confirmed","rejected"]"#),
        ),
    ];

    for (key, label, field_type, required, description, enum_values) in fields {
        sqlx::query(
            "INSERT INTO schema_fields (key, label, type, required, enabled, description, enum_values)
             VALUES (?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(key)
        .bind(label)
        .bind(field_type)
        .bind(required)
        .bind(description)
        .bind(enum_values)
        .execute(db)
        .await?;
    }

    store::schema::bump_version(db).await?;
    log::info!("Seeded default expense schema");
    Ok(())
}
