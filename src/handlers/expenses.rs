use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::middleware::require_api_key;
use crate::models::{
    CreateExpenseResponse, ExpenseFilters, ExpenseInput, ExpenseListResponse, UpdateExpenseRequest,
};
use crate::store;
use crate::validation::validate_against_schema;
use crate::AppState;

pub async fn create_expense(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<ExpenseInput>,
) -> Result<Json<CreateExpenseResponse>, AppError> {
    require_api_key(state.api_key.as_deref(), &headers)?;

    let document = input.into_document()?;

    // The schema is re-read on every write; validation always runs against
    // the latest committed field set.
    let fields = store::schema::list_fields(&state.db).await?;
    validate_against_schema(&document, &fields)?;

    let version = store::schema::current_version(&state.db).await?;
    let id = store::expenses::insert(&state.db, &document, &version.version).await?;

    let status = document
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("confirmed")
        .to_string();
    Ok(Json(CreateExpenseResponse {
        id,
        status,
        stored: true,
    }))
}

pub async fn list_expenses(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(filters): Query<ExpenseFilters>,
) -> Result<Json<ExpenseListResponse>, AppError> {
    require_api_key(state.api_key.as_deref(), &headers)?;

    let items = store::expenses::list(&state.db, &filters).await?;
    // Pagination is not implemented; the cursor is accepted and ignored
    Ok(Json(ExpenseListResponse {
        items,
        next_cursor: None,
    }))
}

pub async fn get_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    require_api_key(state.api_key.as_deref(), &headers)?;

    let row = store::expenses::get(&state.db, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;
    Ok(Json(store::expenses::into_document(row)?))
}

pub async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateExpenseRequest>,
) -> Result<Json<Value>, AppError> {
    require_api_key(state.api_key.as_deref(), &headers)?;

    let row = store::expenses::get(&state.db, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;
    let mut data: Map<String, Value> = serde_json::from_str(&row.data)?;

    if let Some(patch) = req.data {
        // only non-null patch values overwrite; null never clears a key
        data.extend(patch.into_document()?);
    }
    if let Some(status) = req.status {
        // a status override wins over any status inside the data patch
        data.insert("status".to_string(), Value::String(status));
    }

    // The merged result must satisfy the schema as of this write
    let fields = store::schema::list_fields(&state.db).await?;
    validate_against_schema(&data, &fields)?;

    let version = store::schema::current_version(&state.db).await?;
    store::expenses::update(&state.db, &id, &data, &version.version).await?;

    let updated = store::expenses::get(&state.db, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;
    Ok(Json(store::expenses::into_document(updated)?))
}
