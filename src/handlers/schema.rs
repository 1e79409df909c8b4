use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;

use crate::error::AppError;
use crate::middleware::require_api_key;
use crate::models::{CreateFieldRequest, DeleteFieldQuery, SchemaResponse, UpdateFieldRequest};
use crate::store;
use crate::AppState;

/// Every mutation answers with the full schema, so clients always see the
/// resulting field set and version together.
async fn schema_response(state: &AppState) -> Result<SchemaResponse, AppError> {
    let version = store::schema::current_version(&state.db).await?;
    let fields = store::schema::list_fields(&state.db).await?;
    Ok(SchemaResponse {
        name: store::schema::SCHEMA_NAME.to_string(),
        version: version.version,
        updated_at: version.updated_at,
        fields,
    })
}

pub async fn get_schema(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SchemaResponse>, AppError> {
    require_api_key(state.api_key.as_deref(), &headers)?;
    Ok(Json(schema_response(&state).await?))
}

pub async fn create_field(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateFieldRequest>,
) -> Result<Json<SchemaResponse>, AppError> {
    require_api_key(state.api_key.as_deref(), &headers)?;
    store::schema::create_field(&state.db, req).await?;
    Ok(Json(schema_response(&state).await?))
}

pub async fn update_field(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateFieldRequest>,
) -> Result<Json<SchemaResponse>, AppError> {
    require_api_key(state.api_key.as_deref(), &headers)?;
    store::schema::update_field(&state.db, &key, req).await?;
    Ok(Json(schema_response(&state).await?))
}

pub async fn delete_field(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<DeleteFieldQuery>,
    headers: HeaderMap,
) -> Result<Json<SchemaResponse>, AppError> {
    require_api_key(state.api_key.as_deref(), &headers)?;
    store::schema::delete_field(&state.db, &key, query.hard).await?;
    Ok(Json(schema_response(&state).await?))
}
