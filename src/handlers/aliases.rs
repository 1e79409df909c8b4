use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;

use crate::error::AppError;
use crate::middleware::require_api_key;
use crate::models::{Alias, AliasFilters, AliasListResponse, CreateAliasRequest, DeleteAliasResponse};
use crate::store;
use crate::AppState;

pub async fn create_alias(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateAliasRequest>,
) -> Result<Json<Alias>, AppError> {
    require_api_key(state.api_key.as_deref(), &headers)?;

    let alias = store::aliases::create(&state.db, req.kind, &req.alias, &req.value).await?;
    Ok(Json(alias))
}

pub async fn list_aliases(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(filters): Query<AliasFilters>,
) -> Result<Json<AliasListResponse>, AppError> {
    require_api_key(state.api_key.as_deref(), &headers)?;

    let items = store::aliases::list(&state.db, &filters).await?;
    Ok(Json(AliasListResponse {
        items,
        next_cursor: None,
    }))
}

pub async fn delete_alias(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<DeleteAliasResponse>, AppError> {
    require_api_key(state.api_key.as_deref(), &headers)?;

    store::aliases::delete(&state.db, &id).await?;
    Ok(Json(DeleteAliasResponse { deleted: true, id }))
}
