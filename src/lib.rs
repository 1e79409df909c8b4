pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod store;
pub mod validation;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use database::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Shared secret checked against the `X-API-Key` header. `None` disables
    /// authentication entirely.
    pub api_key: Option<String>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Schema routes
        .route("/schema/expense", get(handlers::schema::get_schema))
        .route("/schema/expense/fields", post(handlers::schema::create_field))
        .route("/schema/expense/fields/:key", patch(handlers::schema::update_field))
        .route("/schema/expense/fields/:key", delete(handlers::schema::delete_field))
        // Expense routes
        .route("/expenses", post(handlers::expenses::create_expense))
        .route("/expenses", get(handlers::expenses::list_expenses))
        .route("/expenses/:id", get(handlers::expenses::get_expense))
        .route("/expenses/:id", patch(handlers::expenses::update_expense))
        // Alias routes
        .route("/aliases", post(handlers::aliases::create_alias))
        .route("/aliases", get(handlers::aliases::list_aliases))
        .route("/aliases/:id", delete(handlers::aliases::delete_alias))
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
