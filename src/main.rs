use std::env;

use dotenvy::dotenv;

use spendlog::database::{create_database_pool, init_db};
use spendlog::{create_router, AppState};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:app.db".to_string());

    let db = create_database_pool(&database_url)
        .await
        .expect("Failed to connect to database");

    init_db(&db).await.expect("Failed to initialize database");

    // A configured empty API_KEY turns authentication off
    let api_key = env::var("API_KEY").unwrap_or_else(|_| "dev-key".to_string());
    let api_key = (!api_key.is_empty()).then_some(api_key);
    if api_key.is_none() {
        log::warn!("API_KEY is empty, running without authentication");
    }

    let app = create_router(AppState { db, api_key });

    // Get port from environment or use default
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{}", port);

    println!("🚀 Spendlog server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
