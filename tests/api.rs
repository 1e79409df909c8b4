use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

use spendlog::database::init_db;
use spendlog::{create_router, AppState};

const API_KEY: &str = "test-key";

async fn test_app() -> Router {
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init_db(&db).await.unwrap();
    create_router(AppState {
        db,
        api_key: Some(API_KEY.to_string()),
    })
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-api-key", API_KEY);
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        // Transport-layer rejections (e.g. the Json extractor) reply with a
        // plain-text body; treat any non-JSON body as Null rather than panicking.
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn sample_expense() -> Value {
    json!({
        "date": "2024-05-20",
        "amount": 1250.5,
        "currency": "ARS",
        "vendor": "Acme Corp",
        "category": "office",
        "extra": {"foo": "bar"}
    })
}

#[tokio::test]
async fn requests_without_the_api_key_are_unauthorized() {
    let app = test_app().await;

    let request = Request::builder()
        .method("GET")
        .uri("/schema/expense")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["detail"], json!("Unauthorized"));
}

#[tokio::test]
async fn schema_endpoint_lists_the_seeded_fields() {
    let app = test_app().await;
    let (status, body) = send(&app, "GET", "/schema/expense", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], json!("expense"));
    assert!(body["version"].as_str().unwrap().ends_with(".1"));

    let fields = body["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 10);
    // insertion order is preserved
    assert_eq!(fields[0]["key"], json!("date"));
    assert_eq!(fields[1]["key"], json!("amount"));
    assert_eq!(fields[2]["key"], json!("currency"));
    assert_eq!(fields[2]["enum_values"], json!(["ARS", "USD"]));
}

#[tokio::test]
async fn creating_a_field_bumps_the_version_and_stamps_new_expenses() {
    let app = test_app().await;
    let (_, before) = send(&app, "GET", "/schema/expense", None).await;

    let (status, after) = send(
        &app,
        "POST",
        "/schema/expense/fields",
        Some(json!({"key": "cost_center", "label": "Cost center", "type": "string"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(before["version"], after["version"]);

    let (_, created) = send(&app, "POST", "/expenses", Some(sample_expense())).await;
    let id = created["id"].as_str().unwrap();
    let (_, expense) = send(&app, "GET", &format!("/expenses/{id}"), None).await;
    assert_eq!(expense["schema_version"], after["version"]);
}

#[tokio::test]
async fn duplicate_field_keys_conflict() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/schema/expense/fields",
        Some(json!({"key": "vendor", "label": "Vendor", "type": "string"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], json!("Field key already exists"));
}

#[tokio::test]
async fn patching_an_unknown_field_is_not_found() {
    let app = test_app().await;
    let (status, _) = send(
        &app,
        "PATCH",
        "/schema/expense/fields/nope",
        Some(json!({"label": "Nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_field_patch_does_not_bump_the_version() {
    let app = test_app().await;
    let (_, before) = send(&app, "GET", "/schema/expense", None).await;

    let (status, after) = send(
        &app,
        "PATCH",
        "/schema/expense/fields/vendor",
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(before["version"], after["version"]);
}

#[tokio::test]
async fn created_expenses_round_trip_including_the_extra_bag() {
    let app = test_app().await;
    let (status, created) = send(&app, "POST", "/expenses", Some(sample_expense())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["stored"], json!(true));
    // no explicit status falls back to confirmed
    assert_eq!(created["status"], json!("confirmed"));
    let id = created["id"].as_str().unwrap();
    assert!(id.starts_with("exp_"));

    let (status, expense) = send(&app, "GET", &format!("/expenses/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(expense["vendor"], json!("Acme Corp"));
    assert_eq!(expense["amount"], json!(1250.5));
    assert_eq!(expense["extra"]["foo"], json!("bar"));
    assert!(expense["schema_version"].as_str().is_some());
    assert!(expense["created_at"].as_str().is_some());
}

#[tokio::test]
async fn invalid_enum_values_are_rejected_with_the_allowed_set() {
    let app = test_app().await;
    let mut expense = sample_expense();
    expense["currency"] = json!("EUR");

    let (status, body) = send(&app, "POST", "/expenses", Some(expense)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("currency"));
    assert!(detail.contains("ARS"));
    assert!(detail.contains("USD"));
}

#[tokio::test]
async fn disabling_a_required_field_relaxes_validation() {
    let app = test_app().await;
    let (_, _) = send(
        &app,
        "POST",
        "/schema/expense/fields",
        Some(json!({"key": "project", "label": "Project", "type": "string", "required": true})),
    )
    .await;

    let (status, body) = send(&app, "POST", "/expenses", Some(sample_expense())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], json!("Missing required field: project"));

    // soft delete: the field drops out of validation
    let (status, _) = send(&app, "DELETE", "/schema/expense/fields/project", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "POST", "/expenses", Some(sample_expense())).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn hard_delete_removes_the_field_definition() {
    let app = test_app().await;
    let (status, after) = send(
        &app,
        "DELETE",
        "/schema/expense/fields/notes?hard=true",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let keys: Vec<&str> = after["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["key"].as_str().unwrap())
        .collect();
    assert!(!keys.contains(&"notes"));
}

#[tokio::test]
async fn expense_patch_merges_and_the_status_override_wins() {
    let app = test_app().await;
    let mut expense = sample_expense();
    expense["status"] = json!("pending_confirmation");
    let (_, created) = send(&app, "POST", "/expenses", Some(expense)).await;
    assert_eq!(created["status"], json!("pending_confirmation"));
    let id = created["id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/expenses/{id}"),
        Some(json!({
            "status": "confirmed",
            "data": {"vendor": null, "notes": "checked", "status": "rejected"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // null never clears an existing value
    assert_eq!(updated["vendor"], json!("Acme Corp"));
    assert_eq!(updated["notes"], json!("checked"));
    // the override is applied after the data merge
    assert_eq!(updated["status"], json!("confirmed"));
}

#[tokio::test]
async fn expense_updates_restamp_the_schema_version() {
    let app = test_app().await;
    let (_, created) = send(&app, "POST", "/expenses", Some(sample_expense())).await;
    let id = created["id"].as_str().unwrap().to_string();
    let (_, original) = send(&app, "GET", &format!("/expenses/{id}"), None).await;

    // structural schema change after creation
    let (_, schema) = send(
        &app,
        "POST",
        "/schema/expense/fields",
        Some(json!({"key": "approver", "label": "Approver", "type": "string"})),
    )
    .await;

    let (_, updated) = send(
        &app,
        "PATCH",
        &format!("/expenses/{id}"),
        Some(json!({"data": {"notes": "resubmitted"}})),
    )
    .await;
    assert_ne!(updated["schema_version"], original["schema_version"]);
    assert_eq!(updated["schema_version"], schema["version"]);
}

#[tokio::test]
async fn updates_validate_the_merged_document() {
    let app = test_app().await;
    let (_, created) = send(&app, "POST", "/expenses", Some(sample_expense())).await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/expenses/{id}"),
        Some(json!({"data": {"currency": "EUR"}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("currency"));
}

#[tokio::test]
async fn unknown_expense_ids_are_not_found() {
    let app = test_app().await;
    let (status, body) = send(&app, "GET", "/expenses/exp_missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], json!("Not found"));

    let (status, _) = send(
        &app,
        "PATCH",
        "/expenses/exp_missing",
        Some(json!({"status": "confirmed"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn expense_listing_filters_and_clamps() {
    let app = test_app().await;
    for (day, vendor) in [
        ("2024-05-18", "Acme Corp"),
        ("2024-05-19", "Globex"),
        ("2024-05-20", "Acme Corp"),
    ] {
        let mut expense = sample_expense();
        expense["date"] = json!(day);
        expense["vendor"] = json!(vendor);
        send(&app, "POST", "/expenses", Some(expense)).await;
    }

    let (status, body) = send(&app, "GET", "/expenses", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 3);
    assert_eq!(body["next_cursor"], Value::Null);

    let (_, by_vendor) = send(&app, "GET", "/expenses?vendor=acme%20corp", None).await;
    assert_eq!(by_vendor["items"].as_array().unwrap().len(), 2);

    let (_, ranged) = send(&app, "GET", "/expenses?from=2024-05-19&to=2024-05-19", None).await;
    assert_eq!(ranged["items"].as_array().unwrap().len(), 1);
    assert_eq!(ranged["items"][0]["vendor"], json!("Globex"));

    let (_, by_text) = send(&app, "GET", "/expenses?q=globex", None).await;
    assert_eq!(by_text["items"].as_array().unwrap().len(), 1);

    // limit=0 clamps to a single row, applied before the filters
    let (_, clamped) = send(&app, "GET", "/expenses?limit=0", None).await;
    assert_eq!(clamped["items"].as_array().unwrap().len(), 1);

    // oversized limits are accepted and clamped server-side
    let (status, _) = send(&app, "GET", "/expenses?limit=500", None).await;
    assert_eq!(status, StatusCode::OK);

    // cursors are accepted and ignored
    let (status, paged) = send(&app, "GET", "/expenses?cursor=abc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paged["next_cursor"], Value::Null);
}

#[tokio::test]
async fn alias_lifecycle_with_duplicate_detection() {
    let app = test_app().await;
    let (status, created) = send(
        &app,
        "POST",
        "/aliases",
        Some(json!({"kind": "vendor", "alias": "Café Martinez", "value": "Cafe Martinez SA"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["alias"], json!("café martinez"));
    let id = created["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("al_"));

    let (status, body) = send(
        &app,
        "POST",
        "/aliases",
        Some(json!({"kind": "vendor", "alias": "café martinez", "value": "Cafe Martinez SA"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], json!("Alias already exists"));

    let (_, listed) = send(&app, "GET", "/aliases?kind=vendor&alias=martinez", None).await;
    assert_eq!(listed["items"].as_array().unwrap().len(), 1);

    let (status, deleted) = send(&app, "DELETE", &format!("/aliases/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["deleted"], json!(true));

    let (status, _) = send(&app, "DELETE", &format!("/aliases/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn expenses_missing_the_mandatory_trio_are_rejected_upfront() {
    let app = test_app().await;
    // `date` is enforced by the request shape, before schema validation runs
    let (status, _) = send(
        &app,
        "POST",
        "/expenses",
        Some(json!({"amount": 10, "currency": "ARS"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_alias_kinds_are_rejected_by_the_transport_layer() {
    let app = test_app().await;
    let (status, _) = send(
        &app,
        "POST",
        "/aliases",
        Some(json!({"kind": "planet", "alias": "mars", "value": "Mars"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
