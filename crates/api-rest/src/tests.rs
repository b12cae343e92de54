use super::*;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use rentdesk_core::services::today;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    _dir: TempDir,
    app: Router,
}

impl TestApp {
    fn new(tokens: ApiTokens) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = Arc::new(CoreConfig::with_data_dir(dir.path().to_path_buf()));
        let store = Arc::new(Store::open(dir.path()).expect("open store"));
        Self {
            app: router(AppState::new(cfg, store, tokens)),
            _dir: dir,
        }
    }

    fn open() -> Self {
        Self::new(ApiTokens::default())
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();
        read(self.app.clone().oneshot(request).await.unwrap()).await
    }

    async fn post(&self, uri: &str, body: Value) -> Value {
        let (status, json) = self.send(Method::POST, uri, Some(body)).await;
        assert!(status.is_success(), "POST {uri} failed with {status}: {json}");
        json
    }
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn property_payload(name: &str) -> Value {
    json!({
        "name": name,
        "address": "12 Ngong Road",
        "city": "Nairobi",
        "property_type": "residential"
    })
}

#[tokio::test]
async fn health_is_open_even_with_tokens() {
    let app = TestApp::new(ApiTokens::new(["s3cret"]));
    let (status, json) = app.send(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
}

#[tokio::test]
async fn api_requires_configured_bearer_token() {
    let app = TestApp::new(ApiTokens::new(["s3cret"]));

    let (status, json) = app.send(Method::GET, "/api/v1/properties", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Unauthenticated.");

    let request = Request::builder()
        .uri("/api/v1/properties")
        .header(header::AUTHORIZATION, "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let (status, json) = read(app.app.clone().oneshot(request).await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["meta"]["total"], 0);
}

#[tokio::test]
async fn create_returns_201_and_record_is_readable() {
    let app = TestApp::open();

    let (status, created) = app
        .send(Method::POST, "/api/v1/properties", Some(property_payload("Riverside Court")))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Riverside Court");
    assert_eq!(created["property_type"], "residential");

    let id = created["id"].as_str().unwrap();
    let (status, fetched) = app
        .send(Method::GET, &format!("/api/v1/properties/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, page) = app.send(Method::GET, "/api/v1/properties?per_page=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["meta"]["total"], 1);
    assert_eq!(page["meta"]["per_page"], 10);
}

#[tokio::test]
async fn invalid_payload_returns_field_errors() {
    let app = TestApp::open();

    let (status, json) = app
        .send(Method::POST, "/api/v1/properties", Some(property_payload("   ")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["errors"]["name"].is_array());

    let (status, json) = app
        .send(Method::POST, "/api/v1/properties", Some(json!({"name": 5})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].is_string());
    assert!(json.get("errors").is_none());
}

#[tokio::test]
async fn unknown_and_malformed_ids() {
    let app = TestApp::open();

    let missing = rentdesk_core::RecordId::new();
    let (status, _) = app
        .send(Method::GET, &format!("/api/v1/tenants/{missing}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(Method::GET, "/api/v1/tenants/not-an-id", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rent_cycle_through_the_api() {
    let app = TestApp::open();

    let currency = app
        .post("/api/v1/currencies", json!({"code": "KES", "name": "Kenyan Shilling"}))
        .await;
    let rent_type = app.post("/api/v1/payment-types", json!({"name": "Rent"})).await;
    let cash = app.post("/api/v1/payment-modes", json!({"name": "Cash"})).await;
    let property = app.post("/api/v1/properties", property_payload("Riverside Court")).await;
    let unit = app
        .post(
            "/api/v1/rental-units",
            json!({
                "property_id": property["id"],
                "unit_number": "A1",
                "rent_amount": "25000",
                "currency_id": currency["id"]
            }),
        )
        .await;
    assert_eq!(unit["status"], "vacant");

    let tenant = app
        .post(
            "/api/v1/tenants",
            json!({
                "first_name": "Wanjiru",
                "last_name": "Kamau",
                "email": "wanjiru@example.com",
                "phone": "+254700000001"
            }),
        )
        .await;

    let unit_id = unit["id"].as_str().unwrap();
    let assigned = app
        .post(
            &format!("/api/v1/rental-units/{unit_id}/assign-tenant"),
            json!({"tenant_id": tenant["id"]}),
        )
        .await;
    assert_eq!(assigned["status"], "occupied");
    assert_eq!(assigned["tenant_id"], tenant["id"]);

    // Deleting an occupied unit is a conflict, not a validation error.
    let (status, _) = app
        .send(Method::DELETE, &format!("/api/v1/rental-units/{unit_id}"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let period = today().format("%Y-%m").to_string();
    let report = app
        .post("/api/v1/invoices/generate", json!({"period": period}))
        .await;
    assert_eq!(report["generated"].as_array().unwrap().len(), 1);
    let invoice = &report["generated"][0];
    assert_eq!(invoice["status"], "unpaid");

    let again = app
        .post("/api/v1/invoices/generate", json!({"period": period}))
        .await;
    assert!(again["generated"].as_array().unwrap().is_empty());
    assert_eq!(again["skipped"][0]["reason"], "already_invoiced");

    let payment = json!({
        "tenant_id": tenant["id"],
        "invoice_id": invoice["id"],
        "amount": "25000",
        "currency_id": currency["id"],
        "payment_type_id": rent_type["id"],
        "payment_mode_id": cash["id"]
    });
    app.post("/api/v1/payments", payment.clone()).await;

    let invoice_id = invoice["id"].as_str().unwrap();
    let (_, paid) = app
        .send(Method::GET, &format!("/api/v1/invoices/{invoice_id}"), None)
        .await;
    assert_eq!(paid["status"], "paid");

    let (status, json) = app.send(Method::POST, "/api/v1/payments", Some(payment)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["errors"]["amount"].is_array());

    let (status, summary) = app.send(Method::GET, "/api/v1/reports/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["units"]["occupied"], 1);
    assert_eq!(summary["active_tenants"], 1);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::open();
    let (status, json) = app.send(Method::GET, "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/api/v1/rental-units/{id}/assign-tenant"].is_object());
}
