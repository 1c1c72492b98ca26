mod helpers;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

use helpers::{FakeRunner, body_json, test_app};

const COLES_MILK: &str = r#"
    <html><head><title>Coles Full Cream Milk 2L | Coles</title></head><body>
      <h1 data-testid="product-title">Coles Full Cream Milk 2L</h1>
      <span data-testid="badge">Special</span>
      <span data-testid="pricing">$3.10</span>
      <span data-testid="was-price">Was $3.60</span>
    </body></html>
"#;

const COLES_EGG_SEARCH: &str = r#"
    <html><head><title>Search | Coles</title></head><body>
      <section data-testid="product-tile">
        <h2 class="product__title">Coles Egg Noodles 400g</h2>
        <span data-testid="pricing">$2.00</span>
      </section>
      <section data-testid="product-tile">
        <h2 class="product__title">Coles Free Range Eggs 12pk</h2>
        <span data-testid="pricing">$6.50</span>
      </section>
    </body></html>
"#;

const WOOLWORTHS_MILK: &str = r#"
    <html><head><title>Woolworths Full Cream Milk 2L</title></head><body>
      <h1 class="product-title_component">Woolworths Full Cream Milk 2L</h1>
      <span data-testid="product-price">$3.20</span>
    </body></html>
"#;

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_bytes(body.as_bytes())
        .insert_header("Content-Type", "text/html; charset=utf-8")
}

async fn mount_store_pages(server: &MockServer, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path("/coles/product/milk"))
        .respond_with(html(COLES_MILK))
        .expect(expected_hits)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/coles/search"))
        .and(query_param("q", "free range eggs"))
        .respond_with(html(COLES_EGG_SEARCH))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/woolworths/product/milk"))
        .respond_with(html(WOOLWORTHS_MILK))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/woolworths/product/eggs"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> axum::response::Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

#[tokio::test]
async fn test_get_prices_scrapes_then_serves_cache() {
    let server = MockServer::start().await;
    mount_store_pages(&server, 1).await;
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&server.uri(), dir.path(), Arc::default()).await;

    let response = send(&app, "GET", "/api/prices", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let prices: Value = body_json(response).await;

    assert_eq!(prices["report"]["method"], "automatic");
    assert_eq!(prices["report"]["items_scraped"], 3);

    let milk = &prices["stores"]["coles"]["milk"];
    assert_eq!(milk["price"], 3.60);
    assert_eq!(milk["special"], true);
    assert_eq!(milk["special_price"], 3.10);
    assert_eq!(milk["special_type"], "Special");
    assert_eq!(milk["source"], "scraped");

    let eggs = &prices["stores"]["coles"]["eggs"];
    assert_eq!(eggs["price"], 6.50);
    assert_eq!(eggs["found_name"], "Coles Free Range Eggs 12pk");

    assert_eq!(prices["stores"]["woolworths"]["milk"]["price"], 3.20);
    assert!(prices["stores"]["woolworths"].get("eggs").is_none());
    assert_eq!(prices["report"]["stores"]["woolworths"]["failed"], 1);

    // Fresh cache: no second fetch of the Coles milk page.
    let response = send(&app, "GET", "/api/prices", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let again: Value = body_json(response).await;
    assert_eq!(again["timestamp"], prices["timestamp"]);

    let response = send(&app, "GET", "/api/prices/status", None).await;
    let status: Value = body_json(response).await;
    assert_eq!(status["status"], "ok");
    assert_eq!(status["item_counts"]["coles"], 2);
    assert_eq!(status["item_counts"]["woolworths"], 1);
    assert_eq!(status["is_manual"], false);
    assert!(dir.path().join("prices.json").exists());
}

#[tokio::test]
async fn test_refresh_always_scrapes() {
    let server = MockServer::start().await;
    mount_store_pages(&server, 2).await;
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&server.uri(), dir.path(), Arc::default()).await;

    let response = send(&app, "GET", "/api/prices", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = send(&app, "POST", "/api/prices/refresh", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let prices: Value = body_json(response).await;
    assert_eq!(prices["report"]["method"], "automatic");
}

#[tokio::test]
async fn test_blocked_store_skips_remaining_products() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/coles/product/milk"))
        .respond_with(html(COLES_MILK))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/woolworths/product/milk"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/woolworths/product/eggs"))
        .respond_with(html(WOOLWORTHS_MILK))
        .expect(0)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&server.uri(), dir.path(), Arc::default()).await;

    let response = send(&app, "GET", "/api/prices", None).await;
    let prices: Value = body_json(response).await;
    assert_eq!(prices["report"]["method"], "automatic");
    assert_eq!(prices["report"]["stores"]["woolworths"]["blocked"], true);
    assert_eq!(prices["report"]["stores"]["woolworths"]["skipped"], 1);

    let response = send(&app, "GET", "/api/prices/status", None).await;
    let status: Value = body_json(response).await;
    assert!(status["blocked"].get("woolworths").is_some());
    assert!(status["blocked"].get("coles").is_none());
}

#[tokio::test]
async fn test_unreachable_stores_fall_back_to_placeholders() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&server.uri(), dir.path(), Arc::default()).await;

    let response = send(&app, "GET", "/api/prices", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let prices: Value = body_json(response).await;

    assert_eq!(prices["report"]["method"], "placeholder");
    assert_eq!(prices["report"]["items_scraped"], 0);
    assert_eq!(prices["stores"]["coles"]["eggs"]["price"], 6.50);
    assert_eq!(prices["stores"]["woolworths"]["eggs"]["price"], 6.20);
    assert_eq!(prices["stores"]["woolworths"]["eggs"]["source"], "placeholder");
}

#[tokio::test]
async fn test_status_without_data() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&server.uri(), dir.path(), Arc::default()).await;

    let response = send(&app, "GET", "/api/prices/status", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let status: Value = body_json(response).await;
    assert_eq!(status["status"], "no_data");
    assert_eq!(status["last_update"], Value::Null);
    assert_eq!(status["item_counts"]["coles"], 0);
}

#[tokio::test]
async fn test_manual_prices_survive_refresh_until_cleared() {
    let server = MockServer::start().await;
    mount_store_pages(&server, 1).await;
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&server.uri(), dir.path(), Arc::default()).await;

    let manual = json!({
        "woolworths": { "eggs": { "price": 7.00, "special_price": 5.50 } }
    });
    let response = send(&app, "POST", "/api/prices/manual", Some(manual)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let saved: Value = body_json(response).await;
    assert_eq!(saved["status"], "saved");
    let eggs = &saved["prices"]["stores"]["woolworths"]["eggs"];
    assert_eq!(eggs["source"], "manual");
    assert_eq!(eggs["name"], "Free Range Eggs 12pk");
    assert_eq!(eggs["special"], true);

    let response = send(&app, "GET", "/api/prices/status", None).await;
    let status: Value = body_json(response).await;
    assert_eq!(status["is_manual"], true);
    assert_eq!(status["method"], "manual");

    let response = send(&app, "POST", "/api/prices/refresh", None).await;
    let refreshed: Value = body_json(response).await;
    assert_eq!(refreshed["stores"]["woolworths"]["eggs"]["source"], "manual");
    assert_eq!(refreshed["stores"]["coles"]["milk"]["source"], "scraped");

    let response = send(&app, "DELETE", "/api/prices/manual", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cleared: Value = body_json(response).await;
    assert_eq!(cleared["status"], "cleared");
    assert!(cleared["prices"]["stores"]["woolworths"].get("eggs").is_none());
    assert_eq!(cleared["prices"]["stores"]["coles"]["milk"]["source"], "scraped");
}

#[tokio::test]
async fn test_manual_prices_rejects_bad_input() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&server.uri(), dir.path(), Arc::default()).await;

    let cases = [
        json!({ "aldi": { "milk": { "price": 3.0 } } }),
        json!({ "coles": { "milk": { "price": 0.10 } } }),
        json!({ "coles": { "milk": { "price": 3.0, "special_price": 4.0 } } }),
        json!({}),
    ];
    for body in cases {
        let response = send(&app, "POST", "/api/prices/manual", Some(body.clone())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        let error: Value = body_json(response).await;
        assert!(error["error"].is_string());
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/prices/manual")
                .header("content-type", "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was written.
    assert!(!dir.path().join("prices.json").exists());
}

#[tokio::test]
async fn test_clear_manual_without_cache() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&server.uri(), dir.path(), Arc::default()).await;

    let response = send(&app, "DELETE", "/api/prices/manual", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cleared: Value = body_json(response).await;
    assert_eq!(cleared["prices"], Value::Null);
}

#[tokio::test]
async fn test_shopping_list_reports_each_line() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(FakeRunner {
        fail_on: Some("Saffron"),
        ..Default::default()
    });
    let app = test_app(&server.uri(), dir.path(), runner.clone()).await;

    let body = json!({
        "listName": "Groceries",
        "ingredients": [
            { "name": "Chicken Breast", "amount": 500, "unit": "g", "meals": ["Stir fry"] },
            { "name": "Saffron", "amount": 1, "unit": "pinch" }
        ]
    });
    let response = send(&app, "POST", "/api/shopping-list", Some(body)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let result: Value = body_json(response).await;

    assert_eq!(result["success"], true);
    assert_eq!(result["summary"]["total"], 2);
    assert_eq!(result["summary"]["successful"], 1);
    assert_eq!(result["summary"]["failed"], 1);
    assert_eq!(result["results"][1]["message"], "list not found");

    let calls = runner.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0][0], "add");
    assert!(calls[0].contains(&"Groceries".to_string()));
    assert!(calls[0].iter().any(|a| a.contains("Chicken Breast")));
}

#[tokio::test]
async fn test_shopping_list_requires_ingredients() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(FakeRunner::default());
    let app = test_app(&server.uri(), dir.path(), runner.clone()).await;

    let response = send(&app, "POST", "/api/shopping-list", Some(json!({ "ingredients": [] }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(runner.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_reminder_lists() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(FakeRunner {
        lists_stdout: "Groceries (12 items)\nWork (1 item)\n",
        ..Default::default()
    });
    let app = test_app(&server.uri(), dir.path(), runner).await;

    let response = send(&app, "GET", "/api/reminders/lists", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let lists: Value = body_json(response).await;
    assert_eq!(lists["success"], true);
    assert_eq!(lists["lists"][0]["name"], "Groceries");
    assert_eq!(lists["lists"][0]["itemCount"], 12);
    assert_eq!(lists["lists"][1]["name"], "Work");
}

#[tokio::test]
async fn test_reminder_lists_command_failure_is_server_error() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(FakeRunner {
        fail_on: Some("list-lists"),
        ..Default::default()
    });
    let app = test_app(&server.uri(), dir.path(), runner).await;

    let response = send(&app, "GET", "/api/reminders/lists", None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error: Value = body_json(response).await;
    assert!(error["error"].as_str().unwrap().contains("list not found"));
}

const COLES_SPECIALS_PAGE: &str = r#"
    <html><head><title>On Special | Coles</title></head><body>
      <article class="product-tile">
        <h3 class="product-title">Arnott's Tim Tam Original 200g</h3>
        <span class="price">$2.75</span>
      </article>
      <article class="product-tile">
        <h3 class="product-title">Coles Garlic Bread 450g</h3>
        <span class="price">$3.00</span>
      </article>
    </body></html>
"#;

const WOOLWORTHS_MILK_RESULTS: &str = r#"
    <html><body>
      <div class="result">
        <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.woolworths.com.au%2Fshop%2Fproductdetails%2F888">Woolworths Full Cream Milk 2L</a>
        <a class="result__snippet">Prices dropped! Now $2.80, was $3.20.</a>
      </div>
    </body></html>
"#;

#[tokio::test]
async fn test_specials_merge_listings_and_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/specials/coles"))
        .respond_with(html(COLES_SPECIALS_PAGE))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/specials/woolworths"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Full Cream Milk 2L woolworths"))
        .respond_with(html(WOOLWORTHS_MILK_RESULTS))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&server.uri(), dir.path(), Arc::default()).await;

    let response = send(&app, "GET", "/api/specials", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let specials: Value = body_json(response).await;
    assert_eq!(specials["success"], true);

    let data = &specials["data"];
    assert_eq!(data["source"], "web_scrape");
    assert_eq!(data["coles"]["Arnott's Tim Tam Original 200g"]["price"], 2.75);
    assert_eq!(data["coles"]["Coles Garlic Bread 450g"]["source"], "store_page");

    let milk = &data["woolworths"]["Full Cream Milk 2L"];
    assert_eq!(milk["price"], 2.80);
    assert_eq!(milk["special"], true);
    assert_eq!(milk["source"], "search");
    assert_eq!(milk["url"], "https://www.woolworths.com.au/shop/productdetails/888");

    // Woolworths listing blocked; three other searches found nothing served.
    let failures = data["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 4);
    assert!(failures.iter().any(|f| f["source"] == "woolworths specials"));

    // Specials never touch the price cache.
    assert!(!dir.path().join("prices.json").exists());
}

#[tokio::test]
async fn test_health_and_openapi() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&server.uri(), dir.path(), Arc::default()).await;

    let response = send(&app, "GET", "/healthz", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let health: Value = body_json(response).await;
    assert_eq!(health["status"], "OK");
    assert_eq!(health["cache"], "no_data");

    let response = send(&app, "GET", "/api/openapi.json", None).await;
    let doc: Value = body_json(response).await;
    assert!(doc["paths"]["/api/prices"].is_object());
    assert!(doc["paths"]["/api/prices/manual"]["post"]["requestBody"].is_object());
    assert!(doc["paths"]["/api/specials"]["get"].is_object());
}
