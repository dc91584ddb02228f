//! End-to-end order flow through the HTTP surface: register both roles,
//! build a menu, place an order, walk the status machine.
//!
//! DB-backed test. Skips if ODK_DATABASE_URL is not set.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use odk_daemon::{routes, state};
use tower::ServiceExt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn make_router() -> Option<axum::Router> {
    let url = match std::env::var(odk_db::ENV_DB_URL) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("SKIP: ODK_DATABASE_URL not set");
            return None;
        }
    };
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .expect("connect");
    odk_db::migrate(&pool).await.expect("migrate");
    let st = Arc::new(state::AppState::new(pool, odk_config::AppConfig::default()));
    Some(routes::build_router(st))
}

async fn call(
    router: &axum::Router,
    req: Request<axum::body::Body>,
) -> (StatusCode, serde_json::Value) {
    let resp = router.clone().oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).expect("body is not valid JSON")
    };
    (status, json)
}

fn json_req(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<axum::body::Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    }
}

/// Register + login; returns (token, profile_id).
async fn signup(router: &axum::Router, role: &str) -> (String, String) {
    let email = format!("{role}-{}@example.com", Uuid::new_v4().simple());
    let (status, reg) = call(
        router,
        json_req(
            "POST",
            "/v1/auth/register",
            None,
            Some(serde_json::json!({
                "email": email,
                "password": "hunter22hunter22",
                "role": role,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register: {reg}");
    let profile_id = reg["profile_id"].as_str().unwrap().to_string();

    let (status, login) = call(
        router,
        json_req(
            "POST",
            "/v1/auth/login",
            None,
            Some(serde_json::json!({
                "email": email,
                "password": "hunter22hunter22",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login: {login}");
    (login["token"].as_str().unwrap().to_string(), profile_id)
}

async fn add_menu_item(router: &axum::Router, token: &str, price: &str) -> String {
    let (status, item) = call(
        router,
        json_req(
            "POST",
            "/v1/menu/items",
            Some(token),
            Some(serde_json::json!({
                "name": format!("dish-{}", Uuid::new_v4().simple()),
                "price": price,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "menu item: {item}");
    item["menu_item_id"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// The full lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn order_lifecycle_end_to_end() {
    let Some(router) = make_router().await else { return };

    let (resto_token, resto_profile) = signup(&router, "restaurant").await;
    let (diner_token, _) = signup(&router, "customer").await;

    // whoami reflects the explicit role.
    let (status, who) = call(
        &router,
        json_req("GET", "/v1/auth/whoami", Some(&resto_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(who["role"], "restaurant");

    let item_a = add_menu_item(&router, &resto_token, "5.00").await;
    let item_b = add_menu_item(&router, &resto_token, "3.50").await;

    // Customer browses the menu.
    let (status, menu) = call(
        &router,
        json_req(
            "GET",
            &format!("/v1/restaurants/{resto_profile}/menu"),
            Some(&diner_token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(menu.as_array().unwrap().len(), 2);

    // Place the order: 2 × 5.00 + 1 × 3.50 = 13.50.
    let (status, order) = call(
        &router,
        json_req(
            "POST",
            "/v1/orders",
            Some(&diner_token),
            Some(serde_json::json!({
                "restaurant_id": resto_profile,
                "delivery_address": "1 Main St",
                "items": [
                    {"menu_item_id": item_a, "quantity": 2},
                    {"menu_item_id": item_b, "quantity": 1},
                ],
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["status"], "pending");
    assert_eq!(order["total_amount"], "13.50");
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
    let order_id = order["order_id"].as_str().unwrap().to_string();

    // A restaurant account cannot place orders.
    let (status, _) = call(
        &router,
        json_req(
            "POST",
            "/v1/orders",
            Some(&resto_token),
            Some(serde_json::json!({
                "restaurant_id": resto_profile,
                "items": [{"menu_item_id": item_a, "quantity": 1}],
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Illegal jump pending -> preparing: 400 with the legal options listed.
    let (status, err) = call(
        &router,
        json_req(
            "POST",
            &format!("/v1/orders/{order_id}/status"),
            Some(&resto_token),
            Some(serde_json::json!({"status": "preparing"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["kind"], "validation");
    let msg = err["error"].as_str().unwrap();
    assert!(msg.contains("accepted, cancelled"), "{msg}");

    // Walk the legal path to delivered.
    for next in ["accepted", "preparing", "ready", "out_for_delivery", "delivered"] {
        let (status, body) = call(
            &router,
            json_req(
                "POST",
                &format!("/v1/orders/{order_id}/status"),
                Some(&resto_token),
                Some(serde_json::json!({"status": next})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "-> {next}: {body}");
        assert_eq!(body["status"], next);
    }

    // Terminal: every further request is rejected.
    let (status, err) = call(
        &router,
        json_req(
            "POST",
            &format!("/v1/orders/{order_id}/status"),
            Some(&resto_token),
            Some(serde_json::json!({"status": "cancelled"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().contains("terminal"), "{err}");

    // The total survived the whole lifecycle untouched.
    let (status, fetched) = call(
        &router,
        json_req("GET", &format!("/v1/orders/{order_id}"), Some(&diner_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["total_amount"], "13.50");
    assert_eq!(fetched["status"], "delivered");
}

// ---------------------------------------------------------------------------
// Ownership boundaries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn strangers_cannot_see_or_mutate_an_order() {
    let Some(router) = make_router().await else { return };

    let (resto_token, resto_profile) = signup(&router, "restaurant").await;
    let (diner_token, _) = signup(&router, "customer").await;
    let (stranger_token, _) = signup(&router, "customer").await;
    let (other_resto_token, _) = signup(&router, "restaurant").await;

    let item = add_menu_item(&router, &resto_token, "4.25").await;
    let (status, order) = call(
        &router,
        json_req(
            "POST",
            "/v1/orders",
            Some(&diner_token),
            Some(serde_json::json!({
                "restaurant_id": resto_profile,
                "items": [{"menu_item_id": item, "quantity": 1}],
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = order["order_id"].as_str().unwrap().to_string();

    // Another customer can neither read nor transition it.
    let (status, _) = call(
        &router,
        json_req("GET", &format!("/v1/orders/{order_id}"), Some(&stranger_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &router,
        json_req(
            "POST",
            &format!("/v1/orders/{order_id}/status"),
            Some(&stranger_token),
            Some(serde_json::json!({"status": "cancelled"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // An unrelated restaurant is a stranger too.
    let (status, _) = call(
        &router,
        json_req("GET", &format!("/v1/orders/{order_id}"), Some(&other_resto_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The customer who placed it may cancel it.
    let (status, body) = call(
        &router,
        json_req(
            "POST",
            &format!("/v1/orders/{order_id}/status"),
            Some(&diner_token),
            Some(serde_json::json!({"status": "cancelled"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "cancelled");
}

#[tokio::test]
async fn menu_mutation_is_owner_only_and_price_edits_spare_history() {
    let Some(router) = make_router().await else { return };

    let (resto_token, resto_profile) = signup(&router, "restaurant").await;
    let (other_resto_token, _) = signup(&router, "restaurant").await;
    let (diner_token, _) = signup(&router, "customer").await;

    let item = add_menu_item(&router, &resto_token, "4.25").await;

    // Non-owner update is refused.
    let (status, _) = call(
        &router,
        json_req(
            "PUT",
            &format!("/v1/menu/items/{item}"),
            Some(&other_resto_token),
            Some(serde_json::json!({"price": "9.99"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Customer creates an order at the old price.
    let (status, order) = call(
        &router,
        json_req(
            "POST",
            "/v1/orders",
            Some(&diner_token),
            Some(serde_json::json!({
                "restaurant_id": resto_profile,
                "items": [{"menu_item_id": item, "quantity": 3}],
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = order["order_id"].as_str().unwrap().to_string();
    assert_eq!(order["total_amount"], "12.75");

    // Owner doubles the price.
    let (status, updated) = call(
        &router,
        json_req(
            "PUT",
            &format!("/v1/menu/items/{item}"),
            Some(&resto_token),
            Some(serde_json::json!({"price": "8.50"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], "8.50");

    // The historical order still carries the snapshot.
    let (status, fetched) = call(
        &router,
        json_req("GET", &format!("/v1/orders/{order_id}"), Some(&diner_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["total_amount"], "12.75");
    assert_eq!(fetched["items"][0]["price"], "4.25");

    // Marking the item unavailable blocks new orders for it.
    let (status, _) = call(
        &router,
        json_req(
            "PUT",
            &format!("/v1/menu/items/{item}"),
            Some(&resto_token),
            Some(serde_json::json!({"is_available": false})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, err) = call(
        &router,
        json_req(
            "POST",
            "/v1/orders",
            Some(&diner_token),
            Some(serde_json::json!({
                "restaurant_id": resto_profile,
                "items": [{"menu_item_id": item, "quantity": 1}],
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().contains("unavailable"), "{err}");
}
