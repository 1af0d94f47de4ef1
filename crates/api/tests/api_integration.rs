//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use api::Services;
use api::auth::Claims;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use booking_store::InMemoryBookingStore;
use clients::{
    Channel, InMemoryCatalogClient, InMemoryEventPublisher, InMemoryIdentityClient,
    InMemoryPaymentGateway, Room,
};
use common::{HotelId, RoomId, UserId};
use jsonwebtoken::{EncodingKey, Header, encode};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::OrchestratorConfig;
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &str = "test-secret";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    router: axum::Router,
    payment: InMemoryPaymentGateway,
    publisher: InMemoryEventPublisher,
}

fn setup() -> TestApp {
    let catalog = InMemoryCatalogClient::new();
    let identity = InMemoryIdentityClient::new();
    let payment = InMemoryPaymentGateway::new();
    let publisher = InMemoryEventPublisher::new();

    catalog.add_hotel(
        HotelId::new(7),
        UserId::new(3),
        (1..=3)
            .map(|id| Room {
                id: RoomId::new(id),
                hotel_id: HotelId::new(7),
                number: 100 + id as i32,
                description: "Double".to_string(),
                base_price: 150,
            })
            .collect(),
    );
    identity.add_hotelier(UserId::new(3), "owner", "chat-owner");

    let state = api::create_state(
        Arc::new(InMemoryBookingStore::new()),
        Services {
            catalog: Arc::new(catalog),
            identity: Arc::new(identity),
            payment: Arc::new(payment.clone()),
            publisher: Arc::new(publisher.clone()),
        },
        OrchestratorConfig::default(),
        SECRET,
    );

    TestApp {
        router: api::create_app(state, get_metrics_handle()),
        payment,
        publisher,
    }
}

fn token(user_id: i64, is_hotelier: bool) -> String {
    let claims = Claims {
        user_id,
        username: if is_hotelier { "owner" } else { "guest" }.to_string(),
        chat_id: format!("chat-{user_id}"),
        is_hotelier,
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn booking_body(start: &str, end: &str) -> Value {
    json!({
        "room_id": 2,
        "hotel_id": 7,
        "hotel_name": "Grand",
        "room_description": "Double",
        "room_number": 102,
        "count_of_people": 2,
        "room_base_price": 150,
        "card_number": "4111111111111111",
        "start_date": start,
        "end_date": end,
    })
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

async fn create_booking(app: &TestApp) -> i64 {
    let (status, json) = send(
        app,
        post_json(
            "/bookings",
            Some(&token(1, false)),
            &booking_body("2025-06-01T00:00:00Z", "2025-06-03T00:00:00Z"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["booking_id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, json) = send(&app, get("/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_create_booking_returns_created() {
    let app = setup();
    let booking_id = create_booking(&app).await;

    assert!(booking_id > 0);
    assert_eq!(app.payment.dispatch_count(), 1);
    assert_eq!(app.payment.dispatched()[0].amount, 300);
}

#[tokio::test]
async fn test_overlapping_booking_returns_conflict() {
    let app = setup();
    create_booking(&app).await;

    let (status, json) = send(
        &app,
        post_json(
            "/bookings",
            Some(&token(1, false)),
            &booking_body("2025-06-02T00:00:00Z", "2025-06-04T00:00:00Z"),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().is_some());
    assert_eq!(app.payment.dispatch_count(), 1);
}

#[tokio::test]
async fn test_create_requires_token() {
    let app = setup();
    let (status, _) = send(
        &app,
        post_json(
            "/bookings",
            None,
            &booking_body("2025-06-01T00:00:00Z", "2025-06-03T00:00:00Z"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        post_json(
            "/bookings",
            Some("not-a-jwt"),
            &booking_body("2025-06-01T00:00:00Z", "2025-06-03T00:00:00Z"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_hotelier_cannot_create_booking() {
    let app = setup();
    let (status, _) = send(
        &app,
        post_json(
            "/bookings",
            Some(&token(3, true)),
            &booking_body("2025-06-01T00:00:00Z", "2025-06-03T00:00:00Z"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.payment.dispatch_count(), 0);
}

#[tokio::test]
async fn test_invalid_booking_body_is_bad_request() {
    let app = setup();

    let (status, _) = send(
        &app,
        post_json(
            "/bookings",
            Some(&token(1, false)),
            &json!({"room_id": "ten"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post_json(
            "/bookings",
            Some(&token(1, false)),
            &booking_body("2025-06-03T00:00:00Z", "2025-06-01T00:00:00Z"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_own_bookings() {
    let app = setup();
    create_booking(&app).await;

    let (status, json) = send(&app, get("/bookings/users?user_id=1", Some(&token(1, false)))).await;
    assert_eq!(status, StatusCode::OK);
    let bookings = json.as_array().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["status"], "pending");
    assert_eq!(bookings[0]["room_id"], 2);

    let (status, _) = send(&app, get("/bookings/users?user_id=2", Some(&token(1, false)))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_hotel_listing_ownership() {
    let app = setup();
    create_booking(&app).await;

    let (status, json) = send(&app, get("/bookings/hotels?hotel_id=7", Some(&token(3, true)))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, get("/bookings/hotels?hotel_id=7", Some(&token(4, true)))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, get("/bookings/hotels?hotel_id=99", Some(&token(3, true)))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/bookings/hotels?hotel_id=7", Some(&token(1, false)))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_available_rooms() {
    let app = setup();
    create_booking(&app).await;

    let (status, json) = send(
        &app,
        get(
            "/bookings/hotels/rooms?hotel_id=7&start_date=2025-06-02T00:00:00Z&end_date=2025-06-05T00:00:00Z",
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 3]);

    let (status, json) = send(
        &app,
        get(
            "/bookings/hotels/rooms?hotel_id=7&start_date=2025-06-03T00:00:00Z&end_date=2025-06-05T00:00:00Z",
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_available_rooms_rejects_bad_dates() {
    let app = setup();
    let (status, json) = send(
        &app,
        get(
            "/bookings/hotels/rooms?hotel_id=7&start_date=yesterday&end_date=2025-06-05T00:00:00Z",
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("start_date"));
}

#[tokio::test]
async fn test_payment_webhook_confirms_and_notifies_once() {
    let app = setup();
    let booking_id = create_booking(&app).await;
    let meta_data = serde_json::to_value(&app.payment.dispatched()[0].meta_data).unwrap();
    let uri = format!("/bookings/payment/response?booking_id={booking_id}");
    let callback = json!({"status": "success", "meta_data": meta_data});

    let (status, json) = send(&app, post_json(&uri, None, &callback)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["result"], "applied");

    let (status, json) = send(&app, post_json(&uri, None, &callback)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["result"], "duplicate");

    assert_eq!(app.publisher.published_on(Channel::Guest).len(), 1);
    let hotelier = app.publisher.published_on(Channel::Hotelier);
    assert_eq!(hotelier.len(), 1);
    assert_eq!(hotelier[0].user_name, "owner");

    let (_, json) = send(&app, get("/bookings/users?user_id=1", Some(&token(1, false)))).await;
    assert_eq!(json[0]["status"], "confirmed");
}

#[tokio::test]
async fn test_payment_webhook_retry_resumes_after_publish_failure() {
    let app = setup();
    let booking_id = create_booking(&app).await;
    let meta_data = serde_json::to_value(&app.payment.dispatched()[0].meta_data).unwrap();
    let uri = format!("/bookings/payment/response?booking_id={booking_id}");
    let callback = json!({"status": "success", "meta_data": meta_data});

    app.publisher.set_fail_on(Some(Channel::Guest));
    let (status, _) = send(&app, post_json(&uri, None, &callback)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    app.publisher.set_fail_on(None);
    let (status, json) = send(&app, post_json(&uri, None, &callback)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["result"], "resumed");
    assert_eq!(app.publisher.published_on(Channel::Guest).len(), 1);
    assert_eq!(app.publisher.published_on(Channel::Hotelier).len(), 1);
}

#[tokio::test]
async fn test_payment_webhook_gateway_timeout_spelling() {
    let app = setup();
    let booking_id = create_booking(&app).await;
    let meta_data = serde_json::to_value(&app.payment.dispatched()[0].meta_data).unwrap();
    let uri = format!("/bookings/payment/response?booking_id={booking_id}");

    let (status, _) = send(
        &app,
        post_json(&uri, None, &json!({"status": "failed", "meta_data": meta_data})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.publisher.published().is_empty());

    let (_, json) = send(&app, get("/bookings/users?user_id=1", Some(&token(1, false)))).await;
    assert_eq!(json[0]["status"], "failed");
}

#[tokio::test]
async fn test_payment_webhook_unknown_booking_is_internal() {
    let app = setup();
    create_booking(&app).await;
    let mut meta_data = serde_json::to_value(&app.payment.dispatched()[0].meta_data).unwrap();
    meta_data["booking_id"] = json!(999);

    let (status, json) = send(
        &app,
        post_json(
            "/bookings/payment/response?booking_id=999",
            None,
            &json!({"status": "success", "meta_data": meta_data}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "internal server error");
}

#[tokio::test]
async fn test_payment_webhook_rejects_unknown_status() {
    let app = setup();
    let booking_id = create_booking(&app).await;
    let meta_data = serde_json::to_value(&app.payment.dispatched()[0].meta_data).unwrap();

    let (status, _) = send(
        &app,
        post_json(
            &format!("/bookings/payment/response?booking_id={booking_id}"),
            None,
            &json!({"status": "maybe", "meta_data": meta_data}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_payment_dispatch_failure_is_internal() {
    let app = setup();
    app.payment.set_fail_on_dispatch(true);

    let (status, json) = send(
        &app,
        post_json(
            "/bookings",
            Some(&token(1, false)),
            &booking_body("2025-06-01T00:00:00Z", "2025-06-03T00:00:00Z"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "internal server error");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    create_booking(&app).await;

    let response = app.router.clone().oneshot(get("/metrics", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("bookings_created_total"));
}
