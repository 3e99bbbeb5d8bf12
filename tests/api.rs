//! HTTP-level tests for the lookup API, driven through the router.
#![cfg(feature = "server")]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use rusqlite::Connection;
use serde_json::{json, Value};
use swift_registry::api::{build_router, AppState};
use swift_registry::{insert_banks, setup_database, Bank};
use tower::ServiceExt;

// ── Fixtures ───────────────────────────────────────────────────

fn bank(code: &str, hq: Option<&str>) -> Bank {
    Bank {
        swift_code: code.to_string(),
        hq_swift_code: hq.map(str::to_string),
        bank_name: if hq.is_some() { "Branch Bank" } else { "HQ Bank" }.to_string(),
        address: format!("{} Street", code),
        country_iso2_code: "GB".to_string(),
        country_name: "UNITED KINGDOM".to_string(),
    }
}

fn state_with(banks: &[Bank]) -> AppState {
    let mut conn = Connection::open_in_memory().unwrap();
    setup_database(&conn).unwrap();
    insert_banks(&mut conn, banks).unwrap();
    AppState::new(conn)
}

fn seeded_state() -> AppState {
    state_with(&[
        bank("ABCDEFGHXXX", None),
        bank("ABCDEFGH001", Some("ABCDEFGHXXX")),
        bank("ABCDEFGH002", Some("ABCDEFGHXXX")),
    ])
}

async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
    let resp = build_router(state.clone()).oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get(state: &AppState, uri: &str) -> (StatusCode, Value) {
    send(state, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(state: &AppState, body: Value) -> (StatusCode, Value) {
    send(
        state,
        Request::builder()
            .method("POST")
            .uri("/v1/swift-codes")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

async fn delete(state: &AppState, uri: &str) -> (StatusCode, Value) {
    send(
        state,
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

fn add_request(code: &str, is_headquarter: bool) -> Value {
    json!({
        "address": "1 New Street",
        "bankName": "New Bank",
        "countryISO2": "GB",
        "countryName": "UNITED KINGDOM",
        "isHeadquarter": is_headquarter,
        "swiftCode": code,
    })
}

// ── GET /v1/swift-codes/:code ──────────────────────────────────

#[tokio::test]
async fn test_health() {
    let (status, body) = get(&seeded_state(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "OK");
}

#[tokio::test]
async fn test_get_headquarters_with_branches() {
    let (status, body) = get(&seeded_state(), "/v1/swift-codes/ABCDEFGHXXX").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "address": "ABCDEFGHXXX Street",
            "bankName": "HQ Bank",
            "countryISO2": "GB",
            "countryName": "UNITED KINGDOM",
            "isHeadquarter": true,
            "swiftCode": "ABCDEFGHXXX",
            "branches": [
                {
                    "address": "ABCDEFGH001 Street",
                    "bankName": "Branch Bank",
                    "countryISO2": "GB",
                    "isHeadquarter": false,
                    "swiftCode": "ABCDEFGH001",
                },
                {
                    "address": "ABCDEFGH002 Street",
                    "bankName": "Branch Bank",
                    "countryISO2": "GB",
                    "isHeadquarter": false,
                    "swiftCode": "ABCDEFGH002",
                },
            ],
        })
    );
}

#[tokio::test]
async fn test_get_headquarters_without_branches_has_empty_list() {
    let state = state_with(&[bank("ABCDEFGHXXX", None)]);
    let (status, body) = get(&state, "/v1/swift-codes/ABCDEFGHXXX").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["branches"], json!([]));
}

#[tokio::test]
async fn test_get_branch_is_flat() {
    let (status, body) = get(&seeded_state(), "/v1/swift-codes/ABCDEFGH001").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "address": "ABCDEFGH001 Street",
            "bankName": "Branch Bank",
            "countryISO2": "GB",
            "countryName": "UNITED KINGDOM",
            "isHeadquarter": false,
            "swiftCode": "ABCDEFGH001",
        })
    );
}

#[tokio::test]
async fn test_get_missing_code() {
    let (status, _) = get(&seeded_state(), "/v1/swift-codes/MISSING").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── GET /v1/swift-codes/country/:iso2 ──────────────────────────

#[tokio::test]
async fn test_get_country() {
    let (status, body) = get(&seeded_state(), "/v1/swift-codes/country/gb").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["countryISO2"], "GB");
    assert_eq!(body["countryName"], "UNITED KINGDOM");

    let codes: Vec<&str> = body["swiftCodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["swiftCode"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["ABCDEFGHXXX", "ABCDEFGH001", "ABCDEFGH002"]);
    assert_eq!(body["swiftCodes"][0]["isHeadquarter"], true);
    assert_eq!(body["swiftCodes"][1]["isHeadquarter"], false);
}

#[tokio::test]
async fn test_get_country_without_banks() {
    let (status, _) = get(&seeded_state(), "/v1/swift-codes/country/PL").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── POST /v1/swift-codes ───────────────────────────────────────

#[tokio::test]
async fn test_add_branch_links_existing_hq() {
    let state = seeded_state();

    let (status, body) = post_json(&state, add_request("ABCDEFGH003", false)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Added bank with SWIFT code ABCDEFGH003");

    let (_, hq) = get(&state, "/v1/swift-codes/ABCDEFGHXXX").await;
    assert_eq!(hq["branches"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_add_branch_without_hq_is_unlinked() {
    let state = seeded_state();

    let (status, _) = post_json(&state, add_request("ZZZZGBGB001", false)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = get(&state, "/v1/swift-codes/ZZZZGBGB001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isHeadquarter"], false);

    // Adding the HQ later does not retro-link the branch
    let (status, _) = post_json(&state, add_request("ZZZZGBGBXXX", true)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, hq) = get(&state, "/v1/swift-codes/ZZZZGBGBXXX").await;
    assert_eq!(hq["branches"], json!([]));
}

#[tokio::test]
async fn test_add_flag_disagreeing_with_code() {
    let state = seeded_state();

    let (status, body) = post_json(&state, add_request("ZZZZGBGBXXX", false)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "isHeadquarter disagrees with swiftCode");

    let (status, _) = post_json(&state, add_request("ZZZZGBGB001", true)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_add_invalid_fields() {
    let mut body = add_request("SHORT", true);
    body["countryISO2"] = json!("gbr");

    let (status, resp) = post_json(&seeded_state(), body).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let message = resp["message"].as_str().unwrap();
    assert!(message.contains("countryISO2"), "{}", message);
    assert!(message.contains("swiftCode"), "{}", message);
}

#[tokio::test]
async fn test_add_duplicate() {
    let (status, _) = post_json(&seeded_state(), add_request("ABCDEFGHXXX", true)).await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_add_malformed_json() {
    let state = seeded_state();
    let (status, _) = send(
        &state,
        Request::builder()
            .method("POST")
            .uri("/v1/swift-codes")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"swiftCode":"ABCDEFGHXXX""#))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &state,
        Request::builder()
            .method("POST")
            .uri("/v1/swift-codes")
            .header("content-type", "text/plain")
            .body(Body::from(add_request("ZZZZGBGBXXX", true).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── DELETE /v1/swift-codes/:code ───────────────────────────────

#[tokio::test]
async fn test_delete_hq_unlinks_branches() {
    let state = seeded_state();

    let (status, body) = delete(&state, "/v1/swift-codes/ABCDEFGHXXX").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Deleted bank with SWIFT code ABCDEFGHXXX");

    let (status, _) = get(&state, "/v1/swift-codes/ABCDEFGHXXX").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Branch survives as a flat record
    let (status, body) = get(&state, "/v1/swift-codes/ABCDEFGH001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isHeadquarter"], false);
}

#[tokio::test]
async fn test_delete_missing() {
    let (status, _) = delete(&seeded_state(), "/v1/swift-codes/MISSING").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
