// 🌐 SWIFT Code API - REST endpoints with Axum
//
//   GET    /health
//   GET    /v1/swift-codes/:swift_code
//   GET    /v1/swift-codes/country/:country_iso2
//   POST   /v1/swift-codes
//   DELETE /v1/swift-codes/:swift_code

use crate::db::{
    check_bank_hq_exists, delete_bank, get_bank, get_bank_branches, get_banks_in_country,
    insert_bank,
};
use crate::error::StoreError;
use crate::models::Bank;
use crate::swift_code::{classify, has_valid_length};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database mutex poisoned".to_string()))
    }
}

// ============================================================================
// Request / Response types
// ============================================================================

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Headquarters lookup: own fields plus every linked branch
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HeadquarterResponse {
    pub address: String,
    #[serde(rename = "bankName")]
    pub bank_name: String,
    #[serde(rename = "countryISO2")]
    pub country_iso2: String,
    #[serde(rename = "countryName")]
    pub country_name: String,
    #[serde(rename = "isHeadquarter")]
    pub is_headquarter: bool,
    #[serde(rename = "swiftCode")]
    pub swift_code: String,
    pub branches: Vec<SwiftCodeSummary>,
}

/// Branch lookup: flat record
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct BranchResponse {
    pub address: String,
    #[serde(rename = "bankName")]
    pub bank_name: String,
    #[serde(rename = "countryISO2")]
    pub country_iso2: String,
    #[serde(rename = "countryName")]
    pub country_name: String,
    #[serde(rename = "isHeadquarter")]
    pub is_headquarter: bool,
    #[serde(rename = "swiftCode")]
    pub swift_code: String,
}

/// Entry in branch lists and country listings
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SwiftCodeSummary {
    pub address: String,
    #[serde(rename = "bankName")]
    pub bank_name: String,
    #[serde(rename = "countryISO2")]
    pub country_iso2: String,
    #[serde(rename = "isHeadquarter")]
    pub is_headquarter: bool,
    #[serde(rename = "swiftCode")]
    pub swift_code: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CountryResponse {
    #[serde(rename = "countryISO2")]
    pub country_iso2: String,
    #[serde(rename = "countryName")]
    pub country_name: String,
    #[serde(rename = "swiftCodes")]
    pub swift_codes: Vec<SwiftCodeSummary>,
}

/// POST body. Missing fields deserialize as empty and fail validation.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AddSwiftCodeRequest {
    pub address: String,
    #[serde(rename = "bankName")]
    pub bank_name: String,
    #[serde(rename = "countryISO2")]
    pub country_iso2: String,
    #[serde(rename = "countryName")]
    pub country_name: String,
    #[serde(rename = "isHeadquarter")]
    pub is_headquarter: bool,
    #[serde(rename = "swiftCode")]
    pub swift_code: String,
}

impl AddSwiftCodeRequest {
    /// Names (JSON spelling) of the fields that fail format checks
    pub fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();

        if self.address.trim().is_empty() {
            invalid.push("address");
        }
        if self.bank_name.trim().is_empty() {
            invalid.push("bankName");
        }
        if self.country_iso2.len() != 2 || !self.country_iso2.chars().all(|c| c.is_ascii_uppercase()) {
            invalid.push("countryISO2");
        }
        if self.country_name.trim().is_empty() || self.country_name != self.country_name.to_uppercase() {
            invalid.push("countryName");
        }
        if !has_valid_length(&self.swift_code) {
            invalid.push("swiftCode");
        }

        invalid
    }
}

impl From<Bank> for SwiftCodeSummary {
    fn from(bank: Bank) -> Self {
        Self {
            is_headquarter: bank.is_headquarter(),
            address: bank.address,
            bank_name: bank.bank_name,
            country_iso2: bank.country_iso2_code,
            swift_code: bank.swift_code,
        }
    }
}

impl From<Bank> for BranchResponse {
    fn from(bank: Bank) -> Self {
        Self {
            is_headquarter: bank.is_headquarter(),
            address: bank.address,
            bank_name: bank.bank_name,
            country_iso2: bank.country_iso2_code,
            country_name: bank.country_name,
            swift_code: bank.swift_code,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unprocessable(String),
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(code) => ApiError::NotFound(format!("SWIFT code {} not found", code)),
            StoreError::DuplicateKey(code) => {
                ApiError::Conflict(format!("SWIFT code {} already exists", code))
            }
            StoreError::ForeignKeyViolation(code) => {
                ApiError::Unprocessable(format!("headquarters of {} does not exist", code))
            }
            StoreError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, m),
            ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m),
            ApiError::Internal(m) => {
                error!(error = %m, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        (status, Json(MessageResponse::new(message))).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health - Health check
async fn health_check() -> impl IntoResponse {
    Json(MessageResponse::new("OK"))
}

/// GET /v1/swift-codes/:swift_code - Headquarters with branches, or a single branch
async fn get_swift_code(
    State(state): State<AppState>,
    Path(swift_code): Path<String>,
) -> Result<Response, ApiError> {
    let conn = state.conn()?;
    let bank = get_bank(&conn, &swift_code)?;

    if !bank.is_headquarter() {
        return Ok(Json(BranchResponse::from(bank)).into_response());
    }

    let branches = get_bank_branches(&conn, &bank.swift_code)?
        .into_iter()
        .map(SwiftCodeSummary::from)
        .collect();

    let response = HeadquarterResponse {
        is_headquarter: true,
        address: bank.address,
        bank_name: bank.bank_name,
        country_iso2: bank.country_iso2_code,
        country_name: bank.country_name,
        swift_code: bank.swift_code,
        branches,
    };

    Ok(Json(response).into_response())
}

/// GET /v1/swift-codes/country/:country_iso2 - Every code registered in a country
async fn get_swift_codes_for_country(
    State(state): State<AppState>,
    Path(country_iso2): Path<String>,
) -> Result<Json<CountryResponse>, ApiError> {
    let country_iso2 = country_iso2.to_uppercase();
    let conn = state.conn()?;
    let banks = get_banks_in_country(&conn, &country_iso2)?;

    // All rows share the country, so the name comes from any of them
    let country_name = match banks.first() {
        Some(bank) => bank.country_name.clone(),
        None => {
            return Err(ApiError::NotFound(format!(
                "no SWIFT codes for country {}",
                country_iso2
            )))
        }
    };

    Ok(Json(CountryResponse {
        country_iso2,
        country_name,
        swift_codes: banks.into_iter().map(SwiftCodeSummary::from).collect(),
    }))
}

/// POST /v1/swift-codes - Register a single bank
async fn add_swift_code(
    State(state): State<AppState>,
    payload: Result<Json<AddSwiftCodeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let Json(req) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let invalid = req.invalid_fields();
    if !invalid.is_empty() {
        return Err(ApiError::Unprocessable(format!(
            "Format checks failed for fields: {}",
            invalid.join(", ")
        )));
    }

    // The code decides the designation; the flag only has to agree
    let kind = classify(&req.swift_code);
    if kind.is_headquarters() != req.is_headquarter {
        return Err(ApiError::Unprocessable(
            "isHeadquarter disagrees with swiftCode".to_string(),
        ));
    }

    let conn = state.conn()?;

    let hq_swift_code = match kind.implied_headquarters() {
        Some(hq) => check_bank_hq_exists(&conn, hq)?.then(|| hq.to_string()),
        None => None,
    };

    let bank = Bank {
        swift_code: req.swift_code,
        hq_swift_code,
        bank_name: req.bank_name,
        address: req.address,
        country_iso2_code: req.country_iso2,
        country_name: req.country_name,
    };
    insert_bank(&conn, &bank)?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(format!(
            "Added bank with SWIFT code {}",
            bank.swift_code
        ))),
    ))
}

/// DELETE /v1/swift-codes/:swift_code - Remove a bank; its branches lose their link
async fn delete_swift_code(
    State(state): State<AppState>,
    Path(swift_code): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let conn = state.conn()?;
    delete_bank(&conn, &swift_code)?;

    Ok(Json(MessageResponse::new(format!(
        "Deleted bank with SWIFT code {}",
        swift_code
    ))))
}

// ============================================================================
// Router
// ============================================================================

pub fn build_router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/swift-codes", post(add_swift_code))
        .route(
            "/swift-codes/:swift_code",
            get(get_swift_code).delete(delete_swift_code),
        )
        .route(
            "/swift-codes/country/:country_iso2",
            get(get_swift_codes_for_country),
        )
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .nest("/v1", v1_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
