//! # Verification Demos
//!
//! A (naive) HTTP API over the demo verification flows. Each route runs one
//! flow against the operator gateway and returns its result as JSON.
//! Failures are returned as `{"error", "statusCode"}` with the classified
//! HTTP status.

use std::time::Duration;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use credibil_ciba::flows::casino::{self, WithdrawRequest, WithdrawResult};
use credibil_ciba::flows::disco::{self, BulkVerification, Guest};
use credibil_ciba::flows::kyc::{self, KycVerification};
use credibil_ciba::flows::location::{self, Area};
use credibil_ciba::flows::poker::{self, PokerRegistration, PokerVerification};
use credibil_ciba::flows::sim_swap;
use credibil_ciba::{
    CibaClient, DEFAULT_MAX_AGE, Error, ErrorResponse, KycMatchRequest,
    LocationVerificationResponse, SimSwapResponse,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state for the route handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Verification client.
    pub client: CibaClient,

    /// Pause between guests in a bulk verification.
    pub pacing: Duration,
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/verify-age", post(verify_age))
        .route("/api/verify-ages", post(verify_ages))
        .route("/api/kyc-match", post(kyc_match))
        .route("/api/poker", post(poker))
        .route("/api/verify-location", post(verify_location))
        .route("/api/sim-swap", post(sim_swap))
        .route("/api/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_methods(Any).allow_origin(Any).allow_headers(Any))
        .with_state(state)
}

/// Serve the API on `listener` until `shutdown` completes.
///
/// # Errors
///
/// Returns an error if the server fails.
pub async fn serve(
    listener: TcpListener, state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).with_graceful_shutdown(shutdown).await?;
    Ok(())
}

#[axum::debug_handler]
async fn verify_age(
    State(state): State<AppState>, Json(request): Json<WithdrawRequest>,
) -> Result<Json<WithdrawResult>, AppError> {
    Ok(Json(casino::withdraw(&state.client, &request).await?))
}

/// Guest list for a bulk age verification.
#[derive(Debug, Deserialize, Serialize)]
pub struct GuestList {
    /// Guests to verify.
    #[serde(default)]
    pub people: Vec<Guest>,
}

#[axum::debug_handler]
async fn verify_ages(
    State(state): State<AppState>, Json(list): Json<GuestList>,
) -> Result<Json<BulkVerification>, AppError> {
    Ok(Json(disco::admit_guests(&state.client, &list.people, state.pacing).await?))
}

/// Customer details to match.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KycCheck {
    /// The customer's phone number.
    pub phone_number: String,

    /// Details to match against the operator's records.
    #[serde(flatten)]
    pub details: KycMatchRequest,
}

#[axum::debug_handler]
async fn kyc_match(
    State(state): State<AppState>, Json(check): Json<KycCheck>,
) -> Result<Json<KycVerification>, AppError> {
    Ok(Json(kyc::verify_customer(&state.client, &check.phone_number, &check.details).await?))
}

#[axum::debug_handler]
async fn poker(
    State(state): State<AppState>, Json(registration): Json<PokerRegistration>,
) -> Result<Json<PokerVerification>, AppError> {
    Ok(Json(poker::register_player(&state.client, &registration).await?))
}

/// A device location check, against a named preset area or explicit
/// coordinates.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCheck {
    /// The customer's phone number.
    pub phone_number: String,

    /// The area to check.
    #[serde(flatten)]
    pub area: AreaSpec,
}

/// An area given by preset name or coordinates.
#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AreaSpec {
    /// A named preset such as `madrid`.
    Preset {
        /// Preset name.
        area: String,
    },

    /// Explicit coordinates and radius.
    Custom(Area),
}

#[axum::debug_handler]
async fn verify_location(
    State(state): State<AppState>, Json(check): Json<LocationCheck>,
) -> Result<Json<LocationVerificationResponse>, AppError> {
    let area = match check.area {
        AreaSpec::Preset { area } => Area::preset(&area)
            .ok_or_else(|| Error::Validation(format!("unknown area: {area}")))?,
        AreaSpec::Custom(area) => area,
    };
    Ok(Json(location::verify_location(&state.client, &check.phone_number, &area).await?))
}

/// A SIM swap check.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimSwapCheck {
    /// The customer's phone number.
    pub phone_number: String,

    /// Look-back window in hours. Defaults to 240.
    #[serde(default)]
    pub max_age: Option<u16>,
}

#[axum::debug_handler]
async fn sim_swap(
    State(state): State<AppState>, Json(check): Json<SimSwapCheck>,
) -> Result<Json<SimSwapResponse>, AppError> {
    let max_age = check.max_age.unwrap_or(DEFAULT_MAX_AGE);
    Ok(Json(sim_swap::check(&state.client, &check.phone_number, max_age).await?))
}

/// Service health.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Health {
    /// Always `ok` while the service is running.
    pub status: String,

    /// Whether the operator gateway is reachable.
    pub gateway: bool,
}

#[axum::debug_handler]
async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        gateway: state.client.check_connectivity().await,
    })
}

struct AppError(Error);

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

// Render the classified error as `{"error", "statusCode"}`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::from(&self.0);
        let status =
            StatusCode::from_u16(body.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "verification failed");
        } else {
            tracing::debug!(error = %self.0, "verification rejected");
        }
        (status, Json(body)).into_response()
    }
}
