//! API route handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use tracing::{debug, info, warn};

use munreg_core::constants::{COMMITTEES, EXPORT_FILE_NAME};
use munreg_core::export::registrations_to_csv;
use munreg_core::types::{Registration, RegistrationQuery};
use munreg_core::validation::{PatchInput, RegistrationInput};

use crate::dto::*;
use crate::error::{ApiError, MSG_INVALID_ID, MSG_NOT_FOUND};
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// Parses a path id. Anything but a non-negative integer is a 400.
pub(crate) fn parse_id(raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ApiError::bad_request(MSG_INVALID_ID))
}

// ═══════════════════════════════════════════════════════════════════════════
// Registrations
// ═══════════════════════════════════════════════════════════════════════════

/// POST /api/registrations
pub async fn create_registration(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RegistrationInput>, JsonRejection>,
) -> Result<Json<Registration>> {
    let Json(input) = payload?;
    let new = input.validate(&state.config.policy)?;

    let registration = state.store.create_registration(new).await?;

    info!(
        id = registration.id,
        committees = registration.committees.len(),
        "Registration created"
    );
    Ok(Json(registration))
}

/// GET /api/registrations?search=&experience=&committee=
pub async fn list_registrations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RegistrationQuery>,
) -> Result<Json<Vec<Registration>>> {
    let registrations = query.execute(state.store.as_ref()).await?;

    debug!(count = registrations.len(), plan = ?query.plan(), "Listed registrations");
    Ok(Json(registrations))
}

/// GET /api/registrations/:id
pub async fn get_registration(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Registration>> {
    let id = parse_id(&id)?;

    state
        .store
        .get_registration(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(MSG_NOT_FOUND))
}

/// PATCH /api/registrations/:id
pub async fn update_registration(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<PatchInput>, JsonRejection>,
) -> Result<Json<Registration>> {
    let id = parse_id(&id)?;
    let Json(input) = payload?;
    let patch = input.validate(&state.config.policy)?;

    let updated = state
        .store
        .update_registration(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found(MSG_NOT_FOUND))?;

    info!(id, status = %updated.status, "Registration updated");
    Ok(Json(updated))
}

/// DELETE /api/registrations/:id
pub async fn delete_registration(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id = parse_id(&id)?;

    if !state.store.delete_registration(id).await? {
        return Err(ApiError::not_found(MSG_NOT_FOUND));
    }

    info!(id, "Registration deleted");
    Ok(Json(MessageResponse::new("Registration deleted successfully")))
}

// ═══════════════════════════════════════════════════════════════════════════
// Dashboard
// ═══════════════════════════════════════════════════════════════════════════

/// GET /api/stats
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<StatsResponse>> {
    let stats = state.store.stats().await?;
    Ok(Json(StatsResponse::from(stats)))
}

/// GET /api/export
///
/// Same query parameters as the list endpoint; responds with a CSV attachment.
pub async fn export_registrations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RegistrationQuery>,
) -> Result<impl IntoResponse> {
    let registrations = query.execute(state.store.as_ref()).await?;
    let csv = registrations_to_csv(&registrations);

    info!(rows = registrations.len(), "Exported registrations");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        csv,
    ))
}

/// GET /api/committees
pub async fn list_committees() -> Json<Vec<CommitteeDto>> {
    Json(
        COMMITTEES
            .iter()
            .map(|(code, label)| CommitteeDto {
                code: (*code).into(),
                label: (*label).into(),
            })
            .collect(),
    )
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let count = match state.store.count().await {
        Ok(count) => count,
        Err(e) => {
            warn!(error = %e, "Health check could not count registrations");
            0
        }
    };

    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        registrations: count,
    })
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> ApiError {
    debug!(%uri, "No route");
    ApiError::new(StatusCode::NOT_FOUND, format!("Route {} not found", uri.path()))
}
