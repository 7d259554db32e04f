//! The gateway's two routes and their error mapping.
//!
//! `GET /` returns the status snapshot; `GET /{device}/{action}` drives an
//! actuator and returns the snapshot produced under the same lock scope as
//! the write. Action strings outside `on`/`off` are rejected here, before
//! the controller is involved.
//!
//! Controller calls block (the bus lock may be held across a full sensor
//! acquisition window), so each request runs them on a blocking task.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::task;

use domo_common::error::HwError;
use domo_common::io::line::Action;
use domo_common::snapshot::StatusSnapshot;
use domo_hal::Controller;

/// Build the gateway router around a controller.
pub fn router(controller: Controller) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/{device}/{action}", get(actuate))
        .with_state(controller)
}

async fn status(State(controller): State<Controller>) -> Result<Json<StatusSnapshot>, ApiError> {
    let snapshot = task::spawn_blocking(move || controller.get_status())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(snapshot))
}

async fn actuate(
    State(controller): State<Controller>,
    Path((device, action)): Path<(String, String)>,
) -> Result<Json<StatusSnapshot>, ApiError> {
    let action: Action = action.parse()?;
    let snapshot = task::spawn_blocking(move || controller.set_actuator(&device, action.is_on()))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(snapshot))
}

/// Gateway error response.
///
/// Caller errors map to 4xx, hardware faults to 500; the body carries a
/// stable `error` kind plus a human-readable `detail`.
pub enum ApiError {
    /// A typed controller error.
    Hw(HwError),
    /// Gateway-internal failure (e.g. a cancelled blocking task).
    Internal(String),
}

impl From<HwError> for ApiError {
    fn from(err: HwError) -> Self {
        Self::Hw(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, detail) = match &self {
            ApiError::Hw(err) => (status_for(err), kind_of(err), err.to_string()),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg.clone())
            }
        };
        (status, Json(json!({ "error": kind, "detail": detail }))).into_response()
    }
}

fn status_for(err: &HwError) -> StatusCode {
    match err {
        HwError::UnknownDevice(_) => StatusCode::NOT_FOUND,
        HwError::InvalidTarget(_) | HwError::InvalidAction(_) => StatusCode::BAD_REQUEST,
        HwError::DirectionMismatch { .. }
        | HwError::HardwareFault { .. }
        | HwError::AcquisitionFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn kind_of(err: &HwError) -> &'static str {
    match err {
        HwError::UnknownDevice(_) => "unknownDevice",
        HwError::InvalidTarget(_) => "invalidTarget",
        HwError::DirectionMismatch { .. } => "directionMismatch",
        HwError::HardwareFault { .. } => "hardwareFault",
        HwError::AcquisitionFailed { .. } => "acquisitionFailed",
        HwError::InvalidAction(_) => "invalidAction",
    }
}
