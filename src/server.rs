use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    predictor::PredictorContext,
    types::{FormOptions, PredictForm, PredictionOut},
};

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<PredictorContext>,
}

// Every failure goes out as { "error": ... } so the front end can always parse JSON
type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, msg: impl std::fmt::Display) -> ApiError {
    (status, Json(json!({ "error": msg.to_string() })))
}

// ---------- Routes ----------

pub fn router(ctx: Arc<PredictorContext>) -> Router {
    Router::new()
        .route("/options", get(options))
        .route("/predict", post(predict))
        .route("/health", get(health))
        .with_state(AppState { ctx })
}

// ---------- Handlers ----------

pub async fn options(State(state): State<AppState>) -> Json<FormOptions> {
    Json(state.ctx.options())
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "features": state.ctx.artifact().feature_names.len(),
    }))
}

pub async fn predict(
    State(state): State<AppState>,
    form: Result<Form<PredictForm>, FormRejection>,
) -> Result<Json<PredictionOut>, ApiError> {
    // missing fields, wrong content type, ...
    let Form(form) = form.map_err(|rej| {
        tracing::info!("rejected predict form: {}", rej.body_text());
        api_error(rej.status(), rej.body_text())
    })?;

    state.ctx.handle(&form).map(Json).map_err(|e| {
        let status = if e.is_client_error() {
            tracing::info!("rejected predict request: {}", e);
            StatusCode::BAD_REQUEST
        } else {
            tracing::error!("predict failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        api_error(status, e)
    })
}
