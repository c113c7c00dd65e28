use crate::config::AnalyticsSettings;
use crate::dashboard::{build_dashboard, DashboardInput};
use crate::errors::AppError;
use crate::journey::{score_progress, TierTable};
use crate::models::{Dashboard, DashboardRequest, JourneyProgress, JourneyRequest, LooseValue};
use crate::normalization::parse_amount;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Fee rate, business timezone and empty-series fallback.
    pub settings: AnalyticsSettings,
    /// Validated journey tier table.
    pub tiers: TierTable,
}

impl AppState {
    pub fn new(settings: AnalyticsSettings, tiers: TierTable) -> Self {
        Self { settings, tiers }
    }
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "sales-analytics-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/v1/analytics/dashboard
///
/// Aggregates the posted sales into chart series, scalar metrics and
/// journey progress.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `request` - Sales, optional range and upstream summary numbers.
///
/// # Returns
///
/// * `Result<Json<Dashboard>, AppError>` - The dashboard payload.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DashboardRequest>,
) -> Result<Json<Dashboard>, AppError> {
    tracing::info!(
        "POST /analytics/dashboard - {} sale(s), range: {}",
        request.sales.len(),
        request.range.is_some()
    );

    let input = DashboardInput::from_request(&request, &state.settings);
    let today = state.settings.today();
    let dashboard = build_dashboard(&input, &state.settings, &state.tiers, today);

    Ok(Json(dashboard))
}

/// POST /api/v1/analytics/journey
///
/// Scores a lifetime revenue total against the configured tiers.
pub async fn journey(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JourneyRequest>,
) -> Result<Json<JourneyProgress>, AppError> {
    if let LooseValue::Other(value) = &request.lifetime_revenue {
        if !value.is_null() {
            return Err(AppError::BadRequest(
                "lifetimeRevenue must be a number or a numeric string".to_string(),
            ));
        }
    }

    let total = parse_amount(&request.lifetime_revenue);
    tracing::info!("POST /analytics/journey - lifetime revenue {:.2}", total);

    Ok(Json(score_progress(total, &state.tiers)))
}

/// GET /api/v1/analytics/tiers
pub async fn tiers(State(state): State<Arc<AppState>>) -> Json<TierTable> {
    Json(state.tiers.clone())
}

/// Analytics routes, without the outer middleware stack.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/analytics/dashboard", post(dashboard))
        .route("/api/v1/analytics/journey", post(journey))
        .route("/api/v1/analytics/tiers", get(tiers))
}
