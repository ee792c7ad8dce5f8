//! Widget configuration CRUD for the dashboard.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::state::AppState;
use crate::store::WidgetConfig;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigParams {
    #[serde(default)]
    config_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedConfig {
    config_id: String,
    config: WidgetConfig,
}

/// Unknown ids resolve to the default appearance so a freshly embedded
/// widget renders before its owner has saved anything.
async fn fetch_config(
    State(state): State<AppState>,
    Query(params): Query<ConfigParams>,
) -> Response {
    let Some(config_id) = params.config_id else {
        return missing_id();
    };
    let config = state.configs.get(&config_id).unwrap_or_default();
    Json(config).into_response()
}

async fn create_config(
    State(state): State<AppState>,
    Json(config): Json<WidgetConfig>,
) -> Response {
    let config_id = Uuid::new_v4().to_string();
    state.configs.put(&config_id, config.clone());
    Json(CreatedConfig { config_id, config }).into_response()
}

async fn update_config(
    State(state): State<AppState>,
    Query(params): Query<ConfigParams>,
    Json(config): Json<WidgetConfig>,
) -> Response {
    let Some(config_id) = params.config_id else {
        return missing_id();
    };
    state.configs.put(&config_id, config.clone());
    Json(config).into_response()
}

fn missing_id() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "Config ID is required"})),
    )
        .into_response()
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/config",
            get(fetch_config).post(create_config).put(update_config),
        )
        .with_state(state)
}
