// Export route modules
pub mod chat;
pub mod status;
pub mod widget_config;

use axum::Router;

use crate::state::AppState;

// Function to configure all routes
pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(chat::routes(state.clone()))
        .merge(widget_config::routes(state))
        .merge(status::routes())
}
