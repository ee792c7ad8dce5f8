use std::sync::Arc;

use parlor::remote::RemoteClient;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

mod configuration;
mod error;
mod routes;
mod state;
mod store;

use configuration::Settings;
use state::AppState;
use store::MemoryConfigStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let settings = Settings::new()?;

    let client = RemoteClient::new(&settings.platform.base_url, &settings.platform.api_key)?;
    let state = AppState::new(
        client,
        settings.platform.sender_rule(),
        settings.reply.to_policy(),
        Arc::new(MemoryConfigStore::new()),
    );

    // The widget is embedded cross-origin, so the API must answer preflights.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(settings.server.socket_addr()).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
