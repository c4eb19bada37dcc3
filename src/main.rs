use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;
use workshop_backend::{
    config::{get_config, init_config},
    database::pool::{create_pool, run_migrations},
    routes,
    telemetry::init_tracing,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config();
    init_tracing(config.log_format);

    let pool = create_pool().await?;
    run_migrations(&pool).await?;

    let app_state = AppState::new(pool);
    app_state
        .auth_service
        .bootstrap_admin(config.admin_email.as_deref(), config.admin_password.as_deref())
        .await?;

    let app = routes::app(app_state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
