mod application;
mod dto;
mod error;
mod repository;
mod routing;
mod service;

use application::ApplicationEnv;
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    #[cfg(debug_assertions)]
    {
        // Ignore error because .env file is not required
        // as long as env variables are set
        let _ = dotenvy::dotenv();
    }

    let env = ApplicationEnv::parse()?;

    application::setup_tracing(&env)?;

    let (state, state_to_close) = application::create_state(&env).await?;
    let app = application::create_application(state);

    tracing::info!(address = %env.bind_address, "starting server");
    let listener = tokio::net::TcpListener::bind(env.bind_address).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(application::shutdown_signal())
    .await?;

    application::close(state_to_close).await;

    tracing::info!("application closed");

    Ok(())
}
