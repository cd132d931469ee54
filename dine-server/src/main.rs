use dine_server::{AppState, Server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = ServerConfig::from_env();
    let _log_guard = dine_server::server::init_logging(&config.data_dir);

    tracing::info!(
        port = config.http_port,
        data_dir = %config.data_dir,
        environment = %config.environment,
        "dine-server starting"
    );

    let state = AppState::initialize(&config)?;
    Server::new(config, state).run().await
}
