use task_manager::{api, logging, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    logging::init(config.log_file.as_deref())?;

    tracing::info!("Starting Task Manager API v{}", env!("CARGO_PKG_VERSION"));

    api::serve(config).await
}
