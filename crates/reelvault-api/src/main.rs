use reelvault_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    reelvault_api::telemetry::init_telemetry();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (database, storage, routes)
    let (_state, router) = reelvault_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    reelvault_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
