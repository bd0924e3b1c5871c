use calendar_plugin::startup;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting calendar plugin service");

    // Load configuration
    let config = startup::load_config().await?;

    // Serve packets until input ends or a signal arrives
    startup::start_service(config).await
}
