use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;

use ringback::core::Config;
use ringback::database::Database;
use ringback::features::reminders::{LogSink, ReminderScheduler, VapiClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting Ringback reminder dispatcher...");

    let database = Database::new(&config.database_path).await.map_err(|e| {
        error!("Failed to open database at {}: {e:#}", config.database_path);
        e
    })?;
    info!("Database ready at {}", config.database_path);

    let gateway = VapiClient::new(
        config.vapi_api_key.clone(),
        config.vapi_phone_number_id.clone(),
        config.vapi_base_url.clone(),
        Duration::from_secs(config.call_timeout_secs),
    )?;

    let scheduler = ReminderScheduler::new(
        database,
        Arc::new(gateway),
        Arc::new(LogSink),
        Duration::from_secs(config.poll_interval_secs),
    );

    scheduler.start().await;
    info!(
        "Polling for due reminders every {}s (call timeout {}s)",
        config.poll_interval_secs, config.call_timeout_secs
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping scheduler...");
    scheduler.stop().await;
    info!("Ringback stopped cleanly");

    Ok(())
}
