mod config;
mod error;
mod groq;
mod line;
mod scanner;
mod supervisor;

use btleplug::api::Manager as _;
use btleplug::platform::Manager;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use plantita_monitor::store::PlantStore;

use crate::config::Config;
use crate::groq::GroqAdviceClient;
use crate::line::LineNotifier;
use crate::supervisor::ConnectionSupervisor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for structured logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = Config::from_env()?;
    info!(
        data_dir = %config.data_dir.display(),
        device_name_filter = %config.device_name_filter,
        "Plantita monitor starting"
    );

    let store = PlantStore::new(&config.data_dir).await?;

    let manager = Manager::new().await?;
    let adapter = manager
        .adapters()
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("No Bluetooth adapter available"))?;

    let http = reqwest::Client::new();
    let sink = LineNotifier::new(http.clone(), config.channel_access_token.clone());
    let advice = GroqAdviceClient::new(
        http,
        config.groq_api_key.clone(),
        config.groq_model.clone(),
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("Shutdown signal received");
        let _ = stop_tx.send(true);
    });

    let supervisor = ConnectionSupervisor::new(adapter, config, store, sink, advice, stop_rx);
    supervisor.run().await?;

    info!("Plantita monitor stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
