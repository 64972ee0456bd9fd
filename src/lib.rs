pub mod catalog; // Register catalog: category + address indexes
pub mod channels; // Inter-component communication channels
pub mod config; // Configuration management
pub mod coordinator; // Polling coordinator and write path
pub mod error; // Error taxonomy
pub mod options; // Command line options parsing
pub mod prelude; // Common imports and types
pub mod profile; // Register profile loading
pub mod scheduler; // Poll cycle scheduling
pub mod transport; // Modbus TCP session

const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use crate::prelude::*;
use crate::transport::ModbusTransport;

pub fn init_logging(default_filter: &str) {
    let result = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter),
    )
    .format(|buf, record| {
        writeln!(
            buf,
            "[{} {} {}] {}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
            record.level(),
            record.module_path().unwrap_or(""),
            record.args()
        )
    })
    .write_style(env_logger::WriteStyle::Never)
    .try_init();

    if let Err(err) = result {
        debug!("logger already initialised: {}", err);
    }
}

/// Main application loop: one coordinator and scheduler per enabled
/// device, stopped together on the shutdown signal.
pub async fn app(mut shutdown_rx: broadcast::Receiver<()>, config: Arc<Config>) -> Result<()> {
    info!("starting ed300-bridge {}", CARGO_PKG_VERSION);

    // Explicit registry of coordinators, keyed by host:unit_id.
    let mut coordinators: HashMap<String, Arc<Coordinator>> = HashMap::new();
    let mut device_channels = Vec::new();
    let mut scheduler_handles = Vec::new();

    for device in config.enabled_devices() {
        let id = device.identifier();
        let catalog = Arc::new(profile::load(device.model())?);
        info!(
            "{}: loaded profile for {} {} ({} registers)",
            id,
            catalog.device().manufacturer,
            catalog.device().model,
            catalog.register_count()
        );

        let channels = Channels::new();
        let transport = Box::new(ModbusTransport::new(
            device.host(),
            device.port(),
            device.unit_id(),
        ));
        let coordinator = Arc::new(Coordinator::new(
            device.clone(),
            catalog,
            transport,
            channels.clone(),
        ));

        let scheduler = Scheduler::new(device.clone(), channels.clone(), coordinator.clone());
        info!("{}: starting scheduler, interval {}s", id, device.scan_interval());
        let handle = tokio::spawn(async move {
            if let Err(err) = scheduler.start().await {
                error!("scheduler task failed: {}", err);
            }
        });

        scheduler_handles.push(handle);
        device_channels.push(channels);
        coordinators.insert(id, coordinator);
    }

    let _ = shutdown_rx.recv().await;
    info!(
        "shutdown signal received, stopping {} device(s)",
        coordinators.len()
    );

    // Stop the poll loops first so nothing races the session close.
    for channels in &device_channels {
        let _ = channels.to_scheduler.send(scheduler::ChannelData::Shutdown);
    }
    for result in futures::future::join_all(scheduler_handles).await {
        if let Err(err) = result {
            error!("error waiting for scheduler task: {}", err);
        }
    }
    for (id, coordinator) in &coordinators {
        debug!("{}: closing modbus session", id);
        coordinator.close().await;
    }

    info!("shutdown complete");
    Ok(())
}

pub async fn run(config: Config) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl+c: {}", err);
        }
        let _ = shutdown_tx_clone.send(());
    });

    app(shutdown_rx, Arc::new(config)).await
}
