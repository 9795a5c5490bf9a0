use std::{io::ErrorKind, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use tracing::{info, warn};

use pi_thermostat_common::ThermostatConfig;

use crate::{
    poller::SensorPoller,
    relay::{RelayError, SimulatedRelay},
    sensor::SimulatedSensor,
    service::ThermostatService,
};

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = load_config()?;
    config
        .validate()
        .context("invalid thermostat configuration")?;

    info!(name = %config.name, "starting thermostat controller");

    let relay = SimulatedRelay::open(&config).context("failed to open relay outputs")?;
    let service = Arc::new(
        ThermostatService::new(config.clone(), Box::new(relay))
            .context("failed to initialize hardware outputs")?,
    );

    let poller = SensorPoller::new(
        SimulatedSensor::new(config.sensor_channel),
        service.clone(),
        Duration::from_millis(config.temperature_check_interval_ms),
    );

    let mut poll_task = tokio::spawn(poller.run());
    let mut tick_task = tokio::spawn(tick_loop(service.clone()));
    spawn_status_log_loop(service.clone());

    tokio::select! {
        result = &mut poll_task => {
            tick_task.abort();
            result.context("sensor poll task panicked")??;
        }
        result = &mut tick_task => {
            poll_task.abort();
            result.context("engine tick task panicked")??;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
            poll_task.abort();
            tick_task.abort();
        }
    }

    // Leave no output energized on the way out.
    service.all_off().context("failed to drive outputs off")?;
    Ok(())
}

/// Fires pending deferred stops; 1s resolution is the scheduler tolerance on
/// the dwell deadline.
async fn tick_loop(service: Arc<ThermostatService>) -> Result<(), RelayError> {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    loop {
        interval.tick().await;
        service.tick()?;
    }
}

fn spawn_status_log_loop(service: Arc<ThermostatService>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(10));
        loop {
            interval.tick().await;
            match serde_json::to_string(&service.status()) {
                Ok(body) => info!("status {body}"),
                Err(err) => warn!("status serialization failed: {err}"),
            }
        }
    });
}

fn load_config() -> anyhow::Result<ThermostatConfig> {
    let path = std::env::var("THERMOSTAT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./thermostat.json"));

    match std::fs::read(&path) {
        Ok(raw) => serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse config at {}", path.display())),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(ThermostatConfig::default()),
        Err(err) => {
            Err(err).with_context(|| format!("failed to read config at {}", path.display()))
        }
    }
}
