// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use rocket::Shutdown;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time;

use crate::acquisition::{TemperatureCollector, TemperatureSource};
use crate::config::Config;
use crate::modbus::{self, SimulatedSensor};
use crate::sensor::{SensorClient, SensorController};
use crate::storage::{ReadingStore, SqliteReadingStore};
use crate::timeseries::service::TemperatureService;
use crate::visualization::{build_rocket, figment_from_config, ApiSettings};

const HEARTBEAT_PERIOD: Duration = Duration::from_secs(60);
const FLAG_POLL_PERIOD: Duration = Duration::from_secs(1);
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Supervisor of every background task of the monitor
///
/// All tasks share one `running` flag; [`Daemon::shutdown`] clears it and
/// wakes the tasks that block on something else than the flag.
pub struct Daemon {
    tasks: Vec<JoinHandle<Result<()>>>,
    running: Arc<AtomicBool>,
    rocket_shutdown: Option<Shutdown>,
    modbus_addr: Option<SocketAddr>,
}

impl Default for Daemon {
    fn default() -> Self {
        Self::new()
    }
}

impl Daemon {
    /// Create a new daemon instance
    pub fn new() -> Self {
        Daemon {
            tasks: Vec::new(),
            running: Arc::new(AtomicBool::new(true)),
            rocket_shutdown: None,
            modbus_addr: None,
        }
    }

    /// Launch all configured tasks based on configuration
    ///
    /// The reading store is opened first; the simulator is started before
    /// the collector so that the first poll already finds a listening sensor.
    pub async fn launch(&mut self, config: &Config) -> Result<()> {
        let store = Self::open_store(config).await?;

        if config.modbus.enabled {
            self.start_modbus_server(config).await?;
        }

        let client = Arc::new(Self::sensor_client(config).await?);

        if config.acquisition.enabled {
            self.start_data_acquisition(config, client.clone(), store.clone())?;
        }

        if config.visualization.enabled {
            self.start_web_server(config, client, store).await?;
        }

        self.start_heartbeat()?;

        Ok(())
    }

    async fn open_store(config: &Config) -> Result<Arc<dyn ReadingStore>> {
        let store = SqliteReadingStore::open(&config.storage.database_path, &config.storage.sensor_id)
            .with_context(|| {
                format!(
                    "Failed to open reading store at {}",
                    config.storage.database_path
                )
            })?;
        store
            .initialize_default_sensor()
            .await
            .context("Failed to register the sensor")?;
        Ok(Arc::new(store))
    }

    async fn sensor_client(config: &Config) -> Result<SensorClient> {
        let target = format!("{}:{}", config.sensor.address, config.sensor.port);
        let addr = tokio::net::lookup_host(&target)
            .await
            .with_context(|| format!("Failed to resolve sensor address {target}"))?
            .next()
            .with_context(|| format!("No address found for sensor {target}"))?;
        debug!("Sensor endpoint resolved to {addr}");
        Ok(SensorClient::new(
            addr,
            config.sensor.slave_id,
            config.sensor.timeout(),
        ))
    }

    /// Start the simulated sensor and the Modbus TCP server exposing it
    async fn start_modbus_server(&mut self, config: &Config) -> Result<()> {
        info!(
            "Starting modbus server on {}:{}",
            config.modbus.address, config.modbus.port
        );

        let listener = TcpListener::bind((config.modbus.address.as_str(), config.modbus.port))
            .await
            .with_context(|| {
                format!(
                    "Failed to bind Modbus server on {}:{}",
                    config.modbus.address, config.modbus.port
                )
            })?;
        self.modbus_addr = Some(listener.local_addr()?);

        let sensor =
            SimulatedSensor::new(config.modbus.initial_period, config.modbus.initial_amplitude)
                .shared();

        let tick = Duration::from_millis(config.modbus.update_interval_ms);
        let simulated = sensor.clone();
        let running = self.running.clone();
        self.tasks.push(tokio::spawn(async move {
            modbus::run_simulation(simulated, tick, running).await;
            Ok(())
        }));

        let running = self.running.clone();
        let task = tokio::spawn(async move {
            let server_handle = tokio::spawn(async move {
                if let Err(e) = modbus::serve(listener, sensor).await {
                    error!("Modbus server error: {}", e);
                }
            });

            while running.load(Ordering::SeqCst) && !server_handle.is_finished() {
                time::sleep(FLAG_POLL_PERIOD).await;
            }

            info!("Shutting down Modbus server...");
            server_handle.abort();

            match time::timeout(JOIN_TIMEOUT, server_handle).await {
                Ok(_) => info!("Modbus server shut down successfully"),
                Err(_) => warn!("Modbus server shutdown timed out, forcing termination"),
            }
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Start the polling collector
    fn start_data_acquisition(
        &mut self,
        config: &Config,
        source: Arc<dyn TemperatureSource>,
        store: Arc<dyn ReadingStore>,
    ) -> Result<()> {
        info!("Starting data acquisition task");

        let collector = TemperatureCollector::new(source, store, config.acquisition.interval());
        let running = self.running.clone();
        let task = tokio::spawn(async move {
            collector.run(running).await;
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Start the Rocket web server
    async fn start_web_server(
        &mut self,
        config: &Config,
        client: Arc<SensorClient>,
        store: Arc<dyn ReadingStore>,
    ) -> Result<()> {
        info!(
            "Starting web server on {}:{}",
            config.visualization.address, config.visualization.port
        );

        let figment = figment_from_config(&config.visualization)?;
        if config.visualization.cert.is_some() {
            info!("TLS enabled for web server");
        }

        let rocket = build_rocket(
            figment,
            TemperatureService::new(store),
            SensorController::new(client),
            ApiSettings {
                service_name: config.visualization.name.clone(),
            },
            &config.visualization.cors_origin,
        );

        let ignited = rocket
            .ignite()
            .await
            .context("Failed to configure the web server")?;
        self.rocket_shutdown = Some(ignited.shutdown());

        let task = tokio::spawn(async move {
            ignited.launch().await?;
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Start a heartbeat task that logs system status periodically
    fn start_heartbeat(&mut self) -> Result<()> {
        debug!("Starting heartbeat monitor");

        let running = self.running.clone();
        let task = tokio::spawn(async move {
            let mut elapsed = Duration::ZERO;
            while running.load(Ordering::SeqCst) {
                time::sleep(FLAG_POLL_PERIOD).await;
                elapsed += FLAG_POLL_PERIOD;
                if elapsed >= HEARTBEAT_PERIOD {
                    info!("Daemon heartbeat: running");
                    elapsed = Duration::ZERO;
                }
            }
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Local address of the hosted Modbus server, once started
    pub fn modbus_addr(&self) -> Option<SocketAddr> {
        self.modbus_addr
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop all running tasks
    pub fn shutdown(&self) {
        info!("Shutting down daemon tasks");
        self.running.store(false, Ordering::SeqCst);
        if let Some(shutdown) = &self.rocket_shutdown {
            shutdown.clone().notify();
        }
    }

    /// Wait for all tasks to complete
    ///
    /// Each task gets a few seconds to finish; panics and task errors are
    /// logged, not returned.
    pub async fn join(self) -> Result<()> {
        for task in self.tasks {
            match time::timeout(JOIN_TIMEOUT, task).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => error!("Task failed: {:#}", e),
                Ok(Err(e)) => error!("Task panicked: {}", e),
                Err(_) => warn!("Task did not complete within timeout period, may be hung"),
            }
        }
        Ok(())
    }
}
