// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Polling collector against a live simulator and against failing sources

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::time;

use rust_sensor_monitor::acquisition::{PollError, TemperatureCollector, TemperatureSource};
use rust_sensor_monitor::modbus::{self, SimulatedSensor};
use rust_sensor_monitor::sensor::{SensorClient, SensorError};
use rust_sensor_monitor::storage::{ReadingStore, SqliteReadingStore, DEFAULT_SENSOR_ID};

async fn start_sensor() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(modbus::serve(listener, SimulatedSensor::default().shared()));
    addr
}

fn memory_store() -> Arc<SqliteReadingStore> {
    Arc::new(SqliteReadingStore::open_in_memory(DEFAULT_SENSOR_ID).unwrap())
}

/// Fails every other read
struct FlakySource {
    calls: AtomicUsize,
}

#[async_trait]
impl TemperatureSource for FlakySource {
    async fn read_temperature(&self) -> Result<f64, SensorError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call % 2 == 0 {
            Err(SensorError::Timeout(Duration::from_millis(1)))
        } else {
            Ok(21.5)
        }
    }
}

#[tokio::test]
async fn test_poll_once_stores_sensor_temperature() {
    let addr = start_sensor().await;
    let source = Arc::new(SensorClient::new(addr, 1, Duration::from_secs(2)));
    let store = memory_store();
    let collector = TemperatureCollector::new(source, store.clone(), Duration::from_millis(10));

    let reading = collector.poll_once().await.unwrap();
    assert!((24.0..=26.0).contains(&reading.value));

    let stored = store.get_recent_readings(10).await.unwrap();
    assert_eq!(stored, vec![reading]);
}

#[tokio::test]
async fn test_poll_once_reports_sensor_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = Arc::new(SensorClient::new(addr, 1, Duration::from_millis(500)));
    let store = memory_store();
    let collector = TemperatureCollector::new(source, store.clone(), Duration::from_millis(10));

    let err = collector.poll_once().await.unwrap_err();
    assert!(matches!(err, PollError::Sensor(_)));
    assert!(store.get_recent_readings(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_run_keeps_polling_through_failures_until_stopped() {
    let source = Arc::new(FlakySource {
        calls: AtomicUsize::new(0),
    });
    let store = memory_store();
    let collector = Arc::new(TemperatureCollector::new(
        source.clone(),
        store.clone(),
        Duration::from_millis(10),
    ));
    let running = Arc::new(AtomicBool::new(true));

    let task = {
        let collector = collector.clone();
        let running = running.clone();
        tokio::spawn(async move { collector.run(running).await })
    };

    time::sleep(Duration::from_millis(200)).await;
    running.store(false, Ordering::SeqCst);
    time::timeout(Duration::from_secs(1), task)
        .await
        .expect("collector should stop once the flag is cleared")
        .unwrap();

    let calls = source.calls.load(Ordering::SeqCst);
    assert!(calls >= 4, "only {calls} polls");

    let stored = store.get_recent_readings(1000).await.unwrap();
    assert_eq!(stored.len(), calls / 2);
    assert!(stored.iter().all(|reading| reading.value == 21.5));
}
