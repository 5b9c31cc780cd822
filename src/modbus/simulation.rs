// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Simulated temperature sensor
//!
//! The sensor produces `25 + amplitude·sin(phase) + noise + drift` where the
//! phase advances on every tick while running and the drift is a bounded
//! random walk. Randomness is injected so tests can use a seeded generator.

use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::{debug, info};
use rand::Rng;
use tokio::time;
use tokio_modbus::ExceptionCode;

use super::{
    encode_temperature, AMPLITUDE_REGISTER, PERIOD_REGISTER, RUNNING_REGISTER,
    TEMPERATURE_REGISTER,
};

pub const BASE_TEMPERATURE: f64 = 25.0;
pub const DEFAULT_PERIOD: u16 = 1000;
pub const DEFAULT_AMPLITUDE: u16 = 10;
pub const MIN_PERIOD: u16 = 100;
pub const MAX_PERIOD: u16 = 10_000;
pub const MAX_AMPLITUDE: u16 = 50;
const MAX_DRIFT: f64 = 5.0;
const DRIFT_STEP: f64 = 0.01;
const NOISE_SPAN: f64 = 2.0;

/// Sensor state shared between the ticker and the Modbus service
pub type SharedSensor = Arc<Mutex<SimulatedSensor>>;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedSensor {
    period: u16,
    amplitude: u16,
    running: bool,
    phase: f64,
    drift: f64,
    ticks: u64,
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD, DEFAULT_AMPLITUDE)
    }
}

impl SimulatedSensor {
    /// Create a running sensor; out-of-range values are clamped.
    pub fn new(period: u16, amplitude: u16) -> Self {
        Self {
            period: period.clamp(MIN_PERIOD, MAX_PERIOD),
            amplitude: amplitude.min(MAX_AMPLITUDE),
            running: true,
            phase: 0.0,
            drift: 0.0,
            ticks: 0,
        }
    }

    pub fn shared(self) -> SharedSensor {
        Arc::new(Mutex::new(self))
    }

    pub fn period(&self) -> u16 {
        self.period
    }

    pub fn amplitude(&self) -> u16 {
        self.amplitude
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn drift(&self) -> f64 {
        self.drift
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance the simulation by one update interval.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.running {
            self.phase += 2.0 * PI / (f64::from(self.period) / 100.0);
        }
        let step = (rng.random::<f64>() - 0.5) * DRIFT_STEP;
        self.drift = (self.drift + step).clamp(-MAX_DRIFT, MAX_DRIFT);
        self.ticks += 1;
    }

    /// Sample the current temperature, rounded to one decimal.
    pub fn temperature<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let noise = (rng.random::<f64>() - 0.5) * NOISE_SPAN;
        let value =
            BASE_TEMPERATURE + f64::from(self.amplitude) * self.phase.sin() + noise + self.drift;
        (value * 10.0).round() / 10.0
    }

    /// Read one holding register.
    pub fn read_register<R: Rng + ?Sized>(&self, addr: u16, rng: &mut R) -> Result<u16, ExceptionCode> {
        match addr {
            TEMPERATURE_REGISTER => Ok(encode_temperature(self.temperature(rng))),
            PERIOD_REGISTER => Ok(self.period),
            AMPLITUDE_REGISTER => Ok(self.amplitude),
            RUNNING_REGISTER => Ok(u16::from(self.running)),
            _ => Err(ExceptionCode::IllegalDataAddress),
        }
    }

    /// Read `count` consecutive holding registers starting at `addr`.
    pub fn read_registers<R: Rng + ?Sized>(
        &self,
        addr: u16,
        count: u16,
        rng: &mut R,
    ) -> Result<Vec<u16>, ExceptionCode> {
        (0..count)
            .map(|offset| {
                addr.checked_add(offset)
                    .ok_or(ExceptionCode::IllegalDataAddress)
                    .and_then(|reg| self.read_register(reg, rng))
            })
            .collect()
    }

    /// Write a control register, clamping the value into its valid range.
    ///
    /// The temperature register is read-only.
    pub fn write_register(&mut self, addr: u16, value: u16) -> Result<(), ExceptionCode> {
        match addr {
            PERIOD_REGISTER => self.period = value.clamp(MIN_PERIOD, MAX_PERIOD),
            AMPLITUDE_REGISTER => self.amplitude = value.min(MAX_AMPLITUDE),
            RUNNING_REGISTER => self.running = value > 0,
            _ => return Err(ExceptionCode::IllegalDataAddress),
        }
        debug!("Register {addr} updated to: {value}");
        Ok(())
    }

    /// Write consecutive registers; nothing is written unless every address is writable.
    pub fn write_registers(&mut self, addr: u16, values: &[u16]) -> Result<(), ExceptionCode> {
        let mut staged = self.clone();
        for (offset, value) in values.iter().enumerate() {
            let reg = u16::try_from(offset)
                .ok()
                .and_then(|offset| addr.checked_add(offset))
                .ok_or(ExceptionCode::IllegalDataAddress)?;
            staged.write_register(reg, *value)?;
        }
        *self = staged;
        Ok(())
    }
}

/// Tick the shared sensor every `interval` until `running` is cleared.
pub async fn run_simulation(sensor: SharedSensor, interval: Duration, running: Arc<AtomicBool>) {
    info!("Sensor simulation started ({} ms per tick)", interval.as_millis());
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    while running.load(Ordering::SeqCst) {
        ticker.tick().await;
        let mut rng = rand::rng();
        sensor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tick(&mut rng);
    }
    info!("Sensor simulation stopped");
}
