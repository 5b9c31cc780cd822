// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::path::PathBuf;

use anyhow::{Context, Result};
use base64::prelude::*;
use log::debug;
use rocket::config::LogLevel;
use rocket::data::{Limits, ToByteUnit};
use rocket::figment::Figment;
use rocket::{catchers, options, Build, Rocket};
use rocket_okapi::{openapi, openapi_get_routes, rapidoc::*, settings::UrlObject};

use super::api::error::{bad_request, internal_error, not_found, unprocessable_entity};
use super::api::{health, sensor, temperatures, ApiSettings};
use super::cors::Cors;
use crate::config::VisualizationConfig;
use crate::sensor::SensorController;
use crate::timeseries::service::TemperatureService;

/// Answers to CORS preflight requests
#[openapi(tag = "Cors")]
#[options("/<_path..>")]
async fn options(_path: PathBuf) -> Result<(), std::io::Error> {
    Ok(())
}

/// Build the Rocket figment from the web server section of the configuration
///
/// Certificate and key are base64-encoded PEM; TLS is enabled only when both
/// are present.
pub fn figment_from_config(config: &VisualizationConfig) -> Result<Figment> {
    let mut figment = rocket::Config::figment()
        .merge(("ident", config.name.clone()))
        .merge(("limits", Limits::new().limit("json", 2.mebibytes())))
        .merge(("address", config.address.clone()))
        .merge(("port", config.port))
        .merge(("log_level", LogLevel::Normal));

    if let (Some(cert), Some(key)) = (&config.cert, &config.key) {
        debug!("SSL certificates found in configuration, enabling TLS");
        let cert_data = BASE64_STANDARD
            .decode(cert)
            .context("Failed to decode TLS certificate")?;
        let key_data = BASE64_STANDARD
            .decode(key)
            .context("Failed to decode TLS key")?;
        figment = figment
            .merge(("tls.certs", cert_data))
            .merge(("tls.key", key_data));
    }

    Ok(figment)
}

/// Assemble the HTTP server
///
/// Mounts the temperature, sensor and health routes together with the
/// generated `/openapi.json`, the RapiDoc UI under `/rapidoc/` and the JSON
/// catchers. Managed state: [`TemperatureService`], [`SensorController`] and
/// [`ApiSettings`].
pub fn build_rocket(
    figment: Figment,
    service: TemperatureService,
    controller: SensorController,
    settings: ApiSettings,
    cors_origin: &str,
) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(Cors::new(cors_origin))
        .mount(
            "/",
            openapi_get_routes![
                temperatures::get_temperatures,
                temperatures::get_temperature_stats,
                temperatures::get_recent_temperatures,
                sensor::get_sensor_status,
                sensor::control_sensor,
                health::health,
                options,
            ],
        )
        .mount(
            "/rapidoc/",
            make_rapidoc(&RapiDocConfig {
                title: Some(format!("{} API Doc", settings.service_name)),
                general: GeneralConfig {
                    spec_urls: vec![UrlObject::new("General", "../openapi.json")],
                    ..Default::default()
                },
                hide_show: HideShowConfig {
                    allow_spec_url_load: false,
                    allow_spec_file_load: false,
                    ..Default::default()
                },
                ..Default::default()
            }),
        )
        .register(
            "/",
            catchers![not_found, bad_request, unprocessable_entity, internal_error],
        )
        .manage(service)
        .manage(controller)
        .manage(settings)
}
