// ABOUTME: Fleet-telemetry provider client for vehicle listing, wake, and location
// ABOUTME: Maps provider payloads into Vehicle and VehiclePosition models
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Ride With Vic

//! Fleet-telemetry API client.
//!
//! Wraps the vehicle provider's REST API: bearer-authenticated vehicle
//! listing, wake commands, and location reads from the vehicle's drive state.
//! Transport failures and non-success responses surface as unavailable
//! errors; callers decide whether a wake-and-retry is worth attempting.

use std::str::FromStr;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::VehicleProvider;
use crate::config::FleetApiConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{Vehicle, VehiclePosition, VehicleState};

/// Scopes requested for the fleet authorization-code flow
pub const FLEET_DEFAULT_SCOPES: &str =
    "openid offline_access vehicle_device_data vehicle_cmds vehicle_charging_cmds";

/// Service label used in error messages
const SERVICE: &str = "fleet api";

/// Vehicle record as returned by the fleet API
#[derive(Debug, Deserialize)]
struct VehicleData {
    id: u64,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    vin: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

impl VehicleData {
    fn into_vehicle(self) -> Vehicle {
        let display_name = self.display_name.unwrap_or_default();
        let state = self
            .state
            .as_deref()
            .and_then(|s| VehicleState::from_str(s).ok())
            .unwrap_or(VehicleState::Offline);

        Vehicle {
            id: self.id.to_string(),
            name: display_name.clone(),
            model: self.model.unwrap_or_default(),
            vin: self.vin.unwrap_or_default(),
            display_name,
            state,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListVehiclesResponse {
    response: Vec<VehicleData>,
}

#[derive(Debug, Deserialize)]
struct VehicleResponse {
    response: VehicleData,
}

#[derive(Debug, Deserialize)]
struct DriveState {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    speed: Option<f64>,
    #[serde(default)]
    heading: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct VehicleDataPayload {
    #[serde(default)]
    drive_state: Option<DriveState>,
}

#[derive(Debug, Deserialize)]
struct VehicleDataResponse {
    response: VehicleDataPayload,
}

/// Client for the fleet-telemetry provider
pub struct FleetClient {
    config: FleetApiConfig,
    client: Client,
    access_token: Option<String>,
}

impl FleetClient {
    /// Create a new client with the given configuration and HTTP client
    #[must_use]
    pub fn new(config: FleetApiConfig, client: Client) -> Self {
        Self {
            config,
            client,
            access_token: None,
        }
    }

    /// Attach a bearer access token for authenticated calls
    #[must_use]
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    /// Build the authorization URL for the provider's authorization-code flow
    ///
    /// # Errors
    ///
    /// Returns a config error when the client id or redirect URI is missing,
    /// or the configured auth URL is malformed.
    pub fn authorization_url(&self, state: &str) -> AppResult<String> {
        if self.config.client_id.is_empty() {
            return Err(AppError::config("fleet client id is not configured"));
        }
        let redirect_uri = self
            .config
            .redirect_uri
            .as_deref()
            .ok_or_else(|| AppError::config("fleet redirect URI is not configured"))?;

        let mut url = Url::parse(&format!("{}/authorize", self.config.auth_url))
            .map_err(|e| AppError::config(format!("invalid fleet auth URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", FLEET_DEFAULT_SCOPES)
            .append_pair("state", state);

        Ok(url.into())
    }

    fn bearer_token(&self) -> AppResult<&str> {
        self.access_token
            .as_deref()
            .ok_or_else(|| AppError::auth("fleet client has no access token"))
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> AppResult<T> {
        let url = format!("{}{path}", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(self.bearer_token()?)
            .send()
            .await
            .map_err(|e| AppError::unavailable(SERVICE, format!("request failed: {e}")))?;

        Self::parse_response(response).await
    }

    async fn post_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> AppResult<T> {
        let url = format!("{}{path}", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.bearer_token()?)
            .send()
            .await
            .map_err(|e| AppError::unavailable(SERVICE, format!("request failed: {e}")))?;

        Self::parse_response(response).await
    }

    async fn parse_response<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::unavailable(
                SERVICE,
                format!("returned {status}: {body}"),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::unavailable(SERVICE, format!("malformed response: {e}")))
    }
}

#[async_trait]
impl VehicleProvider for FleetClient {
    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        let payload: ListVehiclesResponse = self.get_json("/api/1/vehicles").await?;
        debug!(count = payload.response.len(), "listed fleet vehicles");
        Ok(payload
            .response
            .into_iter()
            .map(VehicleData::into_vehicle)
            .collect())
    }

    async fn wake(&self, vehicle_id: &str) -> AppResult<Vehicle> {
        info!(vehicle_id, "issuing wake command");
        let payload: VehicleResponse = self
            .post_json(&format!("/api/1/vehicles/{vehicle_id}/wake_up"))
            .await?;
        Ok(payload.response.into_vehicle())
    }

    async fn location(&self, vehicle_id: &str) -> AppResult<VehiclePosition> {
        let payload: VehicleDataResponse = self
            .get_json(&format!("/api/1/vehicles/{vehicle_id}/vehicle_data"))
            .await?;

        let drive_state = payload.response.drive_state.ok_or_else(|| {
            AppError::unavailable(SERVICE, "vehicle is not reporting drive state")
                .with_resource_id(vehicle_id)
        })?;

        Ok(VehiclePosition {
            latitude: drive_state.latitude,
            longitude: drive_state.longitude,
            speed: drive_state.speed,
            heading: drive_state.heading,
        })
    }
}
