// ABOUTME: External provider abstractions for vehicle telemetry and ride estimates
// ABOUTME: Provider traits and the shared pooled HTTP client
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Ride With Vic

//! # External Providers
//!
//! The trip core talks to two external HTTP APIs: a fleet-telemetry provider
//! (vehicle listing, wake commands, location reads) and a ride-estimate
//! provider (price estimates). Both are reached through trait seams so the
//! engine never depends on a concrete provider implementation.

/// Ride-estimate provider client with TTL caching
pub mod estimates;
/// Fleet-telemetry provider client
pub mod fleet;

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};

use crate::errors::AppResult;
use crate::models::{Vehicle, VehiclePosition};

pub use estimates::{EstimateClient, FareEstimate, FareQuote, PriceEstimate, TripEstimate};
pub use fleet::FleetClient;

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default connection timeout in seconds
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Configured timeout values for the shared client
static CLIENT_TIMEOUTS: OnceLock<(u64, u64)> = OnceLock::new();

/// Global shared HTTP client with configured timeouts
static SHARED_CLIENT: OnceLock<Client> = OnceLock::new();

/// Initialize the shared HTTP client timeout configuration
///
/// Call once at startup before any provider client is created. If not called,
/// defaults are used (30s timeout, 10s connect timeout).
pub fn initialize_shared_client(timeout_secs: u64, connect_timeout_secs: u64) {
    let _ = CLIENT_TIMEOUTS.set((timeout_secs, connect_timeout_secs));
}

/// Get the shared HTTP client for provider API calls
///
/// The client uses connection pooling and the configured timeouts.
pub fn shared_client() -> &'static Client {
    SHARED_CLIENT.get_or_init(|| {
        let (timeout, connect_timeout) = CLIENT_TIMEOUTS
            .get()
            .copied()
            .unwrap_or((DEFAULT_TIMEOUT_SECS, DEFAULT_CONNECT_TIMEOUT_SECS));

        ClientBuilder::new()
            .timeout(Duration::from_secs(timeout))
            .connect_timeout(Duration::from_secs(connect_timeout))
            .build()
            .unwrap_or_else(|_| Client::new())
    })
}

/// Vehicle-telemetry provider seam consumed by the trip engine
#[async_trait]
pub trait VehicleProvider: Send + Sync {
    /// List the vehicles visible to the authenticated account
    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>>;

    /// Issue a wake command to a sleeping vehicle
    async fn wake(&self, vehicle_id: &str) -> AppResult<Vehicle>;

    /// Read the vehicle's current position
    ///
    /// Implementations fail with an unavailable error when the vehicle cannot
    /// be reached; the engine propagates that failure without retrying.
    async fn location(&self, vehicle_id: &str) -> AppResult<VehiclePosition>;
}

/// Ride-estimate provider seam
#[async_trait]
pub trait FareEstimateProvider: Send + Sync {
    /// Fetch price estimates for a trip between two coordinate pairs
    async fn price_estimates(
        &self,
        start: (f64, f64),
        end: (f64, f64),
    ) -> AppResult<FareEstimate>;
}
