// ABOUTME: Library root for the Ride With Vic trip core
// ABOUTME: Trip lifecycle, fare calculation, token issuance, and provider clients
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Ride With Vic

//! # Ride With Vic - Trip Core
//!
//! Backend core of the Ride With Vic ride-hailing system: the trip lifecycle
//! engine (`pending -> active -> completed`, with cancellation), fare and
//! discount calculation, OAuth token issuance against external authorization
//! servers, and clients for the fleet-telemetry and ride-estimate providers.
//!
//! The engine depends only on injected seams: a [`storage::StorageProvider`]
//! for persistence and a [`providers::VehicleProvider`] for vehicle positions.
//! UI, routing, and HTTP transport live outside this crate.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vic_ride_core::providers;
//! use vic_ride_core::storage::{Storage, StorageProvider};
//! use vic_ride_core::{CoreConfig, FleetClient, Location, NewTrip, TripEngine};
//!
//! # async fn example() -> Result<(), vic_ride_core::AppError> {
//! let config = CoreConfig::from_env()?;
//! providers::initialize_shared_client(
//!     config.http.timeout_secs,
//!     config.http.connect_timeout_secs,
//! );
//!
//! let storage = Storage::new(&config.storage.url).await?;
//! let store: Arc<dyn StorageProvider> = Arc::new(storage);
//! let fleet = FleetClient::new(config.fleet.clone(), providers::shared_client().clone())
//!     .with_access_token("fleet-access-token");
//!
//! let engine = TripEngine::new(store, Arc::new(fleet));
//! let trip = engine
//!     .create(NewTrip {
//!         customer_id: "customer-1".into(),
//!         vehicle_id: "42".into(),
//!         ..NewTrip::default()
//!     })
//!     .await?;
//! engine
//!     .start(&trip.id, Location::from_coordinates(40.7128, -74.0060))
//!     .await?;
//! # Ok(())
//! # }
//! ```

/// Environment-based configuration
pub mod config;
/// Unified error handling
pub mod errors;
/// Fare models and discount application
pub mod fare;
/// Great-circle distance helpers
pub mod geo;
/// Structured logging setup
pub mod logging;
/// Core data models
pub mod models;
/// OAuth2 token issuance
pub mod oauth2_client;
/// External provider clients and traits
pub mod providers;
/// Storage traits and backends
pub mod storage;
/// Trip lifecycle engine
pub mod trips;

pub use config::CoreConfig;
pub use errors::{AppError, AppResult, ErrorCode};
pub use fare::FareModel;
pub use models::{
    Customer, Location, Receipt, TelemetryPoint, Trip, TripStatus, Vehicle, VehiclePosition,
    VehicleState,
};
pub use oauth2_client::{IssuedToken, TokenIssuer};
pub use providers::{EstimateClient, FareEstimateProvider, FleetClient, VehicleProvider};
pub use storage::{MemoryStorage, SqliteStorage, Storage, StorageProvider};
pub use trips::{EndTripRequest, NewTelemetryPoint, NewTrip, TripEngine};
