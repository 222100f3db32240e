// ABOUTME: Core data models for the Ride With Vic trip core
// ABOUTME: Defines Trip, Customer, Vehicle, telemetry, and receipt data structures
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Ride With Vic

//! # Data Models
//!
//! Core data structures shared across the trip lifecycle engine, the storage
//! layer, and the provider clients.
//!
//! ## Design Principles
//!
//! - **Provider Agnostic**: vehicle and estimate payloads are mapped into these
//!   types at the client boundary, never leaked through the engine
//! - **Serializable**: every model round-trips through JSON (the storage
//!   backends persist records as JSON documents)
//! - **Type Safe**: lifecycle states and monetary fields are explicit, not
//!   stringly-typed

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Lifecycle state of a [`Trip`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    /// Created but not yet started
    Pending,
    /// Underway; telemetry is being accumulated
    Active,
    /// Finished; monetary fields and receipt are final
    Completed,
    /// Abandoned before completion; no fare computed
    Cancelled,
}

impl TripStatus {
    /// Whether the trip is in a terminal state
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl Display for TripStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl FromStr for TripStatus {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(AppError::validation(format!("unknown trip status: {other}"))),
        }
    }
}

/// A named geographic location
///
/// Coordinates are optional because an end location is unknown until the trip
/// ends; `address` and `label` are caller-supplied display strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees
    pub longitude: Option<f64>,
    /// Free-form address string
    #[serde(default)]
    pub address: String,
    /// Optional short label ("Home", "Airport", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Location {
    /// Build a location from coordinates
    #[must_use]
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            ..Self::default()
        }
    }

    /// Coordinate pair, when both components are present
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// A single location sample recorded during an active trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPoint {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Sample time
    pub timestamp: DateTime<Utc>,
    /// Speed in km/h, when the provider reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Compass heading in degrees, when the provider reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
}

/// Receipt metadata attached to a completed trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// Receipt identifier (`RCV-` prefixed)
    pub id: String,
    /// Whether the receipt has been generated
    pub generated: bool,
    /// Download URL, when one has been published
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Receipt {
    /// Mint a fresh receipt with a unique id
    #[must_use]
    pub fn generate() -> Self {
        Self {
            id: format!("RCV-{}", Uuid::new_v4().simple()),
            generated: true,
            url: None,
        }
    }
}

/// A single ride session from pickup to drop-off
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    /// Opaque unique identifier, assigned at creation
    pub id: String,
    /// Reference to the customer taking the trip
    pub customer_id: String,
    /// Reference to the vehicle serving the trip
    pub vehicle_id: String,
    /// Lifecycle state
    pub status: TripStatus,
    /// Set on the transition to `Active`, never earlier
    pub start_time: Option<DateTime<Utc>>,
    /// Set on the transition to `Completed`, never earlier
    pub end_time: Option<DateTime<Utc>>,
    /// Pickup location
    pub start_location: Location,
    /// Drop-off location; coordinates stay unset until the trip ends
    pub end_location: Location,
    /// Quoted fare at creation time (zero when no quote was taken)
    pub estimated_fare: f64,
    /// Computed fare before discount; zero until the trip ends
    pub actual_fare: f64,
    /// Discount percentage in `[0, 100]`
    pub discount_percent: f64,
    /// `actual_fare * discount_percent / 100`; zero until the trip ends
    pub discount_amount: f64,
    /// `actual_fare - discount_amount`; zero until the trip ends
    pub final_fare: f64,
    /// Ordered location samples, append-only while the trip is active
    pub telemetry_data: Vec<TelemetryPoint>,
    /// Free-form caller-supplied notes
    #[serde(default)]
    pub notes: String,
    /// Free-form caller-supplied payment method
    #[serde(default)]
    pub payment_method: String,
    /// Receipt metadata, present once the trip has completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<Receipt>,
    /// Record creation time
    pub created_at: DateTime<Utc>,
}

impl Trip {
    /// Whether the trip is currently active
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == TripStatus::Active
    }
}

/// A rider referenced by trips
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Opaque unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Contact email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Contact phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Free-form preference blob (preferred tier, saved addresses, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<serde_json::Value>,
}

/// Reachability state of a fleet vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleState {
    /// Reachable and reporting telemetry
    Online,
    /// Asleep or unreachable
    Offline,
    /// A wake command has been issued; not yet reachable
    Waking,
}

impl Display for VehicleState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Waking => "waking",
        };
        write!(f, "{s}")
    }
}

impl FromStr for VehicleState {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s {
            "online" => Ok(Self::Online),
            // The fleet API reports sleeping vehicles as "asleep"
            "offline" | "asleep" => Ok(Self::Offline),
            "waking" => Ok(Self::Waking),
            other => Err(AppError::validation(format!(
                "unknown vehicle state: {other}"
            ))),
        }
    }
}

/// A fleet vehicle, mirrored locally from the telemetry provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    /// Provider-assigned vehicle id
    pub id: String,
    /// Vehicle name
    pub name: String,
    /// Model designation
    pub model: String,
    /// Vehicle identification number
    pub vin: String,
    /// Name shown to riders
    pub display_name: String,
    /// Reachability state
    pub state: VehicleState,
}

/// A vehicle's current position as reported by the telemetry provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehiclePosition {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Speed in km/h, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Compass heading in degrees, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
}
