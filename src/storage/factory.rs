// ABOUTME: Storage factory with backend detection from the storage URL
// ABOUTME: Wraps memory and SQLite backends behind a single delegating enum
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Ride With Vic

//! Storage factory.
//!
//! Detects the backend from the configured storage URL (`memory:` for the
//! in-process store, `sqlite:` for the embedded database) and wraps it in a
//! delegating enum so callers hold one concrete type.

use async_trait::async_trait;
use tracing::info;

use super::{CustomerStore, MemoryStorage, SqliteStorage, TripStore, VehicleStore};
use crate::errors::{AppError, AppResult};
use crate::models::{Customer, Trip, Vehicle, VehicleState};

/// Supported storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// In-process, non-persistent
    Memory,
    /// Embedded SQLite database
    Sqlite,
}

/// Detect the storage backend from a storage URL
///
/// # Errors
///
/// Returns a config error for unrecognized URL schemes.
pub fn detect_storage_type(url: &str) -> AppResult<StorageType> {
    if url == "memory:" || url.starts_with("memory://") {
        Ok(StorageType::Memory)
    } else if url.starts_with("sqlite:") {
        Ok(StorageType::Sqlite)
    } else {
        Err(AppError::config(format!(
            "unsupported storage URL: {url} (expected memory: or sqlite:)"
        )))
    }
}

/// Storage instance that delegates to the detected backend
#[derive(Clone)]
pub enum Storage {
    /// In-memory backend
    Memory(MemoryStorage),
    /// SQLite backend
    Sqlite(SqliteStorage),
}

impl Storage {
    /// Create a storage instance from a storage URL
    ///
    /// # Errors
    ///
    /// Returns a config error for unsupported URLs and a storage error when
    /// the backend fails to initialize.
    pub async fn new(url: &str) -> AppResult<Self> {
        match detect_storage_type(url)? {
            StorageType::Memory => {
                info!("initializing in-memory storage");
                Ok(Self::Memory(MemoryStorage::new()))
            }
            StorageType::Sqlite => {
                info!("initializing SQLite storage");
                let storage = SqliteStorage::new(url).await?;
                Ok(Self::Sqlite(storage))
            }
        }
    }

    /// Short description of the active backend
    #[must_use]
    pub const fn backend_info(&self) -> &'static str {
        match self {
            Self::Memory(_) => "in-memory (non-persistent)",
            Self::Sqlite(_) => "SQLite (embedded)",
        }
    }
}

macro_rules! delegate {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        match $self {
            Storage::Memory(inner) => inner.$method($($arg),*).await,
            Storage::Sqlite(inner) => inner.$method($($arg),*).await,
        }
    };
}

#[async_trait]
impl TripStore for Storage {
    async fn save_trip(&self, trip: &Trip) -> AppResult<()> {
        delegate!(self, save_trip, trip)
    }

    async fn get_trip(&self, id: &str) -> AppResult<Option<Trip>> {
        delegate!(self, get_trip, id)
    }

    async fn list_trips(&self) -> AppResult<Vec<Trip>> {
        delegate!(self, list_trips)
    }

    async fn trips_by_customer(&self, customer_id: &str) -> AppResult<Vec<Trip>> {
        delegate!(self, trips_by_customer, customer_id)
    }

    async fn trips_by_vehicle(&self, vehicle_id: &str) -> AppResult<Vec<Trip>> {
        delegate!(self, trips_by_vehicle, vehicle_id)
    }

    async fn delete_trip(&self, id: &str) -> AppResult<bool> {
        delegate!(self, delete_trip, id)
    }

    async fn get_active_trip(&self) -> AppResult<Option<Trip>> {
        delegate!(self, get_active_trip)
    }

    async fn claim_active(&self, trip_id: &str) -> AppResult<bool> {
        delegate!(self, claim_active, trip_id)
    }

    async fn release_active(&self, trip_id: &str) -> AppResult<()> {
        delegate!(self, release_active, trip_id)
    }
}

#[async_trait]
impl CustomerStore for Storage {
    async fn save_customer(&self, customer: &Customer) -> AppResult<()> {
        delegate!(self, save_customer, customer)
    }

    async fn get_customer(&self, id: &str) -> AppResult<Option<Customer>> {
        delegate!(self, get_customer, id)
    }

    async fn list_customers(&self) -> AppResult<Vec<Customer>> {
        delegate!(self, list_customers)
    }

    async fn delete_customer(&self, id: &str) -> AppResult<bool> {
        delegate!(self, delete_customer, id)
    }
}

#[async_trait]
impl VehicleStore for Storage {
    async fn save_vehicle(&self, vehicle: &Vehicle) -> AppResult<()> {
        delegate!(self, save_vehicle, vehicle)
    }

    async fn get_vehicle(&self, id: &str) -> AppResult<Option<Vehicle>> {
        delegate!(self, get_vehicle, id)
    }

    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        delegate!(self, list_vehicles)
    }

    async fn set_vehicle_state(
        &self,
        id: &str,
        state: VehicleState,
    ) -> AppResult<Option<Vehicle>> {
        delegate!(self, set_vehicle_state, id, state)
    }
}
