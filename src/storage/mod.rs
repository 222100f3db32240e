// ABOUTME: Storage abstraction for trips, customers, and vehicles
// ABOUTME: Repository traits with an atomic active-trip claim, plus pluggable backends
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Ride With Vic

//! # Storage Layer
//!
//! The trip core depends only on these repository traits, never on a concrete
//! storage technology. Two backends ship with the crate: an in-memory store
//! for tests and single-process use, and an embedded SQLite store.
//!
//! The "at most one active trip" invariant is enforced here, not by
//! check-then-act in the engine: [`TripStore::claim_active`] is an atomic
//! conditional write on a single sentinel slot, so two concurrent `start`
//! calls cannot both succeed.

/// Storage factory with backend detection from a storage URL
pub mod factory;
/// In-memory backend
pub mod memory;
/// Embedded SQLite backend
pub mod sqlite;

use async_trait::async_trait;

use crate::errors::AppResult;
use crate::models::{Customer, Trip, Vehicle, VehicleState};

pub use factory::Storage;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

/// Persistence operations for trips
#[async_trait]
pub trait TripStore: Send + Sync {
    /// Insert or update a trip record
    async fn save_trip(&self, trip: &Trip) -> AppResult<()>;

    /// Fetch a trip by id
    async fn get_trip(&self, id: &str) -> AppResult<Option<Trip>>;

    /// List all trips, oldest first
    async fn list_trips(&self) -> AppResult<Vec<Trip>>;

    /// List trips for a customer, oldest first
    async fn trips_by_customer(&self, customer_id: &str) -> AppResult<Vec<Trip>>;

    /// List trips for a vehicle, oldest first
    async fn trips_by_vehicle(&self, vehicle_id: &str) -> AppResult<Vec<Trip>>;

    /// Delete a trip; returns whether a record was removed
    async fn delete_trip(&self, id: &str) -> AppResult<bool>;

    /// The currently active trip, if any
    async fn get_active_trip(&self) -> AppResult<Option<Trip>>;

    /// Atomically claim the active-trip slot for `trip_id`
    ///
    /// Returns `true` when the slot was free or already held by `trip_id`,
    /// `false` when another trip holds it. Implementations must make the
    /// check-and-set atomic with respect to concurrent claims.
    async fn claim_active(&self, trip_id: &str) -> AppResult<bool>;

    /// Release the active-trip slot if held by `trip_id`
    async fn release_active(&self, trip_id: &str) -> AppResult<()>;
}

/// Persistence operations for customers
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Insert or update a customer record
    async fn save_customer(&self, customer: &Customer) -> AppResult<()>;

    /// Fetch a customer by id
    async fn get_customer(&self, id: &str) -> AppResult<Option<Customer>>;

    /// List all customers
    async fn list_customers(&self) -> AppResult<Vec<Customer>>;

    /// Delete a customer; returns whether a record was removed
    async fn delete_customer(&self, id: &str) -> AppResult<bool>;
}

/// Persistence operations for vehicles
#[async_trait]
pub trait VehicleStore: Send + Sync {
    /// Insert or update a vehicle record
    async fn save_vehicle(&self, vehicle: &Vehicle) -> AppResult<()>;

    /// Fetch a vehicle by id
    async fn get_vehicle(&self, id: &str) -> AppResult<Option<Vehicle>>;

    /// List all vehicles
    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>>;

    /// Update a vehicle's reachability state; returns the updated record, or
    /// `None` when the vehicle is unknown
    async fn set_vehicle_state(
        &self,
        id: &str,
        state: VehicleState,
    ) -> AppResult<Option<Vehicle>>;
}

/// Combined storage seam consumed by the trip engine
pub trait StorageProvider: TripStore + CustomerStore + VehicleStore {}

impl<T: TripStore + CustomerStore + VehicleStore> StorageProvider for T {}
