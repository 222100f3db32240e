// ABOUTME: In-memory storage backend for tests and single-process deployments
// ABOUTME: RwLock-guarded entity maps with a mutexed active-trip sentinel
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Ride With Vic

//! In-memory storage backend.
//!
//! Entity records live in `RwLock`-guarded maps; the active-trip sentinel is a
//! separate mutex so claim/release are atomic with respect to concurrent
//! starts. State is lost when the process exits.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use super::{CustomerStore, TripStore, VehicleStore};
use crate::errors::AppResult;
use crate::models::{Customer, Trip, Vehicle, VehicleState};

/// In-memory storage backend
#[derive(Clone, Default)]
pub struct MemoryStorage {
    trips: Arc<RwLock<HashMap<String, Trip>>>,
    customers: Arc<RwLock<HashMap<String, Customer>>>,
    vehicles: Arc<RwLock<HashMap<String, Vehicle>>>,
    active_trip: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    /// Create an empty in-memory store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn sort_trips(mut trips: Vec<Trip>) -> Vec<Trip> {
        trips.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        trips
    }
}

#[async_trait]
impl TripStore for MemoryStorage {
    async fn save_trip(&self, trip: &Trip) -> AppResult<()> {
        self.trips
            .write()
            .await
            .insert(trip.id.clone(), trip.clone());
        Ok(())
    }

    async fn get_trip(&self, id: &str) -> AppResult<Option<Trip>> {
        Ok(self.trips.read().await.get(id).cloned())
    }

    async fn list_trips(&self) -> AppResult<Vec<Trip>> {
        let trips = self.trips.read().await.values().cloned().collect();
        Ok(Self::sort_trips(trips))
    }

    async fn trips_by_customer(&self, customer_id: &str) -> AppResult<Vec<Trip>> {
        let trips = self
            .trips
            .read()
            .await
            .values()
            .filter(|t| t.customer_id == customer_id)
            .cloned()
            .collect();
        Ok(Self::sort_trips(trips))
    }

    async fn trips_by_vehicle(&self, vehicle_id: &str) -> AppResult<Vec<Trip>> {
        let trips = self
            .trips
            .read()
            .await
            .values()
            .filter(|t| t.vehicle_id == vehicle_id)
            .cloned()
            .collect();
        Ok(Self::sort_trips(trips))
    }

    async fn delete_trip(&self, id: &str) -> AppResult<bool> {
        let removed = self.trips.write().await.remove(id).is_some();
        if removed {
            let mut active = self.active_trip.lock().await;
            if active.as_deref() == Some(id) {
                *active = None;
            }
        }
        Ok(removed)
    }

    async fn get_active_trip(&self) -> AppResult<Option<Trip>> {
        let active_id = self.active_trip.lock().await.clone();
        match active_id {
            Some(id) => {
                let trip = self.trips.read().await.get(&id).cloned();
                Ok(trip.filter(Trip::is_active))
            }
            None => Ok(None),
        }
    }

    async fn claim_active(&self, trip_id: &str) -> AppResult<bool> {
        let mut active = self.active_trip.lock().await;
        match active.as_deref() {
            Some(existing) if existing != trip_id => Ok(false),
            _ => {
                *active = Some(trip_id.to_owned());
                Ok(true)
            }
        }
    }

    async fn release_active(&self, trip_id: &str) -> AppResult<()> {
        let mut active = self.active_trip.lock().await;
        if active.as_deref() == Some(trip_id) {
            *active = None;
        }
        Ok(())
    }
}

#[async_trait]
impl CustomerStore for MemoryStorage {
    async fn save_customer(&self, customer: &Customer) -> AppResult<()> {
        self.customers
            .write()
            .await
            .insert(customer.id.clone(), customer.clone());
        Ok(())
    }

    async fn get_customer(&self, id: &str) -> AppResult<Option<Customer>> {
        Ok(self.customers.read().await.get(id).cloned())
    }

    async fn list_customers(&self) -> AppResult<Vec<Customer>> {
        let mut customers: Vec<Customer> =
            self.customers.read().await.values().cloned().collect();
        customers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(customers)
    }

    async fn delete_customer(&self, id: &str) -> AppResult<bool> {
        Ok(self.customers.write().await.remove(id).is_some())
    }
}

#[async_trait]
impl VehicleStore for MemoryStorage {
    async fn save_vehicle(&self, vehicle: &Vehicle) -> AppResult<()> {
        self.vehicles
            .write()
            .await
            .insert(vehicle.id.clone(), vehicle.clone());
        Ok(())
    }

    async fn get_vehicle(&self, id: &str) -> AppResult<Option<Vehicle>> {
        Ok(self.vehicles.read().await.get(id).cloned())
    }

    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        let mut vehicles: Vec<Vehicle> = self.vehicles.read().await.values().cloned().collect();
        vehicles.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(vehicles)
    }

    async fn set_vehicle_state(
        &self,
        id: &str,
        state: VehicleState,
    ) -> AppResult<Option<Vehicle>> {
        let mut vehicles = self.vehicles.write().await;
        Ok(vehicles.get_mut(id).map(|vehicle| {
            vehicle.state = state;
            vehicle.clone()
        }))
    }
}
