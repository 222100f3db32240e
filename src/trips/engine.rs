// ABOUTME: Trip lifecycle engine - create, start, telemetry accumulation, end, cancel
// ABOUTME: Enforces the single-active-trip invariant and computes distance, fare, and discount
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Ride With Vic

//! # Trip Lifecycle Engine
//!
//! The only component allowed to move trips through their lifecycle:
//! `pending -> active -> completed`, with `cancelled` reachable from `pending`
//! and `active`. All mutation goes through the injected [`StorageProvider`];
//! vehicle positions come from the injected [`VehicleProvider`].
//!
//! The single-active-trip invariant is enforced by the store's atomic claim
//! operation, taken before the status write on `start` and released on `end`,
//! `cancel`, and `delete`. External failures surface immediately; the engine
//! never retries. The one deliberately non-fatal side effect is the vehicle
//! state update after a trip ends, which is logged and swallowed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::fare::{self, FareModel};
use crate::geo;
use crate::models::{Location, Receipt, TelemetryPoint, Trip, TripStatus, VehicleState};
use crate::providers::VehicleProvider;
use crate::storage::StorageProvider;

/// Request payload for creating a trip
#[derive(Debug, Clone, Default)]
pub struct NewTrip {
    /// Customer taking the trip
    pub customer_id: String,
    /// Vehicle serving the trip
    pub vehicle_id: String,
    /// Quoted fare, when an estimate was taken
    pub estimated_fare: Option<f64>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Payment method label
    pub payment_method: Option<String>,
    /// Discount percentage to apply at trip end
    pub discount_percent: Option<f64>,
}

/// A telemetry sample as supplied by callers
///
/// The timestamp is optional; the engine stamps the arrival time when the
/// caller omits it.
#[derive(Debug, Clone)]
pub struct NewTelemetryPoint {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Sample time; defaults to now
    pub timestamp: Option<DateTime<Utc>>,
    /// Speed in km/h
    pub speed: Option<f64>,
    /// Compass heading in degrees
    pub heading: Option<f64>,
}

/// Request payload for ending a trip
#[derive(Debug, Clone, Default)]
pub struct EndTripRequest {
    /// Drop-off location; defaults to the vehicle's current position
    pub end_location: Option<Location>,
    /// Fare override; defaults to the distance-derived fare
    pub actual_fare: Option<f64>,
    /// Discount override; defaults to the trip's stored percentage
    pub discount_percent: Option<f64>,
    /// Notes override
    pub notes: Option<String>,
}

/// The trip lifecycle engine
pub struct TripEngine {
    store: Arc<dyn StorageProvider>,
    vehicles: Arc<dyn VehicleProvider>,
    fare_model: FareModel,
}

impl TripEngine {
    /// Create an engine over the given storage and vehicle provider
    ///
    /// Trip-end fares default to the distance-only model; override with
    /// [`TripEngine::with_fare_model`].
    #[must_use]
    pub fn new(store: Arc<dyn StorageProvider>, vehicles: Arc<dyn VehicleProvider>) -> Self {
        Self {
            store,
            vehicles,
            fare_model: FareModel::distance_only(),
        }
    }

    /// Use a different fare model for trip-end fare derivation
    #[must_use]
    pub fn with_fare_model(mut self, fare_model: FareModel) -> Self {
        self.fare_model = fare_model;
        self
    }

    /// Create a trip in the `pending` state
    ///
    /// # Errors
    ///
    /// Returns a validation error when the customer or vehicle id is empty,
    /// the estimated fare is negative, or the discount percentage falls
    /// outside `[0, 100]`.
    pub async fn create(&self, request: NewTrip) -> AppResult<Trip> {
        if request.customer_id.trim().is_empty() {
            return Err(AppError::validation("customer id must not be empty"));
        }
        if request.vehicle_id.trim().is_empty() {
            return Err(AppError::validation("vehicle id must not be empty"));
        }

        let estimated_fare = request.estimated_fare.unwrap_or(0.0);
        if !estimated_fare.is_finite() || estimated_fare < 0.0 {
            return Err(AppError::validation("estimated fare must not be negative"));
        }

        let discount_percent = request.discount_percent.unwrap_or(0.0);
        fare::validate_discount_percent(discount_percent)?;

        let trip = Trip {
            id: Uuid::new_v4().to_string(),
            customer_id: request.customer_id,
            vehicle_id: request.vehicle_id,
            status: TripStatus::Pending,
            start_time: None,
            end_time: None,
            start_location: Location::default(),
            end_location: Location::default(),
            estimated_fare,
            actual_fare: 0.0,
            discount_percent,
            discount_amount: 0.0,
            final_fare: 0.0,
            telemetry_data: Vec::new(),
            notes: request.notes.unwrap_or_default(),
            payment_method: request.payment_method.unwrap_or_default(),
            receipt: None,
            created_at: Utc::now(),
        };

        self.store.save_trip(&trip).await?;
        info!(
            trip_id = %trip.id,
            customer_id = %trip.customer_id,
            vehicle_id = %trip.vehicle_id,
            "created trip"
        );
        Ok(trip)
    }

    /// Start a pending trip
    ///
    /// Claims the active-trip slot atomically before any state is written, so
    /// racing starts cannot both succeed.
    ///
    /// # Errors
    ///
    /// - not-found when the trip does not exist
    /// - invalid-state when the trip is not `pending`
    /// - conflict when another trip is already active
    /// - validation when the start location has no coordinates
    pub async fn start(&self, trip_id: &str, start_location: Location) -> AppResult<Trip> {
        let (latitude, longitude) = start_location
            .coordinates()
            .ok_or_else(|| AppError::validation("start location requires coordinates"))?;

        let mut trip = self.require_trip(trip_id).await?;

        if trip.status != TripStatus::Pending {
            return Err(AppError::invalid_state(format!(
                "cannot start trip with status {}",
                trip.status
            ))
            .with_resource_id(trip_id));
        }

        if !self.store.claim_active(trip_id).await? {
            return Err(
                AppError::conflict("another trip is already active").with_resource_id(trip_id)
            );
        }

        let now = Utc::now();
        trip.status = TripStatus::Active;
        trip.start_time = Some(now);
        trip.start_location = start_location;
        trip.telemetry_data = vec![TelemetryPoint {
            latitude,
            longitude,
            timestamp: now,
            speed: Some(0.0),
            heading: None,
        }];

        if let Err(save_err) = self.store.save_trip(&trip).await {
            if let Err(release_err) = self.store.release_active(trip_id).await {
                warn!(
                    trip_id,
                    error = %release_err,
                    "failed to release active claim after save failure"
                );
            }
            return Err(save_err);
        }

        info!(trip_id, vehicle_id = %trip.vehicle_id, "started trip");
        Ok(trip)
    }

    /// Append a telemetry point to an active trip
    ///
    /// Points are stored in arrival order; no deduplication or reordering.
    ///
    /// # Errors
    ///
    /// - not-found when the trip does not exist
    /// - invalid-state when the trip is not `active`
    pub async fn add_telemetry(
        &self,
        trip_id: &str,
        point: NewTelemetryPoint,
    ) -> AppResult<Trip> {
        let mut trip = self.require_trip(trip_id).await?;

        if trip.status != TripStatus::Active {
            return Err(AppError::invalid_state(format!(
                "cannot record telemetry for trip with status {}",
                trip.status
            ))
            .with_resource_id(trip_id));
        }

        trip.telemetry_data.push(TelemetryPoint {
            latitude: point.latitude,
            longitude: point.longitude,
            timestamp: point.timestamp.unwrap_or_else(Utc::now),
            speed: point.speed,
            heading: point.heading,
        });

        self.store.save_trip(&trip).await?;
        Ok(trip)
    }

    /// End an active trip, computing distance, fare, discount, and receipt
    ///
    /// When no end location is supplied, the vehicle's current position is
    /// read from the telemetry provider and that failure propagates. The
    /// vehicle-state update afterwards is best-effort: trip completion
    /// succeeds even if it fails.
    ///
    /// # Errors
    ///
    /// - not-found when the trip does not exist
    /// - invalid-state when the trip is not `active` (ending twice fails)
    /// - unavailable when the vehicle position is needed but unreachable
    /// - validation when a supplied fare or discount is out of range
    pub async fn end(&self, trip_id: &str, request: EndTripRequest) -> AppResult<Trip> {
        let mut trip = self.require_trip(trip_id).await?;

        if trip.status != TripStatus::Active {
            return Err(AppError::invalid_state(format!(
                "cannot end trip with status {}",
                trip.status
            ))
            .with_resource_id(trip_id));
        }

        let end_location = match request.end_location {
            Some(location) => {
                if location.coordinates().is_none() {
                    return Err(AppError::validation("end location requires coordinates"));
                }
                location
            }
            None => {
                let position = self.vehicles.location(&trip.vehicle_id).await?;
                Location::from_coordinates(position.latitude, position.longitude)
            }
        };

        let now = Utc::now();
        let distance_km = Self::trip_distance_km(&trip, &end_location);
        let duration_min = trip
            .start_time
            .map_or(0.0, |start| (now - start).num_seconds() as f64 / 60.0);

        let actual_fare = match request.actual_fare {
            Some(fare) => {
                if !fare.is_finite() || fare < 0.0 {
                    return Err(AppError::validation("actual fare must not be negative"));
                }
                fare
            }
            None => self.fare_model.quote(distance_km, duration_min, 1.0)?,
        };

        let discount_percent = match request.discount_percent {
            Some(percent) => {
                fare::validate_discount_percent(percent)?;
                percent
            }
            None => trip.discount_percent,
        };
        let discount = fare::apply_discount(actual_fare, discount_percent)?;

        trip.status = TripStatus::Completed;
        trip.end_time = Some(now);
        trip.end_location = end_location;
        trip.actual_fare = actual_fare;
        trip.discount_percent = discount_percent;
        trip.discount_amount = discount.discount_amount;
        trip.final_fare = discount.final_amount;
        if let Some(notes) = request.notes {
            trip.notes = notes;
        }
        trip.receipt = Some(Receipt::generate());

        self.store.save_trip(&trip).await?;

        // The trip is committed; a failed release would only block future
        // starts, so it is logged rather than failing the completed trip
        if let Err(e) = self.store.release_active(trip_id).await {
            warn!(trip_id, error = %e, "failed to release active claim after trip end");
        }

        if let Err(e) = self
            .store
            .set_vehicle_state(&trip.vehicle_id, VehicleState::Online)
            .await
        {
            warn!(
                trip_id,
                vehicle_id = %trip.vehicle_id,
                error = %e,
                "could not update vehicle state after trip end"
            );
        }

        info!(
            trip_id,
            distance_km,
            fare = trip.final_fare,
            "ended trip"
        );
        Ok(trip)
    }

    /// Cancel a pending or active trip
    ///
    /// Cancelling an active trip releases the active-trip slot. No fare is
    /// computed.
    ///
    /// # Errors
    ///
    /// - not-found when the trip does not exist
    /// - invalid-state when the trip has already completed or been cancelled
    pub async fn cancel(&self, trip_id: &str) -> AppResult<Trip> {
        let mut trip = self.require_trip(trip_id).await?;

        match trip.status {
            TripStatus::Pending => {}
            TripStatus::Active => {
                self.store.release_active(trip_id).await?;
            }
            TripStatus::Completed | TripStatus::Cancelled => {
                return Err(AppError::invalid_state(format!(
                    "cannot cancel trip with status {}",
                    trip.status
                ))
                .with_resource_id(trip_id));
            }
        }

        trip.status = TripStatus::Cancelled;
        self.store.save_trip(&trip).await?;
        info!(trip_id, "cancelled trip");
        Ok(trip)
    }

    /// The currently active trip, if any
    ///
    /// # Errors
    ///
    /// Returns storage errors from the backend.
    pub async fn get_active(&self) -> AppResult<Option<Trip>> {
        self.store.get_active_trip().await
    }

    /// Fetch a trip by id
    ///
    /// # Errors
    ///
    /// Returns a not-found error when the trip does not exist.
    pub async fn get(&self, trip_id: &str) -> AppResult<Trip> {
        self.require_trip(trip_id).await
    }

    /// List all trips, oldest first
    ///
    /// # Errors
    ///
    /// Returns storage errors from the backend.
    pub async fn list(&self) -> AppResult<Vec<Trip>> {
        self.store.list_trips().await
    }

    /// List a customer's trips, oldest first
    ///
    /// # Errors
    ///
    /// Returns storage errors from the backend.
    pub async fn list_by_customer(&self, customer_id: &str) -> AppResult<Vec<Trip>> {
        self.store.trips_by_customer(customer_id).await
    }

    /// List a vehicle's trips, oldest first
    ///
    /// # Errors
    ///
    /// Returns storage errors from the backend.
    pub async fn list_by_vehicle(&self, vehicle_id: &str) -> AppResult<Vec<Trip>> {
        self.store.trips_by_vehicle(vehicle_id).await
    }

    /// Delete a trip record; returns whether one was removed
    ///
    /// # Errors
    ///
    /// Returns storage errors from the backend.
    pub async fn delete(&self, trip_id: &str) -> AppResult<bool> {
        self.store.delete_trip(trip_id).await
    }

    async fn require_trip(&self, trip_id: &str) -> AppResult<Trip> {
        self.store
            .get_trip(trip_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Trip {trip_id}")))
    }

    /// Distance over the ordered location timeline: start point, telemetry
    /// points, end point
    fn trip_distance_km(trip: &Trip, end_location: &Location) -> f64 {
        let mut path: Vec<(f64, f64)> = Vec::with_capacity(trip.telemetry_data.len() + 2);

        if let Some(start) = trip.start_location.coordinates() {
            path.push(start);
        }
        path.extend(
            trip.telemetry_data
                .iter()
                .map(|p| (p.latitude, p.longitude)),
        );
        if let Some(end) = end_location.coordinates() {
            path.push(end);
        }

        geo::path_distance_km(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trip_distance_includes_start_and_end_markers() {
        let mut trip = Trip {
            id: "t1".into(),
            customer_id: "c1".into(),
            vehicle_id: "v1".into(),
            status: TripStatus::Active,
            start_time: Some(Utc::now()),
            end_time: None,
            start_location: Location::from_coordinates(0.0, 0.0),
            end_location: Location::default(),
            estimated_fare: 0.0,
            actual_fare: 0.0,
            discount_percent: 0.0,
            discount_amount: 0.0,
            final_fare: 0.0,
            telemetry_data: Vec::new(),
            notes: String::new(),
            payment_method: String::new(),
            receipt: None,
            created_at: Utc::now(),
        };
        trip.telemetry_data.push(TelemetryPoint {
            latitude: 0.5,
            longitude: 0.0,
            timestamp: Utc::now(),
            speed: None,
            heading: None,
        });

        let end = Location::from_coordinates(1.0, 0.0);
        let distance = TripEngine::trip_distance_km(&trip, &end);
        let expected = crate::geo::haversine_km((0.0, 0.0), (0.5, 0.0))
            + crate::geo::haversine_km((0.5, 0.0), (1.0, 0.0));
        assert!((distance - expected).abs() < 1e-9);
    }

    #[test]
    fn test_trip_distance_with_no_coordinates_is_zero() {
        let trip = Trip {
            id: "t1".into(),
            customer_id: "c1".into(),
            vehicle_id: "v1".into(),
            status: TripStatus::Active,
            start_time: None,
            end_time: None,
            start_location: Location::default(),
            end_location: Location::default(),
            estimated_fare: 0.0,
            actual_fare: 0.0,
            discount_percent: 0.0,
            discount_amount: 0.0,
            final_fare: 0.0,
            telemetry_data: Vec::new(),
            notes: String::new(),
            payment_method: String::new(),
            receipt: None,
            created_at: Utc::now(),
        };

        let distance = TripEngine::trip_distance_km(&trip, &Location::default());
        assert!(distance.abs() < 1e-9);
    }
}
