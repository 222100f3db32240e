// ABOUTME: Integration tests for the trip lifecycle engine
// ABOUTME: Covers the full create/start/telemetry/end flow, invariants, and failure contracts

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use vic_ride_core::errors::{AppError, AppResult, ErrorCode};
use vic_ride_core::fare;
use vic_ride_core::geo;
use vic_ride_core::models::{Location, Vehicle, VehiclePosition, VehicleState};
use vic_ride_core::providers::VehicleProvider;
use vic_ride_core::storage::{MemoryStorage, StorageProvider, VehicleStore};
use vic_ride_core::trips::{EndTripRequest, NewTelemetryPoint, NewTrip, TripEngine};
use vic_ride_core::TripStatus;

/// Vehicle provider that always reports the same position
struct StaticVehicleProvider {
    position: VehiclePosition,
}

impl StaticVehicleProvider {
    fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            position: VehiclePosition {
                latitude,
                longitude,
                speed: Some(0.0),
                heading: None,
            },
        }
    }
}

#[async_trait]
impl VehicleProvider for StaticVehicleProvider {
    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        Ok(Vec::new())
    }

    async fn wake(&self, vehicle_id: &str) -> AppResult<Vehicle> {
        Err(AppError::unavailable("fleet api", format!("cannot wake {vehicle_id}")))
    }

    async fn location(&self, _vehicle_id: &str) -> AppResult<VehiclePosition> {
        Ok(self.position)
    }
}

/// Vehicle provider that is always unreachable
struct UnreachableVehicleProvider;

#[async_trait]
impl VehicleProvider for UnreachableVehicleProvider {
    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        Err(AppError::unavailable("fleet api", "offline"))
    }

    async fn wake(&self, _vehicle_id: &str) -> AppResult<Vehicle> {
        Err(AppError::unavailable("fleet api", "offline"))
    }

    async fn location(&self, _vehicle_id: &str) -> AppResult<VehiclePosition> {
        Err(AppError::unavailable("fleet api", "offline"))
    }
}

fn engine_with_store(store: &MemoryStorage) -> TripEngine {
    let store: Arc<dyn StorageProvider> = Arc::new(store.clone());
    TripEngine::new(store, Arc::new(StaticVehicleProvider::at(40.73, -74.0)))
}

fn engine() -> TripEngine {
    engine_with_store(&MemoryStorage::new())
}

fn new_trip(customer_id: &str, vehicle_id: &str) -> NewTrip {
    NewTrip {
        customer_id: customer_id.into(),
        vehicle_id: vehicle_id.into(),
        ..NewTrip::default()
    }
}

fn point(latitude: f64, longitude: f64) -> NewTelemetryPoint {
    NewTelemetryPoint {
        latitude,
        longitude,
        timestamp: None,
        speed: None,
        heading: None,
    }
}

#[tokio::test]
async fn test_full_trip_round_trip() {
    let engine = engine();

    let trip = engine
        .create(NewTrip {
            discount_percent: Some(10.0),
            payment_method: Some("credit_card".into()),
            ..new_trip("c1", "v1")
        })
        .await
        .unwrap();
    assert_eq!(trip.status, TripStatus::Pending);
    assert_eq!(trip.actual_fare, 0.0);
    assert!(trip.telemetry_data.is_empty());
    assert!(trip.receipt.is_none());

    let trip = engine
        .start(&trip.id, Location::from_coordinates(40.70, -74.0))
        .await
        .unwrap();
    assert_eq!(trip.status, TripStatus::Active);
    assert!(trip.start_time.is_some());
    // The start point is seeded as the first telemetry sample
    assert_eq!(trip.telemetry_data.len(), 1);
    assert_eq!(trip.telemetry_data[0].speed, Some(0.0));

    for i in 1..=3 {
        engine
            .add_telemetry(&trip.id, point(40.70 + 0.01 * f64::from(i), -74.0))
            .await
            .unwrap();
    }

    let completed = engine
        .end(
            &trip.id,
            EndTripRequest {
                end_location: Some(Location::from_coordinates(40.74, -74.0)),
                actual_fare: Some(45.75),
                ..EndTripRequest::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(completed.status, TripStatus::Completed);
    // Three appended samples plus the synthetic start point
    assert_eq!(completed.telemetry_data.len(), 4);
    assert!(completed.end_time.unwrap() > completed.start_time.unwrap());

    // Fare math: $45.75 at 10% => $4.58 discount, $41.17 final (2 dp)
    assert!((completed.actual_fare - 45.75).abs() < 1e-9);
    assert!((fare::round2(completed.discount_amount) - 4.58).abs() < 1e-9);
    assert!((fare::round2(completed.final_fare) - 41.17).abs() < 1e-9);
    assert!(
        (completed.final_fare - (completed.actual_fare - completed.discount_amount)).abs() < 1e-9
    );

    let receipt = completed.receipt.unwrap();
    assert!(receipt.generated);
    assert!(receipt.id.starts_with("RCV-"));
}

#[tokio::test]
async fn test_create_rejects_missing_references() {
    let engine = engine();

    let err = engine.create(new_trip("", "v1")).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Validation);

    let err = engine.create(new_trip("c1", "   ")).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn test_create_rejects_out_of_range_discount() {
    let engine = engine();

    for percent in [-5.0, 100.5, f64::NAN] {
        let err = engine
            .create(NewTrip {
                discount_percent: Some(percent),
                ..new_trip("c1", "v1")
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
    }
}

#[tokio::test]
async fn test_start_unknown_trip_is_not_found() {
    let engine = engine();
    let err = engine
        .start("no-such-trip", Location::from_coordinates(0.0, 0.0))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn test_second_start_conflicts_while_first_is_active() {
    let engine = engine();

    let first = engine.create(new_trip("c1", "v1")).await.unwrap();
    let second = engine.create(new_trip("c2", "v2")).await.unwrap();

    engine
        .start(&first.id, Location::from_coordinates(40.70, -74.0))
        .await
        .unwrap();

    let err = engine
        .start(&second.id, Location::from_coordinates(40.71, -74.0))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Conflict);

    // Ending the first trip frees the slot
    engine
        .end(&first.id, EndTripRequest::default())
        .await
        .unwrap();
    engine
        .start(&second.id, Location::from_coordinates(40.71, -74.0))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_start_requires_pending_status() {
    let engine = engine();
    let trip = engine.create(new_trip("c1", "v1")).await.unwrap();

    engine
        .start(&trip.id, Location::from_coordinates(40.70, -74.0))
        .await
        .unwrap();

    let err = engine
        .start(&trip.id, Location::from_coordinates(40.70, -74.0))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidState);
}

#[tokio::test]
async fn test_telemetry_requires_active_status() {
    let engine = engine();
    let trip = engine.create(new_trip("c1", "v1")).await.unwrap();

    let err = engine
        .add_telemetry(&trip.id, point(40.70, -74.0))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidState);

    let err = engine
        .add_telemetry("no-such-trip", point(40.70, -74.0))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn test_telemetry_preserves_insertion_order() {
    let engine = engine();
    let trip = engine.create(new_trip("c1", "v1")).await.unwrap();
    engine
        .start(&trip.id, Location::from_coordinates(0.0, 0.0))
        .await
        .unwrap();

    // Timestamps deliberately out of order; arrival order must win
    let base = Utc::now();
    let samples = [
        (1.0, base + Duration::seconds(30)),
        (2.0, base + Duration::seconds(10)),
        (3.0, base + Duration::seconds(20)),
    ];
    for (latitude, timestamp) in samples {
        engine
            .add_telemetry(
                &trip.id,
                NewTelemetryPoint {
                    latitude,
                    longitude: 0.0,
                    timestamp: Some(timestamp),
                    speed: None,
                    heading: None,
                },
            )
            .await
            .unwrap();
    }

    let stored = engine.get(&trip.id).await.unwrap();
    let latitudes: Vec<f64> = stored.telemetry_data.iter().map(|p| p.latitude).collect();
    assert_eq!(latitudes, vec![0.0, 1.0, 2.0, 3.0]);
}

#[tokio::test]
async fn test_telemetry_is_stamped_when_timestamp_is_omitted() {
    let engine = engine();
    let trip = engine.create(new_trip("c1", "v1")).await.unwrap();
    engine
        .start(&trip.id, Location::from_coordinates(0.0, 0.0))
        .await
        .unwrap();

    let before = Utc::now();
    let trip = engine.add_telemetry(&trip.id, point(0.1, 0.0)).await.unwrap();
    let after = Utc::now();

    let stamped = trip.telemetry_data.last().unwrap().timestamp;
    assert!(stamped >= before && stamped <= after);
}

#[tokio::test]
async fn test_end_requires_active_status() {
    let engine = engine();
    let trip = engine.create(new_trip("c1", "v1")).await.unwrap();

    let err = engine
        .end(&trip.id, EndTripRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidState);

    let err = engine
        .end("no-such-trip", EndTripRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn test_end_twice_fails_without_recomputing() {
    let engine = engine();
    let trip = engine.create(new_trip("c1", "v1")).await.unwrap();
    engine
        .start(&trip.id, Location::from_coordinates(40.70, -74.0))
        .await
        .unwrap();

    let completed = engine
        .end(
            &trip.id,
            EndTripRequest {
                actual_fare: Some(20.0),
                ..EndTripRequest::default()
            },
        )
        .await
        .unwrap();

    let err = engine
        .end(
            &trip.id,
            EndTripRequest {
                actual_fare: Some(99.0),
                ..EndTripRequest::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidState);

    // The stored trip keeps the first computation
    let stored = engine.get(&trip.id).await.unwrap();
    assert!((stored.actual_fare - completed.actual_fare).abs() < 1e-9);
}

#[tokio::test]
async fn test_end_falls_back_to_vehicle_position() {
    let store = MemoryStorage::new();
    let store_arc: Arc<dyn StorageProvider> = Arc::new(store.clone());
    let engine = TripEngine::new(store_arc, Arc::new(StaticVehicleProvider::at(40.75, -73.99)));

    let trip = engine.create(new_trip("c1", "v1")).await.unwrap();
    engine
        .start(&trip.id, Location::from_coordinates(40.70, -74.0))
        .await
        .unwrap();

    let completed = engine
        .end(&trip.id, EndTripRequest::default())
        .await
        .unwrap();

    assert_eq!(
        completed.end_location.coordinates(),
        Some((40.75, -73.99))
    );
}

#[tokio::test]
async fn test_end_propagates_unreachable_vehicle() {
    let store: Arc<dyn StorageProvider> = Arc::new(MemoryStorage::new());
    let engine = TripEngine::new(store, Arc::new(UnreachableVehicleProvider));

    let trip = engine.create(new_trip("c1", "v1")).await.unwrap();
    engine
        .start(&trip.id, Location::from_coordinates(40.70, -74.0))
        .await
        .unwrap();

    let err = engine
        .end(&trip.id, EndTripRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Unavailable);

    // The trip must remain active; no partial completion
    let stored = engine.get(&trip.id).await.unwrap();
    assert_eq!(stored.status, TripStatus::Active);
}

#[tokio::test]
async fn test_end_derives_fare_from_distance() {
    let engine = engine();
    let trip = engine.create(new_trip("c1", "v1")).await.unwrap();
    engine
        .start(&trip.id, Location::from_coordinates(0.0, 0.0))
        .await
        .unwrap();
    engine.add_telemetry(&trip.id, point(0.5, 0.0)).await.unwrap();

    let completed = engine
        .end(
            &trip.id,
            EndTripRequest {
                end_location: Some(Location::from_coordinates(1.0, 0.0)),
                ..EndTripRequest::default()
            },
        )
        .await
        .unwrap();

    // Path: start (0,0) -> seeded start sample -> (0.5,0) -> (1,0)
    let distance = geo::haversine_km((0.0, 0.0), (0.5, 0.0)) + geo::haversine_km((0.5, 0.0), (1.0, 0.0));
    let expected_fare = 5.0 + distance * 2.5;
    assert!((completed.actual_fare - expected_fare).abs() < 1e-6);
    assert!((completed.final_fare - expected_fare).abs() < 1e-6);
}

#[tokio::test]
async fn test_end_discount_override_is_validated() {
    let engine = engine();
    let trip = engine.create(new_trip("c1", "v1")).await.unwrap();
    engine
        .start(&trip.id, Location::from_coordinates(40.70, -74.0))
        .await
        .unwrap();

    let err = engine
        .end(
            &trip.id,
            EndTripRequest {
                actual_fare: Some(10.0),
                discount_percent: Some(120.0),
                ..EndTripRequest::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn test_cancel_from_pending_and_active() {
    let engine = engine();

    let pending = engine.create(new_trip("c1", "v1")).await.unwrap();
    let cancelled = engine.cancel(&pending.id).await.unwrap();
    assert_eq!(cancelled.status, TripStatus::Cancelled);

    let active = engine.create(new_trip("c2", "v2")).await.unwrap();
    engine
        .start(&active.id, Location::from_coordinates(40.70, -74.0))
        .await
        .unwrap();
    engine.cancel(&active.id).await.unwrap();

    // Cancelling the active trip frees the slot for the next start
    let next = engine.create(new_trip("c3", "v3")).await.unwrap();
    engine
        .start(&next.id, Location::from_coordinates(40.70, -74.0))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_cancel_terminal_trip_is_invalid() {
    let engine = engine();
    let trip = engine.create(new_trip("c1", "v1")).await.unwrap();
    engine.cancel(&trip.id).await.unwrap();

    let err = engine.cancel(&trip.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidState);
}

#[tokio::test]
async fn test_get_active_tracks_lifecycle() {
    let engine = engine();
    assert!(engine.get_active().await.unwrap().is_none());

    let trip = engine.create(new_trip("c1", "v1")).await.unwrap();
    assert!(engine.get_active().await.unwrap().is_none());

    engine
        .start(&trip.id, Location::from_coordinates(40.70, -74.0))
        .await
        .unwrap();
    let active = engine.get_active().await.unwrap().unwrap();
    assert_eq!(active.id, trip.id);

    engine.end(&trip.id, EndTripRequest::default()).await.unwrap();
    assert!(engine.get_active().await.unwrap().is_none());
}

#[tokio::test]
async fn test_trip_listing_and_deletion() {
    let engine = engine();

    let a = engine.create(new_trip("c1", "v1")).await.unwrap();
    let b = engine.create(new_trip("c1", "v2")).await.unwrap();
    let c = engine.create(new_trip("c2", "v1")).await.unwrap();

    assert_eq!(engine.list().await.unwrap().len(), 3);
    assert_eq!(engine.list_by_customer("c1").await.unwrap().len(), 2);
    assert_eq!(engine.list_by_vehicle("v1").await.unwrap().len(), 2);

    assert!(engine.delete(&b.id).await.unwrap());
    assert!(!engine.delete(&b.id).await.unwrap());
    assert_eq!(engine.list().await.unwrap().len(), 2);

    // Remaining trips untouched
    engine.get(&a.id).await.unwrap();
    engine.get(&c.id).await.unwrap();
}

#[tokio::test]
async fn test_vehicle_state_is_reset_after_trip_end() {
    let store = MemoryStorage::new();
    store
        .save_vehicle(&Vehicle {
            id: "v1".into(),
            name: "Vic One".into(),
            model: "Model 3".into(),
            vin: "5YJ3E1EA7KF000001".into(),
            display_name: "Vic One".into(),
            state: VehicleState::Waking,
        })
        .await
        .unwrap();

    let engine = engine_with_store(&store);
    let trip = engine.create(new_trip("c1", "v1")).await.unwrap();
    engine
        .start(&trip.id, Location::from_coordinates(40.70, -74.0))
        .await
        .unwrap();
    engine.end(&trip.id, EndTripRequest::default()).await.unwrap();

    let vehicle = store.get_vehicle("v1").await.unwrap().unwrap();
    assert_eq!(vehicle.state, VehicleState::Online);
}
