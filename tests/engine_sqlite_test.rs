// ABOUTME: End-to-end test of the trip engine over the SQLite backend
// ABOUTME: Exercises the full lifecycle through the storage factory seam

use std::sync::Arc;

use async_trait::async_trait;

use vic_ride_core::errors::{AppResult, ErrorCode};
use vic_ride_core::models::{Location, Vehicle, VehiclePosition};
use vic_ride_core::providers::VehicleProvider;
use vic_ride_core::storage::{Storage, StorageProvider};
use vic_ride_core::trips::{EndTripRequest, NewTelemetryPoint, NewTrip, TripEngine};
use vic_ride_core::TripStatus;

struct ParkedVehicleProvider;

#[async_trait]
impl VehicleProvider for ParkedVehicleProvider {
    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        Ok(Vec::new())
    }

    async fn wake(&self, vehicle_id: &str) -> AppResult<Vehicle> {
        Err(vic_ride_core::AppError::unavailable(
            "fleet api",
            format!("wake not supported for {vehicle_id}"),
        ))
    }

    async fn location(&self, _vehicle_id: &str) -> AppResult<VehiclePosition> {
        Ok(VehiclePosition {
            latitude: 40.7484,
            longitude: -73.9857,
            speed: Some(0.0),
            heading: Some(90.0),
        })
    }
}

#[tokio::test]
async fn test_lifecycle_over_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("engine.db").display());

    let storage = Storage::new(&url).await.unwrap();
    let store: Arc<dyn StorageProvider> = Arc::new(storage);
    let engine = TripEngine::new(store, Arc::new(ParkedVehicleProvider));

    let trip = engine
        .create(NewTrip {
            customer_id: "c1".into(),
            vehicle_id: "v1".into(),
            estimated_fare: Some(18.0),
            discount_percent: Some(5.0),
            ..NewTrip::default()
        })
        .await
        .unwrap();

    engine
        .start(&trip.id, Location::from_coordinates(40.7128, -74.0060))
        .await
        .unwrap();

    // A second trip cannot start while the first holds the claim
    let blocked = engine
        .create(NewTrip {
            customer_id: "c2".into(),
            vehicle_id: "v2".into(),
            ..NewTrip::default()
        })
        .await
        .unwrap();
    let err = engine
        .start(&blocked.id, Location::from_coordinates(40.71, -74.0))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Conflict);

    engine
        .add_telemetry(
            &trip.id,
            NewTelemetryPoint {
                latitude: 40.7308,
                longitude: -73.9973,
                timestamp: None,
                speed: Some(32.0),
                heading: Some(45.0),
            },
        )
        .await
        .unwrap();

    // No explicit end location: the engine reads the vehicle position
    let completed = engine
        .end(&trip.id, EndTripRequest::default())
        .await
        .unwrap();

    assert_eq!(completed.status, TripStatus::Completed);
    assert_eq!(completed.telemetry_data.len(), 2);
    assert_eq!(
        completed.end_location.coordinates(),
        Some((40.7484, -73.9857))
    );
    assert!(completed.actual_fare > 5.0, "distance fare includes the base");
    assert!((completed.discount_amount - completed.actual_fare * 0.05).abs() < 1e-9);
    assert!(completed.receipt.is_some());

    // The slot is free again and the state survived in SQLite
    engine
        .start(&blocked.id, Location::from_coordinates(40.71, -74.0))
        .await
        .unwrap();
    let active = engine.get_active().await.unwrap().unwrap();
    assert_eq!(active.id, blocked.id);
}
