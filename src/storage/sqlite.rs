// ABOUTME: Embedded SQLite storage backend using sqlx
// ABOUTME: JSON document rows per entity plus a single-row active-trip sentinel table
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Ride With Vic

//! SQLite storage backend.
//!
//! Each entity collection is a table of JSON documents addressed by id, with
//! the columns the queries filter on (customer, vehicle, status) denormalized
//! alongside the document. The active-trip invariant lives in a dedicated
//! single-row sentinel table written with a conditional upsert, which makes
//! `claim_active` atomic at the database level.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{Row, SqlitePool};

use super::{CustomerStore, TripStore, VehicleStore};
use crate::errors::{AppError, AppResult};
use crate::models::{Customer, Trip, Vehicle, VehicleState};

/// SQLite storage backend
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Connect to the database and run migrations
    ///
    /// The database file is created when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the connection or migration fails.
    pub async fn new(database_url: &str) -> AppResult<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:")
            && !database_url.contains("mode=")
            && !database_url.contains(":memory:")
        {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options)
            .await
            .map_err(|e| AppError::storage(format!("failed to connect: {e}")))?;

        let storage = Self { pool };
        storage.migrate().await?;
        Ok(storage)
    }

    /// Create tables and indexes
    ///
    /// # Errors
    ///
    /// Returns a storage error when a DDL statement fails.
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS trips (
                id TEXT PRIMARY KEY,
                customer_id TEXT NOT NULL,
                vehicle_id TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                document TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_trips_customer ON trips(customer_id)")
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_trips_vehicle ON trips(vehicle_id)")
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS customers (
                id TEXT PRIMARY KEY,
                document TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS vehicles (
                id TEXT PRIMARY KEY,
                document TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        // Single-row sentinel; slot is pinned to 0 so at most one claim exists
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS active_trip (
                slot INTEGER PRIMARY KEY CHECK (slot = 0),
                trip_id TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }

    fn encode<T: Serialize>(value: &T) -> AppResult<String> {
        serde_json::to_string(value)
            .map_err(|e| AppError::serialization(format!("failed to encode record: {e}")))
    }

    fn decode<T: DeserializeOwned>(document: &str) -> AppResult<T> {
        serde_json::from_str(document)
            .map_err(|e| AppError::serialization(format!("failed to decode record: {e}")))
    }

    async fn fetch_documents<T: DeserializeOwned>(&self, query: &str) -> AppResult<Vec<T>> {
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;

        rows.iter()
            .map(|row| {
                let document: String = row.try_get("document").map_err(storage_err)?;
                Self::decode(&document)
            })
            .collect()
    }

    async fn fetch_trips_by(&self, query: &str, value: &str) -> AppResult<Vec<Trip>> {
        let rows = sqlx::query(query)
            .bind(value)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;

        rows.iter()
            .map(|row| {
                let document: String = row.try_get("document").map_err(storage_err)?;
                Self::decode(&document)
            })
            .collect()
    }
}

fn storage_err(e: sqlx::Error) -> AppError {
    AppError::storage(e.to_string())
}

#[async_trait]
impl TripStore for SqliteStorage {
    async fn save_trip(&self, trip: &Trip) -> AppResult<()> {
        let document = Self::encode(trip)?;

        sqlx::query(
            r"
            INSERT INTO trips (id, customer_id, vehicle_id, status, created_at, document)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                customer_id = excluded.customer_id,
                vehicle_id = excluded.vehicle_id,
                status = excluded.status,
                document = excluded.document
            ",
        )
        .bind(&trip.id)
        .bind(&trip.customer_id)
        .bind(&trip.vehicle_id)
        .bind(trip.status.to_string())
        .bind(trip.created_at.to_rfc3339())
        .bind(&document)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }

    async fn get_trip(&self, id: &str) -> AppResult<Option<Trip>> {
        let row = sqlx::query("SELECT document FROM trips WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        match row {
            Some(row) => {
                let document: String = row.try_get("document").map_err(storage_err)?;
                Ok(Some(Self::decode(&document)?))
            }
            None => Ok(None),
        }
    }

    async fn list_trips(&self) -> AppResult<Vec<Trip>> {
        self.fetch_documents("SELECT document FROM trips ORDER BY created_at, id")
            .await
    }

    async fn trips_by_customer(&self, customer_id: &str) -> AppResult<Vec<Trip>> {
        self.fetch_trips_by(
            "SELECT document FROM trips WHERE customer_id = ?1 ORDER BY created_at, id",
            customer_id,
        )
        .await
    }

    async fn trips_by_vehicle(&self, vehicle_id: &str) -> AppResult<Vec<Trip>> {
        self.fetch_trips_by(
            "SELECT document FROM trips WHERE vehicle_id = ?1 ORDER BY created_at, id",
            vehicle_id,
        )
        .await
    }

    async fn delete_trip(&self, id: &str) -> AppResult<bool> {
        sqlx::query("DELETE FROM active_trip WHERE slot = 0 AND trip_id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        let result = sqlx::query("DELETE FROM trips WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_active_trip(&self) -> AppResult<Option<Trip>> {
        let row = sqlx::query(
            r"
            SELECT t.document AS document
            FROM trips t
            INNER JOIN active_trip a ON a.trip_id = t.id
            WHERE a.slot = 0
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        match row {
            Some(row) => {
                let document: String = row.try_get("document").map_err(storage_err)?;
                let trip: Trip = Self::decode(&document)?;
                Ok(trip.is_active().then_some(trip))
            }
            None => Ok(None),
        }
    }

    async fn claim_active(&self, trip_id: &str) -> AppResult<bool> {
        // Conditional upsert: a conflicting row only updates when it already
        // belongs to this trip, so a foreign claim leaves zero rows affected
        let result = sqlx::query(
            r"
            INSERT INTO active_trip (slot, trip_id) VALUES (0, ?1)
            ON CONFLICT(slot) DO UPDATE SET trip_id = excluded.trip_id
            WHERE active_trip.trip_id = excluded.trip_id
            ",
        )
        .bind(trip_id)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn release_active(&self, trip_id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM active_trip WHERE slot = 0 AND trip_id = ?1")
            .bind(trip_id)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(())
    }
}

#[async_trait]
impl CustomerStore for SqliteStorage {
    async fn save_customer(&self, customer: &Customer) -> AppResult<()> {
        let document = Self::encode(customer)?;

        sqlx::query(
            r"
            INSERT INTO customers (id, document) VALUES (?1, ?2)
            ON CONFLICT(id) DO UPDATE SET document = excluded.document
            ",
        )
        .bind(&customer.id)
        .bind(&document)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }

    async fn get_customer(&self, id: &str) -> AppResult<Option<Customer>> {
        let row = sqlx::query("SELECT document FROM customers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        match row {
            Some(row) => {
                let document: String = row.try_get("document").map_err(storage_err)?;
                Ok(Some(Self::decode(&document)?))
            }
            None => Ok(None),
        }
    }

    async fn list_customers(&self) -> AppResult<Vec<Customer>> {
        self.fetch_documents("SELECT document FROM customers ORDER BY id")
            .await
    }

    async fn delete_customer(&self, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl VehicleStore for SqliteStorage {
    async fn save_vehicle(&self, vehicle: &Vehicle) -> AppResult<()> {
        let document = Self::encode(vehicle)?;

        sqlx::query(
            r"
            INSERT INTO vehicles (id, document) VALUES (?1, ?2)
            ON CONFLICT(id) DO UPDATE SET document = excluded.document
            ",
        )
        .bind(&vehicle.id)
        .bind(&document)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }

    async fn get_vehicle(&self, id: &str) -> AppResult<Option<Vehicle>> {
        let row = sqlx::query("SELECT document FROM vehicles WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        match row {
            Some(row) => {
                let document: String = row.try_get("document").map_err(storage_err)?;
                Ok(Some(Self::decode(&document)?))
            }
            None => Ok(None),
        }
    }

    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        self.fetch_documents("SELECT document FROM vehicles ORDER BY id")
            .await
    }

    async fn set_vehicle_state(
        &self,
        id: &str,
        state: VehicleState,
    ) -> AppResult<Option<Vehicle>> {
        let Some(mut vehicle) = self.get_vehicle(id).await? else {
            return Ok(None);
        };

        vehicle.state = state;
        self.save_vehicle(&vehicle).await?;
        Ok(Some(vehicle))
    }
}
