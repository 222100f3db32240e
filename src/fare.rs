// ABOUTME: Fare and discount calculation for trips
// ABOUTME: Named fare models, service tier multipliers, and bounded discount application
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Ride With Vic

//! # Fare and Discount Calculation
//!
//! Pure monetary math for the trip core. Two fare models exist, both carried
//! over from production pricing:
//!
//! - [`FareModel::DistanceOnly`]: flat base plus a per-kilometer rate, used
//!   when finalizing a trip from recorded telemetry
//! - [`FareModel::TimeAndDistance`]: base plus per-kilometer and per-minute
//!   rates, used when quoting ahead of a trip
//!
//! Stored monetary values stay unrounded; rounding to two decimal places is a
//! presentation concern handled by [`round2`].

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// Base fare for the distance-only model, in currency units
pub const DISTANCE_ONLY_BASE_FARE: f64 = 5.0;
/// Per-kilometer rate for the distance-only model
pub const DISTANCE_ONLY_PER_KM: f64 = 2.5;

/// Base fare for the time-and-distance model
pub const TIME_DISTANCE_BASE_FARE: f64 = 2.50;
/// Per-kilometer rate for the time-and-distance model
pub const TIME_DISTANCE_PER_KM: f64 = 1.25;
/// Per-minute rate for the time-and-distance model
pub const TIME_DISTANCE_PER_MINUTE: f64 = 0.35;

/// A fare computation strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum FareModel {
    /// Base fare plus a per-kilometer rate; trip duration is ignored
    DistanceOnly {
        /// Flat charge applied to every trip
        base_fare: f64,
        /// Charge per kilometer traveled
        per_km: f64,
    },
    /// Base fare plus per-kilometer and per-minute rates
    TimeAndDistance {
        /// Flat charge applied to every trip
        base_fare: f64,
        /// Charge per kilometer traveled
        per_km: f64,
        /// Charge per minute of trip duration
        per_minute: f64,
    },
}

impl FareModel {
    /// The distance-only model with production constants
    #[must_use]
    pub const fn distance_only() -> Self {
        Self::DistanceOnly {
            base_fare: DISTANCE_ONLY_BASE_FARE,
            per_km: DISTANCE_ONLY_PER_KM,
        }
    }

    /// The time-and-distance model with production constants
    #[must_use]
    pub const fn time_and_distance() -> Self {
        Self::TimeAndDistance {
            base_fare: TIME_DISTANCE_BASE_FARE,
            per_km: TIME_DISTANCE_PER_KM,
            per_minute: TIME_DISTANCE_PER_MINUTE,
        }
    }

    /// Compute a fare for the given distance, duration, and service tier
    ///
    /// `service_multiplier` scales the whole amount (1.0 for the standard
    /// tier). Duration is ignored by the distance-only model.
    ///
    /// # Errors
    ///
    /// Returns a validation error when distance, duration, or multiplier is
    /// negative.
    pub fn quote(
        &self,
        distance_km: f64,
        duration_min: f64,
        service_multiplier: f64,
    ) -> AppResult<f64> {
        if distance_km < 0.0 {
            return Err(AppError::validation("distance must not be negative"));
        }
        if duration_min < 0.0 {
            return Err(AppError::validation("duration must not be negative"));
        }
        if service_multiplier < 0.0 {
            return Err(AppError::validation(
                "service multiplier must not be negative",
            ));
        }

        let amount = match *self {
            Self::DistanceOnly { base_fare, per_km } => base_fare + distance_km * per_km,
            Self::TimeAndDistance {
                base_fare,
                per_km,
                per_minute,
            } => base_fare + distance_km * per_km + duration_min * per_minute,
        };

        Ok(amount * service_multiplier)
    }
}

impl Default for FareModel {
    fn default() -> Self {
        Self::distance_only()
    }
}

/// Result of applying a discount to a fare
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    /// Amount subtracted from the fare
    pub discount_amount: f64,
    /// Fare after the discount
    pub final_amount: f64,
}

/// Validate a discount percentage
///
/// # Errors
///
/// Returns a validation error when `percent` falls outside `[0, 100]` or is
/// not a finite number.
pub fn validate_discount_percent(percent: f64) -> AppResult<()> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(AppError::validation(format!(
            "discount percent must be between 0 and 100, got {percent}"
        )));
    }
    Ok(())
}

/// Apply a percentage discount to a fare amount
///
/// `discount_amount = amount * percent / 100`, stored unrounded; rounding is
/// left to presentation via [`round2`].
///
/// # Errors
///
/// Returns a validation error when `amount` is negative or `percent` falls
/// outside `[0, 100]`.
pub fn apply_discount(amount: f64, percent: f64) -> AppResult<Discount> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(AppError::validation(format!(
            "fare amount must not be negative, got {amount}"
        )));
    }
    validate_discount_percent(percent)?;

    let discount_amount = amount * percent / 100.0;
    Ok(Discount {
        discount_amount,
        final_amount: amount - discount_amount,
    })
}

/// Round a monetary value to two decimal places for presentation
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
