// ABOUTME: Trip lifecycle module for the Ride With Vic trip core
// ABOUTME: Re-exports the lifecycle engine and its request types
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Ride With Vic

//! Trip lifecycle management.

/// The trip lifecycle engine
pub mod engine;

pub use engine::{EndTripRequest, NewTelemetryPoint, NewTrip, TripEngine};
