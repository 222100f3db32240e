// ABOUTME: Configuration module for the Ride With Vic trip core
// ABOUTME: Environment-only configuration assembly for providers, token issuance, and storage
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Ride With Vic

//! Configuration for the trip core.
//!
//! Configuration is environment-only: every knob is an environment variable
//! with a sensible default, assembled once at startup via
//! [`CoreConfig::from_env`]. There is no configuration file layer.

/// Environment variable parsing and config structs
pub mod environment;

pub use environment::{
    CoreConfig, EstimateApiConfig, FleetApiConfig, HttpClientConfig, StorageConfig,
    TokenIssuerConfig,
};
