// ABOUTME: Ride-estimate provider client with time-bounded response caching
// ABOUTME: Maps provider price payloads into typed fare estimates
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Ride With Vic

//! Ride-estimate API client.
//!
//! Fetches price estimates for a start/end coordinate pair and caches them
//! in-process for a configurable time-to-live (15 minutes by default). The
//! cache key rounds coordinates to four decimal places, so nearby requests
//! within ~11 meters share an entry. The cache is per-process only.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::FareEstimateProvider;
use crate::config::EstimateApiConfig;
use crate::errors::{AppError, AppResult};

/// Service label used in error messages
const SERVICE: &str = "estimate api";

/// A single service tier's price estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceEstimate {
    /// Service tier display name
    pub service: String,
    /// Formatted estimate (e.g. "$23-29")
    pub estimate: Option<String>,
    /// Lower bound of the estimate
    pub min_estimate: Option<f64>,
    /// Upper bound of the estimate
    pub max_estimate: Option<f64>,
    /// ISO currency code
    pub currency_code: Option<String>,
    /// Estimated trip duration in minutes
    pub duration_min: f64,
    /// Estimated trip distance in kilometers
    pub distance_km: f64,
}

/// Headline fare for the cheapest quoted tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareQuote {
    /// Formatted fare value
    pub value: String,
    /// ISO currency code
    pub currency: String,
}

/// Trip metrics attached to an estimate
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TripEstimate {
    /// Estimated distance in kilometers
    pub distance_km: f64,
    /// Estimated duration in minutes
    pub duration_min: f64,
}

/// A full fare-estimate response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareEstimate {
    /// Headline fare
    pub fare: FareQuote,
    /// Trip metrics
    pub trip: TripEstimate,
    /// Per-tier estimates
    pub prices: Vec<PriceEstimate>,
}

/// Raw price record from the provider
#[derive(Debug, Deserialize)]
struct PriceResponse {
    display_name: String,
    #[serde(default)]
    estimate: Option<String>,
    #[serde(default)]
    low_estimate: Option<f64>,
    #[serde(default)]
    high_estimate: Option<f64>,
    #[serde(default)]
    currency_code: Option<String>,
    /// Duration in seconds
    #[serde(default)]
    duration: Option<f64>,
    /// Distance in kilometers
    #[serde(default)]
    distance: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PricesResponse {
    #[serde(default)]
    prices: Vec<PriceResponse>,
}

impl PricesResponse {
    /// Map the provider payload into the typed estimate shape
    fn into_estimate(self) -> FareEstimate {
        let first = self.prices.first();

        let fare = FareQuote {
            value: first
                .and_then(|p| p.estimate.clone())
                .unwrap_or_else(|| "0.00".to_owned()),
            currency: first
                .and_then(|p| p.currency_code.clone())
                .unwrap_or_else(|| "USD".to_owned()),
        };

        let trip = TripEstimate {
            distance_km: first.and_then(|p| p.distance).unwrap_or(0.0),
            duration_min: first.and_then(|p| p.duration).unwrap_or(0.0) / 60.0,
        };

        let prices = self
            .prices
            .into_iter()
            .map(|p| PriceEstimate {
                service: p.display_name,
                estimate: p.estimate,
                min_estimate: p.low_estimate,
                max_estimate: p.high_estimate,
                currency_code: p.currency_code,
                duration_min: p.duration.unwrap_or(0.0) / 60.0,
                distance_km: p.distance.unwrap_or(0.0),
            })
            .collect();

        FareEstimate { fare, trip, prices }
    }
}

/// Cached estimate with expiration
#[derive(Debug, Clone)]
struct CacheEntry {
    estimate: FareEstimate,
    expires_at: Instant,
}

/// Client for the ride-estimate provider
pub struct EstimateClient {
    config: EstimateApiConfig,
    client: Client,
    cache: RwLock<HashMap<String, CacheEntry>>,
}

impl EstimateClient {
    /// Create a new client with the given configuration and HTTP client
    #[must_use]
    pub fn new(config: EstimateApiConfig, client: Client) -> Self {
        Self {
            config,
            client,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Cache key for a coordinate pair, rounded to four decimal places
    fn cache_key(start: (f64, f64), end: (f64, f64)) -> String {
        format!(
            "{:.4},{:.4}|{:.4},{:.4}",
            start.0, start.1, end.0, end.1
        )
    }

    /// Look up a non-expired cached estimate, evicting a stale entry
    async fn cached(&self, key: &str) -> Option<FareEstimate> {
        let mut cache = self.cache.write().await;
        match cache.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.estimate.clone()),
            Some(_) => {
                cache.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store an estimate under the given key
    async fn store(&self, key: String, estimate: FareEstimate) {
        let entry = CacheEntry {
            estimate,
            expires_at: Instant::now() + Duration::from_secs(self.config.cache_ttl_secs),
        };
        self.cache.write().await.insert(key, entry);
    }
}

#[async_trait]
impl FareEstimateProvider for EstimateClient {
    async fn price_estimates(
        &self,
        start: (f64, f64),
        end: (f64, f64),
    ) -> AppResult<FareEstimate> {
        let key = Self::cache_key(start, end);
        if let Some(hit) = self.cached(&key).await {
            debug!(key, "estimate cache hit");
            return Ok(hit);
        }

        let token = self
            .config
            .server_token
            .as_deref()
            .ok_or_else(|| AppError::auth("estimate client has no server token"))?;

        let url = format!("{}/estimates/price", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("start_latitude", start.0),
                ("start_longitude", start.1),
                ("end_latitude", end.0),
                ("end_longitude", end.1),
            ])
            .send()
            .await
            .map_err(|e| AppError::unavailable(SERVICE, format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::unavailable(
                SERVICE,
                format!("returned {status}"),
            ));
        }

        let payload: PricesResponse = response
            .json()
            .await
            .map_err(|e| AppError::unavailable(SERVICE, format!("malformed response: {e}")))?;

        let estimate = payload.into_estimate();
        self.store(key, estimate.clone()).await;
        Ok(estimate)
    }
}
