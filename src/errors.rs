// ABOUTME: Unified error handling for the Ride With Vic trip core
// ABOUTME: Defines error codes, the AppError type, and a serializable error response shape
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Ride With Vic

//! # Unified Error Handling
//!
//! Centralized error types for the trip core. Every fallible operation in the
//! crate returns [`AppResult`], carrying an [`AppError`] with a machine-readable
//! [`ErrorCode`] and a human-readable message. Callers (API layers, CLIs) map
//! codes to their own transport; the core never does status mapping itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the trip core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Bad or missing caller input
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    /// A referenced entity does not exist
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    /// An invariant would be violated (e.g. a second active trip)
    #[serde(rename = "CONFLICT")]
    Conflict,
    /// The operation is not legal in the entity's current lifecycle state
    #[serde(rename = "INVALID_STATE")]
    InvalidState,
    /// An external provider is unreachable or returned a non-success response
    #[serde(rename = "UNAVAILABLE")]
    Unavailable,
    /// Token issuance or credential exchange failed
    #[serde(rename = "AUTH_FAILED")]
    Auth,
    /// A storage backend operation failed
    #[serde(rename = "STORAGE_ERROR")]
    Storage,
    /// Data could not be serialized or deserialized
    #[serde(rename = "SERIALIZATION_ERROR")]
    Serialization,
    /// Configuration is missing or invalid
    #[serde(rename = "CONFIG_ERROR")]
    Config,
    /// An unexpected internal failure
    #[serde(rename = "INTERNAL_ERROR")]
    Internal,
}

impl ErrorCode {
    /// Get a user-friendly description of this error code
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Validation => "The provided input is invalid",
            Self::NotFound => "The requested resource was not found",
            Self::Conflict => "The operation conflicts with the current system state",
            Self::InvalidState => "The operation is not valid for the current lifecycle state",
            Self::Unavailable => "An external service is unavailable",
            Self::Auth => "Authentication with the authorization server failed",
            Self::Storage => "Storage operation failed",
            Self::Serialization => "Data serialization or deserialization failed",
            Self::Config => "Configuration is missing or invalid",
            Self::Internal => "An internal error occurred",
        }
    }
}

/// Additional context that can be attached to errors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Resource ID if applicable (trip id, vehicle id, ...)
    pub resource_id: Option<String>,
    /// Additional key-value context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Unified error type for the trip core
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    pub context: ErrorContext,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Attach a resource ID to the error context
    #[must_use]
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.context.resource_id = Some(resource_id.into());
        self
    }

    /// Attach structured details to the error context
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.context.details = Some(details);
        self
    }

    /// Attach a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Bad or missing input
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    /// Referenced entity absent
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, format!("{} not found", resource.into()))
    }

    /// Invariant violation
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Operation invalid for the current lifecycle state
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidState, message)
    }

    /// External provider unreachable or returned non-success
    pub fn unavailable(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::Unavailable,
            format!("{}: {}", service.into(), message.into()),
        )
    }

    /// Token issuance failure
    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Auth, message)
    }

    /// Storage backend failure
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Storage, message)
    }

    /// Serialization failure
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Serialization, message)
    }

    /// Configuration failure
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Config, message)
    }

    /// Internal failure
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Serializable error response format for callers
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// The error payload
    pub error: ErrorResponseDetails,
}

/// Body of an [`ErrorResponse`]
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Machine-readable code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Resource ID, when one is relevant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    /// Structured details, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message,
                resource_id: error.context.resource_id,
                details: error.context.details,
            },
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        match error.source() {
            Some(source) => Self::new(ErrorCode::Internal, error.to_string())
                .with_details(serde_json::json!({ "source": source.to_string() })),
            None => Self::new(ErrorCode::Internal, error.to_string()),
        }
    }
}
