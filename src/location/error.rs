//! Location request error types

use thiserror::Error;

/// Failures reported by the location provider
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    /// The platform refused location access for this request
    #[error("location permission denied for provider '{provider}'")]
    PermissionDenied { provider: String },
    /// The provider rejected the request for another reason
    #[error("location provider '{provider}' rejected the request: {reason}")]
    ProviderRejected { provider: String, reason: String },
}

/// Result type for location requests
pub type LocationResult<T> = Result<T, LocationError>;
