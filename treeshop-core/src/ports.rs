//! Traits describing provider capabilities and shared helper types.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Error as ReqwestError;

use crate::model::{Coordinate, Route, TravelMode};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to provider backends.
pub enum PortError {
    /// Network layer failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// Provider answered with a payload we could not interpret.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
    /// Internal provider error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[async_trait]
/// Resolves free-text addresses or postal codes to coordinates.
pub trait GeocodePort: Send + Sync {
    /// Look up the best match for `query`.
    ///
    /// Returns `Ok(None)` when the provider has no match.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the provider request fails.
    async fn geocode(&self, query: &str) -> Result<Option<Coordinate>, PortError>;
}

#[async_trait]
/// Computes routes between two coordinates.
pub trait RoutePort: Send + Sync {
    /// Request the preferred route from `from` to `to`.
    ///
    /// Returns `Ok(None)` when no route exists.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the provider request fails.
    async fn route(
        &self,
        from: Coordinate,
        to: Coordinate,
        mode: TravelMode,
    ) -> Result<Option<Route>, PortError>;
}

/// Geocoding and routing ports supplied by a single provider.
#[derive(Clone)]
pub struct TransportProvider {
    /// Provider display name, used in logs.
    pub name: String,
    /// Address and postal code lookup.
    pub geocoder: Arc<dyn GeocodePort>,
    /// Driving directions.
    pub router: Arc<dyn RoutePort>,
}
