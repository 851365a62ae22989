//! Geocode-then-route lookup producing billable round-trip hours.

use std::fmt;
use std::time::Duration;

use tokio::time::timeout;

use crate::model::{Coordinate, TravelMode};
use crate::ports::{PortError, TransportProvider};

/// Upper bound on a whole estimate when none is configured.
pub const DEFAULT_ESTIMATE_TIMEOUT: Duration = Duration::from_secs(30);

const SECS_PER_HOUR: f64 = 3600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Step of the estimate pipeline.
pub enum LookupStage {
    /// Geocoding the business base address.
    BaseAddress,
    /// Geocoding the project postal code.
    Destination,
    /// Requesting driving directions.
    Route,
}

impl fmt::Display for LookupStage {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LookupStage::BaseAddress => "base address",
            LookupStage::Destination => "destination",
            LookupStage::Route => "route",
        };
        formatter.write_str(label)
    }
}

#[derive(thiserror::Error, Debug)]
/// Reasons a transport estimate is unavailable.
pub enum EstimateError {
    /// The provider had no match for the base address or postal code.
    #[error("{0} could not be resolved")]
    Unresolved(LookupStage),
    /// The provider found no driving route.
    #[error("no driving route between base and destination")]
    NoRoute,
    /// A provider call failed outright.
    #[error("{stage} lookup failed: {source}")]
    Lookup {
        /// Stage that failed.
        stage: LookupStage,
        /// Underlying provider error.
        #[source]
        source: PortError,
    },
    /// The pipeline did not finish in time.
    #[error("transport estimate timed out after {0:?}")]
    TimedOut(Duration),
    /// The task running the pipeline stopped before producing a result.
    #[error("transport estimate aborted: {0}")]
    Aborted(String),
}

/// A base address and destination postal code, both non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    base_address: String,
    postal_code: String,
}

impl TransportRequest {
    /// Build a request, or `None` when either side is blank.
    #[must_use]
    pub fn new(base_address: &str, postal_code: &str) -> Option<Self> {
        let base_address = base_address.trim();
        let postal_code = postal_code.trim();
        if base_address.is_empty() || postal_code.is_empty() {
            return None;
        }
        Some(Self {
            base_address: base_address.to_owned(),
            postal_code: postal_code.to_owned(),
        })
    }

    /// Address trips start from.
    #[must_use]
    pub fn base_address(&self) -> &str {
        &self.base_address
    }

    /// Project postal code.
    #[must_use]
    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }
}

/// Round-trip hours for a one-way drive, rounded to the nearest half hour.
#[must_use]
pub fn round_trip_hours(one_way_secs: f64) -> f64 {
    let one_way_hours = one_way_secs / SECS_PER_HOUR;
    (one_way_hours * 2.0 * 2.0).round() / 2.0
}

/// Resolves billable transport hours through a [`TransportProvider`].
#[derive(Clone)]
pub struct TransportEstimator {
    provider: TransportProvider,
    timeout: Duration,
}

impl TransportEstimator {
    /// Create an estimator bounded by [`DEFAULT_ESTIMATE_TIMEOUT`].
    #[must_use]
    pub fn new(provider: TransportProvider) -> Self {
        Self {
            provider,
            timeout: DEFAULT_ESTIMATE_TIMEOUT,
        }
    }

    /// Replace the overall time limit for one estimate.
    #[must_use]
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = limit;
        self
    }

    /// Geocode both ends, route between them, and return round-trip hours.
    ///
    /// # Errors
    ///
    /// Returns an [`EstimateError`] naming the first stage that failed, or
    /// [`EstimateError::TimedOut`] when the limit elapses first.
    pub async fn estimate(&self, request: &TransportRequest) -> Result<f64, EstimateError> {
        timeout(self.timeout, self.run(request))
            .await
            .map_err(|_elapsed| EstimateError::TimedOut(self.timeout))?
    }

    async fn run(&self, request: &TransportRequest) -> Result<f64, EstimateError> {
        let base = self
            .locate(LookupStage::BaseAddress, request.base_address())
            .await?;
        let destination = self
            .locate(LookupStage::Destination, request.postal_code())
            .await?;

        tracing::debug!(
            provider = %self.provider.name,
            ?base,
            ?destination,
            "requesting driving route"
        );
        let route = self
            .provider
            .router
            .route(base, destination, TravelMode::Driving)
            .await
            .map_err(|source| EstimateError::Lookup {
                stage: LookupStage::Route,
                source,
            })?
            .ok_or(EstimateError::NoRoute)?;

        let hours = round_trip_hours(route.expected_travel_secs);
        tracing::debug!(
            one_way_secs = route.expected_travel_secs,
            hours,
            "route resolved"
        );
        Ok(hours)
    }

    async fn locate(&self, stage: LookupStage, query: &str) -> Result<Coordinate, EstimateError> {
        tracing::debug!(provider = %self.provider.name, %stage, query, "geocoding");
        self.provider
            .geocoder
            .geocode(query)
            .await
            .map_err(|source| EstimateError::Lookup { stage, source })?
            .ok_or(EstimateError::Unresolved(stage))
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::model::{Coordinate, Route, TravelMode};
    use crate::ports::{GeocodePort, PortError, RoutePort, TransportProvider};

    pub(crate) const YARD: Coordinate = Coordinate {
        latitude: 45.52,
        longitude: -122.68,
    };
    pub(crate) const SITE: Coordinate = Coordinate {
        latitude: 45.31,
        longitude: -122.97,
    };

    #[derive(Default)]
    pub(crate) struct FakeGeocoder {
        pub(crate) places: HashMap<String, Coordinate>,
        pub(crate) fail: bool,
        pub(crate) calls: AtomicUsize,
    }

    #[async_trait]
    impl GeocodePort for FakeGeocoder {
        async fn geocode(&self, query: &str) -> Result<Option<Coordinate>, PortError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PortError::Internal(String::from("geocoder down")));
            }
            Ok(self.places.get(query).copied())
        }
    }

    pub(crate) struct FakeRouter {
        pub(crate) one_way_secs: Option<f64>,
        pub(crate) hang: bool,
    }

    #[async_trait]
    impl RoutePort for FakeRouter {
        async fn route(
            &self,
            _from: Coordinate,
            _to: Coordinate,
            _mode: TravelMode,
        ) -> Result<Option<Route>, PortError> {
            if self.hang {
                std::future::pending::<()>().await;
            }
            Ok(self.one_way_secs.map(|secs| Route {
                expected_travel_secs: secs,
                distance_meters: secs * 20.0,
            }))
        }
    }

    pub(crate) fn geocoder_with(entries: &[(&str, Coordinate)]) -> FakeGeocoder {
        FakeGeocoder {
            places: entries
                .iter()
                .map(|(query, point)| ((*query).to_owned(), *point))
                .collect(),
            ..FakeGeocoder::default()
        }
    }

    pub(crate) fn provider(geocoder: FakeGeocoder, router: FakeRouter) -> TransportProvider {
        TransportProvider {
            name: String::from("fake"),
            geocoder: Arc::new(geocoder),
            router: Arc::new(router),
        }
    }
}
