//! Quoting session: current inputs, rates, and the live breakdown.
//!
//! Transport estimates run as spawned tasks. Their outcomes are queued and
//! only applied when the owner calls [`PricingSession::poll_transport`] or
//! [`PricingSession::wait_for_transport`], so every mutation of the session
//! happens on the owner's side. Overlapping estimates are not deduplicated:
//! whichever finishes last decides the transport hours.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::model::{
    BusinessProfile, PackageTier, PricingBreakdown, PricingInputs, RateTable, RateTableError,
};
use crate::pricing::price;
use crate::settings::{
    SettingsError, SettingsStore, load_profile, load_rate_table, save_profile, save_rate_table,
};
use crate::transport::{EstimateError, TransportEstimator, TransportRequest};

/// Digits in a complete postal code.
pub const POSTAL_CODE_LEN: usize = 5;

/// Whether `code` is a complete postal code that is worth looking up.
#[must_use]
pub fn is_complete_postal_code(code: &str) -> bool {
    code.len() == POSTAL_CODE_LEN && code.chars().all(|ch| ch.is_ascii_digit())
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// A single edit to the numeric or tier inputs.
pub enum InputUpdate {
    /// Land size in acres.
    LandSize(f64),
    /// Package selection.
    Tier(PackageTier),
    /// Manually entered transport hours.
    TransportHours(f64),
    /// Debris yards beyond the automatic estimate.
    DebrisYards(f64),
}

#[derive(thiserror::Error, Debug)]
/// Errors returned by settings updates.
pub enum SessionError {
    /// The new rate table breaks an invariant and was not applied.
    #[error("invalid rate table: {0}")]
    InvalidRates(#[from] RateTableError),
    /// The change was applied but could not be persisted.
    #[error("failed to persist settings: {0}")]
    Persist(#[from] SettingsError),
}

#[derive(Debug)]
/// Finished transport estimate, as applied to the session.
pub struct TransportOutcome {
    /// Sequence number assigned when the estimate was started.
    pub request_id: u64,
    /// Round-trip hours, or why none are available.
    pub result: Result<f64, EstimateError>,
}

/// Mutable quote state a front end works against.
pub struct PricingSession {
    inputs: PricingInputs,
    rates: RateTable,
    profile: BusinessProfile,
    breakdown: PricingBreakdown,
    store: Box<dyn SettingsStore>,
    estimator: Arc<TransportEstimator>,
    estimating: bool,
    in_flight: usize,
    next_request_id: u64,
    outcome_tx: UnboundedSender<TransportOutcome>,
    outcome_rx: UnboundedReceiver<TransportOutcome>,
}

impl PricingSession {
    /// Start a session with rates and profile loaded from `store`.
    #[must_use]
    pub fn new(estimator: TransportEstimator, store: Box<dyn SettingsStore>) -> Self {
        let rates = load_rate_table(store.as_ref());
        let profile = load_profile(store.as_ref());
        let inputs = PricingInputs::default();
        let breakdown = price(&inputs, &rates);
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        Self {
            inputs,
            rates,
            profile,
            breakdown,
            store,
            estimator: Arc::new(estimator),
            estimating: false,
            in_flight: 0,
            next_request_id: 0,
            outcome_tx,
            outcome_rx,
        }
    }

    /// Current inputs.
    #[must_use]
    pub fn inputs(&self) -> &PricingInputs {
        &self.inputs
    }

    /// Current rate table.
    #[must_use]
    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// Current business profile.
    #[must_use]
    pub fn profile(&self) -> &BusinessProfile {
        &self.profile
    }

    /// Breakdown for the current inputs and rates.
    #[must_use]
    pub fn breakdown(&self) -> &PricingBreakdown {
        &self.breakdown
    }

    /// Backing settings store.
    #[must_use]
    pub fn settings(&self) -> &dyn SettingsStore {
        self.store.as_ref()
    }

    /// True from the start of an estimate until the next outcome is applied.
    #[must_use]
    pub fn is_estimating(&self) -> bool {
        self.estimating
    }

    /// Apply one input edit and reprice.
    pub fn set_input(&mut self, update: InputUpdate) {
        match update {
            InputUpdate::LandSize(acres) => self.inputs.land_size = acres,
            InputUpdate::Tier(tier) => self.inputs.tier = tier,
            InputUpdate::TransportHours(hours) => self.inputs.transport_hours = hours,
            InputUpdate::DebrisYards(yards) => self.inputs.debris_yards = yards,
        }
        self.recompute();
    }

    /// Replace the postal code; a complete code starts an estimate when a
    /// base address is configured. Returns whether an estimate was started.
    pub fn update_postal_code(&mut self, code: impl Into<String>) -> bool {
        self.inputs.postal_code = code.into();
        if is_complete_postal_code(&self.inputs.postal_code)
            && !self.profile.base_address.trim().is_empty()
        {
            return self.estimate_transport();
        }
        false
    }

    /// Start a transport estimate for the current postal code.
    ///
    /// Does nothing and returns `false` when the base address or postal code
    /// is blank, or when called outside a tokio runtime.
    pub fn estimate_transport(&mut self) -> bool {
        let Some(request) =
            TransportRequest::new(&self.profile.base_address, &self.inputs.postal_code)
        else {
            return false;
        };
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!("transport estimate requested outside a runtime");
            return false;
        };

        self.next_request_id += 1;
        let request_id = self.next_request_id;
        self.estimating = true;
        self.in_flight += 1;
        tracing::info!(
            request_id,
            postal_code = request.postal_code(),
            "estimating transport"
        );

        let estimator = Arc::clone(&self.estimator);
        let outcome_tx = self.outcome_tx.clone();
        let lookup = runtime.spawn(async move { estimator.estimate(&request).await });
        // a panicking provider must still release the busy flag
        runtime.spawn(async move {
            let result = lookup.await.unwrap_or_else(|err| {
                tracing::error!(request_id, error = %err, "transport estimate task failed");
                Err(EstimateError::Aborted(err.to_string()))
            });
            if outcome_tx
                .send(TransportOutcome { request_id, result })
                .is_err()
            {
                tracing::debug!(request_id, "session closed before estimate finished");
            }
        });
        true
    }

    /// Apply a finished estimate if one is queued, without waiting.
    pub fn poll_transport(&mut self) -> Option<TransportOutcome> {
        let outcome = self.outcome_rx.try_recv().ok()?;
        Some(self.apply_outcome(outcome))
    }

    /// Wait for the next finished estimate and apply it.
    ///
    /// Returns `None` immediately when no estimate is in flight.
    pub async fn wait_for_transport(&mut self) -> Option<TransportOutcome> {
        if self.in_flight == 0 {
            return None;
        }
        let outcome = self.outcome_rx.recv().await?;
        Some(self.apply_outcome(outcome))
    }

    /// Validate, apply, and persist a new rate table.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidRates`] without touching the session
    /// when `rates` breaks an invariant, or [`SessionError::Persist`] after
    /// applying it when the store cannot be written.
    pub fn update_rates(&mut self, rates: RateTable) -> Result<(), SessionError> {
        rates.validate()?;
        self.rates = rates;
        self.recompute();
        save_rate_table(self.store.as_mut(), &self.rates)?;
        tracing::info!("rate table updated");
        Ok(())
    }

    /// Apply and persist a new business profile.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Persist`] after applying the profile when the
    /// store cannot be written.
    pub fn update_profile(&mut self, profile: BusinessProfile) -> Result<(), SessionError> {
        self.profile = profile;
        save_profile(self.store.as_mut(), &self.profile)?;
        tracing::info!("business profile updated");
        Ok(())
    }

    fn apply_outcome(&mut self, outcome: TransportOutcome) -> TransportOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.estimating = false;

        match &outcome.result {
            Ok(hours) => {
                tracing::info!(request_id = outcome.request_id, hours, "transport estimated");
                self.inputs.transport_hours = *hours;
                self.recompute();
            }
            Err(err) => {
                // hours stay as they were so manual entry still works
                tracing::warn!(
                    request_id = outcome.request_id,
                    error = %err,
                    "transport estimate unavailable"
                );
            }
        }

        outcome
    }

    fn recompute(&mut self) {
        self.breakdown = price(&self.inputs, &self.rates);
    }
}
