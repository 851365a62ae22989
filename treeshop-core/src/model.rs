//! Domain data structures for package tiers, rates, and quotes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Clearing package offered to the customer.
pub enum PackageTier {
    /// Trees up to 4" DBH.
    Small,
    /// Trees up to 6" DBH.
    Medium,
    /// Trees up to 8" DBH.
    Large,
    /// Trees up to 10" DBH.
    Xlarge,
    /// Full clearing, light density.
    MaxLight,
    /// Full clearing, medium density.
    MaxMedium,
    /// Full clearing, heavy density.
    MaxHeavy,
}

impl PackageTier {
    /// Every tier in menu order.
    pub const ALL: [PackageTier; 7] = [
        PackageTier::Small,
        PackageTier::Medium,
        PackageTier::Large,
        PackageTier::Xlarge,
        PackageTier::MaxLight,
        PackageTier::MaxMedium,
        PackageTier::MaxHeavy,
    ];

    /// The density-priced tiers that carry an automatic debris estimate.
    pub const MAX: [PackageTier; 3] = [
        PackageTier::MaxLight,
        PackageTier::MaxMedium,
        PackageTier::MaxHeavy,
    ];

    /// Stable key used for settings entries.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            PackageTier::Small => "small",
            PackageTier::Medium => "medium",
            PackageTier::Large => "large",
            PackageTier::Xlarge => "xlarge",
            PackageTier::MaxLight => "maxLight",
            PackageTier::MaxMedium => "maxMedium",
            PackageTier::MaxHeavy => "maxHeavy",
        }
    }

    /// Human-friendly name shown in pickers.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            PackageTier::Small => "Small (4\" DBH)",
            PackageTier::Medium => "Medium (6\" DBH)",
            PackageTier::Large => "Large (8\" DBH)",
            PackageTier::Xlarge => "X-Large (10\" DBH)",
            PackageTier::MaxLight => "Max - Light Density",
            PackageTier::MaxMedium => "Max - Medium Density",
            PackageTier::MaxHeavy => "Max - Heavy Density",
        }
    }

    /// Short note on what a max tier covers; empty for per-acre tiers.
    #[must_use]
    pub fn density_description(self) -> &'static str {
        match self {
            PackageTier::MaxLight => "10\" and under trees (most projects)",
            PackageTier::MaxMedium => "Up to 15\" trees, 3-4 days",
            PackageTier::MaxHeavy => "15\"+ trees, 7+ days",
            _ => "",
        }
    }

    /// Whether debris hauling is auto-estimated for this tier.
    #[must_use]
    pub fn is_max(self) -> bool {
        Self::MAX.contains(&self)
    }

    /// The tier after this one, wrapping around.
    #[must_use]
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|tier| *tier == self).unwrap_or(0);
        Self::ALL
            .get((idx + 1) % Self::ALL.len())
            .copied()
            .unwrap_or(PackageTier::Small)
    }

    /// The tier before this one, wrapping around.
    #[must_use]
    pub fn previous(self) -> Self {
        let idx = Self::ALL.iter().position(|tier| *tier == self).unwrap_or(0);
        Self::ALL
            .get((idx + Self::ALL.len() - 1) % Self::ALL.len())
            .copied()
            .unwrap_or(PackageTier::Small)
    }
}

impl fmt::Display for PackageTier {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.display_name())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
/// Ways a rate table can violate its invariants.
pub enum RateTableError {
    /// A rate or multiplier is negative or not a finite number.
    #[error("{field} must be a non-negative number, got {value}")]
    Negative {
        /// Name of the offending field.
        field: String,
        /// Rejected value.
        value: f64,
    },
    /// The deposit fraction is outside `0.0..=1.0`.
    #[error("deposit fraction must be between 0 and 1, got {0}")]
    DepositOutOfRange(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Configurable prices that drive every quote.
pub struct RateTable {
    /// Price per acre for each tier.
    pub package_rates: BTreeMap<PackageTier, f64>,
    /// Expected debris yards per acre, max tiers only.
    pub debris_yields: BTreeMap<PackageTier, f64>,
    /// Price per billable transport hour.
    pub transport_rate_per_hour: f64,
    /// Price per hauled debris yard.
    pub debris_rate_per_yard: f64,
    /// Multiplier applied to the subtotal.
    pub final_markup_multiplier: f64,
    /// Share of the final price due up front.
    pub deposit_fraction: f64,
}

impl Default for RateTable {
    fn default() -> Self {
        let package_rates = BTreeMap::from([
            (PackageTier::Small, 2125.0),
            (PackageTier::Medium, 2500.0),
            (PackageTier::Large, 3375.0),
            (PackageTier::Xlarge, 4250.0),
            // roughly four crew days each at the light end
            (PackageTier::MaxLight, 8000.0),
            (PackageTier::MaxMedium, 12_000.0),
            (PackageTier::MaxHeavy, 18_000.0),
        ]);
        let debris_yields = BTreeMap::from([
            (PackageTier::MaxLight, 500.0),
            (PackageTier::MaxMedium, 750.0),
            (PackageTier::MaxHeavy, 1000.0),
        ]);

        Self {
            package_rates,
            debris_yields,
            transport_rate_per_hour: 150.0,
            debris_rate_per_yard: 20.0,
            final_markup_multiplier: 1.15,
            deposit_fraction: 0.25,
        }
    }
}

impl RateTable {
    /// Per-acre rate for a tier, zero when the tier has no entry.
    #[must_use]
    pub fn base_rate(&self, tier: PackageTier) -> f64 {
        self.package_rates.get(&tier).copied().unwrap_or(0.0)
    }

    /// Debris yards per acre for a tier, zero for per-acre tiers or missing entries.
    #[must_use]
    pub fn debris_yield(&self, tier: PackageTier) -> f64 {
        if !tier.is_max() {
            return 0.0;
        }
        self.debris_yields.get(&tier).copied().unwrap_or(0.0)
    }

    /// Check that every rate is non-negative and the deposit is a fraction.
    ///
    /// # Errors
    ///
    /// Returns the first [`RateTableError`] found.
    pub fn validate(&self) -> Result<(), RateTableError> {
        let tier_rates = self
            .package_rates
            .iter()
            .map(|(tier, rate)| (format!("{}Rate", tier.key()), *rate));
        let tier_yields = self
            .debris_yields
            .iter()
            .map(|(tier, rate)| (format!("{}DebrisYield", tier.key()), *rate));
        let scalars = [
            ("transportRate", self.transport_rate_per_hour),
            ("debrisRate", self.debris_rate_per_yard),
            ("markupMultiplier", self.final_markup_multiplier),
        ]
        .into_iter()
        .map(|(field, value)| (field.to_owned(), value));

        for (field, value) in tier_rates.chain(tier_yields).chain(scalars) {
            if !value.is_finite() || value < 0.0 {
                return Err(RateTableError::Negative { field, value });
            }
        }

        if !(0.0..=1.0).contains(&self.deposit_fraction) {
            return Err(RateTableError::DepositOutOfRange(self.deposit_fraction));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Values the customer quote is computed from.
pub struct PricingInputs {
    /// Land size in acres.
    pub land_size: f64,
    /// Selected package.
    pub tier: PackageTier,
    /// Destination postal code, possibly empty.
    pub postal_code: String,
    /// Billable round-trip transport hours.
    pub transport_hours: f64,
    /// Debris yards on top of any automatic estimate.
    pub debris_yards: f64,
}

impl Default for PricingInputs {
    fn default() -> Self {
        Self {
            land_size: 2.5,
            tier: PackageTier::Medium,
            postal_code: String::new(),
            transport_hours: 2.0,
            debris_yards: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
/// Priced quote derived from inputs and rates. Values are unrounded.
pub struct PricingBreakdown {
    /// Acreage times the tier rate.
    pub base_cost: f64,
    /// Transport hours times the hourly rate.
    pub transport_cost: f64,
    /// Debris yards implied by the tier density, zero for per-acre tiers.
    pub estimated_debris_yards: f64,
    /// Total debris hauling, estimated plus additional yards.
    pub debris_cost: f64,
    /// Sum of base, transport, and debris cost.
    pub subtotal: f64,
    /// Subtotal after markup.
    pub final_price: f64,
    /// Amount due up front.
    pub deposit_amount: f64,
    /// Amount due on completion.
    pub balance_due: f64,
    /// Portion of `debris_cost` from the automatic estimate.
    pub estimated_debris_cost: f64,
    /// Portion of `debris_cost` from user-entered yards.
    pub additional_debris_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Business details shown on quotes; the address anchors transport estimates.
pub struct BusinessProfile {
    /// Trading name.
    pub name: String,
    /// Yard or office address trips start from.
    pub base_address: String,
    /// Contact phone number.
    pub phone: String,
    /// Contact email address.
    pub email: String,
}

impl Default for BusinessProfile {
    fn default() -> Self {
        Self {
            name: String::from("TreeShop"),
            base_address: String::new(),
            phone: String::new(),
            email: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Geographic point in decimal degrees.
pub struct Coordinate {
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// How the route should be travelled.
pub enum TravelMode {
    /// Road travel by truck or car.
    Driving,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Route returned by a directions provider.
pub struct Route {
    /// Expected one-way travel time in seconds.
    pub expected_travel_secs: f64,
    /// Route length in meters.
    pub distance_meters: f64,
}
