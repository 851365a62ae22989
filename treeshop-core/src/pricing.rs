//! Pure pricing math. No I/O and no validation: callers keep inputs non-negative.

use crate::model::{PricingBreakdown, PricingInputs, RateTable};

/// Derive the full priced breakdown for `inputs` under `rates`.
///
/// Max tiers add `land_size × debris_yield` yards to the hauling bill; any
/// user-entered debris yards are charged on top of that estimate.
#[must_use]
pub fn price(inputs: &PricingInputs, rates: &RateTable) -> PricingBreakdown {
    let base_cost = inputs.land_size * rates.base_rate(inputs.tier);
    let transport_cost = inputs.transport_hours * rates.transport_rate_per_hour;

    let estimated_debris_yards = if inputs.tier.is_max() {
        inputs.land_size * rates.debris_yield(inputs.tier)
    } else {
        0.0
    };
    let estimated_debris_cost = estimated_debris_yards * rates.debris_rate_per_yard;
    let additional_debris_cost = inputs.debris_yards * rates.debris_rate_per_yard;
    let debris_cost = (estimated_debris_yards + inputs.debris_yards) * rates.debris_rate_per_yard;

    let subtotal = base_cost + transport_cost + debris_cost;
    let final_price = subtotal * rates.final_markup_multiplier;
    let deposit_amount = final_price * rates.deposit_fraction;
    let balance_due = final_price - deposit_amount;

    PricingBreakdown {
        base_cost,
        transport_cost,
        estimated_debris_yards,
        debris_cost,
        subtotal,
        final_price,
        deposit_amount,
        balance_due,
        estimated_debris_cost,
        additional_debris_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PackageTier;

    const TOLERANCE: f64 = 1e-6;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < TOLERANCE,
            "expected {expected}, got {actual}"
        );
    }

    fn inputs(land_size: f64, tier: PackageTier, hours: f64, yards: f64) -> PricingInputs {
        PricingInputs {
            land_size,
            tier,
            postal_code: String::new(),
            transport_hours: hours,
            debris_yards: yards,
        }
    }

    #[test]
    fn medium_package_with_transport() {
        let quote = price(
            &inputs(2.5, PackageTier::Medium, 2.0, 0.0),
            &RateTable::default(),
        );

        assert_close(quote.base_cost, 6250.0);
        assert_close(quote.transport_cost, 300.0);
        assert_close(quote.debris_cost, 0.0);
        assert_close(quote.subtotal, 6550.0);
        assert_close(quote.final_price, 7532.5);
        assert_close(quote.deposit_amount, 1883.125);
        assert_close(quote.balance_due, 5649.375);
    }

    #[test]
    fn max_light_includes_estimated_debris() {
        let quote = price(
            &inputs(1.0, PackageTier::MaxLight, 0.0, 0.0),
            &RateTable::default(),
        );

        assert_close(quote.estimated_debris_yards, 500.0);
        assert_close(quote.debris_cost, 10_000.0);
        assert_close(quote.base_cost, 8000.0);
        assert_close(quote.subtotal, 18_000.0);
        assert_close(quote.final_price, 20_700.0);
    }

    #[test]
    fn extra_debris_adds_to_estimate_for_max_tiers() {
        let rates = RateTable::default();
        for tier in PackageTier::MAX {
            let quote = price(&inputs(1.5, tier, 0.0, 40.0), &rates);
            let expected = (1.5 * rates.debris_yield(tier) + 40.0) * rates.debris_rate_per_yard;

            assert_close(quote.debris_cost, expected);
            assert_close(
                quote.estimated_debris_cost + quote.additional_debris_cost,
                quote.debris_cost,
            );
            assert_close(quote.additional_debris_cost, 800.0);
        }
    }

    #[test]
    fn per_acre_tiers_never_estimate_debris() {
        let rates = RateTable::default();
        for tier in PackageTier::ALL.into_iter().filter(|tier| !tier.is_max()) {
            let quote = price(&inputs(12.0, tier, 1.0, 25.0), &rates);

            assert_close(quote.estimated_debris_yards, 0.0);
            assert_close(quote.debris_cost, 25.0 * rates.debris_rate_per_yard);
        }
    }

    #[test]
    fn final_price_and_split_are_consistent() {
        let mut rates = RateTable::default();
        rates.final_markup_multiplier = 1.3;
        rates.deposit_fraction = 0.4;

        for tier in PackageTier::ALL {
            let quote = price(&inputs(3.75, tier, 4.5, 12.0), &rates);

            assert_close(
                quote.final_price,
                (quote.base_cost + quote.transport_cost + quote.debris_cost) * 1.3,
            );
            assert_close(quote.deposit_amount + quote.balance_due, quote.final_price);
        }
    }

    #[test]
    fn pricing_is_idempotent() {
        let rates = RateTable::default();
        let request = inputs(4.2, PackageTier::MaxHeavy, 3.5, 10.0);

        assert_eq!(price(&request, &rates), price(&request, &rates));
    }

    #[test]
    fn zero_inputs_give_zero_quote() {
        let quote = price(
            &inputs(0.0, PackageTier::MaxMedium, 0.0, 0.0),
            &RateTable::default(),
        );
        assert_eq!(quote, PricingBreakdown::default());
    }

    #[test]
    fn unpriced_tier_costs_nothing() {
        let mut rates = RateTable::default();
        rates.package_rates.clear();

        let quote = price(&inputs(2.0, PackageTier::Xlarge, 0.0, 0.0), &rates);
        assert_close(quote.base_cost, 0.0);
        assert_close(quote.final_price, 0.0);
    }
}
