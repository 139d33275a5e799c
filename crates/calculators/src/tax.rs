//! Slab-based income tax
//!
//! Tax accrues only on the slice of income inside each slab, at that
//! slab's marginal rate. Cess is applied on the summed slab tax.

use finlit_config::TaxSettings;
use serde::{Deserialize, Serialize};

/// One slab of a marginal schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSlab {
    /// Upper bound of the slab; `None` for the top slab
    pub upto: Option<f64>,
    /// Marginal rate in percent
    pub rate_percent: f64,
}

/// Tax owed on one slab for a given income
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlabContribution {
    pub lower: f64,
    pub upper: Option<f64>,
    pub rate_percent: f64,
    /// Portion of income falling inside this slab
    pub taxable: f64,
    /// Tax on that portion, before cess
    pub tax: f64,
}

/// Ordered marginal tax schedule
///
/// Slab bounds are strictly ascending and only the last slab is
/// unbounded. Settings are validated against this at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxSchedule {
    slabs: Vec<TaxSlab>,
    cess_percent: f64,
}

impl TaxSchedule {
    pub fn new(slabs: Vec<TaxSlab>, cess_percent: f64) -> Self {
        debug_assert!(
            slabs.iter().rev().skip(1).all(|s| s.upto.is_some()),
            "only the last slab may be unbounded"
        );
        Self { slabs, cess_percent }
    }

    /// Schedule described by settings
    pub fn from_settings(settings: &TaxSettings) -> Self {
        let slabs = settings
            .effective_slabs()
            .into_iter()
            .map(|s| TaxSlab {
                upto: s.upto,
                rate_percent: s.rate_percent,
            })
            .collect();
        Self::new(slabs, settings.cess_percent)
    }

    /// Old regime preset with cess
    pub fn old_regime() -> Self {
        Self::from_settings(&TaxSettings::default())
    }

    /// New regime preset with cess
    pub fn new_regime() -> Self {
        Self::from_settings(&TaxSettings {
            regime: finlit_config::TaxRegime::New,
            ..TaxSettings::default()
        })
    }

    pub fn slabs(&self) -> &[TaxSlab] {
        &self.slabs
    }

    pub fn cess_percent(&self) -> f64 {
        self.cess_percent
    }

    /// Per-slab contributions for `income`, lowest slab first.
    ///
    /// Slabs the income does not reach are omitted.
    pub fn breakdown(&self, income: f64) -> Vec<SlabContribution> {
        let mut contributions = Vec::new();
        let mut lower = 0.0;

        for slab in &self.slabs {
            if income <= lower {
                break;
            }
            let upper = slab.upto.unwrap_or(f64::INFINITY);
            let taxable = income.min(upper) - lower;
            contributions.push(SlabContribution {
                lower,
                upper: slab.upto,
                rate_percent: slab.rate_percent,
                taxable,
                tax: taxable * slab.rate_percent / 100.0,
            });
            lower = upper;
        }

        contributions
    }
}

/// Tax owed on `taxable_income`, cess included
pub fn tax_owed(schedule: &TaxSchedule, taxable_income: f64) -> f64 {
    let base: f64 = schedule.breakdown(taxable_income).iter().map(|c| c.tax).sum();
    base * (1.0 + schedule.cess_percent / 100.0)
}

/// Effect of a deductible investment on tax
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSaving {
    pub tax_without: f64,
    pub tax_with: f64,
    pub saved: f64,
    /// Tax saved as a percentage of the amount invested
    pub effective_return_percent: f64,
}

/// Tax saved by deducting `investment` from `income`.
///
/// `investment` must already be clamped to the statutory cap.
pub fn tax_saved(schedule: &TaxSchedule, income: f64, investment: f64) -> TaxSaving {
    let tax_without = tax_owed(schedule, income);
    let tax_with = tax_owed(schedule, (income - investment).max(0.0));
    let saved = tax_without - tax_with;
    let effective_return_percent = if investment > 0.0 {
        saved / investment * 100.0
    } else {
        0.0
    };

    TaxSaving {
        tax_without,
        tax_with,
        saved,
        effective_return_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn no_cess(schedule: TaxSchedule) -> TaxSchedule {
        TaxSchedule::new(schedule.slabs, 0.0)
    }

    /// Reference: locate the top slab, then add the full tax of every
    /// slab below it plus the marginal slice.
    fn reference_tax(schedule: &TaxSchedule, income: f64) -> f64 {
        let mut full_slabs_tax = 0.0;
        let mut lower = 0.0;
        for slab in schedule.slabs() {
            match slab.upto {
                Some(upper) if income > upper => {
                    full_slabs_tax += (upper - lower) * slab.rate_percent / 100.0;
                    lower = upper;
                },
                _ => {
                    let marginal = (income - lower).max(0.0) * slab.rate_percent / 100.0;
                    return (full_slabs_tax + marginal) * (1.0 + schedule.cess_percent() / 100.0);
                },
            }
        }
        full_slabs_tax * (1.0 + schedule.cess_percent() / 100.0)
    }

    #[test]
    fn test_old_regime_values() {
        let schedule = no_cess(TaxSchedule::old_regime());
        assert_eq!(tax_owed(&schedule, 0.0), 0.0);
        assert_eq!(tax_owed(&schedule, 250_000.0), 0.0);
        // 5% of 2.5L
        assert_eq!(tax_owed(&schedule, 500_000.0), 12_500.0);
        // 12,500 + 20% of 3L
        assert_eq!(tax_owed(&schedule, 800_000.0), 72_500.0);
        // 12,500 + 1,00,000 + 30% of 5L
        assert_eq!(tax_owed(&schedule, 1_500_000.0), 262_500.0);
    }

    #[test]
    fn test_cess_applied_on_total() {
        let schedule = TaxSchedule::old_regime();
        assert_eq!(schedule.cess_percent(), 4.0);
        assert!((tax_owed(&schedule, 800_000.0) - 75_400.0).abs() < 1e-6);
    }

    #[test]
    fn test_new_regime_values() {
        let schedule = no_cess(TaxSchedule::new_regime());
        // 5% of 4L + 10% of 3L + 15% of 2L
        assert_eq!(tax_owed(&schedule, 1_200_000.0), 20_000.0 + 30_000.0 + 30_000.0);
    }

    #[test]
    fn test_breakdown_sums_to_total() {
        let schedule = no_cess(TaxSchedule::old_regime());
        let parts = schedule.breakdown(1_200_000.0);
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[3].taxable, 200_000.0);
        assert_eq!(parts[3].upper, None);

        let sum: f64 = parts.iter().map(|p| p.tax).sum();
        assert_eq!(sum, tax_owed(&schedule, 1_200_000.0));
        let covered: f64 = parts.iter().map(|p| p.taxable).sum();
        assert_eq!(covered, 1_200_000.0);
    }

    #[test]
    fn test_breakdown_stops_at_income() {
        let schedule = TaxSchedule::old_regime();
        assert!(schedule.breakdown(0.0).is_empty());
        assert_eq!(schedule.breakdown(300_000.0).len(), 2);
    }

    #[test]
    fn test_matches_reference_on_grid() {
        for schedule in [TaxSchedule::old_regime(), TaxSchedule::new_regime()] {
            let mut income = 0.0;
            while income <= 5_000_000.0 {
                let expected = reference_tax(&schedule, income);
                let actual = tax_owed(&schedule, income);
                assert!(
                    (expected - actual).abs() < 1e-6,
                    "income {}: expected {}, got {}",
                    income,
                    expected,
                    actual
                );
                income += 12_500.0;
            }
        }
    }

    #[test]
    fn test_tax_saved_with_80c() {
        let schedule = no_cess(TaxSchedule::old_regime());
        let saving = tax_saved(&schedule, 1_000_000.0, 150_000.0);
        assert_eq!(saving.tax_without, 112_500.0);
        assert_eq!(saving.tax_with, 82_500.0);
        assert_eq!(saving.saved, 30_000.0);
        assert!((saving.effective_return_percent - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_tax_saved_zero_investment() {
        let schedule = TaxSchedule::old_regime();
        let saving = tax_saved(&schedule, 900_000.0, 0.0);
        assert_eq!(saving.saved, 0.0);
        assert_eq!(saving.effective_return_percent, 0.0);
    }

    #[test]
    fn test_tax_saved_investment_above_income() {
        let schedule = TaxSchedule::old_regime();
        let saving = tax_saved(&schedule, 100_000.0, 150_000.0);
        assert_eq!(saving.tax_with, 0.0);
        assert_eq!(saving.saved, 0.0);
    }

    proptest! {
        #[test]
        fn tax_is_monotonic(i1 in 0u64..20_000_000, delta in 0u64..5_000_000) {
            let schedule = TaxSchedule::old_regime();
            let low = tax_owed(&schedule, i1 as f64);
            let high = tax_owed(&schedule, (i1 + delta) as f64);
            prop_assert!(low <= high);
        }

        #[test]
        fn tax_is_continuous_at_slab_edges(edge_index in 0usize..3, epsilon in 0.001f64..1.0) {
            let schedule = TaxSchedule::old_regime();
            let edge = schedule.slabs()[edge_index].upto.unwrap();
            let below = tax_owed(&schedule, edge - epsilon);
            let above = tax_owed(&schedule, edge + epsilon);
            // At most the top marginal rate (30% + cess) on the 2ε gap
            prop_assert!(above - below <= 2.0 * epsilon * 0.312 + 1e-9);
        }

        #[test]
        fn saved_is_exact_difference(income in 0u64..10_000_000, invest in 0u64..150_001) {
            let schedule = TaxSchedule::old_regime();
            let invest = invest.min(income);
            let saving = tax_saved(&schedule, income as f64, invest as f64);
            let expected = tax_owed(&schedule, income as f64)
                - tax_owed(&schedule, (income - invest) as f64);
            prop_assert_eq!(saving.saved, expected);
        }
    }
}
