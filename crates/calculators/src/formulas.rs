//! Closed-form financial formulas
//!
//! All functions assume validated input. Rates are annual percentages
//! (`12.0` means 12%).

/// Round to two decimals (paise)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Maturity value under periodic compounding
///
/// A = P × (1 + r/n)^(n×t)
///
/// Where:
/// - P = principal
/// - r = annual rate (annual_rate_percent / 100)
/// - n = compoundings per year
/// - t = years
///
/// `compoundings_per_year` must be at least 1; zero is rejected by input
/// validation before this is reached.
pub fn compound_interest(
    principal: f64,
    annual_rate_percent: f64,
    years: f64,
    compoundings_per_year: u32,
) -> f64 {
    debug_assert!(compoundings_per_year > 0, "compounding frequency must be positive");

    let r = annual_rate_percent / 100.0;
    let n = compoundings_per_year as f64;
    principal * (1.0 + r / n).powf(n * years)
}

/// Calculate EMI using the standard amortization formula
///
/// EMI = P × r × (1 + r)^n / [(1 + r)^n - 1]
///
/// Where:
/// - P = principal loan amount
/// - r = monthly interest rate (annual_rate / 12 / 100)
/// - n = tenure in months
pub fn emi(principal: f64, annual_rate_percent: f64, tenure_months: u32) -> f64 {
    if tenure_months == 0 || principal <= 0.0 {
        return 0.0;
    }

    let monthly_rate = annual_rate_percent / 100.0 / 12.0;

    // Zero interest degenerates to equal principal slices
    if monthly_rate <= 0.0 {
        return principal / tenure_months as f64;
    }

    let n = tenure_months as f64;
    let one_plus_r_n = (1.0 + monthly_rate).powf(n);

    principal * monthly_rate * one_plus_r_n / (one_plus_r_n - 1.0)
}

/// Annuity-due growth factor for monthly contributions
///
/// ((1 + i)^n - 1) / i × (1 + i), or `n` when the rate is zero.
fn sip_factor(annual_rate_percent: f64, months: u32) -> f64 {
    let i = annual_rate_percent / 100.0 / 12.0;
    let n = months as f64;
    if i <= 0.0 {
        return n;
    }
    ((1.0 + i).powf(n) - 1.0) / i * (1.0 + i)
}

/// Future value of a monthly SIP
///
/// Contributions are made at the start of each month, so every installment
/// earns interest for the month it is made in.
pub fn sip_future_value(monthly_investment: f64, annual_rate_percent: f64, months: u32) -> f64 {
    monthly_investment * sip_factor(annual_rate_percent, months)
}

/// Monthly SIP needed to accumulate `target` in `months`
pub fn required_monthly_sip(target: f64, annual_rate_percent: f64, months: u32) -> f64 {
    if target <= 0.0 || months == 0 {
        return 0.0;
    }
    target / sip_factor(annual_rate_percent, months)
}

/// Grow `amount` by annual inflation over `years`
pub fn inflate(amount: f64, inflation_percent: f64, years: f64) -> f64 {
    amount * (1.0 + inflation_percent / 100.0).powf(years)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.005_1), 1.01);
        assert_eq!(round2(8884.878_867), 8884.88);
        assert_eq!(round2(-2.344), -2.34);
    }

    #[test]
    fn test_fd_quarterly_reference_value() {
        // 1 lakh at 6.8% compounded quarterly for 5 years
        let maturity = compound_interest(100_000.0, 6.8, 5.0, 4);
        assert_eq!(round2(maturity), 140_093.85);
    }

    #[test]
    fn test_compound_annual() {
        let maturity = compound_interest(1_000.0, 10.0, 2.0, 1);
        assert!((maturity - 1_210.0).abs() < 1e-9);
    }

    #[test]
    fn test_emi_calculation_exact() {
        // P=100000, rate=12%, months=12 → EMI≈8884.88
        let value = emi(100_000.0, 12.0, 12);
        assert!((value - 8884.88).abs() < 0.01, "EMI should be ~8884.88, got {}", value);
    }

    #[test]
    fn test_emi_zero_rate() {
        assert_eq!(emi(12_000.0, 0.0, 12), 1_000.0);
    }

    #[test]
    fn test_emi_degenerate_inputs() {
        assert_eq!(emi(0.0, 12.0, 12), 0.0);
        assert_eq!(emi(100_000.0, 12.0, 0), 0.0);
    }

    #[test]
    fn test_sip_future_value() {
        // ₹5,000/month at 12% for 10 years
        let fv = sip_future_value(5_000.0, 12.0, 120);
        assert!((fv - 1_161_695.38).abs() < 0.01, "got {}", fv);
    }

    #[test]
    fn test_sip_zero_rate() {
        assert_eq!(sip_future_value(1_000.0, 0.0, 24), 24_000.0);
    }

    #[test]
    fn test_required_sip_inverts_future_value() {
        let monthly = required_monthly_sip(1_161_695.38, 12.0, 120);
        assert!((monthly - 5_000.0).abs() < 0.01, "got {}", monthly);
        assert_eq!(required_monthly_sip(0.0, 12.0, 120), 0.0);
    }

    #[test]
    fn test_inflate() {
        let future = inflate(100.0, 6.0, 2.0);
        assert!((future - 112.36).abs() < 1e-9);
        assert_eq!(inflate(100.0, 0.0, 10.0), 100.0);
    }

    proptest! {
        #[test]
        fn compound_exceeds_principal(
            principal in 1.0f64..10_000_000.0,
            rate in 0.01f64..100.0,
            years in 1u32..50,
            n in prop::sample::select(vec![1u32, 2, 4, 12, 365]),
        ) {
            prop_assert!(compound_interest(principal, rate, years as f64, n) > principal);
        }

        #[test]
        fn compound_monotonic_in_principal(
            p1 in 1.0f64..1_000_000.0,
            delta in 1.0f64..1_000_000.0,
            rate in 0.01f64..50.0,
            years in 1u32..40,
        ) {
            let low = compound_interest(p1, rate, years as f64, 4);
            let high = compound_interest(p1 + delta, rate, years as f64, 4);
            prop_assert!(high > low);
        }

        #[test]
        fn compound_monotonic_in_rate(
            principal in 1.0f64..1_000_000.0,
            r1 in 0.01f64..50.0,
            delta in 0.01f64..50.0,
            years in 1u32..40,
        ) {
            let low = compound_interest(principal, r1, years as f64, 12);
            let high = compound_interest(principal, r1 + delta, years as f64, 12);
            prop_assert!(high > low);
        }

        #[test]
        fn compound_monotonic_in_years(
            principal in 1.0f64..1_000_000.0,
            rate in 0.01f64..50.0,
            y1 in 1u32..40,
            delta in 1u32..10,
        ) {
            let low = compound_interest(principal, rate, y1 as f64, 4);
            let high = compound_interest(principal, rate, (y1 + delta) as f64, 4);
            prop_assert!(high > low);
        }
    }
}
