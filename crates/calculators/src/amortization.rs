//! Loan amortization schedule
//!
//! Amounts are kept in paise precision per installment. Each month's
//! payment is the EMI on the outstanding balance over the remaining
//! months, so rounding never accumulates, and the final installment pays
//! off whatever is left.

use serde::Serialize;

use crate::formulas::{emi, round2};

/// One monthly payment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    /// 1-based month number
    pub period: u32,
    pub payment: f64,
    pub principal_component: f64,
    pub interest_component: f64,
    /// Outstanding principal after this payment
    pub balance: f64,
}

/// Per-year rollup of a schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanYear {
    pub year: u32,
    pub principal_paid: f64,
    pub interest_paid: f64,
    pub closing_balance: f64,
}

/// Full month-by-month schedule
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationSchedule {
    pub emi: f64,
    pub installments: Vec<Installment>,
}

impl AmortizationSchedule {
    pub fn total_interest(&self) -> f64 {
        round2(self.installments.iter().map(|i| i.interest_component).sum())
    }

    pub fn total_payment(&self) -> f64 {
        round2(self.installments.iter().map(|i| i.payment).sum())
    }

    pub fn total_principal(&self) -> f64 {
        round2(self.installments.iter().map(|i| i.principal_component).sum())
    }

    /// Group installments into 12-month years
    pub fn yearly(&self) -> Vec<LoanYear> {
        self.installments
            .chunks(12)
            .enumerate()
            .map(|(index, months)| LoanYear {
                year: index as u32 + 1,
                principal_paid: round2(months.iter().map(|m| m.principal_component).sum()),
                interest_paid: round2(months.iter().map(|m| m.interest_component).sum()),
                closing_balance: months.last().map(|m| m.balance).unwrap_or_default(),
            })
            .collect()
    }
}

/// Build the amortization schedule for a loan
///
/// Interest each month is charged on the opening balance. The balance
/// falls every month and reaches zero only at the last one, provided the
/// first month repays at least
/// [`MIN_MONTHLY_PRINCIPAL`](finlit_config::constants::limits::MIN_MONTHLY_PRINCIPAL),
/// which `LoanInput` validation enforces.
pub fn amortization_schedule(
    principal: f64,
    annual_rate_percent: f64,
    tenure_months: u32,
) -> AmortizationSchedule {
    let monthly_rate = annual_rate_percent / 100.0 / 12.0;

    let mut installments = Vec::with_capacity(tenure_months as usize);
    let mut balance = round2(principal);

    for period in 1..=tenure_months {
        let interest = round2(balance * monthly_rate);

        let installment = if period == tenure_months {
            Installment {
                period,
                payment: round2(balance + interest),
                principal_component: balance,
                interest_component: interest,
                balance: 0.0,
            }
        } else {
            let remaining = tenure_months - period + 1;
            let payment = round2(emi(balance, annual_rate_percent, remaining));
            let principal_component = round2(payment - interest).min(balance);
            balance = round2(balance - principal_component);
            Installment {
                period,
                payment: round2(principal_component + interest),
                principal_component,
                interest_component: interest,
                balance,
            }
        };

        installments.push(installment);
    }

    AmortizationSchedule {
        emi: round2(emi(principal, annual_rate_percent, tenure_months)),
        installments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::LoanInput;
    use crate::validation::Validate;
    use proptest::prelude::*;

    #[test]
    fn test_schedule_closes_at_zero() {
        let schedule = amortization_schedule(1_000_000.0, 8.5, 240);
        assert_eq!(schedule.installments.len(), 240);
        assert_eq!(schedule.installments.last().unwrap().balance, 0.0);
        assert!((schedule.total_principal() - 1_000_000.0).abs() < 0.005);
    }

    #[test]
    fn test_first_installment() {
        // 1L at 12% for 12 months: EMI 8884.88, first interest 1000
        let schedule = amortization_schedule(100_000.0, 12.0, 12);
        let first = schedule.installments[0];
        assert_eq!(schedule.emi, 8_884.88);
        assert_eq!(first.interest_component, 1_000.0);
        assert_eq!(first.principal_component, 7_884.88);
        assert_eq!(first.balance, 92_115.12);
    }

    #[test]
    fn test_last_installment_absorbs_rounding() {
        let schedule = amortization_schedule(100_000.0, 12.0, 12);
        let last = schedule.installments.last().unwrap();
        assert!((last.payment - schedule.emi).abs() < 0.10);
        assert_eq!(last.balance, 0.0);
    }

    #[test]
    fn test_zero_rate_equal_slices() {
        let schedule = amortization_schedule(1_200.0, 0.0, 12);
        assert!(schedule
            .installments
            .iter()
            .all(|i| i.principal_component == 100.0 && i.interest_component == 0.0));
        assert_eq!(schedule.total_interest(), 0.0);
    }

    #[test]
    fn test_yearly_rollup() {
        let schedule = amortization_schedule(500_000.0, 9.0, 30);
        let years = schedule.yearly();
        assert_eq!(years.len(), 3);
        assert_eq!(years[2].year, 3);
        assert_eq!(years[2].closing_balance, 0.0);

        let principal: f64 = years.iter().map(|y| y.principal_paid).sum();
        assert!((principal - 500_000.0).abs() < 0.01);
    }

    #[test]
    fn test_totals_are_consistent() {
        let schedule = amortization_schedule(2_500_000.0, 7.25, 180);
        let expected = schedule.total_principal() + schedule.total_interest();
        assert!((schedule.total_payment() - expected).abs() < 0.01);
    }

    #[test]
    fn test_small_loan_balance_falls_every_month() {
        let schedule = amortization_schedule(10.0, 1.0, 12);
        let mut previous = 10.0;
        for installment in &schedule.installments {
            assert!(installment.principal_component > 0.0);
            assert!(installment.balance < previous);
            previous = installment.balance;
        }
        assert_eq!(previous, 0.0);
        assert!((schedule.total_principal() - 10.0).abs() < 0.005);
    }

    #[test]
    fn test_payments_stay_within_a_paisa_of_emi() {
        let schedule = amortization_schedule(2_500_000.0, 7.25, 180);
        for installment in &schedule.installments[..179] {
            assert!((installment.payment - schedule.emi).abs() <= 0.011);
        }
    }

    proptest! {
        #[test]
        fn schedule_invariants(
            magnitude in 0.0f64..7.7,
            rate_bp in 1u32..10_000,
            months in 1u32..481,
        ) {
            let principal = round2(10f64.powf(magnitude));
            let rate = rate_bp as f64 / 100.0;
            let input = LoanInput {
                principal,
                annual_rate_percent: rate,
                tenure_months: months,
            };
            prop_assume!(input.validate().is_ok());
            let schedule = amortization_schedule(principal, rate, months);

            prop_assert_eq!(schedule.installments.len(), months as usize);
            prop_assert_eq!(schedule.installments.last().unwrap().balance, 0.0);

            let principal_sum: f64 =
                schedule.installments.iter().map(|i| i.principal_component).sum();
            prop_assert!((principal_sum - principal).abs() < 0.01);

            let mut previous = principal;
            for installment in &schedule.installments {
                prop_assert!(installment.principal_component > 0.0);
                prop_assert!(installment.balance < previous);
                prop_assert!(installment.interest_component >= 0.0);
                previous = installment.balance;
            }
        }
    }
}
