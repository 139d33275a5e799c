//! Calculators
//!
//! Each calculator pairs an input record with a result record. `compute`
//! is pure and assumes validated input; `evaluate` is the checked entry
//! point used by callers holding untrusted input.

use serde::Serialize;

use crate::amortization::{amortization_schedule, AmortizationSchedule, LoanYear};
use crate::formulas::{
    compound_interest, inflate, required_monthly_sip, round2, sip_future_value,
};
use crate::inputs::{
    CompoundInput, FdInput, GoalInput, LoanInput, LumpsumInput, SipInput, TaxSaverInput,
};
use crate::tax::{tax_saved, TaxSaving, TaxSchedule};
use crate::validation::{Validate, ValidationError};

/// A deterministic financial calculator
pub trait Calculator {
    type Input: Validate;
    type Output;

    /// Compute the result for already-validated input
    fn compute(&self, input: &Self::Input) -> Self::Output;

    /// Validate, then compute
    fn evaluate(&self, input: &Self::Input) -> Result<Self::Output, ValidationError> {
        if let Err(e) = input.validate() {
            tracing::debug!(
                calculator = std::any::type_name::<Self>(),
                errors = e.errors.len(),
                "Rejected calculator input"
            );
            return Err(e);
        }
        Ok(self.compute(input))
    }
}

/// One point on a growth chart
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub label: String,
    /// Cumulative amount put in
    pub invested: f64,
    /// Value at the end of the period
    pub value: f64,
}

/// Result of any growth calculator
///
/// `maturity_amount` is always `principal + interest_earned`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorResult {
    pub principal: f64,
    pub interest_earned: f64,
    pub maturity_amount: f64,
    pub series: Vec<SeriesPoint>,
}

impl CalculatorResult {
    fn from_growth(invested: f64, value: f64, series: Vec<SeriesPoint>) -> Self {
        let principal = round2(invested);
        let interest_earned = round2(value - principal);
        Self {
            principal,
            interest_earned,
            maturity_amount: principal + interest_earned,
            series,
        }
    }
}

fn yearly_series(years: u32, point: impl Fn(u32) -> (f64, f64)) -> Vec<SeriesPoint> {
    (1..=years)
        .map(|year| {
            let (invested, value) = point(year);
            SeriesPoint {
                label: format!("Year {}", year),
                invested: round2(invested),
                value: round2(value),
            }
        })
        .collect()
}

/// General compound interest
#[derive(Debug, Clone, Copy, Default)]
pub struct CompoundInterestCalculator;

impl Calculator for CompoundInterestCalculator {
    type Input = CompoundInput;
    type Output = CalculatorResult;

    fn compute(&self, input: &CompoundInput) -> CalculatorResult {
        let grow = |years: u32| {
            compound_interest(
                input.principal,
                input.annual_rate_percent,
                years as f64,
                input.compoundings_per_year,
            )
        };
        let series = yearly_series(input.years, |y| (input.principal, grow(y)));
        CalculatorResult::from_growth(input.principal, grow(input.years), series)
    }
}

/// Fixed deposit
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedDepositCalculator;

impl Calculator for FixedDepositCalculator {
    type Input = FdInput;
    type Output = CalculatorResult;

    fn compute(&self, input: &FdInput) -> CalculatorResult {
        let per_year = input.compounding.per_year();
        let grow = |years: u32| {
            compound_interest(input.principal, input.annual_rate_percent, years as f64, per_year)
        };
        let series = yearly_series(input.tenure_years, |y| (input.principal, grow(y)));
        CalculatorResult::from_growth(input.principal, grow(input.tenure_years), series)
    }
}

/// Monthly SIP
#[derive(Debug, Clone, Copy, Default)]
pub struct SipCalculator;

impl Calculator for SipCalculator {
    type Input = SipInput;
    type Output = CalculatorResult;

    fn compute(&self, input: &SipInput) -> CalculatorResult {
        let at_year = |years: u32| {
            let months = years * 12;
            (
                input.monthly_investment * months as f64,
                sip_future_value(input.monthly_investment, input.annual_rate_percent, months),
            )
        };
        let series = yearly_series(input.tenure_years, at_year);
        let (invested, value) = at_year(input.tenure_years);
        CalculatorResult::from_growth(invested, value, series)
    }
}

/// One-time investment compounded annually
#[derive(Debug, Clone, Copy, Default)]
pub struct LumpsumCalculator;

impl Calculator for LumpsumCalculator {
    type Input = LumpsumInput;
    type Output = CalculatorResult;

    fn compute(&self, input: &LumpsumInput) -> CalculatorResult {
        let rate = input.annual_rate_percent;
        let grow = |years: u32| compound_interest(input.amount, rate, years as f64, 1);
        let series = yearly_series(input.tenure_years, |y| (input.amount, grow(y)));
        CalculatorResult::from_growth(input.amount, grow(input.tenure_years), series)
    }
}

/// Plan for reaching a savings goal
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalPlan {
    /// Goal cost after inflation at the target date
    pub inflated_target: f64,
    /// What current savings grow to by the target date
    pub savings_future_value: f64,
    /// Gap the SIP has to close
    pub shortfall: f64,
    pub monthly_sip: f64,
    pub total_invested: f64,
    pub series: Vec<SeriesPoint>,
}

/// Goal planner
#[derive(Debug, Clone, Copy, Default)]
pub struct GoalPlanner;

impl Calculator for GoalPlanner {
    type Input = GoalInput;
    type Output = GoalPlan;

    fn compute(&self, input: &GoalInput) -> GoalPlan {
        let rate = input.expected_return_percent;
        let months = input.years * 12;

        let years = input.years as f64;
        let inflated_target = inflate(input.target_amount, input.inflation_percent, years);
        let savings_future_value = compound_interest(input.current_savings, rate, years, 1);
        let shortfall = (inflated_target - savings_future_value).max(0.0);
        let monthly_sip = required_monthly_sip(shortfall, rate, months);

        let series = yearly_series(input.years, |year| {
            let m = year * 12;
            let savings = compound_interest(input.current_savings, rate, year as f64, 1);
            (
                input.current_savings + monthly_sip * m as f64,
                savings + sip_future_value(monthly_sip, rate, m),
            )
        });

        GoalPlan {
            inflated_target: round2(inflated_target),
            savings_future_value: round2(savings_future_value),
            shortfall: round2(shortfall),
            monthly_sip: round2(monthly_sip),
            total_invested: round2(input.current_savings + monthly_sip * months as f64),
            series,
        }
    }
}

/// Loan repayment summary
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanSummary {
    pub emi: f64,
    pub total_interest: f64,
    pub total_payment: f64,
    pub schedule: AmortizationSchedule,
    pub yearly: Vec<LoanYear>,
}

/// EMI and amortization
#[derive(Debug, Clone, Copy, Default)]
pub struct LoanCalculator;

impl Calculator for LoanCalculator {
    type Input = LoanInput;
    type Output = LoanSummary;

    fn compute(&self, input: &LoanInput) -> LoanSummary {
        let schedule =
            amortization_schedule(input.principal, input.annual_rate_percent, input.tenure_months);
        LoanSummary {
            emi: schedule.emi,
            total_interest: schedule.total_interest(),
            total_payment: schedule.total_payment(),
            yearly: schedule.yearly(),
            schedule,
        }
    }
}

/// Tax saved by a deductible investment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSaverResult {
    /// Investment after clamping to the deduction cap
    pub eligible_investment: f64,
    #[serde(flatten)]
    pub saving: TaxSaving,
}

/// Tax saver against a configured schedule
#[derive(Debug, Clone)]
pub struct TaxSaverCalculator {
    pub schedule: TaxSchedule,
    pub deduction_cap: f64,
}

impl TaxSaverCalculator {
    pub fn new(schedule: TaxSchedule, deduction_cap: f64) -> Self {
        Self {
            schedule,
            deduction_cap,
        }
    }
}

impl Default for TaxSaverCalculator {
    fn default() -> Self {
        Self::new(
            TaxSchedule::old_regime(),
            finlit_config::constants::tax::DEDUCTION_80C_CAP,
        )
    }
}

impl Calculator for TaxSaverCalculator {
    type Input = TaxSaverInput;
    type Output = TaxSaverResult;

    fn compute(&self, input: &TaxSaverInput) -> TaxSaverResult {
        let eligible_investment = input.eligible_investment(self.deduction_cap);
        let saving = tax_saved(&self.schedule, input.annual_income, eligible_investment);
        TaxSaverResult {
            eligible_investment,
            saving: TaxSaving {
                tax_without: round2(saving.tax_without),
                tax_with: round2(saving.tax_with),
                saved: round2(saving.saved),
                effective_return_percent: round2(saving.effective_return_percent),
            },
        }
    }
}
