//! Calculator input records
//!
//! Field names follow the JSON bodies sent by the web forms (camelCase).

use finlit_config::constants::limits;
use serde::{Deserialize, Serialize};

use crate::formulas::emi;
use crate::validation::{Checker, Validate, ValidationError};

/// General compound interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompoundInput {
    pub principal: f64,
    pub annual_rate_percent: f64,
    pub years: u32,
    pub compoundings_per_year: u32,
}

impl Validate for CompoundInput {
    fn validate(&self) -> Result<(), ValidationError> {
        Checker::new()
            .positive_amount("principal", self.principal)
            .rate("annualRatePercent", self.annual_rate_percent)
            .whole_range("years", self.years, 1, limits::MAX_TENURE_YEARS)
            .whole_range("compoundingsPerYear", self.compoundings_per_year, 1, 365)
            .finish()
    }
}

/// Compounding frequency offered for deposits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compounding {
    Monthly,
    #[default]
    Quarterly,
    HalfYearly,
    Yearly,
}

impl Compounding {
    pub fn per_year(&self) -> u32 {
        match self {
            Compounding::Monthly => 12,
            Compounding::Quarterly => limits::FD_COMPOUNDINGS_PER_YEAR,
            Compounding::HalfYearly => 2,
            Compounding::Yearly => 1,
        }
    }
}

/// Fixed deposit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FdInput {
    pub principal: f64,
    pub annual_rate_percent: f64,
    pub tenure_years: u32,
    #[serde(default)]
    pub compounding: Compounding,
}

impl Validate for FdInput {
    fn validate(&self) -> Result<(), ValidationError> {
        Checker::new()
            .positive_amount("principal", self.principal)
            .rate("annualRatePercent", self.annual_rate_percent)
            .whole_range("tenureYears", self.tenure_years, 1, limits::MAX_TENURE_YEARS)
            .finish()
    }
}

/// Monthly systematic investment plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SipInput {
    pub monthly_investment: f64,
    pub annual_rate_percent: f64,
    pub tenure_years: u32,
}

impl Validate for SipInput {
    fn validate(&self) -> Result<(), ValidationError> {
        Checker::new()
            .positive_amount("monthlyInvestment", self.monthly_investment)
            .rate("annualRatePercent", self.annual_rate_percent)
            .whole_range("tenureYears", self.tenure_years, 1, limits::MAX_TENURE_YEARS)
            .finish()
    }
}

/// One-time investment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LumpsumInput {
    pub amount: f64,
    pub annual_rate_percent: f64,
    pub tenure_years: u32,
}

impl Validate for LumpsumInput {
    fn validate(&self) -> Result<(), ValidationError> {
        Checker::new()
            .positive_amount("amount", self.amount)
            .rate("annualRatePercent", self.annual_rate_percent)
            .whole_range("tenureYears", self.tenure_years, 1, limits::MAX_TENURE_YEARS)
            .finish()
    }
}

/// Savings goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalInput {
    /// Goal cost in today's money
    pub target_amount: f64,
    pub years: u32,
    pub expected_return_percent: f64,
    #[serde(default)]
    pub inflation_percent: f64,
    /// Already set aside, grows at the expected return
    #[serde(default)]
    pub current_savings: f64,
}

impl Validate for GoalInput {
    fn validate(&self) -> Result<(), ValidationError> {
        Checker::new()
            .positive_amount("targetAmount", self.target_amount)
            .whole_range("years", self.years, 1, limits::MAX_TENURE_YEARS)
            .rate("expectedReturnPercent", self.expected_return_percent)
            .rate_allow_zero("inflationPercent", self.inflation_percent)
            .non_negative_amount("currentSavings", self.current_savings)
            .finish()
    }
}

/// Amortizing loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanInput {
    pub principal: f64,
    pub annual_rate_percent: f64,
    pub tenure_months: u32,
}

impl LoanInput {
    /// Principal repaid by the first EMI, before rounding.
    ///
    /// Later months repay more, so this is the smallest step the balance
    /// takes.
    pub fn first_principal_step(&self) -> f64 {
        let interest = self.principal * self.annual_rate_percent / 100.0 / 12.0;
        emi(self.principal, self.annual_rate_percent, self.tenure_months) - interest
    }
}

impl Validate for LoanInput {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut checker = Checker::new();
        checker
            .positive_amount("principal", self.principal)
            .rate("annualRatePercent", self.annual_rate_percent)
            .whole_range("tenureMonths", self.tenure_months, 1, limits::MAX_LOAN_MONTHS);

        if checker.is_clean() && self.first_principal_step() < limits::MIN_MONTHLY_PRINCIPAL {
            checker.reject(
                "principal",
                "too small to repay in paise every month at this rate and tenure".into(),
            );
        }
        checker.finish()
    }
}

/// Deductible investment against taxable income
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSaverInput {
    pub annual_income: f64,
    pub investment: f64,
}

impl TaxSaverInput {
    /// Investment counted towards the deduction
    pub fn eligible_investment(&self, deduction_cap: f64) -> f64 {
        self.investment.min(deduction_cap)
    }

    /// Copy with the investment clamped to `deduction_cap`
    pub fn validated(&self, deduction_cap: f64) -> Result<Self, ValidationError> {
        self.validate()?;
        Ok(Self {
            annual_income: self.annual_income,
            investment: self.eligible_investment(deduction_cap),
        })
    }
}

impl Validate for TaxSaverInput {
    fn validate(&self) -> Result<(), ValidationError> {
        Checker::new()
            .non_negative_amount("annualIncome", self.annual_income)
            .non_negative_amount("investment", self.investment)
            .finish()
    }
}
