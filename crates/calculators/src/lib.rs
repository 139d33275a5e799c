//! Financial calculation engine
//!
//! Pure, deterministic transforms from a validated input record to a
//! result record. No I/O, no shared state.
//!
//! Every calculator follows the same shape:
//! - an input struct implementing [`Validate`], deserialized from a form
//! - a [`Calculator`] whose `compute` assumes valid input and is total
//!   over that domain
//! - [`Calculator::evaluate`], the boundary that rejects invalid input
//!   before `compute` ever runs
//!
//! # Example
//!
//! ```
//! use finlit_calculators::{Calculator, Compounding, FdInput, FixedDepositCalculator};
//!
//! let input = FdInput {
//!     principal: 100_000.0,
//!     annual_rate_percent: 6.8,
//!     tenure_years: 5,
//!     compounding: Compounding::Quarterly,
//! };
//! let result = FixedDepositCalculator.evaluate(&input).unwrap();
//! assert!((result.maturity_amount - 140_093.85).abs() < 0.01);
//! ```

pub mod amortization;
pub mod engine;
pub mod formulas;
pub mod inputs;
pub mod presentation;
pub mod request;
pub mod tax;
pub mod validation;

pub use amortization::{amortization_schedule, AmortizationSchedule, Installment, LoanYear};
pub use engine::{
    Calculator, CalculatorResult, CompoundInterestCalculator, FixedDepositCalculator, GoalPlan,
    GoalPlanner, LoanCalculator, LoanSummary, LumpsumCalculator, SeriesPoint, SipCalculator,
    TaxSaverCalculator, TaxSaverResult,
};
pub use formulas::{compound_interest, emi, inflate, required_monthly_sip, round2, sip_future_value};
pub use inputs::{
    CompoundInput, Compounding, FdInput, GoalInput, LoanInput, LumpsumInput, SipInput,
    TaxSaverInput,
};
pub use presentation::{display_fields, format_compact, format_inr, ChartData};
pub use request::{CalculatorEngine, CalculatorKind, CalculatorOutput, CalculatorRequest};
pub use tax::{tax_owed, tax_saved, SlabContribution, TaxSaving, TaxSchedule, TaxSlab};
pub use validation::{FieldError, Validate, ValidationError};
