//! Tagged calculator requests
//!
//! The HTTP boundary receives a single JSON shape for every calculator,
//! discriminated by `kind`:
//!
//! ```json
//! {"kind": "fd", "principal": 100000, "annualRatePercent": 6.8, "tenureYears": 5}
//! ```

use finlit_config::TaxSettings;
use serde::{Deserialize, Serialize};

use crate::engine::{
    Calculator, CalculatorResult, CompoundInterestCalculator, FixedDepositCalculator, GoalPlan,
    GoalPlanner, LoanCalculator, LoanSummary, LumpsumCalculator, SipCalculator,
    TaxSaverCalculator, TaxSaverResult,
};
use crate::inputs::{
    CompoundInput, FdInput, GoalInput, LoanInput, LumpsumInput, SipInput, TaxSaverInput,
};
use crate::tax::TaxSchedule;
use crate::validation::ValidationError;

/// Which calculator a request or output belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculatorKind {
    Compound,
    Fd,
    Sip,
    Lumpsum,
    Goal,
    Emi,
    TaxSaver,
}

impl CalculatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalculatorKind::Compound => "compound",
            CalculatorKind::Fd => "fd",
            CalculatorKind::Sip => "sip",
            CalculatorKind::Lumpsum => "lumpsum",
            CalculatorKind::Goal => "goal",
            CalculatorKind::Emi => "emi",
            CalculatorKind::TaxSaver => "tax_saver",
        }
    }
}

impl std::fmt::Display for CalculatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for any calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalculatorRequest {
    Compound(CompoundInput),
    Fd(FdInput),
    Sip(SipInput),
    Lumpsum(LumpsumInput),
    Goal(GoalInput),
    Emi(LoanInput),
    TaxSaver(TaxSaverInput),
}

impl CalculatorRequest {
    pub fn kind(&self) -> CalculatorKind {
        match self {
            CalculatorRequest::Compound(_) => CalculatorKind::Compound,
            CalculatorRequest::Fd(_) => CalculatorKind::Fd,
            CalculatorRequest::Sip(_) => CalculatorKind::Sip,
            CalculatorRequest::Lumpsum(_) => CalculatorKind::Lumpsum,
            CalculatorRequest::Goal(_) => CalculatorKind::Goal,
            CalculatorRequest::Emi(_) => CalculatorKind::Emi,
            CalculatorRequest::TaxSaver(_) => CalculatorKind::TaxSaver,
        }
    }
}

/// Output of any calculator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalculatorOutput {
    Compound(CalculatorResult),
    Fd(CalculatorResult),
    Sip(CalculatorResult),
    Lumpsum(CalculatorResult),
    Goal(GoalPlan),
    Emi(LoanSummary),
    TaxSaver(TaxSaverResult),
}

impl CalculatorOutput {
    pub fn kind(&self) -> CalculatorKind {
        match self {
            CalculatorOutput::Compound(_) => CalculatorKind::Compound,
            CalculatorOutput::Fd(_) => CalculatorKind::Fd,
            CalculatorOutput::Sip(_) => CalculatorKind::Sip,
            CalculatorOutput::Lumpsum(_) => CalculatorKind::Lumpsum,
            CalculatorOutput::Goal(_) => CalculatorKind::Goal,
            CalculatorOutput::Emi(_) => CalculatorKind::Emi,
            CalculatorOutput::TaxSaver(_) => CalculatorKind::TaxSaver,
        }
    }

    /// Growth result, for the calculators that produce one
    pub fn growth(&self) -> Option<&CalculatorResult> {
        match self {
            CalculatorOutput::Compound(r)
            | CalculatorOutput::Fd(r)
            | CalculatorOutput::Sip(r)
            | CalculatorOutput::Lumpsum(r) => Some(r),
            _ => None,
        }
    }
}

/// Dispatches requests to calculators
///
/// Holds the only configurable calculator state, the tax schedule.
#[derive(Debug, Clone, Default)]
pub struct CalculatorEngine {
    tax_saver: TaxSaverCalculator,
}

impl CalculatorEngine {
    pub fn from_settings(settings: &TaxSettings) -> Self {
        Self {
            tax_saver: TaxSaverCalculator::new(
                TaxSchedule::from_settings(settings),
                settings.deduction_cap,
            ),
        }
    }

    pub fn tax_schedule(&self) -> &TaxSchedule {
        &self.tax_saver.schedule
    }

    /// Validate the request and run its calculator
    pub fn evaluate(
        &self,
        request: &CalculatorRequest,
    ) -> Result<CalculatorOutput, ValidationError> {
        tracing::debug!(kind = %request.kind(), "Evaluating calculator request");

        let output = match request {
            CalculatorRequest::Compound(input) => {
                CalculatorOutput::Compound(CompoundInterestCalculator.evaluate(input)?)
            },
            CalculatorRequest::Fd(input) => {
                CalculatorOutput::Fd(FixedDepositCalculator.evaluate(input)?)
            },
            CalculatorRequest::Sip(input) => CalculatorOutput::Sip(SipCalculator.evaluate(input)?),
            CalculatorRequest::Lumpsum(input) => {
                CalculatorOutput::Lumpsum(LumpsumCalculator.evaluate(input)?)
            },
            CalculatorRequest::Goal(input) => CalculatorOutput::Goal(GoalPlanner.evaluate(input)?),
            CalculatorRequest::Emi(input) => CalculatorOutput::Emi(LoanCalculator.evaluate(input)?),
            CalculatorRequest::TaxSaver(input) => {
                CalculatorOutput::TaxSaver(self.tax_saver.evaluate(input)?)
            },
        };

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fd_request_from_json() {
        let request: CalculatorRequest = serde_json::from_str(
            r#"{"kind": "fd", "principal": 100000, "annualRatePercent": 6.8, "tenureYears": 5}"#,
        )
        .unwrap();
        assert_eq!(request.kind(), CalculatorKind::Fd);

        let output = CalculatorEngine::default().evaluate(&request).unwrap();
        assert_eq!(output.kind(), CalculatorKind::Fd);
        let growth = output.growth().unwrap();
        assert!((growth.maturity_amount - 140_093.85).abs() < 0.005);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let result: Result<CalculatorRequest, _> =
            serde_json::from_str(r#"{"kind": "crypto", "amount": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_errors_surface() {
        let request = CalculatorRequest::Emi(LoanInput {
            principal: 0.0,
            annual_rate_percent: 0.0,
            tenure_months: 0,
        });
        let err = CalculatorEngine::default().evaluate(&request).unwrap_err();
        assert_eq!(err.errors.len(), 3);
    }

    #[test]
    fn test_tax_saver_uses_configured_schedule() {
        let settings = TaxSettings {
            regime: finlit_config::TaxRegime::New,
            cess_percent: 0.0,
            ..TaxSettings::default()
        };
        let engine = CalculatorEngine::from_settings(&settings);
        assert_eq!(engine.tax_schedule().slabs().len(), 6);

        let request = CalculatorRequest::TaxSaver(TaxSaverInput {
            annual_income: 800_000.0,
            investment: 100_000.0,
        });
        let output = engine.evaluate(&request).unwrap();
        match output {
            CalculatorOutput::TaxSaver(result) => {
                // The whole deduction falls in the 10% slab (7L to 8L)
                assert_eq!(result.saving.saved, 10_000.0);
            },
            other => panic!("unexpected output {:?}", other.kind()),
        }
    }

    #[test]
    fn test_output_serializes_with_kind() {
        let output = CalculatorEngine::default()
            .evaluate(&CalculatorRequest::Lumpsum(LumpsumInput {
                amount: 10_000.0,
                annual_rate_percent: 10.0,
                tenure_years: 2,
            }))
            .unwrap();
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["kind"], "lumpsum");
        assert_eq!(json["maturityAmount"], 12_100.0);
    }
}
