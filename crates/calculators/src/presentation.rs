//! Result presentation
//!
//! Formatting helpers for rupee amounts and chart-ready series.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::SeriesPoint;
use crate::request::CalculatorOutput;

const RUPEE: &str = "₹";

/// Group integer digits the Indian way: last three, then pairs
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// Format an amount as rupees with Indian grouping and two decimals
///
/// `1_39_49_783.25` renders as `₹1,39,49,783.25`. Amounts that round to
/// zero never carry a sign.
pub fn format_inr(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("{}0.00", RUPEE);
    }

    let paise = (amount.abs() * 100.0).round() as u64;
    let rupees = paise / 100;
    let fraction = paise % 100;
    let sign = if amount < 0.0 && paise > 0 { "-" } else { "" };

    format!(
        "{}{}{}.{:02}",
        sign,
        RUPEE,
        group_indian(&rupees.to_string()),
        fraction
    )
}

/// Short form for headline figures: crore, lakh, thousand
pub fn format_compact(amount: f64) -> String {
    let abs = amount.abs();
    let sign = if amount < 0.0 { "-" } else { "" };

    if abs >= 10_000_000.0 {
        format!("{}{}{:.2} Cr", sign, RUPEE, abs / 10_000_000.0)
    } else if abs >= 100_000.0 {
        format!("{}{}{:.2} L", sign, RUPEE, abs / 100_000.0)
    } else if abs >= 1_000.0 {
        format!("{}{}{:.1} K", sign, RUPEE, abs / 1_000.0)
    } else {
        format_inr(amount)
    }
}

/// Parallel vectors for a stacked invested/returns chart
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub invested: Vec<f64>,
    pub returns: Vec<f64>,
}

impl ChartData {
    /// Rounded to whole rupees
    pub fn from_series(series: &[SeriesPoint]) -> Self {
        let mut chart = Self::default();
        for point in series {
            chart.labels.push(point.label.clone());
            chart.invested.push(point.invested.round());
            chart.returns.push((point.value - point.invested).round());
        }
        chart
    }
}

/// Human-readable headline figures for an output, keyed by field name
pub fn display_fields(output: &CalculatorOutput) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    let mut put = |key: &str, value: String| {
        fields.insert(key.to_string(), value);
    };

    match output {
        CalculatorOutput::Compound(r)
        | CalculatorOutput::Fd(r)
        | CalculatorOutput::Sip(r)
        | CalculatorOutput::Lumpsum(r) => {
            put("principal", format_inr(r.principal));
            put("interestEarned", format_inr(r.interest_earned));
            put("maturityAmount", format_inr(r.maturity_amount));
        },
        CalculatorOutput::Goal(plan) => {
            put("inflatedTarget", format_inr(plan.inflated_target));
            put("shortfall", format_inr(plan.shortfall));
            put("monthlySip", format_inr(plan.monthly_sip));
            put("totalInvested", format_inr(plan.total_invested));
        },
        CalculatorOutput::Emi(loan) => {
            put("emi", format_inr(loan.emi));
            put("totalInterest", format_inr(loan.total_interest));
            put("totalPayment", format_inr(loan.total_payment));
        },
        CalculatorOutput::TaxSaver(tax) => {
            put("eligibleInvestment", format_inr(tax.eligible_investment));
            put("taxWithout", format_inr(tax.saving.tax_without));
            put("taxWith", format_inr(tax.saving.tax_with));
            put("saved", format_inr(tax.saving.saved));
            put(
                "effectiveReturn",
                format!("{:.2}%", tax.saving.effective_return_percent),
            );
        },
    }

    fields
}
