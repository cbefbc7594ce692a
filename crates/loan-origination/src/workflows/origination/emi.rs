//! Reducing-balance amortization used to price loan requests.

use serde::{Deserialize, Serialize};

/// Annual rate (percent) the desk quotes on every request.
pub const ANNUAL_RATE_PCT: f64 = 10.5;

/// Longest repayment schedule the desk will lay out month by month (100 years).
pub const MAX_SCHEDULE_MONTHS: u32 = 1_200;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmiError {
    #[error("annual rate must be a finite, non-negative percentage (found {0})")]
    InvalidRate(f64),
    #[error("installment for {principal} over {tenure_months} months at {annual_rate_pct}% is out of range")]
    OutOfRange {
        principal: u64,
        tenure_months: u32,
        annual_rate_pct: f64,
    },
    #[error("schedules are limited to {max} months (requested {requested})")]
    ScheduleTooLong { requested: u32, max: u32 },
}

/// Monthly installment rounded to the nearest currency unit.
///
/// A zero principal or tenure is "not yet computable" and yields 0 rather than an error. Results
/// beyond `u64` saturate; `quote` reports them as `EmiError::OutOfRange` instead.
pub fn monthly_installment(principal: u64, tenure_months: u32, annual_rate_pct: f64) -> u64 {
    if principal == 0 || tenure_months == 0 {
        return 0;
    }
    exact_installment(principal, tenure_months, annual_rate_pct).round() as u64
}

/// Unrounded installment for a non-zero principal and tenure.
///
/// `p·m·g / (g − 1)` is evaluated as `p·m + p·m / (g − 1)` with `g − 1` taken through
/// `ln_1p`/`exp_m1`, so tiny rates keep their precision and very long tenures settle on the
/// interest-only limit `p·m` once `g` overflows.
fn exact_installment(principal: u64, tenure_months: u32, annual_rate_pct: f64) -> f64 {
    let principal = principal as f64;
    let months = f64::from(tenure_months);
    let even_split = principal / months;

    let monthly_rate = annual_rate_pct / 12.0 / 100.0;
    if !monthly_rate.is_finite() || monthly_rate <= 0.0 {
        return even_split;
    }

    let growth_minus_one = (months * monthly_rate.ln_1p()).exp_m1();
    if growth_minus_one.is_nan() || growth_minus_one <= 0.0 {
        return even_split;
    }

    let interest = principal * monthly_rate;
    interest + interest / growth_minus_one
}

/// Priced view of a request: installment plus what it costs over the tenure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmiQuote {
    pub principal: u64,
    pub tenure_months: u32,
    pub annual_rate_pct: f64,
    pub emi: u64,
    pub total_payable: u64,
    pub total_interest: u64,
}

impl EmiQuote {
    pub(crate) fn from_installment(
        principal: u64,
        tenure_months: u32,
        annual_rate_pct: f64,
        emi: u64,
    ) -> Self {
        let total_payable = emi.saturating_mul(tenure_months as u64);
        Self {
            principal,
            tenure_months,
            annual_rate_pct,
            emi,
            total_payable,
            total_interest: total_payable.saturating_sub(principal),
        }
    }
}

pub fn quote(
    principal: u64,
    tenure_months: u32,
    annual_rate_pct: f64,
) -> Result<EmiQuote, EmiError> {
    if !annual_rate_pct.is_finite() || annual_rate_pct < 0.0 {
        return Err(EmiError::InvalidRate(annual_rate_pct));
    }

    let emi = if principal == 0 || tenure_months == 0 {
        0
    } else {
        let exact = exact_installment(principal, tenure_months, annual_rate_pct).round();
        if !exact.is_finite() || exact >= u64::MAX as f64 {
            return Err(EmiError::OutOfRange {
                principal,
                tenure_months,
                annual_rate_pct,
            });
        }
        exact as u64
    };
    Ok(EmiQuote::from_installment(
        principal,
        tenure_months,
        annual_rate_pct,
        emi,
    ))
}

/// One row of the repayment schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub month: u32,
    pub opening_balance: f64,
    pub interest: f64,
    pub principal: f64,
    pub payment: f64,
    pub closing_balance: f64,
}

/// Month-by-month breakdown of the installment. The last row absorbs rounding drift so the
/// loan closes at exactly zero.
pub fn schedule(
    principal: u64,
    tenure_months: u32,
    annual_rate_pct: f64,
) -> Result<Vec<Installment>, EmiError> {
    if tenure_months > MAX_SCHEDULE_MONTHS {
        return Err(EmiError::ScheduleTooLong {
            requested: tenure_months,
            max: MAX_SCHEDULE_MONTHS,
        });
    }
    let quote = quote(principal, tenure_months, annual_rate_pct)?;
    if quote.emi == 0 {
        return Ok(Vec::new());
    }

    let monthly_rate = annual_rate_pct / 12.0 / 100.0;
    let payment = quote.emi as f64;
    let mut balance = principal as f64;
    let mut rows = Vec::with_capacity(tenure_months as usize);

    for month in 1..=tenure_months {
        let interest = round_cents(balance * monthly_rate);
        let is_last = month == tenure_months;
        let principal_part = if is_last {
            balance
        } else {
            round_cents((payment - interest).min(balance))
        };
        let closing = if is_last {
            0.0
        } else {
            round_cents(balance - principal_part)
        };

        rows.push(Installment {
            month,
            opening_balance: balance,
            interest,
            principal: principal_part,
            payment: round_cents(principal_part + interest),
            closing_balance: closing,
        });
        balance = closing;
    }

    Ok(rows)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
