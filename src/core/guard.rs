use thiserror::Error;

/// Scenario calculators report these through [`super::Outcome::Invalid`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("{field} must be > 0, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must be >= 0, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },

    #[error("{field} must be greater than -100% per period, got {value}")]
    RateAtOrBelowTotalLoss { field: &'static str, value: f64 },

    #[error("{field} must be at least one period")]
    ZeroPeriods { field: &'static str },

    #[error("{field} of {years} years does not fit in a count of monthly periods")]
    TooManyPeriods { field: &'static str, years: u32 },

    #[error("current age must be above {floor}, got {age}")]
    BelowPlanningAge { age: u32, floor: u32 },

    #[error("{later} ({later_age}) must be after {earlier} ({earlier_age})")]
    AgeOrdering {
        earlier: &'static str,
        earlier_age: u32,
        later: &'static str,
        later_age: u32,
    },

    #[error("diverted amount {diverted} leaves no payment against an EMI of {emi}")]
    DiversionExceedsEmi { emi: f64, diverted: f64 },

    #[error("at least 2 cash flows are required, got {0}")]
    InsufficientCashFlows(usize),

    #[error("cash flows need at least one inflow and one outflow")]
    NoSignChange,
}

pub fn finite(field: &'static str, value: f64) -> Result<f64, InputError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InputError::NonFinite { field })
    }
}

pub fn positive(field: &'static str, value: f64) -> Result<f64, InputError> {
    let value = finite(field, value)?;
    if value <= 0.0 {
        return Err(InputError::NonPositive { field, value });
    }
    Ok(value)
}

pub fn non_negative(field: &'static str, value: f64) -> Result<f64, InputError> {
    let value = finite(field, value)?;
    if value < 0.0 {
        return Err(InputError::Negative { field, value });
    }
    Ok(value)
}

/// Per-period decimal rate. Anything at or below -1 would discount against total loss.
pub fn periodic_rate(field: &'static str, value: f64) -> Result<f64, InputError> {
    let value = finite(field, value)?;
    if value <= -1.0 {
        return Err(InputError::RateAtOrBelowTotalLoss { field, value });
    }
    Ok(value)
}

pub fn periods(field: &'static str, n: u32) -> Result<u32, InputError> {
    if n == 0 {
        return Err(InputError::ZeroPeriods { field });
    }
    Ok(n)
}

pub fn monthly_periods(field: &'static str, years: u32) -> Result<u32, InputError> {
    years
        .checked_mul(12)
        .ok_or(InputError::TooManyPeriods { field, years })
}

pub fn contained(field: &'static str, value: f64) -> Result<f64, InputError> {
    finite(field, value)
}

pub fn floored_at_zero(value: f64) -> f64 {
    value.max(0.0)
}
