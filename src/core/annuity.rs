use super::guard::{self, InputError};

/// Below this gap a rate is treated as equal to zero (or to the growth rate) and the
/// closed forms switch to their limits.
pub const SINGULARITY_EPS: f64 = 1e-9;

fn compound_factor(rate: f64, periods: f64) -> f64 {
    (1.0 + rate).powf(periods)
}

// End-of-period payments.
pub fn annuity_future_value(rate: f64, periods: u32, payment: f64) -> Result<f64, InputError> {
    let rate = guard::periodic_rate("rate", rate)?;
    let n = guard::periods("periods", periods)? as f64;
    let payment = guard::non_negative("payment", payment)?;

    let value = if rate.abs() < SINGULARITY_EPS {
        payment * n
    } else {
        payment * (compound_factor(rate, n) - 1.0) / rate
    };
    guard::contained("future value", value)
}

pub fn growing_annuity_future_value(
    rate: f64,
    growth: f64,
    periods: u32,
    payment: f64,
) -> Result<f64, InputError> {
    let rate = guard::periodic_rate("rate", rate)?;
    let growth = guard::periodic_rate("growth", growth)?;
    let n = guard::periods("periods", periods)? as f64;
    let payment = guard::non_negative("payment", payment)?;

    let value = if (rate - growth).abs() < SINGULARITY_EPS {
        payment * n * compound_factor(rate, n - 1.0)
    } else {
        payment * (compound_factor(rate, n) - compound_factor(growth, n)) / (rate - growth)
    };
    guard::contained("future value", value)
}

/// At `rate == growth` this falls back to `first_payment * periods`.
pub fn growing_annuity_present_value(
    rate: f64,
    growth: f64,
    periods: u32,
    first_payment: f64,
) -> Result<f64, InputError> {
    let rate = guard::periodic_rate("rate", rate)?;
    let growth = guard::periodic_rate("growth", growth)?;
    let n = guard::periods("periods", periods)? as f64;
    let first_payment = guard::non_negative("first payment", first_payment)?;

    let value = if (rate - growth).abs() < SINGULARITY_EPS {
        first_payment * n
    } else {
        let ratio = (1.0 + growth) / (1.0 + rate);
        first_payment * (1.0 - ratio.powf(n)) / (rate - growth)
    };
    guard::contained("present value", value)
}

pub fn compound(value: f64, rate: f64, periods: f64) -> Result<f64, InputError> {
    let value = guard::finite("value", value)?;
    let rate = guard::periodic_rate("rate", rate)?;
    let periods = guard::non_negative("periods", periods)?;
    Ok(value * compound_factor(rate, periods))
}
