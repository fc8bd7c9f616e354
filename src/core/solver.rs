use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::guard::{self, InputError};
use super::types::{CashFlowEvent, SolverOutcome};

pub const DEFAULT_GUESS: f64 = 0.10;
pub const MAX_ITERATIONS: u32 = 100;
pub const STEP_TOLERANCE: f64 = 1e-7;
const DERIVATIVE_STEP: f64 = 1e-6;
const DAYS_PER_YEAR: f64 = 365.0;

/// Annualized rate `r` solving `sum(cf / (1 + r)^(days / 365)) = 0`, with days counted
/// from the earliest event.
///
/// Newton-Raphson on a symmetric-difference slope. When the iteration budget runs out,
/// or the slope vanishes, the last iterate comes back with `converged: false`.
pub fn compute_xirr(
    cashflows: &[CashFlowEvent],
    guess: Option<f64>,
) -> Result<SolverOutcome, InputError> {
    let Some(origin) = cashflows.iter().map(|event| event.date).min() else {
        return Err(InputError::InsufficientCashFlows(0));
    };
    if cashflows.len() < 2 {
        return Err(InputError::InsufficientCashFlows(cashflows.len()));
    }

    let mut flows = Vec::with_capacity(cashflows.len());
    for event in cashflows {
        let amount = guard::finite("cash flow amount", event.amount)?;
        let years = (event.date - origin).num_days() as f64 / DAYS_PER_YEAR;
        flows.push((years, amount));
    }
    let has_inflow = flows.iter().any(|&(_, amount)| amount > 0.0);
    let has_outflow = flows.iter().any(|&(_, amount)| amount < 0.0);
    if !has_inflow || !has_outflow {
        return Err(InputError::NoSignChange);
    }

    let mut rate = guard::periodic_rate("guess", guess.unwrap_or(DEFAULT_GUESS))?;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < MAX_ITERATIONS {
        let value = net_present_value(&flows, rate);
        let slope = (net_present_value(&flows, rate + DERIVATIVE_STEP)
            - net_present_value(&flows, rate - DERIVATIVE_STEP))
            / (2.0 * DERIVATIVE_STEP);
        if !value.is_finite() || !slope.is_finite() || slope == 0.0 {
            break;
        }

        let next = rate - value / slope;
        iterations += 1;
        let step = (next - rate).abs();
        rate = next;
        if !rate.is_finite() {
            break;
        }
        if step < STEP_TOLERANCE {
            converged = true;
            break;
        }
    }

    if !converged {
        tracing::debug!(iterations, rate, "xirr did not converge");
    }

    Ok(SolverOutcome {
        value: if rate.is_finite() { rate } else { 0.0 },
        converged: converged && rate.is_finite(),
        iterations,
    })
}

fn net_present_value(flows: &[(f64, f64)], rate: f64) -> f64 {
    flows
        .iter()
        .map(|&(years, amount)| amount / (1.0 + rate).powf(years))
        .sum()
}

/// One row of a systematic-withdrawal report from the fund-data service.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SwpReportRow {
    pub current_date: NaiveDate,
    pub cash_flow: f64,
    pub current_value: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalInterval {
    Weekly,
    Fortnightly,
    Monthly,
    Quarterly,
}

impl WithdrawalInterval {
    pub fn days(self) -> u32 {
        match self {
            WithdrawalInterval::Weekly => 7,
            WithdrawalInterval::Fortnightly => 14,
            WithdrawalInterval::Monthly => 30,
            WithdrawalInterval::Quarterly => 90,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwpSchedule {
    pub installments: f64,
    pub total_withdrawn: f64,
}

/// Installments are the elapsed days over the interval length, not rounded.
pub fn swp_schedule(
    start: NaiveDate,
    end: NaiveDate,
    interval: WithdrawalInterval,
    withdrawal_amount: f64,
) -> Result<SwpSchedule, InputError> {
    let withdrawal_amount = guard::non_negative("withdrawal amount", withdrawal_amount)?;
    let days = (end - start).num_days().abs() as f64;
    let installments = days / interval.days() as f64;
    Ok(SwpSchedule {
        installments,
        total_withdrawn: installments * withdrawal_amount,
    })
}

/// Initial investment as an outflow, every reported withdrawal, then the value left in
/// the scheme on the last report date as a final inflow.
pub fn swp_cash_flows(
    invest_date: NaiveDate,
    invested_amount: f64,
    report: &[SwpReportRow],
) -> Result<Vec<CashFlowEvent>, InputError> {
    let invested_amount = guard::positive("invested amount", invested_amount)?;
    let mut flows = Vec::with_capacity(report.len() + 2);
    flows.push(CashFlowEvent::new(invest_date, -invested_amount));
    for row in report {
        flows.push(CashFlowEvent::new(row.current_date, row.cash_flow));
    }
    if let Some(last) = report.last() {
        flows.push(CashFlowEvent::new(last.current_date, last.current_value));
    }
    Ok(flows)
}

pub fn swp_return_percent(
    invest_date: NaiveDate,
    invested_amount: f64,
    report: &[SwpReportRow],
    guess: Option<f64>,
) -> Result<SolverOutcome, InputError> {
    let flows = swp_cash_flows(invest_date, invested_amount, report)?;
    let outcome = compute_xirr(&flows, guess)?;
    Ok(SolverOutcome {
        value: outcome.value * 100.0,
        ..outcome
    })
}
