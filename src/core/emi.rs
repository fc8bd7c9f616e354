use serde::Serialize;

use super::annuity::{SINGULARITY_EPS, annuity_future_value};
use super::guard::{self, InputError};
use super::types::{Outcome, RateSpec};

pub fn compute_emi(principal: f64, rate: f64, periods: u32) -> Result<f64, InputError> {
    let principal = guard::positive("principal", principal)?;
    let rate = guard::periodic_rate("rate", rate)?;
    let n = guard::periods("periods", periods)? as f64;

    if rate.abs() < SINGULARITY_EPS {
        return Ok(principal / n);
    }
    let factor = (1.0 + rate).powf(n);
    guard::contained("emi", principal * rate * factor / (factor - 1.0))
}

/// Balance left after `periods` payments of `payment`. Negative means overpaid.
fn remaining_balance(principal: f64, rate: f64, periods: u32, payment: f64) -> f64 {
    let n = periods as f64;
    if rate.abs() < SINGULARITY_EPS {
        return principal - payment * n;
    }
    let factor = (1.0 + rate).powf(n);
    principal * factor - payment * (factor - 1.0) / rate
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanSummary {
    pub emi: f64,
    pub total_paid: f64,
    pub total_interest: f64,
}

pub fn loan_summary(principal: f64, rate: f64, periods: u32) -> Outcome<LoanSummary> {
    compute_emi(principal, rate, periods)
        .map(|emi| {
            let total_paid = emi * periods as f64;
            LoanSummary {
                emi,
                total_paid,
                total_interest: total_paid - principal,
            }
        })
        .into()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationRow {
    pub period: u32,
    pub opening_balance: f64,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub closing_balance: f64,
}

pub fn amortization_schedule(
    principal: f64,
    rate: f64,
    periods: u32,
    payment: f64,
) -> Result<Vec<AmortizationRow>, InputError> {
    let principal = guard::positive("principal", principal)?;
    let rate = guard::periodic_rate("rate", rate)?;
    let periods = guard::periods("periods", periods)?;
    let payment = guard::non_negative("payment", payment)?;

    let mut rows = Vec::with_capacity(periods as usize);
    let mut balance = principal;
    for period in 1..=periods {
        let interest = balance * rate;
        let closing_balance = balance + interest - payment;
        rows.push(AmortizationRow {
            period,
            opening_balance: balance,
            payment,
            interest,
            principal: payment - interest,
            closing_balance,
        });
        balance = closing_balance;
    }
    Ok(rows)
}

/// Paying `emi - diverted` against the loan while `diverted` goes into a monthly
/// investment for the same tenure.
///
/// The floored fields are for display only; `net_cost` is computed from the raw
/// balance and investment value. Neither side is discounted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiversionScenario {
    pub emi: f64,
    pub reduced_payment: f64,
    pub diverted: f64,
    pub periods: u32,
    pub total_paid_to_loan: f64,
    pub principal_paid: f64,
    pub interest_paid: f64,
    pub remaining_balance: f64,
    pub investment_value: f64,
    pub total_invested: f64,
    pub amount_left: f64,
    pub total_outlay: f64,
    pub net_cost: f64,
}

pub fn amortize_with_diversion(
    principal: f64,
    rate: f64,
    periods: u32,
    diverted_amount: f64,
    invest_rate: f64,
) -> Outcome<DiversionScenario> {
    diversion_scenario(principal, rate, periods, diverted_amount, invest_rate).into()
}

fn diversion_scenario(
    principal: f64,
    rate: f64,
    periods: u32,
    diverted_amount: f64,
    invest_rate: f64,
) -> Result<DiversionScenario, InputError> {
    let emi = compute_emi(principal, rate, periods)?;
    let diverted = guard::non_negative("diverted amount", diverted_amount)?;
    let reduced_payment = emi - diverted;
    if reduced_payment <= 0.0 {
        return Err(InputError::DiversionExceedsEmi { emi, diverted });
    }

    let n = periods as f64;
    let remaining = guard::contained(
        "remaining balance",
        remaining_balance(principal, rate, periods, reduced_payment),
    )?;
    let investment_value = guard::contained(
        "investment value",
        annuity_future_value(invest_rate, periods, diverted)?,
    )?;

    let total_paid_to_loan = reduced_payment * n;
    let principal_paid = principal - remaining;
    let total_invested = diverted * n;
    let amount_left = investment_value - remaining;
    let total_outlay = total_paid_to_loan + total_invested;

    Ok(DiversionScenario {
        emi,
        reduced_payment,
        diverted,
        periods,
        total_paid_to_loan,
        principal_paid,
        interest_paid: total_paid_to_loan - principal_paid,
        remaining_balance: guard::floored_at_zero(remaining),
        investment_value: guard::floored_at_zero(investment_value),
        total_invested,
        amount_left: guard::floored_at_zero(amount_left),
        total_outlay,
        net_cost: total_outlay - amount_left,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmiVsSipInputs {
    pub principal: f64,
    pub loan_rate: RateSpec,
    pub years: u32,
    pub diverted_monthly: f64,
    pub invest_rate: RateSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyComparison {
    pub year: u32,
    pub emi_paid: f64,
    pub diverted_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmiVsSip {
    pub baseline: LoanSummary,
    pub baseline_net_cost: f64,
    pub diversion: Outcome<DiversionScenario>,
    pub yearly: Vec<YearlyComparison>,
}

pub fn compare_emi_vs_sip(inputs: &EmiVsSipInputs) -> Outcome<EmiVsSip> {
    let months = match guard::monthly_periods("years", inputs.years) {
        Ok(months) => months,
        Err(reason) => return Outcome::Invalid(reason),
    };
    let loan_rate = inputs.loan_rate.per_month();
    let invest_rate = inputs.invest_rate.per_month();

    let baseline = match loan_summary(inputs.principal, loan_rate, months) {
        Outcome::Computed(summary) => summary,
        Outcome::Invalid(reason) => return Outcome::Invalid(reason),
    };
    let diversion = amortize_with_diversion(
        inputs.principal,
        loan_rate,
        months,
        inputs.diverted_monthly,
        invest_rate,
    );

    let yearly = (0..=inputs.years)
        .map(|year| YearlyComparison {
            year,
            emi_paid: (baseline.emi * 12.0 * year as f64).min(baseline.total_paid),
            diverted_value: diversion.computed().map(|scenario| {
                if year == 0 {
                    0.0
                } else {
                    annuity_future_value(invest_rate, year * 12, scenario.diverted).unwrap_or(0.0)
                }
            }),
        })
        .collect();

    Outcome::Computed(EmiVsSip {
        baseline,
        baseline_net_cost: baseline.total_paid,
        diversion,
        yearly,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_comparison() -> EmiVsSipInputs {
        EmiVsSipInputs {
            principal: 1_500_000.0,
            loan_rate: RateSpec::annual_percent(9.0),
            years: 15,
            diverted_monthly: 10_000.0,
            invest_rate: RateSpec::annual_percent(12.0),
        }
    }

    #[test]
    fn emi_matches_amortization_table_value() {
        let emi = compute_emi(1_500_000.0, 0.09 / 12.0, 180).expect("valid loan");
        assert_approx_tol(emi, 15_214.0, 15_214.0 * 0.01);
        assert_approx_tol(emi, 15_213.998_762, 1e-3);
    }

    #[test]
    fn emi_falls_back_to_straight_line_at_zero_rate() {
        let emi = compute_emi(120_000.0, 0.0, 24).expect("valid loan");
        assert_approx_tol(emi, 5_000.0, 1e-9);
    }

    #[test]
    fn emi_rejects_non_positive_principal_and_zero_tenure() {
        assert!(matches!(
            compute_emi(0.0, 0.01, 12),
            Err(InputError::NonPositive {
                field: "principal",
                ..
            })
        ));
        assert_eq!(
            compute_emi(1_000.0, 0.01, 0),
            Err(InputError::ZeroPeriods { field: "periods" })
        );
    }

    #[test]
    fn loan_summary_interest_is_total_paid_minus_principal() {
        let summary = loan_summary(1_500_000.0, 0.0075, 180).value_or_default();
        assert_approx_tol(summary.total_paid, summary.emi * 180.0, 1e-6);
        assert_approx_tol(summary.total_interest, summary.total_paid - 1_500_000.0, 1e-6);
        assert_approx_tol(summary.total_interest, 1_238_519.777, 1e-2);
    }

    #[test]
    fn standard_emi_amortizes_to_zero() {
        let emi = compute_emi(1_500_000.0, 0.0075, 180).expect("valid loan");
        let rows = amortization_schedule(1_500_000.0, 0.0075, 180, emi).expect("valid schedule");
        assert_eq!(rows.len(), 180);
        assert_eq!(rows[0].period, 1);
        assert_approx_tol(rows[0].interest, 11_250.0, 1e-9);
        let last = rows.last().expect("non-empty schedule");
        assert_approx_tol(last.closing_balance, 0.0, 1e-4);
        assert_approx_tol(remaining_balance(1_500_000.0, 0.0075, 180, emi), 0.0, 1e-4);
    }

    #[test]
    fn diversion_matches_closed_form_figures() {
        let scenario = amortize_with_diversion(1_500_000.0, 0.0075, 180, 10_000.0, 0.01)
            .into_result()
            .expect("valid diversion");
        assert_approx_tol(scenario.reduced_payment, 5_213.998_762, 1e-3);
        assert_approx_tol(scenario.remaining_balance, 3_784_057.69, 1e-1);
        assert_approx_tol(scenario.investment_value, 4_995_801.975, 1e-1);
        assert_approx_tol(scenario.total_invested, 1_800_000.0, 1e-6);
        assert_approx_tol(
            scenario.net_cost,
            scenario.total_outlay - (scenario.investment_value - 3_784_057.69),
            1.0,
        );
        assert_approx_tol(scenario.net_cost, 1_526_775.49, 1e-1);
    }

    #[test]
    fn diversion_floors_only_reported_figures() {
        let scenario = amortize_with_diversion(1_000_000.0, 0.01, 120, 14_000.0, 0.0)
            .into_result()
            .expect("valid diversion");
        assert!(scenario.investment_value > 0.0);
        assert_approx_tol(scenario.amount_left, 0.0, 1e-12);
        let raw_left = scenario.investment_value - scenario.remaining_balance;
        assert!(raw_left < 0.0);
        assert_approx_tol(scenario.net_cost, scenario.total_outlay - raw_left, 1e-6);
    }

    #[test]
    fn diverting_the_whole_emi_is_invalid() {
        let emi = compute_emi(1_500_000.0, 0.0075, 180).expect("valid loan");
        for diverted in [emi, emi + 1.0, emi * 3.0] {
            let outcome = amortize_with_diversion(1_500_000.0, 0.0075, 180, diverted, 0.01);
            assert!(!outcome.is_valid());
            assert!(matches!(
                outcome.invalid_reason(),
                Some(InputError::DiversionExceedsEmi { .. })
            ));
        }
        assert!(!amortize_with_diversion(1_500_000.0, 0.0075, 180, -1.0, 0.01).is_valid());
    }

    #[test]
    fn zero_diversion_clears_the_loan() {
        let scenario = amortize_with_diversion(1_500_000.0, 0.0075, 180, 0.0, 0.01)
            .value_or_default();
        assert_approx_tol(scenario.remaining_balance, 0.0, 1e-4);
        assert_approx_tol(scenario.investment_value, 0.0, 1e-12);
        assert_approx_tol(scenario.net_cost, scenario.emi * 180.0, 1e-3);
    }

    #[test]
    fn comparison_reports_baseline_and_yearly_series() {
        let comparison = compare_emi_vs_sip(&sample_comparison())
            .into_result()
            .expect("valid comparison");
        assert_approx_tol(comparison.baseline_net_cost, comparison.baseline.total_paid, 1e-9);
        assert!(comparison.diversion.is_valid());
        assert_eq!(comparison.yearly.len(), 16);
        assert_eq!(comparison.yearly[0].emi_paid, 0.0);
        assert_eq!(comparison.yearly[0].diverted_value, Some(0.0));

        let last = comparison.yearly.last().expect("non-empty series");
        assert_approx_tol(last.emi_paid, comparison.baseline.total_paid, 1e-6);
        let final_value = comparison
            .diversion
            .computed()
            .map(|scenario| scenario.investment_value)
            .expect("valid diversion");
        assert_approx_tol(last.diverted_value.expect("valid series"), final_value, 1e-6);
    }

    #[test]
    fn comparison_rejects_tenures_beyond_monthly_range() {
        let outcome = compare_emi_vs_sip(&EmiVsSipInputs {
            years: u32::MAX,
            ..sample_comparison()
        });
        assert_eq!(
            outcome.invalid_reason(),
            Some(&InputError::TooManyPeriods {
                field: "years",
                years: u32::MAX
            })
        );
    }

    #[test]
    fn comparison_keeps_baseline_when_diversion_is_invalid() {
        let mut inputs = sample_comparison();
        inputs.diverted_monthly = 20_000.0;
        let comparison = compare_emi_vs_sip(&inputs)
            .into_result()
            .expect("baseline still valid");
        assert!(!comparison.diversion.is_valid());
        assert!(comparison.yearly.iter().all(|point| point.diverted_value.is_none()));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_emi_closes_the_balance(
            principal in 10_000u32..50_000_000,
            rate_bp in 0u32..200,
            periods in 1u32..480
        ) {
            let principal = principal as f64;
            let rate = rate_bp as f64 / 10_000.0;
            let emi = compute_emi(principal, rate, periods).expect("valid");
            prop_assert!(emi.is_finite() && emi > 0.0);
            prop_assert!(emi * periods as f64 + 1e-6 >= principal);
            let balance = remaining_balance(principal, rate, periods, emi);
            prop_assert!(balance.abs() <= principal * 1e-9);
        }
    }
}
