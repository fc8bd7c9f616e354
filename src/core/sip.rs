use serde::Serialize;

use super::annuity::{annuity_future_value, compound, growing_annuity_future_value};
use super::guard::{self, InputError};
use super::types::{Outcome, RateSpec};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipPlan {
    pub contribution: f64,
    pub total_invested: f64,
    pub growth_multiple: f64,
}

/// Periodic contribution needed to reach `target_fv` after `periods` periods at the
/// per-period `rate`.
///
/// With `growth` set, the contribution escalates by that per-period rate and the
/// growing-annuity factor is inverted instead of the ordinary one.
pub fn solve_required_sip(
    target_fv: f64,
    periods: u32,
    rate: f64,
    growth: Option<f64>,
) -> Outcome<SipPlan> {
    sip_plan(target_fv, periods, rate, growth).into()
}

fn sip_plan(
    target_fv: f64,
    periods: u32,
    rate: f64,
    growth: Option<f64>,
) -> Result<SipPlan, InputError> {
    let target = guard::positive("target future value", target_fv)?;
    let unit_future_value = match growth {
        Some(growth) => growing_annuity_future_value(rate, growth, periods, 1.0)?,
        None => annuity_future_value(rate, periods, 1.0)?,
    };

    let contribution = guard::contained("contribution", target / unit_future_value)?;
    let total_invested = guard::contained("total invested", contribution * periods as f64)?;
    let growth_multiple = if total_invested > 0.0 {
        guard::contained("growth multiple", target / total_invested)?
    } else {
        0.0
    };

    Ok(SipPlan {
        contribution,
        total_invested,
        growth_multiple,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LumpsumProjection {
    pub invested: f64,
    pub estimated_return: f64,
    pub total_value: f64,
}

pub fn project_lumpsum(
    amount: f64,
    annual_return: RateSpec,
    years: f64,
) -> Outcome<LumpsumProjection> {
    lumpsum_projection(amount, annual_return, years).into()
}

fn lumpsum_projection(
    amount: f64,
    annual_return: RateSpec,
    years: f64,
) -> Result<LumpsumProjection, InputError> {
    let invested = guard::positive("amount", amount)?;
    let total_value = guard::contained(
        "total value",
        compound(invested, annual_return.per_year(), years)?,
    )?;
    Ok(LumpsumProjection {
        invested,
        estimated_return: total_value - invested,
        total_value,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExistingInvestment {
    pub amount: f64,
    pub annual_return: RateSpec,
}

/// A future expense (education, marriage) priced in today's money.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalInputs {
    pub target_today: f64,
    pub years: u32,
    pub expected_return: RateSpec,
    pub inflation: RateSpec,
    pub savings_growth: Option<RateSpec>,
    pub existing_investment: Option<ExistingInvestment>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalPlan {
    pub inflation_adjusted_target: f64,
    pub sip_required: f64,
    pub total_investment: f64,
    pub growth_multiple: f64,
    pub future_value_existing: f64,
    /// Positive while the existing investment falls short of the target.
    pub shortfall: f64,
}

pub fn plan_goal(inputs: &GoalInputs) -> Outcome<GoalPlan> {
    goal_plan(inputs).into()
}

fn goal_plan(inputs: &GoalInputs) -> Result<GoalPlan, InputError> {
    let target_today = guard::positive("target amount", inputs.target_today)?;
    let years = guard::periods("years", inputs.years)?;
    let months = guard::monthly_periods("years", years)?;

    let inflation_adjusted_target = guard::contained(
        "inflation-adjusted target",
        compound(target_today, inputs.inflation.per_year(), years as f64)?,
    )?;

    let sip = sip_plan(
        inflation_adjusted_target,
        months,
        inputs.expected_return.per_month(),
        inputs.savings_growth.map(RateSpec::per_month),
    )?;

    let future_value_existing = match inputs.existing_investment {
        Some(existing) => {
            let amount = guard::non_negative("existing investment", existing.amount)?;
            guard::contained(
                "existing investment value",
                compound(amount, existing.annual_return.per_year(), years as f64)?,
            )?
        }
        None => 0.0,
    };

    Ok(GoalPlan {
        inflation_adjusted_target,
        sip_required: sip.contribution,
        total_investment: sip.total_invested,
        growth_multiple: sip.growth_multiple,
        future_value_existing,
        shortfall: inflation_adjusted_target - future_value_existing,
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

    fn sample_goal() -> GoalInputs {
        GoalInputs {
            target_today: 10_000_000.0,
            years: 10,
            expected_return: RateSpec::annual_percent(12.0),
            inflation: RateSpec::annual_percent(8.0),
            savings_growth: None,
            existing_investment: None,
        }
    }

    #[test]
    fn required_sip_inverts_the_annuity_factor() {
        let plan = solve_required_sip(1_000_000.0, 120, 0.01, None);
        let plan = plan.computed().expect("valid plan");
        let factor = (1.01_f64.powf(120.0) - 1.0) / 0.01;
        assert_approx_tol(plan.contribution, 1_000_000.0 / factor, 1e-6);
        assert_approx_tol(plan.total_invested, plan.contribution * 120.0, 1e-6);
        assert_approx_tol(
            plan.growth_multiple,
            1_000_000.0 / plan.total_invested,
            1e-9,
        );
    }

    #[test]
    fn escalating_contribution_starts_lower_than_flat_one() {
        let flat = solve_required_sip(1_000_000.0, 120, 0.01, None).value_or_default();
        let growing = solve_required_sip(1_000_000.0, 120, 0.01, Some(0.005)).value_or_default();
        assert!(growing.contribution > 0.0);
        assert!(growing.contribution < flat.contribution);

        let reproduced =
            growing_annuity_future_value(0.01, 0.005, 120, growing.contribution).expect("valid");
        assert_approx_tol(reproduced, 1_000_000.0, 1e-4);
    }

    #[test]
    fn escalating_contribution_at_rate_equal_to_growth_uses_limit_form() {
        let plan = solve_required_sip(600_000.0, 60, 0.01, Some(0.01)).value_or_default();
        let expected = 600_000.0 / (60.0 * 1.01_f64.powf(59.0));
        assert_approx_tol(plan.contribution, expected, 1e-9);
    }

    #[test]
    fn non_finite_contribution_is_reported_invalid() {
        let outcome = solve_required_sip(1_000.0, 200, -0.999, Some(-0.999));
        assert_eq!(
            outcome.invalid_reason(),
            Some(&InputError::NonFinite {
                field: "contribution"
            })
        );
        assert_eq!(outcome.value_or_default(), SipPlan::default());
    }

    #[test]
    fn overflowing_total_invested_is_reported_invalid() {
        let outcome = solve_required_sip(1.7e308, 1200, -0.08, None);
        assert_eq!(
            outcome.invalid_reason(),
            Some(&InputError::NonFinite {
                field: "total invested"
            })
        );

        let goal = plan_goal(&GoalInputs {
            target_today: 1e307,
            years: 100,
            expected_return: RateSpec::annual_percent(-96.0),
            inflation: RateSpec::annual_percent(0.0),
            ..sample_goal()
        });
        assert_eq!(
            goal.invalid_reason(),
            Some(&InputError::NonFinite {
                field: "total invested"
            })
        );
    }

    #[test]
    fn goal_years_beyond_monthly_range_are_invalid() {
        let goal = plan_goal(&GoalInputs {
            years: u32::MAX,
            ..sample_goal()
        });
        assert!(matches!(
            goal.invalid_reason(),
            Some(InputError::TooManyPeriods { field: "years", .. })
        ));
    }

    #[test]
    fn non_positive_target_is_invalid() {
        assert!(!solve_required_sip(0.0, 12, 0.01, None).is_valid());
        assert!(!solve_required_sip(-10.0, 12, 0.01, None).is_valid());
        assert!(!solve_required_sip(1_000.0, 0, 0.01, None).is_valid());
    }

    #[test]
    fn lumpsum_projection_compounds_annually() {
        let projection = project_lumpsum(25_000.0, RateSpec::annual_percent(12.0), 10.0)
            .into_result()
            .expect("valid projection");
        assert_approx_tol(projection.total_value, 25_000.0 * 1.12_f64.powi(10), 1e-6);
        assert_approx_tol(
            projection.estimated_return,
            projection.total_value - 25_000.0,
            1e-9,
        );

        let flat = project_lumpsum(25_000.0, RateSpec::annual_percent(0.0), 7.5).value_or_default();
        assert_approx_tol(flat.total_value, 25_000.0, 1e-9);
        assert_approx_tol(flat.estimated_return, 0.0, 1e-9);
    }

    #[test]
    fn goal_plan_inflates_target_and_solves_monthly_sip() {
        let plan = plan_goal(&sample_goal()).into_result().expect("valid goal");
        let expected_target = 10_000_000.0 * 1.08_f64.powi(10);
        assert_approx_tol(plan.inflation_adjusted_target, expected_target, 1e-4);

        let factor = (1.01_f64.powf(120.0) - 1.0) / 0.01;
        assert_approx_tol(plan.sip_required, expected_target / factor, 1e-4);
        assert_approx_tol(plan.total_investment, plan.sip_required * 120.0, 1e-4);
        assert_approx_tol(plan.future_value_existing, 0.0, 1e-12);
        assert_approx_tol(plan.shortfall, expected_target, 1e-4);
    }

    #[test]
    fn goal_plan_nets_existing_investment_in_shortfall() {
        let mut inputs = sample_goal();
        inputs.existing_investment = Some(ExistingInvestment {
            amount: 6_000.0,
            annual_return: RateSpec::annual_percent(9.7),
        });
        inputs.savings_growth = Some(RateSpec::annual_percent(7.5));

        let plan = plan_goal(&inputs).value_or_default();
        let existing = 6_000.0 * 1.097_f64.powi(10);
        assert_approx_tol(plan.future_value_existing, existing, 1e-6);
        assert_approx_tol(
            plan.shortfall,
            plan.inflation_adjusted_target - existing,
            1e-6,
        );

        let flat = plan_goal(&sample_goal()).value_or_default();
        assert!(plan.sip_required < flat.sip_required);
    }

    #[test]
    fn goal_plan_rejects_zero_years() {
        let mut inputs = sample_goal();
        inputs.years = 0;
        assert_eq!(
            plan_goal(&inputs).invalid_reason(),
            Some(&InputError::ZeroPeriods { field: "years" })
        );
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_required_sip_round_trips_annuity_future_value(
            rate_bp in 1u32..250,
            periods in 1u32..480,
            payment in 1u32..500_000
        ) {
            let rate = rate_bp as f64 / 10_000.0;
            let payment = payment as f64;
            let target = annuity_future_value(rate, periods, payment).expect("valid");
            let plan = solve_required_sip(target, periods, rate, None).value_or_default();
            prop_assert!((plan.contribution - payment).abs() <= payment * 1e-9);
        }
    }
}
