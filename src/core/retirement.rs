use serde::Serialize;

use super::annuity::{compound, growing_annuity_present_value};
use super::guard::{self, InputError};
use super::sip::solve_required_sip;
use super::types::{Outcome, RateSpec};

/// Plans are only produced for people older than this.
pub const MIN_PLANNING_AGE: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetirementInputs {
    pub current_age: u32,
    pub retirement_age: u32,
    pub life_expectancy: u32,
    pub monthly_expense: f64,
    pub pre_retirement_return: RateSpec,
    pub post_retirement_return: RateSpec,
    pub inflation: RateSpec,
    pub existing_savings: f64,
}

/// Whole-unit figures; every field is zero for an invalid plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementPlan {
    pub years_to_retirement: u32,
    pub years_in_retirement: u32,
    pub annual_income_required: f64,
    pub total_corpus: f64,
    pub net_corpus: f64,
    pub monthly_saving: f64,
}

pub fn plan_retirement(inputs: &RetirementInputs) -> Outcome<RetirementPlan> {
    retirement_plan(inputs).into()
}

fn retirement_plan(inputs: &RetirementInputs) -> Result<RetirementPlan, InputError> {
    check_ages(inputs)?;
    let monthly_expense = guard::positive("monthly expense", inputs.monthly_expense)?;
    let existing_savings = guard::non_negative("existing savings", inputs.existing_savings)?;

    let years_to_retirement = inputs.retirement_age - inputs.current_age;
    let years_in_retirement = inputs.life_expectancy - inputs.retirement_age;
    let inflation = inputs.inflation.per_year();

    let annual_income_required = guard::contained(
        "annual income required",
        compound(monthly_expense * 12.0, inflation, years_to_retirement as f64)?,
    )?
    .round();

    let total_corpus = guard::contained(
        "total corpus",
        growing_annuity_present_value(
            inputs.post_retirement_return.per_year(),
            inflation,
            years_in_retirement,
            annual_income_required,
        )?,
    )?
    .round();

    let net_corpus = guard::floored_at_zero(total_corpus - existing_savings);
    let monthly_saving = if net_corpus > 0.0 {
        solve_required_sip(
            net_corpus,
            guard::monthly_periods("years to retirement", years_to_retirement)?,
            inputs.pre_retirement_return.per_month(),
            None,
        )
        .into_result()?
        .contribution
        .round()
    } else {
        0.0
    };

    Ok(RetirementPlan {
        years_to_retirement,
        years_in_retirement,
        annual_income_required,
        total_corpus,
        net_corpus,
        monthly_saving,
    })
}

fn check_ages(inputs: &RetirementInputs) -> Result<(), InputError> {
    if inputs.current_age <= MIN_PLANNING_AGE {
        return Err(InputError::BelowPlanningAge {
            age: inputs.current_age,
            floor: MIN_PLANNING_AGE,
        });
    }
    if inputs.retirement_age <= inputs.current_age {
        return Err(InputError::AgeOrdering {
            earlier: "current age",
            earlier_age: inputs.current_age,
            later: "retirement age",
            later_age: inputs.retirement_age,
        });
    }
    if inputs.life_expectancy <= inputs.retirement_age {
        return Err(InputError::AgeOrdering {
            earlier: "retirement age",
            earlier_age: inputs.retirement_age,
            later: "life expectancy",
            later_age: inputs.life_expectancy,
        });
    }
    Ok(())
}
