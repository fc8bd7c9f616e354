mod annuity;
mod emi;
mod fund;
mod guard;
mod retirement;
mod sip;
mod solver;
mod types;

pub use annuity::{
    SINGULARITY_EPS, annuity_future_value, compound, growing_annuity_future_value,
    growing_annuity_present_value,
};
pub use emi::{
    AmortizationRow, DiversionScenario, EmiVsSip, EmiVsSipInputs, LoanSummary, YearlyComparison,
    amortization_schedule, amortize_with_diversion, compare_emi_vs_sip, compute_emi, loan_summary,
};
pub use fund::{
    FALLBACK_ANNUAL_RETURN, FundMeta, NavPoint, NavRange, RangeReturn, expected_annual_return,
    point_to_point_return, returns_by_range,
};
pub use guard::InputError;
pub use retirement::{MIN_PLANNING_AGE, RetirementInputs, RetirementPlan, plan_retirement};
pub use sip::{
    ExistingInvestment, GoalInputs, GoalPlan, LumpsumProjection, SipPlan, plan_goal,
    project_lumpsum, solve_required_sip,
};
pub use solver::{
    DEFAULT_GUESS, MAX_ITERATIONS, STEP_TOLERANCE, SwpReportRow, SwpSchedule, WithdrawalInterval,
    compute_xirr, swp_cash_flows, swp_return_percent, swp_schedule,
};
pub use types::{CashFlowEvent, Outcome, RateSpec, SolverOutcome};
