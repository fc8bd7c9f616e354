use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::core::{
    AmortizationRow, CashFlowEvent, DiversionScenario, EmiVsSip, EmiVsSipInputs,
    ExistingInvestment, FundMeta, GoalInputs, GoalPlan, LoanSummary, LumpsumProjection, NavPoint,
    NavRange, Outcome, RangeReturn, RateSpec, RetirementInputs, RetirementPlan, SipPlan,
    SolverOutcome, SwpReportRow, SwpSchedule, WithdrawalInterval, YearlyComparison,
    amortization_schedule, compare_emi_vs_sip, compute_xirr, expected_annual_return, loan_summary,
    plan_goal, plan_retirement, project_lumpsum, returns_by_range, solve_required_sip,
    swp_return_percent, swp_schedule,
};

const MAX_YEARS: u32 = 100;
const MAX_RATE_PERCENT: f64 = 100.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Calculator {
    Lumpsum,
    Sip,
    Goal,
    Emi,
    EmiVsSip,
    Retirement,
    Xirr,
    SwpReturns,
    FundReturns,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LumpsumPayload {
    amount: Option<f64>,
    rate: Option<f64>,
    years: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SipPayload {
    target_amount: Option<f64>,
    years: Option<u32>,
    rate: Option<f64>,
    step_up: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GoalPayload {
    target: Option<f64>,
    period: Option<u32>,
    returns: Option<f64>,
    inflation: Option<f64>,
    savings_growth: Option<f64>,
    existing_investment: Option<f64>,
    existing_return: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct EmiPayload {
    loan_amount: Option<f64>,
    interest_rate: Option<f64>,
    years: Option<u32>,
    schedule: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct EmiVsSipPayload {
    loan_amount: Option<f64>,
    interest_rate: Option<f64>,
    years: Option<u32>,
    sip_allocation: Option<f64>,
    sip_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RetirementPayload {
    age: Option<u32>,
    retirement_age: Option<u32>,
    life_expectancy: Option<u32>,
    monthly_expense: Option<f64>,
    roi_before: Option<f64>,
    roi_after: Option<f64>,
    inflation: Option<f64>,
    existing_savings: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct XirrPayload {
    cashflows: Vec<CashFlowEvent>,
    guess: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SwpPayload {
    invest_date: Option<NaiveDate>,
    total_invested_amount: Option<f64>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    withdrawal_amount: Option<f64>,
    interval: Option<WithdrawalInterval>,
    swp_report: Vec<SwpReportRow>,
    guess: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FundReturnsPayload {
    meta: Option<FundMeta>,
    navs: Vec<NavPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeResponse<T: Serialize> {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(flatten)]
    result: Option<T>,
}

impl<T: Serialize> From<Outcome<T>> for OutcomeResponse<T> {
    fn from(outcome: Outcome<T>) -> Self {
        match outcome {
            Outcome::Computed(result) => OutcomeResponse {
                valid: true,
                reason: None,
                result: Some(result),
            },
            Outcome::Invalid(reason) => {
                debug!(%reason, "calculation inputs rejected");
                OutcomeResponse {
                    valid: false,
                    reason: Some(reason.to_string()),
                    result: None,
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmiResponse {
    #[serde(flatten)]
    summary: LoanSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule: Option<Vec<AmortizationRow>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BaselineResponse {
    #[serde(flatten)]
    summary: LoanSummary,
    net_cost: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmiVsSipResponse {
    baseline: BaselineResponse,
    diversion: OutcomeResponse<DiversionScenario>,
    yearly: Vec<YearlyComparison>,
}

impl From<EmiVsSip> for EmiVsSipResponse {
    fn from(comparison: EmiVsSip) -> Self {
        EmiVsSipResponse {
            baseline: BaselineResponse {
                summary: comparison.baseline,
                net_cost: comparison.baseline_net_cost,
            },
            diversion: comparison.diversion.into(),
            yearly: comparison.yearly,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SwpResponse {
    schedule: SwpSchedule,
    return_percent: SolverOutcome,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FundReturnsResponse {
    returns: Vec<RangeReturn>,
    expected_annual_return: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

fn check_percent(name: &str, value: f64) -> Result<RateSpec, String> {
    if !value.is_finite() || value.abs() > MAX_RATE_PERCENT {
        return Err(format!(
            "{name} must be a percentage between -{MAX_RATE_PERCENT} and {MAX_RATE_PERCENT}"
        ));
    }
    Ok(RateSpec::annual_percent(value))
}

fn check_years(name: &str, value: u32) -> Result<u32, String> {
    if value > MAX_YEARS {
        return Err(format!("{name} must be at most {MAX_YEARS} years"));
    }
    Ok(value)
}

fn lumpsum_outcome(payload: LumpsumPayload) -> Result<Outcome<LumpsumProjection>, String> {
    let rate = check_percent("rate", payload.rate.unwrap_or(12.0))?;
    let years = payload.years.unwrap_or(10.0);
    if !years.is_finite() || !(0.0..=MAX_YEARS as f64).contains(&years) {
        return Err(format!("years must be between 0 and {MAX_YEARS}"));
    }
    Ok(project_lumpsum(payload.amount.unwrap_or(25_000.0), rate, years))
}

fn sip_outcome(payload: SipPayload) -> Result<Outcome<SipPlan>, String> {
    let years = check_years("years", payload.years.unwrap_or(10))?;
    let rate = check_percent("rate", payload.rate.unwrap_or(12.0))?;
    let step_up = payload
        .step_up
        .map(|value| check_percent("stepUp", value))
        .transpose()?;
    Ok(solve_required_sip(
        payload.target_amount.unwrap_or(1_000_000.0),
        years.saturating_mul(12),
        rate.per_month(),
        step_up.map(RateSpec::per_month),
    ))
}

fn goal_inputs(payload: GoalPayload) -> Result<GoalInputs, String> {
    let savings_growth = payload
        .savings_growth
        .map(|value| check_percent("savingsGrowth", value))
        .transpose()?;
    let existing_investment = match payload.existing_investment {
        Some(amount) => Some(ExistingInvestment {
            amount,
            annual_return: check_percent("existingReturn", payload.existing_return.unwrap_or(9.7))?,
        }),
        None => None,
    };
    Ok(GoalInputs {
        target_today: payload.target.unwrap_or(10_000_000.0),
        years: check_years("period", payload.period.unwrap_or(10))?,
        expected_return: check_percent("returns", payload.returns.unwrap_or(12.0))?,
        inflation: check_percent("inflation", payload.inflation.unwrap_or(8.0))?,
        savings_growth,
        existing_investment,
    })
}

fn emi_outcome(payload: EmiPayload) -> Result<Outcome<EmiResponse>, String> {
    let principal = payload.loan_amount.unwrap_or(1_500_000.0);
    let rate = check_percent("interestRate", payload.interest_rate.unwrap_or(9.0))?;
    let months = check_years("years", payload.years.unwrap_or(15))? * 12;
    let with_schedule = payload.schedule.unwrap_or(false);

    Ok(match loan_summary(principal, rate.per_month(), months) {
        Outcome::Computed(summary) => {
            let schedule = if with_schedule {
                match amortization_schedule(principal, rate.per_month(), months, summary.emi) {
                    Ok(rows) => Some(rows),
                    Err(reason) => return Ok(Outcome::Invalid(reason)),
                }
            } else {
                None
            };
            Outcome::Computed(EmiResponse { summary, schedule })
        }
        Outcome::Invalid(reason) => Outcome::Invalid(reason),
    })
}

fn emi_vs_sip_inputs(payload: EmiVsSipPayload) -> Result<EmiVsSipInputs, String> {
    Ok(EmiVsSipInputs {
        principal: payload.loan_amount.unwrap_or(1_500_000.0),
        loan_rate: check_percent("interestRate", payload.interest_rate.unwrap_or(9.0))?,
        years: check_years("years", payload.years.unwrap_or(15))?,
        diverted_monthly: payload.sip_allocation.unwrap_or(10_000.0),
        invest_rate: check_percent("sipRate", payload.sip_rate.unwrap_or(12.0))?,
    })
}

fn retirement_inputs(payload: RetirementPayload) -> Result<RetirementInputs, String> {
    Ok(RetirementInputs {
        current_age: check_years("age", payload.age.unwrap_or(30))?,
        retirement_age: check_years("retirementAge", payload.retirement_age.unwrap_or(60))?,
        life_expectancy: check_years("lifeExpectancy", payload.life_expectancy.unwrap_or(85))?,
        monthly_expense: payload.monthly_expense.unwrap_or(50_000.0),
        pre_retirement_return: check_percent("roiBefore", payload.roi_before.unwrap_or(15.0))?,
        post_retirement_return: check_percent("roiAfter", payload.roi_after.unwrap_or(8.0))?,
        inflation: check_percent("inflation", payload.inflation.unwrap_or(6.0))?,
        existing_savings: payload.existing_savings.unwrap_or(0.0),
    })
}

fn xirr_outcome(payload: XirrPayload) -> Outcome<SolverOutcome> {
    let outcome: Outcome<SolverOutcome> = compute_xirr(&payload.cashflows, payload.guess).into();
    if let Some(solved) = outcome.computed().filter(|solved| !solved.converged) {
        warn!(
            iterations = solved.iterations,
            value = solved.value,
            "xirr returned a low-confidence estimate"
        );
    }
    outcome
}

fn swp_outcome(payload: SwpPayload) -> Result<Outcome<SwpResponse>, String> {
    let Some(invest_date) = payload.invest_date else {
        return Err("investDate is required".to_string());
    };
    let start_date = payload.start_date.unwrap_or(invest_date);
    let Some(end_date) = payload.end_date else {
        return Err("endDate is required".to_string());
    };
    let interval = payload.interval.unwrap_or(WithdrawalInterval::Monthly);
    let invested = payload.total_invested_amount.unwrap_or(1_000_000.0);

    let schedule = match swp_schedule(
        start_date,
        end_date,
        interval,
        payload.withdrawal_amount.unwrap_or(3_000.0),
    ) {
        Ok(schedule) => schedule,
        Err(reason) => return Ok(Outcome::Invalid(reason)),
    };
    let outcome: Outcome<SolverOutcome> =
        swp_return_percent(invest_date, invested, &payload.swp_report, payload.guess).into();
    Ok(outcome.map(|return_percent| SwpResponse {
        schedule,
        return_percent,
    }))
}

/// Windows end on the latest NAV date in the series.
fn fund_returns(payload: FundReturnsPayload) -> Result<FundReturnsResponse, String> {
    let Some(latest) = payload.navs.iter().map(|point| point.date).max() else {
        return Err("navs must contain at least one NAV point".to_string());
    };
    let windows: Vec<(NavRange, Vec<NavPoint>)> = NavRange::ALL
        .iter()
        .map(|&range| {
            let start = range.window_start(latest);
            let points = payload
                .navs
                .iter()
                .filter(|point| point.date >= start)
                .copied()
                .collect();
            (range, points)
        })
        .collect();
    let returns = returns_by_range(
        windows
            .iter()
            .map(|(range, points)| (*range, points.as_slice())),
    );
    Ok(FundReturnsResponse {
        expected_annual_return: expected_annual_return(payload.meta.as_ref(), &returns),
        returns,
    })
}

fn respond<T: Serialize>(outcome: Outcome<T>) -> Response {
    json_response(StatusCode::OK, OutcomeResponse::from(outcome))
}

fn respond_or_reject<T: Serialize>(result: Result<Outcome<T>, String>) -> Response {
    match result {
        Ok(outcome) => respond(outcome),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

fn parse_payload<P: DeserializeOwned>(json: &str) -> Result<P, String> {
    serde_json::from_str::<P>(json).map_err(|e| format!("Invalid API JSON payload: {e}"))
}

fn to_json<T: Serialize>(body: &T) -> Result<String, String> {
    serde_json::to_string_pretty(body).map_err(|e| format!("Failed to serialize response: {e}"))
}

fn outcome_json<T: Serialize>(outcome: Outcome<T>) -> Result<String, String> {
    to_json(&OutcomeResponse::from(outcome))
}

pub fn calculate_json(calculator: Calculator, payload: &str) -> Result<String, String> {
    let payload = if payload.trim().is_empty() {
        "{}"
    } else {
        payload
    };
    match calculator {
        Calculator::Lumpsum => outcome_json(lumpsum_outcome(parse_payload(payload)?)?),
        Calculator::Sip => outcome_json(sip_outcome(parse_payload(payload)?)?),
        Calculator::Goal => outcome_json(plan_goal(&goal_inputs(parse_payload(payload)?)?)),
        Calculator::Emi => outcome_json(emi_outcome(parse_payload(payload)?)?),
        Calculator::EmiVsSip => outcome_json(
            compare_emi_vs_sip(&emi_vs_sip_inputs(parse_payload(payload)?)?)
                .map(EmiVsSipResponse::from),
        ),
        Calculator::Retirement => outcome_json(plan_retirement(&retirement_inputs(
            parse_payload(payload)?,
        )?)),
        Calculator::Xirr => outcome_json(xirr_outcome(parse_payload(payload)?)),
        Calculator::SwpReturns => outcome_json(swp_outcome(parse_payload(payload)?)?),
        Calculator::FundReturns => to_json(&fund_returns(parse_payload(payload)?)?),
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route(
            "/api/lumpsum",
            get(lumpsum_get_handler).post(lumpsum_post_handler),
        )
        .route("/api/sip", get(sip_get_handler).post(sip_post_handler))
        .route("/api/goal", get(goal_get_handler).post(goal_post_handler))
        .route("/api/emi", get(emi_get_handler).post(emi_post_handler))
        .route(
            "/api/emi-vs-sip",
            get(emi_vs_sip_get_handler).post(emi_vs_sip_post_handler),
        )
        .route(
            "/api/retirement",
            get(retirement_get_handler).post(retirement_post_handler),
        )
        .route("/api/xirr", post(xirr_handler))
        .route("/api/swp/returns", post(swp_handler))
        .route("/api/fund/returns", post(fund_returns_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(config: &ServerConfig) -> std::io::Result<()> {
    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "sipwise HTTP API listening");
    info!("Local access: http://127.0.0.1:{}/api/health", config.port);

    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    json_response(
        StatusCode::OK,
        HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn lumpsum_get_handler(Query(payload): Query<LumpsumPayload>) -> Response {
    respond_or_reject(lumpsum_outcome(payload))
}

async fn lumpsum_post_handler(Json(payload): Json<LumpsumPayload>) -> Response {
    respond_or_reject(lumpsum_outcome(payload))
}

async fn sip_get_handler(Query(payload): Query<SipPayload>) -> Response {
    respond_or_reject(sip_outcome(payload))
}

async fn sip_post_handler(Json(payload): Json<SipPayload>) -> Response {
    respond_or_reject(sip_outcome(payload))
}

async fn goal_get_handler(Query(payload): Query<GoalPayload>) -> Response {
    goal_handler_impl(payload)
}

async fn goal_post_handler(Json(payload): Json<GoalPayload>) -> Response {
    goal_handler_impl(payload)
}

fn goal_handler_impl(payload: GoalPayload) -> Response {
    respond_or_reject::<GoalPlan>(goal_inputs(payload).map(|inputs| plan_goal(&inputs)))
}

async fn emi_get_handler(Query(payload): Query<EmiPayload>) -> Response {
    respond_or_reject(emi_outcome(payload))
}

async fn emi_post_handler(Json(payload): Json<EmiPayload>) -> Response {
    respond_or_reject(emi_outcome(payload))
}

async fn emi_vs_sip_get_handler(Query(payload): Query<EmiVsSipPayload>) -> Response {
    emi_vs_sip_handler_impl(payload)
}

async fn emi_vs_sip_post_handler(Json(payload): Json<EmiVsSipPayload>) -> Response {
    emi_vs_sip_handler_impl(payload)
}

fn emi_vs_sip_handler_impl(payload: EmiVsSipPayload) -> Response {
    respond_or_reject(
        emi_vs_sip_inputs(payload)
            .map(|inputs| compare_emi_vs_sip(&inputs).map(EmiVsSipResponse::from)),
    )
}

async fn retirement_get_handler(Query(payload): Query<RetirementPayload>) -> Response {
    retirement_handler_impl(payload)
}

async fn retirement_post_handler(Json(payload): Json<RetirementPayload>) -> Response {
    retirement_handler_impl(payload)
}

fn retirement_handler_impl(payload: RetirementPayload) -> Response {
    respond_or_reject::<RetirementPlan>(
        retirement_inputs(payload).map(|inputs| plan_retirement(&inputs)),
    )
}

async fn xirr_handler(Json(payload): Json<XirrPayload>) -> Response {
    debug!(events = payload.cashflows.len(), "computing xirr");
    respond(xirr_outcome(payload))
}

async fn swp_handler(Json(payload): Json<SwpPayload>) -> Response {
    debug!(rows = payload.swp_report.len(), "computing swp returns");
    respond_or_reject(swp_outcome(payload))
}

async fn fund_returns_handler(Json(payload): Json<FundReturnsPayload>) -> Response {
    match fund_returns(payload) {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
