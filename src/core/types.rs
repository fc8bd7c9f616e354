use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::guard::InputError;

/// An annual rate quoted in percent, e.g. `12.0` for 12% a year.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateSpec(f64);

impl RateSpec {
    pub const fn annual_percent(percent: f64) -> Self {
        Self(percent)
    }

    pub fn percent(self) -> f64 {
        self.0
    }

    pub fn per_year(self) -> f64 {
        self.0 / 100.0
    }

    pub fn per_month(self) -> f64 {
        self.0 / 1200.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CashFlowEvent {
    pub date: NaiveDate,
    pub amount: f64,
}

impl CashFlowEvent {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self { date, amount }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverOutcome {
    pub value: f64,
    pub converged: bool,
    pub iterations: u32,
}

/// Either a computed record or the precondition that stopped the computation.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<T> {
    Computed(T),
    Invalid(InputError),
}

impl<T> Outcome<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Outcome::Computed(_))
    }

    pub fn computed(&self) -> Option<&T> {
        match self {
            Outcome::Computed(value) => Some(value),
            Outcome::Invalid(_) => None,
        }
    }

    pub fn invalid_reason(&self) -> Option<&InputError> {
        match self {
            Outcome::Computed(_) => None,
            Outcome::Invalid(reason) => Some(reason),
        }
    }

    pub fn into_result(self) -> Result<T, InputError> {
        match self {
            Outcome::Computed(value) => Ok(value),
            Outcome::Invalid(reason) => Err(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Computed(value) => Outcome::Computed(f(value)),
            Outcome::Invalid(reason) => Outcome::Invalid(reason),
        }
    }
}

impl<T: Default> Outcome<T> {
    pub fn value_or_default(self) -> T {
        match self {
            Outcome::Computed(value) => value,
            Outcome::Invalid(_) => T::default(),
        }
    }
}

impl<T> From<Result<T, InputError>> for Outcome<T> {
    fn from(value: Result<T, InputError>) -> Self {
        match value {
            Ok(value) => Outcome::Computed(value),
            Err(reason) => Outcome::Invalid(reason),
        }
    }
}
