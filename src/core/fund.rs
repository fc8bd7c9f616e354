use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Annual return assumed when a scheme has no usable history.
pub const FALLBACK_ANNUAL_RETURN: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub nav: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FundMeta {
    pub scheme_code: u64,
    pub scheme_name: String,
    #[serde(default)]
    pub fund_house: String,
    #[serde(default)]
    pub nav: f64,
    #[serde(default)]
    pub y5_return: Option<f64>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum NavRange {
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "3Y")]
    ThreeYears,
    #[serde(rename = "5Y")]
    FiveYears,
    #[serde(rename = "All")]
    All,
}

impl NavRange {
    pub const ALL: [NavRange; 7] = [
        NavRange::OneMonth,
        NavRange::ThreeMonths,
        NavRange::SixMonths,
        NavRange::OneYear,
        NavRange::ThreeYears,
        NavRange::FiveYears,
        NavRange::All,
    ];

    pub fn days(self) -> u64 {
        match self {
            NavRange::OneMonth => 30,
            NavRange::ThreeMonths => 90,
            NavRange::SixMonths => 180,
            NavRange::OneYear => 365,
            NavRange::ThreeYears => 1095,
            NavRange::FiveYears => 365 * 5,
            NavRange::All => 365 * 10,
        }
    }

    pub fn window_start(self, end: NaiveDate) -> NaiveDate {
        end.checked_sub_days(Days::new(self.days()))
            .unwrap_or(NaiveDate::MIN)
    }
}

/// Percent change from the earliest to the latest NAV in the series.
///
/// `None` for fewer than two points or a zero/non-finite NAV at either end.
pub fn point_to_point_return(series: &[NavPoint]) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }
    let first = series.iter().min_by_key(|point| point.date)?;
    let last = series.iter().max_by_key(|point| point.date)?;
    let usable = |nav: f64| nav.is_finite() && nav != 0.0;
    if !usable(first.nav) || !usable(last.nav) {
        return None;
    }
    Some((last.nav - first.nav) / first.nav * 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeReturn {
    pub range: NavRange,
    pub return_percent: Option<f64>,
}

pub fn returns_by_range<'a>(
    series: impl IntoIterator<Item = (NavRange, &'a [NavPoint])>,
) -> Vec<RangeReturn> {
    series
        .into_iter()
        .map(|(range, points)| RangeReturn {
            range,
            return_percent: point_to_point_return(points),
        })
        .collect()
}

/// Annual return to seed calculators with: the five-year figure when positive, then a
/// third of the three-year return, then the one-year return, then the fallback.
pub fn expected_annual_return(meta: Option<&FundMeta>, returns: &[RangeReturn]) -> Option<f64> {
    let meta = meta?;
    if let Some(five_year) = meta.y5_return.filter(|value| *value > 0.0) {
        return Some(five_year);
    }
    let lookup = |range: NavRange| {
        returns
            .iter()
            .find(|entry| entry.range == range)
            .and_then(|entry| entry.return_percent)
            .filter(|value| *value != 0.0)
    };
    if let Some(three_year) = lookup(NavRange::ThreeYears) {
        return Some(three_year / 3.0);
    }
    if let Some(one_year) = lookup(NavRange::OneYear) {
        return Some(one_year);
    }
    Some(FALLBACK_ANNUAL_RETURN)
}
