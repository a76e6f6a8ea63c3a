use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{MonthlyForecast, ReagentSummary};
use crate::services::aggregation::DECIMAL_PLACES;

fn month_label(month: Option<NaiveDate>) -> String {
    month
        .map(|m| m.format("%B %Y").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Derives the summary row of a reagent from its monthly rows.
///
/// Peak and trough are the first month holding the maximum and minimum
/// expected consumption, so ties resolve to the earliest month.
pub fn summarize(reagent_name: &str, months: &[MonthlyForecast]) -> ReagentSummary {
    let average_trend = if months.is_empty() {
        Decimal::ZERO
    } else {
        let total: Decimal = months.iter().map(|m| m.percent_change).sum();
        (total / Decimal::from(months.len())).round_dp(DECIMAL_PLACES)
    };

    let mut peak: Option<&MonthlyForecast> = None;
    let mut trough: Option<&MonthlyForecast> = None;
    for month in months {
        if peak.map_or(true, |p| month.expected_consumption > p.expected_consumption) {
            peak = Some(month);
        }
        if trough.map_or(true, |t| month.expected_consumption < t.expected_consumption) {
            trough = Some(month);
        }
    }
    let peak_month = peak.map(|m| m.month);
    let trough_month = trough.map(|m| m.month);

    let conclusion_text = format!(
        "Reagent {} peaks in {}. Average trend: {:.2}% per month. \
         Lowest projected consumption in {}. Recommendation: schedule purchases strategically.",
        reagent_name,
        month_label(peak_month),
        average_trend.round_dp(2),
        month_label(trough_month),
    );

    ReagentSummary {
        average_trend,
        peak_month,
        trough_month,
        conclusion_text,
    }
}
