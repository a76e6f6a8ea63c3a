//! Collapses daily projections into calendar months.

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::models::{ForecastPoint, MonthlyForecast};

/// Decimal places kept for persisted consumption and percentages.
pub const DECIMAL_PLACES: u32 = 4;

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Largest magnitude a persisted `DECIMAL(16, 4)` value can hold.
pub fn stored_limit() -> Decimal {
    Decimal::new(9_999_999_999_999_999, DECIMAL_PLACES)
}

fn saturate(negative: bool) -> Decimal {
    if negative {
        -stored_limit()
    } else {
        stored_limit()
    }
}

/// Rounds to [`DECIMAL_PLACES`] and clamps into the persisted range.
/// Non-finite values become 0.
pub(crate) fn to_decimal(value: f64) -> Decimal {
    if !value.is_finite() {
        return Decimal::ZERO;
    }
    match Decimal::from_f64(value) {
        Some(d) => d.round_dp(DECIMAL_PLACES).clamp(-stored_limit(), stored_limit()),
        None if value.abs() < 1.0 => Decimal::ZERO,
        None => saturate(value < 0.0),
    }
}

/// Percent change from `previous` to `current`, both as stored.
/// 0 when `previous` is 0; saturates at [`stored_limit`].
pub fn percent_change(previous: Decimal, current: Decimal) -> Decimal {
    if previous.is_zero() {
        return Decimal::ZERO;
    }
    current
        .checked_sub(previous)
        .and_then(|delta| delta.checked_div(previous))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|change| {
            change
                .round_dp(DECIMAL_PLACES)
                .clamp(-stored_limit(), stored_limit())
        })
        .unwrap_or_else(|| saturate((current > previous) != previous.is_sign_positive()))
}

/// Groups points by month, averages each month and derives month-over-month
/// percent change from the rounded means. The first month's change is 0.
pub fn aggregate_monthly(points: &[ForecastPoint]) -> Vec<MonthlyForecast> {
    let mut buckets: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for point in points {
        let value = if point.value.is_finite() { point.value } else { 0.0 };
        let bucket = buckets.entry(month_start(point.date)).or_insert((0.0, 0));
        bucket.0 += value;
        bucket.1 += 1;
    }

    let mut previous: Option<Decimal> = None;
    buckets
        .into_iter()
        .map(|(month, (sum, count))| {
            let expected_consumption = to_decimal(sum / count as f64);
            let change =
                previous.map_or(Decimal::ZERO, |prev| percent_change(prev, expected_consumption));
            previous = Some(expected_consumption);

            MonthlyForecast {
                month,
                expected_consumption,
                percent_change: change,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use rstest::rstest;

    fn point(y: i32, m: u32, d: u32, value: f64) -> ForecastPoint {
        ForecastPoint {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            value,
        }
    }

    fn first(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn averages_within_month_and_orders_by_month() {
        let points = vec![
            point(2025, 2, 3, 40.0),
            point(2025, 1, 30, 10.0),
            point(2025, 1, 31, 20.0),
            point(2025, 2, 1, 20.0),
        ];

        let months = aggregate_monthly(&points);
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, first(2025, 1));
        assert_eq!(months[0].expected_consumption, dec!(15));
        assert_eq!(months[0].percent_change, dec!(0));
        assert_eq!(months[1].month, first(2025, 2));
        assert_eq!(months[1].expected_consumption, dec!(30));
        assert_eq!(months[1].percent_change, dec!(100));
    }

    #[test]
    fn zero_previous_month_yields_zero_change() {
        let points = vec![point(2025, 1, 1, 0.0), point(2025, 2, 1, 50.0)];
        let months = aggregate_monthly(&points);
        assert_eq!(months[1].percent_change, Decimal::ZERO);
    }

    #[test]
    fn rounds_to_four_places() {
        let points = vec![point(2025, 1, 1, 1.0), point(2025, 2, 1, 3.0 + 1.0 / 3.0)];
        let months = aggregate_monthly(&points);
        assert_eq!(months[1].expected_consumption, dec!(3.3333));
        assert_eq!(months[1].percent_change, dec!(233.33));
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(aggregate_monthly(&[]).is_empty());
    }

    #[rstest]
    #[case(dec!(100), dec!(150), dec!(50))]
    #[case(dec!(200), dec!(100), dec!(-50))]
    #[case(dec!(0), dec!(10), dec!(0))]
    #[case(dec!(-10), dec!(-5), dec!(-50))]
    #[case(dec!(3), dec!(4), dec!(33.3333))]
    fn percent_change_cases(
        #[case] previous: Decimal,
        #[case] current: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(percent_change(previous, current), expected);
    }

    #[test]
    fn month_rounded_to_zero_yields_zero_change() {
        let points = vec![point(2026, 1, 1, 0.00001), point(2026, 2, 1, 10.0)];
        let months = aggregate_monthly(&points);
        assert_eq!(months[0].expected_consumption, Decimal::ZERO);
        assert_eq!(months[1].percent_change, Decimal::ZERO);
    }

    #[test]
    fn vanishing_previous_month_does_not_fail() {
        let points = vec![point(2026, 1, 1, 1e-30), point(2026, 2, 1, 10.0)];
        let months = aggregate_monthly(&points);
        assert_eq!(months[1].expected_consumption, dec!(10));
        assert_eq!(months[1].percent_change, Decimal::ZERO);
    }

    #[test]
    fn smallest_previous_month_change_is_exact() {
        let points = vec![point(2026, 1, 1, 0.0001), point(2026, 2, 1, 10.0)];
        let months = aggregate_monthly(&points);
        assert_eq!(months[1].percent_change, dec!(9999900));
    }

    #[test]
    fn oversized_values_saturate() {
        let points = vec![
            point(2026, 1, 1, 0.0001),
            point(2026, 2, 1, 1e40),
            point(2026, 3, 1, -1e40),
        ];
        let months = aggregate_monthly(&points);

        assert_eq!(months[1].expected_consumption, stored_limit());
        assert_eq!(months[1].percent_change, stored_limit());
        assert_eq!(months[2].expected_consumption, -stored_limit());
        assert_eq!(months[2].percent_change, dec!(-200));
    }

    #[test]
    fn non_finite_values_become_zero() {
        assert_eq!(to_decimal(f64::NAN), Decimal::ZERO);
        assert_eq!(to_decimal(f64::INFINITY), Decimal::ZERO);
    }

    #[test]
    fn month_start_normalizes() {
        assert_eq!(
            month_start(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
            first(2024, 2)
        );
    }
}
