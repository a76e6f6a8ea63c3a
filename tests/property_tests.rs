//! Property-based tests for monthly aggregation and summaries.

use chrono::{Datelike, Days, NaiveDate};
use proptest::prelude::*;
use reagent_forecast::{
    models::ForecastPoint,
    services::{aggregation::aggregate_monthly, summary::summarize},
};
use rust_decimal::Decimal;
use std::collections::BTreeSet;

fn daily_points_strategy() -> impl Strategy<Value = Vec<ForecastPoint>> {
    (
        0u64..2_000,
        prop::collection::vec(prop_oneof![Just(0.0), 0.0f64..10_000.0], 1..400),
    )
        .prop_map(|(offset, values)| {
            let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + Days::new(offset);
            values
                .into_iter()
                .enumerate()
                .map(|(i, value)| ForecastPoint {
                    date: start + Days::new(i as u64),
                    value,
                })
                .collect()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn one_row_per_calendar_month_in_order(points in daily_points_strategy()) {
        let months = aggregate_monthly(&points);

        let expected: BTreeSet<(i32, u32)> =
            points.iter().map(|p| (p.date.year(), p.date.month())).collect();
        prop_assert_eq!(months.len(), expected.len());
        prop_assert!(months.iter().all(|m| m.month.day() == 1));
        prop_assert!(months.windows(2).all(|w| w[0].month < w[1].month));
    }

    #[test]
    fn first_month_has_no_change(points in daily_points_strategy()) {
        let months = aggregate_monthly(&points);
        prop_assert_eq!(months[0].percent_change, Decimal::ZERO);
    }

    #[test]
    fn zero_month_never_produces_a_change(points in daily_points_strategy()) {
        let months = aggregate_monthly(&points);
        for window in months.windows(2) {
            if window[0].expected_consumption.is_zero() {
                prop_assert_eq!(window[1].percent_change, Decimal::ZERO);
            }
        }
    }

    #[test]
    fn summary_peak_and_trough_match_rows(points in daily_points_strategy()) {
        let months = aggregate_monthly(&points);
        let summary = summarize("Reagent", &months);

        let max = months.iter().map(|m| m.expected_consumption).max().unwrap();
        let min = months.iter().map(|m| m.expected_consumption).min().unwrap();
        let first_max = months.iter().find(|m| m.expected_consumption == max).map(|m| m.month);
        let first_min = months.iter().find(|m| m.expected_consumption == min).map(|m| m.month);

        prop_assert_eq!(summary.peak_month, first_max);
        prop_assert_eq!(summary.trough_month, first_min);
    }
}
