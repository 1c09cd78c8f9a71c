#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    use crate::models::{Instant, Observation, ResampledRow, Series};
    use crate::services::resampler::resample;

    fn hour(h: i64) -> Instant {
        Utc.with_ymd_and_hms(2005, 1, 1, 0, 0, 0).unwrap() + Duration::hours(h)
    }

    fn series(hours: &[i64]) -> Series {
        Series {
            source: "ntas_flux".into(),
            site_code: "48401".into(),
            variables: vec!["QNET".to_string()],
            rows: hours
                .iter()
                .map(|h| Observation::scalar(hour(*h), *h as f64))
                .collect(),
        }
    }

    #[test]
    fn test_short_series_passes_through() {
        let input = series(&[5, 0, 40]);
        let out = resample(&input, Duration::hours(1));
        assert_eq!(out.rows.len(), 3);
        assert_eq!(out.gap_count(), 0);
        // unchanged order
        assert_eq!(out.rows[0].time(), hour(5));
    }

    #[test]
    fn test_non_positive_interval_passes_through() {
        let input = series(&[0, 1, 2, 50]);
        let out = resample(&input, Duration::zero());
        assert_eq!(out.gap_count(), 0);
        assert_eq!(out.rows.len(), 4);
    }

    #[test]
    fn test_regular_series_has_no_gaps() {
        let out = resample(&series(&[0, 1, 2, 3, 4, 5]), Duration::hours(1));
        assert_eq!(out.gap_count(), 0);
        assert_eq!(out.rows.len(), 6);
    }

    #[test]
    fn test_long_gap_collapses_to_two_markers() {
        // 10x the interval between hour 3 and hour 13
        let out = resample(&series(&[0, 1, 2, 3, 13, 14]), Duration::hours(1));
        assert_eq!(out.gap_count(), 2);

        let times: Vec<(Instant, bool)> = out.rows.iter().map(|r| (r.time(), r.is_real())).collect();
        assert_eq!(
            times,
            vec![
                (hour(0), true),
                (hour(1), true),
                (hour(2), true),
                (hour(3), true),
                (hour(4), false),
                (hour(12), false),
                (hour(13), true),
                (hour(14), true),
            ]
        );
    }

    #[test]
    fn test_huge_interval_has_no_gaps() {
        let out = resample(&series(&[0, 1, 2, 3]), Duration::milliseconds(i64::MAX));
        assert_eq!(out.rows.len(), 4);
        assert_eq!(out.gap_count(), 0);
    }

    #[test]
    fn test_single_missing_point_is_dropped() {
        let out = resample(&series(&[0, 1, 3, 4]), Duration::hours(1));
        assert_eq!(out.gap_count(), 0);
    }

    #[test]
    fn test_two_missing_points_both_kept() {
        let out = resample(&series(&[0, 1, 4, 5]), Duration::hours(1));
        let gaps: Vec<Instant> = out
            .rows
            .iter()
            .filter(|r| !r.is_real())
            .map(|r| r.time())
            .collect();
        assert_eq!(gaps, vec![hour(2), hour(3)]);
    }

    #[test]
    fn test_duplicates_keep_first_and_sort() {
        let mut input = series(&[3, 0, 1, 2]);
        input.rows.push(Observation::scalar(hour(1), 99.0));
        let out = resample(&input, Duration::hours(1));
        let values: Vec<Option<f64>> = out.observations().map(|o| o.values[0]).collect();
        assert_eq!(values, vec![Some(0.0), Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_gap_rows_carry_no_value() {
        let out = resample(&series(&[0, 1, 2, 30]), Duration::hours(1));
        for row in &out.rows {
            match row {
                ResampledRow::Gap { .. } => assert!(row.observation().is_none()),
                ResampledRow::Observed(o) => assert!(o.values[0].is_some()),
            }
        }
    }

    proptest! {
        #[test]
        fn prop_observations_survive_unchanged(
            hours in proptest::collection::btree_set(0i64..2000, 4..200),
            step in 1i64..48,
        ) {
            let hours: Vec<i64> = hours.into_iter().collect();
            let input = series(&hours);
            let out = resample(&input, Duration::hours(step));

            let observed: Vec<Observation> = out.observations().cloned().collect();
            prop_assert_eq!(observed, input.rows.clone());

            // time-ordered, and at most two markers between consecutive observations
            let mut run = 0;
            let mut previous: Option<Instant> = None;
            for row in &out.rows {
                if let Some(p) = previous {
                    prop_assert!(p < row.time());
                }
                previous = Some(row.time());
                if row.is_real() {
                    run = 0;
                } else {
                    run += 1;
                    prop_assert!(run <= 2);
                }
            }
        }
    }
}
