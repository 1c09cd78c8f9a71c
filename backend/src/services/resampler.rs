//! Gap-aware resampling for line plots.
//!
//! A plotted line is drawn through every consecutive pair of points, so a real
//! outage in the record would otherwise show up as a straight segment across
//! the missing stretch. The resampler overlays a uniform grid at the dataset's
//! sampling interval and marks the empty stretches with [`ResampledRow::Gap`]
//! rows, which renderers treat as line breaks.
//!
//! Only the boundaries of each empty stretch are emitted: a stretch of a single
//! missing grid point is too short to matter and is dropped, longer stretches
//! keep their first and last placeholder. The grid itself is never built, so a
//! ten-year hourly record with a five-year hole costs two rows, not forty
//! thousand.

use chrono::Duration;
use log::debug;
use std::collections::HashSet;

use crate::models::{Instant, Observation, ResampledRow, ResampledSeries, Series};

/// Series at or below this length are returned unchanged.
pub const MIN_RESAMPLE_ROWS: usize = 3;

/// Insert gap markers into `series` at the boundaries of every missing run of
/// grid points.
///
/// Real observations are deduplicated by timestamp (first occurrence kept) and
/// sorted, but otherwise returned untouched.
pub fn resample(series: &Series, interval: Duration) -> ResampledSeries {
    let step = interval.num_milliseconds();
    if series.rows.len() <= MIN_RESAMPLE_ROWS || step <= 0 {
        return passthrough(series);
    }

    let mut seen = HashSet::with_capacity(series.rows.len());
    let mut real: Vec<&Observation> = series
        .rows
        .iter()
        .filter(|row| seen.insert(row.time))
        .collect();
    real.sort_by_key(|row| row.time);

    let first = real[0].time;
    let first_ms = first.timestamp_millis();
    let mut rows = Vec::with_capacity(real.len());

    for pair in real.windows(2) {
        let (left, right) = (pair[0], pair[1]);
        rows.push(ResampledRow::Observed(left.clone()));

        let lo = (left.time.timestamp_millis() - first_ms) / step + 1;
        // ceil(d / step) - 1, without overflowing for very long intervals
        let d = right.time.timestamp_millis() - first_ms;
        let hi = d / step + i64::from(d % step != 0) - 1;
        if hi - lo + 1 >= 2 {
            if let (Some(a), Some(b)) = (grid_point(first, step, lo), grid_point(first, step, hi)) {
                rows.push(ResampledRow::Gap { time: a });
                rows.push(ResampledRow::Gap { time: b });
            }
        }
    }
    if let Some(last) = real.last() {
        rows.push(ResampledRow::Observed((*last).clone()));
    }

    let resampled = ResampledSeries {
        source: series.source.clone(),
        site_code: series.site_code.clone(),
        variables: series.variables.clone(),
        rows,
    };
    debug!(
        "Resampled {}/{}: {} observations, {} gap markers",
        series.source,
        series.site_code,
        real.len(),
        resampled.gap_count()
    );
    resampled
}

fn grid_point(first: Instant, step_ms: i64, k: i64) -> Option<Instant> {
    let offset = step_ms.checked_mul(k)?;
    first.checked_add_signed(Duration::milliseconds(offset))
}

fn passthrough(series: &Series) -> ResampledSeries {
    ResampledSeries {
        source: series.source.clone(),
        site_code: series.site_code.clone(),
        variables: series.variables.clone(),
        rows: series
            .rows
            .iter()
            .cloned()
            .map(ResampledRow::Observed)
            .collect(),
    }
}
