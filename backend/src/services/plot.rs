//! Plot orchestration for the selected platform.
//!
//! For every dataset in which the selected platform is active, the raw series
//! is fetched for the current window, thinned to the configured row cap,
//! resampled with gap markers and turned into one panel. Panels follow dataset
//! order. A dataset that fails to answer is skipped and reported; the others are
//! still plotted.

use chrono::Duration;
use futures::stream::{self, StreamExt};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::config::SearchSettings;
use crate::db::models::DatasetInfo;
use crate::db::repository::{DataStore, RepositoryResult};
use crate::db::services::guarded_query;
use crate::models::{DatasetId, Observation, Question, Selection, Series, SiteCode, TimeWindow};
use crate::routes::plot::{DownloadRow, PlotPanel, PlotResponse};
use crate::services::availability::{SearchOutcome, SourceFailure};
use crate::services::deep_link::DeepLink;
use crate::services::resampler::resample;
use crate::services::ticks::{select_ticks, tick_format_stops};

/// Everything needed to plot one selection.
#[derive(Debug, Clone, Copy)]
pub struct PlotRequest<'a> {
    pub window: &'a TimeWindow,
    pub question: &'a Question,
    pub selection: &'a Selection,
    /// The search whose active set decides which datasets contribute.
    pub search: &'a SearchOutcome,
}

/// Keep `limit` randomly chosen rows, in time order.
///
/// With a seed the choice is reproducible; without one every call draws anew.
pub fn subsample(rows: Vec<Observation>, limit: usize, seed: Option<u64>) -> Vec<Observation> {
    if rows.len() <= limit {
        return rows;
    }

    let picked = match seed {
        Some(seed) => index::sample(&mut StdRng::seed_from_u64(seed), rows.len(), limit),
        None => index::sample(&mut rand::thread_rng(), rows.len(), limit),
    };
    let mut keep = vec![false; rows.len()];
    for i in picked.iter() {
        keep[i] = true;
    }

    let mut kept: Vec<Observation> = rows
        .into_iter()
        .zip(keep)
        .filter_map(|(row, keep)| keep.then_some(row))
        .collect();
    kept.sort_by_key(|row| row.time);
    kept
}

/// Data-server link for one dataset, site and window in the given format.
fn data_url(info: &DatasetInfo, extension: &str, variables: &[String], site: &SiteCode, window: &TimeWindow) -> String {
    format!(
        "{}.{}?{},site_code,time&time>={}&time<={}&site_code=\"{}\"",
        info.url,
        extension,
        variables.join(","),
        window.start_date(),
        window.end_date(),
        site
    )
}

fn download_row(info: &DatasetInfo, variables: &[String], site: &SiteCode, window: &TimeWindow) -> DownloadRow {
    DownloadRow {
        title: format!("{} at {}", info.title, site),
        erddap: info.url.clone(),
        html: data_url(info, "htmlTable", variables, site, window),
        csv: data_url(info, "csv", variables, site, window),
        netcdf: data_url(info, "ncCF", variables, site, window),
    }
}

async fn fetch_source(
    store: &dyn DataStore,
    settings: &SearchSettings,
    source: &DatasetId,
    site: &SiteCode,
    variables: &[String],
    window: &TimeWindow,
) -> RepositoryResult<(DatasetInfo, Series)> {
    let info = guarded_query(settings, "dataset_info", || store.dataset_info(source))
        .await
        .map_err(|e| e.with_dataset(source))?;
    let series = guarded_query(settings, "query_raw_series", || {
        store.query_raw_series(source, site, variables, window)
    })
    .await
    .map_err(|e| e.with_dataset(source))?;
    Ok((info, series))
}

/// Message shown instead of a plot when no dataset contributes.
pub fn no_data_message(site: &SiteCode, window: &TimeWindow) -> String {
    format!(
        "No data available at {} for {} to {}",
        site,
        window.start_date(),
        window.end_date()
    )
}

/// Build the stacked plot for the selected platform.
pub async fn build_plot(
    store: &dyn DataStore,
    settings: &SearchSettings,
    request: PlotRequest<'_>,
) -> PlotResponse {
    let site = &request.selection.site_code;
    let window = request.window;
    let sources = request.search.active_sources_for(site);

    if sources.is_empty() {
        info!("Plot: {} has no active datasets in the window", site);
    }

    let fetched: Vec<(DatasetId, Vec<String>, RepositoryResult<(DatasetInfo, Series)>)> =
        stream::iter(sources)
            .map(|source| async move {
                let variables = request.question.variables_for(&source);
                let result = fetch_source(store, settings, &source, site, &variables, window).await;
                (source, variables, result)
            })
            .buffered(settings.worker_limit.max(1))
            .collect()
            .await;

    let mut panels = Vec::new();
    let mut downloads = Vec::new();
    let mut failed_sources = Vec::new();
    let mut title_variables: Vec<String> = Vec::new();

    for (source, variables, result) in fetched {
        let (info, mut series) = match result {
            Ok(found) => found,
            Err(e) => {
                warn!("Plot: skipping {} for {}: {}", source, site, e);
                failed_sources.push(SourceFailure::from_error(&source, "plot", &e));
                continue;
            }
        };

        let raw_len = series.rows.len();
        let subsampled_to = (raw_len > settings.subsample_limit).then_some(settings.subsample_limit);
        if let Some(limit) = subsampled_to {
            info!("Plot: sub-sampling {} rows of {} to {}", raw_len, source, limit);
            series.rows = subsample(std::mem::take(&mut series.rows), limit, settings.subsample_seed);
        }

        let interval_secs = info
            .sampling_interval_secs
            .unwrap_or(settings.default_sampling_interval_secs);
        let interval = Duration::try_seconds(interval_secs).unwrap_or_else(Duration::zero);
        let resampled = resample(&series, interval);

        let mut subtitle = site.to_string();
        if let Some(limit) = subsampled_to {
            subtitle.push_str(&format!(" (timeseries sub-sampled to {} points) ", limit));
        }
        let legend = if panels.is_empty() {
            "legend".to_string()
        } else {
            format!("legend{}", panels.len() + 1)
        };

        for variable in &variables {
            if !title_variables.contains(variable) {
                title_variables.push(variable.clone());
            }
        }
        downloads.push(download_row(&info, &variables, site, window));
        panels.push(PlotPanel {
            source,
            dataset_title: info.title.clone(),
            subtitle,
            legend,
            legend_labels: variables.iter().map(|v| info.label_for(v)).collect(),
            variables,
            subsampled_to,
            series: resampled,
            ticks: select_ticks(window.span(), window.start),
        });
    }

    if panels.is_empty() {
        return PlotResponse {
            title: String::new(),
            message: Some(no_data_message(site, window)),
            panels,
            downloads,
            download_enabled: false,
            query_string: String::new(),
            tick_format_stops: tick_format_stops(),
            failed_sources,
        };
    }

    info!("Plot: {} panels for {}", panels.len(), site);
    PlotResponse {
        title: format!("Plot of {} at {}", title_variables.join(","), site),
        message: None,
        panels,
        downloads,
        download_enabled: true,
        query_string: DeepLink::from_state(window, &request.question.id, request.selection)
            .to_query_string(),
        tick_format_stops: tick_format_stops(),
        failed_sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn rows(n: i64) -> Vec<Observation> {
        let t0 = Utc.with_ymd_and_hms(2005, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| Observation::scalar(t0 + Duration::minutes(i), i as f64))
            .collect()
    }

    #[test]
    fn test_subsample_below_limit_is_identity() {
        let input = rows(10);
        assert_eq!(subsample(input.clone(), 10, None), input);
    }

    #[test]
    fn test_subsample_size_and_order() {
        let out = subsample(rows(1_000), 100, None);
        assert_eq!(out.len(), 100);
        assert!(out.windows(2).all(|w| w[0].time < w[1].time));
    }

    #[test]
    fn test_seeded_subsample_is_reproducible() {
        let a = subsample(rows(500), 50, Some(42));
        let b = subsample(rows(500), 50, Some(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_download_links() {
        let start = Utc.with_ymd_and_hms(2001, 4, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2010, 3, 31, 0, 0, 0).unwrap();
        let info = DatasetInfo::new("ntas", "NTAS Flux", "https://data.example.org/erddap/tabledap/NTAS_flux", start, end);
        let window = TimeWindow::new(start, end).unwrap();
        let row = download_row(&info, &["QNET".to_string(), "QLAT".to_string()], &SiteCode::from("48401"), &window);

        assert_eq!(row.title, "NTAS Flux at 48401");
        assert_eq!(
            row.csv,
            "https://data.example.org/erddap/tabledap/NTAS_flux.csv?QNET,QLAT,site_code,time&time>=2001-04-01&time<=2010-03-31&site_code=\"48401\""
        );
        assert!(row.html.contains("NTAS_flux.htmlTable?"));
        assert!(row.netcdf.contains("NTAS_flux.ncCF?"));
        assert_eq!(row.erddap, info.url);
    }
}
