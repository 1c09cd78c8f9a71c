#![allow(dead_code)]

use chrono::{Duration, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use flux_discovery::config::SearchSettings;
use flux_discovery::db::{DatasetInfo, LocalRepository};
use flux_discovery::models::{Instant, Location};
use flux_discovery::services::Discovery;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// ==================== Fixture ====================

pub const NTAS: &str = "ntas_flux";
pub const STRATUS: &str = "stratus_flux";
pub const PAPA: &str = "papa_met";

pub const CATALOG: &str = r#"{
    "discovery": {
        "heat": {
            "question": "Net heat flux",
            "search": [
                {"short_names": ["QNET", "QLAT"], "join": "or", "datasets": ["ntas_flux", "stratus_flux"]}
            ]
        },
        "wind": {
            "question": "Wind stress",
            "search": [
                {"short_names": ["TAUX", "TAUY"], "join": "and", "datasets": ["ntas_flux", "papa_met"]}
            ]
        }
    }
}"#;

pub fn at(y: i32, m: u32, d: u32) -> Instant {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

/// Three flux datasets with a handful of platforms.
///
/// * `ntas_flux/48401` has QNET only (heat is active under OR, wind is not under AND)
/// * `ntas_flux/48402` has nothing in any window
/// * `stratus_flux/32323` reports zero counts
/// * `papa_met/50001` has both wind components
pub fn seeded_store() -> LocalRepository {
    let repo = LocalRepository::new();

    repo.add_dataset(
        DatasetInfo::new(
            NTAS,
            "NTAS Surface Fluxes",
            "https://data.example.org/erddap/tabledap/NTAS_flux",
            at(2001, 1, 1),
            at(2012, 12, 31),
        )
        .with_unit("QNET", "W/m^2")
        .with_sampling_interval_secs(3600),
    );
    repo.add_dataset(DatasetInfo::new(
        STRATUS,
        "Stratus Surface Fluxes",
        "https://data.example.org/erddap/tabledap/Stratus_flux",
        at(2000, 10, 1),
        at(2015, 6, 30),
    ));
    repo.add_dataset(DatasetInfo::new(
        PAPA,
        "Papa Meteorology",
        "https://data.example.org/erddap/tabledap/Papa_met",
        at(2007, 6, 8),
        at(2020, 12, 31),
    ));

    repo.add_location(NTAS, Location::new("48401", 14.8, -51.0));
    repo.add_location(NTAS, Location::new("48402", 15.0, -50.0));
    repo.add_location(STRATUS, Location::new("32323", -20.0, -85.0));
    repo.add_location(PAPA, Location::new("50001", 50.1, -144.9));

    repo.add_counts(
        NTAS,
        "48401",
        at(2005, 6, 1),
        &[("QNET", 12.0), ("QLAT", 0.0), ("TAUX", 5.0), ("TAUY", 0.0)],
    );
    repo.add_counts(STRATUS, "32323", at(2003, 3, 1), &[("QNET", 0.0), ("QLAT", 0.0)]);
    repo.add_counts(PAPA, "50001", at(2009, 5, 1), &[("TAUX", 3.0), ("TAUY", 4.0)]);

    // Six hourly rows, a gap, then four more.
    for hour in (0..6).chain(20..24) {
        repo.add_observation(
            NTAS,
            "48401",
            at(2005, 6, 1) + Duration::hours(hour),
            &[("QNET", 100.0 + hour as f64), ("QLAT", -40.0)],
        );
    }

    repo
}

pub fn fast_settings() -> SearchSettings {
    SearchSettings {
        query_timeout_ms: 1_000,
        retry_delay_ms: 1,
        subsample_seed: Some(7),
        ..SearchSettings::default()
    }
}

pub async fn discovery_with(repo: LocalRepository, settings: SearchSettings) -> Discovery {
    Discovery::bootstrap(Arc::new(repo), CATALOG, settings)
        .await
        .expect("fixture discovery should bootstrap")
}
