//! Platforms, their availability status and the current selection.

use serde::{Deserialize, Serialize};

use super::catalog::DatasetId;

crate::define_key_type!(SiteCode);

/// A fixed monitoring site as known by one data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub site_code: SiteCode,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(site_code: impl Into<SiteCode>, latitude: f64, longitude: f64) -> Self {
        Self {
            site_code: site_code.into(),
            latitude,
            longitude,
        }
    }
}

/// Marker color assigned to a platform on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformColor {
    HasData,
    Empty,
    Selected,
}

impl PlatformColor {
    /// Color value handed to the map renderer.
    pub fn css(&self) -> &'static str {
        match self {
            Self::HasData => "black",
            Self::Empty => "#AAAAAA",
            Self::Selected => "yellow",
        }
    }
}

/// Derived availability of one platform at one source.
///
/// Recomputed wholesale by every search; `(site_code, source)` is the dedup key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformStatus {
    pub site_code: SiteCode,
    pub latitude: f64,
    pub longitude: f64,
    pub source: DatasetId,
    pub has_data: bool,
    pub color: PlatformColor,
}

impl PlatformStatus {
    pub fn from_location(location: &Location, source: &DatasetId, has_data: bool) -> Self {
        Self {
            site_code: location.site_code.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
            source: source.clone(),
            has_data,
            color: if has_data {
                PlatformColor::HasData
            } else {
                PlatformColor::Empty
            },
        }
    }

    pub fn key(&self) -> (DatasetId, SiteCode) {
        (self.source.clone(), self.site_code.clone())
    }
}

/// The currently focused platform; replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub site_code: SiteCode,
    pub latitude: f64,
    pub longitude: f64,
}

impl Selection {
    pub fn new(site_code: impl Into<SiteCode>, latitude: f64, longitude: f64) -> Self {
        Self {
            site_code: site_code.into(),
            latitude,
            longitude,
        }
    }
}

impl From<&PlatformStatus> for Selection {
    fn from(status: &PlatformStatus) -> Self {
        Self {
            site_code: status.site_code.clone(),
            latitude: status.latitude,
            longitude: status.longitude,
        }
    }
}
