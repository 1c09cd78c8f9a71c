use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{PlatformColor, PlatformStatus, Selection, SiteCode};
use crate::services::availability::SearchOutcome;

// =========================================================
// Map types + route
// =========================================================

pub const PLATFORM_MARKER_SIZE: u32 = 10;
pub const SELECTED_MARKER_SIZE: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapCenter {
    pub lat: f64,
    pub lon: f64,
}

/// Camera position of the platform map, kept across redraws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: MapCenter,
    pub zoom: f64,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: MapCenter { lat: 0.0, lon: 0.0 },
            zoom: 1.4,
        }
    }
}

impl MapView {
    /// View after a map relayout event. Keys the event does not carry fall
    /// back to the default view.
    pub fn from_relayout(payload: &Value) -> Self {
        let mut view = Self::default();
        if let Some(center) = payload
            .get("map.center")
            .and_then(|c| serde_json::from_value::<MapCenter>(c.clone()).ok())
        {
            view.center = center;
        }
        if let Some(zoom) = payload.get("map.zoom").and_then(Value::as_f64) {
            view.zoom = zoom;
        }
        view
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub site_code: SiteCode,
    pub latitude: f64,
    pub longitude: f64,
    pub color: String,
    pub size: u32,
}

impl MapMarker {
    fn platform(status: &PlatformStatus) -> Self {
        Self {
            site_code: status.site_code.clone(),
            latitude: status.latitude,
            longitude: status.longitude,
            color: status.color.css().to_string(),
            size: PLATFORM_MARKER_SIZE,
        }
    }

    fn selected(selection: &Selection) -> Self {
        Self {
            site_code: selection.site_code.clone(),
            latitude: selection.latitude,
            longitude: selection.longitude,
            color: PlatformColor::Selected.css().to_string(),
            size: SELECTED_MARKER_SIZE,
        }
    }
}

/// Marker layers in drawing order: inactive, active, then the highlight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapLayers {
    pub inactive: Vec<MapMarker>,
    pub active: Vec<MapMarker>,
    pub selected: Option<MapMarker>,
    pub view: MapView,
}

pub const GET_MAP_LAYERS: &str = "get_map_layers";

pub fn build_map_layers(
    outcome: &SearchOutcome,
    selection: Option<&Selection>,
    view: MapView,
) -> MapLayers {
    MapLayers {
        inactive: outcome.inactive.iter().map(MapMarker::platform).collect(),
        active: outcome.active.iter().map(MapMarker::platform).collect(),
        selected: selection.map(MapMarker::selected),
        view,
    }
}

/// Selection from a map click: the first clicked point's site code and position.
pub fn selection_from_click(payload: &Value) -> Option<Selection> {
    let point = payload.get("points")?.get(0)?;
    let site = match point.get("customdata")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let lat = point.get("lat")?.as_f64()?;
    let lon = point.get("lon")?.as_f64()?;
    Some(Selection::new(site, lat, lon))
}
