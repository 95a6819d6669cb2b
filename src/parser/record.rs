use geojson::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::estimate::{RawBuilding, RawParcel};
use crate::geometry::{FlatCoords, GeoFeature};

/// Property names in the building-footprint file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingFields {
    pub category: String,
    pub area: String,
    pub floors_above: String,
    pub floors_below: String,
    pub construction_date: String,
}

impl Default for BuildingFields {
    fn default() -> Self {
        Self {
            category: "A9".to_string(),
            area: "A12".to_string(),
            floors_above: "A26".to_string(),
            floors_below: "A27".to_string(),
            construction_date: "A13".to_string(),
        }
    }
}

/// Property names in the zoning file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParcelFields {
    pub zone: String,
}

impl Default for ParcelFields {
    fn default() -> Self {
        Self {
            zone: "A14".to_string(),
        }
    }
}

/// Read building attributes from a feature's properties
///
/// Never fails: absent or malformed values become `None` / `0.0` and are
/// handled by the estimator's fallbacks.
pub fn parse_building(feature: &GeoFeature, fields: &BuildingFields, coords: FlatCoords) -> RawBuilding {
    let props = &feature.properties;

    RawBuilding {
        index: feature.index,
        category: extract_text(props, &fields.category),
        gross_area: extract_number(props, &fields.area),
        floors_above: extract_number(props, &fields.floors_above),
        floors_below: extract_number(props, &fields.floors_below),
        construction_date: extract_text(props, &fields.construction_date),
        coords,
    }
}

/// Read the zoning category of a parcel; the geometry moves into the record
pub fn parse_parcel(feature: GeoFeature, fields: &ParcelFields) -> RawParcel {
    RawParcel {
        index: feature.index,
        zone: extract_text(&feature.properties, &fields.zone),
        geometry: feature.geometry,
    }
}

fn extract_text(props: &JsonObject, key: &str) -> Option<String> {
    match props.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(v) => Some(v.to_string()),
    }
}

fn extract_number(props: &JsonObject, key: &str) -> f64 {
    let value = match props.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    value.filter(|v: &f64| v.is_finite()).unwrap_or(0.0)
}
