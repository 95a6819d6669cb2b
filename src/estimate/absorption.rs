use anyhow::Result;
use geo::{Area, Geometry};
use serde::{Deserialize, Serialize};

use crate::geometry::FlatCoords;

/// Carbon absorbed per hectare of qualifying land, tons
pub const ABSORPTION_PER_HECTARE: f64 = 6.9;

pub const SQM_PER_HECTARE: f64 = 10_000.0;

/// Development-restricted area (greenbelt)
pub const DEVELOPMENT_RESTRICTED_ZONE: &str = "개발제한구역";
/// Natural green area
pub const NATURAL_GREEN_ZONE: &str = "자연녹지지역";

/// Which parcels earn absorption credit, and at what rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbsorptionSettings {
    pub qualifying_zones: Vec<String>,
    pub tons_per_hectare: f64,
}

impl Default for AbsorptionSettings {
    fn default() -> Self {
        Self {
            qualifying_zones: vec![
                DEVELOPMENT_RESTRICTED_ZONE.to_string(),
                NATURAL_GREEN_ZONE.to_string(),
            ],
            tons_per_hectare: ABSORPTION_PER_HECTARE,
        }
    }
}

impl AbsorptionSettings {
    pub fn qualifies(&self, zone: Option<&str>) -> bool {
        zone.is_some_and(|z| self.qualifying_zones.iter().any(|q| q == z))
    }
}

/// Land parcel as read from the zoning file, geometry in metres
#[derive(Debug, Clone)]
pub struct RawParcel {
    pub index: usize,
    pub zone: Option<String>,
    pub geometry: Option<Geometry<f64>>,
}

/// A qualifying parcel with its absorption estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parcel {
    pub index: usize,
    pub zone: String,
    pub area_sqm: f64,
    pub area_ha: f64,
    pub absorption: f64,
    #[serde(flatten)]
    pub coords: FlatCoords,
}

/// Keep qualifying parcels and compute their absorption
///
/// Non-qualifying parcels are dropped. `shape` is only called for kept
/// parcels and supplies their render coordinates.
pub fn estimate_absorption<F>(
    parcels: Vec<RawParcel>,
    settings: &AbsorptionSettings,
    mut shape: F,
) -> Result<Vec<Parcel>>
where
    F: FnMut(&RawParcel) -> Result<FlatCoords>,
{
    let mut kept = Vec::new();

    for raw in parcels {
        if !settings.qualifies(raw.zone.as_deref()) {
            continue;
        }

        let coords = shape(&raw)?;
        let area_sqm = raw.geometry.as_ref().map(|g| g.unsigned_area()).unwrap_or(0.0);
        let area_ha = area_sqm / SQM_PER_HECTARE;

        kept.push(Parcel {
            index: raw.index,
            zone: raw.zone.unwrap_or_default(),
            area_sqm,
            area_ha,
            absorption: area_ha * settings.tons_per_hectare,
            coords,
        });
    }

    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::flatten;
    use geo::{polygon, MultiPolygon};

    fn rect(w: f64, h: f64) -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: w, y: 0.0),
            (x: w, y: h),
            (x: 0.0, y: h),
            (x: 0.0, y: 0.0),
        ])
    }

    fn parcel(index: usize, zone: Option<&str>, geometry: Option<Geometry<f64>>) -> RawParcel {
        RawParcel {
            index,
            zone: zone.map(str::to_string),
            geometry,
        }
    }

    fn shape(raw: &RawParcel) -> Result<FlatCoords> {
        Ok(raw.geometry.as_ref().and_then(flatten).unwrap_or_default())
    }

    #[test]
    fn test_filters_and_estimates() {
        let parcels = vec![
            parcel(0, Some(NATURAL_GREEN_ZONE), Some(rect(200.0, 100.0))),
            parcel(1, Some("제2종일반주거지역"), Some(rect(500.0, 500.0))),
            parcel(2, Some(DEVELOPMENT_RESTRICTED_ZONE), Some(rect(1000.0, 30.0))),
            parcel(3, None, Some(rect(10.0, 10.0))),
        ];

        let kept = estimate_absorption(parcels, &AbsorptionSettings::default(), shape).unwrap();

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].index, 0);
        assert_eq!(kept[0].area_sqm, 20_000.0);
        assert_eq!(kept[0].area_ha, 2.0);
        assert_eq!(kept[0].absorption, (20_000.0 / 10_000.0) * 6.9);
        assert_eq!(kept[0].coords.len(), 5);

        assert_eq!(kept[1].index, 2);
        assert_eq!(kept[1].zone, DEVELOPMENT_RESTRICTED_ZONE);
        assert_eq!(kept[1].absorption, (30_000.0 / 10_000.0) * 6.9);
    }

    #[test]
    fn test_multipolygon_area_sums_members() {
        let multi = Geometry::MultiPolygon(MultiPolygon(vec![
            match rect(100.0, 100.0) {
                Geometry::Polygon(p) => p,
                _ => unreachable!(),
            },
            polygon![(x: 500.0, y: 0.0), (x: 600.0, y: 0.0), (x: 600.0, y: 100.0), (x: 500.0, y: 0.0)],
        ]));

        let kept = estimate_absorption(
            vec![parcel(0, Some(NATURAL_GREEN_ZONE), Some(multi))],
            &AbsorptionSettings::default(),
            shape,
        )
        .unwrap();

        assert_eq!(kept[0].area_sqm, 15_000.0);
        assert_eq!(kept[0].coords.separators(), 1);
    }

    #[test]
    fn test_shape_only_called_for_kept_parcels() {
        let parcels = vec![
            parcel(0, Some("공업지역"), None),
            parcel(1, Some(NATURAL_GREEN_ZONE), None),
        ];
        let mut calls = Vec::new();
        let kept = estimate_absorption(parcels, &AbsorptionSettings::default(), |p| {
            calls.push(p.index);
            Ok(FlatCoords::default())
        })
        .unwrap();

        assert_eq!(calls, vec![1]);
        assert_eq!(kept[0].area_sqm, 0.0);
        assert_eq!(kept[0].absorption, 0.0);
    }

    #[test]
    fn test_custom_settings() {
        let settings = AbsorptionSettings {
            qualifying_zones: vec!["park".to_string()],
            tons_per_hectare: 10.0,
        };
        assert!(settings.qualifies(Some("park")));
        assert!(!settings.qualifies(Some(NATURAL_GREEN_ZONE)));
        assert!(!settings.qualifies(None));
    }
}
