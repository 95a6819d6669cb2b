//! One-shot load of every dashboard input and all derived columns

use anyhow::{bail, Result};
use geo::Geometry;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::config::Config;
use crate::estimate::{
    assign_emissions, estimate_absorption, BuildingSet, EmissionFactors, Parcel, FALLBACK_CATEGORY,
};
use crate::geometry::{flatten, geometry_kind, read_features, FlatCoords, GeometryPolicy};
use crate::parser::{
    parse_building, parse_parcel, read_climate_scenario, read_population_ratios, ClimateScenario,
    PopulationRatio,
};
use crate::scenario::{ReassignPolicy, Scenario, TierCounts};
use crate::ui::{Phase, Totals, Ui};

/// Category value excluded from the reassignment menu
const NULL_CATEGORY: &str = "NULL";

/// Buildings estimated between progress updates
const PROGRESS_STEP: usize = 1000;

/// Lower and upper bound of a value column, for colour scales
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// Range of the finite values, `None` when there are none
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |range, v| match range {
                None => Some(ValueRange { min: v, max: v }),
                Some(r) => Some(ValueRange {
                    min: r.min.min(v),
                    max: r.max.max(v),
                }),
            })
    }
}

/// Every record the presentation layer consumes, computed once
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub buildings: BuildingSet,
    pub parcels: Vec<Parcel>,
    pub population: Vec<PopulationRatio>,
    pub climate: Vec<ClimateScenario>,
}

impl Dashboard {
    pub fn total_emissions(&self) -> f64 {
        self.buildings.total_emissions()
    }

    pub fn total_absorption(&self) -> f64 {
        self.parcels.iter().map(|p| p.absorption).sum()
    }

    pub fn tier_counts(&self) -> TierCounts {
        TierCounts::from_emissions(self.buildings.buildings.iter().map(|b| b.emissions))
    }

    /// Sorted unique building categories offered for reassignment
    pub fn category_menu(&self) -> Vec<String> {
        self.buildings
            .buildings
            .iter()
            .map(|b| b.category.as_str())
            .filter(|c| *c != NULL_CATEGORY)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn emission_range(&self) -> Option<ValueRange> {
        ValueRange::of(self.buildings.buildings.iter().map(|b| b.emissions))
    }

    pub fn absorption_range(&self) -> Option<ValueRange> {
        ValueRange::of(self.parcels.iter().map(|p| p.absorption))
    }

    pub fn totals(&self) -> Totals {
        Totals {
            emissions: self.total_emissions(),
            absorption: self.total_absorption(),
            tiers: self.tier_counts(),
        }
    }

    /// Start an editing session on a copy of the buildings
    pub fn scenario(&self, policy: ReassignPolicy) -> Scenario {
        Scenario::new(&self.buildings, policy)
    }
}

/// Read all inputs and compute the derived records
pub fn load_dashboard(config: &Config, factors: EmissionFactors, ui: &mut impl Ui) -> Result<Dashboard> {
    ui.set_phase(Phase::Loading);

    ui.set_info(format!("Reading {:?}", config.buildings.path));
    let building_features = read_features(
        &config.buildings.path,
        &config.buildings.encoding,
        config.buildings.crs,
    )?;
    ui.log(format!("{} building features", building_features.len()));

    ui.set_info(format!("Reading {:?}", config.parcels.path));
    let parcel_features = read_features(
        &config.parcels.path,
        &config.parcels.encoding,
        config.parcels.crs,
    )?;
    ui.log(format!("{} parcel features", parcel_features.len()));

    let population = read_population_ratios(&config.population)?;
    ui.log(format!("{} population ratio rows", population.len()));

    let climate = config
        .climate
        .iter()
        .map(|input| read_climate_scenario(&input.name, &input.path))
        .collect::<Result<Vec<_>>>()?;
    for scenario in &climate {
        ui.log(format!("{}: {} climate rows", scenario.name, scenario.rows.len()));
    }

    ui.set_phase(Phase::Estimating);

    let total = building_features.len() as u64;
    let mut raw_buildings = Vec::with_capacity(building_features.len());
    for (i, feature) in building_features.iter().enumerate() {
        let coords = shape(
            "building",
            feature.index,
            feature.geometry.as_ref(),
            config.geometry_policy,
            ui,
        )?;
        raw_buildings.push(parse_building(feature, &config.buildings.fields, coords));
        if should_report(i + 1, building_features.len()) {
            ui.set_progress(i as u64 + 1, total, "Buildings");
        }
    }
    ui.clear_progress();

    let missing_category = raw_buildings.iter().filter(|b| b.category.is_none()).count();
    if missing_category > 0 {
        ui.log(format!(
            "{} buildings without a usage category, using {}",
            missing_category, FALLBACK_CATEGORY
        ));
    }

    let buildings = assign_emissions(raw_buildings, factors);
    let unknown = buildings
        .buildings
        .iter()
        .filter(|b| !buildings.factors.contains(&b.category))
        .count();
    if unknown > 0 {
        ui.log(format!("{} buildings with a category missing from the factor table", unknown));
    }

    let raw_parcels = parcel_features
        .into_iter()
        .map(|f| parse_parcel(f, &config.parcels.fields))
        .collect::<Vec<_>>();
    let parcel_count = raw_parcels.len();
    let policy = config.geometry_policy;
    let parcels = estimate_absorption(raw_parcels, &config.absorption, |p| {
        shape("parcel", p.index, p.geometry.as_ref(), policy, ui)
    })?;
    ui.log(format!(
        "{} of {} parcels in qualifying zones",
        parcels.len(),
        parcel_count
    ));

    let dashboard = Dashboard {
        buildings,
        parcels,
        population,
        climate,
    };
    ui.set_totals(dashboard.totals());
    Ok(dashboard)
}

fn should_report(done: usize, total: usize) -> bool {
    done % PROGRESS_STEP == 0 || done == total
}

/// Render coordinates for a feature, applying the geometry policy
fn shape(
    layer: &str,
    index: usize,
    geometry: Option<&Geometry<f64>>,
    policy: GeometryPolicy,
    ui: &mut impl Ui,
) -> Result<FlatCoords> {
    let kind = match geometry {
        Some(geometry) => match flatten(geometry) {
            Some(coords) => return Ok(coords),
            None => geometry_kind(geometry),
        },
        None => "empty",
    };

    match policy {
        GeometryPolicy::Strict => {
            bail!("Unsupported {} geometry in {} feature {}", kind, layer, index)
        }
        GeometryPolicy::Skip => {
            ui.log(format!(
                "Skipping {} geometry in {} feature {}",
                kind, layer, index
            ));
            Ok(FlatCoords::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::RawBuilding;
    use crate::ui::RecordingUi;
    use geo::point;

    fn dashboard(categories: &[Option<&str>]) -> Dashboard {
        let raws = categories
            .iter()
            .enumerate()
            .map(|(i, c)| RawBuilding {
                index: i,
                category: c.map(str::to_string),
                gross_area: 100.0 * (i + 1) as f64,
                floors_above: 1.0,
                ..Default::default()
            })
            .collect();

        Dashboard {
            buildings: assign_emissions(raws, EmissionFactors::standard()),
            parcels: Vec::new(),
            population: Vec::new(),
            climate: Vec::new(),
        }
    }

    #[test]
    fn test_category_menu() {
        let d = dashboard(&[Some("판매시설"), Some("NULL"), None, Some("공장"), Some("공장")]);
        assert_eq!(d.category_menu(), vec!["공장", "기타", "판매시설"]);
    }

    #[test]
    fn test_ranges() {
        let d = dashboard(&[Some("공장"), Some("공장")]);
        let range = d.emission_range().unwrap();
        assert!((range.min - 100.0 * 0.065 * 1.015).abs() < 1e-9);
        assert!((range.max - 200.0 * 0.065 * 1.015).abs() < 1e-9);
        assert!(d.absorption_range().is_none());
        assert_eq!(ValueRange::of([f64::NAN, 2.0, -1.0]), Some(ValueRange { min: -1.0, max: 2.0 }));
    }

    #[test]
    fn test_scenario_starts_from_dashboard() {
        let d = dashboard(&[Some("공장"), None]);
        let scenario = d.scenario(ReassignPolicy::default());
        assert_eq!(scenario.summary().total_emissions, d.total_emissions());
        assert_eq!(scenario.summary().tier_counts, d.tier_counts());
    }

    #[test]
    fn test_progress_throttled() {
        let reports: Vec<usize> = (1..=2500).filter(|&n| should_report(n, 2500)).collect();
        assert_eq!(reports, vec![1000, 2000, 2500]);
        assert!(should_report(3, 3));
        assert!(!should_report(2, 3));
    }

    #[test]
    fn test_shape_policy() {
        let point = Geometry::Point(point!(x: 1.0, y: 1.0));
        let mut ui = RecordingUi::default();

        let coords = shape("building", 4, Some(&point), GeometryPolicy::Skip, &mut ui).unwrap();
        assert!(coords.is_empty());
        assert_eq!(ui.messages, vec!["Skipping Point geometry in building feature 4"]);

        let err = shape("parcel", 2, None, GeometryPolicy::Strict, &mut ui).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported empty geometry in parcel feature 2");
    }
}
