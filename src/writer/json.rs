use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::dataset::{Dashboard, ValueRange};
use crate::estimate::{EmissionFactors, UsageTier};
use crate::parser::{ClimateScenario, PopulationRatio};
use crate::scenario::TierCounts;
use crate::ui::{Phase, Ui};

/// Column-oriented building data, one entry per building
#[derive(Debug, Serialize)]
pub struct BuildingColumns<'a> {
    pub x: Vec<&'a [Option<f64>]>,
    pub y: Vec<&'a [Option<f64>]>,
    pub emissions: Vec<f64>,
    pub name: Vec<&'a str>,
    pub proportional_area: Vec<f64>,
    pub green_roof: Vec<bool>,
    pub usage_tier: Vec<UsageTier>,
}

/// Column-oriented absorption data, one entry per qualifying parcel
#[derive(Debug, Serialize)]
pub struct AbsorptionColumns<'a> {
    pub x: Vec<&'a [Option<f64>]>,
    pub y: Vec<&'a [Option<f64>]>,
    pub carbon_absorption: Vec<f64>,
    pub name: Vec<&'a str>,
}

/// Everything a map/chart front-end needs, borrowed from a `Dashboard`
#[derive(Debug, Serialize)]
pub struct PresentationData<'a> {
    pub buildings: BuildingColumns<'a>,
    pub emission_mapping: &'a EmissionFactors,
    pub absorption: AbsorptionColumns<'a>,
    pub population: &'a [PopulationRatio],
    pub climate: &'a [ClimateScenario],
    pub total_emissions: f64,
    pub total_emissions_label: String,
    pub total_absorption: f64,
    pub tier_counts: TierCounts,
    pub emission_range: Option<ValueRange>,
    pub absorption_range: Option<ValueRange>,
    pub category_menu: Vec<String>,
}

impl<'a> PresentationData<'a> {
    pub fn new(dashboard: &'a Dashboard) -> Self {
        let buildings = &dashboard.buildings.buildings;
        let parcels = &dashboard.parcels;
        let total_emissions = dashboard.total_emissions();

        Self {
            buildings: BuildingColumns {
                x: buildings.iter().map(|b| b.coords.xs.as_slice()).collect(),
                y: buildings.iter().map(|b| b.coords.ys.as_slice()).collect(),
                emissions: buildings.iter().map(|b| b.emissions).collect(),
                name: buildings.iter().map(|b| b.category.as_str()).collect(),
                proportional_area: buildings.iter().map(|b| b.proportional_area).collect(),
                green_roof: buildings.iter().map(|b| b.green_roof).collect(),
                usage_tier: buildings.iter().map(|b| b.usage_tier).collect(),
            },
            emission_mapping: &dashboard.buildings.factors,
            absorption: AbsorptionColumns {
                x: parcels.iter().map(|p| p.coords.xs.as_slice()).collect(),
                y: parcels.iter().map(|p| p.coords.ys.as_slice()).collect(),
                carbon_absorption: parcels.iter().map(|p| p.absorption).collect(),
                name: parcels.iter().map(|p| p.zone.as_str()).collect(),
            },
            population: &dashboard.population,
            climate: &dashboard.climate,
            total_emissions,
            total_emissions_label: format!("Total Carbon Emissions: {:.2} units", total_emissions),
            total_absorption: dashboard.total_absorption(),
            tier_counts: dashboard.tier_counts(),
            emission_range: dashboard.emission_range(),
            absorption_range: dashboard.absorption_range(),
            category_menu: dashboard.category_menu(),
        }
    }
}

/// Write the presentation data as JSON
pub fn export_to_json(dashboard: &Dashboard, output: &Path, pretty: bool, ui: &mut impl Ui) -> Result<()> {
    ui.set_phase(Phase::Exporting);
    ui.set_info(format!("Writing {:?}", output));

    let data = PresentationData::new(dashboard);
    let file = std::fs::File::create(output)
        .with_context(|| format!("Failed to create: {:?}", output))?;
    let mut writer = std::io::BufWriter::new(file);

    if pretty {
        serde_json::to_writer_pretty(&mut writer, &data)
    } else {
        serde_json::to_writer(&mut writer, &data)
    }
    .with_context(|| format!("Failed to write JSON: {:?}", output))?;
    writer.flush()?;

    ui.log(format!(
        "{} buildings, {} parcels",
        data.buildings.emissions.len(),
        data.absorption.carbon_absorption.len()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::{assign_emissions, Parcel, RawBuilding};
    use crate::geometry::FlatCoords;
    use serde_json::json;

    #[test]
    fn test_presentation_columns() {
        let buildings = assign_emissions(
            vec![RawBuilding {
                category: Some("공동주택".to_string()),
                gross_area: 100.0,
                floors_above: 2.0,
                floors_below: 1.0,
                construction_date: Some("2015-06-01".to_string()),
                coords: FlatCoords {
                    xs: vec![Some(0.0), Some(1.0), None, Some(5.0)],
                    ys: vec![Some(0.0), Some(1.0), None, Some(5.0)],
                },
                ..Default::default()
            }],
            EmissionFactors::standard(),
        );
        let dashboard = Dashboard {
            buildings,
            parcels: vec![Parcel {
                index: 0,
                zone: "개발제한구역".to_string(),
                area_sqm: 20_000.0,
                area_ha: 2.0,
                absorption: 13.8,
                coords: FlatCoords::default(),
            }],
            population: Vec::new(),
            climate: Vec::new(),
        };

        let value = serde_json::to_value(PresentationData::new(&dashboard)).unwrap();

        assert_eq!(value["buildings"]["x"], json!([[0.0, 1.0, null, 5.0]]));
        assert_eq!(value["buildings"]["name"], json!(["공동주택"]));
        assert_eq!(value["buildings"]["usage_tier"], json!(["Green Usage"]));
        assert_eq!(value["buildings"]["green_roof"], json!([false]));
        assert_eq!(value["emission_mapping"]["의료시설"], json!(0.123));
        assert_eq!(value["absorption"]["carbon_absorption"], json!([13.8]));
        assert_eq!(value["total_emissions_label"], "Total Carbon Emissions: 24.12 units");
        assert_eq!(value["tier_counts"]["Green Usage"], 1);
        assert_eq!(value["absorption_range"], json!({"min": 13.8, "max": 13.8}));
        assert_eq!(value["category_menu"], json!(["공동주택"]));
    }
}
