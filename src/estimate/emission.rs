use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::factors::{EmissionFactors, FALLBACK_CATEGORY};
use crate::geometry::FlatCoords;

/// Age adjustment when the construction year is unknown (same as pre-2000)
pub const MISSING_YEAR_ADJUSTMENT: f64 = 0.015;
pub const PRE_2000_ADJUSTMENT: f64 = 0.015;
pub const YEARS_2000S_ADJUSTMENT: f64 = 0.01;
pub const POST_2010_ADJUSTMENT: f64 = 0.005;

/// Upper bound (exclusive) of the green tier, in tons
pub const GREEN_TIER_LIMIT: f64 = 100.0;
/// Upper bound (exclusive) of the red tier, in tons
pub const RED_TIER_LIMIT: f64 = 250.0;

/// Emission band used for categorical display
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UsageTier {
    #[serde(rename = "Green Usage")]
    Green,
    #[serde(rename = "Red Usage")]
    Red,
    #[serde(rename = "Black Usage")]
    Black,
}

impl UsageTier {
    pub const ALL: [UsageTier; 3] = [UsageTier::Green, UsageTier::Red, UsageTier::Black];

    /// Classify an emission value. NaN falls through to `Black`.
    pub fn classify(emissions: f64) -> Self {
        if emissions < GREEN_TIER_LIMIT {
            UsageTier::Green
        } else if emissions < RED_TIER_LIMIT {
            UsageTier::Red
        } else {
            UsageTier::Black
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UsageTier::Green => "Green Usage",
            UsageTier::Red => "Red Usage",
            UsageTier::Black => "Black Usage",
        }
    }
}

impl fmt::Display for UsageTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Building attributes as read from the footprint file
#[derive(Debug, Clone, Default)]
pub struct RawBuilding {
    pub index: usize,
    pub category: Option<String>,
    pub gross_area: f64,
    pub floors_above: f64,
    pub floors_below: f64,
    pub construction_date: Option<String>,
    pub coords: FlatCoords,
}

/// A building with its derived emission fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Building {
    pub index: usize,
    pub category: String,
    pub gross_area: f64,
    pub floors_above: f64,
    pub floors_below: f64,
    pub construction_year: Option<i32>,
    pub total_floors: f64,
    pub proportional_area: f64,
    pub age_adjustment: f64,
    pub coefficient: f64,
    pub emissions: f64,
    pub usage_tier: UsageTier,
    pub green_roof: bool,
    #[serde(flatten)]
    pub coords: FlatCoords,
}

/// Buildings together with the mapping used to estimate them
#[derive(Debug, Clone)]
pub struct BuildingSet {
    pub buildings: Vec<Building>,
    pub factors: EmissionFactors,
}

impl BuildingSet {
    pub fn total_emissions(&self) -> f64 {
        self.buildings.iter().map(|b| b.emissions).sum()
    }
}

/// Age adjustment for a construction year
pub fn age_adjustment(year: Option<i32>) -> f64 {
    match year {
        None => MISSING_YEAR_ADJUSTMENT,
        Some(y) if y < 2000 => PRE_2000_ADJUSTMENT,
        Some(y) if y < 2010 => YEARS_2000S_ADJUSTMENT,
        Some(_) => POST_2010_ADJUSTMENT,
    }
}

/// Load-time emission formula
pub fn emissions_for(proportional_area: f64, coefficient: f64, adjustment: f64) -> f64 {
    proportional_area * coefficient * (1.0 + adjustment)
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d", "%Y.%m.%d"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y%m%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

/// Extract the year from a construction-date string, `None` if unparseable
pub fn parse_year(text: &str) -> Option<i32> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    // numeric values read as floats, e.g. "19980512.0"
    let text = text.strip_suffix(".0").unwrap_or(text);

    // bare year, e.g. "1998"
    if text.len() == 4 && text.bytes().all(|b| b.is_ascii_digit()) {
        return text.parse().ok();
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
        .map(|date| date.year())
}

/// Compute the derived emission fields for one building
pub fn estimate_building(raw: RawBuilding, factors: &EmissionFactors) -> Building {
    let category = raw
        .category
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_CATEGORY.to_string());
    let construction_year = raw.construction_date.as_deref().and_then(parse_year);

    let total_floors = raw.floors_above + raw.floors_below;
    let proportional_area = raw.gross_area * total_floors;
    let adjustment = age_adjustment(construction_year);
    let coefficient = factors.coefficient(&category);
    let emissions = emissions_for(proportional_area, coefficient, adjustment);

    Building {
        index: raw.index,
        category,
        gross_area: raw.gross_area,
        floors_above: raw.floors_above,
        floors_below: raw.floors_below,
        construction_year,
        total_floors,
        proportional_area,
        age_adjustment: adjustment,
        coefficient,
        emissions,
        usage_tier: UsageTier::classify(emissions),
        green_roof: false,
        coords: raw.coords,
    }
}

/// Estimate every building and hand the mapping back for later recomputation
pub fn assign_emissions(records: Vec<RawBuilding>, factors: EmissionFactors) -> BuildingSet {
    let buildings = records
        .into_iter()
        .map(|raw| estimate_building(raw, &factors))
        .collect();

    BuildingSet { buildings, factors }
}
