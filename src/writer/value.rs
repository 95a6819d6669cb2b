use anyhow::{Context, Result};
use serde::Serialize;

use crate::dataset::Dashboard;
use crate::estimate::{Building, Parcel};
use crate::geometry::FlatCoords;

/// A single column value ready for binding
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    pub fn bind_to(&self, idx: usize, stmt: &mut rusqlite::Statement) -> rusqlite::Result<()> {
        match self {
            SqlValue::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null)?,
            SqlValue::Integer(i) => stmt.raw_bind_parameter(idx, i)?,
            SqlValue::Real(f) => stmt.raw_bind_parameter(idx, f)?,
            SqlValue::Text(s) => stmt.raw_bind_parameter(idx, s.as_str())?,
        }
        Ok(())
    }

    fn real(value: f64) -> Self {
        if value.is_finite() {
            SqlValue::Real(value)
        } else {
            SqlValue::Null
        }
    }

    fn optional_real(value: Option<f64>) -> Self {
        value.map_or(SqlValue::Null, SqlValue::real)
    }

    fn boolean(value: bool) -> Self {
        SqlValue::Integer(if value { 1 } else { 0 })
    }

    fn json(value: &impl Serialize) -> Result<Self> {
        let text = serde_json::to_string(value).context("Failed to serialize column")?;
        Ok(SqlValue::Text(text))
    }
}

/// A row in column order of its table schema
pub type SqlRow = Vec<SqlValue>;

fn coord_columns(coords: &FlatCoords) -> Result<[SqlValue; 2]> {
    Ok([SqlValue::json(&coords.xs)?, SqlValue::json(&coords.ys)?])
}

pub fn emission_factor_rows(dashboard: &Dashboard) -> Vec<SqlRow> {
    dashboard
        .buildings
        .factors
        .iter()
        .map(|(category, coefficient)| {
            vec![SqlValue::Text(category.to_string()), SqlValue::Real(coefficient)]
        })
        .collect()
}

pub fn building_row(b: &Building) -> Result<SqlRow> {
    let [xs, ys] = coord_columns(&b.coords)?;
    Ok(vec![
        SqlValue::Integer(b.index as i64),
        SqlValue::Text(b.category.clone()),
        SqlValue::real(b.gross_area),
        SqlValue::real(b.floors_above),
        SqlValue::real(b.floors_below),
        b.construction_year
            .map(|y| SqlValue::Integer(y as i64))
            .unwrap_or(SqlValue::Null),
        SqlValue::real(b.total_floors),
        SqlValue::real(b.proportional_area),
        SqlValue::Real(b.age_adjustment),
        SqlValue::Real(b.coefficient),
        SqlValue::real(b.emissions),
        SqlValue::Text(b.usage_tier.to_string()),
        SqlValue::boolean(b.green_roof),
        xs,
        ys,
    ])
}

pub fn parcel_row(p: &Parcel) -> Result<SqlRow> {
    let [xs, ys] = coord_columns(&p.coords)?;
    Ok(vec![
        SqlValue::Integer(p.index as i64),
        SqlValue::Text(p.zone.clone()),
        SqlValue::real(p.area_sqm),
        SqlValue::real(p.area_ha),
        SqlValue::real(p.absorption),
        xs,
        ys,
    ])
}

pub fn population_rows(dashboard: &Dashboard) -> Vec<SqlRow> {
    dashboard
        .population
        .iter()
        .map(|r| {
            vec![
                SqlValue::Text(r.dong.clone()),
                SqlValue::optional_real(r.popu_ratio),
                SqlValue::optional_real(r.old_ratio),
            ]
        })
        .collect()
}

pub fn climate_rows(dashboard: &Dashboard) -> Vec<SqlRow> {
    dashboard
        .climate
        .iter()
        .flat_map(|scenario| {
            scenario.rows.iter().map(move |r| {
                vec![
                    SqlValue::Text(scenario.name.clone()),
                    SqlValue::Integer(r.year as i64),
                    SqlValue::optional_real(r.tas),
                    SqlValue::optional_real(r.di),
                ]
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::{estimate_building, EmissionFactors, RawBuilding};
    use crate::schema::tables::{ABSORPTION_PARCELS, BUILDINGS};

    #[test]
    fn test_building_row_matches_schema() {
        let b = estimate_building(
            RawBuilding {
                category: Some("공장".to_string()),
                gross_area: 10.0,
                floors_above: 1.0,
                coords: FlatCoords {
                    xs: vec![Some(1.0), None, Some(2.5)],
                    ys: vec![Some(3.0), None, Some(4.0)],
                },
                ..Default::default()
            },
            &EmissionFactors::standard(),
        );
        let row = building_row(&b).unwrap();

        assert_eq!(row.len(), BUILDINGS.columns.len());
        assert_eq!(row[5], SqlValue::Null);
        assert_eq!(row[11], SqlValue::Text("Green Usage".to_string()));
        assert_eq!(row[12], SqlValue::Integer(0));
        assert_eq!(row[13], SqlValue::Text("[1.0,null,2.5]".to_string()));
    }

    #[test]
    fn test_parcel_row_matches_schema() {
        let p = Parcel {
            index: 3,
            zone: "자연녹지지역".to_string(),
            area_sqm: 10_000.0,
            area_ha: 1.0,
            absorption: 6.9,
            coords: FlatCoords::default(),
        };
        let row = parcel_row(&p).unwrap();
        assert_eq!(row.len(), ABSORPTION_PARCELS.columns.len());
        assert_eq!(row[5], SqlValue::Text("[]".to_string()));
    }

    #[test]
    fn test_non_finite_becomes_null() {
        assert_eq!(SqlValue::real(f64::NAN), SqlValue::Null);
        assert_eq!(SqlValue::real(1.5), SqlValue::Real(1.5));
        assert_eq!(SqlValue::optional_real(None), SqlValue::Null);
        assert_eq!(SqlValue::optional_real(Some(f64::INFINITY)), SqlValue::Null);
        assert_eq!(SqlValue::optional_real(Some(0.5)), SqlValue::Real(0.5));
    }
}
