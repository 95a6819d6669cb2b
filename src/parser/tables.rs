use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// District residency and elderly-growth ratios; blank cells read as `None`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRatio {
    pub dong: String,
    pub popu_ratio: Option<f64>,
    pub old_ratio: Option<f64>,
}

/// One year of a climate scenario projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateRow {
    pub year: i32,
    /// Temperature anomaly
    pub tas: Option<f64>,
    /// Discomfort index
    pub di: Option<f64>,
}

/// A named climate projection, e.g. "ssp245"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateScenario {
    pub name: String,
    pub rows: Vec<ClimateRow>,
}

/// Deserialize every row of a headed CSV
pub fn read_csv_rows<T: DeserializeOwned>(reader: impl Read) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("Invalid row {}", i + 1)))
        .collect()
}

pub fn read_population_ratios(path: &Path) -> Result<Vec<PopulationRatio>> {
    let file = std::fs::File::open(path).with_context(|| format!("Failed to open: {:?}", path))?;
    read_csv_rows(file).with_context(|| format!("Failed to read population ratios: {:?}", path))
}

pub fn read_climate_scenario(name: &str, path: &Path) -> Result<ClimateScenario> {
    let file = std::fs::File::open(path).with_context(|| format!("Failed to open: {:?}", path))?;
    let rows = read_csv_rows(file)
        .with_context(|| format!("Failed to read climate scenario {}: {:?}", name, path))?;

    Ok(ClimateScenario {
        name: name.to_string(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_population() {
        let data = "dong,popu_ratio,old_ratio\n부곡동, 0.21 ,0.05\n장전동,0.18,0.07\n";
        let rows: Vec<PopulationRatio> = read_csv_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].dong, "부곡동");
        assert_eq!(rows[0].popu_ratio, Some(0.21));
        assert_eq!(rows[1].old_ratio, Some(0.07));
    }

    #[test]
    fn test_read_climate_extra_columns() {
        let data = "year,tas,di,source\n2030,1.2,68.5,model-a\n2040,1.6,69.1,model-a\n";
        let rows: Vec<ClimateRow> = read_csv_rows(data.as_bytes()).unwrap();
        assert_eq!(
            rows[1],
            ClimateRow {
                year: 2040,
                tas: Some(1.6),
                di: Some(69.1)
            }
        );
    }

    #[test]
    fn test_blank_cells_are_none() {
        let data = "dong,popu_ratio,old_ratio
부곡동,0.21,
장전동, ,0.07
";
        let rows: Vec<PopulationRatio> = read_csv_rows(data.as_bytes()).unwrap();
        assert_eq!(rows[0].popu_ratio, Some(0.21));
        assert_eq!(rows[0].old_ratio, None);
        assert_eq!(rows[1].popu_ratio, None);

        let data = "year,tas,di
2030,,68.5
";
        let rows: Vec<ClimateRow> = read_csv_rows(data.as_bytes()).unwrap();
        assert_eq!(rows[0].tas, None);
        assert_eq!(rows[0].di, Some(68.5));
    }

    #[test]
    fn test_blank_year_is_error() {
        let data = "year,tas,di
,1.2,68.5
";
        assert!(read_csv_rows::<ClimateRow>(data.as_bytes()).is_err());
    }

    #[test]
    fn test_missing_column_is_error() {
        let data = "year,tas\n2030,1.2\n";
        let err = read_csv_rows::<ClimateRow>(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Invalid row 1"));
    }
}
