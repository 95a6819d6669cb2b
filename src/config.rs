use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::estimate::AbsorptionSettings;
use crate::geometry::{GeometryPolicy, SourceCrs};
use crate::parser::{BuildingFields, ParcelFields};

const CONFIG_FILE: &str = "config.toml";

/// Building footprint layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingLayer {
    pub path: PathBuf,
    pub encoding: String,
    pub crs: SourceCrs,
    pub fields: BuildingFields,
}

impl Default for BuildingLayer {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/geumjeong_gu.geojson"),
            encoding: "utf-8".to_string(),
            crs: SourceCrs::Wgs84,
            fields: BuildingFields::default(),
        }
    }
}

/// Zoned land parcel layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParcelLayer {
    pub path: PathBuf,
    pub encoding: String,
    pub crs: SourceCrs,
    pub fields: ParcelFields,
}

impl Default for ParcelLayer {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/AL_D194_26410_20240127.geojson"),
            encoding: "euc-kr".to_string(),
            crs: SourceCrs::Wgs84,
            fields: ParcelFields::default(),
        }
    }
}

/// A climate projection table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateInput {
    pub name: String,
    pub path: PathBuf,
}

/// Everything the loader needs to know
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub geometry_policy: GeometryPolicy,
    pub population: PathBuf,
    pub buildings: BuildingLayer,
    pub parcels: ParcelLayer,
    pub absorption: AbsorptionSettings,
    pub climate: Vec<ClimateInput>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geometry_policy: GeometryPolicy::Skip,
            population: PathBuf::from("data/population_ratio.csv"),
            buildings: BuildingLayer::default(),
            parcels: ParcelLayer::default(),
            absorption: AbsorptionSettings::default(),
            climate: vec![
                ClimateInput {
                    name: "ssp245".to_string(),
                    path: PathBuf::from("data/ssp245.csv"),
                },
                ClimateInput {
                    name: "ssp585".to_string(),
                    path: PathBuf::from("data/ssp585.csv"),
                },
            ],
        }
    }
}

impl Config {
    /// Load the configuration
    ///
    /// An explicit path must exist. Without one, the per-user config file is
    /// used when present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        Self::from_toml(&text).with_context(|| format!("Invalid config: {:?}", path))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML")
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Resolve relative input paths against `dir`
    pub fn with_data_dir(mut self, dir: &Path) -> Self {
        let rebase = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = dir.join(&*p);
            }
        };
        rebase(&mut self.population);
        rebase(&mut self.buildings.path);
        rebase(&mut self.parcels.path);
        for input in &mut self.climate {
            rebase(&mut input.path);
        }
        self
    }
}

/// `<config dir>/config.toml` for this application, if the platform has one
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "carbon-dashboard").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
