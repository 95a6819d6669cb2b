use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// WGS84 semi-major axis used by the spherical Web Mercator projection (EPSG:3857)
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude limit where Web Mercator becomes a square
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// Coordinate reference system of an input geometry file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SourceCrs {
    /// Longitude/latitude in degrees (EPSG:4326)
    #[default]
    Wgs84,
    /// Already in Web Mercator metres (EPSG:3857)
    WebMercator,
}

impl SourceCrs {
    /// Project an (x, y) pair from this CRS into Web Mercator metres
    pub fn project(self, x: f64, y: f64) -> (f64, f64) {
        match self {
            SourceCrs::Wgs84 => lon_lat_to_web_mercator(x, y),
            SourceCrs::WebMercator => (x, y),
        }
    }
}

/// Spherical Web Mercator forward projection
pub fn lon_lat_to_web_mercator(lon_deg: f64, lat_deg: f64) -> (f64, f64) {
    let lat = lat_deg.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let x = EARTH_RADIUS_M * lon_deg.to_radians();
    let y = EARTH_RADIUS_M * (PI / 4.0 + lat / 2.0).tan().ln();
    (x, y)
}
