//! Geometry input and shaping
//!
//! - `reader`: GeoJSON feature collections with legacy encodings
//! - `projection`: reprojection into Web Mercator metres
//! - `flatten`: exterior rings as flat x/y sequences for area-fill rendering

pub mod flatten;
pub mod projection;
pub mod reader;

pub use flatten::*;
pub use projection::*;
pub use reader::*;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// What to do with features whose geometry is neither a polygon nor a multi-polygon
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GeometryPolicy {
    /// Keep the record with empty coordinate sequences and log a warning
    #[default]
    Skip,
    /// Abort the load
    Strict,
}
