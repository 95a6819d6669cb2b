use geo::{Geometry, LineString};
use serde::Serialize;

/// Exterior rings as two parallel coordinate sequences
///
/// `None` entries are separators between the rings of a multi-polygon, so a
/// renderer can draw disjoint sub-shapes without connecting edges. They
/// serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlatCoords {
    pub xs: Vec<Option<f64>>,
    pub ys: Vec<Option<f64>>,
}

impl FlatCoords {
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Number of separator markers
    pub fn separators(&self) -> usize {
        self.xs.iter().filter(|x| x.is_none()).count()
    }

    fn extend_ring(&mut self, ring: &LineString<f64>) {
        for coord in ring.coords() {
            self.xs.push(Some(coord.x));
            self.ys.push(Some(coord.y));
        }
    }

    fn push_separator(&mut self) {
        self.xs.push(None);
        self.ys.push(None);
    }
}

/// Flatten a polygon or multi-polygon into its exterior ring coordinates
///
/// Returns `None` for every other geometry type; the caller decides whether
/// that is fatal (see `GeometryPolicy`).
pub fn flatten(geometry: &Geometry<f64>) -> Option<FlatCoords> {
    match geometry {
        Geometry::Polygon(polygon) => {
            let mut coords = FlatCoords::default();
            coords.extend_ring(polygon.exterior());
            Some(coords)
        }
        Geometry::MultiPolygon(multi) => {
            let mut coords = FlatCoords::default();
            for (i, polygon) in multi.0.iter().enumerate() {
                if i > 0 {
                    coords.push_separator();
                }
                coords.extend_ring(polygon.exterior());
            }
            Some(coords)
        }
        Geometry::Point(_)
        | Geometry::Line(_)
        | Geometry::LineString(_)
        | Geometry::MultiPoint(_)
        | Geometry::MultiLineString(_)
        | Geometry::GeometryCollection(_)
        | Geometry::Rect(_)
        | Geometry::Triangle(_) => None,
    }
}

/// Short type name used in warnings and errors
pub fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
