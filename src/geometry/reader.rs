use anyhow::{bail, Context, Result};
use encoding_rs::Encoding;
use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use geojson::{GeoJson, JsonObject, Value};
use std::path::Path;

use super::SourceCrs;

/// A feature read from a geometry file, already projected to Web Mercator
#[derive(Debug, Clone)]
pub struct GeoFeature {
    /// Position of the feature in the source collection
    pub index: usize,
    pub properties: JsonObject,
    pub geometry: Option<Geometry<f64>>,
}

/// Decode raw file bytes with an encoding label such as "utf-8" or "euc-kr"
pub fn decode_text(bytes: &[u8], encoding_label: &str) -> Result<String> {
    let encoding = Encoding::for_label(encoding_label.trim().as_bytes())
        .with_context(|| format!("Unknown character encoding: {}", encoding_label))?;

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        bail!("Input is not valid {}", encoding.name());
    }
    Ok(text.into_owned())
}

/// Read a GeoJSON feature collection and project its geometries
///
/// Shapefiles are rejected with the `ogr2ogr` command that converts them.
pub fn read_features(path: &Path, encoding_label: &str, crs: SourceCrs) -> Result<Vec<GeoFeature>> {
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("shp")) {
        bail!(
            "Shapefile input is not supported: {:?}\n\
             Convert it to GeoJSON first, keeping the attribute bytes as they are:\n  \
             ogr2ogr -f GeoJSON -t_srs EPSG:4326 --config SHAPE_ENCODING \"\" {} {}",
            path,
            path.with_extension("geojson").display(),
            path.display()
        );
    }

    let bytes = std::fs::read(path).with_context(|| format!("Failed to read: {:?}", path))?;
    let text = decode_text(&bytes, encoding_label)
        .with_context(|| format!("Failed to decode: {:?}", path))?;

    parse_features(&text, crs).with_context(|| format!("Failed to parse GeoJSON: {:?}", path))
}

/// Parse GeoJSON text into projected features
pub fn parse_features(text: &str, crs: SourceCrs) -> Result<Vec<GeoFeature>> {
    let geojson: GeoJson = text.parse().context("Invalid GeoJSON")?;

    let collection = match geojson {
        GeoJson::FeatureCollection(collection) => collection,
        GeoJson::Feature(_) => bail!("Expected a FeatureCollection, found a single Feature"),
        GeoJson::Geometry(_) => bail!("Expected a FeatureCollection, found a bare Geometry"),
    };

    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            let geometry = match feature.geometry {
                Some(geometry) => Some(
                    convert(&geometry.value, crs)
                        .with_context(|| format!("Invalid geometry in feature {}", index))?,
                ),
                None => None,
            };

            Ok(GeoFeature {
                index,
                properties: feature.properties.unwrap_or_default(),
                geometry,
            })
        })
        .collect()
}

fn convert(value: &Value, crs: SourceCrs) -> Result<Geometry<f64>> {
    let geometry = match value {
        Value::Point(pos) => Geometry::Point(Point::from(coord(pos, crs)?)),
        Value::MultiPoint(positions) => Geometry::MultiPoint(MultiPoint(
            positions
                .iter()
                .map(|p| coord(p, crs).map(Point::from))
                .collect::<Result<_>>()?,
        )),
        Value::LineString(positions) => Geometry::LineString(line(positions, crs)?),
        Value::MultiLineString(lines) => Geometry::MultiLineString(MultiLineString(
            lines.iter().map(|l| line(l, crs)).collect::<Result<_>>()?,
        )),
        Value::Polygon(rings) => Geometry::Polygon(polygon(rings, crs)?),
        Value::MultiPolygon(polygons) => Geometry::MultiPolygon(MultiPolygon(
            polygons
                .iter()
                .map(|rings| polygon(rings, crs))
                .collect::<Result<_>>()?,
        )),
        Value::GeometryCollection(members) => Geometry::GeometryCollection(GeometryCollection(
            members
                .iter()
                .map(|g| convert(&g.value, crs))
                .collect::<Result<_>>()?,
        )),
    };
    Ok(geometry)
}

fn coord(position: &[f64], crs: SourceCrs) -> Result<Coord<f64>> {
    if position.len() < 2 {
        bail!("Position has {} ordinates, expected at least 2", position.len());
    }
    let (x, y) = crs.project(position[0], position[1]);
    Ok(Coord { x, y })
}

fn line(positions: &[Vec<f64>], crs: SourceCrs) -> Result<LineString<f64>> {
    positions
        .iter()
        .map(|p| coord(p, crs))
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

fn polygon(rings: &[Vec<Vec<f64>>], crs: SourceCrs) -> Result<Polygon<f64>> {
    let mut rings = rings.iter().map(|r| line(r, crs));
    let exterior = match rings.next() {
        Some(ring) => ring?,
        None => LineString::new(Vec::new()),
    };
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"A9": "공장", "A12": 120.5},
                "geometry": {"type": "Polygon", "coordinates": [[[0,0],[10,0],[10,10],[0,10],[0,0]]]}
            },
            {
                "type": "Feature",
                "properties": null,
                "geometry": null
            },
            {
                "type": "Feature",
                "properties": {},
                "geometry": {"type": "Point", "coordinates": [3, 4]}
            }
        ]
    }"#;

    #[test]
    fn test_parse_features() {
        let features = parse_features(SAMPLE, SourceCrs::WebMercator).unwrap();
        assert_eq!(features.len(), 3);

        assert_eq!(features[0].index, 0);
        assert_eq!(features[0].properties["A9"], "공장");
        match &features[0].geometry {
            Some(Geometry::Polygon(p)) => assert_eq!(p.exterior().0.len(), 5),
            other => panic!("unexpected geometry: {:?}", other),
        }

        assert!(features[1].properties.is_empty());
        assert!(features[1].geometry.is_none());
        assert!(matches!(features[2].geometry, Some(Geometry::Point(_))));
    }

    #[test]
    fn test_parse_projects_wgs84() {
        let features = parse_features(SAMPLE, SourceCrs::Wgs84).unwrap();
        match &features[0].geometry {
            Some(Geometry::Polygon(p)) => {
                let c = p.exterior().0[1];
                assert!((c.x - 1_113_194.907_932_7).abs() < 1e-3);
                assert!(c.y.abs() < 1e-9);
            }
            other => panic!("unexpected geometry: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_collection() {
        let err = parse_features(r#"{"type": "Point", "coordinates": [1, 2]}"#, SourceCrs::Wgs84)
            .unwrap_err();
        assert!(err.to_string().contains("FeatureCollection"));
    }

    #[test]
    fn test_shapefile_rejected_with_conversion_hint() {
        let err = read_features(Path::new("data/AL_D194_26410_20240127.SHP"), "euc-kr", SourceCrs::Wgs84)
            .unwrap_err()
            .to_string();
        assert!(err.contains("Shapefile input is not supported"));
        assert!(err.contains("ogr2ogr -f GeoJSON"));
        assert!(err.contains("data/AL_D194_26410_20240127.geojson"));
    }

    #[test]
    fn test_decode_euc_kr() {
        let (bytes, _, _) = encoding_rs::EUC_KR.encode("자연녹지지역");
        assert_eq!(decode_text(&bytes, "euc-kr").unwrap(), "자연녹지지역");
        assert!(decode_text(b"abc", "not-an-encoding").is_err());
    }
}
