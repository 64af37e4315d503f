//! Reference region datasets
//!
//! The EEZ reference data is carried as GeoJSON: [`RegionDataset`] reads a
//! feature collection and selects features by attribute, [`RegionPolygon`]
//! answers point-in-polygon queries for the spatial filter stage.
//!
//! Only the outer ring of each polygon is evaluated; holes in the reference
//! polygons are treated as inside.

use nais_common::error::{NaisError, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// ============================================================================
// Polygon containment
// ============================================================================

/// A (multi)polygon as a set of outer rings
#[derive(Debug, Clone, PartialEq)]
pub struct RegionPolygon {
    rings: Vec<Vec<(f64, f64)>>,
}

impl RegionPolygon {
    /// Build a polygon directly from rings of (x, y) vertices.
    pub fn from_rings(rings: Vec<Vec<(f64, f64)>>) -> Self {
        Self { rings }
    }

    /// Load the polygon of the first feature in a GeoJSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let dataset = RegionDataset::load(path)?;
        let feature = dataset.features.first().ok_or_else(|| {
            NaisError::region(format!("'{}' contains no features", path.display()))
        })?;
        Self::from_feature(feature)
    }

    /// Extract the outer rings from a GeoJSON feature.
    pub fn from_feature(feature: &Value) -> Result<Self> {
        let geometry = &feature["geometry"];
        let coordinates = &geometry["coordinates"];

        let rings = match geometry["type"].as_str() {
            Some("Polygon") => vec![parse_ring(&coordinates[0])?],
            Some("MultiPolygon") => {
                let polygons = coordinates
                    .as_array()
                    .ok_or_else(|| NaisError::region("MultiPolygon coordinates are not an array"))?;
                polygons
                    .iter()
                    .map(|polygon| parse_ring(&polygon[0]))
                    .collect::<Result<Vec<_>>>()?
            },
            other => {
                return Err(NaisError::region(format!(
                    "unsupported geometry type: {other:?}"
                )))
            },
        };

        Ok(Self { rings })
    }

    /// Whether the point lies within any of the polygon's rings.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.rings.iter().any(|ring| ring_contains(ring, x, y))
    }
}

/// Even-odd ray casting against one ring.
fn ring_contains(ring: &[(f64, f64)], x: f64, y: f64) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn parse_ring(value: &Value) -> Result<Vec<(f64, f64)>> {
    let points = value
        .as_array()
        .ok_or_else(|| NaisError::region("polygon ring is not an array"))?;

    points
        .iter()
        .map(|point| {
            let x = point[0].as_f64();
            let y = point[1].as_f64();
            match (x, y) {
                (Some(x), Some(y)) => Ok((x, y)),
                _ => Err(NaisError::region("ring vertex is not a coordinate pair")),
            }
        })
        .collect()
}

// ============================================================================
// Feature collection
// ============================================================================

/// A GeoJSON feature collection on disk
#[derive(Debug, Clone)]
pub struct RegionDataset {
    path: PathBuf,
    features: Vec<Value>,
}

impl RegionDataset {
    /// Load a GeoJSON feature collection.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&text)?;

        let features = value["features"]
            .as_array()
            .cloned()
            .ok_or_else(|| {
                NaisError::region(format!(
                    "'{}' is not a GeoJSON feature collection",
                    path.display()
                ))
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            features,
        })
    }

    /// Number of features in the collection.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Select the first feature whose property `field` equals `value`.
    pub fn select_by_attribute(&self, field: &str, value: &str) -> Result<&Value> {
        self.features
            .iter()
            .find(|feature| feature["properties"][field].as_str() == Some(value))
            .ok_or_else(|| {
                NaisError::region(format!(
                    "no feature with {field} = '{value}' in '{}'",
                    self.path.display()
                ))
            })
    }

    /// Persist a single feature as its own feature collection.
    pub fn save_feature(feature: &Value, path: &Path) -> Result<()> {
        let collection = serde_json::json!({
            "type": "FeatureCollection",
            "features": [feature],
        });
        fs::write(path, serde_json::to_string(&collection)?)?;
        info!("Saved selected feature to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn square_feature(geoname: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> Value {
        serde_json::json!({
            "type": "Feature",
            "properties": { "GeoName": geoname },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]]],
            },
        })
    }

    fn write_collection(path: &Path, features: Vec<Value>) {
        let collection = serde_json::json!({
            "type": "FeatureCollection",
            "features": features,
        });
        fs::write(path, serde_json::to_string(&collection).unwrap()).unwrap();
    }

    #[test]
    fn test_polygon_containment() {
        let region = RegionPolygon::from_rings(vec![vec![
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
        ]]);

        assert!(region.contains(5.0, 5.0));
        assert!(!region.contains(15.0, 5.0));
        assert!(!region.contains(-1.0, -1.0));
    }

    #[test]
    fn test_multipolygon_feature() {
        let feature = serde_json::json!({
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": [
                    [[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]]],
                    [[[10.0, 10.0], [12.0, 10.0], [12.0, 12.0], [10.0, 12.0], [10.0, 10.0]]],
                ],
            },
        });

        let region = RegionPolygon::from_feature(&feature).unwrap();
        assert!(region.contains(1.0, 1.0));
        assert!(region.contains(11.0, 11.0));
        assert!(!region.contains(5.0, 5.0));
    }

    #[test]
    fn test_select_by_attribute_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let world = dir.path().join("eez_v10.geojson");
        write_collection(
            &world,
            vec![
                square_feature("Canadian Exclusive Economic Zone", 20.0, 20.0, 30.0, 30.0),
                square_feature("United States Exclusive Economic Zone", 0.0, 0.0, 10.0, 10.0),
            ],
        );

        let dataset = RegionDataset::load(&world).unwrap();
        assert_eq!(dataset.len(), 2);

        let us = dataset
            .select_by_attribute("GeoName", "United States Exclusive Economic Zone")
            .unwrap();

        let us_path = dir.path().join("eez_us.geojson");
        RegionDataset::save_feature(us, &us_path).unwrap();

        let region = RegionPolygon::load(&us_path).unwrap();
        assert!(region.contains(5.0, 5.0));
        assert!(!region.contains(25.0, 25.0));
    }

    #[test]
    fn test_select_missing_attribute_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let world = dir.path().join("eez_v10.geojson");
        write_collection(&world, vec![square_feature("Somewhere", 0.0, 0.0, 1.0, 1.0)]);

        let dataset = RegionDataset::load(&world).unwrap();
        assert!(dataset
            .select_by_attribute("GeoName", "United States Exclusive Economic Zone")
            .is_err());
    }
}
