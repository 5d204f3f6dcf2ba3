//! GeoJSON feature collection of per-cell rainfall.

use chrono::{DateTime, Utc};
use gsmap_parser::Grid;
use rain_common::{BoundingBox, CellCoord, SnapshotId};
use serde::{Deserialize, Serialize};

/// The persisted artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RainfallCollection {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    pub features: Vec<CellFeature>,

    /// Observation time, `YYYY-MM-DD HH:MM UTC`
    pub timestamp: String,

    pub processed_at: DateTime<Utc>,

    /// Archive filename the grid came from
    pub filename: String,
}

/// One grid cell as a polygon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellFeature {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    pub geometry: CellGeometry,

    pub properties: CellProperties,
}

/// Cell geometry; always a closed rectangle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum CellGeometry {
    Polygon {
        /// Exterior ring of `[longitude, latitude]` pairs.
        coordinates: Vec<Vec<[f64; 2]>>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellProperties {
    /// mm/h
    pub intensity: f32,
    pub source: String,
}

impl CellFeature {
    pub fn cell(cell: CellCoord, intensity: f32, source: &str) -> Self {
        Self {
            type_: "Feature".to_string(),
            geometry: CellGeometry::Polygon {
                coordinates: vec![cell.ring().to_vec()],
            },
            properties: CellProperties {
                intensity,
                source: source.to_string(),
            },
        }
    }

    /// The exterior ring.
    pub fn ring(&self) -> &[[f64; 2]] {
        match &self.geometry {
            CellGeometry::Polygon { coordinates } => coordinates.first().map(Vec::as_slice).unwrap_or(&[]),
        }
    }
}

impl RainfallCollection {
    /// Highest intensity among the features; 0.0 when empty.
    pub fn max_intensity(&self) -> f32 {
        self.features
            .iter()
            .map(|f| f.properties.intensity)
            .fold(0.0, f32::max)
    }
}

/// Serialize every cell of `window`, zeros included, in row-major order.
pub fn build_collection(
    grid: &Grid,
    snapshot: &SnapshotId,
    window: &BoundingBox,
    provenance: &str,
    processed_at: DateTime<Utc>,
) -> RainfallCollection {
    let features = grid
        .window(window)
        .iter()
        .map(|(row, col, value)| CellFeature::cell(CellCoord::from_index(row, col), value, provenance))
        .collect();

    RainfallCollection {
        type_: "FeatureCollection".to_string(),
        features,
        timestamp: snapshot.display_timestamp(),
        processed_at,
        filename: snapshot.filename.clone(),
    }
}
