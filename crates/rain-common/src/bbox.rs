//! Geographic region boxes used to query the global grid.

use serde::{Deserialize, Serialize};

/// A latitude/longitude bounding box in degrees.
///
/// Longitudes follow the archive convention of `[0, 360)` degrees east.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Create a new bounding box from its latitude and longitude extents.
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// Parse a region string: "min_lat,max_lat,min_lon,max_lon"
    pub fn from_region_string(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let parse = |p: &str| {
            p.parse::<f64>()
                .map_err(|_| BboxParseError::InvalidNumber(p.to_string()))
        };

        let bbox = Self {
            min_lat: parse(parts[0])?,
            max_lat: parse(parts[1])?,
            min_lon: parse(parts[2])?,
            max_lon: parse(parts[3])?,
        };

        if bbox.min_lat > bbox.max_lat || bbox.min_lon > bbox.max_lon {
            return Err(BboxParseError::Inverted(s.to_string()));
        }

        Ok(bbox)
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "lat {}..{}, lon {}..{}",
            self.min_lat, self.max_lat, self.min_lon, self.max_lon
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid region format: {0}. Expected 'min_lat,max_lat,min_lon,max_lon'")]
    InvalidFormat(String),

    #[error("Invalid number in region: {0}")]
    InvalidNumber(String),

    #[error("Region has min greater than max: {0}")]
    Inverted(String),
}

/// Regions that the historical scans were run against.
pub mod regions {
    use super::BoundingBox;

    /// Quezon City core box.
    pub const QUEZON_CITY: BoundingBox = BoundingBox {
        min_lat: 14.6,
        max_lat: 14.8,
        min_lon: 121.0,
        max_lon: 121.2,
    };

    /// Reference window serialized by a sync (Quezon City with surrounding context).
    pub const QUEZON_CITY_CONTEXT: BoundingBox = BoundingBox {
        min_lat: 14.0,
        max_lat: 15.0,
        min_lon: 120.5,
        max_lon: 121.5,
    };

    /// Central Luzon.
    pub const LUZON: BoundingBox = BoundingBox {
        min_lat: 12.0,
        max_lat: 18.0,
        min_lon: 120.0,
        max_lon: 123.0,
    };

    /// Luzon and surrounding waters.
    pub const LUZON_WATERS: BoundingBox = BoundingBox {
        min_lat: 10.0,
        max_lat: 20.0,
        min_lon: 118.0,
        max_lon: 126.0,
    };

    /// Whole Philippine archipelago.
    pub const PHILIPPINES: BoundingBox = BoundingBox {
        min_lat: 4.0,
        max_lat: 19.0,
        min_lon: 116.0,
        max_lon: 127.0,
    };

    /// Look up a named region (case-insensitive, `-` and `_` interchangeable).
    pub fn by_name(name: &str) -> Option<BoundingBox> {
        match name.to_ascii_lowercase().replace('-', "_").as_str() {
            "quezon_city" | "qc" => Some(QUEZON_CITY),
            "quezon_city_context" | "qc_context" => Some(QUEZON_CITY_CONTEXT),
            "luzon" => Some(LUZON),
            "luzon_waters" => Some(LUZON_WATERS),
            "philippines" | "ph" => Some(PHILIPPINES),
            _ => None,
        }
    }
}
