use rain_common::GRID_LEN;
use tracing::debug;

use crate::decompress::decompress_gzip;
use crate::error::{ParseError, Result};
use crate::grid::Grid;

/// Size in bytes of one decompressed snapshot.
pub const GRID_BYTES: usize = GRID_LEN * 4;

/// Largest physically plausible rain rate (mm/h); anything above is no-data.
pub const MAX_VALID_INTENSITY: f32 = 500.0;

/// Map no-data values to 0.0.
///
/// Negative values, values above 500 and NaN are all no-data. Every value a
/// consumer sees has gone through this function.
#[inline]
pub fn normalize(value: f32) -> f32 {
    if (0.0..=MAX_VALID_INTENSITY).contains(&value) {
        value
    } else {
        0.0
    }
}

/// Decode an uncompressed snapshot buffer into a grid.
pub fn decode(data: &[u8]) -> Result<Grid> {
    if data.len() != GRID_BYTES {
        return Err(ParseError::Format {
            expected: GRID_BYTES,
            actual: data.len(),
        });
    }

    let values: Vec<f32> = data
        .chunks_exact(4)
        .map(|b| normalize(f32::from_le_bytes([b[0], b[1], b[2], b[3]])))
        .collect();

    Ok(Grid::from_normalized(values))
}

/// Decompress and decode a gzip-wrapped snapshot.
pub fn decode_compressed(data: &[u8]) -> Result<Grid> {
    let raw = decompress_gzip(data)?;
    debug!(
        compressed = data.len(),
        decompressed = raw.len(),
        "Decompressed snapshot"
    );
    decode(&raw)
}
