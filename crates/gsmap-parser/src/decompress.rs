use std::io::Read;

use bytes::Bytes;

use crate::error::{ParseError, Result};
use crate::GRID_BYTES;

/// Decompress a gzip-wrapped snapshot.
pub fn decompress_gzip(data: &[u8]) -> Result<Bytes> {
    let mut decoder = flate2::read::GzDecoder::new(data);
    let mut decompressed = Vec::with_capacity(GRID_BYTES);
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| ParseError::Decompression(e.to_string()))?;
    Ok(Bytes::from(decompressed))
}
