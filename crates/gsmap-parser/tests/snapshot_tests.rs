//! Decode full gzip-wrapped snapshots as the archive serves them.

use gsmap_parser::{decode_compressed, ParseError};
use rain_common::{regions, BoundingBox, CellCoord, ErrorKind, RainError};
use test_utils::{assert_approx_eq, cell_at, gzip, snapshot_payload};

#[test]
fn test_decode_payload_and_query_region() {
    let (row, col) = cell_at(14.75, 121.15);
    let payload = snapshot_payload(&[(row, col, 3.25), (row + 1, col, 700.0)]);

    let grid = decode_compressed(&payload).unwrap();

    assert_eq!(grid.max_in(&regions::QUEZON_CITY), 3.25);
    let cell = grid.first_exceeding(&regions::QUEZON_CITY, 1.0).unwrap();
    assert_eq!(cell, CellCoord::from_index(row, col));
    assert_approx_eq!(cell.lat, 14.8, 1e-9);
    assert_approx_eq!(cell.lon, 121.1, 1e-9);
}

#[test]
fn test_region_spanning_whole_grid() {
    let payload = snapshot_payload(&[(0, 0, 1.5), (1199, 3599, 2.5)]);
    let grid = decode_compressed(&payload).unwrap();

    let everything = BoundingBox::new(-60.0, 60.0, 0.0, 360.0);
    let window = grid.window(&everything);
    assert_eq!((window.rows(), window.cols()), (1200, 3600));
    assert_eq!(window.max(), 2.5);
    assert_eq!(
        window.first_exceeding(1.0),
        Some(CellCoord::from_index(0, 0))
    );
}

#[test]
fn test_corrupt_gzip_is_decompress_error() {
    let err = decode_compressed(b"definitely not gzip").unwrap_err();
    assert!(matches!(err, ParseError::Decompression(_)));
    assert_eq!(RainError::from(err).kind(), ErrorKind::Decompress);
}

#[test]
fn test_truncated_grid_is_format_error() {
    let payload = gzip(&[0u8; 1024]);
    let err = decode_compressed(&payload).unwrap_err();
    assert!(matches!(err, ParseError::Format { actual: 1024, .. }));
    assert_eq!(RainError::from(err).kind(), ErrorKind::Format);
}
