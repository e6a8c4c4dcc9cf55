//! Integration test: DODS encoding of a large array reads one row per chunk
//! and never more than a single innermost slab at a time.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use dap_protocol::{DType, DatasetBuilder, Dimension, DodsChunks, Projection};
use test_utils::CountingSource;

const ROWS: usize = 10_000;
const COLS: usize = 2_000;

#[test]
fn test_large_array_streams_row_by_row() {
    let source = Arc::new(CountingSource::new(vec![ROWS, COLS]));
    let reads = source.read_counter();

    let (dataset, _) = DatasetBuilder::new("big")
        .array(
            "field",
            vec![Dimension::new("y", ROWS), Dimension::new("x", COLS)],
            DType::Float32,
            source.clone(),
            vec![],
        )
        .build();

    let mut chunks = DodsChunks::new(&dataset);

    let header = chunks.next().unwrap().unwrap();
    assert_eq!(header.len(), 8);
    assert_eq!(reads.load(Ordering::SeqCst), 0);

    let mut produced = 0;
    for chunk in chunks.by_ref() {
        let chunk = chunk.unwrap();
        produced += 1;
        assert_eq!(chunk.len(), COLS * 4);
        // Reads advance only as chunks are pulled.
        assert_eq!(reads.load(Ordering::SeqCst), produced);
    }

    assert_eq!(produced, ROWS);
    assert_eq!(source.reads(), ROWS);
    assert_eq!(source.max_read(), COLS);
}

#[test]
fn test_abandoned_stream_stops_reading() {
    let source = Arc::new(CountingSource::new(vec![ROWS, COLS]));

    let (dataset, _) = DatasetBuilder::new("big")
        .array(
            "field",
            vec![Dimension::new("y", ROWS), Dimension::new("x", COLS)],
            DType::Float32,
            source.clone(),
            vec![],
        )
        .build();

    let taken: Vec<_> = DodsChunks::new(&dataset).take(4).collect();
    assert_eq!(taken.len(), 4);
    assert_eq!(source.reads(), 3);
}

#[test]
fn test_strided_rows_read_only_selected() {
    let source = Arc::new(CountingSource::new(vec![ROWS, COLS]));

    let (dataset, _) = DatasetBuilder::new("big")
        .array(
            "field",
            vec![Dimension::new("y", ROWS), Dimension::new("x", COLS)],
            DType::Float32,
            source.clone(),
            vec![],
        )
        .build();
    let projected = dataset
        .project(&[Projection::parse("field[0:1000:9999][0:999:1999]").unwrap()])
        .unwrap();

    let chunks: Vec<_> = DodsChunks::new(&projected).map(|c| c.unwrap()).collect();
    assert_eq!(chunks.len(), 1 + 10);
    assert_eq!(source.reads(), 10);
    assert_eq!(source.max_read(), 2);

    let row = test_utils::be_f32s(&chunks[2]);
    assert_eq!(row, vec![(1000 * COLS) as f32, (1000 * COLS + 999) as f32]);
}

fn cube(shape: [usize; 3]) -> (Arc<CountingSource>, dap_protocol::DatasetNode) {
    let source = Arc::new(CountingSource::new(shape.to_vec()));
    let (dataset, _) = DatasetBuilder::new("cube")
        .array(
            "cube",
            vec![
                Dimension::new("t", shape[0]),
                Dimension::new("y", shape[1]),
                Dimension::new("x", shape[2]),
            ],
            DType::Float32,
            source.clone(),
            vec![],
        )
        .build();
    (source, dataset)
}

#[test]
fn test_degenerate_axis_with_outer_stride() {
    let (source, dataset) = cube([4, 3, 5]);
    let projected = dataset
        .project(&[Projection::parse("cube[0:2:3][1]").unwrap()])
        .unwrap();

    let chunks: Vec<_> = DodsChunks::new(&projected).map(|c| c.unwrap()).collect();
    assert_eq!(chunks.len(), 2);
    assert_eq!(&chunks[0][..], &[0, 0, 0, 10, 0, 0, 0, 10]);
    assert_eq!(source.reads(), 1);
    assert_eq!(source.max_read(), 10);

    let expected: Vec<f32> = [5, 6, 7, 8, 9, 35, 36, 37, 38, 39]
        .iter()
        .map(|&v| v as f32)
        .collect();
    assert_eq!(test_utils::be_f32s(&chunks[1]), expected);
}

#[test]
fn test_declared_unit_inner_dimension_sent_whole() {
    let (source, dataset) = cube([4, 1, 3]);

    let chunks: Vec<_> = DodsChunks::new(&dataset).map(|c| c.unwrap()).collect();
    assert_eq!(chunks.len(), 2);
    assert_eq!(&chunks[0][..], &[0, 0, 0, 12, 0, 0, 0, 12]);
    assert_eq!(source.reads(), 1);
    assert_eq!(source.max_read(), 12);

    let expected: Vec<f32> = (0..12).map(|v| v as f32).collect();
    assert_eq!(test_utils::be_f32s(&chunks[1]), expected);
}
