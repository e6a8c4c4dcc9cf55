//! Integration test: project the sample dataset and check the exact DAS,
//! DDS and DODS bytes a client would receive.

use dap_protocol::{render_das, render_dds, DapError, DodsChunks, ProjectionSet, DATA_MARKER};
use test_utils::{be_f32s, sample_dataset};

fn dods_body(query: &str) -> Vec<u8> {
    let dataset = sample_dataset();
    let projections = ProjectionSet::from_query(query);
    let projected = dataset.project(&projections.projections).unwrap();

    let mut body = render_dds(&projected).into_bytes();
    body.extend_from_slice(DATA_MARKER.as_bytes());
    body.extend(DodsChunks::new(&projected).collect_bytes().unwrap());
    body
}

#[test]
fn test_dds_for_single_row() {
    let dataset = sample_dataset();
    let projections = ProjectionSet::from_query("temp%5B1:1:1%5D%5B0:1%5D");
    let projected = dataset.project(&projections.projections).unwrap();

    assert_eq!(
        render_dds(&projected),
        "dataset {\r\n    Float32 temp[time=1][x=2];\r\n} sample;\r\n"
    );
}

#[test]
fn test_dods_for_single_row() {
    let body = dods_body("temp[1:1:1][0:1]");

    let mut expected =
        b"dataset {\r\n    Float32 temp[time=1][x=2];\r\n} sample;\r\n\nData:\n".to_vec();
    expected.extend_from_slice(&[0, 0, 0, 2, 0, 0, 0, 2]);
    expected.extend_from_slice(&3.0f32.to_be_bytes());
    expected.extend_from_slice(&4.0f32.to_be_bytes());

    assert_eq!(body, expected);
}

#[test]
fn test_projection_order_follows_query() {
    let dataset = sample_dataset();
    let projections = ProjectionSet::from_query("station,temp[2]");
    let projected = dataset.project(&projections.projections).unwrap();

    let dds = render_dds(&projected);
    let station = dds.find("Int16 station[x=2];").unwrap();
    let temp = dds.find("Float32 temp[time=1][x=2];").unwrap();
    assert!(station < temp);

    let payload = DodsChunks::new(&projected).collect_bytes().unwrap();
    assert_eq!(&payload[..8], &[0, 0, 0, 2, 0, 0, 0, 2]);
    assert_eq!(&payload[8..12], &[0, 101, 0, 102]);
    assert_eq!(&payload[12..20], &[0, 0, 0, 2, 0, 0, 0, 2]);
    assert_eq!(be_f32s(&payload[20..]), vec![5.0, 6.0]);
}

#[test]
fn test_full_dataset_without_projection() {
    let dataset = sample_dataset();
    let payload = DodsChunks::new(&dataset).collect_bytes().unwrap();

    // temp: header + 6 floats, station: header + 2 int16 values
    assert_eq!(payload.len(), 8 + 24 + 8 + 4);
    assert_eq!(be_f32s(&payload[8..32]), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}

#[test]
fn test_unknown_variable_rejected() {
    let dataset = sample_dataset();
    let projections = ProjectionSet::from_query("temp,humidity");
    assert!(matches!(
        dataset.project(&projections.projections),
        Err(DapError::UnknownVariable(name)) if name == "humidity"
    ));
}

#[test]
fn test_malformed_clauses_dropped() {
    let projections = ProjectionSet::from_query("temp[0:0:1],station");
    assert_eq!(projections.projections.len(), 1);
    assert_eq!(projections.dropped, vec!["temp[0:0:1]".to_string()]);
}

#[test]
fn test_trailing_text_after_clause_ignored() {
    let projections = ProjectionSet::from_query("temp[1]junk,station[x]");
    let projected = sample_dataset().project(&projections.projections).unwrap();
    assert_eq!(
        render_dds(&projected),
        "dataset {\r\n    Float32 temp[time=1][x=2];\r\n    Int16 station[x=2];\r\n} sample;\r\n"
    );
    assert_eq!(projections.dropped, vec!["junk".to_string(), "[x]".to_string()]);
}

#[test]
fn test_das_hides_underscore_attributes() {
    let das = render_das(&sample_dataset());
    assert!(das.starts_with("attributes {\r\n    string Conventions \"CF-1.8\";\r\n"));
    assert!(das.contains("    temp {\r\n        string units \"K\";\r\n    }\r\n"));
    assert!(!das.contains("_FillValue"));
    assert!(das.ends_with("}\r\n"));
}
