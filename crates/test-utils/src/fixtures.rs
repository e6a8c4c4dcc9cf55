//! Common test fixtures for weather-dap tests.
//!
//! The sample dataset is small enough to check byte for byte:
//!
//! ```text
//! dataset {
//!     Float32 temp[time=3][x=2];
//!     Int16 station[x=2];
//! } sample;
//! ```
//!
//! `temp` holds `[[1, 2], [3, 4], [5, 6]]`.

use std::sync::Arc;

use dap_protocol::{
    Attribute, DType, DatasetBuilder, DatasetInfo, DatasetNode, Dimension, MemorySource, Values,
};

/// Name of the sample dataset.
pub const SAMPLE_NAME: &str = "sample";

/// Row-major contents of the sample `temp` array.
pub const SAMPLE_TEMP: [f32; 6] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];

/// Global info block of the sample dataset.
pub fn sample_info() -> DatasetInfo {
    DatasetInfo {
        conventions: "CF-1.8".to_string(),
        title: "Sample surface temperature".to_string(),
        institution: "Test".to_string(),
        ..Default::default()
    }
}

/// The `temp(time=3, x=2)` array on its own, backed by memory.
pub fn sample_temp_source() -> MemorySource {
    MemorySource::new(vec![3, 2], Values::Float32(SAMPLE_TEMP.to_vec()))
        .expect("sample temp shape matches its values")
}

/// Sample dataset with a float `temp(time, x)` and an int16 `station(x)`.
pub fn sample_dataset() -> DatasetNode {
    let station = MemorySource::new(vec![2], Values::Int16(vec![101, 102]))
        .expect("sample station shape matches its values");

    let (dataset, _) = DatasetBuilder::new(SAMPLE_NAME)
        .info(sample_info())
        .array(
            "temp",
            vec![Dimension::new("time", 3), Dimension::new("x", 2)],
            DType::Float32,
            Arc::new(sample_temp_source()),
            vec![
                Attribute::text("units", "K"),
                Attribute::scalar("_FillValue", Values::Float32(vec![-999.0]))
                    .expect("scalar attribute"),
            ],
        )
        .array(
            "station",
            vec![Dimension::new("x", 2)],
            DType::Int16,
            Arc::new(station),
            vec![Attribute::text("long_name", "station id")],
        )
        .build();
    dataset
}
