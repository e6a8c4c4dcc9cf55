//! On-disk Zarr V3 stores for resolver and service tests.
//!
//! A store is a directory holding a group `zarr.json` and one sub-directory
//! per array. Dimension names are recorded in the `_ARRAY_DIMENSIONS`
//! attribute of each array.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Map, Value};
use zarrs::array::{ArrayBuilder, DataType, Element, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

type FixtureResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Object id of the store written by [`write_sample_store`].
pub const SAMPLE_OBJECT_ID: &str = "model/run.zarr";

/// One array to write into a store.
pub struct ArrayFixture<'a, T> {
    pub name: &'a str,
    pub dims: &'a [&'a str],
    pub shape: Vec<u64>,
    pub data_type: DataType,
    pub fill_value: FillValue,
    pub data: &'a [T],
    pub attributes: Map<String, Value>,
}

/// Write a group `zarr.json` at `path`, creating the directory.
pub fn write_group(path: &Path, attributes: Map<String, Value>) -> FixtureResult<()> {
    std::fs::create_dir_all(path)?;
    let metadata = json!({
        "zarr_format": 3,
        "node_type": "group",
        "attributes": attributes,
    });
    std::fs::write(path.join("zarr.json"), serde_json::to_vec_pretty(&metadata)?)?;
    Ok(())
}

/// Write one array below the group at `group`. The whole array is a single
/// chunk.
pub fn write_array<T: Element>(group: &Path, fixture: ArrayFixture<'_, T>) -> FixtureResult<()> {
    let chunk_shape: Vec<u64> = fixture.shape.iter().map(|&n| n.max(1)).collect();
    write_chunked_array(group, fixture, chunk_shape)
}

/// Write one array below the group at `group`, split into chunks of
/// `chunk_shape`. Chunk files use the default `c/<i>/<j>/...` keys.
pub fn write_chunked_array<T: Element>(
    group: &Path,
    fixture: ArrayFixture<'_, T>,
    chunk_shape: Vec<u64>,
) -> FixtureResult<()> {
    let store = Arc::new(FilesystemStore::new(group)?);

    let mut attributes = fixture.attributes;
    attributes.insert("_ARRAY_DIMENSIONS".to_string(), json!(fixture.dims));

    let array = ArrayBuilder::new(
        fixture.shape.clone(),
        fixture.data_type,
        chunk_shape.try_into()?,
        fixture.fill_value,
    )
    .attributes(attributes)
    .build(store, &format!("/{}", fixture.name))?;

    array.store_metadata()?;

    let subset = ArraySubset::new_with_start_shape(vec![0; fixture.shape.len()], fixture.shape)?;
    array.store_array_subset_elements(&subset, fixture.data)?;

    Ok(())
}

/// Write the sample store under `root` and return its directory.
///
/// Holds `temp(time=3, x=2)` as float32 `[[1, 2], [3, 4], [5, 6]]`,
/// `station(x=2)` as int16 and `flags(x=2)` as uint64, which cannot be
/// served.
pub fn write_sample_store(root: &Path) -> FixtureResult<PathBuf> {
    let group = root.join(SAMPLE_OBJECT_ID);

    let mut attrs = Map::new();
    attrs.insert("Conventions".to_string(), json!("CF-1.8"));
    attrs.insert("title".to_string(), json!("Sample surface temperature"));
    attrs.insert("institution".to_string(), json!("Test"));
    attrs.insert("date".to_string(), json!("2024-12-22T00:00:00Z"));
    attrs.insert("comment".to_string(), json!("synthetic"));
    write_group(&group, attrs)?;

    let mut temp_attrs = Map::new();
    temp_attrs.insert("units".to_string(), json!("K"));
    temp_attrs.insert("valid_range".to_string(), json!([200.0, 350.0]));
    write_array(
        &group,
        ArrayFixture {
            name: "temp",
            dims: &["time", "x"],
            shape: vec![3, 2],
            data_type: DataType::Float32,
            fill_value: FillValue::from(f32::NAN),
            data: &crate::SAMPLE_TEMP,
            attributes: temp_attrs,
        },
    )?;

    let mut station_attrs = Map::new();
    station_attrs.insert("long_name".to_string(), json!("station id"));
    write_array(
        &group,
        ArrayFixture {
            name: "station",
            dims: &["x"],
            shape: vec![2],
            data_type: DataType::Int16,
            fill_value: FillValue::from(0i16),
            data: &[101i16, 102],
            attributes: station_attrs,
        },
    )?;

    write_array(
        &group,
        ArrayFixture {
            name: "flags",
            dims: &["x"],
            shape: vec![2],
            data_type: DataType::UInt64,
            fill_value: FillValue::from(0u64),
            data: &[1u64, 2],
            attributes: Map::new(),
        },
    )?;

    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_sample_store_layout() {
        let dir = tempfile::tempdir().unwrap();
        let group = write_sample_store(dir.path()).unwrap();

        assert!(group.join("zarr.json").exists());
        assert!(group.join("temp/zarr.json").exists());
        assert!(group.join("station/zarr.json").exists());

        let meta: Value =
            serde_json::from_slice(&std::fs::read(group.join("zarr.json")).unwrap()).unwrap();
        assert_eq!(meta["node_type"], "group");
        assert_eq!(meta["attributes"]["title"], "Sample surface temperature");
    }
}
