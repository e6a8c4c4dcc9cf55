//! Object id to dataset resolution over a directory of Zarr V3 groups.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dap_protocol::{
    resolve_within, Container, DataNode, DatasetBuilder, DatasetNode, DatasetResolver,
    Diagnostics, Dimension, DapResult,
};
use walkdir::WalkDir;
use zarrs::array::Array;
use zarrs_filesystem::FilesystemStore;

use crate::error::{Result, StoreError};
use crate::metadata::{dtype_of, split_info, to_attributes, NodeMetadata, NodeType};
use crate::source::ZarrArraySource;

/// Resolves object ids to Zarr V3 groups below a data root.
///
/// The object id is a path relative to the root, e.g. `gfs/2024122200.zarr`.
/// Child arrays become Array nodes, in file name order. Child groups become
/// nested Datasets when they carry attributes and Structures otherwise.
#[derive(Debug, Clone)]
pub struct ZarrResolver {
    root: PathBuf,
}

impl ZarrResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load(&self, object_id: &str, dir: &Path) -> Result<(DatasetNode, Diagnostics)> {
        let meta = NodeMetadata::read(dir)?
            .filter(|m| m.node_type == NodeType::Group)
            .ok_or_else(|| StoreError::NotFound(object_id.to_string()))?;

        let store = Arc::new(
            FilesystemStore::new(dir).map_err(|e| StoreError::open_failed(e.to_string()))?,
        );

        let (info, attributes) = split_info(&meta.attributes);
        let builder = DatasetBuilder::new(dataset_name(object_id))
            .info(info)
            .attributes(attributes);

        let (dataset, diagnostics) = load_group(builder, &store, dir, "")?.build();
        tracing::debug!(
            "Resolved {} with {} variables, {} omitted",
            object_id,
            dataset.children.len(),
            diagnostics.warnings.len()
        );
        Ok((dataset, diagnostics))
    }
}

impl DatasetResolver for ZarrResolver {
    fn resolve(&self, object_id: &str) -> DapResult<(DatasetNode, Diagnostics)> {
        let dir = resolve_within(&self.root, object_id)?;
        Ok(self.load(object_id, &dir)?)
    }
}

/// Last `/`-separated segment of an object id.
pub fn dataset_name(object_id: &str) -> &str {
    object_id
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(object_id)
}

/// Add the children of the group at `dir` to `builder`. `prefix` is the
/// group's path inside the store.
fn load_group(
    mut builder: DatasetBuilder,
    store: &Arc<FilesystemStore>,
    dir: &Path,
    prefix: &str,
) -> Result<DatasetBuilder> {
    let entries = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir());

    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(meta) = NodeMetadata::read(entry.path())? else {
            continue;
        };
        let node_path = format!("{}/{}", prefix, name);

        match meta.node_type {
            NodeType::Array => builder = add_array(builder, store, &node_path, &name, &meta)?,
            NodeType::Group => {
                let nested = DatasetBuilder::new(name.as_str())
                    .attributes(to_attributes(&meta.attributes));
                let (group, diagnostics) =
                    load_group(nested, store, entry.path(), &node_path)?.build();

                let node = if group.attributes.is_empty() {
                    DataNode::Structure(Container::new(name, group.children))
                } else {
                    DataNode::Dataset(group)
                };
                builder = builder.node(node).diagnostics(diagnostics);
            }
        }
    }

    Ok(builder)
}

fn add_array(
    builder: DatasetBuilder,
    store: &Arc<FilesystemStore>,
    node_path: &str,
    name: &str,
    meta: &NodeMetadata,
) -> Result<DatasetBuilder> {
    let array = Array::open(Arc::clone(store), node_path)
        .map_err(|e| StoreError::open_failed(format!("{}: {}", node_path, e)))?;

    let Some(dtype) = dtype_of(array.data_type()) else {
        return Ok(builder.skipped(
            name,
            format!("unsupported zarr data type {:?}", array.data_type()),
        ));
    };

    let shape: Vec<usize> = array.shape().iter().map(|&n| n as usize).collect();
    let dims = meta
        .dimension_names(shape.len())
        .into_iter()
        .zip(&shape)
        .map(|(dim, &size)| Dimension::new(dim, size))
        .collect();
    let attributes = to_attributes(array.attributes());
    let source = ZarrArraySource::new(array, node_path, dtype);

    Ok(builder.array(name, dims, dtype, Arc::new(source), attributes))
}
