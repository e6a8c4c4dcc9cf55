//! DAP2 (OPeNDAP) Protocol
//!
//! This crate provides the data model and wire formats for serving gridded
//! datasets over DAP2:
//!
//! - DAS: attribute description, plain text
//! - DDS: structure description, plain text
//! - DODS: DDS followed by a big-endian binary payload
//!
//! Constraint expressions (`?temp[0:1:0][0:1],lat`) are parsed by
//! [`ProjectionSet`] and applied with [`DatasetNode::project`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use dap_protocol::{DatasetBuilder, DType, Dimension, MemorySource, ProjectionSet, Values};
//! use dap_protocol::{render_dds, DodsChunks};
//!
//! let source = MemorySource::new(vec![2], Values::Float32(vec![1.0, 2.0])).unwrap();
//! let (dataset, _) = DatasetBuilder::new("sample")
//!     .array("t", vec![Dimension::new("x", 2)], DType::Float32, Arc::new(source), vec![])
//!     .build();
//!
//! let projections = ProjectionSet::from_query("t[1]");
//! let projected = dataset.project(&projections.projections).unwrap();
//! assert!(render_dds(&projected).contains("Float32 t[x=1];"));
//! assert_eq!(DodsChunks::new(&projected).collect_bytes().unwrap().len(), 12);
//! ```

pub mod attribute;
pub mod das;
pub mod dds;
pub mod dods;
pub mod dtype;
pub mod errors;
pub mod location;
pub mod model;
pub mod projection;
pub mod source;
pub mod values;

// Re-export commonly used types
pub use attribute::{AttrValue, Attribute, DatasetInfo};
pub use das::{render_das, DAS_ROOT};
pub use dds::render_dds;
pub use dods::{DodsChunks, DATA_MARKER};
pub use dtype::{format_general, DType, DapType, NumericFormat};
pub use errors::{DapError, DapResult, ErrorClass};
pub use location::{is_subdirectory, resolve_within};
pub use model::{
    ArrayNode, Container, DataNode, DatasetBuilder, DatasetNode, Diagnostic, Diagnostics,
    Dimension,
};
pub use projection::{DimSlice, Hyperslab, Projection, ProjectionSet};
pub use source::{ArraySource, DatasetResolver, MemorySource};
pub use values::Values;

/// One level of indentation in DAS and DDS text.
pub const FILL_UNIT: &str = "    ";

/// Line terminator for DAS and DDS text.
pub const LINE_END: &str = "\r\n";

/// HTTP header values used by DAP2 responses.
pub mod headers {
    /// `XDODS-Server` header value.
    pub const XDODS_SERVER: &str = "dods/3.2.2";
    /// `Content-Description` for `.das` responses.
    pub const DESCRIPTION_DAS: &str = "dods-das";
    /// `Content-Description` for `.dds` responses.
    pub const DESCRIPTION_DDS: &str = "dods-dds";
    /// `Content-Description` for `.dods` responses.
    pub const DESCRIPTION_DATA: &str = "dods-data";
    /// `Content-Description` for error bodies.
    pub const DESCRIPTION_ERROR: &str = "dods-error";
    /// Content type of DAS, DDS and error responses.
    pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";
    /// Content type of DODS responses.
    pub const CONTENT_TYPE_DATA: &str = "application/octet";
}
