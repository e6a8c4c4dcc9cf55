//! Zarr V3 Dataset Store
//!
//! Resolves DAP object ids to Zarr V3 groups on the local filesystem and
//! exposes their arrays as lazily read [`dap_protocol::ArraySource`]s.
//!
//! # Layout
//!
//! ```text
//! <data root>/
//!   gfs/2024122200.zarr/        object id "gfs/2024122200.zarr"
//!     zarr.json                 group: attributes feed the DAS
//!     temperature/zarr.json     array -> Array node
//!     surface/zarr.json         group -> Structure node
//! ```
//!
//! # Example
//!
//! ```ignore
//! use dap_protocol::DatasetResolver;
//! use dap_store::ZarrResolver;
//!
//! let resolver = ZarrResolver::new("/data/zarr");
//! let (dataset, diagnostics) = resolver.resolve("gfs/2024122200.zarr")?;
//! ```

pub mod error;
pub mod metadata;
pub mod resolver;
pub mod source;

pub use error::{Result, StoreError};
pub use metadata::{NodeMetadata, NodeType};
pub use resolver::{dataset_name, ZarrResolver};
pub use source::ZarrArraySource;
