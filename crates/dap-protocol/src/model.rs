//! DAP2 data model.
//!
//! A dataset is a tree of [`DataNode`]s. Leaves are arrays; structures and
//! sequences group children in declaration order. Trees are built per request
//! by a resolver, narrowed by binding projections, rendered once and dropped.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::attribute::{Attribute, DatasetInfo};
use crate::dtype::{DType, DapType};
use crate::errors::{DapError, DapResult};
use crate::projection::{DimSlice, Projection};
use crate::source::ArraySource;

/// A named dimension with its declared size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub size: usize,
}

impl Dimension {
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// An n-dimensional array variable.
#[derive(Debug, Clone)]
pub struct ArrayNode {
    name: String,
    dims: Vec<Dimension>,
    dtype: DType,
    dap_type: DapType,
    source: Option<Arc<dyn ArraySource>>,
    attributes: Vec<Attribute>,
    projection: Option<Projection>,
    selection: Vec<DimSlice>,
}

impl ArrayNode {
    /// Create an array, or `None` if `dtype` has no DAP2 representation.
    pub fn new(name: impl Into<String>, dims: Vec<Dimension>, dtype: DType) -> Option<Self> {
        let dap_type = dtype.dap_type()?;
        let selection = dims.iter().map(|d| DimSlice::full(d.size)).collect();
        Some(Self {
            name: name.into(),
            dims,
            dtype,
            dap_type,
            source: None,
            attributes: Vec::new(),
            projection: None,
            selection,
        })
    }

    /// Attach the data source.
    pub fn with_source(mut self, source: Arc<dyn ArraySource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Attach the attribute list.
    pub fn with_attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn dap_type(&self) -> DapType {
        self.dap_type
    }

    pub fn source(&self) -> Option<&Arc<dyn ArraySource>> {
        self.source.as_ref()
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    /// Declared dimension sizes.
    pub fn declared_shape(&self) -> Vec<usize> {
        self.dims.iter().map(|d| d.size).collect()
    }

    /// Per-dimension selection after any bound projection.
    pub fn selection(&self) -> &[DimSlice] {
        &self.selection
    }

    /// Per-dimension sizes after any bound projection.
    pub fn effective_shape(&self) -> Vec<usize> {
        self.selection.iter().map(|s| s.count).collect()
    }

    /// Number of elements after any bound projection.
    ///
    /// Fails when the count does not fit a `usize`.
    pub fn effective_len(&self) -> DapResult<usize> {
        if self.selection.iter().any(|s| s.count == 0) {
            return Ok(0);
        }
        self.selection
            .iter()
            .try_fold(1usize, |n, s| n.checked_mul(s.count))
            .ok_or_else(|| {
                DapError::invalid_request(format!(
                    "{} selects more elements than can be addressed",
                    self.name
                ))
            })
    }

    /// Return a copy of this array with `projection` bound to it.
    ///
    /// An array accepts at most one projection.
    pub fn bind(&self, projection: Projection) -> DapResult<ArrayNode> {
        if self.projection.is_some() {
            return Err(DapError::DuplicateProjection(self.name.clone()));
        }
        let selection = projection.bound_slices(&self.declared_shape())?;
        Ok(ArrayNode {
            projection: Some(projection),
            selection,
            ..self.clone()
        })
    }

    fn renamed(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

/// Children of a structure or sequence.
#[derive(Debug, Clone)]
pub struct Container {
    pub name: String,
    pub children: Vec<DataNode>,
}

impl Container {
    pub fn new(name: impl Into<String>, children: Vec<DataNode>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }
}

/// Root of a dataset tree.
#[derive(Debug, Clone)]
pub struct DatasetNode {
    /// Dataset identifier used to close the DDS block.
    pub name: String,
    /// Fixed global attribute block.
    pub info: DatasetInfo,
    /// Further global attributes.
    pub attributes: Vec<Attribute>,
    pub children: Vec<DataNode>,
}

/// One node of the data model.
#[derive(Debug, Clone)]
pub enum DataNode {
    Array(ArrayNode),
    Structure(Container),
    Sequence(Container),
    Dataset(DatasetNode),
}

impl DataNode {
    pub fn name(&self) -> &str {
        match self {
            DataNode::Array(a) => a.name(),
            DataNode::Structure(c) | DataNode::Sequence(c) => &c.name,
            DataNode::Dataset(d) => &d.name,
        }
    }

    /// Child nodes in declaration order.
    pub fn children(&self) -> &[DataNode] {
        match self {
            DataNode::Array(_) => &[],
            DataNode::Structure(c) | DataNode::Sequence(c) => &c.children,
            DataNode::Dataset(d) => &d.children,
        }
    }

    /// Array leaves below (and including) this node, depth first.
    pub fn arrays(&self) -> Vec<&ArrayNode> {
        let mut out = Vec::new();
        collect_arrays(self, &mut out);
        out
    }
}

fn collect_arrays<'a>(node: &'a DataNode, out: &mut Vec<&'a ArrayNode>) {
    match node {
        DataNode::Array(a) => out.push(a),
        _ => node.children().iter().for_each(|c| collect_arrays(c, out)),
    }
}

impl DatasetNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            info: DatasetInfo::default(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Find a node by dotted path (`outer.inner`).
    pub fn find(&self, path: &str) -> Option<&DataNode> {
        if let Some(node) = self.children.iter().find(|c| c.name() == path) {
            return Some(node);
        }
        let mut nodes = self.children.as_slice();
        let mut found = None;
        for part in path.split('.') {
            let node = nodes.iter().find(|c| c.name() == part)?;
            nodes = node.children();
            found = Some(node);
        }
        found
    }

    /// Narrow the dataset to the projected variables.
    ///
    /// With no projections the dataset is returned whole. Otherwise the
    /// result holds exactly the projected variables, in projection order, each
    /// named by its projection id.
    pub fn project(&self, projections: &[Projection]) -> DapResult<DatasetNode> {
        if projections.is_empty() {
            return Ok(self.clone());
        }

        let mut seen = HashSet::new();
        let mut children = Vec::with_capacity(projections.len());

        for projection in projections {
            let id = projection.id();
            if !seen.insert(id) {
                return Err(DapError::DuplicateProjection(id.to_string()));
            }

            let node = self
                .find(id)
                .ok_or_else(|| DapError::UnknownVariable(id.to_string()))?;

            let projected = match node {
                DataNode::Array(array) => {
                    DataNode::Array(array.bind(projection.clone())?.renamed(id))
                }
                other if projection.hyperslabs().is_empty() => other.clone(),
                _ => {
                    return Err(DapError::InvalidRequest(format!(
                        "{} is not an array and cannot be sliced",
                        id
                    )))
                }
            };
            children.push(projected);
        }

        Ok(DatasetNode {
            children,
            ..self.clone()
        })
    }

    /// Array leaves in declaration order.
    pub fn arrays(&self) -> Vec<&ArrayNode> {
        let mut out = Vec::new();
        self.children
            .iter()
            .for_each(|c| collect_arrays(c, &mut out));
        out
    }
}

/// Something the resolver or parser left out on purpose.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// Variable omitted because its dtype has no DAP2 type.
    UnsupportedDtype { variable: String, dtype: DType },
    /// Variable omitted because it could not be described.
    SkippedVariable { variable: String, reason: String },
    /// Projection clause that did not parse.
    DroppedClause(String),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnsupportedDtype { variable, dtype } => {
                write!(f, "variable {} omitted: unsupported dtype {}", variable, dtype)
            }
            Diagnostic::SkippedVariable { variable, reason } => {
                write!(f, "variable {} omitted: {}", variable, reason)
            }
            Diagnostic::DroppedClause(clause) => {
                write!(f, "projection clause {:?} ignored", clause)
            }
        }
    }
}

/// Warnings collected while building and projecting a dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub warnings: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.warnings.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }
}

/// Builds a dataset tree, leaving out variables that cannot be served.
#[derive(Debug)]
pub struct DatasetBuilder {
    dataset: DatasetNode,
    diagnostics: Diagnostics,
}

impl DatasetBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            dataset: DatasetNode::new(name),
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn info(mut self, info: DatasetInfo) -> Self {
        self.dataset.info = info;
        self
    }

    pub fn attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.dataset.attributes = attributes;
        self
    }

    /// Add an array. Arrays with an unsupported dtype are dropped and
    /// recorded as a diagnostic.
    pub fn array(
        mut self,
        name: &str,
        dims: Vec<Dimension>,
        dtype: DType,
        source: Arc<dyn ArraySource>,
        attributes: Vec<Attribute>,
    ) -> Self {
        match ArrayNode::new(name, dims, dtype) {
            Some(array) => self.dataset.children.push(DataNode::Array(
                array.with_source(source).with_attributes(attributes),
            )),
            None => {
                tracing::warn!("Omitting variable {}: unsupported dtype {}", name, dtype);
                self.diagnostics.push(Diagnostic::UnsupportedDtype {
                    variable: name.to_string(),
                    dtype,
                });
            }
        }
        self
    }

    /// Add an already built node.
    pub fn node(mut self, node: DataNode) -> Self {
        self.dataset.children.push(node);
        self
    }

    /// Record a variable that was skipped before reaching the builder.
    pub fn skipped(mut self, variable: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::warn!("Omitting variable {}: {}", variable, reason);
        self.diagnostics.push(Diagnostic::SkippedVariable {
            variable: variable.to_string(),
            reason,
        });
        self
    }

    /// Merge diagnostics collected elsewhere, e.g. while loading a child group.
    pub fn diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics.extend(diagnostics);
        self
    }

    pub fn build(self) -> (DatasetNode, Diagnostics) {
        (self.dataset, self.diagnostics)
    }
}
