//! Dataset Descriptor Structure (DDS) rendering.

use crate::model::{ArrayNode, DataNode, DatasetNode};
use crate::{FILL_UNIT, LINE_END};

/// Render the structure description of a (possibly projected) dataset.
pub fn render_dds(dataset: &DatasetNode) -> String {
    let mut out = String::new();
    render_block(&mut out, "dataset", &dataset.name, &dataset.children, 0);
    out
}

fn render_block(out: &mut String, keyword: &str, name: &str, children: &[DataNode], indent: usize) {
    let pad = FILL_UNIT.repeat(indent);
    out.push_str(&pad);
    out.push_str(keyword);
    out.push_str(" {");
    out.push_str(LINE_END);

    for child in children {
        render_node(out, child, indent + 1);
    }

    out.push_str(&pad);
    out.push_str("} ");
    out.push_str(name);
    out.push(';');
    out.push_str(LINE_END);
}

fn render_node(out: &mut String, node: &DataNode, indent: usize) {
    match node {
        DataNode::Array(array) => {
            out.push_str(&FILL_UNIT.repeat(indent));
            out.push_str(&array_declaration(array));
            out.push_str(LINE_END);
        }
        DataNode::Structure(c) => render_block(out, "structure", &c.name, &c.children, indent),
        DataNode::Sequence(c) => render_block(out, "sequence", &c.name, &c.children, indent),
        DataNode::Dataset(d) => render_block(out, "dataset", &d.name, &d.children, indent),
    }
}

/// Declaration line of an array, e.g. `Float32 temp[time=1][x=2];`.
///
/// Dimension sizes are the effective sizes after any bound projection.
pub fn array_declaration(array: &ArrayNode) -> String {
    let mut line = format!("{} {}", array.dap_type(), array.name());
    for (dim, size) in array.dims().iter().zip(array.effective_shape()) {
        line.push_str(&format!("[{}={}]", dim.name, size));
    }
    line.push(';');
    line
}
