//! Dataset Attribute Structure (DAS) rendering.
//!
//! ```text
//! attributes {
//!     string title "Surface temperature";
//!     temp {
//!         string units "K";
//!         Float32 valid_range{200, 350};
//!     }
//! }
//! ```

use crate::attribute::{AttrValue, Attribute};
use crate::model::{DataNode, DatasetNode};
use crate::{FILL_UNIT, LINE_END};

/// Name of the outermost DAS block.
pub const DAS_ROOT: &str = "attributes";

/// Render the attribute description of a dataset.
pub fn render_das(dataset: &DatasetNode) -> String {
    let mut out = String::new();
    out.push_str(DAS_ROOT);
    out.push_str(" {");
    out.push_str(LINE_END);

    for attr in dataset.info.to_attributes().iter().chain(&dataset.attributes) {
        push_attribute(&mut out, attr, 1);
    }
    for child in &dataset.children {
        render_node(&mut out, child, 1);
    }

    out.push('}');
    out.push_str(LINE_END);
    out
}

fn render_node(out: &mut String, node: &DataNode, indent: usize) {
    let pad = FILL_UNIT.repeat(indent);
    out.push_str(&pad);
    out.push_str(node.name());
    out.push_str(" {");
    out.push_str(LINE_END);

    let attributes: &[Attribute] = match node {
        DataNode::Array(a) => a.attributes(),
        DataNode::Dataset(d) => &d.attributes,
        DataNode::Structure(_) | DataNode::Sequence(_) => &[],
    };
    for attr in attributes {
        push_attribute(out, attr, indent + 1);
    }
    for child in node.children() {
        render_node(out, child, indent + 1);
    }

    out.push_str(&pad);
    out.push('}');
    out.push_str(LINE_END);
}

fn push_attribute(out: &mut String, attr: &Attribute, indent: usize) {
    if let Some(line) = render_attribute(attr) {
        out.push_str(&FILL_UNIT.repeat(indent));
        out.push_str(&line);
        out.push(';');
        out.push_str(LINE_END);
    }
}

/// Render one attribute without indentation or terminator.
///
/// Returns `None` for hidden (`_`-prefixed) attributes and for numeric
/// attributes whose dtype has no DAP2 type.
pub fn render_attribute(attr: &Attribute) -> Option<String> {
    if !attr.is_visible() {
        return None;
    }

    match &attr.value {
        AttrValue::Text(text) => Some(format!("string {} \"{}\"", attr.name, escape(text))),
        AttrValue::Numeric { values, shape } => {
            let dap_type = values.dtype().dap_type()?;
            let formatted = values.format_each(dap_type.format());
            if shape.is_empty() {
                let value = formatted.first()?;
                Some(format!("{} {} {}", dap_type, attr.name, value))
            } else {
                Some(format!("{} {}{{{}}}", dap_type, attr.name, formatted.join(", ")))
            }
        }
    }
}

/// Escape backslashes and double quotes for a quoted DAS string.
pub fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
