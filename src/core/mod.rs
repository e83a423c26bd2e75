/// The document contract: load/save plus forwarding to the root node.
pub mod document;

/// Container nodes, array cursors and the backend operation table.
pub mod node;

pub mod object;
