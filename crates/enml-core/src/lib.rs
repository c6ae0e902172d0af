//! enml-core - mutable markup tree and serialization
//!
//! This crate provides the in-memory document tree shared by the HTML and ENML
//! sides of `enml`. Nodes live in an arena and are addressed by [`NodeId`], so
//! replacing or extracting a node never leaves a dangling reference behind:
//! the detached subtree simply stops being reachable from the document root.
//!
//! # Example
//!
//! ```rust
//! use enml_core::{Matcher, MarkupTree, SerializeOptions};
//!
//! let mut tree = MarkupTree::new();
//! let body = tree.new_element("body");
//! tree.append(tree.root(), body).unwrap();
//!
//! let input = tree.new_element_with_attrs("input", [("type", "checkbox")]);
//! tree.append(body, input).unwrap();
//!
//! let todo = tree.new_element("en-todo");
//! tree.replace(input, todo).unwrap();
//! tree.rename(body, "en-note").unwrap();
//!
//! assert!(tree.find_all(&Matcher::tag("input")).is_empty());
//! assert_eq!(
//!     tree.serialize(body, &SerializeOptions::xml()),
//!     "<en-note><en-todo/></en-note>"
//! );
//! ```

mod node;
mod query;
mod serialize;
mod tree;

pub use node::{Element, Node, NodeData, NodeId};
pub use query::Matcher;
pub use serialize::{
    escape_attr, escape_text, is_void, is_xml_name, SerializeOptions, Syntax, VOID_ELEMENTS,
};
pub use tree::{Descendants, MarkupTree};

/// Error type for tree mutations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("Node {0:?} does not belong to this tree")]
    UnknownNode(NodeId),

    #[error("Node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("Node {0:?} has no parent")]
    Detached(NodeId),

    #[error("Node {0:?} cannot hold child nodes")]
    NotAContainer(NodeId),

    #[error("Moving {node:?} under {parent:?} would create a cycle")]
    Cycle { node: NodeId, parent: NodeId },
}

pub type Result<T> = std::result::Result<T, TreeError>;
