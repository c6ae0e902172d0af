//! Arena-backed mutable document tree.
//!
//! Every node is stored in one vector and linked to its parent and children by
//! [`NodeId`]. A node's children are owned exclusively by that node: moving a
//! node detaches it from its previous parent first, and an extracted subtree
//! stays in the arena without being reachable from the document root.

use crate::node::{Element, Node, NodeData, NodeId};
use crate::query::Matcher;
use crate::serialize::{self, SerializeOptions};
use crate::{Result, TreeError};

/// A parsed or constructed document.
#[derive(Debug, Clone)]
pub struct MarkupTree {
    nodes: Vec<Node>,
}

impl MarkupTree {
    /// Create an empty tree holding only the document root
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
        }
    }

    /// The document root
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of arena slots, detached nodes and the document root included
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if nothing is attached under the document root
    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    /// Get a node by id
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or(TreeError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(TreeError::UnknownNode(id))
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element> {
        match &mut self.node_mut(id)?.data {
            NodeData::Element(element) => Ok(element),
            _ => Err(TreeError::NotAnElement(id)),
        }
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(data));
        id
    }

    /// Create an unattached element with no attributes or children
    pub fn new_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element(Element::new(tag)))
    }

    /// Create an unattached element with attributes in the given order
    pub fn new_element_with_attrs<I, K, V>(&mut self, tag: &str, attrs: I) -> NodeId
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut element = Element::new(tag);
        for (name, value) in attrs {
            element.attributes.insert(name.into(), value.into());
        }
        self.alloc(NodeData::Element(element))
    }

    /// Create an unattached text node
    pub fn new_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(text.to_string()))
    }

    /// Create an unattached comment node
    pub fn new_comment(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Comment(text.to_string()))
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Children of a node in document order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Element payload of a node
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.get(id).and_then(Node::as_element)
    }

    /// Tag name of an element
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    /// Get an attribute value by exact name
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    /// Check if an element carries an attribute
    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_some_and(|e| e.has_attr(name))
    }

    /// Set an attribute on an element
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        self.element_mut(id)?.set_attr(name, value);
        Ok(())
    }

    /// Remove an attribute, returning its previous value
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Result<Option<String>> {
        Ok(self.element_mut(id)?.attributes.shift_remove(name))
    }

    /// Text of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Text(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Concatenated text of a node and its descendants
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .filter_map(|d| self.text(d))
            .collect::<Vec<_>>()
            .join("")
    }

    /// Rename an element in place, keeping attributes and children
    pub fn rename(&mut self, id: NodeId, tag: &str) -> Result<()> {
        self.element_mut(id)?.tag = tag.to_string();
        Ok(())
    }

    /// Whether `ancestor` is `id` or one of its ancestors
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Whether the node is reachable from the document root
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.is_ancestor_or_self(self.root(), id)
    }

    /// Unlink a node from its parent, if any
    fn detach(&mut self, id: NodeId) -> Result<Option<usize>> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(None);
        };
        let siblings = &mut self.node_mut(parent)?.children;
        let position = siblings.iter().position(|&c| c == id);
        if let Some(position) = position {
            siblings.remove(position);
        }
        self.node_mut(id)?.parent = None;
        Ok(position)
    }

    /// Check that `child` may be placed under `parent`
    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<()> {
        if !self.node(parent)?.is_container() {
            return Err(TreeError::NotAContainer(parent));
        }
        self.node(child)?;
        if child == self.root() || self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::Cycle {
                node: child,
                parent,
            });
        }
        Ok(())
    }

    /// Append a node as the last child of `parent`, moving it if attached elsewhere
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_insert(parent, child)?;
        self.detach(child)?;
        self.node_mut(child)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Append text, merging into a trailing text node when there is one
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<()> {
        if let Some(&last) = self.node(parent)?.children.last() {
            if let NodeData::Text(existing) = &mut self.node_mut(last)?.data {
                existing.push_str(text);
                return Ok(());
            }
        }
        let node = self.new_text(text);
        self.append(parent, node)
    }

    /// Substitute `new` at `old`'s position; `old`'s subtree is detached
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<()> {
        if old == new {
            return Ok(());
        }
        let parent = self.node(old)?.parent.ok_or(TreeError::Detached(old))?;
        self.check_insert(parent, new)?;
        // `new` may currently sit before `old` among the same siblings
        self.detach(new)?;
        let position = self.detach(old)?.ok_or(TreeError::Detached(old))?;
        self.node_mut(new)?.parent = Some(parent);
        self.node_mut(parent)?.children.insert(position, new);
        Ok(())
    }

    /// Remove a node and its subtree from the tree
    pub fn extract(&mut self, id: NodeId) -> Result<()> {
        match self.detach(id)? {
            Some(_) => Ok(()),
            None => Err(TreeError::Detached(id)),
        }
    }

    /// Pre-order traversal of `id` and its descendants
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let stack = if self.get(id).is_some() { vec![id] } else { Vec::new() };
        Descendants { tree: self, stack }
    }

    /// Elements under the document root accepted by the matcher, in document order
    pub fn find_all(&self, matcher: &Matcher) -> Vec<NodeId> {
        self.find_all_in(self.root(), matcher)
    }

    /// Elements under `scope` (inclusive) accepted by the matcher, in document order
    pub fn find_all_in(&self, scope: NodeId, matcher: &Matcher) -> Vec<NodeId> {
        self.find_all_by(scope, |element| matcher.matches(element))
    }

    /// Elements under `scope` (inclusive) accepted by a closure
    pub fn find_all_by<F>(&self, scope: NodeId, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&Element) -> bool,
    {
        self.descendants(scope)
            .filter(|&id| self.element(id).is_some_and(&predicate))
            .collect()
    }

    /// First element with the given tag name, in document order
    pub fn find_first(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .find(|&id| self.tag(id) == Some(tag))
    }

    /// First element child of the document root
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root())
            .iter()
            .copied()
            .find(|&id| self.element(id).is_some())
    }

    /// Serialize a node and its subtree
    pub fn serialize(&self, id: NodeId, options: &SerializeOptions) -> String {
        serialize::serialize(self, id, options)
    }
}

impl Default for MarkupTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    tree: &'a MarkupTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        // Push children in reverse order for left-to-right traversal
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
