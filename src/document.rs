//! In-memory markup document backing the typed model tree.
//!
//! [`Document`] is an arena of raw element nodes. It is the source of truth
//! for the model: every model node is a projection of exactly one raw node,
//! and every model-driven mutation (child creation, attribute edits, child
//! removal) writes through this adapter surface before the model updates its
//! own view.
//!
//! The arena hands out [`RawNodeId`]s that stay valid for the lifetime of the
//! document. Removing a node tombstones its slot; ids are never reused, so a
//! stale id held by a discarded model subtree can never alias a new node.
//! Reads against a tombstoned id return `None`/empty rather than panicking,
//! since stale reads are expected while a model subtree is being torn down.
//!
//! Load/serialize for the XML mapping dialect lives in [`xml`].

use serde::{Deserialize, Serialize};

use crate::error::MapdocError;

pub mod xml;

/// Stable handle to one raw element node within a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RawNodeId(u32);

impl RawNodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for RawNodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "raw:{}", self.0)
    }
}

/// One raw markup element: a tag, ordered attributes, and ordered children.
///
/// The mapping dialect is element/attribute only, so text and comment content
/// has no representation here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<RawNodeId>,
    parent: Option<RawNodeId>,
}

impl RawNode {
    fn new(tag: impl Into<String>) -> Self {
        RawNode {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }
}

/// Arena-backed markup tree with a single root element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    slots: Vec<Option<RawNode>>,
    root: RawNodeId,
}

impl Document {
    /// Create a document holding a single root element with the given tag.
    pub fn new(root_tag: impl Into<String>) -> Self {
        Document {
            slots: vec![Some(RawNode::new(root_tag))],
            root: RawNodeId(0),
        }
    }

    /// The document's root element. The root is always alive and cannot be
    /// removed.
    pub fn root(&self) -> RawNodeId {
        self.root
    }

    /// Whether `id` refers to a live (not removed) node.
    pub fn is_alive(&self, id: RawNodeId) -> bool {
        self.slots
            .get(id.index())
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    fn node(&self, id: RawNodeId) -> Option<&RawNode> {
        self.slots.get(id.index()).and_then(|slot| slot.as_ref())
    }

    fn node_mut(&mut self, id: RawNodeId) -> Option<&mut RawNode> {
        self.slots
            .get_mut(id.index())
            .and_then(|slot| slot.as_mut())
    }

    fn require(&self, id: RawNodeId) -> Result<&RawNode, MapdocError> {
        self.node(id)
            .ok_or_else(|| MapdocError::NotFound(format!("No live document node for {id}")))
    }

    /// Tag name of `id`, or `None` if the node was removed.
    pub fn tag(&self, id: RawNodeId) -> Option<&str> {
        self.node(id).map(|n| n.tag.as_str())
    }

    /// Ordered children of `id`. Empty for removed nodes.
    pub fn children(&self, id: RawNodeId) -> &[RawNodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Parent of `id`, `None` for the root or removed nodes.
    pub fn parent(&self, id: RawNodeId) -> Option<RawNodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Attribute value of `name` on `id`, `None` if absent or the node was
    /// removed.
    pub fn attribute(&self, id: RawNodeId, name: &str) -> Option<&str> {
        self.node(id).and_then(|n| {
            n.attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        })
    }

    /// All attributes of `id` in authored order. Empty for removed nodes.
    pub fn attributes(&self, id: RawNodeId) -> &[(String, String)] {
        self.node(id)
            .map(|n| n.attributes.as_slice())
            .unwrap_or(&[])
    }

    /// Set (or overwrite) an attribute, preserving authored attribute order
    /// for existing names.
    pub fn set_attribute(
        &mut self,
        id: RawNodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), MapdocError> {
        let name = name.into();
        let value = value.into();
        let node = self
            .node_mut(id)
            .ok_or_else(|| MapdocError::NotFound(format!("No live document node for {id}")))?;
        if let Some(entry) = node.attributes.iter_mut().find(|(key, _)| *key == name) {
            entry.1 = value;
        } else {
            node.attributes.push((name, value));
        }
        Ok(())
    }

    /// Remove an attribute. Returns whether the attribute was present.
    pub fn remove_attribute(&mut self, id: RawNodeId, name: &str) -> Result<bool, MapdocError> {
        let node = self
            .node_mut(id)
            .ok_or_else(|| MapdocError::NotFound(format!("No live document node for {id}")))?;
        let before = node.attributes.len();
        node.attributes.retain(|(key, _)| key != name);
        Ok(node.attributes.len() != before)
    }

    /// Allocate a new detached element. It joins the tree through
    /// [`Document::insert_child`].
    pub fn create_element(&mut self, tag: impl Into<String>) -> RawNodeId {
        let id = RawNodeId(self.slots.len() as u32);
        self.slots.push(Some(RawNode::new(tag)));
        id
    }

    /// Attach a detached element under `parent`, before `before` (or appended
    /// when `before` is `None`).
    ///
    /// Contract violations (attaching an already-attached node, the root, or
    /// positioning against a node that is not a child of `parent`) are
    /// programmer errors in the calling layer and fail immediately.
    pub fn insert_child(
        &mut self,
        parent: RawNodeId,
        node: RawNodeId,
        before: Option<RawNodeId>,
    ) -> Result<(), MapdocError> {
        if node == self.root {
            return Err(MapdocError::Contract(
                "The document root cannot be inserted under another node".to_string(),
            ));
        }
        if self.require(node)?.parent.is_some() {
            return Err(MapdocError::Contract(format!(
                "{node} is already attached; detach it before re-inserting"
            )));
        }
        let position = match before {
            Some(anchor) => {
                let siblings = &self.require(parent)?.children;
                match siblings.iter().position(|child| *child == anchor) {
                    Some(pos) => pos,
                    None => {
                        return Err(MapdocError::Contract(format!(
                            "Insertion anchor {anchor} is not a child of {parent}"
                        )))
                    }
                }
            }
            None => self.require(parent)?.children.len(),
        };
        // Validated above; both nodes are live.
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.insert(position, node);
        }
        if let Some(child_node) = self.node_mut(node) {
            child_node.parent = Some(parent);
        }
        Ok(())
    }

    /// Detach `id` from its parent and tombstone it together with its whole
    /// subtree. The freed ids are never reused.
    pub fn remove_node(&mut self, id: RawNodeId) -> Result<(), MapdocError> {
        if id == self.root {
            return Err(MapdocError::Contract(
                "The document root cannot be removed".to_string(),
            ));
        }
        let parent = self.require(id)?.parent;
        if let Some(parent) = parent {
            if let Some(parent_node) = self.node_mut(parent) {
                parent_node.children.retain(|child| *child != id);
            }
        }
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.slots.get_mut(next.index()).and_then(Option::take) {
                pending.extend(node.children);
            }
        }
        Ok(())
    }

    /// Number of live nodes in the arena.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_doc() -> (Document, RawNodeId, RawNodeId) {
        let mut doc = Document::new("Mapping");
        let first = doc.create_element("ComplexTypeMapping");
        let second = doc.create_element("ComplexTypeMapping");
        doc.insert_child(doc.root(), first, None).unwrap();
        doc.insert_child(doc.root(), second, None).unwrap();
        (doc, first, second)
    }

    #[test]
    fn test_insert_order_and_before_anchor() {
        let (mut doc, first, second) = sample_doc();
        assert_eq!(doc.children(doc.root()), &[first, second]);

        let head = doc.create_element("ComplexType");
        doc.insert_child(doc.root(), head, Some(first)).unwrap();
        assert_eq!(doc.children(doc.root()), &[head, first, second]);
    }

    #[test]
    fn test_insert_anchor_must_be_child() {
        let (mut doc, first, _) = sample_doc();
        let grandchild = doc.create_element("ScalarProperty");
        doc.insert_child(first, grandchild, None).unwrap();

        let stray = doc.create_element("Condition");
        let err = doc
            .insert_child(doc.root(), stray, Some(grandchild))
            .unwrap_err();
        assert!(matches!(err, MapdocError::Contract(_)));
    }

    #[test]
    fn test_double_attach_rejected() {
        let (mut doc, first, _) = sample_doc();
        let err = doc.insert_child(doc.root(), first, None).unwrap_err();
        assert!(matches!(err, MapdocError::Contract(_)));
    }

    #[test]
    fn test_remove_tombstones_subtree() {
        let (mut doc, first, second) = sample_doc();
        let grandchild = doc.create_element("ScalarProperty");
        doc.insert_child(first, grandchild, None).unwrap();

        doc.remove_node(first).unwrap();
        assert!(!doc.is_alive(first));
        assert!(!doc.is_alive(grandchild));
        assert_eq!(doc.children(doc.root()), &[second]);

        // Reads against the tombstone degrade instead of panicking
        assert!(doc.tag(first).is_none());
        assert!(doc.children(first).is_empty());
        assert!(doc.attribute(first, "TypeName").is_none());
    }

    #[test]
    fn test_root_is_not_removable() {
        let (mut doc, _, _) = sample_doc();
        let root = doc.root();
        assert!(matches!(
            doc.remove_node(root),
            Err(MapdocError::Contract(_))
        ));
    }

    #[test]
    fn test_attribute_roundtrip_preserves_order() {
        let (mut doc, first, _) = sample_doc();
        doc.set_attribute(first, "TypeName", "CustomerInfo").unwrap();
        doc.set_attribute(first, "IsPartial", "true").unwrap();
        doc.set_attribute(first, "TypeName", "OrderInfo").unwrap();

        assert_eq!(doc.attribute(first, "TypeName"), Some("OrderInfo"));
        assert_eq!(
            doc.attributes(first)
                .iter()
                .map(|(k, _)| k.as_str())
                .collect::<Vec<_>>(),
            vec!["TypeName", "IsPartial"]
        );

        assert!(doc.remove_attribute(first, "IsPartial").unwrap());
        assert!(!doc.remove_attribute(first, "IsPartial").unwrap());
        assert!(doc.attribute(first, "IsPartial").is_none());
    }
}
