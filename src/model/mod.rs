//! The typed model tree: a live, strongly-typed projection of a markup
//! document.
//!
//! A [`ModelTree`] owns a [`Document`] and an arena of [`ModelNode`]s, each
//! backed by exactly one raw element. Nodes move through the
//! [`ModelState`] lifecycle: parsing materializes typed child collections,
//! value cells, and reference bindings from the backing element; a later
//! resolve pass asks every binding to re-resolve against a
//! [`SymbolCatalog`](crate::catalog::SymbolCatalog). The two passes are
//! separate so that forward references anywhere in the document set can
//! resolve once everything is parsed.
//!
//! Unrecognized document structure is recorded as diagnostics and skipped,
//! never fatal: a document being edited interactively is expected to be
//! transiently malformed. Broken calling contracts (resolving before the
//! parse pass completed, re-parsing without an explicit reset) fail
//! immediately with [`MapdocError::Contract`], since those signal an engine
//! bug rather than bad input data.

use serde::Serialize;

use crate::catalog::SymbolCatalog;
use crate::diagnostic::ParseDiagnostic;
use crate::document::{Document, RawNodeId};
use crate::error::MapdocError;
use crate::schema::{ElementKind, InsertRule, SCHEMAS};

pub mod binding;
pub mod value;

pub use binding::{BindingStatus, ReferenceBinding};
pub use value::{ScalarKind, ScalarValue, ValueCell};

/// Stable handle to one model node within a [`ModelTree`] arena.
///
/// Like [`RawNodeId`], slots are tombstoned on release and ids are never
/// reused within one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ModelId(u32);

impl ModelId {
    pub(crate) fn from_index(index: u32) -> Self {
        ModelId(index)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "model:{}", self.0)
    }
}

/// Lifecycle state of a model node.
///
/// Ordered: state only ever advances, except through an explicit re-parse
/// reset. `ParseFailed` (the backing element vanished mid-parse) sits below
/// `Parsed` and is terminal until a re-parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ModelState {
    /// Just constructed; no content materialized
    Unparsed,
    /// Parse entered but not completed
    Parsing,
    /// Structural parse failure; terminal until an explicit re-parse
    ParseFailed,
    /// Children, cells, and bindings materialized; cross-references not yet
    /// checked
    Parsed,
    /// Every required binding is `Known` and every optional one `Known` or
    /// `Undefined`
    Resolved,
}

/// One entry of a node's uniform child view: typed children first (in schema
/// declaration order), then reference bindings, then value cells.
#[derive(Debug)]
pub enum ModelMember<'a> {
    Child(ModelId),
    Binding(&'a ReferenceBinding),
    Cell(&'a ValueCell),
}

/// One typed model node, backed by exactly one raw document element.
#[derive(Debug)]
pub struct ModelNode {
    kind: ElementKind,
    state: ModelState,
    element: RawNodeId,
    parent: Option<ModelId>,
    cells: Vec<ValueCell>,
    bindings: Vec<ReferenceBinding>,
    /// Typed child collections, one per declared
    /// [`ChildSpec`](crate::schema::ChildSpec), in declaration order
    children: Vec<(ElementKind, Vec<ModelId>)>,
}

impl ModelNode {
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    /// The backing raw document element.
    pub fn element(&self) -> RawNodeId {
        self.element
    }

    pub fn parent(&self) -> Option<ModelId> {
        self.parent
    }

    /// The value cell projected from `attribute`, if this kind declares one.
    pub fn cell(&self, attribute: &str) -> Option<&ValueCell> {
        self.cells.iter().find(|cell| cell.attribute() == attribute)
    }

    /// The reference binding projected from `attribute`, if this kind
    /// declares one.
    pub fn binding(&self, attribute: &str) -> Option<&ReferenceBinding> {
        self.bindings
            .iter()
            .find(|binding| binding.attribute() == attribute)
    }

    pub fn cells(&self) -> &[ValueCell] {
        &self.cells
    }

    pub fn bindings(&self) -> &[ReferenceBinding] {
        &self.bindings
    }

    /// The typed children of one declared kind, in document order.
    pub fn children_of(&self, kind: ElementKind) -> &[ModelId] {
        self.children
            .iter()
            .find(|(child_kind, _)| *child_kind == kind)
            .map(|(_, ids)| ids.as_slice())
            .unwrap_or(&[])
    }

    /// All typed children across collections, collection-major.
    pub fn child_ids(&self) -> impl Iterator<Item = ModelId> + '_ {
        self.children.iter().flat_map(|(_, ids)| ids.iter().copied())
    }

    /// The uniform child view: typed child collections in declaration order,
    /// then bindings, then cells, as a composed lazy sequence. Enumeration
    /// order only; no document-ordering guarantee.
    pub fn members(&self) -> impl Iterator<Item = ModelMember<'_>> {
        self.child_ids()
            .map(ModelMember::Child)
            .chain(self.bindings.iter().map(ModelMember::Binding))
            .chain(self.cells.iter().map(ModelMember::Cell))
    }
}

/// Result of a whole-document parse pass.
#[derive(Debug)]
pub struct ParseOutcome {
    pub root: ModelId,
    /// Non-fatal conditions recorded while parsing
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// The typed model tree over one document.
#[derive(Debug)]
pub struct ModelTree {
    doc: Document,
    nodes: Vec<Option<ModelNode>>,
    root: Option<ModelId>,
    diagnostics: Vec<ParseDiagnostic>,
}

impl ModelTree {
    /// Wrap a document. No model nodes exist until [`ModelTree::parse`].
    pub fn new(doc: Document) -> Self {
        ModelTree {
            doc,
            nodes: Vec::new(),
            root: None,
            diagnostics: Vec::new(),
        }
    }

    /// The backing document.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Mutable access to the backing document for edits made outside the
    /// typed model (attribute edits, raw structure changes). The model does
    /// not observe such edits until the affected nodes are re-parsed or
    /// re-resolved.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// The root model node, once parsed.
    pub fn root(&self) -> Option<ModelId> {
        self.root
    }

    pub fn node(&self, id: ModelId) -> Option<&ModelNode> {
        self.nodes.get(id.index()).and_then(|slot| slot.as_ref())
    }

    fn node_mut(&mut self, id: ModelId) -> Option<&mut ModelNode> {
        self.nodes
            .get_mut(id.index())
            .and_then(|slot| slot.as_mut())
    }

    fn require(&self, id: ModelId) -> Result<&ModelNode, MapdocError> {
        self.node(id)
            .ok_or_else(|| MapdocError::NotFound(format!("No live model node for {id}")))
    }

    /// All live nodes, in allocation order.
    pub fn nodes(&self) -> impl Iterator<Item = (ModelId, &ModelNode)> {
        self.nodes.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref().map(|node| (ModelId(index as u32), node))
        })
    }

    /// Diagnostics accumulated by incremental operations since the last
    /// [`ModelTree::drain_diagnostics`].
    pub fn diagnostics(&self) -> &[ParseDiagnostic] {
        &self.diagnostics
    }

    pub fn drain_diagnostics(&mut self) -> Vec<ParseDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn alloc(&mut self, kind: ElementKind, element: RawNodeId, parent: Option<ModelId>) -> ModelId {
        let id = ModelId(self.nodes.len() as u32);
        self.nodes.push(Some(ModelNode {
            kind,
            state: ModelState::Unparsed,
            element,
            parent,
            cells: Vec::new(),
            bindings: Vec::new(),
            children: Vec::new(),
        }));
        id
    }

    /// Tombstone a model subtree, detaching every node individually so
    /// nothing can be reused against a stale document element.
    fn release(&mut self, id: ModelId) {
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.get_mut(next.index()).and_then(Option::take) {
                pending.extend(node.child_ids());
            }
        }
    }

    /// Parse the whole document into the typed tree.
    ///
    /// Calling this on a tree that already holds a parsed model is a
    /// contract violation; re-parsing goes through [`ModelTree::reparse`].
    pub fn parse(&mut self) -> Result<ParseOutcome, MapdocError> {
        if self.root.is_some() {
            return Err(MapdocError::Contract(
                "Tree is already parsed; re-parsing must go through reparse()".to_string(),
            ));
        }
        let root_raw = self.doc.root();
        let root_tag = self
            .doc
            .tag(root_raw)
            .expect("document root is always alive")
            .to_string();
        let Some(schema) = SCHEMAS.get_by_tag(&root_tag) else {
            return Err(MapdocError::Codec(format!(
                "No schema registered for root element tag {root_tag:?}"
            )));
        };
        let root = self.alloc(schema.kind, root_raw, None);
        self.root = Some(root);
        self.parse_node(root)?;
        Ok(ParseOutcome {
            root,
            diagnostics: self.drain_diagnostics(),
        })
    }

    /// The explicit reset-and-re-parse: releases every model node and parses
    /// the document afresh.
    pub fn reparse(&mut self) -> Result<ParseOutcome, MapdocError> {
        if let Some(root) = self.root.take() {
            self.release(root);
        }
        self.nodes.clear();
        self.diagnostics.clear();
        self.parse()
    }

    /// Parse one node from its backing element: release prior content,
    /// materialize cells and bindings, dispatch child elements by tag, and
    /// recurse.
    fn parse_node(&mut self, id: ModelId) -> Result<(), MapdocError> {
        let (kind, element, state) = {
            let node = self.require(id)?;
            (node.kind, node.element, node.state)
        };
        if matches!(state, ModelState::Parsed | ModelState::Resolved) {
            return Err(MapdocError::Contract(format!(
                "{id} is already in state {state:?}; re-parsing must go through an explicit reset"
            )));
        }
        let Some(schema) = SCHEMAS.get(kind) else {
            return Err(MapdocError::Codec(format!(
                "No schema registered for {kind:?}"
            )));
        };

        // Ownership release, not merely emptying: every prior child is
        // individually tombstoned before the node re-materializes.
        let old_children: Vec<ModelId> = {
            let node = self.node_mut(id).expect("required above");
            node.state = ModelState::Parsing;
            node.cells.clear();
            node.bindings.clear();
            node.children.drain(..).flat_map(|(_, ids)| ids).collect()
        };
        for child in old_children {
            self.release(child);
        }

        if !self.doc.is_alive(element) {
            // The backing element vanished under us, e.g. a subtree removed
            // while a discarded model still pointed at it. Tolerated, not
            // fatal.
            self.diagnostics.push(ParseDiagnostic::warning(format!(
                "Backing document node {element} for {id} ({kind:?}) is gone; marking parse failed"
            )));
            if let Some(node) = self.node_mut(id) {
                node.state = ModelState::ParseFailed;
            }
            return Ok(());
        }
        let tag = self
            .doc
            .tag(element)
            .expect("liveness checked above")
            .to_string();

        // Cells and bindings are materialized eagerly, one per declared
        // spec, authored or not.
        let mut cells = Vec::with_capacity(schema.cells.len());
        for spec in &schema.cells {
            let authored = self
                .doc
                .attribute(element, spec.attribute)
                .map(str::to_string);
            let (cell, diagnostic) = ValueCell::from_spec(spec, &tag, authored.as_deref());
            cells.push(cell);
            self.diagnostics.extend(diagnostic);
        }
        let mut bindings = Vec::with_capacity(schema.bindings.len());
        for spec in &schema.bindings {
            let authored = self
                .doc
                .attribute(element, spec.attribute)
                .map(str::to_string);
            bindings.push(ReferenceBinding::from_spec(spec, authored.as_deref()));
        }
        for (name, _) in self.doc.attributes(element) {
            if !schema.knows_attribute(name) {
                self.diagnostics
                    .push(ParseDiagnostic::unrecognized_attribute(&tag, name));
            }
        }
        {
            let node = self.node_mut(id).expect("required above");
            node.cells = cells;
            node.bindings = bindings;
            node.children = schema
                .children
                .iter()
                .map(|spec| (spec.kind, Vec::new()))
                .collect();
        }

        // Tag-name dispatch over the backing element's children. Tags with
        // no declared child kind fall through to the generic handler, which
        // recognizes nothing further and records the structure as a
        // diagnostic.
        let raw_children: Vec<RawNodeId> = self.doc.children(element).to_vec();
        for raw_child in raw_children {
            let Some(child_tag) = self.doc.tag(raw_child).map(str::to_string) else {
                continue;
            };
            let matched = schema.children.iter().find(|spec| {
                SCHEMAS
                    .get(spec.kind)
                    .map(|child_schema| child_schema.tag == child_tag)
                    .unwrap_or(false)
            });
            match matched {
                Some(spec) => {
                    let child_kind = spec.kind;
                    let child_id = self.alloc(child_kind, raw_child, Some(id));
                    let node = self.node_mut(id).expect("required above");
                    if let Some((_, ids)) = node
                        .children
                        .iter_mut()
                        .find(|(kind, _)| *kind == child_kind)
                    {
                        ids.push(child_id);
                    }
                    self.parse_node(child_id)?;
                }
                None => {
                    self.diagnostics
                        .push(ParseDiagnostic::unrecognized_element(&tag, &child_tag));
                }
            }
        }

        if let Some(node) = self.node_mut(id) {
            node.state = ModelState::Parsed;
        }
        Ok(())
    }

    /// Run the resolve pass: every node rebinds its own reference bindings
    /// against the catalog (no inherited recursion; the tree walk is the
    /// driver) and advances to `Resolved` iff all of them are satisfied.
    ///
    /// Returns the number of nodes left short of `Resolved`. Invoking this
    /// while any node is still mid-parse is a contract violation.
    pub fn resolve(&mut self, catalog: &dyn SymbolCatalog) -> Result<usize, MapdocError> {
        if self.root.is_none() {
            return Err(MapdocError::Contract(
                "resolve() invoked before parse()".to_string(),
            ));
        }
        let ids: Vec<ModelId> = self.nodes().map(|(id, _)| id).collect();
        for id in &ids {
            let state = self.require(*id)?.state;
            if matches!(state, ModelState::Unparsed | ModelState::Parsing) {
                return Err(MapdocError::Contract(format!(
                    "resolve() invoked while {id} is still in state {state:?}"
                )));
            }
        }

        let mut unresolved = 0;
        for id in ids {
            let doc = &self.doc;
            let node = self.nodes[id.index()]
                .as_mut()
                .expect("live id collected above");
            if node.state == ModelState::ParseFailed {
                unresolved += 1;
                continue;
            }
            let element = node.element;
            let mut satisfied = true;
            for binding in node.bindings.iter_mut() {
                binding.rebind(doc, element, catalog);
                satisfied &= binding.is_satisfied();
            }
            // Each resolve pass is a fresh evaluation; statuses and the
            // derived state are recomputed wholesale, never patched.
            node.state = if satisfied {
                ModelState::Resolved
            } else {
                unresolved += 1;
                ModelState::Parsed
            };
        }
        tracing::debug!(
            "Resolve pass complete: {} node(s) short of Resolved",
            unresolved
        );
        Ok(unresolved)
    }

    /// Create a new typed child of `kind` under `parent`, writing the backing
    /// element through the document at the position the parent schema's
    /// insertion rule mandates, then parsing the new node.
    ///
    /// Creating a child kind the parent schema does not declare is a
    /// contract violation.
    pub fn create_child(
        &mut self,
        parent: ModelId,
        kind: ElementKind,
    ) -> Result<ModelId, MapdocError> {
        let (parent_kind, parent_element, parent_state) = {
            let node = self.require(parent)?;
            (node.kind, node.element, node.state)
        };
        if !matches!(parent_state, ModelState::Parsed | ModelState::Resolved) {
            return Err(MapdocError::Contract(format!(
                "Cannot create children under {parent} in state {parent_state:?}"
            )));
        }
        let parent_schema = SCHEMAS.get(parent_kind).ok_or_else(|| {
            MapdocError::Codec(format!("No schema registered for {parent_kind:?}"))
        })?;
        let Some(child_spec) = parent_schema.child_spec(kind).copied() else {
            return Err(MapdocError::Contract(format!(
                "{parent_kind:?} declares no child collection of kind {kind:?}"
            )));
        };
        let child_schema = SCHEMAS
            .get(kind)
            .ok_or_else(|| MapdocError::Codec(format!("No schema registered for {kind:?}")))?;

        let raw = self.doc.create_element(child_schema.tag);
        let before = match child_spec.insert {
            InsertRule::First => self.doc.children(parent_element).first().copied(),
            InsertRule::Append => None,
        };
        self.doc.insert_child(parent_element, raw, before)?;

        let child = self.alloc(kind, raw, Some(parent));
        let node = self.node_mut(parent).expect("required above");
        if let Some((_, ids)) = node.children.iter_mut().find(|(k, _)| *k == kind) {
            // Collection order mirrors document order for head insertions
            if child_spec.insert == InsertRule::First {
                ids.insert(0, child);
            } else {
                ids.push(child);
            }
        }
        self.parse_node(child)?;
        Ok(child)
    }

    /// Deletion notification: the document child backed by `raw` was removed.
    /// Drops the corresponding typed child from exactly the one collection it
    /// belonged to and releases its model subtree.
    ///
    /// A raw node with no typed counterpart falls through to the generic
    /// handler, which records the condition as a diagnostic.
    pub fn on_child_removed(&mut self, parent: ModelId, raw: RawNodeId) -> Option<ModelId> {
        let found = self.node(parent).and_then(|node| {
            node.children.iter().enumerate().find_map(|(slot, (_, ids))| {
                ids.iter()
                    .position(|child| {
                        self.node(*child)
                            .map(|child_node| child_node.element == raw)
                            .unwrap_or(false)
                    })
                    .map(|pos| (slot, pos))
            })
        });
        match found {
            Some((slot, pos)) => {
                let node = self.node_mut(parent).expect("checked above");
                let child = node.children[slot].1.remove(pos);
                self.release(child);
                Some(child)
            }
            None => {
                self.diagnostics.push(ParseDiagnostic::warning(format!(
                    "Removal of {raw} reported to {parent}, which tracks no typed child backed by it"
                )));
                None
            }
        }
    }

    /// Model-driven deletion: remove a typed child's backing element from the
    /// document, then notify its parent.
    pub fn delete_child(&mut self, child: ModelId) -> Result<(), MapdocError> {
        let (element, parent) = {
            let node = self.require(child)?;
            (node.element, node.parent)
        };
        let Some(parent) = parent else {
            return Err(MapdocError::Contract(
                "The root model node cannot be deleted".to_string(),
            ));
        };
        self.doc.remove_node(element)?;
        self.on_child_removed(parent, element);
        Ok(())
    }
}
