//! Symbol catalog: global lookup from normalized identifier to the model
//! node it names.
//!
//! The catalog is scoped to the whole document set currently loaded, not to
//! one document, so cross-document references resolve the same way local ones
//! do. It is read-shared by every reference binding during a resolve pass and
//! is never mutated by the engine itself; after document mutations it is
//! rebuilt wholesale, not patched.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::binding::normalize_symbol;
use crate::model::{ModelId, ModelTree};
use crate::schema::{ElementKind, SCHEMAS};

/// Identifies one model node across the loaded document set: which tree it
/// lives in (by the caller's ordering of trees) and which node within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SymbolRef {
    pub tree: usize,
    pub node: ModelId,
}

/// Resolution source for [`ReferenceBinding`](crate::model::binding::ReferenceBinding)s.
///
/// Contract: `lookup` returns at most one canonical match per normalized
/// identifier within a kind, or `None`. Ambiguity handling is the catalog's
/// responsibility, not the binding's.
pub trait SymbolCatalog {
    fn lookup(&self, kind: ElementKind, ident: &str) -> Option<SymbolRef>;
}

/// Concrete catalog built by scanning model trees for nodes whose schema
/// declares a symbol-name attribute.
///
/// Two or more nodes of the same kind normalizing to the same identifier make
/// that identifier ambiguous: it is evicted from the table and `lookup`
/// returns `None`, so referencing bindings report `Unknown` instead of
/// silently picking a winner.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    entries: HashMap<(ElementKind, String), SymbolRef>,
    ambiguous: HashSet<(ElementKind, String)>,
}

impl SymbolTable {
    /// An empty catalog. Useful as the resolution source for a document set
    /// with no symbol definitions at all.
    pub fn empty() -> Self {
        SymbolTable::default()
    }

    /// Build a catalog over the given trees. The slice order defines the
    /// `tree` component of every produced [`SymbolRef`].
    pub fn build(trees: &[&ModelTree]) -> Self {
        let mut table = SymbolTable::empty();
        for (tree_index, tree) in trees.iter().enumerate() {
            for (node_id, node) in tree.nodes() {
                let Some(schema) = SCHEMAS.get(node.kind()) else {
                    continue;
                };
                let Some(name_attribute) = schema.name_attribute else {
                    continue;
                };
                let Some(ident) = tree
                    .document()
                    .attribute(node.element(), name_attribute)
                    .and_then(normalize_symbol)
                else {
                    continue;
                };
                table.insert(
                    node.kind(),
                    &ident,
                    SymbolRef {
                        tree: tree_index,
                        node: node_id,
                    },
                );
            }
        }
        tracing::debug!(
            "Symbol table built over {} tree(s): {} entries, {} ambiguous",
            trees.len(),
            table.entries.len(),
            table.ambiguous.len()
        );
        table
    }

    /// Insert one symbol, applying the ambiguity policy.
    pub fn insert(&mut self, kind: ElementKind, ident: &str, target: SymbolRef) {
        let key = (kind, ident.to_string());
        if self.ambiguous.contains(&key) {
            return;
        }
        match self.entries.get(&key) {
            Some(existing) if *existing != target => {
                tracing::warn!(
                    "Identifier {ident:?} is ambiguous among {kind:?} symbols; \
                     references to it will not resolve"
                );
                self.entries.remove(&key);
                self.ambiguous.insert(key);
            }
            Some(_) => {}
            None => {
                self.entries.insert(key, target);
            }
        }
    }

    /// Number of unambiguous symbols in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `ident` was declared by multiple `kind` symbols.
    pub fn is_ambiguous(&self, kind: ElementKind, ident: &str) -> bool {
        self.ambiguous.contains(&(kind, ident.to_string()))
    }
}

impl SymbolCatalog for SymbolTable {
    fn lookup(&self, kind: ElementKind, ident: &str) -> Option<SymbolRef> {
        self.entries.get(&(kind, ident.to_string())).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(tree: usize, node: u32) -> SymbolRef {
        SymbolRef {
            tree,
            node: ModelId::from_index(node),
        }
    }

    #[test]
    fn test_lookup_is_kind_scoped() {
        let mut table = SymbolTable::empty();
        table.insert(ElementKind::ComplexType, "Foo", target(0, 1));
        table.insert(ElementKind::Property, "Foo", target(0, 2));

        assert_eq!(
            table.lookup(ElementKind::ComplexType, "Foo"),
            Some(target(0, 1))
        );
        assert_eq!(table.lookup(ElementKind::Property, "Foo"), Some(target(0, 2)));
        assert_eq!(table.lookup(ElementKind::Condition, "Foo"), None);
    }

    #[test]
    fn test_duplicate_identifier_is_evicted() {
        let mut table = SymbolTable::empty();
        table.insert(ElementKind::ComplexType, "Dup", target(0, 1));
        table.insert(ElementKind::ComplexType, "Dup", target(0, 2));

        assert_eq!(table.lookup(ElementKind::ComplexType, "Dup"), None);
        assert!(table.is_ambiguous(ElementKind::ComplexType, "Dup"));

        // A third definition cannot resurrect the identifier
        table.insert(ElementKind::ComplexType, "Dup", target(0, 3));
        assert_eq!(table.lookup(ElementKind::ComplexType, "Dup"), None);
    }

    #[test]
    fn test_reinserting_same_target_is_not_ambiguous() {
        let mut table = SymbolTable::empty();
        table.insert(ElementKind::ComplexType, "Foo", target(0, 1));
        table.insert(ElementKind::ComplexType, "Foo", target(0, 1));

        assert_eq!(table.lookup(ElementKind::ComplexType, "Foo"), Some(target(0, 1)));
        assert!(!table.is_ambiguous(ElementKind::ComplexType, "Foo"));
        assert_eq!(table.len(), 1);
    }
}
