//! Named reference bindings: symbolic cross-references resolved lazily
//! against a symbol catalog.
//!
//! A [`ReferenceBinding`] wraps one attribute whose value names another model
//! node. The relation is weak: the catalog owns the target's lifetime, the
//! binding only records the outcome of its last resolve attempt. Statuses are
//! recomputed wholesale on every [`ReferenceBinding::rebind`], never patched
//! incrementally, so a binding can always be re-resolved after any document
//! mutation.

use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

use crate::catalog::{SymbolCatalog, SymbolRef};
use crate::document::{Document, RawNodeId};
use crate::schema::{BindingSpec, ElementKind};

/// Outcome of a binding's last resolve attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BindingStatus {
    /// The identifier resolved to exactly one target of the declared kind
    Known(SymbolRef),
    /// The attribute is absent or empty. A legal "no reference" state for
    /// optional bindings.
    Undefined,
    /// The attribute names an identifier with no unambiguous catalog match
    Unknown,
}

impl BindingStatus {
    /// The resolved target, if the identifier is known.
    pub fn target(&self) -> Option<SymbolRef> {
        match self {
            BindingStatus::Known(target) => Some(*target),
            _ => None,
        }
    }
}

/// Normalize a symbolic identifier for catalog lookup: Unicode NFC fold plus
/// surrounding-whitespace trim. Matching stays case-sensitive. Returns `None`
/// for identifiers that normalize to the empty string.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let normalized: String = raw.trim().nfc().collect();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// One symbolic cross-reference from a model node to a node of a declared
/// target kind.
///
/// Bindings are constructed eagerly during parse (one per declared
/// [`BindingSpec`], authored or not) and recreated wholesale on every
/// re-parse of their owning node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceBinding {
    attribute: &'static str,
    target_kind: ElementKind,
    required: bool,
    /// Raw identifier text as last read from the backing attribute
    raw: Option<String>,
    status: BindingStatus,
}

impl ReferenceBinding {
    pub(crate) fn from_spec(spec: &BindingSpec, authored: Option<&str>) -> ReferenceBinding {
        // Until the first rebind the only thing knowable without a catalog is
        // whether an identifier was authored at all.
        let status = match authored.and_then(normalize_symbol) {
            Some(_) => BindingStatus::Unknown,
            None => BindingStatus::Undefined,
        };
        ReferenceBinding {
            attribute: spec.attribute,
            target_kind: spec.target,
            required: spec.required,
            raw: authored.map(str::to_string),
            status,
        }
    }

    /// The backing attribute name.
    pub fn attribute(&self) -> &'static str {
        self.attribute
    }

    /// The kind the identifier must resolve to.
    pub fn target_kind(&self) -> ElementKind {
        self.target_kind
    }

    /// Whether the owning node needs this binding `Known` to reach the
    /// resolved lifecycle state.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Raw identifier text as last read from the backing attribute.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Outcome of the last resolve attempt.
    pub fn status(&self) -> BindingStatus {
        self.status
    }

    /// Whether the last resolve attempt left this binding in a state that
    /// keeps its owning node resolvable: `Known`, or `Undefined` when the
    /// binding is optional.
    pub fn is_satisfied(&self) -> bool {
        match self.status {
            BindingStatus::Known(_) => true,
            BindingStatus::Undefined => !self.required,
            BindingStatus::Unknown => false,
        }
    }

    /// Re-read the raw identifier from the backing attribute and recompute
    /// status against the catalog.
    ///
    /// Idempotent and side-effect-free beyond this binding's own raw text and
    /// status: it never mutates the document or other nodes.
    pub fn rebind(
        &mut self,
        doc: &Document,
        element: RawNodeId,
        catalog: &dyn SymbolCatalog,
    ) -> BindingStatus {
        self.raw = doc.attribute(element, self.attribute).map(str::to_string);
        self.status = match self.raw.as_deref().and_then(normalize_symbol) {
            None => BindingStatus::Undefined,
            Some(ident) => match catalog.lookup(self.target_kind, &ident) {
                Some(target) => BindingStatus::Known(target),
                None => {
                    tracing::debug!(
                        "No {:?} symbol matches identifier {ident:?} for attribute '{}'",
                        self.target_kind,
                        self.attribute
                    );
                    BindingStatus::Unknown
                }
            },
        };
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SymbolTable;
    use crate::model::ModelId;

    fn type_name_spec() -> BindingSpec {
        BindingSpec {
            attribute: "TypeName",
            target: ElementKind::ComplexType,
            required: false,
        }
    }

    fn catalog_with(entries: &[(ElementKind, &str, SymbolRef)]) -> SymbolTable {
        let mut table = SymbolTable::empty();
        for (kind, ident, target) in entries {
            table.insert(*kind, ident, *target);
        }
        table
    }

    fn target(node: u32) -> SymbolRef {
        SymbolRef {
            tree: 0,
            node: ModelId::from_index(node),
        }
    }

    #[test]
    fn test_absent_attribute_is_undefined_not_unknown() {
        let mut doc = Document::new("ComplexTypeMapping");
        let element = doc.root();
        let catalog = catalog_with(&[(ElementKind::ComplexType, "Foo", target(7))]);

        let mut binding = ReferenceBinding::from_spec(&type_name_spec(), None);
        assert_eq!(binding.rebind(&doc, element, &catalog), BindingStatus::Undefined);
        assert!(binding.is_satisfied());
    }

    #[test]
    fn test_known_match_sets_target() {
        let mut doc = Document::new("ComplexTypeMapping");
        let element = doc.root();
        doc.set_attribute(element, "TypeName", "Foo").unwrap();
        let catalog = catalog_with(&[(ElementKind::ComplexType, "Foo", target(7))]);

        let mut binding = ReferenceBinding::from_spec(&type_name_spec(), Some("Foo"));
        let status = binding.rebind(&doc, element, &catalog);
        assert_eq!(status, BindingStatus::Known(target(7)));
        assert_eq!(status.target(), Some(target(7)));
    }

    #[test]
    fn test_no_match_is_unknown_with_no_target() {
        let mut doc = Document::new("ComplexTypeMapping");
        let element = doc.root();
        doc.set_attribute(element, "TypeName", "Missing").unwrap();
        let catalog = catalog_with(&[(ElementKind::ComplexType, "Foo", target(7))]);

        let mut binding = ReferenceBinding::from_spec(&type_name_spec(), Some("Missing"));
        let status = binding.rebind(&doc, element, &catalog);
        assert_eq!(status, BindingStatus::Unknown);
        assert!(status.target().is_none());
        assert!(!binding.is_satisfied());
    }

    #[test]
    fn test_rebind_is_idempotent() {
        let mut doc = Document::new("ComplexTypeMapping");
        let element = doc.root();
        doc.set_attribute(element, "TypeName", "Foo").unwrap();
        let catalog = catalog_with(&[(ElementKind::ComplexType, "Foo", target(7))]);

        let mut binding = ReferenceBinding::from_spec(&type_name_spec(), Some("Foo"));
        let first = binding.rebind(&doc, element, &catalog);
        let second = binding.rebind(&doc, element, &catalog);
        assert_eq!(first, second);
        assert_eq!(binding.status(), second);
    }

    #[test]
    fn test_rebind_rereads_the_document() {
        let mut doc = Document::new("ComplexTypeMapping");
        let element = doc.root();
        doc.set_attribute(element, "TypeName", "Missing").unwrap();
        let catalog = catalog_with(&[(ElementKind::ComplexType, "Foo", target(7))]);

        let mut binding = ReferenceBinding::from_spec(&type_name_spec(), Some("Missing"));
        assert_eq!(binding.rebind(&doc, element, &catalog), BindingStatus::Unknown);

        doc.set_attribute(element, "TypeName", "Foo").unwrap();
        assert_eq!(
            binding.rebind(&doc, element, &catalog),
            BindingStatus::Known(target(7))
        );
        assert_eq!(binding.raw(), Some("Foo"));
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("  Foo  "), Some("Foo".to_string()));
        assert_eq!(normalize_symbol("   "), None);
        assert_eq!(normalize_symbol(""), None);
        // NFC: decomposed e + combining acute folds to the precomposed form
        assert_eq!(normalize_symbol("Caf\u{0065}\u{0301}"), Some("Café".to_string()));
        // Case stays significant
        assert_ne!(normalize_symbol("foo"), normalize_symbol("Foo"));
    }
}
