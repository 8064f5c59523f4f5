//! Per-node-kind dispatch tables for the typed model.
//!
//! Every model node kind is described by a [`NodeSchema`]: which attributes
//! project into typed value cells, which are symbolic reference bindings,
//! which child element tags map into which typed child collection, and how a
//! newly created child of each kind is positioned among the backing
//! element's document children. Parsing, resolution, child creation, and
//! deletion dispatch all consult these tables, so supporting a new element
//! kind is a table registration, not a new branch in the engine.
//!
//! Schemas are registered at runtime through the global [`SCHEMAS`] registry
//! by both mapdoc-core (the built-in mapping catalog) and downstream element
//! catalogs.

use std::{collections::HashMap, sync::Arc, time::Duration};

use enumset::{EnumSet, EnumSetType};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::model::value::{ScalarKind, ScalarValue};

/// Global singleton schema registry with the built-in mapping catalog
pub static SCHEMAS: Lazy<SchemaRegistry> = Lazy::new(SchemaRegistry::create);

/// [ElementKind] enumerates the model node kinds known to this crate's
/// built-in catalog. Schemas declare child-kind sets as an [`EnumSet`] of
/// these options.
#[derive(Debug, Serialize, Deserialize, PartialOrd, Ord, Hash, EnumSetType)]
#[enumset(repr = "u32")]
pub enum ElementKind {
    /// Document root container holding mapping fragments and type symbols
    Mapping,
    /// Maps one complex type onto table columns; the worked example of the
    /// generalized machinery
    ComplexTypeMapping,
    /// Maps one scalar member onto a column
    ScalarProperty,
    /// Maps one nested complex member; recursive
    ComplexProperty,
    /// A column condition gating the mapping
    Condition,
    /// A complex type symbol, target of `TypeName` references
    ComplexType,
    /// A member/column symbol, target of `Name`/`ColumnName` references
    Property,
}

/// Where a newly created typed child's raw element lands among its parent's
/// existing document children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertRule {
    /// Before the first existing child element. The mapping dialect expects
    /// some child kinds to precede their siblings for schema/readability
    /// reasons even though the typed model imposes no internal order.
    First,
    /// After the last existing child element
    Append,
}

/// Declares one attribute projected as a typed, defaulted scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueCellSpec {
    pub attribute: &'static str,
    pub kind: ScalarKind,
    pub default: ScalarValue,
}

/// Declares one attribute holding a symbolic reference to another node.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingSpec {
    pub attribute: &'static str,
    /// Kind of the node the identifier must resolve to
    pub target: ElementKind,
    /// Required bindings must reach `Known` for their node to resolve;
    /// optional ones may also be `Undefined`
    pub required: bool,
}

/// Declares one typed child collection and its document insertion rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildSpec {
    pub kind: ElementKind,
    pub insert: InsertRule,
}

/// The full dispatch table for one model node kind.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSchema {
    pub kind: ElementKind,
    /// Element tag that dispatches to this kind during parse
    pub tag: &'static str,
    /// Attribute whose normalized value enters the symbol catalog, for kinds
    /// that act as reference targets
    pub name_attribute: Option<&'static str>,
    /// Value cell declarations, in enumeration order
    pub cells: Vec<ValueCellSpec>,
    /// Reference binding declarations, in enumeration order
    pub bindings: Vec<BindingSpec>,
    /// Child collection declarations, in declaration (enumeration) order
    pub children: Vec<ChildSpec>,
}

impl NodeSchema {
    pub fn cell_spec(&self, attribute: &str) -> Option<&ValueCellSpec> {
        self.cells.iter().find(|spec| spec.attribute == attribute)
    }

    pub fn binding_spec(&self, attribute: &str) -> Option<&BindingSpec> {
        self.bindings.iter().find(|spec| spec.attribute == attribute)
    }

    pub fn child_spec(&self, kind: ElementKind) -> Option<&ChildSpec> {
        self.children.iter().find(|spec| spec.kind == kind)
    }

    /// The set of child kinds this schema declares collections for.
    pub fn allowed_children(&self) -> EnumSet<ElementKind> {
        self.children.iter().map(|spec| spec.kind).collect()
    }

    /// Whether `attribute` has any declared meaning on this kind.
    pub fn knows_attribute(&self, attribute: &str) -> bool {
        self.cell_spec(attribute).is_some()
            || self.binding_spec(attribute).is_some()
            || self.name_attribute == Some(attribute)
    }
}

/// Thread-safe registry of [`NodeSchema`] dispatch tables.
///
/// Pattern matches the shape of the crate's other global registries: a
/// [`Lazy`] singleton over `Arc<RwLock<..>>`, with registrations allowed from
/// downstream element catalogs at runtime.
pub struct SchemaRegistry(Arc<RwLock<HashMap<ElementKind, Arc<NodeSchema>>>>);

impl Clone for SchemaRegistry {
    fn clone(&self) -> Self {
        SchemaRegistry(self.0.clone())
    }
}

impl SchemaRegistry {
    /// Create a registry seeded with the built-in mapping catalog.
    pub fn create() -> Self {
        let registry = SchemaRegistry(Arc::new(RwLock::new(HashMap::new())));

        registry.register(NodeSchema {
            kind: ElementKind::Mapping,
            tag: "Mapping",
            name_attribute: None,
            cells: vec![],
            bindings: vec![],
            children: vec![
                ChildSpec {
                    kind: ElementKind::ComplexTypeMapping,
                    insert: InsertRule::Append,
                },
                ChildSpec {
                    kind: ElementKind::ComplexType,
                    insert: InsertRule::Append,
                },
            ],
        });

        registry.register(NodeSchema {
            kind: ElementKind::ComplexTypeMapping,
            tag: "ComplexTypeMapping",
            name_attribute: None,
            cells: vec![ValueCellSpec {
                attribute: "IsPartial",
                kind: ScalarKind::Bool,
                default: ScalarValue::Bool(false),
            }],
            bindings: vec![BindingSpec {
                attribute: "TypeName",
                target: ElementKind::ComplexType,
                required: false,
            }],
            children: vec![
                ChildSpec {
                    kind: ElementKind::ScalarProperty,
                    insert: InsertRule::First,
                },
                ChildSpec {
                    kind: ElementKind::ComplexProperty,
                    insert: InsertRule::Append,
                },
                ChildSpec {
                    kind: ElementKind::Condition,
                    insert: InsertRule::Append,
                },
            ],
        });

        registry.register(NodeSchema {
            kind: ElementKind::ScalarProperty,
            tag: "ScalarProperty",
            name_attribute: None,
            cells: vec![],
            bindings: vec![
                BindingSpec {
                    attribute: "Name",
                    target: ElementKind::Property,
                    required: true,
                },
                BindingSpec {
                    attribute: "ColumnName",
                    target: ElementKind::Property,
                    required: false,
                },
            ],
            children: vec![],
        });

        registry.register(NodeSchema {
            kind: ElementKind::ComplexProperty,
            tag: "ComplexProperty",
            name_attribute: None,
            cells: vec![],
            bindings: vec![BindingSpec {
                attribute: "Name",
                target: ElementKind::Property,
                required: true,
            }],
            children: vec![
                ChildSpec {
                    kind: ElementKind::ScalarProperty,
                    insert: InsertRule::First,
                },
                ChildSpec {
                    kind: ElementKind::ComplexProperty,
                    insert: InsertRule::Append,
                },
            ],
        });

        registry.register(NodeSchema {
            kind: ElementKind::Condition,
            tag: "Condition",
            name_attribute: None,
            cells: vec![ValueCellSpec {
                attribute: "Value",
                kind: ScalarKind::Text,
                default: ScalarValue::Text(String::new()),
            }],
            bindings: vec![BindingSpec {
                attribute: "ColumnName",
                target: ElementKind::Property,
                required: false,
            }],
            children: vec![],
        });

        registry.register(NodeSchema {
            kind: ElementKind::ComplexType,
            tag: "ComplexType",
            name_attribute: Some("Name"),
            cells: vec![],
            bindings: vec![],
            children: vec![ChildSpec {
                kind: ElementKind::Property,
                insert: InsertRule::Append,
            }],
        });

        registry.register(NodeSchema {
            kind: ElementKind::Property,
            tag: "Property",
            name_attribute: Some("Name"),
            cells: vec![
                ValueCellSpec {
                    attribute: "Type",
                    kind: ScalarKind::Text,
                    default: ScalarValue::Text("String".to_string()),
                },
                ValueCellSpec {
                    attribute: "Nullable",
                    kind: ScalarKind::Bool,
                    default: ScalarValue::Bool(true),
                },
            ],
            bindings: vec![],
            children: vec![],
        });

        registry
    }

    /// Register a schema definition.
    ///
    /// If a schema for this kind already exists, it is overwritten and a log
    /// message emitted.
    pub fn register(&self, schema: NodeSchema) {
        while self.0.is_locked() {
            tracing::info!("[SchemaRegistry::register] Waiting for write access to schema registry");
            std::thread::sleep(Duration::from_millis(100));
        }

        let mut writer = self.0.write();

        if writer.contains_key(&schema.kind) {
            tracing::info!(
                "[SchemaRegistry::register] Overwriting existing schema: {:?}",
                schema.kind
            );
        }

        writer.insert(schema.kind, Arc::new(schema));
    }

    /// Retrieve the schema for a kind. Returns a cheap Arc clone.
    pub fn get(&self, kind: ElementKind) -> Option<Arc<NodeSchema>> {
        while self.0.is_locked_exclusive() {
            tracing::info!("[SchemaRegistry::get] Waiting for read access to schema registry");
            std::thread::sleep(Duration::from_millis(100));
        }

        let reader = self.0.read();
        reader.get(&kind).cloned()
    }

    /// Retrieve the schema whose element tag matches `tag`, if any. This is
    /// the entry point of tag-name parse dispatch.
    pub fn get_by_tag(&self, tag: &str) -> Option<Arc<NodeSchema>> {
        while self.0.is_locked_exclusive() {
            tracing::info!("[SchemaRegistry::get_by_tag] Waiting for read access to schema registry");
            std::thread::sleep(Duration::from_millis(100));
        }

        let reader = self.0.read();
        reader.values().find(|schema| schema.tag == tag).cloned()
    }

    /// List all registered kinds.
    pub fn kinds(&self) -> Vec<ElementKind> {
        while self.0.is_locked_exclusive() {
            tracing::info!("[SchemaRegistry::kinds] Waiting for read access to schema registry");
            std::thread::sleep(Duration::from_millis(100));
        }

        let reader = self.0.read();
        reader.keys().copied().collect()
    }
}
