//! # mapdoc-core
//!
//! A typed, mutable object model layered over a semi-structured markup
//! document, built for design tools that present, edit, and re-serialize
//! schema-mapping artifacts.
//!
//! The document is the source of truth; the model is a live, strongly-typed
//! projection of it that stays synchronized with edits made through the model
//! and tolerates documents that are only partially valid at any moment (the
//! normal situation while a user is mid-edit).
//!
//! ## Overview
//!
//! The core mechanism is a **typed tree with deferred binding**:
//!
//! - Document elements are parsed into typed model nodes by tag-name dispatch
//!   against per-kind schema tables
//! - Model nodes hold named cross-references that resolve lazily against a
//!   symbol catalog and can be re-resolved after any mutation
//! - Typed child collections stay consistent with both the model's view and
//!   the underlying document's child order
//! - Each node tracks a lifecycle state, so consumers can distinguish
//!   "not yet parsed", "parsed but unresolved", and "fully resolved"
//!
//! ## Quick Start
//!
//! ```rust
//! use mapdoc_core::{catalog::SymbolTable, document::Document, model::ModelTree};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = r#"<Mapping>
//!       <ComplexTypeMapping TypeName="CustomerInfo">
//!         <ScalarProperty Name="Street"/>
//!       </ComplexTypeMapping>
//!       <ComplexType Name="CustomerInfo">
//!         <Property Name="Street"/>
//!       </ComplexType>
//!     </Mapping>"#;
//!
//!     // Parse pass: raw elements become typed nodes; problems surface as
//!     // diagnostics, not errors
//!     let import = Document::parse_str(source)?;
//!     let mut tree = ModelTree::new(import.document);
//!     let outcome = tree.parse()?;
//!     assert!(outcome.diagnostics.is_empty());
//!
//!     // Resolve pass: every reference binding rebinds against the catalog
//!     let catalog = SymbolTable::build(&[&tree]);
//!     let unresolved = tree.resolve(&catalog)?;
//!     assert_eq!(unresolved, 0);
//!     Ok(())
//! }
//! ```
//!
//! ## Error tolerance
//!
//! Data-shaped problems — unrecognized elements or attributes, references
//! that do not resolve — are recorded as
//! [`diagnostic::ParseDiagnostic`]s or as binding status and never abort a
//! pass. Broken calling contracts (resolving mid-parse, re-parsing without a
//! reset) fail immediately with [`MapdocError::Contract`].
//!
//! ## Module Guide
//!
//! - [`document`]: the arena-backed markup tree and its XML codec
//! - [`schema`]: per-node-kind dispatch tables and the [`schema::SCHEMAS`]
//!   registry
//! - [`model`]: the typed tree, lifecycle states, parse and resolve passes
//! - [`catalog`]: symbol lookup across the loaded document set
//! - [`diagnostic`]: non-fatal parse/synchronization conditions
//!
//! Start with [`model::ModelTree`] for parsing documents, then see
//! [`schema::SchemaRegistry`] for registering downstream element catalogs.

pub mod catalog;
pub mod diagnostic;
pub mod document;
pub mod error;
pub mod model;
pub mod schema;

pub use error::*;
