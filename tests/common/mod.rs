//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use mapdoc_core::document::Document;
use mapdoc_core::model::ModelTree;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times — subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// A mapping artifact with one fully resolvable complex-type mapping: every
/// referenced identifier has exactly one matching symbol.
pub const CUSTOMER_ARTIFACT: &str = r#"<Mapping>
  <ComplexTypeMapping TypeName="CustomerInfo" IsPartial="true">
    <ScalarProperty Name="Street" ColumnName="street_col"/>
    <ComplexProperty Name="Contact">
      <ScalarProperty Name="Phone"/>
    </ComplexProperty>
    <Condition Value="active" ColumnName="status_col"/>
  </ComplexTypeMapping>
  <ComplexType Name="CustomerInfo">
    <Property Name="Street"/>
    <Property Name="Contact"/>
    <Property Name="Phone"/>
    <Property Name="street_col"/>
    <Property Name="status_col"/>
  </ComplexType>
</Mapping>"#;

/// Parse an XML artifact into an unparsed model tree, asserting the load
/// itself was clean.
#[allow(dead_code)]
pub fn tree_from(xml: &str) -> ModelTree {
    let import = Document::parse_str(xml).expect("test artifact should be well-formed XML");
    assert!(
        import.diagnostics.is_empty(),
        "unexpected load diagnostics: {:?}",
        import.diagnostics
    );
    ModelTree::new(import.document)
}
