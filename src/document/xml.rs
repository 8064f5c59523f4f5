//! XML load/serialize for [`Document`] arenas.
//!
//! The mapping dialect is element/attribute only. Text content, comments, and
//! processing instructions carry no meaning for the model, so loading skips
//! them; non-whitespace text is surfaced as a [`ParseDiagnostic::Warning`]
//! rather than an error because a document mid-edit may legitimately hold
//! stray content.

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::diagnostic::ParseDiagnostic;
use crate::document::{Document, RawNodeId};
use crate::error::MapdocError;

/// Result of loading a document from XML source.
#[derive(Debug)]
pub struct XmlImport {
    pub document: Document,
    /// Non-fatal content skipped during the load
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl Document {
    /// Load a document from XML source text.
    ///
    /// Fails only on malformed XML or on source with no root element; skipped
    /// content is reported through [`XmlImport::diagnostics`].
    pub fn parse_str(src: &str) -> Result<XmlImport, MapdocError> {
        let mut reader = Reader::from_str(src);
        let mut diagnostics = Vec::new();
        let mut document: Option<Document> = None;
        // Elements whose Start event has been seen but whose End event has not
        let mut open: Vec<RawNodeId> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    let id = open_element(&mut document, &open, &start)?;
                    open.push(id);
                }
                Event::Empty(start) => {
                    open_element(&mut document, &open, &start)?;
                }
                Event::End(_) => {
                    open.pop();
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    if !text.trim().is_empty() {
                        diagnostics.push(ParseDiagnostic::warning(format!(
                            "Skipping text content {:?}; the mapping dialect is element/attribute only",
                            text.trim()
                        )));
                    }
                }
                Event::CData(_) => {
                    diagnostics.push(ParseDiagnostic::warning(
                        "Skipping CDATA content; the mapping dialect is element/attribute only"
                            .to_string(),
                    ));
                }
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
        }

        let document = document.ok_or_else(|| {
            MapdocError::Serialization("XML source contains no root element".to_string())
        })?;
        Ok(XmlImport {
            document,
            diagnostics,
        })
    }

    /// Serialize the document back to indented XML.
    pub fn to_xml_string(&self) -> Result<String, MapdocError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        self.write_element(&mut writer, self.root())?;
        Ok(String::from_utf8(writer.into_inner())?)
    }

    fn write_element(
        &self,
        writer: &mut Writer<Vec<u8>>,
        id: RawNodeId,
    ) -> Result<(), MapdocError> {
        let tag = self
            .tag(id)
            .ok_or_else(|| MapdocError::NotFound(format!("No live document node for {id}")))?
            .to_string();
        let mut start = BytesStart::new(tag.as_str());
        for (name, value) in self.attributes(id) {
            start.push_attribute((name.as_str(), value.as_str()));
        }
        let children: Vec<RawNodeId> = self.children(id).to_vec();
        if children.is_empty() {
            writer.write_event(Event::Empty(start))?;
        } else {
            writer.write_event(Event::Start(start))?;
            for child in children {
                self.write_element(writer, child)?;
            }
            writer.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
        }
        Ok(())
    }
}

/// Materialize one element from its start tag: the first element becomes the
/// document root, every later one attaches under the innermost open element.
fn open_element(
    document: &mut Option<Document>,
    open: &[RawNodeId],
    start: &BytesStart<'_>,
) -> Result<RawNodeId, MapdocError> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).to_string();
    let id = if document.is_none() {
        *document = Some(Document::new(tag));
        document.as_ref().expect("just assigned").root()
    } else {
        let doc = document.as_mut().expect("checked above");
        let parent = match open.last() {
            Some(parent) => *parent,
            None => {
                return Err(MapdocError::Serialization(
                    "XML source contains multiple root elements".to_string(),
                ))
            }
        };
        let id = doc.create_element(tag);
        doc.insert_child(parent, id, None)?;
        id
    };
    let doc = document.as_mut().expect("assigned above");
    for attr in start.attributes() {
        let attr = attr?;
        let name = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value()?.to_string();
        doc.set_attribute(id, name, value)?;
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<Mapping>
  <ComplexTypeMapping TypeName="CustomerInfo" IsPartial="true">
    <ScalarProperty Name="Street" ColumnName="street"/>
    <Condition Value="active"/>
  </ComplexTypeMapping>
  <ComplexType Name="CustomerInfo"/>
</Mapping>"#;

    #[test]
    fn test_parse_str_structure() {
        let import = Document::parse_str(SAMPLE).unwrap();
        assert!(import.diagnostics.is_empty());
        let doc = import.document;

        let root = doc.root();
        assert_eq!(doc.tag(root), Some("Mapping"));
        assert_eq!(doc.children(root).len(), 2);

        let mapping = doc.children(root)[0];
        assert_eq!(doc.tag(mapping), Some("ComplexTypeMapping"));
        assert_eq!(doc.attribute(mapping, "TypeName"), Some("CustomerInfo"));
        assert_eq!(doc.attribute(mapping, "IsPartial"), Some("true"));
        assert_eq!(doc.children(mapping).len(), 2);

        let scalar = doc.children(mapping)[0];
        assert_eq!(doc.tag(scalar), Some("ScalarProperty"));
        assert_eq!(doc.attribute(scalar, "ColumnName"), Some("street"));
    }

    #[test]
    fn test_round_trip_preserves_order_and_attributes() {
        let doc = Document::parse_str(SAMPLE).unwrap().document;
        let serialized = doc.to_xml_string().unwrap();
        let reparsed = Document::parse_str(&serialized).unwrap().document;
        assert_eq!(doc, reparsed);
    }

    #[test]
    fn test_text_content_reported_not_fatal() {
        let import = Document::parse_str("<Mapping>stray text<Condition/></Mapping>").unwrap();
        assert_eq!(import.diagnostics.len(), 1);
        assert!(matches!(
            import.diagnostics[0],
            ParseDiagnostic::Warning(_)
        ));
        assert_eq!(import.document.children(import.document.root()).len(), 1);
    }

    #[test]
    fn test_empty_source_is_an_error() {
        assert!(matches!(
            Document::parse_str("  "),
            Err(MapdocError::Serialization(_))
        ));
    }

    #[test]
    fn test_malformed_source_is_an_error() {
        assert!(Document::parse_str("<Mapping><Oops></Mapping>").is_err());
    }
}
