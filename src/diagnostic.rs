//! Diagnostic types for document parsing and model synchronization.
//!
//! Diagnostics represent non-fatal issues discovered while projecting a markup
//! document into the typed model. They let parsing continue over a document
//! that is only partially valid (the normal situation while a user is
//! mid-edit) while keeping every skipped-over condition observable.

/// Diagnostic information produced while parsing a document into model nodes.
///
/// None of these abort parsing. The surrounding tool layer decides how to
/// surface them (error list, squiggles, status bar); the engine's only
/// obligation is to record them.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseDiagnostic {
    /// A child element whose tag matches no declared child kind of its parent.
    ///
    /// Expected while a document is mid-edit. The element is left in the
    /// document untouched and is simply not represented in the typed tree.
    UnrecognizedElement {
        /// Tag of the parent element whose dispatch table was consulted
        parent_tag: String,
        /// Tag of the element that matched no declared child kind
        tag: String,
    },

    /// An attribute that matches no declared value cell, reference binding,
    /// or symbol-name attribute of its element's kind.
    UnrecognizedAttribute {
        /// Tag of the element carrying the attribute
        tag: String,
        /// Name of the unrecognized attribute
        attribute: String,
    },

    /// A warning about the parse (e.g. an authored value that could not be
    /// interpreted at its declared type, or document content the mapping
    /// dialect has no use for)
    Warning(String),

    /// An informational message about the parse
    Info(String),
}

impl ParseDiagnostic {
    /// Create an unrecognized-element diagnostic
    pub fn unrecognized_element(parent_tag: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::UnrecognizedElement {
            parent_tag: parent_tag.into(),
            tag: tag.into(),
        }
    }

    /// Create an unrecognized-attribute diagnostic
    pub fn unrecognized_attribute(tag: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::UnrecognizedAttribute {
            tag: tag.into(),
            attribute: attribute.into(),
        }
    }

    /// Create a warning diagnostic
    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning(message.into())
    }

    /// Create an info diagnostic
    pub fn info(message: impl Into<String>) -> Self {
        Self::Info(message.into())
    }

    /// Check if this diagnostic reports document structure the dispatch
    /// tables did not recognize
    pub fn is_unrecognized(&self) -> bool {
        matches!(
            self,
            Self::UnrecognizedElement { .. } | Self::UnrecognizedAttribute { .. }
        )
    }

    /// Get the unmatched tag if this is an unrecognized-element diagnostic
    pub fn as_unrecognized_element(&self) -> Option<(&str, &str)> {
        match self {
            Self::UnrecognizedElement { parent_tag, tag } => {
                Some((parent_tag.as_str(), tag.as_str()))
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnrecognizedElement { parent_tag, tag } => {
                write!(f, "Unrecognized child element <{tag}> under <{parent_tag}>")
            }
            Self::UnrecognizedAttribute { tag, attribute } => {
                write!(f, "Unrecognized attribute '{attribute}' on <{tag}>")
            }
            Self::Warning(msg) => write!(f, "Warning: {msg}"),
            Self::Info(msg) => write!(f, "Info: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_creation() {
        let elem = ParseDiagnostic::unrecognized_element("ComplexTypeMapping", "Mystery");
        let attr = ParseDiagnostic::unrecognized_attribute("Condition", "Nope");
        let warning = ParseDiagnostic::warning("Test warning");

        assert!(elem.is_unrecognized());
        assert!(attr.is_unrecognized());
        assert!(!warning.is_unrecognized());
        assert_eq!(
            elem.as_unrecognized_element(),
            Some(("ComplexTypeMapping", "Mystery"))
        );
        assert!(attr.as_unrecognized_element().is_none());
    }

    #[test]
    fn test_diagnostic_display() {
        let elem = ParseDiagnostic::unrecognized_element("Mapping", "Huh");
        assert_eq!(
            format!("{elem}"),
            "Unrecognized child element <Huh> under <Mapping>"
        );
    }
}
