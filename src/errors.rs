//! Error types for MEI scanning
//!
//! Every failure the temporal model or the link resolver can raise maps to one
//! variant here. All of them abort the scan immediately except
//! `UnresolvedLink`, which is collected into the report and only raised when
//! `ScanSettings::strict_links` asks for it.

use thiserror::Error;

/// Result type for scanning operations
pub type MeiResult<T> = Result<T, MeiError>;

/// Top-level scan error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeiError {
    /// Malformed input value (bad slur token, unknown node, unparsable number)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A mandatory attribute is absent
    #[error("<{element}> is missing mandatory attribute @{attribute} ({location})")]
    MissingAttribute {
        element: String,
        attribute: String,
        location: String,
    },

    /// Member notes of a chord disagree on their duration code
    #[error("Duration of <chord> {chord} is ambiguous: members declare @dur={first} and @dur={second}")]
    AmbiguousDuration {
        chord: String,
        first: String,
        second: String,
    },

    /// Tag not handled in the place it was found
    #[error("Element <{element}> is not supported in {context}")]
    UnsupportedElement { element: String, context: String },

    /// No time signature in scope
    #[error("No time signature specified: {0}")]
    MissingMeter(String),

    /// Identity not present in the given context
    #[error("No event with xml:id=\"{0}\" was found in the given MEI context")]
    EventNotFound(String),

    /// Link that could not be resolved by the end of the scan
    #[error("Unresolved {kind}: {detail}")]
    UnresolvedLink { kind: String, detail: String },

    /// Event enumerator exhausted
    #[error("End of input")]
    EndOfSequence,

    /// XML text is not well-formed
    #[error("XML parsing failed: {0}")]
    Xml(String),

    /// Writing XML or JSON failed
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl MeiError {
    pub fn missing_attribute(
        element: impl Into<String>,
        attribute: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        MeiError::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
            location: location.into(),
        }
    }

    pub fn unsupported(element: impl Into<String>, context: impl Into<String>) -> Self {
        MeiError::UnsupportedElement {
            element: element.into(),
            context: context.into(),
        }
    }
}

impl From<roxmltree::Error> for MeiError {
    fn from(e: roxmltree::Error) -> Self {
        MeiError::Xml(e.to_string())
    }
}

impl From<quick_xml::Error> for MeiError {
    fn from(e: quick_xml::Error) -> Self {
        MeiError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for MeiError {
    fn from(e: serde_json::Error) -> Self {
        MeiError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_attribute_message() {
        let err = MeiError::missing_attribute("note", "dur", "xml:id=n1");
        assert_eq!(
            err.to_string(),
            "<note> is missing mandatory attribute @dur (xml:id=n1)"
        );
    }

    #[test]
    fn test_unsupported_message() {
        let err = MeiError::unsupported("pb", "<section>");
        assert_eq!(err.to_string(), "Element <pb> is not supported in <section>");
    }
}
