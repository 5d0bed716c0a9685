//! Scan configuration
//!
//! Settings are plain serde data so the same struct can be built in Rust,
//! loaded from JSON, or handed over from JavaScript.

use serde::{Deserialize, Serialize};

use crate::errors::MeiResult;

/// Configuration options for a document scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Staff number assumed when `<staff>` or a link element has no @n / @staff
    pub default_staff_n: u32,

    /// Layer number assumed when `<layer>` or a link element has no @n / @layer.
    /// Also the layer used to filter chord members in duration lookups.
    pub default_layer_n: u32,

    /// Skip (with a warning) section and scoreDef children the scan does not
    /// understand instead of failing
    pub skip_unsupported_elements: bool,

    /// Fail the scan with `UnresolvedLink` if any link is left unresolved
    pub strict_links: bool,

    /// Strip a leading '#' from @startid / @endid references
    pub strip_reference_hash: bool,

    /// Prefix for generated identities (must start an XML name, so no digits)
    pub generated_id_prefix: String,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            default_staff_n: 1,
            default_layer_n: 1,
            skip_unsupported_elements: false,
            strict_links: false,
            strip_reference_hash: true,
            generated_id_prefix: "e".to_string(),
        }
    }
}

impl ScanSettings {
    /// Load settings from a JSON object; missing keys keep their defaults
    pub fn from_json(json: &str) -> MeiResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = ScanSettings::from_json(r#"{"strict_links": true}"#).unwrap();
        assert!(settings.strict_links);
        assert_eq!(settings.default_layer_n, 1);
        assert_eq!(settings.generated_id_prefix, "e");
    }

    #[test]
    fn test_invalid_json_is_serialization_error() {
        let err = ScanSettings::from_json("{not json").unwrap_err();
        assert!(matches!(err, crate::errors::MeiError::Serialization(_)));
    }
}
