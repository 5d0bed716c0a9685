//! Shared helpers for the WASM API
//!
//! Serialization to and from `JsValue` and error conversion, so every entry
//! point reports failures the same way.

use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::errors::MeiError;
use crate::settings::ScanSettings;

// ============================================================================
// Serialization/Deserialization Helpers
// ============================================================================

/// Deserialize a value from JavaScript with automatic error handling
pub fn deserialize<T: DeserializeOwned>(value: JsValue, error_context: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| {
        let msg = format!("{}: {}", error_context, e);
        log::error!("{}", msg);
        JsValue::from_str(&msg)
    })
}

/// Serialize a value to JavaScript with automatic error handling
pub fn serialize<T: Serialize>(value: &T, error_context: &str) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| {
        let msg = format!("{}: {}", error_context, e);
        log::error!("{}", msg);
        JsValue::from_str(&msg)
    })
}

/// `undefined` or `null` means default settings
pub fn settings_from_js(settings: JsValue) -> Result<ScanSettings, JsValue> {
    if settings.is_undefined() || settings.is_null() {
        return Ok(ScanSettings::default());
    }
    deserialize(settings, "Invalid scan settings")
}

// ============================================================================
// Result Conversion Helpers
// ============================================================================

/// Convert a scan error to a JsValue
pub fn mei_error(context: &str, err: MeiError) -> JsValue {
    let msg = format!("{}: {}", context, err);
    log::error!("{}", msg);
    JsValue::from_str(&msg)
}
