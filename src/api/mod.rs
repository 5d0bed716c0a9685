//! MEI scanner WASM API
//!
//! JavaScript-facing entry points. Each call parses its own document and
//! runs its own scan session; nothing is kept between calls.
//!
//! # Module Structure
//!
//! - `helpers`: serialization and error conversion shared by the entry points

pub mod helpers;

use wasm_bindgen::prelude::*;

use self::helpers::{mei_error, serialize, settings_from_js};
use crate::parse::parse_mei;
use crate::renderers::write_mei;
use crate::scan::{scan_document, scan_str, ScanSession};
use crate::settings::ScanSettings;

/// Scan MEI text and return the render report as a JS object
#[wasm_bindgen(js_name = scanMei)]
pub fn scan_mei(xml: &str, settings: JsValue) -> Result<JsValue, JsValue> {
    let settings = settings_from_js(settings)?;
    log::info!("scanMei called ({} bytes)", xml.len());

    let (_doc, report) = scan_str(xml, &settings).map_err(|e| mei_error("MEI scan failed", e))?;
    serialize(&report, "Report serialization failed")
}

/// Scan MEI text and return the render report as JSON text.
/// `settings_json` may be empty for defaults.
#[wasm_bindgen(js_name = scanMeiJson)]
pub fn scan_mei_json(xml: &str, settings_json: &str) -> Result<String, JsValue> {
    let settings = if settings_json.trim().is_empty() {
        ScanSettings::default()
    } else {
        ScanSettings::from_json(settings_json).map_err(|e| mei_error("Invalid scan settings", e))?
    };

    let (_doc, report) = scan_str(xml, &settings).map_err(|e| mei_error("MEI scan failed", e))?;
    report.to_json().map_err(|e| mei_error("Report serialization failed", e))
}

/// Scan MEI text and return it with an `xml:id` on every rendered event and
/// every event a timestamp resolved to
#[wasm_bindgen(js_name = assignMeiIds)]
pub fn assign_mei_ids(xml: &str, settings: JsValue) -> Result<String, JsValue> {
    let settings = settings_from_js(settings)?;

    let mut doc = parse_mei(xml).map_err(|e| mei_error("MEI parse failed", e))?;
    scan_document(&mut doc, &settings).map_err(|e| mei_error("MEI scan failed", e))?;
    let written = write_mei(&doc).map_err(|e| mei_error("MEI write failed", e))?;

    log::info!("assignMeiIds completed: {} bytes", written.len());
    Ok(written)
}

/// Compound timestamp (`"<measures>m+<beat>"`) of an event, counted from the
/// first measure of voice `staff`/`layer`
#[wasm_bindgen(js_name = locateEvent)]
pub fn locate_event(xml: &str, event_id: &str, staff: u32, layer: u32) -> Result<String, JsValue> {
    let mut doc = parse_mei(xml).map_err(|e| mei_error("MEI parse failed", e))?;
    let mut session = ScanSession::new(ScanSettings::default());
    session.run(&mut doc).map_err(|e| mei_error("MEI scan failed", e))?;

    let tstamp = session
        .locate(&doc, event_id, staff, layer)
        .map_err(|e| mei_error("locateEvent failed", e))?;
    Ok(tstamp.to_string())
}
