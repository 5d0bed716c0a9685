//! WASM build test
//!
//! Exercises the JavaScript entry points in a browser.

#![cfg(target_arch = "wasm32")]

use mei_scan::api::*;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const SCORE: &str = r#"<mei><score>
  <scoreDef><staffGrp><staffDef n="1" clef.shape="G" clef.line="2" meter.count="3" meter.unit="4"/></staffGrp></scoreDef>
  <section>
    <measure n="1"><staff n="1"><layer n="1"><note pname="c" oct="4" dur="2" dots="1"/></layer></staff></measure>
    <measure n="2"><staff n="1"><layer n="1">
      <note pname="d" oct="4" dur="4"/><note xml:id="last" pname="e" oct="4" dur="2"/>
    </layer></staff></measure>
  </section>
</score></mei>"#;

#[wasm_bindgen_test]
fn test_scan_json_with_default_settings() {
    let json = scan_mei_json(SCORE, "").unwrap();
    assert!(json.contains("\"staff_renders\""));
    assert!(json.contains("\"3/4\""));
}

#[wasm_bindgen_test]
fn test_scan_rejects_bad_settings() {
    assert!(scan_mei_json(SCORE, "{not json").is_err());
}

#[wasm_bindgen_test]
fn test_scan_to_js_object() {
    let report = scan_mei(SCORE, JsValue::UNDEFINED);
    assert!(report.is_ok());
}

#[wasm_bindgen_test]
fn test_assign_ids() {
    let written = assign_mei_ids(SCORE, JsValue::NULL).unwrap();
    assert_eq!(written.matches("xml:id=").count(), 3);
}

#[wasm_bindgen_test]
fn test_locate_event() {
    assert_eq!(locate_event(SCORE, "last", 1, 1).unwrap(), "1m+2");
    assert!(locate_event(SCORE, "nowhere", 1, 1).is_err());
}
