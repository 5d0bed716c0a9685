//! MEI scanner WASM module
//!
//! Temporal model and link resolution for rendering MEI scores: when each
//! event occurs, which events ties, slurs and hairpins connect, and which
//! staff modifiers must be drawn where.
//!
//! ```text
//! parse ──► MeiDocument ──► scan ──► ScanReport ──► rendering backend
//!                             │
//!            timing (durations, timestamps) + links (ties, slurs, hairpins)
//! ```

pub mod api;
pub mod errors;
pub mod links;
pub mod models;
pub mod parse;
pub mod renderers;
pub mod scan;
pub mod settings;
pub mod staff;
pub mod timing;

// Re-export commonly used types
pub use errors::{MeiError, MeiResult};
pub use models::{EventLink, LinkKind, MeiDocument, Meter, NodeId, TimeStamp};
pub use parse::parse_mei;
pub use scan::{scan_document, scan_str, ScanReport, ScanSession};
pub use settings::ScanSettings;

#[cfg(all(feature = "console_error_panic_hook", feature = "console_log"))]
use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[cfg(all(feature = "console_error_panic_hook", feature = "console_log"))]
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Debug).is_err() {
        return;
    }

    log::info!("MEI scanner WASM module initialized");
}
