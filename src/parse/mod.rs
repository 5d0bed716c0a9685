//! Parsing module for MEI input
//!
//! - `xml`: XML text into the owned document tree
//! - `tokens`: tie/slur marker attributes on notes

pub mod tokens;
pub mod xml;

// Re-export commonly used items
pub use tokens::{parse_slur_attribute, parse_tie_attribute, Marker, SlurToken};
pub use xml::parse_mei;
