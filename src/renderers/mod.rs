//! Output side of the scanner
//!
//! - `vexflow`: attribute-to-code tables for the rendering backend payload
//! - `mei_writer`: the document, with generated identities, back to XML

pub mod mei_writer;
pub mod vexflow;

pub use mei_writer::write_mei;
