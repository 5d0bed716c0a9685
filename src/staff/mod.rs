//! Staff definitions and stave grouping

pub mod connectors;
pub mod tracker;

pub use connectors::{stave_connector, ConnectorSymbol, StaveConnector};
pub use tracker::{RenderFlags, StaffInfo, StaffTracker};
