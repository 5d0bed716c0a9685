//! Data models for the MEI scanner
//!
//! The document tree, the value types of the temporal model (meter,
//! timestamp) and the link objects the resolver fills in.

pub mod document;
pub mod elements;
pub mod event_link;
pub mod meter;
pub mod staff_def;
pub mod timestamp;

// Re-export commonly used types
pub use document::{MeiDocument, MeiElement, NodeId, XML_ID};
pub use elements::ElementKind;
pub use event_link::{
    EventLink, EventReference, HairpinForm, LayerContext, LinkKind, LinkParams, LinkState,
    Placement, SlurKey, TieKey,
};
pub use meter::{beats2dur, dur2beats, Meter};
pub use staff_def::StaffDef;
pub use timestamp::TimeStamp;
