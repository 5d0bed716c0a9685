//! Snapshot of a `<staffDef>`
//!
//! Only the attributes that drive rendering decisions are kept. A later
//! `<staffDef>` for the same staff is merged over the previous snapshot, so
//! a definition that only restates the meter keeps the clef it had.

use std::collections::BTreeMap;

use serde::Serialize;

use super::document::{MeiDocument, NodeId};
use super::meter::Meter;
use crate::errors::{MeiError, MeiResult};

/// Attributes of `<staffDef>` the scanner tracks
pub const TRACKED_ATTRIBUTES: &[&str] = &[
    "clef.shape",
    "clef.line",
    "key.pname",
    "key.accid",
    "key.mode",
    "key.sig.show",
    "meter.count",
    "meter.unit",
    "meter.rend",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffDef {
    pub n: u32,
    attributes: BTreeMap<String, String>,
}

impl StaffDef {
    pub fn new(n: u32) -> Self {
        StaffDef {
            n,
            attributes: BTreeMap::new(),
        }
    }

    /// Read a `<staffDef>` element; @n is mandatory
    pub fn from_node(doc: &MeiDocument, node: NodeId) -> MeiResult<Self> {
        let n_attr = doc
            .attr(node, "n")
            .ok_or_else(|| MeiError::missing_attribute("staffDef", "n", doc.describe(node)))?;
        let n = n_attr.trim().parse::<u32>().map_err(|_| {
            MeiError::InvalidArgument(format!("<staffDef> @n \"{}\" is not a number", n_attr))
        })?;

        let mut def = StaffDef::new(n);
        for name in TRACKED_ATTRIBUTES {
            if let Some(value) = doc.attr(node, name) {
                def.set(name, value);
            }
        }
        Ok(def)
    }

    /// No tracked attribute is set
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_string(), value.to_string());
    }

    /// Overlay the attributes of `newer` on this definition
    pub fn merged_with(&self, newer: &StaffDef) -> StaffDef {
        let mut merged = self.clone();
        for (k, v) in &newer.attributes {
            merged.attributes.insert(k.clone(), v.clone());
        }
        merged
    }

    /// Meter of this staff, if both parts are present
    pub fn meter(&self) -> MeiResult<Option<Meter>> {
        match (self.get("meter.count"), self.get("meter.unit")) {
            (Some(count), Some(unit)) => Ok(Some(Meter::parse(count, unit)?)),
            _ => Ok(None),
        }
    }
}
