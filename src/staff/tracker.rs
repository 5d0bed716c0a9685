//! Per-staff definitions and the modifiers that must be (re)drawn
//!
//! Each staff keeps its merged [`StaffDef`] and three render flags. A flag
//! is raised when the modifier first appears, when a new definition changes
//! it, or when a new system or section restates it; it drops again once the
//! modifier has been emitted.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::errors::MeiResult;
use crate::models::{Meter, StaffDef};

const CLEF_ATTRIBUTES: &[&str] = &["clef.shape", "clef.line"];
const KEY_ATTRIBUTES: &[&str] = &["key.pname", "key.accid", "key.mode"];
const METER_ATTRIBUTES: &[&str] = &["meter.count", "meter.unit"];

/// Which staff modifiers must be rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderFlags {
    pub clef: bool,
    pub keysig: bool,
    pub timesig: bool,
}

impl RenderFlags {
    pub fn all() -> Self {
        RenderFlags {
            clef: true,
            keysig: true,
            timesig: true,
        }
    }

    pub fn any(&self) -> bool {
        self.clef || self.keysig || self.timesig
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaffInfo {
    pub def: StaffDef,
    pub render_with: RenderFlags,
}

#[derive(Debug, Clone, Default)]
pub struct StaffTracker {
    staves: BTreeMap<u32, StaffInfo>,
}

impl StaffTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, n: u32) -> Option<&StaffInfo> {
        self.staves.get(&n)
    }

    pub fn staff_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.staves.keys().copied()
    }

    /// Record a `<staffDef>`. A first definition raises every flag; a later
    /// one is merged and raises the flags whose attributes changed.
    pub fn update(&mut self, def: StaffDef) {
        let n = def.n;
        match self.staves.get_mut(&n) {
            None => {
                log::debug!("staff {}: first definition", n);
                self.staves.insert(
                    n,
                    StaffInfo {
                        def,
                        render_with: RenderFlags::all(),
                    },
                );
            }
            Some(info) => {
                let merged = info.def.merged_with(&def);
                info.render_with = RenderFlags {
                    clef: differs(&info.def, &merged, CLEF_ATTRIBUTES),
                    keysig: differs(&info.def, &merged, KEY_ATTRIBUTES),
                    timesig: differs(&info.def, &merged, METER_ATTRIBUTES),
                };
                log::debug!("staff {}: redefined, render {:?}", n, info.render_with);
                info.def = merged;
            }
        }
    }

    /// A structural section starts: every modifier of every staff is restated
    pub fn force_section_start(&mut self) {
        for info in self.staves.values_mut() {
            info.render_with = RenderFlags::all();
        }
    }

    /// A plain system break: clefs and key signatures are restated
    pub fn force_system_break(&mut self) {
        for info in self.staves.values_mut() {
            info.render_with.clef = true;
            info.render_with.keysig = true;
        }
    }

    /// Flags to honor for staff `n` now; they are reset once read. An
    /// unknown staff renders nothing.
    pub fn consume(&mut self, n: u32) -> RenderFlags {
        match self.staves.get_mut(&n) {
            Some(info) => std::mem::take(&mut info.render_with),
            None => RenderFlags::default(),
        }
    }

    /// Meter currently defined for staff `n`
    pub fn meter(&self, n: u32) -> MeiResult<Option<Meter>> {
        match self.staves.get(&n) {
            Some(info) => info.def.meter(),
            None => Ok(None),
        }
    }

    /// Meters of every staff that has one
    pub fn meters(&self) -> MeiResult<BTreeMap<u32, Meter>> {
        let mut meters = BTreeMap::new();
        for (&n, info) in &self.staves {
            if let Some(meter) = info.def.meter()? {
                meters.insert(n, meter);
            }
        }
        Ok(meters)
    }
}

fn differs(old: &StaffDef, new: &StaffDef, attributes: &[&str]) -> bool {
    attributes.iter().any(|a| old.get(a) != new.get(a))
}
