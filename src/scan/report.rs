//! What a scan hands to the rendering backend

use std::fmt;

use serde::Serialize;

use crate::errors::{MeiError, MeiResult};
use crate::links::LocationKey;
use crate::models::{EventLink, LinkKind, LinkParams, Placement};
use crate::renderers::vexflow::StemDirection;
use crate::staff::StaveConnector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Note,
    Rest,
    MRest,
    Chord,
    Space,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Articulation {
    pub code: &'static str,
    pub place: Option<Placement>,
}

/// `<dir>` text attached to an event through `@startid`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Direction {
    pub text: String,
    pub place: Option<Placement>,
}

/// One event, ready for the backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderEvent {
    pub id: String,
    pub kind: EventKind,
    pub measure: u32,
    pub staff: u32,
    pub layer: u32,
    /// Pitch keys (`"c/4"`); one per chord member, `"c/5"` for rests
    pub keys: Vec<String>,
    /// Backend duration code (`"q"`, `"8r"`, `"wr"`)
    pub duration: String,
    pub dots: u32,
    /// Duration in beats, when a meter is in scope
    pub beats: Option<f64>,
    /// Accidental per key
    pub accidentals: Vec<Option<&'static str>>,
    pub articulations: Vec<Articulation>,
    pub stem: Option<StemDirection>,
    pub lyric: Option<String>,
    pub directions: Vec<Direction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeamGroup {
    pub measure: u32,
    pub staff: u32,
    pub layer: u32,
    pub events: Vec<String>,
}

/// A stave as it starts in a measure, with the modifiers it must draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaffRender {
    pub measure: u32,
    pub staff: u32,
    pub system: u32,
    pub clef: Option<&'static str>,
    pub key: Option<String>,
    pub time: Option<String>,
}

/// A link with both ends resolved to identities
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLink {
    pub first: String,
    pub last: String,
    pub params: LinkParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UnresolvedReason {
    /// Started but never terminated
    OpenAtEnd,
    /// Terminated without a matching start
    OrphanClose,
    /// Neither endpoint could be read
    MissingEndpoints,
    /// A timestamp endpoint matched no event
    NoMatchingEvent,
    /// End points at a measure/staff/layer the scan never visited
    PendingForward,
}

/// A link left unresolved at the end of the scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkDiagnostic {
    pub kind: LinkKind,
    pub first: Option<String>,
    pub last: Option<String>,
    pub reason: UnresolvedReason,
    pub waiting_at: Option<LocationKey>,
}

impl LinkDiagnostic {
    pub fn new(link: &EventLink, reason: UnresolvedReason, waiting_at: Option<LocationKey>) -> Self {
        LinkDiagnostic {
            kind: link.kind,
            first: link.first_id().map(str::to_string),
            last: link.last_id().map(str::to_string),
            reason,
            waiting_at,
        }
    }

    pub fn to_error(&self) -> MeiError {
        MeiError::UnresolvedLink {
            kind: self.kind.to_string(),
            detail: self.to_string(),
        }
    }
}

impl fmt::Display for LinkDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = self.first.as_deref().unwrap_or("?");
        let last = self.last.as_deref().unwrap_or("?");
        match self.reason {
            UnresolvedReason::OpenAtEnd => write!(f, "starting at xml:id=\"{}\" is never terminated", first),
            UnresolvedReason::OrphanClose => write!(f, "ending at xml:id=\"{}\" has no matching start", last),
            UnresolvedReason::MissingEndpoints => write!(f, "has neither @startid/@tstamp nor @endid/@tstamp2"),
            UnresolvedReason::NoMatchingEvent => {
                write!(f, "from \"{}\" to \"{}\" does not land on any event", first, last)
            }
            UnresolvedReason::PendingForward => match self.waiting_at {
                Some(at) => write!(f, "starting at \"{}\" waits for unvisited location {} (measure:staff:layer)", first, at),
                None => write!(f, "starting at \"{}\" waits for an unvisited location", first),
            },
        }
    }
}

/// Result of scanning one document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanReport {
    pub systems: u32,
    pub events: Vec<RenderEvent>,
    pub beams: Vec<BeamGroup>,
    pub staff_renders: Vec<StaffRender>,
    pub connectors: Vec<StaveConnector>,
    pub ties: Vec<ResolvedLink>,
    pub slurs: Vec<ResolvedLink>,
    pub hairpins: Vec<ResolvedLink>,
    pub diagnostics: Vec<LinkDiagnostic>,
}

impl ScanReport {
    pub fn to_json(&self) -> MeiResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn event(&self, id: &str) -> Option<&RenderEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Every unresolved link as an `UnresolvedLink` error
    pub fn unresolved_errors(&self) -> Vec<MeiError> {
        self.diagnostics.iter().map(LinkDiagnostic::to_error).collect()
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
