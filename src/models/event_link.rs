//! Links between events (ties, slurs, hairpins)
//!
//! An [`EventLink`] holds two [`EventReference`]s. A reference is either an
//! identity, or a local timestamp that becomes an identity once a layer
//! context is bound to it. Resolution is memoized: once an identity has been
//! produced it never changes.

use std::fmt;

use serde::Serialize;

use super::document::{MeiDocument, NodeId};
use super::meter::Meter;
use crate::errors::{MeiError, MeiResult};
use crate::timing::indexer::tstamp2id;

/// Layer plus the meter in force for it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayerContext {
    pub layer: NodeId,
    pub meter: Meter,
}

/// Resolvable pointer to an event
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventReference {
    id: Option<String>,
    tstamp: Option<f64>,
    #[serde(skip)]
    context: Option<LayerContext>,
}

impl EventReference {
    pub fn from_id(id: impl Into<String>) -> Self {
        EventReference {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn from_tstamp(beats: f64) -> Self {
        EventReference {
            tstamp: Some(beats),
            ..Default::default()
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn tstamp(&self) -> Option<f64> {
        self.tstamp
    }

    pub fn context(&self) -> Option<LayerContext> {
        self.context
    }

    /// Carries either an identity or a timestamp
    pub fn is_set(&self) -> bool {
        self.id.is_some() || self.tstamp.is_some()
    }

    pub fn is_resolved(&self) -> bool {
        self.id.is_some()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Point the reference at a local timestamp; any identity is dropped
    /// since it no longer describes the target.
    pub fn set_tstamp(&mut self, beats: f64) {
        self.tstamp = Some(beats);
        self.id = None;
    }

    pub fn bind_context(&mut self, context: LayerContext) {
        self.context = Some(context);
    }

    /// Produce the identity if possible. A timestamp reference with a bound
    /// context is resolved through `tstamp2id` once; later calls return the
    /// memoized identity.
    pub fn resolve(&mut self, doc: &mut MeiDocument) -> MeiResult<Option<&str>> {
        if self.id.is_none() {
            if let (Some(beats), Some(ctx)) = (self.tstamp, self.context) {
                self.id = tstamp2id(doc, beats, ctx.layer, ctx.meter)?;
            }
        }
        Ok(self.id.as_deref())
    }
}

/// Kind of link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Tie,
    Slur,
    Hairpin,
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkKind::Tie => write!(f, "tie"),
            LinkKind::Slur => write!(f, "slur"),
            LinkKind::Hairpin => write!(f, "hairpin"),
        }
    }
}

/// Matching key of a tie opened from a note's @tie marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TieKey {
    pub pname: String,
    pub oct: String,
    pub system: u32,
}

/// Matching key of a slur opened from a note's @slur token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlurKey {
    pub nesting_level: u8,
    pub system: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HairpinForm {
    Cres,
    Dim,
}

impl HairpinForm {
    pub fn parse(form: &str) -> MeiResult<Self> {
        match form {
            "cres" => Ok(HairpinForm::Cres),
            "dim" => Ok(HairpinForm::Dim),
            other => Err(MeiError::InvalidArgument(format!(
                "<hairpin> @form must be 'cres' or 'dim', found \"{}\"",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Above,
    Below,
}

impl Placement {
    pub fn parse(place: &str) -> MeiResult<Self> {
        match place {
            "above" => Ok(Placement::Above),
            "below" => Ok(Placement::Below),
            other => Err(MeiError::InvalidArgument(format!(
                "@place must be 'above' or 'below', found \"{}\"",
                other
            ))),
        }
    }
}

/// Kind-specific link parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LinkParams {
    /// Link built from a `<tie>`/`<slur>` element: no matching key
    None,
    Tie(TieKey),
    Slur(SlurKey),
    Hairpin {
        form: HairpinForm,
        place: Option<Placement>,
    },
}

/// Where a link stands in the open/close automaton
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LinkState {
    /// Neither end set
    Empty,
    /// First set, last unset
    Open,
    /// Both ends set
    Closed,
    /// Only last set: a close that never found its open
    OrphanClose,
}

/// Ordered pair of event references
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventLink {
    pub kind: LinkKind,
    pub first: EventReference,
    pub last: EventReference,
    pub params: LinkParams,
}

impl EventLink {
    pub fn new(kind: LinkKind) -> Self {
        EventLink {
            kind,
            first: EventReference::default(),
            last: EventReference::default(),
            params: LinkParams::None,
        }
    }

    pub fn with_params(mut self, params: LinkParams) -> Self {
        self.params = params;
        self
    }

    pub fn first_id(&self) -> Option<&str> {
        self.first.id()
    }

    pub fn last_id(&self) -> Option<&str> {
        self.last.id()
    }

    pub fn state(&self) -> LinkState {
        match (self.first.is_set(), self.last.is_set()) {
            (false, false) => LinkState::Empty,
            (true, false) => LinkState::Open,
            (true, true) => LinkState::Closed,
            (false, true) => LinkState::OrphanClose,
        }
    }

    /// Both ends carry identities
    pub fn is_resolved(&self) -> bool {
        self.first.is_resolved() && self.last.is_resolved()
    }
}
