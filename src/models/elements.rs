//! Element kinds understood by the scanner
//!
//! MEI is open-ended, but the temporal model and the link resolver only ever
//! branch on a small, closed set of tags. Classifying the tag once at parse
//! time lets every consumer match exhaustively instead of comparing strings.

use serde::{Deserialize, Serialize};

/// Closed classification of MEI element tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    // Timed events
    Note,
    Rest,
    MRest,
    Chord,
    Space,

    // Grouping inside a layer
    Beam,

    // Score structure
    Score,
    ScoreDef,
    StaffGrp,
    StaffDef,
    Section,
    Measure,
    Staff,
    Layer,
    Sb,

    // Linking elements
    Tie,
    Slur,
    Hairpin,

    // Note and measure annotations
    Artic,
    Syl,
    Dir,

    /// Anything the scanner does not branch on
    Other,
}

impl ElementKind {
    /// Classify a local tag name
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "note" => ElementKind::Note,
            "rest" => ElementKind::Rest,
            "mRest" => ElementKind::MRest,
            "chord" => ElementKind::Chord,
            "space" => ElementKind::Space,
            "beam" => ElementKind::Beam,
            "score" => ElementKind::Score,
            "scoreDef" => ElementKind::ScoreDef,
            "staffGrp" => ElementKind::StaffGrp,
            "staffDef" => ElementKind::StaffDef,
            "section" => ElementKind::Section,
            "measure" => ElementKind::Measure,
            "staff" => ElementKind::Staff,
            "layer" => ElementKind::Layer,
            "sb" => ElementKind::Sb,
            "tie" => ElementKind::Tie,
            "slur" => ElementKind::Slur,
            "hairpin" => ElementKind::Hairpin,
            "artic" => ElementKind::Artic,
            "syl" => ElementKind::Syl,
            "dir" => ElementKind::Dir,
            _ => ElementKind::Other,
        }
    }

    /// Leaf events the event enumerator yields
    pub fn is_event(self) -> bool {
        matches!(
            self,
            ElementKind::Note | ElementKind::Rest | ElementKind::MRest | ElementKind::Chord
        )
    }
}
