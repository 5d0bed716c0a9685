//! Duration of events in beats
//!
//! - note / rest / space: `@dur` is mandatory, beats = meter.unit / dur
//! - mRest: fills the measure, beats = meter.count
//! - chord: own `@dur`, else the common `@dur` of its member notes in the
//!   requested layer
//! - beam: sum of its children (note / rest / space / chord only)
//!
//! `@dots` is not applied here; see DESIGN.md.

use crate::errors::{MeiError, MeiResult};
use crate::models::{dur2beats, ElementKind, MeiDocument, Meter, NodeId};

/// Layer whose chord members are considered when no layer is given
pub const DEFAULT_LAYER_N: u32 = 1;

/// Duration of `node` in beats of `meter`
pub fn duration_of(doc: &MeiDocument, node: NodeId, meter: Meter) -> MeiResult<f64> {
    duration_in_layer(doc, node, meter, DEFAULT_LAYER_N)
}

/// Same as [`duration_of`], filtering chord members by logical layer `layer_n`
pub fn duration_in_layer(
    doc: &MeiDocument,
    node: NodeId,
    meter: Meter,
    layer_n: u32,
) -> MeiResult<f64> {
    match doc.kind(node) {
        ElementKind::Note | ElementKind::Rest | ElementKind::Space => {
            dur2beats(dur_code(doc, node)?, meter)
        }
        ElementKind::MRest => Ok(meter.count() as f64),
        ElementKind::Chord => chord_duration(doc, node, meter, layer_n),
        ElementKind::Beam => beam_duration(doc, node, meter, layer_n),
        ElementKind::Score
        | ElementKind::ScoreDef
        | ElementKind::StaffGrp
        | ElementKind::StaffDef
        | ElementKind::Section
        | ElementKind::Measure
        | ElementKind::Staff
        | ElementKind::Layer
        | ElementKind::Sb
        | ElementKind::Tie
        | ElementKind::Slur
        | ElementKind::Hairpin
        | ElementKind::Artic
        | ElementKind::Syl
        | ElementKind::Dir
        | ElementKind::Other => Err(MeiError::unsupported(
            doc.tag(node),
            "duration calculation",
        )),
    }
}

/// Read the mandatory `@dur` of an element as a reciprocal duration code
pub fn dur_code(doc: &MeiDocument, node: NodeId) -> MeiResult<u32> {
    let dur = doc
        .attr(node, "dur")
        .ok_or_else(|| MeiError::missing_attribute(doc.tag(node), "dur", doc.describe(node)))?;
    parse_dur(dur, doc, node)
}

fn parse_dur(dur: &str, doc: &MeiDocument, node: NodeId) -> MeiResult<u32> {
    match dur.trim().parse::<u32>() {
        Ok(code) if code > 0 => Ok(code),
        _ => Err(MeiError::InvalidArgument(format!(
            "@dur=\"{}\" of {} is not a number ('breve' and 'long' are not supported)",
            dur,
            doc.describe(node)
        ))),
    }
}

/// Duration code of a chord: its own `@dur`, or the one its members agree on
pub fn chord_dur_code(doc: &MeiDocument, chord: NodeId, layer_n: u32) -> MeiResult<u32> {
    if let Some(dur) = doc.attr(chord, "dur") {
        return parse_dur(dur, doc, chord);
    }

    let layer = layer_n.to_string();
    let mut agreed: Option<&str> = None;
    for note in doc.descendants_of_kind(chord, ElementKind::Note) {
        let in_layer = doc.attr(note, "layer").map_or(true, |l| l.trim() == layer);
        if !in_layer {
            continue;
        }
        let Some(dur) = doc.attr(note, "dur") else {
            continue;
        };
        match agreed {
            None => agreed = Some(dur),
            Some(first) if first != dur => {
                return Err(MeiError::AmbiguousDuration {
                    chord: doc.describe(chord),
                    first: first.to_string(),
                    second: dur.to_string(),
                });
            }
            Some(_) => {}
        }
    }

    match agreed {
        Some(dur) => parse_dur(dur, doc, chord),
        None => Err(MeiError::missing_attribute(
            "chord",
            "dur",
            format!(
                "{}: @dur must be set on the chord or on at least one of its notes",
                doc.describe(chord)
            ),
        )),
    }
}

fn chord_duration(doc: &MeiDocument, chord: NodeId, meter: Meter, layer_n: u32) -> MeiResult<f64> {
    dur2beats(chord_dur_code(doc, chord, layer_n)?, meter)
}

fn beam_duration(doc: &MeiDocument, beam: NodeId, meter: Meter, layer_n: u32) -> MeiResult<f64> {
    let mut total = 0.0;
    for &child in doc.children(beam) {
        total += match doc.kind(child) {
            ElementKind::Note | ElementKind::Rest | ElementKind::Space => {
                dur2beats(dur_code(doc, child)?, meter)?
            }
            ElementKind::Chord => chord_duration(doc, child, meter, layer_n)?,
            _ => {
                return Err(MeiError::unsupported(doc.tag(child), doc.describe(beam)))
            }
        };
    }
    Ok(total)
}
