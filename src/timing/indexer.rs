//! Timestamp <-> identity conversion
//!
//! - [`sum_up_until`]: beats elapsed in a layer before a given event
//! - [`id2tstamp`]: compound timestamp of an event within a multi-measure
//!   context
//! - [`tstamp2id`]: identity of the event nearest to a local timestamp
//!
//! Timestamps are 1-based: the first event of a measure sits on beat 1.

use serde::Serialize;

use super::duration::{chord_dur_code, dur_code, duration_of, DEFAULT_LAYER_N};
use super::enumerator::EventEnumerator;
use crate::errors::{MeiError, MeiResult};
use crate::models::{dur2beats, ElementKind, MeiDocument, Meter, NodeId, TimeStamp};

/// Outcome of [`sum_up_until`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SumResult {
    /// Beats before the target if found, else the duration of the whole node
    pub beats: f64,
    pub found: bool,
}

impl SumResult {
    fn hit() -> Self {
        SumResult { beats: 0.0, found: true }
    }

    fn miss(beats: f64) -> Self {
        SumResult { beats, found: false }
    }
}

/// One measure of a logical voice. `meter` is only set where it changes; the
/// first entry of a context must carry one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContextEntry {
    pub layer: NodeId,
    pub meter: Option<Meter>,
}

/// Accumulate the beats of the events preceding `target_id` in `layer`.
///
/// A chord that declares its own `@dur` is treated as one unit: a target
/// among its member notes is reported as found at the chord's start.
pub fn sum_up_until(
    doc: &MeiDocument,
    target_id: &str,
    layer: NodeId,
    meter: Meter,
) -> MeiResult<SumResult> {
    sum_in_node(doc, target_id, layer, meter)
}

fn sum_in_node(doc: &MeiDocument, target: &str, node: NodeId, meter: Meter) -> MeiResult<SumResult> {
    let is_target = doc.identity(node) == Some(target);

    match doc.kind(node) {
        ElementKind::Note | ElementKind::Rest => {
            if is_target {
                return Ok(SumResult::hit());
            }
            Ok(SumResult::miss(dur2beats(dur_code(doc, node)?, meter)?))
        }
        ElementKind::MRest => {
            if is_target {
                return Ok(SumResult::hit());
            }
            Ok(SumResult::miss(meter.count() as f64))
        }
        ElementKind::Layer | ElementKind::Beam => {
            let mut beats = 0.0;
            for &child in doc.children(node) {
                let subtotal = sum_in_node(doc, target, child, meter)?;
                beats += subtotal.beats;
                if subtotal.found {
                    return Ok(SumResult { beats, found: true });
                }
            }
            Ok(SumResult::miss(beats))
        }
        ElementKind::Chord => {
            if is_target || contains_identity(doc, node, target) {
                return Ok(SumResult::hit());
            }
            let code = chord_dur_code(doc, node, DEFAULT_LAYER_N)?;
            Ok(SumResult::miss(dur2beats(code, meter)?))
        }
        ElementKind::Space
        | ElementKind::Score
        | ElementKind::ScoreDef
        | ElementKind::StaffGrp
        | ElementKind::StaffDef
        | ElementKind::Section
        | ElementKind::Measure
        | ElementKind::Staff
        | ElementKind::Sb
        | ElementKind::Tie
        | ElementKind::Slur
        | ElementKind::Hairpin
        | ElementKind::Artic
        | ElementKind::Syl
        | ElementKind::Dir
        | ElementKind::Other => Ok(SumResult::miss(0.0)),
    }
}

fn contains_identity(doc: &MeiDocument, node: NodeId, target: &str) -> bool {
    doc.find_by_identity(target)
        .is_some_and(|found| doc.is_descendant_of(found, node))
}

/// Compound timestamp (`"<measure>m+<beat>"`) of `event_id` in `context`.
///
/// Measures are counted from 0 at the first context entry; the meter is
/// carried forward from the last entry that declares one.
pub fn id2tstamp(doc: &MeiDocument, event_id: &str, context: &[ContextEntry]) -> MeiResult<TimeStamp> {
    let mut meter: Option<Meter> = None;
    for (i, entry) in context.iter().enumerate() {
        log::debug!("id2tstamp: <<<< measure {} >>>>", i);
        if entry.meter.is_some() {
            meter = entry.meter;
        }
        let Some(current) = meter else {
            return Err(MeiError::MissingMeter(format!(
                "first context entry of the search for xml:id=\"{}\" has no meter",
                event_id
            )));
        };

        let result = sum_up_until(doc, event_id, entry.layer, current)?;
        if result.found {
            return Ok(TimeStamp::Compound {
                measures: i as u32,
                beats: result.beats + 1.0,
            });
        }
    }
    Err(MeiError::EventNotFound(event_id.to_string()))
}

/// Find the event nearest to local timestamp `tstamp` in `layer` without
/// touching the document.
///
/// Events are walked in order while the signed distance `tstamp - position`
/// is positive. At the first non-positive distance the previous event wins
/// if it is strictly closer, otherwise the current one does.
pub fn nearest_event(
    doc: &MeiDocument,
    tstamp: f64,
    layer: NodeId,
    meter: Meter,
) -> MeiResult<Option<NodeId>> {
    let mut events = EventEnumerator::new(doc, layer)?;
    let mut elapsed = 0.0;
    let mut previous: Option<(NodeId, f64)> = None;
    let mut current: Option<(NodeId, f64)> = None;

    while !events.is_exhausted() && current.map_or(true, |(_, dist)| dist > 0.0) {
        previous = current;
        let event = events.next_event()?;
        let dist = tstamp - (elapsed + 1.0);
        elapsed += duration_of(doc, event, meter)?;
        current = Some((event, dist));
    }

    let Some((event, dist)) = current else {
        return Ok(None);
    };
    if dist < 0.0 {
        if let Some((prev, prev_dist)) = previous {
            if prev_dist < dist.abs() {
                return Ok(Some(prev));
            }
        }
    }
    Ok(Some(event))
}

/// Identity of the event nearest to `tstamp` in `layer`, or `None` if the
/// layer holds no events. The match is inexact by design. A winner without
/// an identity gets one generated and written into the document.
pub fn tstamp2id(
    doc: &mut MeiDocument,
    tstamp: f64,
    layer: NodeId,
    meter: Meter,
) -> MeiResult<Option<String>> {
    Ok(nearest_event(doc, tstamp, layer, meter)?.map(|winner| doc.assign_identity(winner)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_mei;

    fn four_four() -> Meter {
        Meter::new(4, 4).unwrap()
    }

    fn quarters() -> MeiDocument {
        parse_mei(
            r#"<layer>
                 <note xml:id="q1" dur="4"/><note xml:id="q2" dur="4"/>
                 <note xml:id="q3" dur="4"/><note xml:id="q4" dur="4"/>
               </layer>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_sum_up_until_stops_at_target() {
        let doc = parse_mei(
            r#"<layer><note xml:id="a" dur="4"/><note xml:id="b" dur="4"/><note xml:id="c" dur="8"/></layer>"#,
        )
        .unwrap();
        let result = sum_up_until(&doc, "c", doc.root(), four_four()).unwrap();
        assert_eq!(result, SumResult { beats: 2.0, found: true });
    }

    #[test]
    fn test_sum_up_until_missing_returns_layer_total() {
        let doc = parse_mei(
            r#"<layer><note dur="4"/><beam><note dur="8"/><note dur="8"/></beam><mRest/></layer>"#,
        )
        .unwrap();
        let result = sum_up_until(&doc, "nowhere", doc.root(), four_four()).unwrap();
        assert_eq!(result, SumResult { beats: 6.0, found: false });
    }

    #[test]
    fn test_sum_up_until_inside_beam() {
        let doc = parse_mei(
            r#"<layer><note dur="2"/><beam><note dur="8"/><note xml:id="t" dur="8"/></beam></layer>"#,
        )
        .unwrap();
        let result = sum_up_until(&doc, "t", doc.root(), four_four()).unwrap();
        assert_eq!(result, SumResult { beats: 2.5, found: true });
    }

    #[test]
    fn test_chord_with_own_dur_is_one_unit() {
        let doc = parse_mei(
            r#"<layer><note dur="4"/><chord dur="4"><note xml:id="c4" pname="c"/><note xml:id="e4" pname="e"/></chord></layer>"#,
        )
        .unwrap();
        for member in ["c4", "e4"] {
            let result = sum_up_until(&doc, member, doc.root(), four_four()).unwrap();
            assert_eq!(result, SumResult { beats: 1.0, found: true });
        }
    }

    #[test]
    fn test_chord_without_dur_matches_members() {
        let doc = parse_mei(
            r#"<layer><chord><note xml:id="m1" dur="2"/><note dur="2"/></chord><note xml:id="after" dur="4"/></layer>"#,
        )
        .unwrap();
        assert_eq!(
            sum_up_until(&doc, "m1", doc.root(), four_four()).unwrap(),
            SumResult { beats: 0.0, found: true }
        );
        assert_eq!(
            sum_up_until(&doc, "after", doc.root(), four_four()).unwrap(),
            SumResult { beats: 2.0, found: true }
        );
    }

    #[test]
    fn test_tstamp2id_exact_position() {
        let mut doc = quarters();
        let layer = doc.root();
        assert_eq!(tstamp2id(&mut doc, 3.0, layer, four_four()).unwrap().as_deref(), Some("q3"));
    }

    #[test]
    fn test_tstamp2id_nearest_match() {
        let mut doc = quarters();
        let layer = doc.root();
        // 2.4 is closer to beat 2, 2.6 to beat 3; a tie goes to the later event
        assert_eq!(tstamp2id(&mut doc, 2.4, layer, four_four()).unwrap().as_deref(), Some("q2"));
        assert_eq!(tstamp2id(&mut doc, 2.6, layer, four_four()).unwrap().as_deref(), Some("q3"));
        assert_eq!(tstamp2id(&mut doc, 2.5, layer, four_four()).unwrap().as_deref(), Some("q3"));
        assert_eq!(tstamp2id(&mut doc, 0.5, layer, four_four()).unwrap().as_deref(), Some("q1"));
        assert_eq!(tstamp2id(&mut doc, 9.0, layer, four_four()).unwrap().as_deref(), Some("q4"));
    }

    #[test]
    fn test_tstamp2id_empty_layer() {
        let mut doc = parse_mei(r#"<layer><clef/></layer>"#).unwrap();
        let layer = doc.root();
        assert_eq!(tstamp2id(&mut doc, 1.0, layer, four_four()).unwrap(), None);
    }

    #[test]
    fn test_tstamp2id_assigns_identity_once() {
        let mut doc = parse_mei(r#"<layer><note dur="2"/><beam><note dur="8"/><note dur="8"/></beam></layer>"#).unwrap();
        let layer = doc.root();
        let first = tstamp2id(&mut doc, 3.5, layer, four_four()).unwrap().unwrap();
        let second = tstamp2id(&mut doc, 3.5, layer, four_four()).unwrap().unwrap();
        assert_eq!(first, second);

        let node = doc.find_by_identity(&first).unwrap();
        let beam = doc.children(layer)[1];
        assert_eq!(doc.children(beam)[1], node);
    }

    #[test]
    fn test_id2tstamp_across_measures() {
        let doc = parse_mei(
            r#"<section>
                 <layer><note dur="2"/><note dur="2"/></layer>
                 <layer><note dur="4"/><note xml:id="x" dur="4"/><note dur="2"/></layer>
               </section>"#,
        )
        .unwrap();
        let layers = doc.children(doc.root()).to_vec();
        let context = vec![
            ContextEntry { layer: layers[0], meter: Some(four_four()) },
            ContextEntry { layer: layers[1], meter: None },
        ];
        let ts = id2tstamp(&doc, "x", &context).unwrap();
        assert_eq!(ts.to_string(), "1m+2");
    }

    #[test]
    fn test_id2tstamp_needs_meter_and_target() {
        let doc = quarters();
        let no_meter = vec![ContextEntry { layer: doc.root(), meter: None }];
        assert!(matches!(id2tstamp(&doc, "q1", &no_meter), Err(MeiError::MissingMeter(_))));

        let context = vec![ContextEntry { layer: doc.root(), meter: Some(four_four()) }];
        assert_eq!(
            id2tstamp(&doc, "zz", &context),
            Err(MeiError::EventNotFound("zz".to_string()))
        );
    }
}
