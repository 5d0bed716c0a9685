//! Events of one layer: render payload plus `@tie`/`@slur` markers

use super::report::{Articulation, BeamGroup, Direction, EventKind, RenderEvent};
use super::session::ScanSession;
use crate::errors::{MeiError, MeiResult};
use crate::links::LocationKey;
use crate::models::{ElementKind, MeiDocument, Meter, NodeId, Placement, TieKey};
use crate::parse::{parse_slur_attribute, parse_tie_attribute};
use crate::renderers::vexflow;
use crate::timing::{chord_dur_code, dur_code, duration_in_layer};

/// Where the layer being scanned sits
#[derive(Debug, Clone, Copy)]
pub(super) struct LayerScope {
    pub location: LocationKey,
    pub measure: NodeId,
    pub meter: Option<Meter>,
    pub clef: Option<&'static str>,
}

impl ScanSession {
    pub(super) fn scan_layer(&mut self, doc: &mut MeiDocument, scope: LayerScope, layer: NodeId) -> MeiResult<()> {
        let children = doc.children(layer).to_vec();
        for child in children {
            match doc.kind(child) {
                ElementKind::Note | ElementKind::Rest | ElementKind::MRest | ElementKind::Chord | ElementKind::Space => {
                    self.scan_event(doc, scope, child)?;
                }
                ElementKind::Beam => self.scan_beam(doc, scope, child)?,
                _ => self.unsupported(doc, child, "<layer>")?,
            }
        }
        Ok(())
    }

    fn scan_beam(&mut self, doc: &mut MeiDocument, scope: LayerScope, beam: NodeId) -> MeiResult<()> {
        let mut events = Vec::new();
        let children = doc.children(beam).to_vec();
        for child in children {
            match doc.kind(child) {
                ElementKind::Note | ElementKind::Rest | ElementKind::Chord | ElementKind::Space => {
                    events.push(self.scan_event(doc, scope, child)?);
                }
                _ => self.unsupported(doc, child, "<beam>")?,
            }
        }
        self.report.beams.push(BeamGroup {
            measure: scope.location.measure,
            staff: scope.location.staff,
            layer: scope.location.layer,
            events,
        });
        Ok(())
    }

    /// Emit one event and return its identity
    fn scan_event(&mut self, doc: &mut MeiDocument, scope: LayerScope, node: NodeId) -> MeiResult<String> {
        let id = doc.assign_identity(node);
        let beats = match scope.meter {
            Some(meter) => Some(duration_in_layer(doc, node, meter, scope.location.layer)?),
            None => None,
        };

        let mut event = RenderEvent {
            id: id.clone(),
            kind: EventKind::Note,
            measure: scope.location.measure,
            staff: scope.location.staff,
            layer: scope.location.layer,
            keys: Vec::new(),
            duration: String::new(),
            dots: dots(doc, node)?,
            beats,
            accidentals: Vec::new(),
            articulations: articulations(doc, node)?,
            stem: None,
            lyric: lyric(doc, node),
            directions: directions(doc, scope.measure, &id, self.settings.strip_reference_hash),
        };

        match doc.kind(node) {
            ElementKind::Note => {
                let (pname, oct) = pitch(doc, node)?;
                event.keys.push(vexflow::note_key(&pname, &oct));
                event.accidentals.push(accidental(doc, node)?);
                event.duration = vexflow::duration_code(dur_code(doc, node)?, false)?;
                event.stem = vexflow::stem_direction(doc.attr(node, "stem.dir"), scope.clef, &pname, &oct);
                self.note_markers(doc, node, &id, &pname, &oct, None)?;
            }
            ElementKind::Rest => {
                event.kind = EventKind::Rest;
                event.keys.push(REST_KEY.to_string());
                event.accidentals.push(None);
                event.duration = vexflow::duration_code(dur_code(doc, node)?, true)?;
            }
            ElementKind::MRest => {
                event.kind = EventKind::MRest;
                event.keys.push(REST_KEY.to_string());
                event.accidentals.push(None);
                event.duration = vexflow::MEASURE_REST.to_string();
            }
            ElementKind::Space => {
                event.kind = EventKind::Space;
                event.duration = vexflow::duration_code(dur_code(doc, node)?, false)?;
            }
            ElementKind::Chord => {
                event.kind = EventKind::Chord;
                event.duration = vexflow::duration_code(chord_dur_code(doc, node, scope.location.layer)?, false)?;
                self.scan_chord_members(doc, scope, node, &id, &mut event)?;
            }
            _ => return Err(MeiError::unsupported(doc.tag(node), "<layer>")),
        }

        self.report.events.push(event);
        Ok(id)
    }

    fn scan_chord_members(
        &mut self,
        doc: &mut MeiDocument,
        scope: LayerScope,
        chord: NodeId,
        chord_id: &str,
        event: &mut RenderEvent,
    ) -> MeiResult<()> {
        let members: Vec<NodeId> = doc.descendants_of_kind(chord, ElementKind::Note).collect();
        let chord_tie = doc.attr(chord, "tie").map(str::to_string);

        for member in members {
            let (pname, oct) = pitch(doc, member)?;
            event.keys.push(vexflow::note_key(&pname, &oct));
            event.accidentals.push(accidental(doc, member)?);
            event.dots = event.dots.max(dots(doc, member)?);
            if event.stem.is_none() {
                let stem_dir = doc.attr(chord, "stem.dir").or(doc.attr(member, "stem.dir"));
                event.stem = vexflow::stem_direction(stem_dir, scope.clef, &pname, &oct);
            }

            let member_id = doc.assign_identity(member);
            self.note_markers(doc, member, &member_id, &pname, &oct, chord_tie.as_deref())?;
        }

        if let Some(slur) = doc.attr(chord, "slur") {
            let tokens = parse_slur_attribute(slur)?;
            self.automaton.apply_slur_tokens(&mut self.links, chord_id, &tokens, self.system);
        }
        Ok(())
    }

    /// Feed a note's `@tie` (plus any tie inherited from its chord) and
    /// `@slur` into the tie/slur automaton
    fn note_markers(
        &mut self,
        doc: &MeiDocument,
        note: NodeId,
        note_id: &str,
        pname: &str,
        oct: &str,
        inherited_tie: Option<&str>,
    ) -> MeiResult<()> {
        let key = TieKey {
            pname: pname.to_string(),
            oct: oct.to_string(),
            system: self.system,
        };
        for tie in [inherited_tie, doc.attr(note, "tie")].into_iter().flatten() {
            let markers = parse_tie_attribute(tie);
            self.automaton.apply_tie_markers(&mut self.links, note_id, &markers, &key);
        }

        if let Some(slur) = doc.attr(note, "slur") {
            let tokens = parse_slur_attribute(slur)?;
            self.automaton.apply_slur_tokens(&mut self.links, note_id, &tokens, self.system);
        }
        Ok(())
    }
}

/// Key a rest is drawn at
const REST_KEY: &str = "c/5";

fn pitch(doc: &MeiDocument, note: NodeId) -> MeiResult<(String, String)> {
    let pname = doc
        .attr(note, "pname")
        .ok_or_else(|| MeiError::missing_attribute("note", "pname", doc.describe(note)))?;
    let oct = doc
        .attr(note, "oct")
        .ok_or_else(|| MeiError::missing_attribute("note", "oct", doc.describe(note)))?;
    Ok((pname.trim().to_string(), oct.trim().to_string()))
}

fn dots(doc: &MeiDocument, node: NodeId) -> MeiResult<u32> {
    match doc.attr(node, "dots") {
        Some(dots) => dots.trim().parse::<u32>().map_err(|_| {
            MeiError::InvalidArgument(format!("@dots=\"{}\" of {} is not a number", dots, doc.describe(node)))
        }),
        None => Ok(0),
    }
}

fn accidental(doc: &MeiDocument, note: NodeId) -> MeiResult<Option<&'static str>> {
    match doc.attr(note, "accid") {
        Some(accid) => vexflow::accidental(accid).map(Some).ok_or_else(|| {
            MeiError::InvalidArgument(format!("@accid=\"{}\" of {} is not supported", accid, doc.describe(note)))
        }),
        None => Ok(None),
    }
}

/// `<artic>` descendants; `@artic` may list several values
fn articulations(doc: &MeiDocument, node: NodeId) -> MeiResult<Vec<Articulation>> {
    let mut result = Vec::new();
    for artic in doc.descendants_of_kind(node, ElementKind::Artic) {
        let place = doc.attr(artic, "place").map(Placement::parse).transpose()?;
        for value in doc.attr(artic, "artic").unwrap_or_default().split_whitespace() {
            match vexflow::articulation(value) {
                Some(code) => result.push(Articulation { code, place }),
                None => log::debug!("articulation \"{}\" has no rendering equivalent", value),
            }
        }
    }
    Ok(result)
}

/// Lyric syllables, one line per `<syl>`; a word continues with '-'
fn lyric(doc: &MeiDocument, node: NodeId) -> Option<String> {
    let lines: Vec<String> = doc
        .descendants_of_kind(node, ElementKind::Syl)
        .map(|syl| {
            let text = doc.text(syl).unwrap_or_default();
            match doc.attr(syl, "wordpos") {
                Some("i") | Some("m") => format!("{}-", text),
                _ => text.to_string(),
            }
        })
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// `<dir>` elements of the measure that start on `id`
fn directions(doc: &MeiDocument, measure: NodeId, id: &str, strip_hash: bool) -> Vec<Direction> {
    doc.descendants_of_kind(measure, ElementKind::Dir)
        .filter(|&dir| {
            doc.attr(dir, "startid").is_some_and(|start| {
                let start = start.trim();
                let start = if strip_hash { start.strip_prefix('#').unwrap_or(start) } else { start };
                start == id
            })
        })
        .map(|dir| Direction {
            text: doc.text_content(dir),
            place: doc.attr(dir, "place").and_then(|p| Placement::parse(p).ok()),
        })
        .collect()
}
