//! The scan session: one document-order pass over a score
//!
//! ```text
//! scoreDef ──► StaffTracker ◄── staffDef / scoreDef in sections
//!                  │
//! section ──► measure ──► staff ──► layer ──► events (+ @tie/@slur markers)
//!                 │                   │
//!                 │                   └──► ForwardResolver::visit
//!                 └──► <tie>/<slur>/<hairpin> ──► LinkExtractor
//! ```
//!
//! All mutable state lives in the session, so two documents never share a
//! pending table or open tie list. Measures must be visited in document
//! order: forward references are keyed by increasing measure numbers and the
//! tie/slur automaton pairs in creation order.

use std::collections::{BTreeMap, HashMap};

use super::layer::LayerScope;
use super::report::{LinkDiagnostic, ResolvedLink, ScanReport, StaffRender, UnresolvedReason};
use crate::errors::{MeiError, MeiResult};
use crate::links::{ForwardResolver, LinkExtractor, LinkStore, LocationKey, TieSlurAutomaton};
use crate::models::staff_def::TRACKED_ATTRIBUTES;
use crate::models::{ElementKind, LayerContext, LinkKind, LinkState, MeiDocument, Meter, NodeId, StaffDef, TimeStamp};
use crate::renderers::vexflow;
use crate::settings::ScanSettings;
use crate::staff::{stave_connector, StaffTracker};
use crate::timing::{id2tstamp, ContextEntry};

#[derive(Debug, Clone, Default)]
pub struct ScanSession {
    pub(super) settings: ScanSettings,
    pub(super) staves: StaffTracker,
    pub(super) links: LinkStore,
    pub(super) automaton: TieSlurAutomaton,
    pub(super) resolver: ForwardResolver,
    /// Context of each logical voice, keyed by (staff, layer)
    voices: BTreeMap<(u32, u32), Vec<ContextEntry>>,
    voice_meters: BTreeMap<(u32, u32), Meter>,
    pub(super) system: u32,
    new_section: bool,
    system_break: bool,
    initial_score_def: Option<NodeId>,
    pub(super) report: ScanReport,
}

impl ScanSession {
    pub fn new(settings: ScanSettings) -> Self {
        ScanSession {
            settings,
            ..Default::default()
        }
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    pub fn links(&self) -> &LinkStore {
        &self.links
    }

    pub fn resolver(&self) -> &ForwardResolver {
        &self.resolver
    }

    pub fn staves(&self) -> &StaffTracker {
        &self.staves
    }

    /// Context entries collected for one voice, in measure order
    pub fn voice_context(&self, staff: u32, layer: u32) -> &[ContextEntry] {
        self.voices.get(&(staff, layer)).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Compound timestamp of `event_id` counted from the first measure of
    /// voice `staff`/`layer`
    pub fn locate(&self, doc: &MeiDocument, event_id: &str, staff: u32, layer: u32) -> MeiResult<TimeStamp> {
        id2tstamp(doc, event_id, self.voice_context(staff, layer))
    }

    /// Scan `doc`, injecting identities into every rendered event and every
    /// event a timestamp resolved to
    pub fn run(&mut self, doc: &mut MeiDocument) -> MeiResult<ScanReport> {
        doc.set_id_prefix(&self.settings.generated_id_prefix);

        let score_def = first_score_def(doc)
            .ok_or_else(|| MeiError::InvalidArgument("document has no <scoreDef>".to_string()))?;
        self.initial_score_def = Some(score_def);
        self.read_score_def(doc, score_def)?;

        for section in top_level_sections(doc) {
            self.scan_section(doc, section)?;
        }

        let report = self.finish()?;
        log::info!(
            "scan complete: {} events in {} system(s), {} ties, {} slurs, {} hairpins, {} unresolved",
            report.events.len(),
            report.systems,
            report.ties.len(),
            report.slurs.len(),
            report.hairpins.len(),
            report.diagnostics.len()
        );
        Ok(report)
    }

    // ========================================================================
    // Score and staff definitions
    // ========================================================================

    fn read_score_def(&mut self, doc: &MeiDocument, score_def: NodeId) -> MeiResult<()> {
        let mut defaults = StaffDef::new(0);
        for name in TRACKED_ATTRIBUTES {
            if let Some(value) = doc.attr(score_def, name) {
                defaults.set(name, value);
            }
        }

        let mut defined = Vec::new();
        for &child in doc.children(score_def) {
            match doc.kind(child) {
                ElementKind::StaffGrp => self.read_staff_grp(doc, child, &defaults, &mut defined)?,
                ElementKind::StaffDef => self.define_staff(doc, child, &defaults, &mut defined)?,
                _ => self.unsupported(doc, child, "<scoreDef>")?,
            }
        }

        // scoreDef-level attributes apply to staves it does not redefine
        if !defaults.is_empty() {
            let others: Vec<u32> = self.staves.staff_numbers().filter(|n| !defined.contains(n)).collect();
            for n in others {
                let mut def = defaults.clone();
                def.n = n;
                self.staves.update(def);
            }
        }
        Ok(())
    }

    fn read_staff_grp(
        &mut self,
        doc: &MeiDocument,
        group: NodeId,
        defaults: &StaffDef,
        defined: &mut Vec<u32>,
    ) -> MeiResult<()> {
        if let Some(connector) = stave_connector(doc, group)? {
            self.report.connectors.push(connector);
        }
        for &child in doc.children(group) {
            match doc.kind(child) {
                ElementKind::StaffGrp => self.read_staff_grp(doc, child, defaults, defined)?,
                ElementKind::StaffDef => self.define_staff(doc, child, defaults, defined)?,
                _ => self.unsupported(doc, child, "<staffGrp>")?,
            }
        }
        Ok(())
    }

    fn define_staff(
        &mut self,
        doc: &MeiDocument,
        node: NodeId,
        defaults: &StaffDef,
        defined: &mut Vec<u32>,
    ) -> MeiResult<()> {
        let def = StaffDef::from_node(doc, node)?;
        let mut base = defaults.clone();
        base.n = def.n;
        defined.push(def.n);
        self.staves.update(base.merged_with(&def));
        Ok(())
    }

    // ========================================================================
    // Sections and measures
    // ========================================================================

    fn scan_section(&mut self, doc: &mut MeiDocument, section: NodeId) -> MeiResult<()> {
        self.new_section = true;
        let children = doc.children(section).to_vec();
        for child in children {
            match doc.kind(child) {
                ElementKind::Measure => self.scan_measure(doc, child)?,
                ElementKind::ScoreDef => {
                    if Some(child) != self.initial_score_def {
                        self.read_score_def(doc, child)?;
                    }
                }
                ElementKind::StaffDef => {
                    let def = StaffDef::from_node(doc, child)?;
                    self.staves.update(def);
                }
                ElementKind::Sb => self.system_break = true,
                ElementKind::Section => self.scan_section(doc, child)?,
                _ => self.unsupported(doc, child, "<section>")?,
            }
        }
        Ok(())
    }

    fn start_system(&mut self) {
        self.system += 1;
        if self.new_section {
            self.staves.force_section_start();
        } else {
            self.staves.force_system_break();
        }
        self.new_section = false;
        self.system_break = false;
        log::debug!("system {} starts", self.system);
    }

    fn scan_measure(&mut self, doc: &mut MeiDocument, measure: NodeId) -> MeiResult<()> {
        let n_attr = doc
            .attr(measure, "n")
            .ok_or_else(|| MeiError::missing_attribute("measure", "n", doc.describe(measure)))?;
        let measure_n = n_attr.trim().parse::<u32>().map_err(|_| {
            MeiError::InvalidArgument(format!("<measure> @n \"{}\" is not a number", n_attr))
        })?;
        log::debug!("<<<< measure {} >>>>", measure_n);

        if self.new_section || self.system_break {
            self.start_system();
        }

        let meters = self.staves.meters()?;
        let staves: Vec<NodeId> = doc.children_of_kind(measure, ElementKind::Staff).collect();
        for staff in staves {
            let staff_n = number(doc, staff, self.settings.default_staff_n)?;
            self.render_staff(measure_n, staff_n)?;
            let clef = self.clef_name(staff_n);
            let meter = meters.get(&staff_n).copied();

            let layers: Vec<NodeId> = doc.children_of_kind(staff, ElementKind::Layer).collect();
            for layer in layers {
                let layer_n = number(doc, layer, self.settings.default_layer_n)?;
                let location = LocationKey {
                    measure: measure_n,
                    staff: staff_n,
                    layer: layer_n,
                };

                match meter {
                    Some(meter) => {
                        self.resolver
                            .visit(doc, &mut self.links, location, LayerContext { layer, meter })?;
                    }
                    None if !self.resolver.pending().waiting(location).is_empty() => {
                        return Err(MeiError::MissingMeter(format!(
                            "links wait for staff {} in measure {}",
                            staff_n, measure_n
                        )));
                    }
                    None => {}
                }

                self.record_voice(staff_n, layer_n, layer, meter);
                self.scan_layer(doc, LayerScope { location, measure, meter, clef }, layer)?;
            }
        }

        let extractor = LinkExtractor {
            measure,
            measure_n,
            settings: &self.settings,
            meters: &meters,
        };
        extractor.extract(doc, &mut self.links, &mut self.resolver)?;
        Ok(())
    }

    fn record_voice(&mut self, staff_n: u32, layer_n: u32, layer: NodeId, meter: Option<Meter>) {
        let key = (staff_n, layer_n);
        let changed = match (meter, self.voice_meters.get(&key)) {
            (Some(m), Some(&last)) => m != last,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if let (true, Some(m)) = (changed, meter) {
            self.voice_meters.insert(key, m);
        }
        self.voices.entry(key).or_default().push(ContextEntry {
            layer,
            meter: if changed { meter } else { None },
        });
    }

    fn clef_name(&self, staff_n: u32) -> Option<&'static str> {
        let def = &self.staves.get(staff_n)?.def;
        vexflow::clef(def.get("clef.shape")?, def.get("clef.line")).ok()
    }

    /// Emit the stave record for `staff_n`, consuming its render flags
    fn render_staff(&mut self, measure_n: u32, staff_n: u32) -> MeiResult<()> {
        let flags = self.staves.consume(staff_n);
        let mut render = StaffRender {
            measure: measure_n,
            staff: staff_n,
            system: self.system,
            clef: None,
            key: None,
            time: None,
        };

        if let Some(info) = self.staves.get(staff_n) {
            let def = &info.def;
            if flags.clef {
                let shape = def.get("clef.shape").ok_or_else(|| {
                    MeiError::missing_attribute("staffDef", "clef.shape", format!("staff {}", staff_n))
                })?;
                render.clef = Some(vexflow::clef(shape, def.get("clef.line"))?);
            }
            if flags.keysig && matches!(def.get("key.sig.show"), None | Some("true")) {
                render.key = Some(vexflow::key_spec(
                    def.get("key.pname"),
                    def.get("key.accid"),
                    def.get("key.mode"),
                )?);
            }
            if flags.timesig && matches!(def.get("meter.rend"), None | Some("norm")) {
                if let (Some(count), Some(unit)) = (def.get("meter.count"), def.get("meter.unit")) {
                    render.time = Some(vexflow::time_spec(count, unit));
                }
            }
        }

        self.report.staff_renders.push(render);
        Ok(())
    }

    pub(super) fn unsupported(&self, doc: &MeiDocument, node: NodeId, context: &str) -> MeiResult<()> {
        if self.settings.skip_unsupported_elements {
            log::warn!("skipping {} in {}", doc.describe(node), context);
            Ok(())
        } else {
            Err(MeiError::unsupported(doc.tag(node), context))
        }
    }

    // ========================================================================
    // End of scan
    // ========================================================================

    fn finish(&mut self) -> MeiResult<ScanReport> {
        let waiting: HashMap<_, _> = self.resolver.pending().iter().map(|(at, handle)| (handle, at)).collect();

        let mut report = std::mem::take(&mut self.report);
        report.systems = self.system;

        for (handle, link) in self.links.iter() {
            if let Some(&at) = waiting.get(&handle) {
                report
                    .diagnostics
                    .push(LinkDiagnostic::new(link, UnresolvedReason::PendingForward, Some(at)));
                continue;
            }

            if let (true, Some(first), Some(last)) = (link.is_resolved(), link.first_id(), link.last_id()) {
                let resolved = ResolvedLink {
                    first: first.to_string(),
                    last: last.to_string(),
                    params: link.params.clone(),
                };
                match link.kind {
                    LinkKind::Tie => report.ties.push(resolved),
                    LinkKind::Slur => report.slurs.push(resolved),
                    LinkKind::Hairpin => report.hairpins.push(resolved),
                }
                continue;
            }

            let reason = match link.state() {
                LinkState::Empty => UnresolvedReason::MissingEndpoints,
                LinkState::Open => UnresolvedReason::OpenAtEnd,
                LinkState::OrphanClose => UnresolvedReason::OrphanClose,
                LinkState::Closed => UnresolvedReason::NoMatchingEvent,
            };
            let diagnostic = LinkDiagnostic::new(link, reason, None);
            log::warn!("unresolved {} {}", diagnostic.kind, diagnostic);
            report.diagnostics.push(diagnostic);
        }

        if self.settings.strict_links {
            if let Some(diagnostic) = report.diagnostics.first() {
                return Err(diagnostic.to_error());
            }
        }
        Ok(report)
    }
}

/// `@n` of a staff or layer, `default` when absent
pub(super) fn number(doc: &MeiDocument, node: NodeId, default: u32) -> MeiResult<u32> {
    match doc.attr(node, "n") {
        Some(n) => n.trim().parse::<u32>().map_err(|_| {
            MeiError::InvalidArgument(format!("{} @n \"{}\" is not a number", doc.describe(node), n))
        }),
        None => Ok(default),
    }
}

fn first_score_def(doc: &MeiDocument) -> Option<NodeId> {
    let root = doc.root();
    if doc.kind(root) == ElementKind::ScoreDef {
        return Some(root);
    }
    doc.descendants_of_kind(root, ElementKind::ScoreDef).next()
}

fn top_level_sections(doc: &MeiDocument) -> Vec<NodeId> {
    let root = doc.root();
    if doc.kind(root) == ElementKind::Section {
        return vec![root];
    }
    doc.descendants_of_kind(root, ElementKind::Section)
        .filter(|&section| {
            let mut current = doc.parent(section);
            while let Some(p) = current {
                if doc.kind(p) == ElementKind::Section {
                    return false;
                }
                current = doc.parent(p);
            }
            true
        })
        .collect()
}
