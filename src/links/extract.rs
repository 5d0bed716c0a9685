//! `<tie>`, `<slur>` and `<hairpin>` elements of one measure
//!
//! Endpoints come either from identity references (`@startid`, `@endid`) or
//! from timestamps (`@tstamp`, `@tstamp2`) read in the link's `@staff` and
//! `@layer`. Start timestamps are always local to the measure; end
//! timestamps may point into a later measure and are handed to the
//! [`ForwardResolver`].

use std::collections::BTreeMap;

use super::forward::{ForwardResolver, LocationKey};
use super::store::{LinkHandle, LinkStore};
use crate::errors::{MeiError, MeiResult};
use crate::models::{
    ElementKind, EventLink, HairpinForm, LayerContext, LinkKind, LinkParams, MeiDocument, Meter,
    NodeId, Placement, TimeStamp,
};
use crate::settings::ScanSettings;

/// One measure as seen by the link extractor
pub struct LinkExtractor<'a> {
    pub measure: NodeId,
    pub measure_n: u32,
    pub settings: &'a ScanSettings,
    /// Meter currently in force, per staff number
    pub meters: &'a BTreeMap<u32, Meter>,
}

impl<'a> LinkExtractor<'a> {
    /// Turn every link element inside the measure into an [`EventLink`], in
    /// document order. Returns the handles of the new links.
    pub fn extract(
        &self,
        doc: &mut MeiDocument,
        store: &mut LinkStore,
        resolver: &mut ForwardResolver,
    ) -> MeiResult<Vec<LinkHandle>> {
        let elements: Vec<(NodeId, LinkKind)> = doc
            .descendants(self.measure)
            .filter_map(|node| match doc.kind(node) {
                ElementKind::Tie => Some((node, LinkKind::Tie)),
                ElementKind::Slur => Some((node, LinkKind::Slur)),
                ElementKind::Hairpin => Some((node, LinkKind::Hairpin)),
                _ => None,
            })
            .collect();

        let mut handles = Vec::with_capacity(elements.len());
        for (node, kind) in elements {
            handles.push(self.extract_one(doc, store, resolver, node, kind)?);
        }
        if !handles.is_empty() {
            log::debug!("measure {}: {} link element(s)", self.measure_n, handles.len());
        }
        Ok(handles)
    }

    fn extract_one(
        &self,
        doc: &mut MeiDocument,
        store: &mut LinkStore,
        resolver: &mut ForwardResolver,
        node: NodeId,
        kind: LinkKind,
    ) -> MeiResult<LinkHandle> {
        let params = match kind {
            LinkKind::Hairpin => hairpin_params(doc, node)?,
            LinkKind::Tie | LinkKind::Slur => LinkParams::None,
        };
        let staff_n = self.number_attr(doc, node, "staff", self.settings.default_staff_n)?;
        let layer_n = self.number_attr(doc, node, "layer", self.settings.default_layer_n)?;
        let here = LocationKey {
            measure: self.measure_n,
            staff: staff_n,
            layer: layer_n,
        };

        let handle = store.push(EventLink::new(kind).with_params(params));

        if let Some(start) = doc.attr(node, "startid") {
            let start = self.reference(start);
            store.get_mut(handle).first.set_id(start);
        } else if let Some(tstamp) = doc.attr(node, "tstamp") {
            let beats = match tstamp.parse::<TimeStamp>()? {
                TimeStamp::Local(beats) => beats,
                compound => {
                    return Err(MeiError::InvalidArgument(format!(
                        "{} @tstamp=\"{}\" must be local to the measure",
                        doc.describe(node),
                        compound
                    )))
                }
            };
            let context = self.local_context(doc, staff_n, layer_n)?;
            let first = &mut store.get_mut(handle).first;
            first.set_tstamp(beats);
            first.bind_context(context);
            first.resolve(doc)?;
        }

        if let Some(end) = doc.attr(node, "endid") {
            let end = self.reference(end);
            store.get_mut(handle).last.set_id(end);
        } else if let Some(tstamp2) = doc.attr(node, "tstamp2") {
            let tstamp: TimeStamp = tstamp2.parse()?;
            resolver.set_end(doc, store, handle, tstamp, here, |doc| {
                self.local_context(doc, staff_n, layer_n)
            })?;
        }

        Ok(handle)
    }

    fn reference(&self, value: &str) -> String {
        let value = value.trim();
        if self.settings.strip_reference_hash {
            value.strip_prefix('#').unwrap_or(value).to_string()
        } else {
            value.to_string()
        }
    }

    /// `@staff`/`@layer` may list several numbers; the first one is used
    fn number_attr(&self, doc: &MeiDocument, node: NodeId, name: &str, default: u32) -> MeiResult<u32> {
        let Some(value) = doc.attr(node, name) else {
            return Ok(default);
        };
        let first = value.split_whitespace().next().unwrap_or_default();
        first.parse::<u32>().map_err(|_| {
            MeiError::InvalidArgument(format!("{} @{}=\"{}\" is not a number", doc.describe(node), name, value))
        })
    }

    /// Layer `layer_n` of staff `staff_n` in this measure, with the staff's
    /// meter. A staff whose first layer carries no @n uses that layer.
    pub fn local_context(&self, doc: &MeiDocument, staff_n: u32, layer_n: u32) -> MeiResult<LayerContext> {
        let staff = doc
            .children_of_kind(self.measure, ElementKind::Staff)
            .find(|&s| numbered(doc, s, self.settings.default_staff_n) == Some(staff_n))
            .ok_or_else(|| {
                MeiError::InvalidArgument(format!("measure {} has no <staff n=\"{}\">", self.measure_n, staff_n))
            })?;

        let mut layers = doc.children_of_kind(staff, ElementKind::Layer);
        let first = layers.next();
        let layer = match first {
            Some(l) if doc.attr(l, "n").is_none() => Some(l),
            Some(l) if numbered(doc, l, self.settings.default_layer_n) == Some(layer_n) => Some(l),
            Some(_) => layers.find(|&l| numbered(doc, l, self.settings.default_layer_n) == Some(layer_n)),
            None => None,
        }
        .ok_or_else(|| {
            MeiError::InvalidArgument(format!(
                "measure {} staff {} has no <layer n=\"{}\">",
                self.measure_n, staff_n, layer_n
            ))
        })?;

        let meter = self.meters.get(&staff_n).copied().ok_or_else(|| {
            MeiError::MissingMeter(format!("staff {} in measure {}", staff_n, self.measure_n))
        })?;
        Ok(LayerContext { layer, meter })
    }
}

fn numbered(doc: &MeiDocument, node: NodeId, default: u32) -> Option<u32> {
    match doc.attr(node, "n") {
        Some(n) => n.trim().parse().ok(),
        None => Some(default),
    }
}

fn hairpin_params(doc: &MeiDocument, node: NodeId) -> MeiResult<LinkParams> {
    let form = doc
        .attr(node, "form")
        .ok_or_else(|| MeiError::missing_attribute("hairpin", "form", doc.describe(node)))?;
    let place = doc.attr(node, "place").map(Placement::parse).transpose()?;
    Ok(LinkParams::Hairpin {
        form: HairpinForm::parse(form)?,
        place,
    })
}
