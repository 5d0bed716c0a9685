//! Forward references to measures not visited yet
//!
//! A `@tstamp2` of `"2m+3"` points two measures ahead. The target layer does
//! not exist in the scan yet, so the link is parked in the [`PendingTable`]
//! under `(measure + 2, staff, layer)`. When the scan reaches that layer the
//! link gets the layer's context, resolves, and the entry is dropped.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::store::{LinkHandle, LinkStore};
use crate::errors::{MeiError, MeiResult};
use crate::models::{LayerContext, MeiDocument, TimeStamp};

/// Where a layer sits in the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LocationKey {
    pub measure: u32,
    pub staff: u32,
    pub layer: u32,
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.measure, self.staff, self.layer)
    }
}

/// Links waiting for a location to be visited
#[derive(Debug, Clone, Default)]
pub struct PendingTable {
    entries: BTreeMap<LocationKey, Vec<LinkHandle>>,
}

impl PendingTable {
    pub fn defer(&mut self, key: LocationKey, handle: LinkHandle) {
        self.entries.entry(key).or_default().push(handle);
    }

    /// Remove and return every link waiting for `key`
    pub fn take(&mut self, key: LocationKey) -> Vec<LinkHandle> {
        self.entries.remove(&key).unwrap_or_default()
    }

    pub fn waiting(&self, key: LocationKey) -> &[LinkHandle] {
        self.entries.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of locations with waiting links
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LocationKey, LinkHandle)> + '_ {
        self.entries
            .iter()
            .flat_map(|(key, handles)| handles.iter().map(move |h| (*key, *h)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ForwardResolver {
    pending: PendingTable,
}

impl ForwardResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &PendingTable {
        &self.pending
    }

    /// Set the terminal endpoint of `handle` from a compound timestamp read at
    /// location `here`. Same-measure timestamps resolve at once against the
    /// context `local` produces; later measures are deferred.
    pub fn set_end(
        &mut self,
        doc: &mut MeiDocument,
        store: &mut LinkStore,
        handle: LinkHandle,
        tstamp: TimeStamp,
        here: LocationKey,
        local: impl FnOnce(&MeiDocument) -> MeiResult<LayerContext>,
    ) -> MeiResult<()> {
        let ahead = tstamp.measures_ahead();
        if ahead == 0 {
            let context = local(&*doc)?;
            let last = &mut store.get_mut(handle).last;
            last.set_tstamp(tstamp.beats());
            last.bind_context(context);
            last.resolve(doc)?;
            return Ok(());
        }

        let measure = here.measure.checked_add(ahead).ok_or_else(|| {
            MeiError::InvalidArgument(format!("@tstamp2=\"{}\" points past the last measure number", tstamp))
        })?;
        let key = LocationKey { measure, ..here };
        store.get_mut(handle).last.set_tstamp(tstamp.beats());
        log::debug!("deferring {} end to {} ({})", store.get(handle).kind, key, tstamp);
        self.pending.defer(key, handle);
        Ok(())
    }

    /// The scan reached the layer at `key`: bind every waiting link to its
    /// context and resolve it. Returns how many links were waiting.
    pub fn visit(
        &mut self,
        doc: &mut MeiDocument,
        store: &mut LinkStore,
        key: LocationKey,
        context: LayerContext,
    ) -> MeiResult<usize> {
        let waiting = self.pending.take(key);
        for &handle in &waiting {
            let last = &mut store.get_mut(handle).last;
            last.bind_context(context);
            last.resolve(doc)?;
        }
        if !waiting.is_empty() {
            log::debug!("resolved {} forward reference(s) at {}", waiting.len(), key);
        }
        Ok(waiting.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventLink, LinkKind, Meter};
    use crate::parse::parse_mei;

    fn key(measure: u32) -> LocationKey {
        LocationKey { measure, staff: 1, layer: 1 }
    }

    #[test]
    fn test_same_measure_resolves_immediately() {
        let mut doc = parse_mei(r#"<layer><note xml:id="a" dur="2"/><note xml:id="b" dur="2"/></layer>"#).unwrap();
        let layer = doc.root();
        let mut store = LinkStore::new();
        let mut resolver = ForwardResolver::new();
        let handle = store.push(EventLink::new(LinkKind::Hairpin));

        let meter = Meter::new(4, 4).unwrap();
        resolver
            .set_end(&mut doc, &mut store, handle, "0m+3".parse().unwrap(), key(1), |_| {
                Ok(LayerContext { layer, meter })
            })
            .unwrap();

        assert_eq!(store.get(handle).last_id(), Some("b"));
        assert!(resolver.pending().is_empty());
    }

    #[test]
    fn test_future_measure_waits_for_visit() {
        let mut doc = parse_mei(r#"<layer><note xml:id="a" dur="2"/><note xml:id="b" dur="2"/></layer>"#).unwrap();
        let layer = doc.root();
        let meter = Meter::new(4, 4).unwrap();
        let mut store = LinkStore::new();
        let mut resolver = ForwardResolver::new();
        let handle = store.push(EventLink::new(LinkKind::Slur));

        resolver
            .set_end(&mut doc, &mut store, handle, "2m+1".parse().unwrap(), key(4), |_| {
                panic!("no local lookup for forward references")
            })
            .unwrap();
        assert_eq!(resolver.pending().waiting(key(6)), &[handle]);
        assert_eq!(store.get(handle).last_id(), None);

        // visiting another location leaves it waiting
        let ctx = LayerContext { layer, meter };
        assert_eq!(resolver.visit(&mut doc, &mut store, key(5), ctx).unwrap(), 0);
        assert_eq!(resolver.pending().len(), 1);

        assert_eq!(resolver.visit(&mut doc, &mut store, key(6), ctx).unwrap(), 1);
        assert!(resolver.pending().is_empty());
        assert_eq!(store.get(handle).last_id(), Some("a"));
    }
}
