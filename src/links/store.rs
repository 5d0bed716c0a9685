//! Creation-ordered storage for event links
//!
//! Links are addressed by stable handles so the pending table and the open
//! tie/slur lists can point at a link while it is still being filled in.

use serde::Serialize;

use crate::models::{EventLink, LinkKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LinkHandle(usize);

#[derive(Debug, Clone, Default)]
pub struct LinkStore {
    links: Vec<EventLink>,
}

impl LinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, link: EventLink) -> LinkHandle {
        self.links.push(link);
        LinkHandle(self.links.len() - 1)
    }

    pub fn get(&self, handle: LinkHandle) -> &EventLink {
        &self.links[handle.0]
    }

    pub fn get_mut(&mut self, handle: LinkHandle) -> &mut EventLink {
        &mut self.links[handle.0]
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// All links in creation order
    pub fn iter(&self) -> impl Iterator<Item = (LinkHandle, &EventLink)> {
        self.links
            .iter()
            .enumerate()
            .map(|(i, link)| (LinkHandle(i), link))
    }

    /// Links of one kind in creation order
    pub fn of_kind(&self, kind: LinkKind) -> impl Iterator<Item = &EventLink> {
        self.links.iter().filter(move |link| link.kind == kind)
    }
}
