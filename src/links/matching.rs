//! Tie/slur pairing from note markers
//!
//! Per link:
//!
//! ```text
//!   initiate          terminate (key match)
//! ───────────► Open ───────────────────────► Closed
//!
//!   terminate (no open link matches)
//! ───────────────────────────────────────► OrphanClose
//! ```
//!
//! Open links are kept per kind in creation order; a terminate marker closes
//! the first open link whose matching key equals its own. Ties match on
//! pitch, octave and system; slurs on nesting level and system. The state
//! lives for the whole scan, so links span measures but never systems.

use super::store::{LinkHandle, LinkStore};
use crate::models::{EventLink, LinkKind, LinkParams, SlurKey, TieKey};
use crate::parse::{Marker, SlurToken};

#[derive(Debug, Clone, Default)]
pub struct TieSlurAutomaton {
    open_ties: Vec<LinkHandle>,
    open_slurs: Vec<LinkHandle>,
}

impl TieSlurAutomaton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ties still waiting for their terminal note, oldest first
    pub fn open_ties(&self) -> &[LinkHandle] {
        &self.open_ties
    }

    /// Slurs still waiting for their terminal note, oldest first
    pub fn open_slurs(&self) -> &[LinkHandle] {
        &self.open_slurs
    }

    pub fn initiate_tie(&mut self, store: &mut LinkStore, first_id: &str, key: TieKey) -> LinkHandle {
        let handle = open_link(store, LinkKind::Tie, first_id, LinkParams::Tie(key));
        self.open_ties.push(handle);
        handle
    }

    pub fn terminate_tie(&mut self, store: &mut LinkStore, last_id: &str, key: &TieKey) -> LinkHandle {
        close_first_match(&mut self.open_ties, store, LinkKind::Tie, last_id, |params| {
            matches!(params, LinkParams::Tie(open) if open == key)
        })
    }

    pub fn initiate_slur(&mut self, store: &mut LinkStore, first_id: &str, key: SlurKey) -> LinkHandle {
        let handle = open_link(store, LinkKind::Slur, first_id, LinkParams::Slur(key));
        self.open_slurs.push(handle);
        handle
    }

    pub fn terminate_slur(&mut self, store: &mut LinkStore, last_id: &str, key: &SlurKey) -> LinkHandle {
        close_first_match(&mut self.open_slurs, store, LinkKind::Slur, last_id, |params| {
            matches!(params, LinkParams::Slur(open) if open == key)
        })
    }

    /// Apply the expanded `@tie` markers of one note
    pub fn apply_tie_markers(&mut self, store: &mut LinkStore, note_id: &str, markers: &[Marker], key: &TieKey) {
        for marker in markers {
            match marker {
                Marker::Initiate => {
                    self.initiate_tie(store, note_id, key.clone());
                }
                Marker::Terminate => {
                    self.terminate_tie(store, note_id, key);
                }
                Marker::Medial => {
                    self.terminate_tie(store, note_id, key);
                    self.initiate_tie(store, note_id, key.clone());
                }
            }
        }
    }

    /// Apply the parsed `@slur` tokens of one note in `system`
    pub fn apply_slur_tokens(&mut self, store: &mut LinkStore, note_id: &str, tokens: &[SlurToken], system: u32) {
        for token in tokens {
            let key = SlurKey {
                nesting_level: token.nesting_level,
                system,
            };
            match token.marker {
                Marker::Initiate => {
                    self.initiate_slur(store, note_id, key);
                }
                Marker::Terminate => {
                    self.terminate_slur(store, note_id, &key);
                }
                // the slur simply passes through this note
                Marker::Medial => {}
            }
        }
    }
}

fn open_link(store: &mut LinkStore, kind: LinkKind, first_id: &str, params: LinkParams) -> LinkHandle {
    let mut link = EventLink::new(kind).with_params(params);
    link.first.set_id(first_id);
    store.push(link)
}

fn close_first_match(
    open: &mut Vec<LinkHandle>,
    store: &mut LinkStore,
    kind: LinkKind,
    last_id: &str,
    key_matches: impl Fn(&LinkParams) -> bool,
) -> LinkHandle {
    let position = open.iter().position(|&h| {
        let link = store.get(h);
        !link.last.is_set() && key_matches(&link.params)
    });

    match position {
        Some(index) => {
            let handle = open.remove(index);
            store.get_mut(handle).last.set_id(last_id);
            handle
        }
        None => {
            log::warn!("{} terminating at xml:id=\"{}\" has no matching start", kind, last_id);
            let mut orphan = EventLink::new(kind);
            orphan.last.set_id(last_id);
            store.push(orphan)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LinkState;
    use crate::parse::{parse_slur_attribute, parse_tie_attribute};

    fn tie_key(pname: &str, oct: &str, system: u32) -> TieKey {
        TieKey {
            pname: pname.to_string(),
            oct: oct.to_string(),
            system,
        }
    }

    #[test]
    fn test_tie_matches_on_pitch() {
        let mut store = LinkStore::new();
        let mut automaton = TieSlurAutomaton::new();

        let a = automaton.initiate_tie(&mut store, "A", tie_key("c", "4", 1));
        let b = automaton.initiate_tie(&mut store, "B", tie_key("d", "4", 1));
        let c = automaton.terminate_tie(&mut store, "C", &tie_key("c", "4", 1));

        assert_eq!(a, c);
        assert_eq!(store.get(a).last_id(), Some("C"));
        assert_eq!(store.get(b).state(), LinkState::Open);
        assert_eq!(automaton.open_ties(), &[b]);
    }

    #[test]
    fn test_tie_does_not_cross_systems() {
        let mut store = LinkStore::new();
        let mut automaton = TieSlurAutomaton::new();

        let open = automaton.initiate_tie(&mut store, "A", tie_key("g", "4", 1));
        let orphan = automaton.terminate_tie(&mut store, "B", &tie_key("g", "4", 2));

        assert_ne!(open, orphan);
        assert_eq!(store.get(open).state(), LinkState::Open);
        assert_eq!(store.get(orphan).state(), LinkState::OrphanClose);
    }

    #[test]
    fn test_first_created_open_tie_wins() {
        let mut store = LinkStore::new();
        let mut automaton = TieSlurAutomaton::new();

        let first = automaton.initiate_tie(&mut store, "A", tie_key("e", "5", 1));
        let second = automaton.initiate_tie(&mut store, "B", tie_key("e", "5", 1));
        automaton.terminate_tie(&mut store, "C", &tie_key("e", "5", 1));

        assert_eq!(store.get(first).last_id(), Some("C"));
        assert_eq!(store.get(second).last_id(), None);
    }

    #[test]
    fn test_medial_tie_chains_notes() {
        let mut store = LinkStore::new();
        let mut automaton = TieSlurAutomaton::new();
        let key = tie_key("f", "3", 1);

        automaton.apply_tie_markers(&mut store, "n1", &parse_tie_attribute("i"), &key);
        automaton.apply_tie_markers(&mut store, "n2", &parse_tie_attribute("m"), &key);
        automaton.apply_tie_markers(&mut store, "n3", &parse_tie_attribute("t"), &key);

        let pairs: Vec<(Option<&str>, Option<&str>)> = store
            .of_kind(LinkKind::Tie)
            .map(|l| (l.first_id(), l.last_id()))
            .collect();
        assert_eq!(pairs, vec![(Some("n1"), Some("n2")), (Some("n2"), Some("n3"))]);
        assert!(automaton.open_ties().is_empty());
    }

    #[test]
    fn test_slurs_match_on_nesting_level() {
        let mut store = LinkStore::new();
        let mut automaton = TieSlurAutomaton::new();

        automaton.apply_slur_tokens(&mut store, "a", &parse_slur_attribute("i1").unwrap(), 1);
        automaton.apply_slur_tokens(&mut store, "b", &parse_slur_attribute("i2").unwrap(), 1);
        automaton.apply_slur_tokens(&mut store, "c", &parse_slur_attribute("t2").unwrap(), 1);
        automaton.apply_slur_tokens(&mut store, "d", &parse_slur_attribute("t1").unwrap(), 1);

        let pairs: Vec<(Option<&str>, Option<&str>)> = store
            .of_kind(LinkKind::Slur)
            .map(|l| (l.first_id(), l.last_id()))
            .collect();
        assert_eq!(pairs, vec![(Some("a"), Some("d")), (Some("b"), Some("c"))]);
    }

    #[test]
    fn test_orphan_slur_close() {
        let mut store = LinkStore::new();
        let mut automaton = TieSlurAutomaton::new();
        let handle = automaton.terminate_slur(&mut store, "z", &SlurKey { nesting_level: 0, system: 1 });
        assert_eq!(store.get(handle).state(), LinkState::OrphanClose);
    }
}
