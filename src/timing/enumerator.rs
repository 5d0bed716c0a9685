//! Event enumeration over a layer or beam
//!
//! Yields leaf events (note, rest, mRest, chord) in document order. Beams are
//! spliced out: their children appear in place, recursively. Anything else
//! (clefs, spaces, annotations) is skipped. The sequence is lazy and cannot be
//! restarted.

use crate::errors::{MeiError, MeiResult};
use crate::models::{ElementKind, MeiDocument, NodeId};

pub struct EventEnumerator<'a> {
    doc: &'a MeiDocument,
    /// (container, index of next child) per open layer/beam level
    stack: Vec<(NodeId, usize)>,
    /// Read-ahead slot: next event to hand out
    next_event: Option<NodeId>,
}

impl<'a> EventEnumerator<'a> {
    /// Start enumerating the children of `node`
    pub fn new(doc: &'a MeiDocument, node: NodeId) -> MeiResult<Self> {
        if !doc.contains(node) {
            return Err(MeiError::InvalidArgument(format!(
                "cannot enumerate events of {:?}: node is not part of the document",
                node
            )));
        }
        let mut enumerator = EventEnumerator {
            doc,
            stack: vec![(node, 0)],
            next_event: None,
        };
        enumerator.read_ahead();
        Ok(enumerator)
    }

    /// No more events to hand out
    pub fn is_exhausted(&self) -> bool {
        self.next_event.is_none()
    }

    /// Hand out the next event, failing with `EndOfSequence` past the end
    pub fn next_event(&mut self) -> MeiResult<NodeId> {
        let event = self.next_event.ok_or(MeiError::EndOfSequence)?;
        self.read_ahead();
        Ok(event)
    }

    fn read_ahead(&mut self) {
        self.next_event = None;
        while let Some((container, index)) = self.stack.last_mut() {
            let children = self.doc.children(*container);
            if *index >= children.len() {
                self.stack.pop();
                continue;
            }
            let child = children[*index];
            *index += 1;

            let kind = self.doc.kind(child);
            if kind.is_event() {
                self.next_event = Some(child);
                return;
            }
            if kind == ElementKind::Beam {
                self.stack.push((child, 0));
            }
        }
    }
}

impl<'a> Iterator for EventEnumerator<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        self.next_event().ok()
    }
}
