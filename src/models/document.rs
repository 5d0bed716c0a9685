//! Owned, mutable MEI document tree
//!
//! The scanner needs to read the tree in document order *and* write generated
//! `xml:id`s back into it, so the tree is an arena of elements addressed by
//! copyable [`NodeId`]s rather than a borrowed DOM.
//!
//! ```text
//! MeiDocument
//! ├── nodes: Vec<MeiElement>      (arena, NodeId = index)
//! └── identities: xml:id → NodeId (kept in sync with every write)
//! ```

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use super::elements::ElementKind;
use crate::errors::{MeiError, MeiResult};

/// Qualified name of the identity attribute
pub const XML_ID: &str = "xml:id";

/// Handle to an element of one [`MeiDocument`].
///
/// Handles are only minted by the document that owns the element; using a
/// handle from another document is a logic error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

/// A single element of the tree
#[derive(Debug, Clone)]
pub struct MeiElement {
    /// Local tag name (e.g. "note", "mRest")
    pub tag: String,
    /// Classification of `tag`
    pub kind: ElementKind,
    /// Trimmed direct text content, if any
    pub text: Option<String>,
    /// Namespace declarations made on this element, for write-back
    namespaces: Vec<(Option<String>, String)>,
    attributes: Vec<(String, String)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl MeiElement {
    fn new(tag: &str, parent: Option<NodeId>) -> Self {
        MeiElement {
            tag: tag.to_string(),
            kind: ElementKind::from_tag(tag),
            text: None,
            namespaces: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
            parent,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn namespaces(&self) -> &[(Option<String>, String)] {
        &self.namespaces
    }
}

/// MEI document: element arena plus identity index
#[derive(Debug, Clone)]
pub struct MeiDocument {
    nodes: Vec<MeiElement>,
    identities: HashMap<String, NodeId>,
    id_prefix: String,
}

impl MeiDocument {
    /// Create a document holding only a root element
    pub fn new(root_tag: &str) -> Self {
        MeiDocument {
            nodes: vec![MeiElement::new(root_tag, None)],
            identities: HashMap::new(),
            id_prefix: "e".to_string(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Whether `id` addresses an element of this document
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn element(&self, id: NodeId) -> &MeiElement {
        &self.nodes[id.0]
    }

    pub fn tag(&self, id: NodeId) -> &str {
        &self.nodes[id.0].tag
    }

    pub fn kind(&self, id: NodeId) -> ElementKind {
        self.nodes[id.0].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0].attr(name)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].text.as_deref()
    }

    /// Text of `id` and all its descendants in document order, pieces
    /// separated by a space
    pub fn text_content(&self, id: NodeId) -> String {
        std::iter::once(id)
            .chain(self.descendants(id))
            .filter_map(|node| self.text(node))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Append a child element. An `xml:id` among `attributes` is indexed and
    /// must be unique.
    pub fn append_child(
        &mut self,
        parent: NodeId,
        tag: &str,
        attributes: &[(&str, &str)],
    ) -> MeiResult<NodeId> {
        if !self.contains(parent) {
            return Err(MeiError::InvalidArgument(format!(
                "parent node {:?} does not belong to this document",
                parent
            )));
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(MeiElement::new(tag, Some(parent)));
        self.nodes[parent.0].children.push(id);
        for (name, value) in attributes {
            self.set_attribute(id, name, value)?;
        }
        Ok(id)
    }

    /// Set (or replace) an attribute. Writing `xml:id` keeps the identity
    /// index in sync and rejects identities already used by another element.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> MeiResult<()> {
        if name == XML_ID {
            if let Some(&owner) = self.identities.get(value) {
                if owner != id {
                    return Err(MeiError::InvalidArgument(format!(
                        "duplicate xml:id \"{}\"",
                        value
                    )));
                }
            }
            if let Some(old) = self.nodes[id.0].attr(XML_ID).map(str::to_string) {
                self.identities.remove(&old);
            }
            self.identities.insert(value.to_string(), id);
        }

        let attributes = &mut self.nodes[id.0].attributes;
        match attributes.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) {
        let trimmed = text.trim();
        self.nodes[id.0].text = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }

    // ========================================================================
    // Identity (two-phase: read, then assign)
    // ========================================================================

    /// Read the identity of an element, if it has one yet
    pub fn identity(&self, id: NodeId) -> Option<&str> {
        self.attr(id, XML_ID)
    }

    /// Return the element's identity, generating and writing a fresh one into
    /// the document if it has none. Never changes an existing identity.
    pub fn assign_identity(&mut self, id: NodeId) -> String {
        if let Some(existing) = self.identity(id) {
            return existing.to_string();
        }

        let fresh = loop {
            let candidate = format!(
                "{}{}",
                self.id_prefix,
                &Uuid::new_v4().simple().to_string()[..8]
            );
            if !self.identities.contains_key(&candidate) {
                break candidate;
            }
        };

        log::debug!("assigned xml:id=\"{}\" to <{}>", fresh, self.tag(id));
        self.identities.insert(fresh.clone(), id);
        self.nodes[id.0]
            .attributes
            .push((XML_ID.to_string(), fresh.clone()));
        fresh
    }

    /// Prefix used by [`assign_identity`](Self::assign_identity)
    pub fn set_id_prefix(&mut self, prefix: &str) {
        self.id_prefix = prefix.to_string();
    }

    pub fn find_by_identity(&self, identity: &str) -> Option<NodeId> {
        self.identities.get(identity).copied()
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Pre-order walk over all descendants of `id` (excluding `id`)
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    /// Direct children of a given kind, in document order
    pub fn children_of_kind(
        &self,
        id: NodeId,
        kind: ElementKind,
    ) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&c| self.kind(c) == kind)
    }

    /// Descendants of a given kind, in document order
    pub fn descendants_of_kind(
        &self,
        id: NodeId,
        kind: ElementKind,
    ) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(id).filter(move |&c| self.kind(c) == kind)
    }

    /// Whether `ancestor` contains `id` (strictly)
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// Short description for error messages: `<note xml:id="n1">` or `<note>`
    pub fn describe(&self, id: NodeId) -> String {
        match self.identity(id) {
            Some(xml_id) => format!("<{} xml:id=\"{}\">", self.tag(id), xml_id),
            None => format!("<{}>", self.tag(id)),
        }
    }

    /// Namespace declarations made on `id` itself (not inherited ones)
    pub fn namespaces(&self, id: NodeId) -> &[(Option<String>, String)] {
        &self.nodes[id.0].namespaces
    }

    pub fn set_namespaces(&mut self, id: NodeId, namespaces: Vec<(Option<String>, String)>) {
        self.nodes[id.0].namespaces = namespaces;
    }
}

/// Iterator returned by [`MeiDocument::descendants`]
pub struct Descendants<'a> {
    doc: &'a MeiDocument,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let next = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(next).iter().rev().copied());
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_layer() -> (MeiDocument, NodeId) {
        let mut doc = MeiDocument::new("layer");
        let root = doc.root();
        doc.append_child(root, "note", &[("xml:id", "n1"), ("dur", "4")])
            .unwrap();
        let beam = doc.append_child(root, "beam", &[]).unwrap();
        doc.append_child(beam, "note", &[("dur", "8")]).unwrap();
        (doc, beam)
    }

    #[test]
    fn test_text_content_includes_descendants() {
        let mut doc = MeiDocument::new("dir");
        let root = doc.root();
        doc.set_text(root, " molto ");
        let rend = doc.append_child(root, "rend", &[]).unwrap();
        doc.set_text(rend, "dolce");
        doc.append_child(rend, "lb", &[]).unwrap();

        assert_eq!(doc.text(root), Some("molto"));
        assert_eq!(doc.text_content(root), "molto dolce");
        assert_eq!(doc.text_content(rend), "dolce");
    }

    #[test]
    fn test_descendants_preorder() {
        let (doc, _) = small_layer();
        let tags: Vec<&str> = doc.descendants(doc.root()).map(|n| doc.tag(n)).collect();
        assert_eq!(tags, vec!["note", "beam", "note"]);
    }

    #[test]
    fn test_assign_identity_is_idempotent() {
        let (mut doc, beam) = small_layer();
        let inner = doc.children(beam)[0];
        assert_eq!(doc.identity(inner), None);

        let first = doc.assign_identity(inner);
        let second = doc.assign_identity(inner);
        assert_eq!(first, second);
        assert!(first.starts_with('e'));
        assert_eq!(doc.find_by_identity(&first), Some(inner));
    }

    #[test]
    fn test_existing_identity_is_kept() {
        let (mut doc, _) = small_layer();
        let n1 = doc.find_by_identity("n1").unwrap();
        assert_eq!(doc.assign_identity(n1), "n1");
    }

    #[test]
    fn test_duplicate_identity_rejected() {
        let (mut doc, beam) = small_layer();
        let err = doc
            .append_child(beam, "rest", &[("xml:id", "n1")])
            .unwrap_err();
        assert!(matches!(err, MeiError::InvalidArgument(_)));
    }

    #[test]
    fn test_rewriting_identity_updates_index() {
        let (mut doc, _) = small_layer();
        let n1 = doc.find_by_identity("n1").unwrap();
        doc.set_attribute(n1, XML_ID, "renamed").unwrap();
        assert_eq!(doc.find_by_identity("n1"), None);
        assert_eq!(doc.find_by_identity("renamed"), Some(n1));
    }
}
