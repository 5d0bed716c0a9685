//! XML text -> [`MeiDocument`]
//!
//! roxmltree gives a zero-copy, read-only view; the scanner needs to write
//! identities back, so the view is copied once into the owned arena.

use roxmltree::{Document, Node, ParsingOptions};

use crate::errors::MeiResult;
use crate::models::{MeiDocument, NodeId, XML_ID};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Parse MEI XML text into an owned document
///
/// # Example
///
/// ```
/// use mei_scan::parse::parse_mei;
///
/// let doc = parse_mei(r#"<layer><note xml:id="n1" dur="4"/></layer>"#).unwrap();
/// assert!(doc.find_by_identity("n1").is_some());
/// ```
pub fn parse_mei(xml: &str) -> MeiResult<MeiDocument> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let xml_doc = Document::parse_with_options(xml, options)?;
    let root = xml_doc.root_element();

    let mut doc = MeiDocument::new(root.tag_name().name());
    let doc_root = doc.root();
    copy_content(&mut doc, doc_root, root)?;
    log::debug!("parsed MEI document with {} elements", doc.len());
    Ok(doc)
}

/// Copy attributes, text and element children of `source` into `target`
fn copy_content(doc: &mut MeiDocument, target: NodeId, source: Node) -> MeiResult<()> {
    doc.set_namespaces(target, declared_namespaces(source));
    for attribute in source.attributes() {
        let name = qualified_name(source, attribute.namespace(), attribute.name());
        doc.set_attribute(target, &name, attribute.value())?;
    }

    let mut text = String::new();
    for child in source.children() {
        if child.is_element() {
            let id = doc.append_child(target, child.tag_name().name(), &[])?;
            copy_content(doc, id, child)?;
        } else if child.is_text() {
            if let Some(t) = child.text() {
                text.push_str(t);
            }
        }
    }
    doc.set_text(target, &text);
    Ok(())
}

/// Namespaces declared on `node` itself; roxmltree reports every namespace
/// in scope, so the parent's are subtracted
fn declared_namespaces(node: Node) -> Vec<(Option<String>, String)> {
    let inherited: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|parent| parent.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();
    node.namespaces()
        .filter(|ns| ns.name() != Some("xml"))
        .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
        .map(|ns| (ns.name().map(str::to_string), ns.uri().to_string()))
        .collect()
}

fn qualified_name(node: Node, namespace: Option<&str>, local: &str) -> String {
    match namespace {
        Some(XML_NAMESPACE) if local == "id" => XML_ID.to_string(),
        Some(XML_NAMESPACE) => format!("xml:{}", local),
        Some(uri) => match node.lookup_prefix(uri) {
            Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, local),
            _ => local.to_string(),
        },
        None => local.to_string(),
    }
}
