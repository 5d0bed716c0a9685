//! Write an [`MeiDocument`] back to XML text
//!
//! Used after a scan to hand the caller a document that carries every
//! identity the scan generated.

use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::errors::{MeiError, MeiResult};
use crate::models::{MeiDocument, NodeId};

pub fn write_mei(doc: &MeiDocument) -> MeiResult<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_element(&mut writer, doc, doc.root())?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| MeiError::Serialization(e.to_string()))
}

fn write_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    doc: &MeiDocument,
    node: NodeId,
) -> MeiResult<()> {
    let element = doc.element(node);
    let mut start = BytesStart::new(element.tag.as_str());

    for (prefix, uri) in element.namespaces() {
        let name = match prefix {
            Some(p) => format!("xmlns:{}", p),
            None => "xmlns".to_string(),
        };
        start.push_attribute((name.as_str(), uri.as_str()));
    }
    for (name, value) in element.attributes() {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    if element.children().is_empty() && element.text.is_none() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = &element.text {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for &child in element.children() {
        write_element(writer, doc, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.tag.as_str())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_mei;

    #[test]
    fn test_written_document_parses_back() {
        let source = r#"<mei xmlns="http://www.music-encoding.org/ns/mei"><layer><note xml:id="n1" dur="4"/><label>A &amp; B</label></layer></mei>"#;
        let mut doc = parse_mei(source).unwrap();
        let layer = doc.children(doc.root())[0];
        let label = doc.children(layer)[1];
        let generated = doc.assign_identity(label);

        let xml = write_mei(&doc).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"xmlns="http://www.music-encoding.org/ns/mei""#));

        let reparsed = parse_mei(&xml).unwrap();
        let found = reparsed.find_by_identity(&generated).unwrap();
        assert_eq!(reparsed.text(found), Some("A & B"));
        assert!(reparsed.find_by_identity("n1").is_some());
    }

    #[test]
    fn test_nested_namespace_declarations_survive() {
        let source = r#"<mei xmlns="http://www.music-encoding.org/ns/mei"><music><facsimile xmlns:xlink="http://www.w3.org/1999/xlink"><graphic xlink:href="page1.png"/></facsimile></music></mei>"#;
        let doc = parse_mei(source).unwrap();

        let xml = write_mei(&doc).unwrap();
        assert!(xml.contains(r#"<facsimile xmlns:xlink="http://www.w3.org/1999/xlink">"#));
        assert_eq!(xml.matches("xmlns=").count(), 1);

        let reparsed = parse_mei(&xml).unwrap();
        let graphic = reparsed.descendants(reparsed.root()).last().unwrap();
        assert_eq!(reparsed.attr(graphic, "xlink:href"), Some("page1.png"));
    }
}
