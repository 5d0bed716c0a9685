//! Stave connectors from `<staffGrp @symbol>`

use serde::Serialize;

use crate::errors::{MeiError, MeiResult};
use crate::models::{ElementKind, MeiDocument, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorSymbol {
    Line,
    Brace,
    Bracket,
    None,
}

impl ConnectorSymbol {
    /// Absent or unknown symbols draw a plain line
    pub fn from_attr(symbol: Option<&str>) -> Self {
        match symbol {
            Some("brace") => ConnectorSymbol::Brace,
            Some("bracket") => ConnectorSymbol::Bracket,
            Some("none") => ConnectorSymbol::None,
            Some("line") | None => ConnectorSymbol::Line,
            Some(other) => {
                log::warn!("unknown staffGrp @symbol=\"{}\", drawing a line", other);
                ConnectorSymbol::Line
            }
        }
    }
}

/// Connector spanning `top_staff..=bottom_staff`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StaveConnector {
    pub symbol: ConnectorSymbol,
    pub top_staff: u32,
    pub bottom_staff: u32,
}

/// Connector for one `<staffGrp>`, spanning the first and last `<staffDef>`
/// inside it (nested groups included). A group without staves yields none.
pub fn stave_connector(doc: &MeiDocument, group: NodeId) -> MeiResult<Option<StaveConnector>> {
    let mut numbers = Vec::new();
    for def in doc.descendants_of_kind(group, ElementKind::StaffDef) {
        let n = doc
            .attr(def, "n")
            .ok_or_else(|| MeiError::missing_attribute("staffDef", "n", doc.describe(def)))?;
        let n = n
            .trim()
            .parse::<u32>()
            .map_err(|_| MeiError::InvalidArgument(format!("<staffDef> @n \"{}\" is not a number", n)))?;
        numbers.push(n);
    }

    let (Some(&top_staff), Some(&bottom_staff)) = (numbers.first(), numbers.last()) else {
        return Ok(None);
    };
    Ok(Some(StaveConnector {
        symbol: ConnectorSymbol::from_attr(doc.attr(group, "symbol")),
        top_staff,
        bottom_staff,
    }))
}
