//! Document scan
//!
//! Walks a parsed score in document order, feeding the temporal model and
//! the link resolvers, and collects everything the rendering backend needs
//! into a [`ScanReport`].

mod layer;
pub mod report;
pub mod session;

pub use report::{
    Articulation, BeamGroup, Direction, EventKind, LinkDiagnostic, RenderEvent, ResolvedLink, ScanReport,
    StaffRender, UnresolvedReason,
};
pub use session::ScanSession;

use crate::errors::MeiResult;
use crate::models::MeiDocument;
use crate::parse::parse_mei;
use crate::settings::ScanSettings;

/// Scan an already parsed document with a fresh session
pub fn scan_document(doc: &mut MeiDocument, settings: &ScanSettings) -> MeiResult<ScanReport> {
    ScanSession::new(settings.clone()).run(doc)
}

/// Parse and scan MEI text. Returns the document (with generated
/// identities) next to the report.
///
/// # Examples
/// ```
/// use mei_scan::scan::scan_str;
/// use mei_scan::settings::ScanSettings;
///
/// let xml = r#"<mei><score>
///   <scoreDef><staffGrp><staffDef n="1" clef.shape="G" clef.line="2" meter.count="4" meter.unit="4"/></staffGrp></scoreDef>
///   <section><measure n="1"><staff n="1"><layer n="1">
///     <note pname="c" oct="4" dur="1"/>
///   </layer></staff></measure></section>
/// </score></mei>"#;
///
/// let (_doc, report) = scan_str(xml, &ScanSettings::default()).unwrap();
/// assert_eq!(report.events.len(), 1);
/// assert_eq!(report.events[0].duration, "w");
/// ```
pub fn scan_str(xml: &str, settings: &ScanSettings) -> MeiResult<(MeiDocument, ScanReport)> {
    let mut doc = parse_mei(xml)?;
    let report = scan_document(&mut doc, settings)?;
    Ok((doc, report))
}
