//! Ties and slurs from note markers and from link elements

use mei_scan::errors::MeiError;
use mei_scan::models::{LinkKind, LinkParams, SlurKey, TieKey};
use mei_scan::scan::{scan_str, ResolvedLink, ScanReport, UnresolvedReason};
use mei_scan::settings::ScanSettings;

/// One treble staff in 4/4; `body` is the content of the section
fn score(body: &str) -> String {
    format!(
        r#"<mei><music><body><mdiv><score>
             <scoreDef><staffGrp>
               <staffDef n="1" clef.shape="G" clef.line="2" meter.count="4" meter.unit="4"/>
             </staffGrp></scoreDef>
             <section>{}</section>
           </score></mdiv></body></music></mei>"#,
        body
    )
}

fn measure(n: u32, notes: &str) -> String {
    format!(r#"<measure n="{}"><staff n="1"><layer n="1">{}</layer></staff></measure>"#, n, notes)
}

fn scan(body: &str) -> ScanReport {
    scan_str(&score(body), &ScanSettings::default()).unwrap().1
}

fn ends(report_links: &[ResolvedLink]) -> Vec<(&str, &str)> {
    report_links.iter().map(|l| (l.first.as_str(), l.last.as_str())).collect()
}

#[test]
fn test_tie_matches_same_pitch_only() {
    let report = scan(&measure(
        1,
        r#"<note xml:id="a" pname="c" oct="4" dur="4" tie="i"/>
           <note xml:id="b" pname="d" oct="4" dur="4" tie="i"/>
           <note xml:id="c" pname="c" oct="4" dur="2" tie="t"/>"#,
    ));

    assert_eq!(ends(&report.ties), [("a", "c")]);
    assert_eq!(
        report.ties[0].params,
        LinkParams::Tie(TieKey {
            pname: "c".to_string(),
            oct: "4".to_string(),
            system: 1,
        })
    );

    assert_eq!(report.diagnostics.len(), 1);
    let open = &report.diagnostics[0];
    assert_eq!(open.kind, LinkKind::Tie);
    assert_eq!(open.reason, UnresolvedReason::OpenAtEnd);
    assert_eq!(open.first.as_deref(), Some("b"));
}

#[test]
fn test_tie_spans_barline_within_system() {
    let body = [
        measure(1, r#"<note xml:id="held" pname="g" oct="4" dur="1" tie="i"/>"#),
        measure(2, r#"<note xml:id="release" pname="g" oct="4" dur="1" tie="t"/>"#),
    ]
    .concat();
    let report = scan(&body);

    assert_eq!(ends(&report.ties), [("held", "release")]);
    assert!(report.is_fully_resolved());
}

#[test]
fn test_tie_does_not_cross_system_break() {
    let body = [
        measure(1, r#"<note xml:id="held" pname="g" oct="4" dur="1" tie="i"/>"#),
        "<sb/>".to_string(),
        measure(2, r#"<note xml:id="release" pname="g" oct="4" dur="1" tie="t"/>"#),
    ]
    .concat();
    let report = scan(&body);

    assert_eq!(report.systems, 2);
    assert!(report.ties.is_empty());
    let reasons: Vec<_> = report.diagnostics.iter().map(|d| d.reason).collect();
    assert_eq!(reasons, [UnresolvedReason::OpenAtEnd, UnresolvedReason::OrphanClose]);
    assert_eq!(report.diagnostics[1].last.as_deref(), Some("release"));
}

#[test]
fn test_medial_tie_chains_three_notes() {
    let report = scan(&measure(
        1,
        r#"<note xml:id="x" pname="e" oct="5" dur="2" tie="i"/>
           <note xml:id="y" pname="e" oct="5" dur="4" tie="m"/>
           <note xml:id="z" pname="e" oct="5" dur="4" tie="t"/>"#,
    ));
    assert_eq!(ends(&report.ties), [("x", "y"), ("y", "z")]);
}

#[test]
fn test_nested_slurs_pair_by_level() {
    let report = scan(&measure(
        1,
        r#"<note xml:id="n1" pname="c" oct="5" dur="4" slur="i1"/>
           <note xml:id="n2" pname="d" oct="5" dur="4" slur="i2"/>
           <note xml:id="n3" pname="e" oct="5" dur="4" slur="t2"/>
           <note xml:id="n4" pname="f" oct="5" dur="4" slur="t1"/>"#,
    ));

    assert_eq!(ends(&report.slurs), [("n1", "n4"), ("n2", "n3")]);
    assert_eq!(
        report.slurs[1].params,
        LinkParams::Slur(SlurKey {
            nesting_level: 2,
            system: 1,
        })
    );
    assert!(report.is_fully_resolved());
}

#[test]
fn test_chord_tie_applies_to_members() {
    let report = scan(&[
        measure(
            1,
            r#"<chord dur="1" tie="i"><note xml:id="lo" pname="c" oct="4"/><note xml:id="hi" pname="e" oct="4"/></chord>"#,
        ),
        measure(
            2,
            r#"<chord dur="1" tie="t"><note xml:id="lo2" pname="c" oct="4"/><note xml:id="hi2" pname="e" oct="4"/></chord>"#,
        ),
    ]
    .concat());
    assert_eq!(ends(&report.ties), [("lo", "lo2"), ("hi", "hi2")]);
}

#[test]
fn test_malformed_slur_token() {
    for slur in ["ix", "i0"] {
        let note = format!(r#"<note pname="c" oct="5" dur="1" slur="{}"/>"#, slur);
        let xml = score(&measure(1, &note));
        assert!(
            matches!(scan_str(&xml, &ScanSettings::default()), Err(MeiError::InvalidArgument(_))),
            "slur=\"{}\"",
            slur
        );
    }
}

#[test]
fn test_tie_element_with_identities() {
    let body = r##"<measure n="1">
              <staff n="1"><layer n="1">
                <note xml:id="p" pname="a" oct="4" dur="2"/>
                <note xml:id="q" pname="a" oct="4" dur="2"/>
              </layer></staff>
              <tie startid="#p" endid="#q"/>
              <slur startid="#p" tstamp2="0m+3"/>
            </measure>"##;
    let report = scan(body);

    assert_eq!(ends(&report.ties), [("p", "q")]);
    assert_eq!(report.ties[0].params, LinkParams::None);
    assert_eq!(ends(&report.slurs), [("p", "q")]);
}

#[test]
fn test_empty_tie_element_is_reported() {
    let body = r#"<measure n="1"><staff n="1"><layer n="1"><note pname="a" oct="4" dur="1"/></layer></staff><tie/></measure>"#;
    let report = scan(body);
    assert_eq!(report.diagnostics[0].reason, UnresolvedReason::MissingEndpoints);
}
