//! Links whose end lies in a later measure

use mei_scan::errors::MeiError;
use mei_scan::links::LocationKey;
use mei_scan::models::{HairpinForm, LinkParams};
use mei_scan::parse::parse_mei;
use mei_scan::scan::{scan_str, ScanSession, UnresolvedReason};
use mei_scan::settings::ScanSettings;

/// Four quarters with identities `m<n>q1` .. `m<n>q4`
fn quarters(n: u32) -> String {
    format!(
        r#"<measure n="{n}"><staff n="1"><layer n="1">
             <note xml:id="m{n}q1" pname="c" oct="5" dur="4"/>
             <note xml:id="m{n}q2" pname="d" oct="5" dur="4"/>
             <note xml:id="m{n}q3" pname="e" oct="5" dur="4"/>
             <note xml:id="m{n}q4" pname="f" oct="5" dur="4"/>
           </layer></staff></measure>"#,
        n = n
    )
}

fn with_links(n: u32, links: &str) -> String {
    quarters(n).replace("</staff></measure>", &format!("</staff>{}</measure>", links))
}

fn score(measures: &[String]) -> String {
    format!(
        r#"<mei xmlns="http://www.music-encoding.org/ns/mei"><music><body><mdiv><score>
             <scoreDef><staffGrp>
               <staffDef n="1" clef.shape="G" clef.line="2" meter.count="4" meter.unit="4"/>
             </staffGrp></scoreDef>
             <section>{}</section>
           </score></mdiv></body></music></mei>"#,
        measures.concat()
    )
}

#[test]
fn test_hairpin_two_measures_ahead() {
    let xml = score(&[
        with_links(1, r##"<hairpin startid="#m1q2" tstamp2="2m+3" form="cres"/>"##),
        quarters(2),
        quarters(3),
    ]);
    let mut doc = parse_mei(&xml).unwrap();
    let mut session = ScanSession::new(ScanSettings::default());
    let report = session.run(&mut doc).unwrap();

    assert!(session.resolver().pending().is_empty());
    assert_eq!(report.hairpins.len(), 1);
    let hairpin = &report.hairpins[0];
    assert_eq!((hairpin.first.as_str(), hairpin.last.as_str()), ("m1q2", "m3q3"));
    assert_eq!(hairpin.params, LinkParams::Hairpin { form: HairpinForm::Cres, place: None });
    assert!(report.is_fully_resolved());
}

#[test]
fn test_same_measure_tstamp2_resolves_immediately() {
    let xml = score(&[with_links(
        1,
        r#"<slur tstamp="1" tstamp2="0m+4"/><tie tstamp="2.4" tstamp2="0m+2.6"/>"#,
    )]);
    let (_, report) = scan_str(&xml, &ScanSettings::default()).unwrap();

    let slur = &report.slurs[0];
    assert_eq!((slur.first.as_str(), slur.last.as_str()), ("m1q1", "m1q4"));
    // nearest events, not exact positions
    let tie = &report.ties[0];
    assert_eq!((tie.first.as_str(), tie.last.as_str()), ("m1q2", "m1q3"));
}

#[test]
fn test_target_in_second_staff() {
    let measure = |n: u32, links: &str| {
        format!(
            r#"<measure n="{n}">
                 <staff n="1"><layer n="1"><note xml:id="s1m{n}" pname="g" oct="4" dur="1"/></layer></staff>
                 <staff n="2"><layer n="1"><note pname="c" oct="3" dur="2"/><note xml:id="s2m{n}b3" pname="g" oct="2" dur="2"/></layer></staff>
                 {links}
               </measure>"#,
            n = n,
            links = links
        )
    };
    let xml = format!(
        r#"<mei><score>
             <scoreDef meter.count="4" meter.unit="4"><staffGrp>
               <staffDef n="1" clef.shape="G" clef.line="2"/>
               <staffDef n="2" clef.shape="F" clef.line="4"/>
             </staffGrp></scoreDef>
             <section>{}{}</section>
           </score></mei>"#,
        measure(1, r##"<slur staff="2" startid="#s1m1" tstamp2="1m+3"/>"##),
        measure(2, "")
    );

    let (_, report) = scan_str(&xml, &ScanSettings::default()).unwrap();
    assert_eq!(report.slurs[0].last, "s2m2b3");
}

#[test]
fn test_unvisited_target_is_reported() {
    let xml = score(&[
        with_links(1, r#"<hairpin startid="m1q1" tstamp2="3m+1" form="dim" place="above"/>"#),
        quarters(2),
    ]);

    let (_, report) = scan_str(&xml, &ScanSettings::default()).unwrap();
    assert!(report.hairpins.is_empty());
    assert_eq!(report.diagnostics.len(), 1);

    let diagnostic = &report.diagnostics[0];
    assert_eq!(diagnostic.reason, UnresolvedReason::PendingForward);
    assert_eq!(diagnostic.first.as_deref(), Some("m1q1"));
    assert_eq!(diagnostic.waiting_at, Some(LocationKey { measure: 4, staff: 1, layer: 1 }));
    assert!(matches!(
        report.unresolved_errors().as_slice(),
        [MeiError::UnresolvedLink { kind, .. }] if kind == "hairpin"
    ));
}

#[test]
fn test_strict_links_fail_the_scan() {
    let xml = score(&[with_links(1, r#"<slur startid="m1q1" tstamp2="1m+1"/>"#)]);
    let settings = ScanSettings {
        strict_links: true,
        ..ScanSettings::default()
    };
    let err = scan_str(&xml, &settings).unwrap_err();
    assert!(matches!(err, MeiError::UnresolvedLink { ref kind, .. } if kind == "slur"));
}

#[test]
fn test_malformed_tstamp2() {
    let xml = score(&[with_links(1, r#"<slur startid="m1q1" tstamp2="1m3"/>"#)]);
    assert!(matches!(
        scan_str(&xml, &ScanSettings::default()),
        Err(MeiError::InvalidArgument(_))
    ));
}
