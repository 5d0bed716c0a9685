//! Lookup tables from MEI attribute values to rendering backend codes
//!
//! The backend speaks VexFlow-style strings: `"q"` for a quarter,
//! `"c/4"` for a pitch key, `"treble"` for a G clef on line 2.

use serde::Serialize;

use crate::errors::{MeiError, MeiResult};

/// Backend duration code for an MEI `@dur`
///
/// # Examples
/// ```
/// use mei_scan::renderers::vexflow::duration_code;
///
/// assert_eq!(duration_code(4, false).unwrap(), "q");
/// assert_eq!(duration_code(8, true).unwrap(), "8r");
/// ```
pub fn duration_code(dur: u32, is_rest: bool) -> MeiResult<String> {
    let code = match dur {
        1 => "w",
        2 => "h",
        4 => "q",
        8 => "8",
        16 => "16",
        32 => "32",
        64 => "64",
        other => {
            return Err(MeiError::InvalidArgument(format!(
                "@dur=\"{}\" has no rendering equivalent",
                other
            )))
        }
    };
    Ok(if is_rest {
        format!("{}r", code)
    } else {
        code.to_string()
    })
}

/// Code for a measure rest
pub const MEASURE_REST: &str = "wr";

/// `@accid` to accidental glyph code; unknown values are not rendered
pub fn accidental(accid: &str) -> Option<&'static str> {
    match accid {
        "n" => Some("n"),
        "f" => Some("b"),
        "s" => Some("#"),
        "ff" => Some("bb"),
        "ss" => Some("##"),
        _ => None,
    }
}

/// `<artic @artic>` to articulation code
pub fn articulation(artic: &str) -> Option<&'static str> {
    match artic {
        "acc" => Some("a>"),
        "stacc" => Some("a."),
        "ten" => Some("a-"),
        "stacciss" => Some("av"),
        "marc" => Some("a^"),
        "dnbow" => Some("am"),
        "upbow" => Some("a|"),
        "snap" => Some("ao"),
        "lhpizz" => Some("a+"),
        "dot" => Some("a."),
        "stroke" => Some("a|"),
        _ => None,
    }
}

/// Clef name for `@clef.shape`/`@clef.line`. G and F clefs without a line
/// sit on their usual lines 2 and 4.
pub fn clef(shape: &str, line: Option<&str>) -> MeiResult<&'static str> {
    match (shape, line) {
        ("G", None | Some("2")) => Ok("treble"),
        ("F", None | Some("4")) => Ok("bass"),
        ("C", Some("3")) => Ok("alto"),
        ("C", Some("4")) => Ok("tenor"),
        _ => Err(MeiError::unsupported(
            format!("clef {}{}", shape, line.unwrap_or_default()),
            "staff definitions",
        )),
    }
}

/// Key signature spec: `"C"`, `"Bb"`, `"F#m"`. Missing pitch name means C.
pub fn key_spec(pname: Option<&str>, accid: Option<&str>, mode: Option<&str>) -> MeiResult<String> {
    let Some(pname) = pname else {
        return Ok("C".to_string());
    };
    let mut spec = pname.to_uppercase();
    match accid {
        Some("s") => spec.push('#'),
        Some("f") => spec.push('b'),
        Some(other) => {
            return Err(MeiError::InvalidArgument(format!(
                "@key.accid=\"{}\" must be 's' or 'f'",
                other
            )))
        }
        None => {}
    }
    if matches!(mode, Some(m) if m != "major") {
        spec.push('m');
    }
    Ok(spec)
}

pub fn time_spec(count: &str, unit: &str) -> String {
    format!("{}/{}", count, unit)
}

/// Pitch key such as `"c/4"`
pub fn note_key(pname: &str, oct: &str) -> String {
    format!("{}/{}", pname, oct)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StemDirection {
    Up,
    Down,
}

/// Diatonic step index (c0 = 0) for comparing pitches
fn diatonic_index(pname: &str, oct: &str) -> Option<i32> {
    let step = match pname.chars().next()?.to_ascii_lowercase() {
        'c' => 0,
        'd' => 1,
        'e' => 2,
        'f' => 3,
        'g' => 4,
        'a' => 5,
        'b' => 6,
        _ => return None,
    };
    Some(oct.trim().parse::<i32>().ok()? * 7 + step)
}

/// Stem direction from `@stem.dir`, else guessed from the pitch for treble
/// and bass staves. Other clefs leave the choice to the backend.
pub fn stem_direction(stem_dir: Option<&str>, clef: Option<&str>, pname: &str, oct: &str) -> Option<StemDirection> {
    match stem_dir {
        Some("up") => return Some(StemDirection::Up),
        Some("down") => return Some(StemDirection::Down),
        Some(_) => return None,
        None => {}
    }
    let pitch = diatonic_index(pname, oct)?;
    match clef? {
        "treble" if pitch < diatonic_index("a", "5")? => Some(StemDirection::Up),
        "treble" => Some(StemDirection::Down),
        "bass" if pitch > diatonic_index("c", "3")? => Some(StemDirection::Down),
        "bass" => Some(StemDirection::Up),
        _ => None,
    }
}
