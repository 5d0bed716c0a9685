//! Tie and slur marker tokens carried on `<note>` attributes
//!
//! - `@tie`: a string of marker characters, one per role the note plays
//!   (`"t"`, `"i"`, `"ti"`, `"m"`)
//! - `@slur`: whitespace-separated tokens `<letter><digit?>`; the digit is the
//!   nesting level 1-9 (level 0 when absent), e.g. `"i1 t2"`

use serde::Serialize;

use crate::errors::{MeiError, MeiResult};

/// Role a marker assigns to its note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Marker {
    Initiate,
    Medial,
    Terminate,
}

impl Marker {
    fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'i' => Some(Marker::Initiate),
            'm' => Some(Marker::Medial),
            't' => Some(Marker::Terminate),
            _ => None,
        }
    }
}

/// One parsed `@slur` token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlurToken {
    pub marker: Marker,
    pub nesting_level: u8,
}

/// Expand a `@tie` value into the actions to apply, in order.
///
/// A medial marker closes the incoming tie and opens the outgoing one.
/// Unknown characters are ignored.
pub fn parse_tie_attribute(value: &str) -> Vec<Marker> {
    let mut actions = Vec::new();
    for c in value.chars().filter(|c| !c.is_whitespace()) {
        match Marker::from_letter(c) {
            Some(Marker::Medial) => {
                actions.push(Marker::Terminate);
                actions.push(Marker::Initiate);
            }
            Some(marker) => actions.push(marker),
            None => log::warn!("ignoring unknown tie marker '{}' in @tie=\"{}\"", c, value),
        }
    }
    actions
}

/// Parse a `@slur` value into tokens
pub fn parse_slur_attribute(value: &str) -> MeiResult<Vec<SlurToken>> {
    value.split_whitespace().map(parse_slur_token).collect()
}

fn parse_slur_token(token: &str) -> MeiResult<SlurToken> {
    let malformed = || {
        MeiError::InvalidArgument(format!("badly formed slur attribute token \"{}\"", token))
    };

    let mut chars = token.chars();
    let letter = chars.next().ok_or_else(malformed)?;
    let marker = Marker::from_letter(letter).ok_or_else(malformed)?;
    let nesting_level = match (chars.next(), chars.next()) {
        (None, _) => 0,
        // an explicit level is 1-9; level 0 is only ever implied
        (Some(d), None) => match d.to_digit(10) {
            Some(level @ 1..=9) => level as u8,
            _ => return Err(malformed()),
        },
        (Some(_), Some(_)) => return Err(malformed()),
    };

    Ok(SlurToken {
        marker,
        nesting_level,
    })
}
