//! Beat-based timestamps
//!
//! - Local: `"2.5"` means beat 2.5 of the current measure (1-based)
//! - Compound: `"1m+3"` means one whole measure ahead, then beat 3

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::errors::{MeiError, MeiResult};

static COMPOUND_TSTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+)\s*m\s*\+\s*(\d+(?:\.\d*)?|\.\d+)\s*$").expect("static regex is valid")
});

/// Position in beats, local to one measure or offset by whole measures
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum TimeStamp {
    Local(f64),
    Compound { measures: u32, beats: f64 },
}

impl TimeStamp {
    /// Whole measures ahead of the current one (0 for local timestamps)
    pub fn measures_ahead(&self) -> u32 {
        match self {
            TimeStamp::Local(_) => 0,
            TimeStamp::Compound { measures, .. } => *measures,
        }
    }

    /// Beat part of the timestamp
    pub fn beats(&self) -> f64 {
        match self {
            TimeStamp::Local(beats) => *beats,
            TimeStamp::Compound { beats, .. } => *beats,
        }
    }
}

fn parse_beats(text: &str, original: &str) -> MeiResult<f64> {
    let beats: f64 = text
        .trim()
        .parse()
        .map_err(|_| MeiError::InvalidArgument(format!("malformed timestamp \"{}\"", original)))?;
    if !beats.is_finite() || beats < 0.0 {
        return Err(MeiError::InvalidArgument(format!(
            "malformed timestamp \"{}\"",
            original
        )));
    }
    Ok(beats)
}

impl FromStr for TimeStamp {
    type Err = MeiError;

    fn from_str(s: &str) -> MeiResult<Self> {
        if let Some(caps) = COMPOUND_TSTAMP.captures(s) {
            let measures = caps[1]
                .parse::<u32>()
                .map_err(|_| MeiError::InvalidArgument(format!("malformed timestamp \"{}\"", s)))?;
            let beats = parse_beats(&caps[2], s)?;
            return Ok(TimeStamp::Compound { measures, beats });
        }
        if s.contains('m') || s.contains('+') {
            return Err(MeiError::InvalidArgument(format!(
                "malformed timestamp \"{}\"",
                s
            )));
        }
        Ok(TimeStamp::Local(parse_beats(s, s)?))
    }
}

impl fmt::Display for TimeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeStamp::Local(beats) => write!(f, "{}", beats),
            TimeStamp::Compound { measures, beats } => write!(f, "{}m+{}", measures, beats),
        }
    }
}
