//! Time signature value and beat conversions

use serde::{Deserialize, Serialize};

use crate::errors::{MeiError, MeiResult};

/// Time signature `{count, unit}`; `unit` is the reciprocal duration code of
/// one count (4 = quarter, 8 = eighth).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meter {
    count: u32,
    unit: u32,
}

impl Meter {
    /// Both parts must be strictly positive
    pub fn new(count: u32, unit: u32) -> MeiResult<Self> {
        if count == 0 || unit == 0 {
            return Err(MeiError::InvalidArgument(format!(
                "meter {}/{} must have a positive count and unit",
                count, unit
            )));
        }
        Ok(Meter { count, unit })
    }

    /// Parse from the textual `meter.count` / `meter.unit` attribute values
    pub fn parse(count: &str, unit: &str) -> MeiResult<Self> {
        let parse_part = |value: &str, name: &str| {
            value.trim().parse::<u32>().map_err(|_| {
                MeiError::InvalidArgument(format!("@{} \"{}\" is not a positive integer", name, value))
            })
        };
        Meter::new(parse_part(count, "meter.count")?, parse_part(unit, "meter.unit")?)
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn unit(&self) -> u32 {
        self.unit
    }
}

impl std::fmt::Display for Meter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.count, self.unit)
    }
}

/// Convert a reciprocal duration code into beats of `meter`
pub fn dur2beats(dur: u32, meter: Meter) -> MeiResult<f64> {
    if dur == 0 {
        return Err(MeiError::InvalidArgument("@dur must not be 0".to_string()));
    }
    Ok(meter.unit as f64 / dur as f64)
}

/// Convert a number of beats of `meter` back into a reciprocal duration code
pub fn beats2dur(beats: f64, meter: Meter) -> MeiResult<f64> {
    if beats <= 0.0 || !beats.is_finite() {
        return Err(MeiError::InvalidArgument(format!(
            "cannot convert {} beats into a duration",
            beats
        )));
    }
    Ok(meter.unit as f64 / beats)
}
