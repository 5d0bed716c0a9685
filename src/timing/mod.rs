//! Temporal model
//!
//! When does each event occur, in beats, relative to a meter:
//!
//! ```text
//! EventEnumerator ──► duration_of ──► sum_up_until / id2tstamp
//!        │                  │
//!        └──────────────────┴──────► tstamp2id (nearest event)
//! ```

pub mod duration;
pub mod enumerator;
pub mod indexer;

pub use duration::{chord_dur_code, dur_code, duration_in_layer, duration_of, DEFAULT_LAYER_N};
pub use enumerator::EventEnumerator;
pub use indexer::{id2tstamp, nearest_event, sum_up_until, tstamp2id, ContextEntry, SumResult};
