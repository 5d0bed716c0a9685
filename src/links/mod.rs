//! Link resolution
//!
//! Ties, slurs and hairpins connect two events. Their endpoints are found in
//! three ways:
//!
//! - `matching`: `@tie` / `@slur` markers on notes, paired by an automaton
//! - `extract`: `<tie>`, `<slur>`, `<hairpin>` elements with identity or
//!   timestamp references
//! - `forward`: end timestamps pointing at measures the scan has not reached

pub mod extract;
pub mod forward;
pub mod matching;
pub mod store;

pub use extract::LinkExtractor;
pub use forward::{ForwardResolver, LocationKey, PendingTable};
pub use matching::TieSlurAutomaton;
pub use store::{LinkHandle, LinkStore};
