//! Lenient parsing of stage outputs
//!
//! The orchestrator never validates stage output. These helpers exist for the
//! consumers that want a best-effort structured view of it.

mod json_repair;

pub use json_repair::{JsonRepairer, extract_json_from_response};
