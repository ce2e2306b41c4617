//! Tools
//!
//! Helpers the pipeline and CLI call directly: a process-wide call budget,
//! the encyclopedia search it guards, and checked arithmetic.

pub mod arithmetic;
mod call_budget;
mod wiki_search;

pub use call_budget::CallBudget;
pub use wiki_search::WikiSearch;
