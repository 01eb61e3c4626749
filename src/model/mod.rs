//! Core data model types: addresses, message envelopes, and verdicts.

pub mod address;
pub mod envelope;
pub mod verdict;
