//! `SpamBeGone` — rule-based spam sweeping for local mail folders.
//!
//! The library classifies message envelopes against a whitelist and a
//! blacklist, counts which rules fired, and moves matched messages to a
//! trash folder through the [`mailbox::MailStore`] abstraction.

pub mod classify;
pub mod config;
pub mod error;
pub mod mailbox;
pub mod model;
pub mod parser;
pub mod report;
