//! Message parsing: MBOX streaming, single EML files, and header decoding.

pub mod eml;
pub mod header;
pub mod mbox;
