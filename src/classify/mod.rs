//! Message classification: homoglyph folding, content checks, whitelist and
//! blacklist rules, metrics, and verdict ordering.

pub mod blacklist;
pub mod engine;
pub mod metrics;
pub mod normalize;
pub mod ordering;
pub mod run;
pub mod unacceptable;
pub mod whitelist;

pub use blacklist::Blacklist;
pub use engine::{Classifier, Decision};
pub use run::ClassificationRun;
pub use whitelist::Whitelist;
