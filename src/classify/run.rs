//! One sweep over a folder: verdict accumulation and metrics.

use chrono::{DateTime, Local};

use crate::model::envelope::{MessageEnvelope, MessageUid, TIMESTAMP_FORMAT};
use crate::model::verdict::Verdict;

use super::engine::Classifier;
use super::metrics::TrashMetrics;
use super::ordering::sort_verdicts;

/// Caller-owned state for one classification pass.
///
/// The classifier stays immutable; everything that changes while messages
/// stream past lives here.
#[derive(Debug)]
pub struct ClassificationRun<'c> {
    classifier: &'c Classifier,
    metrics: TrashMetrics,
    verdicts: Vec<Verdict>,
    scanned: u64,
    started: DateTime<Local>,
}

impl<'c> ClassificationRun<'c> {
    pub fn new(classifier: &'c Classifier) -> Self {
        Self::started_at(classifier, Local::now())
    }

    pub fn started_at(classifier: &'c Classifier, started: DateTime<Local>) -> Self {
        Self {
            classifier,
            metrics: TrashMetrics::seeded(classifier.blacklist()),
            verdicts: Vec::new(),
            scanned: 0,
            started,
        }
    }

    /// Classify one message, recording the verdict and counting the hit.
    pub fn observe(&mut self, envelope: &MessageEnvelope) -> Option<&Verdict> {
        self.scanned += 1;
        let hit = self.classifier.classify_message(envelope)?;
        self.metrics.increment(hit.category.label(), hit.code);
        self.verdicts.push(Verdict::new(envelope, hit));
        self.verdicts.last()
    }

    /// Verdicts in scan order.
    pub fn verdicts(&self) -> &[Verdict] {
        &self.verdicts
    }

    /// Verdicts in presentation order.
    pub fn sorted_verdicts(&self) -> Vec<Verdict> {
        let mut sorted = self.verdicts.clone();
        sort_verdicts(&mut sorted);
        sorted
    }

    /// Ids to hand to relocation, in scan order.
    pub fn relocation_uids(&self) -> Vec<MessageUid> {
        self.verdicts.iter().map(|v| v.uid).collect()
    }

    pub fn metrics(&self) -> &TrashMetrics {
        &self.metrics
    }

    pub fn scanned(&self) -> u64 {
        self.scanned
    }

    /// Run start as written to the metrics log.
    pub fn started_display(&self) -> String {
        self.started.format(TIMESTAMP_FORMAT).to_string()
    }
}
