//! Per-rule hit counters and the append-only metrics log.
//!
//! Log line format: `<run start>, <category-or-phrase>, <code>, <count>`.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, SpamError};
use crate::model::verdict::{Category, TrashCode};

use super::blacklist::Blacklist;

/// Counter for one (category, code) pair.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TrashMetric {
    pub category: String,
    pub code: TrashCode,
    pub count: u64,
}

/// Fixed-key counters, seeded once per run.
///
/// Only seeded keys ever count: incrementing an unknown key does nothing.
#[derive(Debug, Clone, Default)]
pub struct TrashMetrics {
    metrics: Vec<TrashMetric>,
    index: HashMap<(String, TrashCode), usize>,
}

impl TrashMetrics {
    /// Seed the fixed categories, then codes 3–5 for every phrase.
    ///
    /// `Unprintable` keeps its historical slots in the log's key set; hits
    /// of the unacceptable-content rules count under `Unacceptable`.
    pub fn seeded(blacklist: &Blacklist) -> Self {
        let mut metrics = Self::default();
        metrics.seed(Category::UNPRINTABLE, TrashCode::Sender);
        metrics.seed(Category::UNPRINTABLE, TrashCode::Subject);
        metrics.seed(Category::NOT_WHITELISTED, TrashCode::Sender);
        metrics.seed(Category::UNACCEPTABLE, TrashCode::Sender);
        metrics.seed(Category::UNACCEPTABLE, TrashCode::Subject);
        for phrase in blacklist.iter() {
            if phrase.is_empty() {
                metrics.seed(Category::MATCH_ALL, TrashCode::MatchAll);
                continue;
            }
            for code in TrashCode::PHRASE_CODES {
                metrics.seed(phrase, code);
            }
        }
        debug!(keys = metrics.metrics.len(), "Seeded trash metrics");
        metrics
    }

    fn seed(&mut self, category: &str, code: TrashCode) {
        let key = (category.to_string(), code);
        if self.index.contains_key(&key) {
            return;
        }
        self.index.insert(key, self.metrics.len());
        self.metrics.push(TrashMetric {
            category: category.to_string(),
            code,
            count: 0,
        });
    }

    /// Count one hit. Returns `false` (and changes nothing) for unknown keys.
    pub fn increment(&mut self, category: &str, code: TrashCode) -> bool {
        match self.index.get(&(category.to_string(), code)) {
            Some(&i) => {
                self.metrics[i].count += 1;
                true
            }
            None => false,
        }
    }

    /// Current count for a key, `None` if it was never seeded.
    pub fn count(&self, category: &str, code: TrashCode) -> Option<u64> {
        self.index
            .get(&(category.to_string(), code))
            .map(|&i| self.metrics[i].count)
    }

    /// All counters in seeding order.
    pub fn all(&self) -> &[TrashMetric] {
        &self.metrics
    }

    /// Counters that fired at least once, in seeding order.
    pub fn nonzero(&self) -> impl Iterator<Item = &TrashMetric> {
        self.metrics.iter().filter(|m| m.count > 0)
    }

    /// Write one line per non-zero counter. Returns the number of lines.
    pub fn write_lines(&self, out: &mut impl Write, run_started: &str) -> std::io::Result<usize> {
        let mut lines = 0;
        for m in self.nonzero() {
            writeln!(out, "{}, {}, {}, {}", run_started, m.category, m.code, m.count)?;
            lines += 1;
        }
        Ok(lines)
    }

    /// Append non-zero counters to the metrics log, creating it if needed.
    pub fn append_to(&self, path: &Path, run_started: &str) -> Result<usize> {
        let metrics_err = |source| SpamError::Metrics {
            path: path.to_path_buf(),
            source,
        };
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(metrics_err)?;
        let mut writer = std::io::BufWriter::new(file);
        let lines = self
            .write_lines(&mut writer, run_started)
            .map_err(metrics_err)?;
        writer.flush().map_err(metrics_err)?;
        info!(path = %path.display(), lines, "Appended trash metrics");
        Ok(lines)
    }
}
