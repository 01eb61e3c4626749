//! Terminal and JSON output: verdict table, Unicode diagnostics, folder list,
//! and metrics summary.

use std::io::{self, Write};

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::classify::metrics::TrashMetrics;
use crate::classify::normalize::normalize;
use crate::mailbox::FolderInfo;
use crate::model::envelope::MessageEnvelope;
use crate::model::verdict::Verdict;

const FROM_WIDTH: usize = 32;
const SUBJECT_WIDTH: usize = 44;

/// Truncate a string to fit within `max_width` columns, adding "..." if needed.
pub fn truncate_str(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return s.chars().take(max_width).collect();
    }
    let mut result = String::new();
    let mut current_width = 0;
    for ch in s.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if current_width + ch_width + 3 > max_width {
            break;
        }
        result.push(ch);
        current_width += ch_width;
    }
    result.push_str("...");
    result
}

/// Truncate, then pad with spaces to exactly `width` columns.
fn fit(s: &str, width: usize) -> String {
    let mut cell = truncate_str(s, width);
    let used = UnicodeWidthStr::width(cell.as_str());
    cell.extend(std::iter::repeat_n(' ', width.saturating_sub(used)));
    cell
}

/// Print verdicts as an aligned table, in the order given.
pub fn write_verdict_table(out: &mut impl Write, verdicts: &[Verdict]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "  {} matching message(s)", verdicts.len())?;
    if verdicts.is_empty() {
        return writeln!(out);
    }
    writeln!(out)?;
    writeln!(
        out,
        "  {:<4} {:>6} {:<19} {} {} {}",
        "Code",
        "UID",
        "Received",
        fit("From", FROM_WIDTH),
        fit("Subject", SUBJECT_WIDTH),
        "Matched"
    )?;
    writeln!(out, "  {}", "-".repeat(4 + 6 + 19 + FROM_WIDTH + SUBJECT_WIDTH + 12))?;
    for v in verdicts {
        writeln!(
            out,
            "  {:<4} {:>6} {:<19} {} {} {}",
            v.code,
            v.uid,
            v.received_display(),
            fit(&v.from, FROM_WIDTH),
            fit(&v.subject, SUBJECT_WIDTH),
            v.category
        )?;
    }
    writeln!(out)
}

/// Verdicts as a pretty-printed JSON array.
pub fn verdicts_to_json(verdicts: &[Verdict]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(verdicts)
}

/// A message whose name or subject is still non-ASCII after normalization.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Diagnostic {
    pub uid: u64,
    pub from: String,
    pub subject: String,
    pub received: String,
    pub normalized_name: String,
    pub normalized_subject: String,
}

/// Check one message for text normalization cannot reduce to ASCII.
///
/// Messages without a sender are skipped.
pub fn diagnose(envelope: &MessageEnvelope) -> Option<Diagnostic> {
    let sender = envelope.from.as_ref()?;
    let normalized_name = normalize(&sender.personal_name);
    let normalized_subject = normalize(&envelope.subject);
    if normalized_name.is_ascii() && normalized_subject.is_ascii() {
        return None;
    }
    Some(Diagnostic {
        uid: envelope.uid.0,
        from: sender.display(),
        subject: envelope.subject.clone(),
        received: envelope.received_display(),
        normalized_name,
        normalized_subject,
    })
}

pub fn write_diagnostics(out: &mut impl Write, found: &[Diagnostic]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "  {} message(s) with non-ASCII text after normalization", found.len())?;
    for d in found {
        writeln!(
            out,
            "  UID: {}, From: {}, Subject: {}, Received: {}",
            d.uid, d.from, d.subject, d.received
        )?;
        writeln!(
            out,
            "    normalized: name={:?} subject={:?}",
            d.normalized_name, d.normalized_subject
        )?;
    }
    writeln!(out)
}

pub fn write_folder_table(out: &mut impl Write, folders: &[FolderInfo]) -> io::Result<()> {
    use humansize::{format_size, BINARY};

    writeln!(out)?;
    writeln!(out, "  {:<30} {:>10} {:>12}", "Folder", "Messages", "Size")?;
    writeln!(out, "  {}", "-".repeat(54))?;
    for f in folders {
        writeln!(
            out,
            "  {} {:>10} {:>12}",
            fit(&f.name, 30),
            f.messages,
            format_size(f.size, BINARY)
        )?;
    }
    writeln!(out)
}

/// Counters that fired during the run.
pub fn write_metrics_summary(out: &mut impl Write, metrics: &TrashMetrics) -> io::Result<()> {
    let fired: Vec<_> = metrics.nonzero().collect();
    if fired.is_empty() {
        return Ok(());
    }
    writeln!(out, "  {:<30} {:>4} {:>8}", "Rule", "Code", "Hits")?;
    writeln!(out, "  {}", "-".repeat(44))?;
    for m in fired {
        writeln!(out, "  {} {:>4} {:>8}", fit(&m.category, 30), m.code, m.count)?;
    }
    writeln!(out)
}
