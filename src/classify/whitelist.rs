//! Sender whitelist: full addresses, exact domains and `*suffix` domains.

use std::io::BufRead;
use std::path::Path;

use tracing::info;

use crate::error::{Result, SpamError};

/// One whitelist line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhitelistEntry {
    /// `alice@example.com`: exact sender address.
    FullAddress(String),
    /// `example.com`: exact sender domain.
    ExactDomain(String),
    /// `*wellsfargo.com`: any domain ending in `wellsfargo.com`.
    DomainSuffix(String),
}

impl WhitelistEntry {
    /// Parse one line; `None` for blank lines and a bare `*`.
    pub fn parse(line: &str) -> Option<Self> {
        let entry = line.trim().to_lowercase();
        if entry.is_empty() {
            return None;
        }
        if entry.contains('@') {
            return Some(Self::FullAddress(entry));
        }
        if let Some(suffix) = entry.strip_prefix('*') {
            if suffix.is_empty() {
                return None;
            }
            return Some(Self::DomainSuffix(suffix.to_string()));
        }
        Some(Self::ExactDomain(entry))
    }

    /// Does this entry exempt `address` / `domain` (both already lowercase)?
    pub fn matches(&self, address: &str, domain: &str) -> bool {
        match self {
            Self::FullAddress(a) => address == a,
            Self::DomainSuffix(suffix) => domain.ends_with(suffix.as_str()),
            Self::ExactDomain(d) => domain == d,
        }
    }
}

/// The loaded whitelist, in file order.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    entries: Vec<WhitelistEntry>,
}

impl Whitelist {
    pub fn new(entries: Vec<WhitelistEntry>) -> Self {
        Self { entries }
    }

    /// Parse newline-delimited entries from a string.
    pub fn parse(text: &str) -> Self {
        Self::new(text.lines().filter_map(WhitelistEntry::parse).collect())
    }

    /// Read newline-delimited entries from any reader.
    pub fn from_reader(reader: impl BufRead) -> std::io::Result<Self> {
        let mut entries = Vec::new();
        for line in reader.lines() {
            if let Some(entry) = WhitelistEntry::parse(&line?) {
                entries.push(entry);
            }
        }
        Ok(Self::new(entries))
    }

    /// Load the whitelist file. Any failure is fatal to the run.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| SpamError::RuleList {
            kind: "whitelist",
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let list =
            Self::from_reader(std::io::BufReader::new(file)).map_err(|e| SpamError::RuleList {
                kind: "whitelist",
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        info!(path = %path.display(), entries = list.len(), "Loaded whitelist");
        Ok(list)
    }

    /// True if any entry exempts the sender. First hit wins.
    pub fn is_whitelisted(&self, address: &str, domain: &str) -> bool {
        self.entries.iter().any(|e| e.matches(address, domain))
    }

    pub fn entries(&self) -> &[WhitelistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
