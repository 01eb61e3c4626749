//! Message envelopes: the per-message input of the classifier.

use chrono::{DateTime, Utc};

use super::address::EmailAddress;

/// Display format for received timestamps (`YYYY-MM-DD HH:MM:SS`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Store-assigned message identifier, stable for the session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct MessageUid(pub u64);

impl std::fmt::Display for MessageUid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// First `From:` address of a message, split the way mail stores report it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Sender {
    /// Display name, possibly empty.
    pub personal_name: String,
    /// Local part (before the `@`).
    pub mailbox: String,
    /// Domain (after the `@`).
    pub host: String,
}

/// Lowercased `local@domain` and its domain, for whitelist lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderAddress {
    pub address: String,
    pub domain: String,
}

impl Sender {
    pub fn new(
        personal_name: impl Into<String>,
        mailbox: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            personal_name: personal_name.into(),
            mailbox: mailbox.into(),
            host: host.into(),
        }
    }

    /// Build from a parsed header address.
    pub fn from_address(addr: &EmailAddress) -> Self {
        let (mailbox, host) = addr.split();
        Self::new(addr.display_name.clone(), mailbox, host)
    }

    /// Trimmed, lowercased `local@domain`, or `None` if either side is empty.
    pub fn address(&self) -> Option<SenderAddress> {
        let local = self.mailbox.trim().to_lowercase();
        let domain = self.host.trim().to_lowercase();
        if local.is_empty() || domain.is_empty() {
            return None;
        }
        Some(SenderAddress {
            address: format!("{local}@{domain}"),
            domain,
        })
    }

    /// Lowercased `mailbox@host` without any well-formedness check.
    pub fn raw_address(&self) -> String {
        format!(
            "{}@{}",
            self.mailbox.to_lowercase(),
            self.host.to_lowercase()
        )
    }

    /// Format for display: `"Name <local@domain>"` or just `"local@domain"`.
    pub fn display(&self) -> String {
        let address = format!("{}@{}", self.mailbox, self.host);
        if self.personal_name.is_empty() {
            address
        } else {
            format!("{} <{}>", self.personal_name, address)
        }
    }
}

/// Everything the classifier needs to know about one message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MessageEnvelope {
    /// Store-assigned identifier.
    pub uid: MessageUid,
    /// First `From:` address; `None` when the header is missing.
    pub from: Option<Sender>,
    /// Decoded subject line (may be empty).
    pub subject: String,
    /// When the store received the message.
    pub received: DateTime<Utc>,
}

impl MessageEnvelope {
    /// Sender formatted for display, or `"Unknown"`.
    pub fn from_display(&self) -> String {
        self.from
            .as_ref()
            .map(Sender::display)
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// Received timestamp as `YYYY-MM-DD HH:MM:SS`.
    pub fn received_display(&self) -> String {
        self.received.format(TIMESTAMP_FORMAT).to_string()
    }
}
