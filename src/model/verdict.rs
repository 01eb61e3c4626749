//! Classification results.

use chrono::{DateTime, Utc};

use super::envelope::{MessageEnvelope, MessageUid, TIMESTAMP_FORMAT};

/// Which rule trashed a message.
///
/// The numeric codes are stable identifiers: they drive sort order and
/// appear in the metrics log, so they must never be renumbered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum TrashCode {
    /// Sender not whitelisted, or unacceptable characters in the personal name.
    Sender = 1,
    /// Unacceptable characters in the subject.
    Subject = 2,
    /// Blacklist phrase found in the personal name.
    NamePhrase = 3,
    /// Blacklist phrase found in the subject.
    SubjectPhrase = 4,
    /// Blacklist phrase found in the sender address.
    AddressPhrase = 5,
    /// Empty blacklist phrase: matches every message it is tested against.
    MatchAll = 6,
}

impl TrashCode {
    /// Codes a non-empty blacklist phrase can fire with.
    pub const PHRASE_CODES: [TrashCode; 3] = [
        TrashCode::NamePhrase,
        TrashCode::SubjectPhrase,
        TrashCode::AddressPhrase,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<TrashCode> for u8 {
    fn from(code: TrashCode) -> u8 {
        code.as_u8()
    }
}

impl TryFrom<u8> for TrashCode {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Sender),
            2 => Ok(Self::Subject),
            3 => Ok(Self::NamePhrase),
            4 => Ok(Self::SubjectPhrase),
            5 => Ok(Self::AddressPhrase),
            6 => Ok(Self::MatchAll),
            other => Err(format!("invalid trash code {other}")),
        }
    }
}

impl std::fmt::Display for TrashCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.as_u8(), f)
    }
}

/// What a verdict matched: a blacklist phrase or one of the fixed categories.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    /// Well-formed sender missing from the whitelist.
    NotWhitelisted,
    /// Non-printable, emoji or Cyrillic content.
    Unacceptable,
    /// The empty phrase.
    MatchAll,
    /// A blacklist phrase.
    Phrase(String),
}

impl Category {
    pub const NOT_WHITELISTED: &'static str = "NotWhiteList";
    pub const UNACCEPTABLE: &'static str = "Unacceptable";
    pub const MATCH_ALL: &'static str = "*";
    /// Metrics-only key; no rule produces it.
    pub const UNPRINTABLE: &'static str = "Unprintable";

    /// Label used in reports and the metrics log.
    pub fn label(&self) -> &str {
        match self {
            Self::NotWhitelisted => Self::NOT_WHITELISTED,
            Self::Unacceptable => Self::UNACCEPTABLE,
            Self::MatchAll => Self::MATCH_ALL,
            Self::Phrase(p) => p,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

impl serde::Serialize for Category {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.label())
    }
}

/// A rule hit: the code and what matched, before it is tied to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub code: TrashCode,
    pub category: Category,
}

impl Hit {
    pub fn new(code: TrashCode, category: Category) -> Self {
        Self { code, category }
    }
}

/// A message the classifier decided to trash.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Verdict {
    pub uid: MessageUid,
    pub code: TrashCode,
    pub category: Category,
    pub received: DateTime<Utc>,
    /// Sender formatted for display.
    pub from: String,
    pub subject: String,
}

impl Verdict {
    pub fn new(envelope: &MessageEnvelope, hit: Hit) -> Self {
        Self {
            uid: envelope.uid,
            code: hit.code,
            category: hit.category,
            received: envelope.received,
            from: envelope.from_display(),
            subject: envelope.subject.clone(),
        }
    }

    /// Received timestamp as `YYYY-MM-DD HH:MM:SS`.
    pub fn received_display(&self) -> String {
        self.received.format(TIMESTAMP_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(TrashCode::Sender.as_u8(), 1);
        assert_eq!(TrashCode::Subject.as_u8(), 2);
        assert_eq!(TrashCode::NamePhrase.as_u8(), 3);
        assert_eq!(TrashCode::SubjectPhrase.as_u8(), 4);
        assert_eq!(TrashCode::AddressPhrase.as_u8(), 5);
        assert_eq!(TrashCode::MatchAll.as_u8(), 6);
    }

    #[test]
    fn test_code_order_follows_numbers() {
        assert!(TrashCode::Sender < TrashCode::Subject);
        assert!(TrashCode::AddressPhrase < TrashCode::MatchAll);
    }

    #[test]
    fn test_code_try_from() {
        assert_eq!(TrashCode::try_from(4), Ok(TrashCode::SubjectPhrase));
        assert!(TrashCode::try_from(0).is_err());
        assert!(TrashCode::try_from(7).is_err());
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(Category::NotWhitelisted.label(), "NotWhiteList");
        assert_eq!(Category::Unacceptable.label(), "Unacceptable");
        assert_eq!(Category::Phrase("free gift".into()).label(), "free gift");
    }

    #[test]
    fn test_verdict_serializes_code_as_number() {
        let env = MessageEnvelope {
            uid: MessageUid(3),
            from: None,
            subject: "Win".into(),
            received: DateTime::UNIX_EPOCH,
        };
        let hit = Hit::new(TrashCode::SubjectPhrase, Category::Phrase("win".into()));
        let verdict = Verdict::new(&env, hit);
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["code"], 4);
        assert_eq!(json["category"], "win");
        assert_eq!(json["uid"], 3);
    }
}
