//! The blacklist rule pipeline.
//!
//! A message is tested against each blacklist phrase in turn; the first
//! phrase that produces a hit decides its trash code. Within one phrase the
//! rules run in a fixed priority order and the first positive one wins:
//!
//! | step | rule                                          | code |
//! |------|-----------------------------------------------|------|
//! | 0    | sender whitelisted → exempt from everything   | –    |
//! | 0    | sender well-formed but not whitelisted        | 1    |
//! | 1    | empty phrase                                  | 6    |
//! | 2    | no sender or empty subject → next phrase      | –    |
//! | 3    | unacceptable characters in the personal name  | 1    |
//! | 4    | unacceptable characters in the subject        | 2    |
//! | 5    | phrase in folded personal name                | 3    |
//! | 6    | phrase in folded subject                      | 4    |
//! | 7    | phrase in sender address                      | 5    |
//!
//! Step 0 is default-deny: only whitelisted senders survive when the
//! sender address is readable. Phrase rules only ever see messages whose
//! `From:` could not be split into a local part and a domain.

use tracing::{trace, warn};

use crate::config::RulesConfig;
use crate::error::Result;
use crate::model::envelope::{MessageEnvelope, SenderAddress};
use crate::model::verdict::{Category, Hit, TrashCode};

use super::blacklist::Blacklist;
use super::normalize::normalize;
use super::unacceptable::has_unacceptable_content;
use super::whitelist::Whitelist;

/// Outcome of testing one message against one phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Whitelisted sender: stop, and do not test further phrases.
    Exempt,
    /// Trash the message.
    Trash(Hit),
    /// This phrase did not match; try the next one.
    Pass,
}

/// Where the sender stands with respect to the whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderStatus {
    Whitelisted,
    NotWhitelisted,
    /// `From:` missing or without a usable local part / domain.
    Unknown,
}

/// Per-message data derived once and shared by every phrase test.
#[derive(Debug, Clone)]
pub struct PreparedEnvelope<'e> {
    pub envelope: &'e MessageEnvelope,
    pub sender: SenderStatus,
    name_unacceptable: bool,
    subject_unacceptable: bool,
    /// Folded, lowercased personal name.
    name: String,
    /// Folded, lowercased subject.
    subject: String,
    /// Lowercased `mailbox@host`, well-formed or not.
    address: String,
}

impl PreparedEnvelope<'_> {
    /// Step 2: a message without sender or subject takes no phrase rule.
    fn is_evaluable(&self) -> bool {
        self.envelope.from.is_some() && !self.envelope.subject.is_empty()
    }
}

type PhraseRule = fn(&PreparedEnvelope<'_>, &str) -> Option<Hit>;

/// Steps 3–7, in priority order.
const PHRASE_RULES: [PhraseRule; 5] = [
    unacceptable_name,
    unacceptable_subject,
    phrase_in_name,
    phrase_in_subject,
    phrase_in_address,
];

fn unacceptable_name(msg: &PreparedEnvelope<'_>, _phrase: &str) -> Option<Hit> {
    msg.name_unacceptable
        .then(|| Hit::new(TrashCode::Sender, Category::Unacceptable))
}

fn unacceptable_subject(msg: &PreparedEnvelope<'_>, _phrase: &str) -> Option<Hit> {
    msg.subject_unacceptable
        .then(|| Hit::new(TrashCode::Subject, Category::Unacceptable))
}

fn phrase_in_name(msg: &PreparedEnvelope<'_>, phrase: &str) -> Option<Hit> {
    phrase_hit(&msg.name, phrase, TrashCode::NamePhrase)
}

fn phrase_in_subject(msg: &PreparedEnvelope<'_>, phrase: &str) -> Option<Hit> {
    phrase_hit(&msg.subject, phrase, TrashCode::SubjectPhrase)
}

fn phrase_in_address(msg: &PreparedEnvelope<'_>, phrase: &str) -> Option<Hit> {
    phrase_hit(&msg.address, phrase, TrashCode::AddressPhrase)
}

fn phrase_hit(haystack: &str, phrase: &str, code: TrashCode) -> Option<Hit> {
    haystack
        .contains(phrase)
        .then(|| Hit::new(code, Category::Phrase(phrase.to_string())))
}

/// Stateless classifier over injected rule sets.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    whitelist: Whitelist,
    blacklist: Blacklist,
}

impl Classifier {
    pub fn new(whitelist: Whitelist, blacklist: Blacklist) -> Self {
        Self {
            whitelist,
            blacklist,
        }
    }

    /// Load both rule lists. Either failing is fatal to the caller.
    pub fn load(rules: &RulesConfig) -> Result<Self> {
        let whitelist = Whitelist::load(&rules.whitelist)?;
        let blacklist = Blacklist::load(&rules.blacklist)?;
        if blacklist.is_empty() {
            warn!(path = %rules.blacklist.display(), "Blacklist is empty; nothing will be trashed");
        }
        Ok(Self::new(whitelist, blacklist))
    }

    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    pub fn blacklist(&self) -> &Blacklist {
        &self.blacklist
    }

    /// Resolve the sender against the whitelist.
    pub fn sender_status(&self, sender: Option<&SenderAddress>) -> SenderStatus {
        match sender {
            Some(s) if self.whitelist.is_whitelisted(&s.address, &s.domain) => {
                SenderStatus::Whitelisted
            }
            Some(_) => SenderStatus::NotWhitelisted,
            None => SenderStatus::Unknown,
        }
    }

    /// Derive everything the phrase rules look at.
    pub fn prepare<'e>(&self, envelope: &'e MessageEnvelope) -> PreparedEnvelope<'e> {
        let from = envelope.from.as_ref();
        let sender_address = from.and_then(|s| s.address());
        let personal_name = from.map(|s| s.personal_name.as_str()).unwrap_or("");
        PreparedEnvelope {
            envelope,
            sender: self.sender_status(sender_address.as_ref()),
            name_unacceptable: has_unacceptable_content(personal_name),
            subject_unacceptable: has_unacceptable_content(&envelope.subject),
            name: normalize(personal_name).to_lowercase(),
            subject: normalize(&envelope.subject).to_lowercase(),
            address: from.map(|s| s.raw_address()).unwrap_or_default(),
        }
    }

    /// Test one message against one phrase.
    pub fn classify(&self, msg: &PreparedEnvelope<'_>, phrase: &str) -> Decision {
        match msg.sender {
            SenderStatus::Whitelisted => return Decision::Exempt,
            SenderStatus::NotWhitelisted => {
                return Decision::Trash(Hit::new(TrashCode::Sender, Category::NotWhitelisted))
            }
            SenderStatus::Unknown => {}
        }

        if phrase.is_empty() {
            return Decision::Trash(Hit::new(TrashCode::MatchAll, Category::MatchAll));
        }

        if !msg.is_evaluable() {
            return Decision::Pass;
        }

        PHRASE_RULES
            .iter()
            .find_map(|rule| rule(msg, phrase))
            .map_or(Decision::Pass, Decision::Trash)
    }

    /// Test one message against every phrase, stopping at the first
    /// decisive result.
    pub fn classify_message(&self, envelope: &MessageEnvelope) -> Option<Hit> {
        let msg = self.prepare(envelope);
        for phrase in self.blacklist.iter() {
            match self.classify(&msg, phrase) {
                Decision::Exempt => {
                    trace!(uid = %envelope.uid, "Whitelisted sender");
                    return None;
                }
                Decision::Trash(hit) => {
                    trace!(
                        uid = %envelope.uid,
                        code = %hit.code,
                        category = %hit.category,
                        "Matched"
                    );
                    return Some(hit);
                }
                Decision::Pass => {}
            }
        }
        None
    }
}
