//! Blacklist phrases.

use std::io::BufRead;
use std::path::Path;

use tracing::{info, warn};

use crate::error::{Result, SpamError};

/// The loaded blacklist, in file order.
///
/// Every phrase is lowercase. A multi-word line is registered twice: as
/// written and with its spaces removed, so `make money` also catches
/// `MakeMoney`. A blank line is kept as the empty phrase, which matches
/// every message that reaches it.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    phrases: Vec<String>,
}

impl Blacklist {
    /// Build from phrases that are already expanded and lowercased.
    pub fn new(phrases: Vec<String>) -> Self {
        Self { phrases }
    }

    /// Parse newline-delimited phrases from a string.
    pub fn parse(text: &str) -> Self {
        let mut list = Self::default();
        for line in text.lines() {
            list.push_line(line);
        }
        list
    }

    /// Read newline-delimited phrases from any reader.
    pub fn from_reader(reader: impl BufRead) -> std::io::Result<Self> {
        let mut list = Self::default();
        for line in reader.lines() {
            list.push_line(&line?);
        }
        Ok(list)
    }

    /// Load the blacklist file. Any failure is fatal to the run.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| SpamError::RuleList {
            kind: "blacklist",
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let list =
            Self::from_reader(std::io::BufReader::new(file)).map_err(|e| SpamError::RuleList {
                kind: "blacklist",
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        info!(path = %path.display(), phrases = list.len(), "Loaded blacklist");
        if list.has_match_all() {
            warn!(path = %path.display(), "Blacklist has a blank line; it matches every message that reaches it");
        }
        Ok(list)
    }

    fn push_line(&mut self, line: &str) {
        let phrase = line.trim().to_lowercase();
        let joined = phrase.contains(' ').then(|| phrase.replace(' ', ""));
        self.phrases.push(phrase);
        if let Some(joined) = joined {
            self.phrases.push(joined);
        }
    }

    /// True if a blank line put the empty phrase in the list.
    pub fn has_match_all(&self) -> bool {
        self.phrases.iter().any(String::is_empty)
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.phrases.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_word_line_registers_joined_form() {
        let list = Blacklist::parse("Make Money\n");
        assert_eq!(list.phrases(), ["make money", "makemoney"]);
    }

    #[test]
    fn test_lines_trimmed_and_lowercased() {
        let list = Blacklist::parse("  VIAGRA  \r\nCrypto\n");
        assert_eq!(list.phrases(), ["viagra", "crypto"]);
    }

    #[test]
    fn test_blank_line_is_the_empty_phrase() {
        let list = Blacklist::parse("casino\n\nlottery");
        assert_eq!(list.phrases(), ["casino", "", "lottery"]);
        assert!(list.has_match_all());
    }

    #[test]
    fn test_whitespace_only_line_is_blank() {
        let list = Blacklist::parse("  \t \nlottery\n");
        assert_eq!(list.phrases(), ["", "lottery"]);
        assert!(!Blacklist::parse("lottery\n").has_match_all());
    }

    #[test]
    fn test_three_words_joined_once() {
        let list = Blacklist::parse("act now today");
        assert_eq!(list.phrases(), ["act now today", "actnowtoday"]);
    }

    #[test]
    fn test_from_reader_matches_parse() {
        let text = "free gift\nwinner\n";
        let a = Blacklist::parse(text);
        let b = Blacklist::from_reader(std::io::Cursor::new(text)).unwrap();
        assert_eq!(a.phrases(), b.phrases());
    }

    #[test]
    fn test_load_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = Blacklist::load(&dir.path().join("Blacklist.txt")).unwrap_err();
        assert!(matches!(err, SpamError::RuleList { kind: "blacklist", .. }));
    }
}
