//! Detection of content no legitimate sender of ours uses: invisible or
//! non-printable characters, emoji, and Cyrillic script.
//!
//! This runs on the raw personal name and subject, before any folding, so
//! the whole Cyrillic block counts here, not just the look-alikes that
//! [`normalize`](super::normalize::normalize) rewrites.

use unicode_general_category::{get_general_category, GeneralCategory};

/// Emoji blocks, inclusive.
const EMOJI_RANGES: [(u32, u32); 8] = [
    (0x1F600, 0x1F64F), // Emoticons
    (0x1F300, 0x1F5FF), // Miscellaneous Symbols and Pictographs
    (0x1F680, 0x1F6FF), // Transport and Map Symbols
    (0x2600, 0x26FF),   // Miscellaneous Symbols
    (0x2700, 0x27BF),   // Dingbats
    (0x1F900, 0x1F9FF), // Supplemental Symbols and Pictographs
    (0x1FA70, 0x1FAFF), // Symbols and Pictographs Extended-A
    (0x1F1E6, 0x1F1FF), // Regional indicators (flags)
];

/// True if `input` contains any non-printable, emoji or Cyrillic code point.
pub fn has_unacceptable_content(input: &str) -> bool {
    input
        .chars()
        .any(|c| !is_printable(c) || is_emoji(c) || is_cyrillic(c))
}

/// Printable: letters, marks, numbers, punctuation, symbols and the ASCII
/// space. Other whitespace, controls, format characters, private use,
/// surrogates and unassigned code points are not.
pub fn is_printable(c: char) -> bool {
    use GeneralCategory::*;

    if c == ' ' {
        return true;
    }
    matches!(
        get_general_category(c),
        UppercaseLetter
            | LowercaseLetter
            | TitlecaseLetter
            | ModifierLetter
            | OtherLetter
            | NonspacingMark
            | SpacingMark
            | EnclosingMark
            | DecimalNumber
            | LetterNumber
            | OtherNumber
            | ConnectorPunctuation
            | DashPunctuation
            | OpenPunctuation
            | ClosePunctuation
            | InitialPunctuation
            | FinalPunctuation
            | OtherPunctuation
            | MathSymbol
            | CurrencySymbol
            | ModifierSymbol
            | OtherSymbol
    )
}

/// True for code points in the enumerated emoji blocks.
pub fn is_emoji(c: char) -> bool {
    in_ranges(c as u32, &EMOJI_RANGES)
}

/// True for anything in the Cyrillic block U+0400–U+04FF.
pub fn is_cyrillic(c: char) -> bool {
    ('\u{0400}'..='\u{04FF}').contains(&c)
}

fn in_ranges(cp: u32, ranges: &[(u32, u32)]) -> bool {
    ranges.iter().any(|&(lo, hi)| (lo..=hi).contains(&cp))
}
