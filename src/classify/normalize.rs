//! Homoglyph folding: styled and look-alike glyphs back to plain ASCII.
//!
//! Spammers write "𝐅𝐑𝐄𝐄" or "Frее" (Cyrillic `е`) so that phrase filters
//! miss them. Folding happens before phrase matching; anything not covered
//! here passes through untouched, including emoji and control characters,
//! which are the detector's business.

/// Mathematical Alphanumeric Symbols ranges folded to ASCII letters.
///
/// `(first, last, ascii_base)`: a code point `c` in `first..=last` maps to
/// `ascii_base + (c - first)`.
const MATH_ALPHANUMERIC: [(u32, u32, u8); 6] = [
    (0x1D400, 0x1D419, b'A'), // Bold capital
    (0x1D41A, 0x1D433, b'a'), // Bold small
    (0x1D5D4, 0x1D5ED, b'A'), // Sans-serif bold capital
    (0x1D5EE, 0x1D607, b'a'), // Sans-serif bold small
    (0x1D670, 0x1D689, b'A'), // Monospace capital
    (0x1D68A, 0x1D6A3, b'a'), // Monospace small
];

/// Fold homoglyphs in `input` to their ASCII look-alikes.
///
/// Total over every `char` and idempotent: everything it produces is ASCII,
/// and ASCII maps to itself.
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{00A9}' => out.push_str("(c)"),
            '\u{00AE}' => out.push_str("(r)"),
            _ => out.push(
                fold_math_alphanumeric(c)
                    .or_else(|| fold_cyrillic(c))
                    .unwrap_or(c),
            ),
        }
    }
    out
}

/// Map a bold / sans-serif bold / monospace letter to ASCII.
fn fold_math_alphanumeric(c: char) -> Option<char> {
    let cp = c as u32;
    if !(0x1D400..=0x1D7FF).contains(&cp) {
        return None;
    }
    MATH_ALPHANUMERIC
        .iter()
        .find(|(first, last, _)| (*first..=*last).contains(&cp))
        .map(|(first, _, base)| char::from(base + (cp - first) as u8))
}

/// Map a Cyrillic letter that reads as a Latin one.
///
/// Only true look-alikes in А–Я / а–я (plus Ё/ё) are folded; `П`, `и`,
/// `ж` and friends stay Cyrillic.
fn fold_cyrillic(c: char) -> Option<char> {
    let latin = match c {
        'А' => 'A',
        'В' => 'B',
        'Е' | 'Ё' => 'E',
        'К' => 'K',
        'М' => 'M',
        'Н' => 'H',
        'О' => 'O',
        'Р' => 'P',
        'С' => 'C',
        'Т' => 'T',
        'У' => 'Y',
        'Х' => 'X',
        'а' => 'a',
        'е' | 'ё' => 'e',
        'к' => 'k',
        'о' => 'o',
        'р' => 'p',
        'с' => 'c',
        'у' => 'y',
        'х' => 'x',
        _ => return None,
    };
    Some(latin)
}
