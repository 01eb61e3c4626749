//! `From:` header mailboxes (RFC 5322 §3.4), reduced to what the classifier
//! needs: a display name and an `addr-spec`.

/// The first mailbox of an address header.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct EmailAddress {
    /// Display name, unquoted (may be empty).
    pub display_name: String,
    /// The bare `local@domain`, as written.
    pub address: String,
}

impl EmailAddress {
    /// Parse the first mailbox of a (decoded) header value.
    ///
    /// Accepts `Name <addr>`, `"Quoted, Name" <addr>`, `<addr>`, a bare
    /// `addr`, the legacy `addr (Name)` comment form, and group syntax
    /// (`Team: a@x, b@y;`). Anything unrecognized ends up in `address`
    /// untouched, so a malformed sender is still visible to the rules.
    pub fn parse(raw: &str) -> Self {
        let first = first_mailbox(strip_group_name(raw.trim()));

        if let Some((lt, gt)) = angle_brackets(first) {
            return Self {
                display_name: unquote(&first[..lt]),
                address: first[lt + 1..gt].trim().to_string(),
            };
        }

        if let (Some(open), true) = (first.find('('), first.ends_with(')')) {
            let name = first[open + 1..first.len() - 1].trim();
            return Self {
                display_name: unquote(name),
                address: first[..open].trim().to_string(),
            };
        }

        Self {
            display_name: String::new(),
            address: first.to_string(),
        }
    }

    /// Split at the last `@` into `(local_part, domain)`.
    ///
    /// Either side may be empty; no `@` at all gives an empty domain.
    pub fn split(&self) -> (&str, &str) {
        match self.address.rfind('@') {
            Some(at) => (&self.address[..at], &self.address[at + 1..]),
            None => (self.address.as_str(), ""),
        }
    }

    /// `"Name <address>"`, or just the address when there is no name.
    pub fn display(&self) -> String {
        if self.display_name.is_empty() {
            self.address.clone()
        } else {
            format!("{} <{}>", self.display_name, self.address)
        }
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// Drop a leading `group-name:` (and trailing `;`) from group syntax.
fn strip_group_name(s: &str) -> &str {
    match top_level_position(s, ':') {
        Some(colon) if !s[..colon].contains(['<', '@']) => {
            s[colon + 1..].trim().trim_end_matches(';').trim()
        }
        _ => s,
    }
}

/// Cut an address list at the first top-level comma.
fn first_mailbox(s: &str) -> &str {
    match top_level_position(s, ',') {
        Some(comma) => s[..comma].trim(),
        None => s,
    }
}

/// Byte position of `target` outside quotes and angle brackets.
fn top_level_position(s: &str, target: char) -> Option<usize> {
    let mut in_quotes = false;
    let mut in_angle = false;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '<' if !in_quotes => in_angle = true,
            '>' if !in_quotes => in_angle = false,
            c if c == target && !in_quotes && !in_angle => return Some(i),
            _ => {}
        }
    }
    None
}

/// Positions of the `<` `>` pair enclosing the addr-spec, if any.
fn angle_brackets(s: &str) -> Option<(usize, usize)> {
    let lt = s.rfind('<')?;
    let gt = s[lt..].find('>')? + lt;
    Some((lt, gt))
}

/// Trim, then remove surrounding double quotes and backslash escapes.
fn unquote(s: &str) -> String {
    let trimmed = s.trim();
    let inner = trimmed
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(trimmed);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> (String, String) {
        let a = EmailAddress::parse(s);
        (a.display_name, a.address)
    }

    #[test]
    fn test_common_forms() {
        assert_eq!(parse("user@example.com"), ("".into(), "user@example.com".into()));
        assert_eq!(parse("<user@example.com>"), ("".into(), "user@example.com".into()));
        assert_eq!(
            parse("User One <user1@example.com>"),
            ("User One".into(), "user1@example.com".into())
        );
    }

    #[test]
    fn test_quoted_name_with_comma_and_escape() {
        assert_eq!(
            parse(r#""Last, First \"Boss\"" <boss@example.com>, other@example.com"#),
            (r#"Last, First "Boss""#.into(), "boss@example.com".into())
        );
    }

    #[test]
    fn test_only_first_of_list() {
        assert_eq!(
            parse("a@one.example, B <b@two.example>"),
            ("".into(), "a@one.example".into())
        );
    }

    #[test]
    fn test_comment_form() {
        assert_eq!(
            parse("winner@lotto.example (Prize Desk)"),
            ("Prize Desk".into(), "winner@lotto.example".into())
        );
    }

    #[test]
    fn test_group_syntax() {
        assert_eq!(
            parse("Promotions: Deals <d@shop.example>, x@shop.example;"),
            ("Deals".into(), "d@shop.example".into())
        );
    }

    #[test]
    fn test_malformed_kept_as_address() {
        assert_eq!(parse("Prize Team <prize>"), ("Prize Team".into(), "prize".into()));
        assert_eq!(parse("undisclosed"), ("".into(), "undisclosed".into()));
        assert_eq!(parse(""), ("".into(), "".into()));
    }

    #[test]
    fn test_split() {
        let addr = EmailAddress::parse("Promo <Deals@Mail.Shop.com>");
        assert_eq!(addr.split(), ("Deals", "Mail.Shop.com"));
        assert_eq!(EmailAddress::parse("a@b@c.example").split(), ("a@b", "c.example"));
        assert_eq!(EmailAddress::parse("makemoney@").split(), ("makemoney", ""));
        assert_eq!(EmailAddress::parse("nobody").split(), ("nobody", ""));
    }

    #[test]
    fn test_display() {
        let addr = EmailAddress::parse("\"Alice\" <alice@example.com>");
        assert_eq!(addr.to_string(), "Alice <alice@example.com>");
        assert_eq!(EmailAddress::parse("bob@example.com").display(), "bob@example.com");
    }
}
