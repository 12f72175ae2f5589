//! Object identities.
//!
//! An [`Identity`] names a remote object: a `name` that must be non-empty for
//! any real object, and an optional `category`. The stringified form is
//! `category/name` (or just `name` when the category is empty) with `/`,
//! backslashes, quotes and control characters escaped by a backslash.
//!
//! An identity with an empty name is the null-proxy sentinel on the wire.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol::error::{ProxrpcError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub category: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
        }
    }

    /// Identity with an empty category.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, "")
    }

    /// True for the null-proxy sentinel (empty name).
    pub fn is_null(&self) -> bool {
        self.name.is_empty()
    }

    /// Parses the stringified form produced by `Display`.
    ///
    /// At most one unescaped `/` is allowed; it separates category from name.
    ///
    /// # Errors
    ///
    /// Returns [`ProxrpcError::Parse`] if more than one unescaped `/` is present
    /// or an escape sequence is malformed.
    pub fn parse(s: &str) -> Result<Self> {
        let slash = find_unescaped(s, '/', 0);

        let (category, name) = match slash {
            None => ("", s),
            Some(pos) => {
                if find_unescaped(s, '/', pos + 1).is_some() {
                    return Err(ProxrpcError::parse(format!(
                        "invalid identity `{}`: more than one unescaped `/`",
                        s
                    )));
                }
                (&s[..pos], &s[pos + 1..])
            }
        };

        Ok(Self {
            name: unescape(name)?,
            category: unescape(category)?,
        })
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.category.is_empty() {
            f.write_str(&escape(&self.name, "/"))
        } else {
            write!(
                f,
                "{}/{}",
                escape(&self.category, "/"),
                escape(&self.name, "/")
            )
        }
    }
}

/// Escapes backslashes, quotes, control characters and every character in
/// `special` with a leading backslash.
pub fn escape(s: &str, special: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if special.contains(c) => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\u{{{:x}}}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Reverses [`escape`].
///
/// # Errors
///
/// Fails on a trailing lone backslash or a malformed `\u{..}` sequence.
pub fn unescape(s: &str) -> Result<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                if chars.next() != Some('{') {
                    return Err(ProxrpcError::parse(format!("invalid escape in `{}`", s)));
                }
                let hex: String = chars.by_ref().take_while(|c| *c != '}').collect();
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| ProxrpcError::parse(format!("invalid escape in `{}`", s)))?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {
                return Err(ProxrpcError::parse(format!(
                    "trailing backslash in `{}`",
                    s
                )))
            }
        }
    }

    Ok(out)
}

/// Byte offset of the first `target` at or after `from` that is not preceded
/// by an escaping backslash.
pub(crate) fn find_unescaped(s: &str, target: char, from: usize) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if i < from {
            escaped = !escaped && c == '\\';
            continue;
        }
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == target {
            return Some(i);
        }
    }
    None
}
