//! Stringified proxy syntax.
//!
//! ```text
//! <identity> [-f <facet>] [-t|-o|-O|-d|-D] [-s] [-e X.Y] [-p X.Y]
//!            ( :<endpoint> (:<endpoint>)* | @ <adapter-id> )?
//! ```
//!
//! Identity, facet and adapter id may be double-quoted; quoting is required
//! when they contain whitespace, `:` or `@`. A proxy with neither endpoints nor
//! an adapter id is a well-known object resolved by identity.

use std::fmt;

use crate::protocol::endpoint::Endpoint;
use crate::protocol::error::{ProxrpcError, Result};
use crate::protocol::identity::{escape, unescape, Identity};
use crate::protocol::reference::{
    EncodingVersion, InvocationMode, ProtocolVersion, Reference, Target,
};

const DELIMITERS: &[char] = &[' ', '\t', '\r', '\n'];

fn is_delim(c: char) -> bool {
    DELIMITERS.contains(&c)
}

/// Parses a stringified proxy. Empty or whitespace-only input is the null
/// proxy and yields `Ok(None)`.
pub fn parse_reference(input: &str) -> Result<Option<Reference>> {
    let s = input.trim_matches(DELIMITERS);
    if s.is_empty() {
        return Ok(None);
    }

    let mut cursor = Cursor { s, pos: 0 };

    let identity_str = cursor
        .argument(&[':', '@'])?
        .ok_or_else(|| ProxrpcError::parse(format!("no identity in proxy `{}`", s)))?;
    let identity = Identity::parse(&identity_str)?;
    if identity.is_null() {
        return Err(ProxrpcError::parse(format!("empty identity name in proxy `{}`", s)));
    }

    let mut reference = Reference::well_known(identity);

    loop {
        cursor.skip_delims();
        match cursor.peek() {
            None | Some(':') | Some('@') => break,
            Some(_) => {}
        }

        let option = cursor.token();
        let mut flags = option.chars();
        let flag = match (flags.next(), flags.next(), flags.next()) {
            (Some('-'), Some(flag), None) => flag,
            _ => {
                return Err(ProxrpcError::parse(format!(
                    "expected a proxy option but found `{}` in `{}`",
                    option, s
                )))
            }
        };

        cursor.skip_delims();
        let argument = match cursor.peek() {
            Some('-') | Some(':') | Some('@') | None => None,
            Some(_) => cursor.argument(&[':', '@'])?,
        };

        match flag {
            'f' | 'e' | 'p' => {
                let argument = argument.ok_or_else(|| {
                    ProxrpcError::parse(format!(
                        "no argument provided for -{} option in `{}`",
                        flag, s
                    ))
                })?;
                match flag {
                    'f' => reference.facet = unescape(&argument)?,
                    'e' => reference.encoding = argument.parse::<EncodingVersion>()?,
                    _ => reference.protocol = argument.parse::<ProtocolVersion>()?,
                }
            }
            's' | 't' | 'o' | 'O' | 'd' | 'D' => {
                if let Some(argument) = argument {
                    return Err(ProxrpcError::parse(format!(
                        "unexpected argument `{}` for -{} option in `{}`",
                        argument, flag, s
                    )));
                }
                match InvocationMode::from_flag(flag) {
                    Some(mode) => reference.mode = mode,
                    None => reference.secure = true,
                }
            }
            other => {
                return Err(ProxrpcError::parse(format!(
                    "unknown proxy option -{} in `{}`",
                    other, s
                )))
            }
        }
    }

    match cursor.peek() {
        None => Ok(Some(reference)),
        Some(':') => {
            let endpoints = split_endpoints(&s[cursor.pos + 1..])?
                .iter()
                .map(|e| e.parse::<Endpoint>())
                .collect::<Result<Vec<_>>>()?;
            if endpoints.is_empty() {
                return Err(ProxrpcError::parse(format!("empty endpoint list in `{}`", s)));
            }
            reference.target = Target::Direct { endpoints };
            Ok(Some(reference))
        }
        Some(_) => {
            cursor.pos += 1;
            cursor.skip_delims();
            let adapter = cursor
                .argument(&[])?
                .ok_or_else(|| ProxrpcError::parse(format!("missing adapter id in `{}`", s)))?;
            cursor.skip_delims();
            if cursor.peek().is_some() {
                return Err(ProxrpcError::parse(format!(
                    "unexpected text after adapter id in `{}`",
                    s
                )));
            }
            let adapter = unescape(&adapter)?;
            if adapter.is_empty() {
                return Err(ProxrpcError::parse(format!("empty adapter id in `{}`", s)));
            }
            reference.target = Target::Indirect {
                adapter_id: Some(adapter),
                cached_endpoints: None,
            };
            Ok(Some(reference))
        }
    }
}

struct Cursor<'a> {
    s: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.s[self.pos..].chars().next()
    }

    fn skip_delims(&mut self) {
        let rest = &self.s[self.pos..];
        self.pos += rest.len() - rest.trim_start_matches(DELIMITERS).len();
    }

    /// Reads up to the next delimiter, `:` or `@`.
    fn token(&mut self) -> &'a str {
        let s: &'a str = self.s;
        let rest = &s[self.pos..];
        let len = rest
            .find(|c: char| is_delim(c) || c == ':' || c == '@')
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// Reads a possibly quoted argument. Unquoted arguments also stop at any of
    /// `stops`. Returns the raw, still escaped, text.
    fn argument(&mut self, stops: &[char]) -> Result<Option<String>> {
        let rest = &self.s[self.pos..];
        if rest.is_empty() {
            return Ok(None);
        }

        if let Some(quoted) = rest.strip_prefix('"') {
            let end = crate::protocol::identity::find_unescaped(quoted, '"', 0)
                .ok_or_else(|| ProxrpcError::parse(format!("mismatched quotes in `{}`", self.s)))?;
            self.pos += end + 2;
            match self.peek() {
                None => {}
                Some(c) if is_delim(c) || stops.contains(&c) => {}
                Some(c) => {
                    return Err(ProxrpcError::parse(format!(
                        "unexpected `{}` after quoted argument in `{}`",
                        c, self.s
                    )))
                }
            }
            return Ok(Some(quoted[..end].to_string()));
        }

        let len = rest
            .find(|c: char| is_delim(c) || stops.contains(&c))
            .unwrap_or(rest.len());
        self.pos += len;
        Ok(Some(rest[..len].to_string()))
    }
}

/// Splits an endpoint list on `:` outside double quotes.
fn split_endpoints(s: &str) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;

    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ':' if !in_quotes => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if in_quotes {
        return Err(ProxrpcError::parse(format!("mismatched quotes in endpoints `{}`", s)));
    }
    parts.push(&s[start..]);

    Ok(parts
        .into_iter()
        .map(|p| p.trim_matches(DELIMITERS))
        .filter(|p| !p.is_empty())
        .collect())
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty() || s.contains(|c: char| is_delim(c) || c == ':' || c == '@' || c == '-' && s.starts_with('-'))
}

fn write_argument(f: &mut fmt::Formatter<'_>, escaped: &str) -> fmt::Result {
    if needs_quotes(escaped) {
        write!(f, "\"{}\"", escaped)
    } else {
        f.write_str(escaped)
    }
}

impl fmt::Display for Reference {
    /// Prints the stringified proxy. Cached endpoints are not printed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_argument(f, &self.identity.to_string())?;

        if !self.facet.is_empty() {
            f.write_str(" -f ")?;
            write_argument(f, &escape(&self.facet, ""))?;
        }

        write!(f, " {}", self.mode.flag())?;

        if self.secure {
            f.write_str(" -s")?;
        }
        if self.encoding != EncodingVersion::default() {
            write!(f, " -e {}", self.encoding)?;
        }
        if self.protocol != ProtocolVersion::default() {
            write!(f, " -p {}", self.protocol)?;
        }

        match &self.target {
            Target::Direct { endpoints } => {
                for endpoint in endpoints {
                    write!(f, ":{}", endpoint)?;
                }
            }
            Target::Indirect {
                adapter_id: Some(adapter),
                ..
            } => {
                f.write_str(" @ ")?;
                write_argument(f, &escape(adapter, ""))?;
            }
            Target::Indirect { adapter_id: None, .. } => {}
        }

        Ok(())
    }
}
