//! Known property names.
//!
//! Every property under a reserved prefix is checked against this table when
//! it is set. Patterns may contain `*`, which matches any run of characters.

/// Prefixes owned by proxrpc. `--<prefix>.*` command-line options are consumed
/// by [`Properties::parse_reserved_command_line_options`](super::Properties::parse_reserved_command_line_options).
pub const RESERVED_PREFIXES: &[&str] = &["Proxrpc"];

pub const CONFIG: &str = "Proxrpc.Config";
pub const PROGRAM_NAME: &str = "Proxrpc.ProgramName";
pub const RETRY_INTERVALS: &str = "Proxrpc.RetryIntervals";
pub const TRACE_RETRY: &str = "Proxrpc.Trace.Retry";
pub const TRACE_LOCATOR: &str = "Proxrpc.Trace.Locator";
pub const DEFAULT_LOCATOR: &str = "Proxrpc.Default.Locator";
pub const LOCATOR_CACHE_TIMEOUT: &str = "Proxrpc.Default.LocatorCacheTimeout";

/// Environment variable naming config files when `Proxrpc.Config` is unset.
pub const CONFIG_ENV: &str = "PROXRPC_CONFIG";

#[derive(Debug, Clone, Copy)]
pub struct PropertyName {
    pub pattern: &'static str,
    pub deprecated: bool,
    pub deprecated_by: Option<&'static str>,
}

const fn name(pattern: &'static str) -> PropertyName {
    PropertyName {
        pattern,
        deprecated: false,
        deprecated_by: None,
    }
}

const fn renamed(pattern: &'static str, by: &'static str) -> PropertyName {
    PropertyName {
        pattern,
        deprecated: true,
        deprecated_by: Some(by),
    }
}

pub const PROXRPC_PROPERTIES: &[PropertyName] = &[
    name(CONFIG),
    name(PROGRAM_NAME),
    name(RETRY_INTERVALS),
    name(TRACE_RETRY),
    name(TRACE_LOCATOR),
    renamed("Proxrpc.Trace.Location", TRACE_LOCATOR),
    name(DEFAULT_LOCATOR),
    name("Proxrpc.Default.Locator.*"),
    name(LOCATOR_CACHE_TIMEOUT),
];

/// Table for the reserved prefix of `key`, if any.
pub fn table_for(key: &str) -> Option<&'static [PropertyName]> {
    let (prefix, _) = key.split_once('.')?;
    (prefix == "Proxrpc").then_some(PROXRPC_PROPERTIES)
}

/// Glob match where `*` matches any (possibly empty) run of characters.
pub fn matches(key: &str, pattern: &str) -> bool {
    match pattern.split_once('*') {
        None => key == pattern,
        Some((head, tail)) => {
            let Some(rest) = key.strip_prefix(head) else {
                return false;
            };
            (0..=rest.len())
                .filter(|i| rest.is_char_boundary(*i))
                .any(|i| matches(&rest[i..], tail))
        }
    }
}
