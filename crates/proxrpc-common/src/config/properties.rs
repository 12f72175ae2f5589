use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;

use super::names;
use crate::protocol::error::{ProxrpcError, Result};

#[derive(Debug, Clone)]
struct PropertyValue {
    value: String,
    used: bool,
}

impl PropertyValue {
    fn new(value: impl Into<String>, used: bool) -> Self {
        Self {
            value: value.into(),
            used,
        }
    }
}

/// Thread-safe property store.
///
/// Every read marks the key as used, so [`Properties::unused_properties`] can
/// report settings that nothing ever looked at (usually typos).
#[derive(Debug, Default)]
pub struct Properties {
    entries: Mutex<BTreeMap<String, PropertyValue>>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds properties from process arguments.
    ///
    /// Seeds `Proxrpc.ProgramName` from `args[0]`, loads config files named by
    /// `--Proxrpc.Config` (or the `PROXRPC_CONFIG` environment variable), then
    /// consumes every `--Proxrpc.*` option. `args` is left holding only the
    /// arguments nobody consumed.
    ///
    /// # Arguments
    ///
    /// * `args` - Process arguments, program name first
    /// * `defaults` - Properties to start from
    ///
    /// # Errors
    ///
    /// [`ProxrpcError::File`] if a config file cannot be read.
    pub fn from_args(args: &mut Vec<String>, defaults: Option<&Properties>) -> Result<Self> {
        Self::from_args_with_env(args, defaults, std::env::var(names::CONFIG_ENV).ok())
    }

    pub(crate) fn from_args_with_env(
        args: &mut Vec<String>,
        defaults: Option<&Properties>,
        env_config: Option<String>,
    ) -> Result<Self> {
        let props = defaults.map(Properties::clone_properties).unwrap_or_default();

        {
            let mut entries = props.lock();
            match entries.get_mut(names::PROGRAM_NAME) {
                Some(existing) => existing.used = true,
                None => {
                    if let Some(first) = args.first() {
                        // Backslashes would read as escapes wherever the name
                        // ends up as a logging source.
                        let name = first.replace('\\', "/");
                        entries.insert(
                            names::PROGRAM_NAME.to_string(),
                            PropertyValue::new(name, true),
                        );
                    }
                }
            }
        }

        let config_option = format!("--{}", names::CONFIG);
        let mut load_files = false;
        let mut rest = Vec::with_capacity(args.len());
        for arg in args.drain(..) {
            if arg.starts_with(&config_option) {
                let line = if arg.contains('=') {
                    arg[2..].to_string()
                } else {
                    format!("{}=1", &arg[2..])
                };
                props.parse_line(&line);
                load_files = true;
            } else {
                rest.push(arg);
            }
        }

        if !load_files {
            load_files = !props.lock().contains_key(names::CONFIG);
        }
        if load_files {
            props.load_config_with_env(env_config)?;
        }

        *args = props.parse_reserved_command_line_options(rest);
        Ok(props)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, PropertyValue>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Value of `key`, or the empty string when unset.
    pub fn get_property(&self, key: &str) -> String {
        self.get_property_with_default(key, "")
    }

    pub fn get_property_with_default(&self, key: &str, default: &str) -> String {
        let mut entries = self.lock();
        match entries.get_mut(key) {
            Some(entry) => {
                entry.used = true;
                entry.value.clone()
            }
            None => default.to_string(),
        }
    }

    pub fn get_property_as_int(&self, key: &str) -> i32 {
        self.get_property_as_int_with_default(key, 0)
    }

    /// Integer value of `key`. A value that is not an integer is reported and
    /// `default` is returned.
    pub fn get_property_as_int_with_default(&self, key: &str, default: i32) -> i32 {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            return default;
        };
        entry.used = true;
        match entry.value.trim().parse::<i32>() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    key,
                    value = %entry.value,
                    default,
                    "numeric property is set to a non-numeric value, using default"
                );
                default
            }
        }
    }

    pub fn get_property_as_list(&self, key: &str) -> Vec<String> {
        self.get_property_as_list_with_default(key, Vec::new())
    }

    /// Splits the value of `key` on commas and whitespace. Single or double
    /// quotes group an element.
    pub fn get_property_as_list_with_default(&self, key: &str, default: Vec<String>) -> Vec<String> {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            return default;
        };
        entry.used = true;
        match split_list(&entry.value) {
            Some(items) if !items.is_empty() => items,
            Some(_) => default,
            None => {
                warn!(key, "mismatched quotes in property value, using default");
                default
            }
        }
    }

    /// Every property whose key starts with `prefix`; all of them when the
    /// prefix is empty.
    pub fn get_properties_for_prefix(&self, prefix: &str) -> BTreeMap<String, String> {
        let mut entries = self.lock();
        entries
            .iter_mut()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, entry)| {
                entry.used = true;
                (key.clone(), entry.value.clone())
            })
            .collect()
    }

    /// Sets `key`, or removes it when `value` is empty.
    ///
    /// Keys under a reserved prefix are checked against the known-name table.
    /// Unknown keys are still stored. A deprecated key that has a replacement
    /// is stored under the replacement.
    pub fn set_property(&self, key: &str, value: &str) {
        let mut key = key.trim().to_string();
        if key.is_empty() {
            return;
        }

        if let Some(table) = names::table_for(&key) {
            match table.iter().find(|prop| names::matches(&key, prop.pattern)) {
                Some(prop) if prop.deprecated => {
                    warn!(key = %key, "deprecated property");
                    if let Some(replacement) = prop.deprecated_by {
                        key = replacement.to_string();
                    }
                }
                Some(_) => {}
                None => warn!(key = %key, "unknown property"),
            }
        }

        let mut entries = self.lock();
        if value.is_empty() {
            entries.remove(&key);
            return;
        }
        let used = entries.get(&key).map(|entry| entry.used).unwrap_or(false);
        entries.insert(key, PropertyValue::new(value, used));
    }

    /// All properties as `--key=value` options.
    pub fn get_command_line_options(&self) -> Vec<String> {
        self.lock()
            .iter()
            .map(|(key, entry)| format!("--{}={}", key, entry.value))
            .collect()
    }

    /// Consumes `--<prefix>.key=value` options and returns the others.
    ///
    /// `--<prefix>.key` without a value sets the key to `1`.
    pub fn parse_command_line_options(&self, prefix: &str, options: Vec<String>) -> Vec<String> {
        let mut pattern = format!("--{}", prefix);
        if !prefix.is_empty() && !prefix.ends_with('.') {
            pattern.push('.');
        }

        options
            .into_iter()
            .filter(|opt| {
                if !opt.starts_with(&pattern) {
                    return true;
                }
                if opt.contains('=') {
                    self.parse_line(&opt[2..]);
                } else {
                    self.parse_line(&format!("{}=1", &opt[2..]));
                }
                false
            })
            .collect()
    }

    /// [`parse_command_line_options`](Self::parse_command_line_options) for
    /// every reserved prefix.
    pub fn parse_reserved_command_line_options(&self, options: Vec<String>) -> Vec<String> {
        names::RESERVED_PREFIXES
            .iter()
            .fold(options, |rest, prefix| self.parse_command_line_options(prefix, rest))
    }

    /// Loads a config file, one [`parse_line`](Self::parse_line) per line.
    ///
    /// # Errors
    ///
    /// [`ProxrpcError::File`] if the file cannot be opened or read.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file_error = |source| ProxrpcError::File {
            path: path.to_path_buf(),
            source,
        };

        let reader = BufReader::new(File::open(path).map_err(file_error)?);
        for line in reader.lines() {
            self.parse_line(&line.map_err(file_error)?);
        }
        Ok(())
    }

    /// Loads the files listed in `Proxrpc.Config`.
    ///
    /// When the property is unset or `1`, the `PROXRPC_CONFIG` environment
    /// variable supplies the list instead. Afterwards `Proxrpc.Config` holds
    /// the list that was actually used.
    pub fn load_config(&self) -> Result<()> {
        self.load_config_with_env(std::env::var(names::CONFIG_ENV).ok())
    }

    pub(crate) fn load_config_with_env(&self, env_config: Option<String>) -> Result<()> {
        let mut value = self.get_property(names::CONFIG);
        if value.is_empty() || value == "1" {
            if let Some(env) = env_config.filter(|env| !env.is_empty()) {
                value = env;
            }
        }

        for file in value
            .split(',')
            .map(str::trim)
            .filter(|file| !file.is_empty() && *file != "1")
        {
            self.load(file)?;
        }

        self.lock()
            .insert(names::CONFIG.to_string(), PropertyValue::new(value, true));
        Ok(())
    }

    /// Parses one config-file line and applies it.
    ///
    /// `#` starts a comment unless written `\#`. The first `=` not written
    /// `\=` separates key from value. The key is trimmed after unescaping
    /// `\ `. Leading and trailing whitespace of the value is dropped unless
    /// escaped with a backslash. Lines without a key are reported and skipped.
    pub fn parse_line(&self, line: &str) {
        let mut chars: Vec<char> = Vec::with_capacity(line.len());
        let mut split = None;
        let mut iter = line.chars().peekable();
        while let Some(c) = iter.next() {
            match c {
                '\\' if matches!(iter.peek(), Some('#') | Some('=')) => {
                    if let Some(escaped) = iter.next() {
                        chars.push(escaped);
                    }
                }
                '#' => break,
                '=' if split.is_none() => {
                    split = Some(chars.len());
                    chars.push(c);
                }
                _ => chars.push(c),
            }
        }

        let split = match split {
            Some(index) if index > 0 => index,
            _ => {
                if chars.iter().any(|c| !c.is_whitespace()) {
                    warn!(line, "invalid config file entry");
                }
                return;
            }
        };

        let key: String = chars[..split].iter().collect::<String>().replace("\\ ", " ");
        let value = unescape_value(&chars[split + 1..]);
        self.set_property(key.trim(), &value);
    }

    /// Properties that were set but never read.
    pub fn unused_properties(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|(_, entry)| !entry.used)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Independent copy; later changes to either side are not shared.
    pub fn clone_properties(&self) -> Properties {
        Properties {
            entries: Mutex::new(self.lock().clone()),
        }
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Trims unescaped whitespace from both ends of a value and unescapes `\ `.
fn unescape_value(value: &[char]) -> String {
    let mut leading = String::new();
    let mut start = 0;
    while start < value.len() {
        match value[start] {
            '\\' if value.get(start + 1).copied().is_some_and(is_blank) => {
                leading.push(value[start + 1]);
                start += 2;
            }
            c if is_blank(c) => start += 1,
            _ => break,
        }
    }

    let mut trailing = String::new();
    let mut end = value.len();
    while end > start {
        let c = value[end - 1];
        if !is_blank(c) {
            break;
        }
        if end - 1 > start && value[end - 2] == '\\' {
            trailing.insert(0, c);
            end -= 2;
        } else {
            end -= 1;
        }
    }

    let middle: String = value[start..end].iter().collect();
    format!("{}{}{}", leading, middle.replace("\\ ", " "), trailing)
}

/// Splits on commas and whitespace outside quotes. `None` on an unterminated
/// quote.
fn split_list(value: &str) -> Option<Vec<String>> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in value.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == ',' || is_blank(c) => {
                if !current.is_empty() {
                    items.push(std::mem::take(&mut current));
                }
            }
            None => current.push(c),
        }
    }

    if quote.is_some() {
        return None;
    }
    if !current.is_empty() {
        items.push(current);
    }
    Some(items)
}
