// Copyright 2025 proxrpc Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{anyhow, bail, Context, Result};
use proxrpc_client::{Communicator, Proxy, RetrySchedule};
use proxrpc_common::{InputStream, InvocationMode, OutputStream, Reference, Target};
use serde::Serialize;

/// JSON description of a parsed proxy.
#[derive(Debug, Serialize)]
pub struct ProxyDescription {
    pub identity: String,
    pub name: String,
    pub category: String,
    pub facet: String,
    pub mode: InvocationMode,
    pub secure: bool,
    pub protocol: String,
    pub encoding: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adapter_id: Option<String>,
    pub endpoints: Vec<String>,
    /// Canonical string form.
    pub normalized: String,
}

impl ProxyDescription {
    pub fn new(reference: &Reference) -> Self {
        let kind = match &reference.target {
            Target::Direct { .. } => "direct",
            Target::Indirect {
                adapter_id: Some(_),
                ..
            } => "adapter",
            Target::Indirect { .. } => "well-known",
        };

        Self {
            identity: reference.identity.to_string(),
            name: reference.identity.name.clone(),
            category: reference.identity.category.clone(),
            facet: reference.facet.clone(),
            mode: reference.mode,
            secure: reference.secure,
            protocol: reference.protocol.to_string(),
            encoding: reference.encoding.to_string(),
            kind,
            adapter_id: reference.adapter_id().map(str::to_string),
            endpoints: reference.endpoints().iter().map(ToString::to_string).collect(),
            normalized: reference.to_string(),
        }
    }
}

fn parse_proxy(communicator: &Communicator, proxy: &str) -> Result<Option<Proxy>> {
    communicator
        .string_to_proxy(proxy)
        .with_context(|| format!("cannot parse proxy `{}`", proxy))
}

/// Executes the `parse` subcommand.
///
/// # Returns
///
/// The JSON description, compact or pretty-printed, or `null` for the null
/// proxy.
pub fn run_parse(communicator: &Communicator, proxy: &str, pretty: bool) -> Result<String> {
    let description = parse_proxy(communicator, proxy)?.map(|p| ProxyDescription::new(p.reference()));
    let json = if pretty {
        serde_json::to_string_pretty(&description)?
    } else {
        serde_json::to_string(&description)?
    };
    Ok(json)
}

/// Executes the `encode` subcommand: stringified proxy to hex encoded binary
/// form.
pub fn run_encode(communicator: &Communicator, proxy: &str) -> Result<String> {
    let proxy = parse_proxy(communicator, proxy)?;
    let mut out = OutputStream::new();
    communicator
        .proxy_factory()
        .proxy_to_stream(proxy.as_ref(), &mut out)?;
    Ok(hex::encode(out.as_bytes()))
}

/// Executes the `decode` subcommand: hex encoded binary proxy back to its
/// string form. The null proxy decodes to an empty string.
///
/// # Errors
///
/// Returns an error if the input is not hex, is not a valid proxy, or has
/// bytes left over after the proxy.
pub fn run_decode(communicator: &Communicator, encoded: &str) -> Result<String> {
    let bytes = hex::decode(encoded.trim()).context("input is not valid hex")?;
    let mut input = InputStream::new(&bytes);
    let proxy = communicator
        .proxy_factory()
        .stream_to_proxy(&mut input)
        .context("cannot decode proxy")?;

    if !input.is_empty() {
        bail!("{} trailing byte(s) after the proxy", input.remaining().len());
    }
    Ok(communicator.proxy_to_string(proxy.as_ref()))
}

/// Format a delay in milliseconds for display.
fn format_delay_ms(ms: u64) -> String {
    if ms == 0 {
        "immediately".to_string()
    } else if ms < 1000 {
        format!("after {}ms", ms)
    } else if ms % 1000 == 0 {
        format!("after {}s", ms / 1000)
    } else {
        format!("after {:.1}s", ms as f64 / 1000.0)
    }
}

/// Executes the `schedule` subcommand.
///
/// Shows the schedule given on the command line, or the one the communicator
/// was configured with.
pub fn run_schedule(communicator: &Communicator, intervals: Option<&str>) -> String {
    let schedule = match intervals {
        Some(intervals) => RetrySchedule::parse(intervals),
        None => communicator.proxy_factory().retry_schedule().clone(),
    };

    if schedule.is_empty() {
        return "retries disabled".to_string();
    }

    let mut lines = vec![format!(
        "{} retr{} ({})",
        schedule.len(),
        if schedule.len() == 1 { "y" } else { "ies" },
        schedule
    )];
    for (i, ms) in schedule.intervals().iter().enumerate() {
        lines.push(format!("  retry {}: {}", i + 1, format_delay_ms(*ms)));
    }
    let total: u64 = schedule.intervals().iter().sum();
    lines.push(format!("  worst case backoff: {}ms", total));
    lines.join("\n")
}

/// Executes the `props` subcommand.
///
/// Lists the properties under `prefix` (all of them when empty) as
/// `key=value` lines, or as `--key=value` options when `as_options` is set.
pub fn run_props(communicator: &Communicator, prefix: &str, as_options: bool) -> String {
    let props = communicator.properties().get_properties_for_prefix(prefix);
    props
        .iter()
        .map(|(key, value)| {
            if as_options {
                format!("--{}={}", key, value)
            } else {
                format!("{}={}", key, value)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reads the single value for a subcommand from an argument or, for `-`,
/// from standard input.
pub fn read_input(arg: &str) -> Result<String> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut buf = String::new();
    std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf)
        .map_err(|e| anyhow!("cannot read standard input: {}", e))?;
    Ok(buf.trim_end_matches(['\n', '\r']).to_string())
}
