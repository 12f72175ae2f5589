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

//! # proxrpc CLI
//!
//! Operator tooling for proxrpc proxies and client configuration.
//!
//! ## Architecture
//!
//! The binary builds a [`Communicator`](proxrpc_client::Communicator) from
//! the process arguments first, so `--Proxrpc.*` options and config files
//! apply to every command. What is left is parsed with `argh` and dispatched
//! to the handlers in [`commands`], which return their output as text.
//!
//! ## Key Commands
//!
//! - `proxrpc parse`: Describe a stringified proxy as JSON
//! - `proxrpc encode` / `proxrpc decode`: Convert between string and hex
//!   encoded binary proxies
//! - `proxrpc schedule`: Show the effective retry schedule
//! - `proxrpc props`: Dump the effective properties

pub mod commands;

#[cfg(test)]
mod tests;
