//! proxrpc configuration properties
//!
//! A flat key/value store fed from config files, command-line options and
//! code. Keys under the reserved `Proxrpc.` prefix are checked against the
//! table in [`names`]; everything else is application-defined.
//!
//! # Sources
//!
//! - **Config files**: `key = value` lines, see [`Properties::parse_line`]
//! - **Command line**: `--Proxrpc.Trace.Retry=1`, see
//!   [`Properties::parse_command_line_options`]
//! - **Code**: [`Properties::set_property`]
//!
//! # Example
//!
//! ```
//! use proxrpc_common::config::Properties;
//!
//! let mut args: Vec<String> = ["client", "--Proxrpc.RetryIntervals=0 100", "serve"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//!
//! let props = Properties::from_args(&mut args, None).unwrap();
//! assert_eq!(props.get_property("Proxrpc.RetryIntervals"), "0 100");
//! assert_eq!(props.get_property("Proxrpc.ProgramName"), "client");
//! assert_eq!(args, vec!["client", "serve"]);
//! ```

pub mod names;
mod properties;


pub use properties::Properties;
