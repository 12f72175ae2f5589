//! # proxrpc CLI Entry Point
//!
//! Inspects and converts proxies and shows how a client would be configured.
//!
//! ## Usage
//!
//! ```bash
//! # Describe a proxy as JSON
//! proxrpc parse 'printer -o:tcp -h 10.0.0.5 -p 4061'
//!
//! # Binary form, hex encoded, and back
//! proxrpc encode 'printer @ Printers'
//! proxrpc decode 077072696e746572...
//!
//! # Effective retry schedule, from config files or --Proxrpc options
//! proxrpc --Proxrpc.Config=client.cfg schedule
//! proxrpc schedule '0 100 -1 500'
//!
//! # Effective properties
//! proxrpc --Proxrpc.Trace.Retry=1 props --prefix Proxrpc.
//! ```
//!
//! `--Proxrpc.*` options may appear anywhere on the command line; they are
//! consumed before the subcommand is parsed.

use anyhow::Result;
use argh::FromArgs;
use proxrpc_cli::commands;
use proxrpc_client::Communicator;

/// Main CLI structure parsed from command-line arguments.
#[derive(FromArgs)]
/// proxrpc - proxy and retry configuration tooling
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

/// Available CLI subcommands.
#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Parse(ParseArgs),
    Encode(EncodeArgs),
    Decode(DecodeArgs),
    Schedule(ScheduleArgs),
    Props(PropsArgs),
}

#[derive(FromArgs)]
#[argh(subcommand, name = "parse")]
/// describe a stringified proxy as JSON
struct ParseArgs {
    /// stringified proxy, or `-` to read it from standard input
    #[argh(positional)]
    proxy: String,

    /// pretty-print the JSON output
    #[argh(switch, short = 'p')]
    pretty: bool,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "encode")]
/// encode a stringified proxy to its binary form (hex)
struct EncodeArgs {
    /// stringified proxy, or `-` to read it from standard input
    #[argh(positional)]
    proxy: String,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "decode")]
/// decode a hex encoded binary proxy to its string form
struct DecodeArgs {
    /// hex encoded proxy, or `-` to read it from standard input
    #[argh(positional)]
    encoded: String,
}

/// Arguments for showing a retry schedule.
///
/// Without an argument the schedule comes from `Proxrpc.RetryIntervals` as
/// loaded from config files and `--Proxrpc` options.
#[derive(FromArgs)]
#[argh(subcommand, name = "schedule")]
/// show the retry schedule
struct ScheduleArgs {
    /// retry intervals in milliseconds, e.g. "0 100 500"
    #[argh(positional)]
    intervals: Option<String>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "props")]
/// print the effective properties
struct PropsArgs {
    /// only print properties starting with this prefix
    #[argh(option, default = "String::new()")]
    prefix: String,

    /// print as --key=value command line options
    #[argh(switch)]
    options: bool,
}

fn parse_cli(args: &[String]) -> std::result::Result<Cli, argh::EarlyExit> {
    let command = args.first().map(String::as_str).unwrap_or("proxrpc");
    let rest: Vec<&str> = args.iter().skip(1).map(String::as_str).collect();
    Cli::from_args(&[command], &rest)
}

fn run(communicator: &Communicator, command: Commands) -> Result<String> {
    match command {
        Commands::Parse(args) => {
            commands::run_parse(communicator, &commands::read_input(&args.proxy)?, args.pretty)
        }
        Commands::Encode(args) => {
            commands::run_encode(communicator, &commands::read_input(&args.proxy)?)
        }
        Commands::Decode(args) => {
            commands::run_decode(communicator, &commands::read_input(&args.encoded)?)
        }
        Commands::Schedule(args) => Ok(commands::run_schedule(communicator, args.intervals.as_deref())),
        Commands::Props(args) => Ok(commands::run_props(communicator, &args.prefix, args.options)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays pipeable. RUST_LOG overrides
    // the default level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<String> = std::env::args().collect();
    let communicator = Communicator::initialize(&mut args)?;

    let cli = match parse_cli(&args) {
        Ok(cli) => cli,
        Err(exit) => match exit.status {
            Ok(()) => {
                println!("{}", exit.output);
                return Ok(());
            }
            Err(()) => {
                eprintln!("{}", exit.output);
                std::process::exit(1);
            }
        },
    };

    let result = run(&communicator, cli.command);
    communicator.destroy();

    println!("{}", result?);
    Ok(())
}
