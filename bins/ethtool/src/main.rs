//! ethtool: query and control network driver and hardware settings.
//!
//! Commands go over the generic netlink `ethtool` family when the kernel
//! supports every request they need, and over the `SIOCETHTOOL` ioctl
//! otherwise.

mod commands;
mod exit;
mod output;

use std::io;

use clap::Parser;
use nicctl::command::{CommandKind, parse_invocation};
use nicctl::negotiate::DeviceHandle;

use commands::Plan;
use exit::Failure;
use output::{OutputFormat, print_help};

#[derive(Parser)]
#[command(
    name = "ethtool",
    version,
    about = "Query or control network driver and hardware settings",
    disable_help_flag = true
)]
struct Cli {
    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    /// Never use netlink; talk to the driver through the ioctl only.
    #[arg(long)]
    disable_netlink: bool,

    /// Log verbosity: 1 info, 2 debug, 3 and above trace.
    #[arg(long, value_name = "N", default_value_t = 0)]
    debug: u8,

    /// The command, its device and its arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let level = match cli.debug {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .init();

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(failure) => {
            if !failure.message.is_empty() {
                eprintln!("{}", failure.message);
            }
            if failure.code == exit::USAGE {
                eprintln!("For more information run ethtool -h");
            }
            failure.code
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<(), Failure> {
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let invocation = parse_invocation(&cli.args).map_err(|e| Failure::usage(&e))?;
    let plan = Plan::parse(&invocation).map_err(|e| Failure::usage(&e))?;
    tracing::debug!(command = invocation.desc.name(), ?plan, "parsed command line");

    if let Plan::Help = plan {
        return print_help(&mut io::stdout().lock())
            .map_err(|e| Failure::new(exit::USAGE, format!("Cannot write output: {e}")));
    }

    let mut handle = DeviceHandle::open(invocation.device.as_deref(), cli.disable_netlink)
        .await
        .map_err(|e| {
            let code = if invocation.desc.kind == CommandKind::Monitor {
                exit::MONITOR
            } else {
                exit::SOCKET
            };
            Failure::from_error(code, "Cannot get control socket", &e)
        })?;

    commands::run(plan, &mut handle, invocation.desc, format).await
}
