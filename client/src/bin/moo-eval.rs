//! Evaluate code fragments on a MOO server and print the decoded replies.

use clap::Parser;
use moo_client::{Config, Reply, Session};
use protocol_moo::ToLiteral;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "moo-eval")]
#[command(about = "Send framed commands to a MOO server and print the results")]
struct Args {
    /// Config file path (optional, CLI args override config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server address (host:port)
    #[arg(short, long)]
    address: Option<String>,

    /// Per-command timeout in milliseconds
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// Log every line sent and received
    #[arg(short, long)]
    verbose: bool,

    /// Print default configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Code fragments, each sent as one command
    code: Vec<String>,
}

fn main() {
    let args = Args::parse();

    if args.print_config {
        print_default_config();
        return;
    }

    let mut config = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    if let Some(address) = args.address {
        config.session.address = address;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.session.command_timeout_ms = Some(timeout_ms);
    }
    if args.verbose {
        config.session.verbose = true;
    }

    moo_client::logging::init(&config.logging);

    let mut session = match Session::connect(&config.session) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(address = %config.session.address, error = %e, "connect failed");
            std::process::exit(1);
        }
    };

    for code in &args.code {
        match session.command(code) {
            Ok(Reply::Empty) => println!("(no output)"),
            Ok(Reply::Value(value)) => println!("{}", value.to_literal()),
            Ok(Reply::Lines(lines)) => {
                for line in lines {
                    println!("{line}");
                }
            }
            Err(e) => {
                tracing::error!(command = %code, error = %e, "command failed");
                std::process::exit(1);
            }
        }
    }

    session.close();
}

fn print_default_config() {
    let config = r#"# moo-eval configuration

[session]
# Server address
address = "127.0.0.1:7777"

# Arguments for the `connect` handshake line
connect_args = "wizard"

# Sentinel lines bracketing each command's output
prefix = "-=-=- begin output -=-=-"
suffix = "-=-=- end output -=-=-"

# Log every line sent and received at debug level
verbose = false

# Connection timeout in milliseconds
connect_timeout_ms = 5000

# Per-command deadline in milliseconds (unset: wait forever)
# command_timeout_ms = 30000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty, json, compact
format = "pretty"
"#;
    print!("{}", config);
}
