//! `cluster-mgmt`: inspect and change cluster membership over HTTP.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use cluster_mgmt_cli::{Command, ManagementClient, execute};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Host of the management endpoint
    #[arg(
        long,
        global = true,
        default_value = "127.0.0.1",
        env = "CLUSTER_MGMT_HOSTNAME"
    )]
    hostname: String,

    /// Port of the management endpoint
    #[arg(long, global = true, default_value_t = 19999, env = "CLUSTER_MGMT_PORT")]
    port: u16,

    /// Path prefix the management routes are mounted under
    #[arg(
        long,
        global = true,
        default_value = "/cluster",
        env = "CLUSTER_MGMT_PATH_PREFIX"
    )]
    path_prefix: String,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .init();

    let args = Args::parse();
    debug!("running {:?}", args.command);

    let result = match ManagementClient::new(&args.hostname, args.port, &args.path_prefix) {
        Ok(client) => execute(&client, &args.command).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(output) => {
            print!("{output}");
            let _ = std::io::stdout().flush();
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
