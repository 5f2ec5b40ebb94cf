mod error;

use clap::{Args, Parser, Subcommand};

use qbridge_api::StaticValue;
use qbridge_client::{connect, ClientConfig, Connection, PluginTransport};

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "qbridge", about = "Evaluate expressions on a q engine session")]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(long, default_value = "qbridge.toml", env = "QBRIDGE_CONFIG")]
    config: String,

    /// Overrides `host` from the configuration.
    #[arg(long, env = "QBRIDGE_HOST")]
    host: Option<String>,

    /// Overrides `port` from the configuration.
    #[arg(long, env = "QBRIDGE_PORT")]
    port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression and print the reply
    Eval(EvalArgs),
    /// Call a function with one argument and print the reply
    Call(CallArgs),
}

#[derive(Args)]
struct EvalArgs {
    expr: String,
    /// Send one-way, without waiting for a reply.
    #[arg(long = "async")]
    one_way: bool,
}

#[derive(Args)]
struct CallArgs {
    expr: String,
    /// Argument as a JSON-encoded value, e.g. '{"Scalar":{"Int64":4}}'.
    #[arg(long)]
    arg: String,
    /// Send one-way, without waiting for a reply.
    #[arg(long = "async")]
    one_way: bool,
}

fn open(cli: &Cli) -> Result<Connection, CliError> {
    tracing::info!(config = %cli.config, "loading configuration");
    let config = ClientConfig::load(&cli.config)?;
    let host = cli.host.clone().unwrap_or(config.host.clone());
    let port = cli.port.unwrap_or(config.port);

    tracing::info!(transport = %config.transport, "loading transport plugin");
    let transport = PluginTransport::load(&config.transport, &config.transport_config_json()?)?;
    Ok(connect(transport, &host, port)?)
}

fn print(value: &StaticValue) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|source| CliError::Json { context: "reply", source })?;
    println!("{json}");
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut conn = open(&cli)?;
    match &cli.command {
        Commands::Eval(args) if args.one_way => conn.evaluate_async(&args.expr)?,
        Commands::Eval(args) => print(&conn.evaluate(&args.expr)?)?,
        Commands::Call(args) => {
            let arg: StaticValue = serde_json::from_str(&args.arg)
                .map_err(|source| CliError::Json { context: "--arg", source })?;
            if args.one_way {
                conn.remote_call_async(&args.expr, &arg)?;
            } else {
                print(&conn.remote_call(&args.expr, &arg)?)?;
            }
        }
    }
    conn.close()?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    if let Err(e) = run(Cli::parse()) {
        tracing::error!(error = %e, "request failed");
        std::process::exit(1);
    }
}
