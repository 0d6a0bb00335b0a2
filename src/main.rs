use clap::Parser;
use poultry_ledger::args::{Args, Command};
use poultry_ledger::{commands, Config, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().poultry_home().path();
    let config = Config::load(home).await?;

    // The pool is closed whether or not the command succeeded.
    let result = run(config.clone(), args.command().clone()).await;
    config.close().await;
    result
}

async fn run(config: Config, command: Command) -> Result<()> {
    let _: () = match command {
        Command::Production(args) => commands::add_production(config, args).await?.print(),
        Command::Price(args) => commands::set_price(config, args).await?.print(),
        Command::Sales(args) => commands::add_sales(config, args).await?.print(),
        Command::Chart(args) => commands::chart(config, args).await?.print(),
        Command::List(args) => {
            let out = commands::list(config, args).await?;
            if let Some(rows) = out.structure() {
                println!("{rows}");
            }
            out.print()
        }
        Command::Export(args) => commands::export(config, args).await?.print(),
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        // RUST_LOG exists; use it.
        Some(_) => EnvFilter::from_default_env(),
        // RUST_LOG does not exist; use default log level for the library and binary only.
        None => EnvFilter::new(format!(
            "{}={},{}={}",
            env!("CARGO_PKG_NAME").replace('-', "_"),
            level,
            env!("CARGO_CRATE_NAME"),
            level
        )),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
