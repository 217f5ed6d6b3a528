//! Actions configuration checker
//!
//! Loads an actions file the same way the service does at startup and
//! reports what it found. Exits non-zero when the configuration would stop
//! the service from booting.
//!
//! Usage:
//!   cargo run --features cli --bin jbi-check -- --env nonprod
//!   cargo run --features cli --bin jbi-check -- --config config/config.nonprod.yaml

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use jbi_actions::config::{CONFIG_DIR_ENV, DEFAULT_CONFIG_DIR, DEFAULT_ENV, ENV_NAME_ENV};
use jbi_actions::{load_actions_file, Actions, ActionsConfigLoader, HandlerCatalog};

/// Validate a JBI actions configuration file
#[derive(Parser, Debug)]
#[command(name = "jbi-check")]
#[command(about = "Validate a JBI actions configuration file")]
struct Args {
    /// Explicit path to an actions file (overrides --dir/--env)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Configuration directory
    #[arg(long, env = CONFIG_DIR_ENV, default_value = DEFAULT_CONFIG_DIR)]
    dir: PathBuf,

    /// Environment name, selects config.<env>.yaml
    #[arg(long, env = ENV_NAME_ENV, default_value = DEFAULT_ENV)]
    env: String,

    /// Treat unset contacts as errors
    #[arg(long)]
    strict: bool,
}

fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let catalog = HandlerCatalog::with_builtins();

    let result = match &args.config {
        Some(path) => load_actions_file(path, &catalog),
        None => ActionsConfigLoader::new(&args.dir, &args.env).load(&catalog),
    };

    match result {
        Ok(actions) => report(&actions, args.strict),
        Err(err) => {
            eprintln!("error: {}", err);
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn report(actions: &Actions, strict: bool) -> ExitCode {
    println!("{} actions configured", actions.len());
    for action in actions {
        println!(
            "  {:<24} {:<8} {}",
            action.tag(),
            if action.enabled() { "enabled" } else { "disabled" },
            action.module()
        );
    }

    for diagnostic in actions.diagnostics() {
        println!("warning: {}", diagnostic);
    }

    if strict && !actions.diagnostics().is_empty() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
