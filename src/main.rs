use clap::Parser;
use colored::*;
use seqpick::cli::{Cli, Commands};
use seqpick::utils::parallel::configure_thread_pool;
use seqpick::SeqpickError;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // SEQPICK_LOG wins over -v
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = std::env::var("SEQPICK_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<SeqpickError>() {
            Some(err) => {
                eprintln!(
                    "{} {}",
                    format!("Error [{}]:", err.class()).as_str().red().bold(),
                    err
                );
                process::exit(err.exit_code());
            }
            None => {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
                process::exit(1);
            }
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Err(e) = configure_thread_pool(cli.threads) {
        tracing::warn!("Could not configure thread pool: {}", e);
    }
    tracing::debug!("Using {} threads", rayon::current_num_threads());

    match cli.command {
        Commands::Reduce(mut args) => {
            args.threads = cli.threads;
            seqpick::cli::commands::reduce::run(args)
        }
        Commands::Config(args) => seqpick::cli::commands::config::run(args),
    }
}
