use crate::cli::formatter::print_success;
use crate::core::config::{discover_config_path, load_or_default, save_config};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Write the configuration here instead of printing it
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Configuration file to start from (default: discovered or built-in)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    let source = discover_config_path(args.config.as_deref());
    let config = load_or_default(args.config.as_deref())?;

    match args.output {
        Some(path) => {
            save_config(&path, &config)?;
            print_success(&format!("Configuration written to {}", path.display()));
        }
        None => {
            if let Some(source) = source {
                println!("# loaded from {}", source.display());
            }
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }
    Ok(())
}
