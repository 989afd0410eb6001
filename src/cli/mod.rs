pub mod commands;
pub mod formatter;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "seqpick",
    version,
    about = "Representative protein sequence selection",
    long_about = "seqpick reduces a protein FASTA file to a bounded, diverse and representative \
                  subset. CD-HIT removes near-duplicates, then a lazy greedy facility-location \
                  selection trades coverage of the full set against redundancy within the subset."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Number of threads to use (0 = all available)
    #[arg(short = 'j', long, default_value = "0", global = true)]
    pub threads: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reduce a FASTA file to a representative subset
    Reduce(commands::reduce::ReduceArgs),

    /// Print or write the configuration
    Config(commands::config::ConfigArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["seqpick", "reduce", "in.fasta", "-vv", "-j", "4"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.threads, 4);
        assert!(matches!(cli.command, Commands::Reduce(_)));
    }
}
