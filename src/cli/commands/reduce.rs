use crate::cli::formatter::{format_fraction, info_box, print_success, print_tip, print_warning};
use crate::core::config::{load_or_default, Convergence, RedundancyScale};
use crate::core::pipeline::{PipelineReport, RunMode};
use crate::core::reducer::Reducer;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct ReduceArgs {
    /// Input protein FASTA (plain or .gz)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output FASTA (default: <stem>_reduced.<ext> next to the input)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Maximum number of representatives (default: no limit)
    #[arg(short = 'm', long)]
    pub maxsize: Option<usize>,

    /// Weight of coverage against redundancy, 0.0-1.0 (default: 0.5)
    #[arg(short = 'w', long)]
    pub mixture_weight: Option<f64>,

    /// Only run CD-HIT
    #[arg(long, conflicts_with = "repset_only")]
    pub cdhit_only: bool,

    /// Skip CD-HIT and select over the whole input
    #[arg(long)]
    pub repset_only: bool,

    /// CD-HIT identity threshold (default: 0.9)
    #[arg(short = 's', long)]
    pub similarity: Option<f64>,

    /// Extra CD-HIT arguments, e.g. "-M 4000 -T 8"
    #[arg(long, allow_hyphen_values = true, value_name = "ARGS")]
    pub cdhit_args: Option<String>,

    /// Precomputed esl-alipid identity table (skips MAFFT and esl-alipid)
    #[arg(long, value_name = "FILE")]
    pub identities: Option<PathBuf>,

    /// Redundancy penalty scaling
    #[arg(long, value_enum)]
    pub redundancy: Option<RedundancyScale>,

    /// Accept near-best candidates early (1.0 = exact greedy)
    #[arg(long, value_name = "RATIO")]
    pub approx_ratio: Option<f64>,

    /// Stop once no candidate has a positive gain
    #[arg(long)]
    pub stop_on_zero_gain: bool,

    /// Timeout for each external tool run, in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Write a JSON run report
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Configuration file
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Number of threads (passed from global)
    #[arg(skip)]
    pub threads: usize,
}

pub fn run(args: ReduceArgs) -> anyhow::Result<()> {
    let mut config = load_or_default(args.config.as_deref())?;
    if args.threads > 0 {
        config.performance.threads = args.threads;
    }
    let mode = RunMode::from_flags(args.cdhit_only, args.repset_only)?;

    let mut reducer = Reducer::new(config)
        .with_mode(mode)
        .with_identities(args.identities.clone())
        .with_report(args.report.clone())
        .with_silent(args.quiet);
    if let Some(maxsize) = args.maxsize {
        reducer = reducer.with_maxsize(Some(maxsize));
    }
    if let Some(weight) = args.mixture_weight {
        reducer = reducer.with_mixture_weight(weight);
    }
    if let Some(similarity) = args.similarity {
        reducer = reducer.with_similarity_threshold(similarity);
    }
    if let Some(cdhit_args) = &args.cdhit_args {
        reducer = reducer.with_cdhit_args(cdhit_args.clone());
    }
    if let Some(redundancy) = args.redundancy {
        reducer = reducer.with_redundancy(redundancy);
    }
    if let Some(ratio) = args.approx_ratio {
        reducer = reducer.with_approx_ratio(ratio);
    }
    if args.stop_on_zero_gain {
        reducer = reducer.with_convergence(Convergence::PositiveGain);
    }
    if let Some(secs) = args.timeout {
        reducer = reducer.with_timeout(Duration::from_secs(secs));
    }

    if mode == RunMode::CdHitOnly && args.identities.is_some() {
        print_warning("--identities is ignored with --cdhit-only");
    }

    let report = reducer.reduce(&args.input, args.output.as_deref())?;
    if !args.quiet {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &PipelineReport) {
    print_success(&format!(
        "Selected {} sequences",
        format_fraction(report.selected_sequences, report.input_sequences)
    ));

    let mut items = vec![
        format!("Mode: {}", report.mode),
        format!("Output: {}", report.output.display()),
    ];
    if let Some(prefiltered) = report.prefiltered_sequences {
        items.push(format!(
            "After CD-HIT: {}",
            format_fraction(prefiltered, report.input_sequences)
        ));
    }
    if let (Some(objective), Some(value)) = (&report.objective, report.objective_value) {
        items.push(format!("Objective: {} = {:.4}", objective, value));
        items.push(format!(
            "Greedy steps: {} ({} gain evaluations)",
            report.iterations, report.evaluations
        ));
    }
    items.push(format!("Time: {:.2}s", report.elapsed_secs));
    info_box("Reduction summary", &items);

    if report.mode == RunMode::Combined && report.prefiltered_sequences == Some(report.selected_sequences) {
        print_tip("every CD-HIT representative was kept; set --maxsize to reduce further");
    }
}
