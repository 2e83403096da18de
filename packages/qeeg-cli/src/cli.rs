use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "qeeg",
    version,
    about = "Quantitative EEG band-power analysis and report tool",
    long_about = "Quantitative EEG band-power analysis and report tool.\n\n\
                  Compute per-channel relative band power (Delta, Theta, Alpha, Beta, High Beta)\n\
                  from EDF recordings and generate clinical and patient reports."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compute relative band power for every channel of a recording
    Analyze(AnalyzeArgs),
    /// Analyze a recording and write clinical and patient reports
    Report(ReportArgs),
    /// List the configured frequency bands
    Bands(BandsArgs),
    /// Validate a recording file
    Validate(ValidateArgs),
}

/// Options shared by every command that runs the analysis
#[derive(Args, Clone, Default)]
pub struct AnalysisOptions {
    /// JSON analysis configuration file
    #[arg(long, env = "QEEG_CONFIG")]
    pub config: Option<String>,

    /// Welch segment length in seconds
    #[arg(long)]
    pub window_seconds: Option<f64>,

    /// Welch segment overlap fraction in [0, 1)
    #[arg(long)]
    pub overlap: Option<f64>,

    /// Relative power above which a channel/band pair is annotated
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Analyze channels one at a time instead of in parallel
    #[arg(long, default_value_t = false)]
    pub sequential: bool,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input recording (EDF)
    #[arg(long)]
    pub file: String,

    #[command(flatten)]
    pub options: AnalysisOptions,

    /// Include threshold annotation events in the output
    #[arg(long, default_value_t = false)]
    pub annotate: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Compact JSON output (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct ReportArgs {
    /// Input recording (EDF)
    #[arg(long)]
    pub file: String,

    /// Supporting documents (txt, md, csv, docx)
    #[arg(long, num_args = 1..)]
    pub attach: Vec<String>,

    /// Directory for the reports and band charts
    #[arg(long, default_value = "qeeg_reports")]
    pub output_dir: String,

    #[command(flatten)]
    pub options: AnalysisOptions,

    /// Print the written paths as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct BandsArgs {
    /// JSON analysis configuration file
    #[arg(long, env = "QEEG_CONFIG")]
    pub config: Option<String>,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Input recording path
    #[arg(long)]
    pub file: String,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
