use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;
use unit_config_cleaner::config::{ExportFormat, ValidityRule};
use unit_config_cleaner::gate::{
    DuplicateDecision, DuplicateReview, OperatorGate, ValidityDecision, ValidityReview,
};
use unit_config_cleaner::summary::FileStatus;
use unit_config_cleaner::{Cleaner, CleanerConfig, Result, Session, ToolError};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Clean(args) => execute_clean(args),
    }
}

fn execute_clean(args: CleanArgs) -> Result<()> {
    for input in &args.inputs {
        if !input.exists() {
            return Err(ToolError::MissingInput(input.clone()));
        }
    }

    let mut config = match &args.config {
        Some(path) => CleanerConfig::from_path(path)?,
        None => CleanerConfig::default(),
    };
    if let Some(format) = args.format {
        config.export_format = format.into();
    }
    if let Some(rule) = args.rule {
        config.rule = rule.into();
    }

    let mut session = Session::new();
    let mut registered = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        registered.push((session.register_path(input)?, input.clone()));
    }

    let cleaner = Cleaner::new(config);
    let mut gate = CliGate {
        validity: args.on_problem.decision(),
        duplicates: args.on_duplicate.decision(),
    };
    let summaries = cleaner.run_batch(&mut session, &mut gate);

    for (key, input) in &registered {
        let Some(summary) = session.summary(key) else {
            continue;
        };
        if let (FileStatus::Exported { output_name, .. }, Some(bytes)) =
            (&summary.status, session.output(key))
        {
            let directory = args
                .output_dir
                .clone()
                .or_else(|| input.parent().map(Path::to_path_buf))
                .unwrap_or_default();
            fs::create_dir_all(&directory)?;
            let target = directory.join(output_name);
            fs::write(&target, bytes)?;
            info!(output = %target.display(), "cleaned file written");
        }
    }

    println!("Results summary");
    for summary in &summaries {
        println!("{summary}");
    }

    if let Some(path) = &args.summary_json {
        fs::write(path, serde_json::to_string_pretty(&summaries)?)?;
    }
    Ok(())
}

/// Answers from the command line: fixed when given as flags, otherwise asked
/// on the terminal.
struct CliGate {
    validity: Option<ValidityDecision>,
    duplicates: Option<DuplicateDecision>,
}

impl OperatorGate for CliGate {
    fn validity_decision(&mut self, review: &ValidityReview) -> ValidityDecision {
        if let Some(decision) = self.validity {
            return decision;
        }
        eprintln!(
            "\nSome rows in {} have special characters in the Unit column:",
            review.file_name
        );
        eprintln!("  {}", review.columns.join(" | "));
        for row in &review.rows {
            let reasons: Vec<String> = row.reasons.iter().map(ToString::to_string).collect();
            eprintln!(
                "  row {}: {}  ({})",
                row.index + 2,
                row.cells.join(" | "),
                reasons.join(", ")
            );
        }
        prompt(
            "Action for these rows [keep/delete/cancel]: ",
            ValidityDecision::Cancel,
        )
    }

    fn duplicate_decision(&mut self, review: &DuplicateReview) -> DuplicateDecision {
        if let Some(decision) = self.duplicates {
            return decision;
        }
        eprintln!(
            "\nDuplicate units detected in {} ({} rows):",
            review.file_name,
            review.row_count()
        );
        for group in &review.groups {
            eprintln!("  {}", group.identifier);
            for row in &group.rows {
                eprintln!("    row {}: {}", row.index + 2, row.cells.join(" | "));
            }
        }
        prompt(
            "Duplicate handling [keep-all/collapse/cancel]: ",
            DuplicateDecision::Cancel,
        )
    }
}

/// Reads answers from stdin until one parses. End of input answers `fallback`.
fn prompt<T: FromStr<Err = String>>(question: &str, fallback: T) -> T {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        eprint!("{question}");
        let _ = io::stderr().flush();
        match lines.next() {
            Some(Ok(line)) => match line.parse() {
                Ok(decision) => return decision,
                Err(message) => eprintln!("{message}"),
            },
            _ => return fallback,
        }
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Clean unit configuration files (Tower, Unit, Corporate)."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Clean one or more .csv or .xlsx files.
    Clean(CleanArgs),
}

#[derive(clap::Args)]
struct CleanArgs {
    /// Input files.
    #[arg(long = "input", required = true)]
    inputs: Vec<PathBuf>,

    /// Directory for cleaned files. Defaults to each input's directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// What to do with rows whose Unit has special characters.
    #[arg(long, value_enum, default_value_t = ProblemArg::Ask)]
    on_problem: ProblemArg,

    /// What to do with rows sharing an identifier.
    #[arg(long, value_enum, default_value_t = DuplicateArg::Ask)]
    on_duplicate: DuplicateArg,

    /// Output format; overrides the configuration file.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Unit character rule; overrides the configuration file.
    #[arg(long, value_enum)]
    rule: Option<RuleArg>,

    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the results summary as JSON to this path.
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ProblemArg {
    Ask,
    Keep,
    Delete,
    Cancel,
}

impl ProblemArg {
    fn decision(self) -> Option<ValidityDecision> {
        match self {
            ProblemArg::Ask => None,
            ProblemArg::Keep => Some(ValidityDecision::Keep),
            ProblemArg::Delete => Some(ValidityDecision::Delete),
            ProblemArg::Cancel => Some(ValidityDecision::Cancel),
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DuplicateArg {
    Ask,
    KeepAll,
    Collapse,
    Cancel,
}

impl DuplicateArg {
    fn decision(self) -> Option<DuplicateDecision> {
        match self {
            DuplicateArg::Ask => None,
            DuplicateArg::KeepAll => Some(DuplicateDecision::KeepAll),
            DuplicateArg::Collapse => Some(DuplicateDecision::CollapseToOne),
            DuplicateArg::Cancel => Some(DuplicateDecision::Cancel),
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatArg {
    Csv,
    Xlsx,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Xlsx => ExportFormat::Xlsx,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RuleArg {
    Standard,
    Strict,
}

impl From<RuleArg> for ValidityRule {
    fn from(arg: RuleArg) -> Self {
        match arg {
            RuleArg::Standard => ValidityRule::Standard,
            RuleArg::Strict => ValidityRule::Strict,
        }
    }
}
