//! cellfreq - immune-cell relative frequency CLI
//!
//! Command-line interface for relative-frequency tables, responder
//! comparisons and cohort summaries.

use cell_freq::data::{ComparisonSet, Dataset, Population, PopulationComparison};
use cell_freq::error::Result;
use cell_freq::filter::CohortFilter;
use cell_freq::normalize::{relative_frequency, ZeroTotalPolicy};
use cell_freq::pipeline::{Analysis, AnalysisConfig};
use cell_freq::profile::{
    breakdown, cohort_samples, summarize_conditions, write_rows_tsv, Breakdown,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// Conventional significance level used only to mark rows in text output.
const DISPLAY_ALPHA: f64 = 0.05;

/// Output format for comparison results
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Aligned human-readable table
    Text,
    /// Tab-separated values
    Tsv,
    /// Pretty-printed JSON
    Json,
}

/// What to summarize
#[derive(Debug, Clone, Copy, ValueEnum)]
enum SummaryKind {
    /// Subjects, responders and mean age per condition
    Condition,
    /// Samples and subjects per project
    Project,
    /// Samples and subjects per response label
    Response,
    /// Samples and subjects per sex
    Sex,
    /// Every selected sample with its attributes and raw counts
    Samples,
}

/// Cohort predicates shared by several subcommands; unset predicates match every sample
#[derive(Debug, Clone, Args)]
struct CohortArgs {
    /// Treatment to select (e.g., "tr1")
    #[arg(long)]
    treatment: Option<String>,

    /// Condition to select (e.g., "melanoma")
    #[arg(long)]
    condition: Option<String>,

    /// Sample type to select (e.g., "PBMC")
    #[arg(long)]
    sample_type: Option<String>,

    /// Days from treatment start to select (e.g., 0 for baseline)
    #[arg(long, allow_hyphen_values = true)]
    time: Option<i64>,
}

impl From<CohortArgs> for CohortFilter {
    fn from(args: CohortArgs) -> Self {
        CohortFilter {
            treatment: args.treatment,
            condition: args.condition,
            sample_type: args.sample_type,
            time_from_treatment_start: args.time,
        }
    }
}

/// Immune-cell relative frequency analysis
#[derive(Parser)]
#[command(name = "cellfreq")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert cell counts to relative frequencies per sample and population
    Frequency {
        /// Path to cell-count CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for the frequency table
        #[arg(short, long)]
        output: PathBuf,

        /// Leave out samples with zero total cells instead of failing
        #[arg(long)]
        skip_zero_totals: bool,

        /// Write tab-separated instead of comma-separated output
        #[arg(long)]
        tsv: bool,

        /// Only write records of this population (e.g., "monocyte")
        #[arg(long)]
        population: Option<Population>,
    },

    /// Compare responders with non-responders for each population
    Compare {
        /// Path to cell-count CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Analysis configuration YAML (flags override its cohort)
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        cohort: CohortArgs,

        /// Output path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Summarize subjects and samples matching the cohort flags (all samples when none are set)
    Summary {
        /// Path to cell-count CSV
        #[arg(short, long)]
        input: PathBuf,

        /// What to summarize
        #[arg(long, value_enum, default_value = "condition")]
        by: SummaryKind,

        /// Analysis configuration YAML (flags override its cohort and reference date)
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        cohort: CohortArgs,

        /// Date ages are computed at (YYYY-MM-DD, default: today)
        #[arg(long)]
        reference_date: Option<NaiveDate>,

        /// Output path for the summary TSV (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate an example analysis configuration
    Example {
        /// Output path for the example YAML
        #[arg(short, long, default_value = "analysis.yaml")]
        output: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Frequency {
            input,
            output,
            skip_zero_totals,
            tsv,
            population,
        } => cmd_frequency(&input, &output, skip_zero_totals, tsv, population),

        Commands::Compare {
            input,
            config,
            cohort,
            output,
            format,
        } => cmd_compare(&input, config.as_ref(), cohort.into(), output.as_ref(), format),

        Commands::Summary {
            input,
            by,
            config,
            cohort,
            reference_date,
            output,
        } => cmd_summary(
            &input,
            by,
            config.as_ref(),
            cohort.into(),
            reference_date,
            output.as_ref(),
        ),

        Commands::Example { output } => cmd_example(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load(input: &PathBuf) -> Result<Dataset> {
    eprintln!("Loading {:?}...", input);
    let dataset = Dataset::from_csv(input)?;
    eprintln!(
        "Loaded {} samples from {} subjects",
        dataset.len(),
        dataset.subjects().len()
    );
    Ok(dataset)
}

/// Write the relative frequency table
fn cmd_frequency(
    input: &PathBuf,
    output: &PathBuf,
    skip_zero_totals: bool,
    tsv: bool,
    population: Option<Population>,
) -> Result<()> {
    let dataset = load(input)?;
    let policy = if skip_zero_totals {
        ZeroTotalPolicy::Skip
    } else {
        ZeroTotalPolicy::Abort
    };

    let mut table = relative_frequency(&dataset, policy)?;
    if !table.skipped.is_empty() {
        eprintln!(
            "Skipped {} samples with zero total cells: {}",
            table.skipped.len(),
            table.skipped.join(", ")
        );
    }

    if let Some(population) = population {
        table = table.for_population(population);
    }

    eprintln!("Writing {} records to {:?}...", table.len(), output);
    if tsv {
        table.to_tsv(output)?;
    } else {
        table.to_csv(output)?;
    }
    eprintln!("Done!");
    Ok(())
}

fn load_config(config_path: Option<&PathBuf>) -> Result<AnalysisConfig> {
    match config_path {
        Some(path) => {
            eprintln!("Loading analysis configuration from {:?}...", path);
            AnalysisConfig::from_file(path)
        }
        None => Ok(AnalysisConfig::default()),
    }
}

/// Run the responder comparison
fn cmd_compare(
    input: &PathBuf,
    config_path: Option<&PathBuf>,
    cohort: CohortFilter,
    output: Option<&PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let config = load_config(config_path)?;
    let cohort = cohort.or(&config.cohort);

    let dataset = load(input)?;
    eprintln!("Comparing responders vs non-responders in cohort: {}", cohort);
    let report = Analysis::from_config(&config).cohort(cohort).run(&dataset)?;
    let set = &report.comparison;

    if set.empty_cohort {
        eprintln!("No samples match the cohort; nothing to compare");
    } else {
        let untested = set.not_computed().len();
        if untested > 0 {
            eprintln!("{} populations could not be tested", untested);
        }
    }

    match output {
        Some(path) => {
            eprintln!("Writing results to {:?}...", path);
            write_comparison(set, format, BufWriter::new(File::create(path)?))
        }
        None => write_comparison(set, format, io::stdout().lock()),
    }
}

fn write_comparison<W: io::Write>(set: &ComparisonSet, format: OutputFormat, mut out: W) -> Result<()> {
    match format {
        OutputFormat::Tsv => set.write_tsv(out),
        OutputFormat::Json => {
            writeln!(out, "{}", set.to_json()?)?;
            Ok(())
        }
        OutputFormat::Text => {
            writeln!(out, "Cohort: {}", set.filter)?;
            if set.empty_cohort {
                writeln!(out, "No data")?;
                return Ok(());
            }
            writeln!(
                out,
                "{:<12} {:>10} {:>6} {:>8} {:>10} {:>9} {:>9} {:>5} {:>5} {:>8}",
                "population", "levene_p", "equal", "t-test", "p_value", "mean_y", "mean_n", "n_y", "n_n", "subjects"
            )?;
            for c in &set.comparisons {
                let s = c.sizes();
                match c {
                    PopulationComparison::Tested(r) => writeln!(
                        out,
                        "{:<12} {:>10.4} {:>6} {:>8} {:>10.4} {:>9.3} {:>9.3} {:>5} {:>5} {:>8}{}",
                        r.population.name(),
                        r.variance_test_p_value,
                        r.equal_variance,
                        r.test_variant.name(),
                        r.p_value,
                        r.mean_a,
                        r.mean_b,
                        s.n_group_a,
                        s.n_group_b,
                        s.n_subjects_total,
                        if r.p_value < DISPLAY_ALPHA { "  *" } else { "" }
                    )?,
                    PopulationComparison::NotComputed {
                        population, reason, ..
                    } => writeln!(
                        out,
                        "{:<12} not computed ({}) {:>5} {:>5} {:>8}",
                        population.name(),
                        reason.name(),
                        s.n_group_a,
                        s.n_group_b,
                        s.n_subjects_total
                    )?,
                }
            }
            writeln!(out, "\n* p < {}", DISPLAY_ALPHA)?;
            Ok(())
        }
    }
}

/// Print a cohort summary
fn cmd_summary(
    input: &PathBuf,
    by: SummaryKind,
    config_path: Option<&PathBuf>,
    cohort: CohortFilter,
    reference_date: Option<NaiveDate>,
    output: Option<&PathBuf>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let cohort = cohort.or(&config.cohort);
    let reference_date = reference_date.or(config.reference_date);
    let dataset = load(input)?;
    eprintln!("Cohort: {}", cohort);

    let write = |out: &mut dyn io::Write| -> Result<()> {
        match by {
            SummaryKind::Condition => {
                let reference = reference_date.unwrap_or_else(|| chrono::Local::now().date_naive());
                eprintln!("Ages computed as of {}", reference);
                write_rows_tsv(out, &summarize_conditions(&dataset, &cohort, reference)?)
            }
            SummaryKind::Project => write_rows_tsv(out, &breakdown(&dataset, &cohort, Breakdown::Project)),
            SummaryKind::Response => write_rows_tsv(out, &breakdown(&dataset, &cohort, Breakdown::Response)),
            SummaryKind::Sex => write_rows_tsv(out, &breakdown(&dataset, &cohort, Breakdown::Sex)),
            SummaryKind::Samples => write_rows_tsv(out, &cohort_samples(&dataset, &cohort)),
        }
    };

    match output {
        Some(path) => write(&mut BufWriter::new(File::create(path)?)),
        None => write(&mut io::stdout().lock()),
    }
}

/// Write an example configuration
fn cmd_example(output: &PathBuf) -> Result<()> {
    let yaml = AnalysisConfig::example().to_yaml()?;
    std::fs::write(output, yaml)?;
    eprintln!("Example configuration written to {:?}", output);
    Ok(())
}
