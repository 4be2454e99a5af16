use crate::association::AssociationParams;
use crate::utils::{ClusteringMetric, NumericPolicy, Result, TestMethod};
use clap::{ArgAction, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    )
});

#[derive(Parser)]
#[command(name="metaclonotypist",
          version=&**FULL_VERSION,
          about="HLA association testing and clustering evaluation for TCR metaclonotypes",
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Test metaclonotype clusters for HLA association")]
    Associate(AssociateArgs),
    #[clap(about = "Score a clustering against reference labels")]
    Evaluate(EvaluateArgs),
}

#[derive(Parser, Debug)]
#[command(arg_required_else_help(true))]
pub struct AssociateArgs {
    #[clap(required = true)]
    #[clap(short = 'c')]
    #[clap(long = "clusters")]
    #[clap(help = "CSV with clonotype, cluster and sample columns")]
    #[clap(value_name = "CLUSTERS")]
    #[arg(value_parser = check_file_exists)]
    pub clusters_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'l')]
    #[clap(long = "hla")]
    #[clap(help = "CSV with a sample id column followed by HLA allele calls")]
    #[clap(value_name = "HLA")]
    #[arg(value_parser = check_file_exists)]
    pub hla_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-prefix")]
    #[clap(help = "Prefix for output files")]
    #[clap(value_name = "OUTPUT_PREFIX")]
    #[arg(value_parser = check_prefix_path)]
    pub output_prefix: String,

    #[clap(long = "hla-test")]
    #[clap(value_name = "TEST")]
    #[clap(help = "Association test (fisher or agresti-caffo)")]
    #[clap(default_value = "fisher")]
    pub hla_test: TestMethod,

    #[clap(long = "min-donors")]
    #[clap(value_name = "DONORS")]
    #[clap(help = "Minimum number of donors per cluster and carriers per allele")]
    #[clap(default_value = "4")]
    pub min_donors: usize,

    #[clap(long = "fdr-alpha")]
    #[clap(value_name = "ALPHA")]
    #[clap(help = "False discovery rate for the Benjamini-Hochberg correction")]
    #[clap(default_value = "0.1")]
    #[arg(value_parser = ensure_fdr_alpha)]
    pub fdr_alpha: f64,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "min-count")]
    #[clap(value_name = "COUNT")]
    #[clap(help = "Drop clonotypes with a clonal count below this value")]
    pub min_count: Option<u64>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "seed")]
    #[clap(value_name = "SEED")]
    #[clap(help = "Seed of the sample permutation used by the null model")]
    #[clap(default_value = "42")]
    pub seed: u64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "numeric-policy")]
    #[clap(value_name = "POLICY")]
    #[clap(help = "Treatment of undefined test output (ignore or strict)")]
    #[clap(default_value = "ignore")]
    pub numeric_policy: NumericPolicy,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "sample-column")]
    #[clap(value_name = "COLUMN")]
    #[clap(help = "Name of the sample id column in the cluster table")]
    #[clap(default_value = "Sample.ID")]
    #[arg(value_parser = check_column_name_nonempty)]
    pub sample_column: String,
}

impl AssociateArgs {
    pub fn association_params(&self) -> AssociationParams {
        AssociationParams {
            method: self.hla_test,
            fdr_alpha: self.fdr_alpha,
            numeric_policy: self.numeric_policy,
        }
    }
}

#[derive(Parser, Debug)]
#[command(arg_required_else_help(true))]
pub struct EvaluateArgs {
    #[clap(required = true)]
    #[clap(long = "labels")]
    #[clap(help = "CSV with reference and predicted labels per item")]
    #[clap(value_name = "LABELS")]
    #[arg(value_parser = check_file_exists)]
    pub labels_path: PathBuf,

    #[clap(required = true)]
    #[clap(long = "true-column")]
    #[clap(help = "Column holding the reference labels")]
    #[clap(value_name = "COLUMN")]
    #[arg(value_parser = check_column_name_nonempty)]
    pub true_column: String,

    #[clap(required = true)]
    #[clap(long = "pred-column")]
    #[clap(help = "Column holding the predicted cluster labels")]
    #[clap(value_name = "COLUMN")]
    #[arg(value_parser = check_column_name_nonempty)]
    pub pred_column: String,

    #[clap(long = "metric")]
    #[clap(value_name = "METRIC")]
    #[clap(help = "Metric to report (compression or entropies)")]
    #[clap(default_value = "compression")]
    pub metric: ClusteringMetric,
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_prefix_path(s: &str) -> Result<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(s.to_string())
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn check_column_name_nonempty(s: &str) -> Result<String> {
    if s.trim().is_empty() {
        Err("Column name cannot be an empty string".to_string())
    } else {
        Ok(s.to_string())
    }
}

fn ensure_fdr_alpha(s: &str) -> Result<f64> {
    let value = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(format!(
            "The FDR alpha must be in (0.0, 1.0], got: {}",
            value
        ))
    }
}
