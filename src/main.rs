//! Joint axis identification from the command line.
//!
//! Reads a calibration recording, identifies every joint axis and prints
//! them as text or JSON.
//!
//! ```text
//! joint-axes recording.txt --joints 6 -v
//! joint-axes recording.csv --delimiter , --header-lines 1 --skip-columns 0 --json
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::{info, Level};

use joint_axes::{
    identify_joint_axes, AxisEstimate, AxisIdentification, CalibrationReport, IdentConfig,
    ReaderOptions, SampleTable, TableReader, Traversal, Unidentified, ORIENTATION_COLUMNS,
};

/// Identify the rotation axis of each joint of a serial chain
#[derive(Parser)]
#[command(name = "joint-axes")]
#[command(about = "Identify joint rotation axes from a calibration recording", long_about = None)]
#[command(version)]
struct Cli {
    /// Recording with columns q_0 .. q_{N-1}, roll, pitch, yaw
    #[arg(name = "FILE")]
    file: PathBuf,

    /// Number of joints (default: column count minus 3)
    #[arg(long, short = 'n')]
    joints: Option<usize>,

    /// Field delimiter in addition to whitespace ("tab" for a tab)
    #[arg(long, short = 'd', default_value = " ", value_parser = parse_delimiter)]
    delimiter: u8,

    /// Leading lines to skip
    #[arg(long, default_value_t = 0)]
    header_lines: usize,

    /// Zero-based columns to drop, comma separated
    #[arg(long, value_delimiter = ',')]
    skip_columns: Vec<usize>,

    /// TOML file with identification settings
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Override the stall tolerance (rad)
    #[arg(long, allow_hyphen_values = true)]
    stall_tolerance: Option<f64>,

    /// Override the minimum movement tolerance (rad)
    #[arg(long, allow_hyphen_values = true)]
    min_movement: Option<f64>,

    /// Joint processing orders to run
    #[arg(long, value_enum)]
    traversal: Option<TraversalArg>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum TraversalArg {
    Forward,
    Backward,
    Both,
}

impl From<TraversalArg> for Traversal {
    fn from(arg: TraversalArg) -> Self {
        match arg {
            TraversalArg::Forward => Self::Forward,
            TraversalArg::Backward => Self::Backward,
            TraversalArg::Both => Self::Both,
        }
    }
}

fn parse_delimiter(value: &str) -> std::result::Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Ok(c as u8),
                _ => Err(format!("delimiter must be a single ASCII character, got {value:?}")),
            }
        }
    }
}

fn load_config(cli: &Cli) -> Result<IdentConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => IdentConfig::default(),
    };
    if let Some(tolerance) = cli.stall_tolerance {
        config.stall_tolerance = tolerance;
    }
    if let Some(tolerance) = cli.min_movement {
        config.min_movement_tolerance = tolerance;
    }
    if let Some(traversal) = cli.traversal {
        config.traversal = traversal.into();
    }
    Ok(config)
}

fn load_table(cli: &Cli) -> Result<SampleTable> {
    let options = ReaderOptions::default()
        .with_delimiter(cli.delimiter)
        .with_header_lines(cli.header_lines)
        .with_skip_columns(cli.skip_columns.clone());
    let data = TableReader::new(options)
        .read_path(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;

    let n_joints = match cli.joints {
        Some(n) => n,
        None if data.ncols() > ORIENTATION_COLUMNS => data.ncols() - ORIENTATION_COLUMNS,
        None => bail!(
            "{} has {} columns; at least {} are needed for one joint",
            cli.file.display(),
            data.ncols(),
            ORIENTATION_COLUMNS + 1
        ),
    };
    info!(n_joints, "Joint count");
    Ok(SampleTable::new(data, n_joints)?)
}

#[derive(Serialize)]
struct JointOutput {
    joint: usize,
    axis: Option<[f64; 3]>,
    experiments: usize,
    degenerate: usize,
    spread: Option<f64>,
    status: String,
}

#[derive(Serialize)]
struct PassOutput {
    direction: String,
    complete: bool,
    joints: Vec<JointOutput>,
}

#[derive(Serialize)]
struct ReportOutput {
    rows: usize,
    rejected_rows: usize,
    experiments_per_joint: Vec<usize>,
    passes: Vec<PassOutput>,
    agreement_max_difference: Option<f64>,
    agrees: Option<bool>,
}

impl JointOutput {
    fn unidentified(joint: usize, reason: Unidentified) -> Self {
        let (experiments, degenerate) = match reason {
            Unidentified::AllDegenerate { dropped } => (0, dropped),
            Unidentified::Cancelled { experiments } => (experiments, 0),
            Unidentified::NoExperiments | Unidentified::BlockedBy { .. } => (0, 0),
        };
        Self {
            joint,
            axis: None,
            experiments,
            degenerate,
            spread: None,
            status: reason.to_string(),
        }
    }
}

impl PassOutput {
    fn new(identification: &AxisIdentification) -> Self {
        let joints = identification
            .estimates()
            .iter()
            .enumerate()
            .map(|(joint, estimate)| match estimate {
                AxisEstimate::Identified {
                    axis,
                    experiments,
                    degenerate,
                    spread,
                } => JointOutput {
                    joint,
                    axis: Some([axis.x, axis.y, axis.z]),
                    experiments: *experiments,
                    degenerate: *degenerate,
                    spread: Some(*spread),
                    status: "identified".to_string(),
                },
                AxisEstimate::Unidentified(reason) => JointOutput::unidentified(joint, *reason),
            })
            .collect();
        Self {
            direction: identification.direction().to_string(),
            complete: identification.is_complete(),
            joints,
        }
    }
}

impl ReportOutput {
    fn new(report: &CalibrationReport) -> Self {
        let passes = [report.forward.as_ref(), report.backward.as_ref()]
            .into_iter()
            .flatten()
            .map(PassOutput::new)
            .collect();
        Self {
            rows: report.labeled.n_rows(),
            rejected_rows: report.labeled.rejected_rows().count(),
            experiments_per_joint: report.experiments.counts(),
            passes,
            agreement_max_difference: report.agreement.as_ref().map(|a| a.max_difference),
            agrees: report.agreement.as_ref().map(|a| a.agrees),
        }
    }

    fn print_text(&self) {
        println!(
            "{} rows, {} rejected, experiments per joint: {:?}",
            self.rows, self.rejected_rows, self.experiments_per_joint
        );
        for pass in &self.passes {
            println!("\n{} pass:", pass.direction);
            for joint in &pass.joints {
                match joint.axis {
                    Some([x, y, z]) => println!(
                        "  joint {:>2}: [{x:>10.6}, {y:>10.6}, {z:>10.6}]  ({} experiments, {} degenerate)",
                        joint.joint, joint.experiments, joint.degenerate
                    ),
                    None => println!("  joint {:>2}: {}", joint.joint, joint.status),
                }
            }
        }
        if let (Some(diff), Some(agrees)) = (self.agreement_max_difference, self.agrees) {
            println!(
                "\nforward/backward max difference: {diff:.3e} ({})",
                if agrees { "agree" } else { "DISAGREE" }
            );
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    let table = load_table(&cli)?;
    let report = identify_joint_axes(&table, &config)?;

    let output = ReportOutput::new(&report);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        output.print_text();
    }

    if let Some(missing) = report.primary().map(AxisIdentification::unidentified_joints) {
        if !missing.is_empty() {
            bail!("no axis identified for joint(s) {missing:?}");
        }
    }
    Ok(())
}
