//! Command line miner.
//!
//! Reads compounds from a gSpan file and activities from a tab separated
//! file, mines every root in parallel and streams results to stdout.
//! With `-r` roots are mined one at a time and written as separated
//! blocks instead.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for terminals (default: pretty)
//!
//! Logs go to stderr so stdout carries only results.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin bbrc_mine --features cli -- compounds.gsp activities.tsv -f 2 -l 2
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use bbrc_miner::{
    read_activities, read_gsp, Miner, ReportFormat, ReportWriter, StructureClass, WriterSink,
    MINER_SCHEMA_VERSION,
};

/// Mine significant, backbone-representative fragments from compound graphs.
#[derive(Parser)]
#[command(name = "bbrc_mine")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Compound graphs in gSpan format
    graphs: PathBuf,

    /// Activities, tab separated: id, name, value
    activities: Option<PathBuf>,

    /// Minimum number of supporting compounds
    #[arg(short = 'f', long, default_value_t = 1)]
    min_frequency: usize,

    /// Pattern shape: 1 paths, 2 trees, 3 graphs
    #[arg(short = 'l', long, default_value_t = 3)]
    level: u8,

    /// Significance level of the chi-square test
    #[arg(short = 'p', long, default_value_t = 0.95)]
    significance: f64,

    /// Extend patterns that occur in a single compound
    #[arg(short = 's', long)]
    refine_singles: bool,

    /// Disable statistical pruning
    #[arg(short = 'u', long)]
    no_pruning: bool,

    /// Report every significant pattern, not just class boundaries
    #[arg(short = 'b', long)]
    no_backbone: bool,

    /// Disable dynamic upper bound pruning
    #[arg(short = 'd', long)]
    no_dynamic_bound: bool,

    /// Separate result blocks at search leaves (needs -b)
    #[arg(short = 'r', long)]
    bbrc_sep: bool,

    /// Treat activities as real values (Kolmogorov-Smirnov test)
    #[arg(short = 'g', long)]
    regression: bool,

    /// Count patterns without printing them
    #[arg(short = 'o', long)]
    no_output: bool,

    /// Worker threads (default: one per core)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: ReportFormat,

    /// Write the per-root fingerprint registry as JSON
    #[arg(long)]
    registry: Option<PathBuf>,
}

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bbrc_mine=info,bbrc_miner=info".into());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .flatten_event(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init();
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(jobs) = cli.jobs {
        rayon::ThreadPoolBuilder::new().num_threads(jobs).build_global()?;
    }

    let graphs = read_gsp(BufReader::new(File::open(&cli.graphs)?))?;
    let mut miner = Miner::new();
    for (id, graph) in &graphs {
        miner.add_compound(*id, graph)?;
    }

    match &cli.activities {
        Some(path) => {
            for (id, value) in read_activities(BufReader::new(File::open(path)?))? {
                miner.add_activity(id, value)?;
            }
        }
        None => {
            info!("no activity file, mining frequent fragments only");
            miner.set_chisq_active(false);
        }
    }

    let structure = StructureClass::from_level(cli.level).ok_or("structure level must be 1, 2 or 3")?;
    miner.set_structure(structure);
    miner.set_refine_singles(cli.refine_singles);
    miner.set_min_frequency(cli.min_frequency)?;
    miner.set_chisq_sig(cli.significance)?;
    if cli.regression {
        miner.set_regression(true);
    }
    if cli.no_pruning {
        miner.set_pruning(false);
    }
    if cli.no_backbone {
        miner.set_backbone(false);
    }
    if !cli.no_dynamic_bound && miner.policy().backbone && miner.policy().prunes() {
        miner.set_dynamic_upper_bound(true);
    }
    if cli.bbrc_sep {
        miner.set_bbrc_sep(true);
    }

    if miner.policy().separates_blocks() && !cli.no_output {
        if cli.registry.is_some() {
            warn!("separated output mines roots one at a time, no registry written");
        }
        return write_blocks(&mut miner, cli.format);
    }

    let sink = if cli.no_output {
        None
    } else {
        let sink = Arc::new(WriterSink::new(
            BufWriter::new(std::io::stdout()),
            cli.format,
            miner.activities(),
        ));
        miner.set_sink(sink.clone());
        miner.set_console_out(true);
        Some(sink)
    };

    let params_hash = miner.policy().params_hash()?;
    info!(
        compounds = miner.count_compounds(),
        roots = miner.count_root_nodes(),
        policy = %params_hash,
        "mining"
    );
    let result = miner.mine_all()?;

    for (root, err) in result.failures() {
        warn!(root, error = %err, "root failed");
    }
    let patterns = match &sink {
        Some(sink) => sink.written(),
        None => result.registry.entries.iter().map(|e| e.pattern_count).sum(),
    };
    info!(patterns, registry = %result.registry.registry_hash, "done");

    if let Some(path) = &cli.registry {
        let document = serde_json::json!({
            "schema_version": MINER_SCHEMA_VERSION,
            "policy_id": result.policy_id,
            "policy_params_hash": result.policy_params_hash,
            "registry": result.registry,
        });
        serde_json::to_writer_pretty(File::create(path)?, &document)?;
    }
    Ok(())
}

/// Mine root by root and write each block followed by a separator.
fn write_blocks(miner: &mut Miner, format: ReportFormat) -> Result<(), Box<dyn std::error::Error>> {
    let mut report = ReportWriter::new(BufWriter::new(std::io::stdout()), format, miner.activities());
    info!(
        compounds = miner.count_compounds(),
        roots = miner.count_root_nodes(),
        "mining with block separators"
    );
    for root in 0..miner.count_root_nodes() {
        for block in miner.mine_root_blocks(root)? {
            for result in &block {
                report.write_result(result)?;
            }
            report.write_separator()?;
        }
    }
    report.flush()?;
    info!(patterns = report.written(), "done");
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "mining failed");
            ExitCode::FAILURE
        }
    }
}
