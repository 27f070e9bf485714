use clap::Parser;
use kmerstore::{ConfigManager, KmerStore, LoadStats, LoggingSystem, Result, StoreStats};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

/// Load symbol strings into a sorted k-mer store and query it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input file with one symbol string per line
    #[arg(long)]
    input: PathBuf,

    /// k-mer length (overrides the configuration)
    #[arg(short, long)]
    k: Option<usize>,

    /// Configuration file (.toml, .json, .yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// K-mers to delete after loading, one occurrence per listing
    #[arg(long)]
    delete: Vec<String>,

    /// Report the count of a k-mer
    #[arg(long)]
    count: Vec<String>,

    /// Report the total count of k-mers >= this one
    #[arg(long = "count-geq")]
    count_geq: Vec<String>,

    /// Report the count of k-mers compatible with this one
    #[arg(long)]
    compatible: Vec<String>,

    /// List k-mers occurring at least this many times
    #[arg(long = "min-frequency")]
    min_frequency: Option<u64>,

    /// Print a single JSON document instead of text lines
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log-level")]
    log_level: Option<String>,
}

#[derive(Serialize)]
struct Query {
    symbol: String,
    value: u64,
}

#[derive(Serialize)]
struct Report {
    load: LoadStats,
    deleted: u64,
    stats: StoreStats,
    count: Vec<Query>,
    count_geq: Vec<Query>,
    compatible: Vec<Query>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequent: Option<Vec<String>>,
}

fn queries(symbols: &[String], f: impl Fn(&str) -> u64) -> Vec<Query> {
    symbols
        .iter()
        .map(|symbol| Query {
            symbol: symbol.clone(),
            value: f(symbol),
        })
        .collect()
}

fn print_text(report: &Report) {
    println!(
        "k={} distinct={} total={} lines={} windows={} skipped={}",
        report.stats.k,
        report.stats.distinct,
        report.stats.total,
        report.load.lines,
        report.load.windows,
        report.load.skipped_windows
    );
    if report.deleted > 0 {
        println!("deleted\t{}", report.deleted);
    }
    for (label, rows) in [
        ("count", &report.count),
        ("count_geq", &report.count_geq),
        ("compatible", &report.compatible),
    ] {
        for row in rows {
            println!("{}\t{}\t{}", label, row.symbol, row.value);
        }
    }
    if let Some(frequent) = &report.frequent {
        for symbol in frequent {
            println!("frequent\t{}", symbol);
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut manager = match &args.config {
        Some(path) => ConfigManager::load_from_file(path)?,
        None => ConfigManager::new(),
    };
    manager.load_from_env()?;
    if let Some(k) = args.k {
        manager.config_mut().index.k = k;
    }
    if let Some(level) = &args.log_level {
        manager.config_mut().logging.level = level.parse()?;
    }
    manager.validate()?;

    let logging = LoggingSystem::init(manager.config().logging.clone())?;
    let mut store = KmerStore::with_settings(&manager.config().index)?;

    let load = logging.time_operation("load", || store.load_file(&args.input))?;
    let deleted = if args.delete.is_empty() {
        0
    } else {
        store.batch_delete(&args.delete)?
    };

    let report = Report {
        load,
        deleted,
        stats: store.stats(),
        count: queries(&args.count, |s| store.count(s)),
        count_geq: queries(&args.count_geq, |s| store.count_geq(s)),
        compatible: queries(&args.compatible, |s| store.compatible(s)),
        frequent: args.min_frequency.map(|m| store.frequency_at_least(m)),
    };

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| kmerstore::KmerStoreError::parse(format!("JSON serialize error: {}", e)))?;
        println!("{}", json);
    } else {
        print_text(&report);
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
