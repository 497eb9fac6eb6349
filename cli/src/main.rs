use std::path::PathBuf;
use std::sync::{Arc, Once};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, ValueEnum};
use mapbench_core::{
    Harness, HarnessError, OutputFormat, ParameterSet, ReferenceDataset, Suite,
    alloc::{self, CountingAllocator},
    rt::Runtime,
    weather::{MappedWeather, Workload, day_parameters, weather_suite},
};
use tracing::{info, warn};

mod settings;

use settings::{FileSettings, Settings};

#[global_allocator]
static GLOBAL_ALLOCATOR: CountingAllocator = CountingAllocator;

static TRACE_INIT: Once = Once::new();
const TRACE_ENV: &str = "MAPBENCH_TRACE";
const DEFAULT_TRACE_FILTER: &str = "mapbench_core=info,mapbench_cli=info";

/// Exit code when a configuration problem stops the run before measuring.
const EXIT_CONFIGURATION: i32 = 2;
/// Exit code when the run finished but some cells were excluded, or failed otherwise.
const EXIT_FAILURE: i32 = 1;

#[derive(Debug, Parser)]
#[command(
    name = "mapbench",
    author,
    version,
    about = "Compare concurrent and sequential weather mappers",
    long_about = None
)]
pub(crate) struct CliArgs {
    /// Run only the named case (repeatable). Defaults to every registered case.
    #[arg(long = "case", value_name = "NAME")]
    pub(crate) cases: Vec<String>,

    /// NumberOfDays values to measure, comma separated
    #[arg(long, value_name = "N,N,...", value_delimiter = ',')]
    pub(crate) days: Vec<u64>,

    /// Warmup iterations per cell (discarded)
    #[arg(long, value_name = "N")]
    pub(crate) warmup: Option<u32>,

    /// Measured iterations per cell
    #[arg(long, value_name = "N")]
    pub(crate) iterations: Option<u32>,

    /// Per-iteration timeout for concurrent cases, in milliseconds
    #[arg(long = "timeout-ms", value_name = "MS")]
    pub(crate) timeout_ms: Option<u64>,

    /// Drive concurrent cases on a current-thread runtime
    #[arg(long)]
    pub(crate) single_thread: bool,

    /// Report format
    #[arg(long, value_enum)]
    pub(crate) format: Option<FormatArg>,

    /// TOML file with defaults; flags given on the command line win
    #[arg(long, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,

    /// List registered cases and parameter values, then exit
    #[arg(long)]
    pub(crate) list: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum FormatArg {
    Table,
    Json,
    Csv,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Table => OutputFormat::Table,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Csv => OutputFormat::Csv,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunOutcome {
    Clean,
    CellsExcluded,
}

fn env_toggle_enabled(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }
    !(trimmed.eq_ignore_ascii_case("0") || trimmed.eq_ignore_ascii_case("false") || trimmed.eq_ignore_ascii_case("off"))
}

fn filter_expr_from(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("1")
        || trimmed.eq_ignore_ascii_case("true")
        || trimmed.eq_ignore_ascii_case("on")
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn maybe_init_tracing() {
    let raw = match std::env::var(TRACE_ENV) {
        Ok(value) => value,
        Err(_) => return,
    };

    if !env_toggle_enabled(&raw) {
        return;
    }

    TRACE_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        use tracing_subscriber::fmt;

        let filter_expr = filter_expr_from(&raw).or_else(|| std::env::var("RUST_LOG").ok());

        let builder = fmt().with_writer(std::io::stderr);

        let builder = match filter_expr.and_then(|expr| EnvFilter::try_new(expr).ok()) {
            Some(filter) => builder.with_env_filter(filter),
            None => builder.with_env_filter(DEFAULT_TRACE_FILTER),
        };

        let _ = builder.try_init();
    });
}

pub(crate) fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(harness_err) = err.downcast_ref::<HarnessError>() {
        return match harness_err {
            HarnessError::Configuration(_) => EXIT_CONFIGURATION,
            _ => EXIT_FAILURE,
        };
    }
    if err.downcast_ref::<toml::de::Error>().is_some() {
        return EXIT_CONFIGURATION;
    }
    EXIT_FAILURE
}

fn print_listing(suite: &Suite<Vec<MappedWeather>>, params: &ParameterSet) {
    println!("Cases:");
    for case in suite.cases() {
        let marker = if case.is_baseline() { " (baseline)" } else { "" };
        println!("  {:<20} {}{}", case.name(), case.mode(), marker);
    }
    println!("Parameters:");
    for decl in params.decls() {
        let values: Vec<String> = decl.values().iter().map(u64::to_string).collect();
        println!("  {} = [{}]", decl.name(), values.join(", "));
    }
}

fn run(args: &CliArgs) -> anyhow::Result<RunOutcome> {
    let file = match &args.config {
        Some(path) => FileSettings::load(path)?,
        None => FileSettings::default(),
    };
    let settings = Settings::resolve(args, file);

    // Process-level setup owns the reference table; the harness only borrows it.
    let dataset = Arc::new(ReferenceDataset::cities());
    let workload = Workload::new(Utc::now().date_naive());
    let registered = weather_suite(workload)?;
    let params = day_parameters(&settings.days)?;

    if args.list {
        print_listing(&registered, &params);
        return Ok(RunOutcome::Clean);
    }

    let suite = registered.select(&settings.cases)?;
    let harness = Harness::new(suite, params, dataset, settings.harness.clone())?;
    let runtime = Runtime::for_config(settings.harness.single_thread)?;
    if !alloc::is_tracking() {
        warn!("allocation tracking is inactive; allocation columns will read zero");
    }
    info!(
        bindings = harness.params().len(),
        cases = harness.suite().len(),
        runtime = ?runtime.stats(),
        "starting benchmark run"
    );

    let report = harness.run(&runtime)?;
    let rendered = report.render(settings.format).context("render benchmark report")?;
    print!("{}", rendered);
    if !rendered.ends_with('\n') {
        println!();
    }

    if report.has_exclusions() {
        Ok(RunOutcome::CellsExcluded)
    } else {
        Ok(RunOutcome::Clean)
    }
}

fn main() -> anyhow::Result<()> {
    maybe_init_tracing();

    let args = CliArgs::parse();
    match run(&args) {
        Ok(RunOutcome::Clean) => Ok(()),
        Ok(RunOutcome::CellsExcluded) => {
            eprintln!("Error: some cells were excluded from the report");
            std::process::exit(EXIT_FAILURE);
        }
        Err(err) => {
            eprintln!("Error: {:#}", err);
            std::process::exit(exit_code_for(&err));
        }
    }
}
