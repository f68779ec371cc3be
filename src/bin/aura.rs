//! Aura CLI - Command-line interface for the NeuroAura engine
//!
//! Commands:
//! - score: Score assessment payloads into stress results
//! - sentiment: Analyze free text polarity
//! - vitals: Replay dashboard vitals ticks for a user
//! - catalog: Print or validate the intervention catalog
//! - doctor: Diagnose configuration, catalog and result store

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use neuroaura_engine::pipeline::parse_payload;
use neuroaura_engine::scoring::{InterventionCatalog, Mood, MOOD_BREAKPOINTS};
use neuroaura_engine::store::{JsonFileResultStore, ResultRepository};
use neuroaura_engine::vitals::{ActivitySample, RealtimeVitalsSimulator, VitalsTask};
use neuroaura_engine::{
    analyze_sentiment, EngineConfig, EngineError, StressScoreCalculator, ENGINE_VERSION,
    PRODUCER_NAME,
};

/// Aura - behavioral stress inference for student wellness check-ins
#[derive(Parser)]
#[command(name = "aura")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Score wellness assessments and simulate dashboard vitals", long_about = None)]
struct Cli {
    /// Enable debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score assessment payloads into stress results
    Score {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Engine configuration JSON
        #[arg(long)]
        config: Option<PathBuf>,

        /// Intervention catalog JSON
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Store each result in this JSON file, keyed by user id
        #[arg(long)]
        store: Option<PathBuf>,

        /// Print the point breakdown instead of the result
        #[arg(long)]
        breakdown: bool,

        /// Pretty-print output
        #[arg(long)]
        pretty: bool,
    },

    /// Analyze free text polarity
    Sentiment {
        /// Text to analyze (reads stdin when omitted)
        text: Option<String>,
    },

    /// Replay dashboard vitals ticks for a user
    Vitals {
        /// User whose stored result seeds the vitals
        #[arg(long, default_value = "current-user")]
        user: String,

        /// Result store written by `aura score --store`
        #[arg(long)]
        store: Option<PathBuf>,

        /// Engine configuration JSON
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of ticks to simulate
        #[arg(long, default_value = "12")]
        ticks: u32,

        /// Random seed for reproducible runs
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Typing speed reported to every tick
        #[arg(long)]
        typing_wpm: Option<f64>,

        /// Idle duration reported to every tick (ms)
        #[arg(long, default_value = "0")]
        idle_ms: u64,
    },

    /// Print or validate the intervention catalog
    Catalog {
        /// Catalog JSON to validate (built-in catalog when omitted)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Only show the entry for this mood band
        #[arg(long)]
        mood: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration, catalog and result store
    Doctor {
        /// Engine configuration JSON to check
        #[arg(long)]
        config: Option<PathBuf>,

        /// Intervention catalog JSON to check
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Result store file to check
        #[arg(long)]
        store: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// A single payload object
    Json,
    /// Newline-delimited payloads (one per line)
    Ndjson,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), AuraCliError> {
    match cli.command {
        Commands::Score {
            input,
            input_format,
            config,
            catalog,
            store,
            breakdown,
            pretty,
        } => cmd_score(
            &input,
            input_format,
            config.as_deref(),
            catalog.as_deref(),
            store.as_deref(),
            breakdown,
            pretty,
        ),

        Commands::Sentiment { text } => cmd_sentiment(text),

        Commands::Vitals {
            user,
            store,
            config,
            ticks,
            seed,
            typing_wpm,
            idle_ms,
        } => cmd_vitals(
            &user,
            store.as_deref(),
            config.as_deref(),
            ticks,
            seed,
            ActivitySample {
                typing_wpm,
                idle_ms,
            },
        ),

        Commands::Catalog {
            catalog,
            mood,
            json,
        } => cmd_catalog(catalog.as_deref(), mood.as_deref(), json),

        Commands::Doctor {
            config,
            catalog,
            store,
            json,
        } => cmd_doctor(config.as_deref(), catalog.as_deref(), store.as_deref(), json),
    }
}

fn read_input(input: &Path) -> Result<String, AuraCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, AuraCliError> {
    match path {
        Some(p) => Ok(EngineConfig::from_json(&fs::read_to_string(p)?)?),
        None => Ok(EngineConfig::default()),
    }
}

fn load_catalog(path: Option<&Path>) -> Result<InterventionCatalog, AuraCliError> {
    match path {
        Some(p) => Ok(InterventionCatalog::from_json(&fs::read_to_string(p)?)?),
        None => Ok(InterventionCatalog::default()),
    }
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, AuraCliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

/// Payload documents paired with their 1-based input line; blank NDJSON lines are skipped
fn split_documents(data: &str, input_format: InputFormat) -> Vec<(usize, &str)> {
    match input_format {
        InputFormat::Json => vec![(1, data)],
        InputFormat::Ndjson => data
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty())
            .map(|(i, l)| (i + 1, l))
            .collect(),
    }
}

fn cmd_score(
    input: &Path,
    input_format: InputFormat,
    config: Option<&Path>,
    catalog: Option<&Path>,
    store: Option<&Path>,
    breakdown: bool,
    pretty: bool,
) -> Result<(), AuraCliError> {
    let config = load_config(config)?;
    let calculator = StressScoreCalculator::new(config.scoring, load_catalog(catalog)?);
    let mut repository = store.map(JsonFileResultStore::new);

    let data = read_input(input)?;
    let documents = split_documents(&data, input_format);
    if documents.is_empty() {
        return Err(AuraCliError::NoPayloads);
    }

    for (line, document) in documents {
        let payload = parse_payload(document).map_err(|e| match input_format {
            InputFormat::Ndjson => AuraCliError::Line(line, e),
            InputFormat::Json => AuraCliError::Engine(e),
        })?;

        let result = calculator.calculate(&payload);
        if let Some(repo) = repository.as_mut() {
            repo.save(&payload.user_id, &result)?;
        }

        if breakdown {
            println!("{}", to_json(&calculator.breakdown(&payload), pretty)?);
        } else {
            println!("{}", to_json(&result, pretty)?);
        }
    }

    Ok(())
}

fn cmd_sentiment(text: Option<String>) -> Result<(), AuraCliError> {
    let text = match text {
        Some(t) => t,
        None => read_input(Path::new("-"))?,
    };
    println!("{}", serde_json::to_string(&analyze_sentiment(&text))?);
    Ok(())
}

fn cmd_vitals(
    user: &str,
    store: Option<&Path>,
    config: Option<&Path>,
    ticks: u32,
    seed: u64,
    activity: ActivitySample,
) -> Result<(), AuraCliError> {
    let config = load_config(config)?;
    let stored = match store {
        Some(path) => JsonFileResultStore::new(path).latest(user)?,
        None => None,
    };

    let simulator = RealtimeVitalsSimulator::with_seed(stored.as_ref(), &config.vitals, seed);
    let interval = config.vitals.tick_interval_ms;
    let mut task = VitalsTask::new(simulator, interval);
    println!("{}", serde_json::to_string(&VitalsLine::new(0, task.state()))?);

    task.start(0);
    for k in 1..=u64::from(ticks) {
        let now = k * interval;
        if let Some(state) = task.poll(now, &activity) {
            println!("{}", serde_json::to_string(&VitalsLine::new(now, state))?);
        }
    }
    task.stop();

    Ok(())
}

fn cmd_catalog(catalog: Option<&Path>, mood: Option<&str>, json: bool) -> Result<(), AuraCliError> {
    let catalog = load_catalog(catalog)?;
    let only = mood.map(str::parse::<Mood>).transpose()?;

    if json {
        match only {
            Some(m) => println!("{}", serde_json::to_string_pretty(catalog.for_mood(m))?),
            None => println!("{}", catalog.to_json()?),
        }
        return Ok(());
    }

    println!("Intervention Catalog");
    println!("====================");
    println!("Breakpoints: {:?}", MOOD_BREAKPOINTS);
    for (m, intervention) in catalog.iter() {
        if only.is_some_and(|o| o != m) {
            continue;
        }
        let (lo, hi) = m.range();
        println!(
            "  {:<9} {:>3}-{:<3} {} ({}) - {}",
            m.as_str(),
            lo,
            hi,
            intervention.title,
            intervention.duration_label(),
            intervention.description
        );
    }
    Ok(())
}

fn cmd_doctor(
    config: Option<&Path>,
    catalog: Option<&Path>,
    store: Option<&Path>,
    json: bool,
) -> Result<(), AuraCliError> {
    let mut checks: Vec<DoctorCheck> = vec![DoctorCheck::ok(
        "engine_version",
        format!("Engine version {}", ENGINE_VERSION),
    )];

    if let Some(path) = config {
        checks.push(match load_config(Some(path)) {
            Ok(_) => DoctorCheck::ok("config", "Configuration valid".to_string()),
            Err(e) => DoctorCheck::error("config", CliError::from(e).message),
        });
    }

    if let Some(path) = catalog {
        checks.push(match load_catalog(Some(path)) {
            Ok(_) => DoctorCheck::ok(
                "catalog",
                format!("Catalog covers all {} mood bands", Mood::ALL.len()),
            ),
            Err(e) => DoctorCheck::error("catalog", CliError::from(e).message),
        });
    }

    if let Some(path) = store {
        checks.push(if !path.exists() {
            DoctorCheck::warning("store", "Result store does not exist yet".to_string())
        } else {
            let parsed = fs::read_to_string(path)
                .map_err(AuraCliError::from)
                .and_then(|content| Ok(serde_json::from_str::<StoreFile>(&content)?));
            match parsed {
                Ok(map) => DoctorCheck::ok(
                    "store",
                    format!("Result store valid ({} users)", map.len()),
                ),
                Err(e) => DoctorCheck::error("store", CliError::from(e).message),
            }
        });
    }

    // stdin is where `score` and `sentiment` read by default
    checks.push(if atty::is(atty::Stream::Stdin) {
        DoctorCheck::ok("stdin", "stdin is a TTY (interactive mode)".to_string())
    } else {
        DoctorCheck::ok("stdin", "stdin is a pipe (batch scoring ready)".to_string())
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Aura Doctor Report");
        println!("==================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(AuraCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum AuraCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    Line(usize, EngineError),
    NoPayloads,
    DoctorFailed,
}

impl From<io::Error> for AuraCliError {
    fn from(e: io::Error) -> Self {
        AuraCliError::Io(e)
    }
}

impl From<EngineError> for AuraCliError {
    fn from(e: EngineError) -> Self {
        AuraCliError::Engine(e)
    }
}

impl From<serde_json::Error> for AuraCliError {
    fn from(e: serde_json::Error) -> Self {
        AuraCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(code: &str, message: String, hint: &str) -> Self {
        Self {
            code: code.to_string(),
            message,
            hint: Some(hint.to_string()),
        }
    }
}

impl From<AuraCliError> for CliError {
    fn from(e: AuraCliError) -> Self {
        match e {
            AuraCliError::Io(e) => {
                CliError::new("IO_ERROR", e.to_string(), "Check file paths and permissions")
            }
            AuraCliError::Engine(e) => engine_error(e),
            AuraCliError::Json(e) => CliError::new("JSON_ERROR", e.to_string(), "Check JSON syntax"),
            AuraCliError::Line(line, e) => {
                let mut err = engine_error(e);
                err.message = format!("line {line}: {}", err.message);
                err
            }
            AuraCliError::NoPayloads => CliError::new(
                "NO_PAYLOADS",
                "No assessment payloads found in input".to_string(),
                "Ensure input file is not empty",
            ),
            AuraCliError::DoctorFailed => CliError::new(
                "DOCTOR_FAILED",
                "One or more health checks failed".to_string(),
                "Review the doctor report for details",
            ),
        }
    }
}

fn engine_error(e: EngineError) -> CliError {
    let (code, hint) = match &e {
        EngineError::ParseError(_) | EngineError::JsonError(_) => (
            "PARSE_ERROR",
            "Ensure input is a camelCase assessment payload with userId and questions",
        ),
        EngineError::InvalidConfig(_) => ("CONFIG_ERROR", "Run 'aura doctor --config <file>'"),
        EngineError::IncompleteCatalog(_) | EngineError::DuplicateCatalogEntry(_) => (
            "CATALOG_ERROR",
            "The catalog needs exactly one entry per mood band",
        ),
        EngineError::Io(_) | EngineError::Storage(_) => {
            ("STORAGE_ERROR", "Check the result store path and contents")
        }
        EngineError::UnknownQuestion(_) | EngineError::AlreadySubmitted(_) => {
            ("SESSION_ERROR", "Check the assessment flow")
        }
    };
    CliError::new(code, e.to_string(), hint)
}

type StoreFile = serde_json::Map<String, serde_json::Value>;

// Report types

#[derive(serde::Serialize)]
struct VitalsLine {
    t_ms: u64,
    stress: u8,
    focus: u8,
    energy: u8,
    mood: Mood,
}

impl VitalsLine {
    fn new(t_ms: u64, state: neuroaura_engine::VitalsState) -> Self {
        Self {
            t_ms,
            stress: state.stress,
            focus: state.focus,
            energy: state.energy,
            mood: state.mood(),
        }
    }
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

impl DoctorCheck {
    fn ok(name: &str, message: String) -> Self {
        Self::with_status(name, CheckStatus::Ok, message)
    }

    fn warning(name: &str, message: String) -> Self {
        Self::with_status(name, CheckStatus::Warning, message)
    }

    fn error(name: &str, message: String) -> Self {
        Self::with_status(name, CheckStatus::Error, message)
    }

    fn with_status(name: &str, status: CheckStatus, message: String) -> Self {
        Self {
            name: name.to_string(),
            status,
            message,
        }
    }
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
