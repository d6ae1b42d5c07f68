// marketpay CLI - import marketplace CSVs and reconcile payouts

mod exit_codes;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use marketpay_recon::import::{import_orders, import_releases, ImportBatch};
use marketpay_recon::parse::CoercePolicy;
use marketpay_recon::{engine, EngineConfig, Report};
use marketpay_store::Store;

use exit_codes::{recon_exit_code, EXIT_ERROR, EXIT_FILE_READ, EXIT_INVALID_CONFIG, EXIT_NO_ROWS, EXIT_STORE};

#[derive(Parser)]
#[command(name = "mpay")]
#[command(about = "Marketplace payout reconciliation — orders vs. released amounts")]
#[command(version)]
struct Cli {
    /// SQLite database file holding the current snapshot
    #[arg(long, global = true, env = "MARKETPAY_DB", default_value = "marketpay.db")]
    db: PathBuf,

    /// TOML config with fee rules, tolerance and import schemas
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import an orders CSV, replacing the current orders snapshot
    #[command(after_help = "\
Examples:
  mpay import-orders pedidos.csv
  mpay import-orders pedidos.csv --strict --config rules.toml")]
    ImportOrders {
        /// CSV file (comma or semicolon delimited; headers auto-mapped)
        file: PathBuf,

        /// Fail on malformed numeric cells instead of defaulting them to 0
        #[arg(long)]
        strict: bool,
    },

    /// Import a releases CSV, replacing the current releases snapshot
    ImportReleases {
        /// CSV file (comma or semicolon delimited; headers auto-mapped)
        file: PathBuf,

        /// Fail on malformed numeric cells instead of defaulting them to 0
        #[arg(long)]
        strict: bool,
    },

    /// Reconcile orders against released amounts and print KPIs
    #[command(after_help = "\
Examples:
  mpay report
  mpay report --json
  mpay report --json --output report.json")]
    Report {
        /// Print the full report as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON report to a file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate a TOML config without touching the store
    ValidateConfig {
        /// Path to the config file
        file: PathBuf,
    },
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    fn new(code: u8, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), hint: None }
    }

    fn with_hint(code: u8, message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self { code, message: message.into(), hint: Some(hint.into()) }
    }

    fn store(message: impl Into<String>) -> Self {
        Self::new(EXIT_STORE, message)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint:  {hint}");
            }
            ExitCode::from(err.code)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::ImportOrders { file, strict } => {
            cmd_import_orders(&cli.db, &file, &config, policy(strict))
        }
        Commands::ImportReleases { file, strict } => {
            cmd_import_releases(&cli.db, &file, &config, policy(strict))
        }
        Commands::Report { json, output } => cmd_report(&cli.db, &config, json, output.as_deref()),
        Commands::ValidateConfig { file } => cmd_validate_config(&file),
    }
}

fn policy(strict: bool) -> CoercePolicy {
    if strict {
        CoercePolicy::Strict
    } else {
        CoercePolicy::Lenient
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, CliError> {
    match path {
        None => Ok(EngineConfig::default()),
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                CliError::new(EXIT_FILE_READ, format!("cannot read {}: {e}", path.display()))
            })?;
            EngineConfig::from_toml(&raw)
                .map_err(|e| CliError::new(EXIT_INVALID_CONFIG, e.to_string()))
        }
    }
}

fn read_upload(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|e| {
        CliError::with_hint(
            EXIT_FILE_READ,
            format!("cannot read {}: {e}", path.display()),
            "select an existing CSV file",
        )
    })
}

fn import_error(err: marketpay_recon::ReconError) -> CliError {
    let hint = match &err {
        marketpay_recon::ReconError::Mapping { .. } => {
            Some("fix the file header, or add a synonym under [schemas] in the config")
        }
        marketpay_recon::ReconError::NoRows => Some("the previous snapshot was left untouched"),
        _ => None,
    };
    CliError { code: recon_exit_code(&err), message: err.to_string(), hint: hint.map(String::from) }
}

fn note_unmatched<T>(batch: &ImportBatch<T>) {
    for field in &batch.columns.unmatched {
        eprintln!("note: no column matched optional field '{field}'");
    }
}

fn cmd_import_orders(
    db: &Path,
    file: &Path,
    config: &EngineConfig,
    policy: CoercePolicy,
) -> Result<(), CliError> {
    let bytes = read_upload(file)?;
    let batch = import_orders(&bytes, config, policy).map_err(import_error)?;

    let mut store = Store::open(db).map_err(CliError::store)?;
    let count = store.replace_orders(&batch.records).map_err(CliError::store)?;

    note_unmatched(&batch);
    eprintln!("imported {count} order row(s) ({} cell(s) defaulted)", batch.defaulted_cells);
    Ok(())
}

fn cmd_import_releases(
    db: &Path,
    file: &Path,
    config: &EngineConfig,
    policy: CoercePolicy,
) -> Result<(), CliError> {
    let bytes = read_upload(file)?;
    let batch = import_releases(&bytes, config, policy).map_err(import_error)?;

    let mut store = Store::open(db).map_err(CliError::store)?;
    let count = store.replace_releases(&batch.records).map_err(CliError::store)?;

    note_unmatched(&batch);
    eprintln!("imported {count} release row(s) ({} cell(s) defaulted)", batch.defaulted_cells);
    Ok(())
}

fn cmd_report(
    db: &Path,
    config: &EngineConfig,
    json: bool,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let store = Store::open(db).map_err(CliError::store)?;
    let orders = store.load_orders().map_err(CliError::store)?;
    if orders.is_empty() {
        return Err(CliError::with_hint(
            EXIT_NO_ROWS,
            "no orders in the store",
            "run 'mpay import-orders <file>' first",
        ));
    }
    let released = store.release_totals().map_err(CliError::store)?;

    let report = engine::report_with_totals(&orders, &released, config.tolerance.amount);

    if json || output.is_some() {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        if let Some(path) = output {
            std::fs::write(path, &json_str).map_err(|e| {
                CliError::new(EXIT_FILE_READ, format!("cannot write {}: {e}", path.display()))
            })?;
            eprintln!("wrote {}", path.display());
        }
        if json {
            println!("{json_str}");
        }
    }

    print_summary(&report);
    Ok(())
}

/// Human KPI summary on stderr, so `--json` stdout stays clean.
fn print_summary(report: &Report) {
    let k = &report.kpis;
    eprintln!(
        "{} order(s) — bruto {}, esperado {}, liberado {}, delta {}",
        k.order_count, k.bruto, k.esperado, k.liberado, k.delta,
    );

    let mut by_status: BTreeMap<_, usize> = BTreeMap::new();
    for row in &report.rows {
        *by_status.entry(row.status).or_insert(0) += 1;
    }
    for (status, count) in by_status {
        eprintln!("  {status}: {count}");
    }
}

fn cmd_validate_config(file: &Path) -> Result<(), CliError> {
    let raw = std::fs::read_to_string(file).map_err(|e| {
        CliError::new(EXIT_FILE_READ, format!("cannot read {}: {e}", file.display()))
    })?;
    let config = EngineConfig::from_toml(&raw)
        .map_err(|e| CliError::new(EXIT_INVALID_CONFIG, e.to_string()))?;

    eprintln!(
        "valid: commission {}, fee/unit {}, rebate {}, tolerance {}, {} order field(s), {} release field(s)",
        config.rules.commission_rate,
        config.rules.per_unit_fee,
        config.rules.direct_delivery_rebate,
        config.tolerance.amount,
        config.schemas.orders.fields.len(),
        config.schemas.releases.fields.len(),
    );
    Ok(())
}
