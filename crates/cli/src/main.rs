// billsync - reconcile a bills spreadsheet against a QuickBooks company file

mod exit_codes;
mod pipeline;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use billsync_config::{ConfigError, EnvOverrides, Settings};
use billsync_gateway::GatewayError;
use billsync_io::{ReportError, SourceError};
use billsync_recon::ReconError;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::{
    gateway_exit_code, EXIT_CONFIG_INVALID, EXIT_DUPLICATE_KEYS, EXIT_REPORT_WRITE,
    EXIT_SOURCE_INVALID, EXIT_SUCCESS,
};
use pipeline::{CompareArgs, RunArgs};

const LOG_ENV_VAR: &str = "BILLSYNC_LOG";

#[derive(Parser)]
#[command(name = "billsync")]
#[command(about = "Reconcile a bills spreadsheet against a QuickBooks company file")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Config file (default: $BILLSYNC_CONFIG, then <config dir>/billsync/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log more to stderr (-v info, -vv debug). BILLSYNC_LOG / RUST_LOG take precedence.
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare the workbook with the ledger and add spreadsheet-only bills to it
    #[command(after_help = "\
Examples:
  billsync run --workbook bills.xlsx
  billsync run --workbook bills.xlsx --sheet 'March' --report out/report.json
  billsync run --workbook bills.xlsx --no-push --json | jq .summary
  BILLSYNC_GATEWAY_URL=http://qb-host:8080/qbxml billsync run --workbook bills.xlsx")]
    Run {
        /// Source workbook (xlsx, xlsm, xls, xlsb, ods or csv)
        #[arg(long, value_name = "PATH")]
        workbook: PathBuf,

        /// Report destination (default: [report] path from config)
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,

        /// Worksheet name (default: [workbook] sheet from config, then the first sheet)
        #[arg(long)]
        sheet: Option<String>,

        /// Compare only; do not add anything to the ledger
        #[arg(long)]
        no_push: bool,

        /// Print the report document to stdout instead of progress lines
        #[arg(long)]
        json: bool,
    },

    /// Compare the workbook with a ledger CSV export, offline
    #[command(after_help = "\
Examples:
  billsync compare --workbook bills.xlsx --ledger-csv ledger.csv
  billsync compare --workbook bills.csv --ledger-csv ledger.csv --json")]
    Compare {
        #[arg(long, value_name = "PATH")]
        workbook: PathBuf,

        /// Ledger export with the same columns as the workbook
        #[arg(long, value_name = "PATH")]
        ledger_csv: PathBuf,

        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,

        #[arg(long)]
        sheet: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Validate the workbook's columns and list rows that would be skipped
    Check {
        #[arg(long, value_name = "PATH")]
        workbook: PathBuf,

        #[arg(long)]
        sheet: Option<String>,
    },

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the resolved settings as TOML (the gateway token is never shown)
    Show,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  billsync-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(fallback));

    // Also installs the `log` bridge, so library crates' log records show up.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_settings(explicit: Option<&Path>) -> Result<billsync_config::LoadedSettings, CliError> {
    Settings::load(explicit, &EnvOverrides::from_process_env()).map_err(CliError::config)
}

fn cmd_config_show(explicit: Option<&Path>) -> Result<(), CliError> {
    let loaded = load_settings(explicit)?;
    let rendered = loaded.settings.to_toml_string().map_err(CliError::config)?;
    match &loaded.source {
        Some(path) => println!("# source: {}", path.display()),
        None => println!("# source: built-in defaults"),
    }
    print!("{}", rendered);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Run {
            workbook,
            report,
            sheet,
            no_push,
            json,
        } => {
            let args = RunArgs {
                workbook,
                report,
                sheet,
                no_push,
                json,
            };
            load_settings(config).and_then(|loaded| pipeline::cmd_run(&loaded.settings, args))
        }
        Commands::Compare {
            workbook,
            ledger_csv,
            report,
            sheet,
            json,
        } => {
            let args = CompareArgs {
                workbook,
                ledger_csv,
                report,
                sheet,
                json,
            };
            load_settings(config).and_then(|loaded| pipeline::cmd_compare(&loaded.settings, args))
        }
        Commands::Check { workbook, sheet } => load_settings(config)
            .and_then(|loaded| pipeline::cmd_check(&loaded.settings, &workbook, sheet.as_deref())),
        Commands::Config(ConfigCommands::Show) => cmd_config_show(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError {
            code,
            message,
            hint,
        }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn config(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::Invalid(msg) if msg.contains("endpoint") => {
                Some("try `billsync config show` to see what was loaded".to_string())
            }
            _ => None,
        };
        Self {
            code: EXIT_CONFIG_INVALID,
            message: err.to_string(),
            hint,
        }
    }

    pub fn source(path: &Path, err: SourceError) -> Self {
        let hint = match &err {
            SourceError::MissingColumns(_) => {
                Some("column names are configurable under [workbook.columns]".to_string())
            }
            SourceError::SheetNotFound { .. } => {
                Some("pass --sheet or set [workbook] sheet".to_string())
            }
            _ => None,
        };
        Self {
            code: EXIT_SOURCE_INVALID,
            message: format!("{}: {}", path.display(), err),
            hint,
        }
    }

    pub fn gateway(err: GatewayError) -> Self {
        let hint = match &err {
            GatewayError::Auth { .. } => {
                Some("check the BILLSYNC_GATEWAY_TOKEN environment variable".to_string())
            }
            _ => None,
        };
        Self {
            code: gateway_exit_code(&err),
            message: err.to_string(),
            hint,
        }
    }

    pub fn duplicates(err: ReconError) -> Self {
        Self {
            code: EXIT_DUPLICATE_KEYS,
            message: err.to_string(),
            hint: Some(
                "set [compare] on_duplicate = \"last_wins\" to keep the last occurrence"
                    .to_string(),
            ),
        }
    }

    pub fn report(err: ReportError) -> Self {
        Self {
            code: EXIT_REPORT_WRITE,
            message: err.to_string(),
            hint: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from([
            "billsync",
            "-vv",
            "run",
            "--workbook",
            "bills.xlsx",
            "--no-push",
            "--json",
            "--config",
            "c.toml",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config.as_deref(), Some(Path::new("c.toml")));
        match cli.command {
            Commands::Run {
                workbook,
                no_push,
                json,
                report,
                ..
            } => {
                assert_eq!(workbook, PathBuf::from("bills.xlsx"));
                assert!(no_push && json);
                assert!(report.is_none());
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn run_requires_workbook() {
        assert!(Cli::try_parse_from(["billsync", "run"]).is_err());
    }

    #[test]
    fn source_errors_carry_path_and_hint() {
        let missing = SourceError::MissingColumns(vec!["Supplier".into()]);
        let err = CliError::source(Path::new("bills.xlsx"), missing);
        assert_eq!(err.code, EXIT_SOURCE_INVALID);
        assert!(err.message.starts_with("bills.xlsx: missing required columns: Supplier"));
        assert!(err.hint.is_some());
    }
}
