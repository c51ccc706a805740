use std::io::{self, IsTerminal};
use std::sync::atomic::AtomicBool;

use clap::{ColorChoice, Parser};
use tracing::error;

use hts_cli::cli::{Cli, Command, LogFormatArg};
use hts_cli::commands::{run_pipeline, run_rulesets};
use hts_cli::logging::{LogConfig, LogFormat, init_logging};
use hts_cli::summary::print_summary;
use hts_core::CoreError;
use hts_model::RunOutcome;
use hts_parse::ParseError;
use hts_rules::RuleSetError;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();

    let config = log_config(&cli);
    if let Err(e) = init_logging(&config) {
        eprintln!("failed to initialize logging: {e}");
        std::process::exit(1);
    }

    let cancel = AtomicBool::new(false);
    let code = match &cli.command {
        Command::Run(args) => match run_pipeline(args, &cancel) {
            Ok(outcome) => {
                print_summary(&outcome);
                outcome_code(&outcome)
            }
            Err(e) => {
                error!("run failed: {e:#}");
                eprintln!("error: {e:#}");
                error_code(&e)
            }
        },
        Command::Rulesets => match run_rulesets() {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("error: {e:#}");
                1
            }
        },
    };
    std::process::exit(code);
}

fn outcome_code(outcome: &RunOutcome) -> i32 {
    if outcome.cancelled {
        130
    } else if outcome.has_failures() {
        5
    } else {
        0
    }
}

/// Run-level failures keep distinct exit codes so scripted callers can
/// tell a bad rule set from bad input data.
fn error_code(error: &anyhow::Error) -> i32 {
    if error.downcast_ref::<RuleSetError>().is_some() {
        return 2;
    }
    match error.downcast_ref::<CoreError>() {
        Some(CoreError::Parse(ParseError::VerificationFailed { .. })) => 3,
        Some(CoreError::Parse(_) | CoreError::Ingest(_)) => 4,
        Some(_) => 1,
        None => 1,
    }
}

fn log_config(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !cli.verbosity.is_present();
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
