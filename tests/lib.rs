#![allow(clippy::unwrap_used)]

use clap::Parser;
use hagglz::cli::{Cli, Commands};
use hagglz::logger;
use std::path::PathBuf;

fn setup() {
    let _ = logger::init();
    logger::enable_logging();
    logger::set_log_to_stderr(true);
}

#[test]
fn test_logger_init_is_idempotent() {
    setup();
    assert!(logger::init().is_ok());
    hagglz::log_debug!("logger ready for tests");
}

#[test]
fn test_negotiate_arguments() {
    let cli = Cli::try_parse_from([
        "hagglz",
        "negotiate",
        "--file",
        "bill.txt",
        "--amount",
        "124.58",
        "--company",
        "City Power",
    ])
    .unwrap();

    match cli.command {
        Some(Commands::Negotiate {
            file,
            amount,
            company,
            user,
        }) => {
            assert_eq!(file, PathBuf::from("bill.txt"));
            assert_eq!(amount, Some(124.58));
            assert_eq!(company.as_deref(), Some("City Power"));
            assert_eq!(user, "cli");
        }
        _ => panic!("expected the negotiate command"),
    }
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["hagglz", "serve", "--bind", "127.0.0.1:9000", "--log", "-q"]).unwrap();

    assert!(cli.log);
    assert!(cli.quiet);
    assert!(matches!(
        cli.command,
        Some(Commands::Serve { bind: Some(ref bind) }) if bind == "127.0.0.1:9000"
    ));
}

#[test]
fn test_classify_requires_a_file() {
    assert!(Cli::try_parse_from(["hagglz", "classify"]).is_err());
    assert!(Cli::try_parse_from(["hagglz", "pipelines"]).is_ok());
}

#[test]
fn test_market_category_is_case_insensitive() {
    let cli = Cli::try_parse_from(["hagglz", "market", "--type", "telecom"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Market {
            category: hagglz::Category::Telecom,
            company: None
        })
    ));
    assert!(Cli::try_parse_from(["hagglz", "market", "--type", "water"]).is_err());
}

#[test]
fn test_trend_needs_amounts() {
    assert!(Cli::try_parse_from(["hagglz", "trend"]).is_err());
    assert!(Cli::try_parse_from(["hagglz", "trend", "90.5", "101", "120.25"]).is_ok());
}
