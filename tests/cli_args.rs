//! Integration tests for CLI argument handling
//!
//! Tests the --media/--category flags and parsing from the command line.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_reeldeck"))
        .args(args)
        .output()
        .expect("Failed to execute reeldeck")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("reeldeck"), "Help should mention reeldeck");
    assert!(stdout.contains("media"), "Help should mention --media flag");
    assert!(
        stdout.contains("clear-cache"),
        "Help should mention --clear-cache flag"
    );
}

#[test]
fn test_invalid_media_kind_prints_error_and_exits() {
    let output = run_cli(&["--media", "radio"]);
    assert!(
        !output.status.success(),
        "Expected invalid media kind to fail"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid") || stderr.contains("invalid"),
        "Should print error message about invalid media kind: {}",
        stderr
    );
}

#[test]
fn test_valid_flags_accepted_with_help() {
    // With --help, it should succeed regardless of other flags
    // This is a workaround since we can't easily test TUI apps
    let output = run_cli(&["--media", "tv", "--category", "on-air", "--help"]);
    assert!(output.status.success());
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use reeldeck::catalog::{Category, MediaKind};
    use reeldeck::cli::{parse_category_arg, parse_media_arg, Cli, StartupConfig};

    #[test]
    fn test_cli_no_args_uses_defaults() {
        let cli = Cli::parse_from(["reeldeck"]);
        assert!(cli.media.is_none());
        assert!(cli.category.is_none());
        assert!(!cli.clear_cache);
    }

    #[test]
    fn test_cli_media_flag() {
        let cli = Cli::parse_from(["reeldeck", "--media", "tv"]);
        assert_eq!(cli.media.as_deref(), Some("tv"));
    }

    #[test]
    fn test_cli_category_flag() {
        let cli = Cli::parse_from(["reeldeck", "--category", "top-rated"]);
        assert_eq!(cli.category.as_deref(), Some("top-rated"));
    }

    #[test]
    fn test_parse_media_arg_movie() {
        assert_eq!(parse_media_arg("movie").unwrap(), MediaKind::Movie);
    }

    #[test]
    fn test_parse_media_arg_invalid_returns_error() {
        assert!(parse_media_arg("radio").is_err());
    }

    #[test]
    fn test_parse_category_arg_genre_id() {
        assert_eq!(parse_category_arg("16").unwrap(), Category::Genre(16));
    }

    #[test]
    fn test_startup_config_defaults() {
        let cli = Cli::parse_from(["reeldeck"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.media_kind, MediaKind::Movie);
        assert_eq!(config.category, Category::Popular);
        assert!(!config.clear_cache);
    }

    #[test]
    fn test_startup_config_tv_on_air() {
        let cli = Cli::parse_from(["reeldeck", "--media", "tv", "--category", "on-air"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.media_kind, MediaKind::Tv);
        assert_eq!(config.category, Category::OnAir);
    }

    #[test]
    fn test_startup_config_rejects_on_air_for_movies() {
        let cli = Cli::parse_from(["reeldeck", "--media", "movie", "--category", "on-air"]);
        assert!(StartupConfig::from_cli(&cli).is_err());
    }

    #[test]
    fn test_startup_config_clear_cache() {
        let cli = Cli::parse_from(["reeldeck", "--clear-cache"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert!(config.clear_cache);
    }
}
