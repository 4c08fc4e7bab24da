// tests/cli_args.rs

use std::error::Error;
use std::time::Duration;

use clap::Parser;

use devloop::cli::CliArgs;
use devloop::config::load_config;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn defaults_match_documented_values() -> TestResult {
    let args = CliArgs::try_parse_from(["devloop"])?;
    let defaults = args.config_defaults();

    assert_eq!(defaults.watch_dirs, vec!["."]);
    assert_eq!(defaults.ignore_dirs, vec!["node_modules", ".git"]);
    assert_eq!(defaults.extensions, vec!["go", "js", "css", "html"]);
    assert_eq!(defaults.command, None);
    assert_eq!(defaults.debounce_time, "500ms");
    assert!(!defaults.live_reload);
    assert_eq!(defaults.live_reload_port, 35729);
    assert!(!args.dry_run);
    Ok(())
}

#[test]
fn flags_become_configuration() -> TestResult {
    let args = CliArgs::try_parse_from([
        "devloop",
        "--watch",
        "cmd",
        "--watch",
        "web",
        "--ignore",
        "bin, tmp",
        "--ext",
        "go,tmpl",
        "--cmd",
        "go run ./cmd/server",
        "--debounce",
        "1s",
        "--live-reload",
        "--live-reload-port",
        "9000",
    ])?;

    let cfg = load_config(None, &args.config_defaults())?;

    assert_eq!(cfg.watch_dirs().len(), 2);
    assert_eq!(cfg.ignore_dirs(), &["bin".to_string(), "tmp".to_string()]);
    assert_eq!(cfg.debounce(), Duration::from_secs(1));
    assert!(cfg.live_reload());
    assert_eq!(cfg.live_reload_port(), 9000);
    assert_eq!(cfg.rules()[0].patterns, vec!["go,tmpl".to_string()]);
    assert_eq!(cfg.rules()[0].commands[0].cmd, "go run ./cmd/server");
    Ok(())
}

#[test]
fn without_cmd_or_live_reload_there_is_nothing_to_do() -> TestResult {
    let args = CliArgs::try_parse_from(["devloop"])?;
    assert!(load_config(None, &args.config_defaults()).is_err());
    Ok(())
}

#[test]
fn rejects_unknown_log_level() {
    assert!(CliArgs::try_parse_from(["devloop", "--log-level", "loud"]).is_err());
}
