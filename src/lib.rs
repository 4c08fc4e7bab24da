// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod live;
pub mod logging;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_config, ConfigFile};
use crate::engine::{Debouncer, Dispatcher, RuleSet, Runtime, RuntimeEvent};
use crate::exec::ShellRunner;
use crate::live::LiveReloadHub;
use crate::watch::{spawn_watcher, IgnoreFilter};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (CLI flags as defaults, optional config file on top)
/// - the live reload server, bound before anything is watched
/// - the file watcher
/// - Ctrl-C handling
/// - debouncer, dispatcher and the runtime loop
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_config(args.config.as_deref(), &args.config_defaults())?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let rules = RuleSet::from_config(&cfg)?;

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let hub = if cfg.live_reload() {
        let hub = Arc::new(LiveReloadHub::new());
        let listener = live::bind(cfg.live_reload_port()).await?;
        live::spawn_server(listener, Arc::clone(&hub));
        Some(hub)
    } else {
        None
    };

    let filter = IgnoreFilter::new(cfg.ignore_dirs().iter().cloned(), cfg.ignore_match());
    // Dropping the handle stops watching, so keep it alive for the whole run.
    let _watcher_handle = spawn_watcher(cfg.watch_dirs(), filter, rt_tx.clone())?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let backend = Arc::new(ShellRunner::new(cfg.command_timeout()));
    let dispatcher = Dispatcher::new(rules, backend);
    let debouncer = Debouncer::new(cfg.debounce());

    info!(
        watch_dirs = ?cfg.watch_dirs(),
        rules = cfg.rules().len(),
        "devloop watching for changes"
    );

    let runtime = Runtime::new(rt_rx, debouncer, dispatcher, hub);
    runtime.run().await?;
    Ok(())
}

/// Simple dry-run output: print the effective configuration.
fn print_dry_run(cfg: &ConfigFile) {
    println!("devloop dry-run");
    println!("  watch_dirs = {:?}", cfg.watch_dirs());
    println!("  ignore_dirs = {:?} ({})", cfg.ignore_dirs(), cfg.ignore_match());
    println!("  debounce = {:?}", cfg.debounce());
    match cfg.command_timeout() {
        Some(timeout) => println!("  command_timeout = {timeout:?}"),
        None => println!("  command_timeout = none"),
    }
    if cfg.live_reload() {
        println!(
            "  live_reload = on (ws://0.0.0.0:{}{})",
            cfg.live_reload_port(),
            live::LIVE_RELOAD_PATH
        );
    } else {
        println!("  live_reload = off");
    }
    println!();

    println!("rules ({}):", cfg.rules().len());
    for (idx, rule) in cfg.rules().iter().enumerate() {
        println!("  - rule {idx}");
        println!("      patterns: {:?}", rule.patterns);
        for command in &rule.commands {
            let mut flags = Vec::new();
            if command.parallel {
                flags.push("parallel");
            }
            if command.restart {
                flags.push("restart");
            }
            if flags.is_empty() {
                println!("      cmd: {}", command.cmd);
            } else {
                println!("      cmd: {} [{}]", command.cmd, flags.join(", "));
            }
        }
    }

    debug!("dry-run complete (no execution)");
}
