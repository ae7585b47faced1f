//! Deskpilot application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize tracing on stderr
//! 3. Build the adapter and the command router
//! 4. Run one command (`--command`) or the interactive loop

mod cli;

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use deskpilot_action::{ActionResult, ActionStatus, CommandAdapter, DryRunAdapter, SystemAdapter};
use deskpilot_brain::CommandRouter;
use deskpilot_core::config::{expand_home, DeskpilotConfig};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::CliArgs;

const BANNER: &str = "
+--------------------------------------------------------------+
|                          DESKPILOT                           |
|                Local-first desktop assistant                 |
+--------------------------------------------------------------+
|  Type 'help' for commands  -  Type 'exit' to quit            |
+--------------------------------------------------------------+";

const PROMPT: &str = "deskpilot> ";

/// Short tag printed in front of each reply.
fn status_icon(status: ActionStatus) -> &'static str {
    match status {
        ActionStatus::Success => "[ok]",
        ActionStatus::Failure => "[error]",
        ActionStatus::PendingConfirmation => "[confirm]",
        ActionStatus::Cancelled => "[cancelled]",
        ActionStatus::BlockedSafeMode => "[safe mode]",
        ActionStatus::BlockedCooldown => "[wait]",
        ActionStatus::BlockedRateLimit => "[slow down]",
        ActionStatus::BlockedKillSwitch => "[stopped]",
    }
}

fn render(result: &ActionResult) -> String {
    match result.status {
        ActionStatus::PendingConfirmation => format!("\n{}", result.message),
        status => format!("{} {}", status_icon(status), result.message),
    }
}

fn build_adapter(
    config: &DeskpilotConfig,
    dry_run: bool,
) -> Result<Box<dyn SystemAdapter>, Box<dyn std::error::Error>> {
    if dry_run {
        return Ok(Box::new(DryRunAdapter::new()));
    }
    let adapter = CommandAdapter::for_current_platform(&config.adapter)?;
    tracing::info!(platform = %adapter.platform(), "Command adapter ready");
    Ok(Box::new(adapter))
}

/// Read lines until exit, EOF, or a fatal stdin error.
async fn run_interactive(router: &mut CommandRouter, quiet: bool) -> std::io::Result<()> {
    if !quiet {
        println!("{}", BANNER);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n{}", PROMPT);
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!("\nInterrupted. Type 'exit' to quit or continue typing.");
                continue;
            }
        };

        let Some(line) = line else {
            // EOF
            println!("\nGoodbye!");
            return Ok(());
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let result = router.process(input);
        println!("{}", render(&result));
        if result.is_exit() {
            return Ok(());
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = if config_file.exists() {
        DeskpilotConfig::load_or_default(&config_file)
    } else {
        DeskpilotConfig::default()
    };
    if args.safe_mode {
        config.safety.safe_mode = true;
    }

    // Tracing. RUST_LOG wins over the flag and the config file.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    tracing::info!("Starting Deskpilot v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    if args.write_config {
        config.save(&config_file)?;
        println!("Configuration written to {}", config_file.display());
        return Ok(ExitCode::SUCCESS);
    }

    let data_dir = expand_home(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::warn!(path = %data_dir.display(), error = %e, "Failed to create data directory");
    }

    // Router.
    let adapter = build_adapter(&config, args.dry_run)?;
    let mut router = CommandRouter::new(&config, adapter);
    if args.kill_switch {
        router.safety().activate_kill_switch();
    }
    tracing::info!(
        adapter = router.adapter_name(),
        safe_mode = router.safety().is_safe_mode(),
        cooldown_ms = router.safety().cooldown().as_millis() as u64,
        max_per_minute = router.safety().max_commands_per_minute(),
        "Command router ready"
    );

    // One-shot mode.
    if let Some(command) = args.command.as_deref() {
        let result = router.process(command);
        println!("{}", result.message);
        return Ok(if result.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    run_interactive(&mut router, args.quiet).await?;

    let stats = router.context().stats();
    tracing::info!(
        session_id = %stats.session_id,
        total_commands = stats.total_commands,
        success_rate = stats.success_rate,
        "Session ended"
    );
    Ok(ExitCode::SUCCESS)
}
