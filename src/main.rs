//! # Leadwatch: terminal notifier
//!
//! Polls the admin API for due reminders and new leads and shows them one at
//! a time in the terminal.
//!
//! Usage:
//!   leadwatch --token <TOKEN>                 # Watch with ~/.leadwatch/config.toml
//!   leadwatch --base-url https://crm/api      # Override API location
//!   LEADWATCH_TOKEN=... leadwatch --no-sound  # Token from env, no bell
//!
//! Press Enter to dismiss the current notification, Ctrl-C to stop.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use leadwatch_api::HttpConnector;
use leadwatch_core::traits::{AlertSound, SilentAlert};
use leadwatch_core::{LeadwatchConfig, SystemClock};
use leadwatch_notify::{NotificationCenter, ToastLevel};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "leadwatch",
    version,
    about = "🔔 Leadwatch: reminder and new-lead notifier"
)]
struct Cli {
    /// Config file (default: ~/.leadwatch/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Admin API base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Session token
    #[arg(long, env = "LEADWATCH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Do not ring the terminal bell
    #[arg(long)]
    no_sound: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Rings the terminal bell.
struct TerminalBell;

impl AlertSound for TerminalBell {
    fn play(&self) {
        let mut out = std::io::stdout();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    }
}

fn load_config(cli: &Cli) -> Result<LeadwatchConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let path = PathBuf::from(shellexpand::tilde(path).to_string());
            LeadwatchConfig::load_from(&path)
                .with_context(|| format!("loading config {}", path.display()))?
        }
        None => LeadwatchConfig::load().context("loading default config")?,
    };
    if let Some(url) = &cli.base_url {
        config.api.base_url = url.clone();
    }
    if let Some(token) = &cli.token {
        config.api.token = token.clone();
    }
    if cli.no_sound {
        config.notify.sound = false;
    }
    Ok(config)
}

// The pollers share one thread so an aborted task never runs alongside its
// replacement; the arbiter's session tickets cover the rest.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "leadwatch=debug" } else { "leadwatch=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config = load_config(&cli)?;
    if config.api.token.trim().is_empty() {
        anyhow::bail!("no session token: pass --token, set LEADWATCH_TOKEN, or set api.token in the config");
    }

    let sound: Arc<dyn AlertSound> = if config.notify.sound {
        Arc::new(TerminalBell)
    } else {
        Arc::new(SilentAlert)
    };
    let clock = Arc::new(SystemClock);
    let center = NotificationCenter::new(
        config.notify.clone(),
        Arc::new(HttpConnector::from_config(&config.api).with_clock(clock.clone())),
        clock,
        sound,
    );

    let mut envelopes = center.subscribe_envelope();
    let mut badge = center.subscribe_badge();
    let mut toasts = center.subscribe_toasts();
    let mut rejected = center.subscribe_session_rejected();

    center.on_session_start(&config.api.token)?;
    println!("🔔 Leadwatch watching {}", config.api.base_url);
    println!("   Enter = dismiss, Ctrl-C = quit\n");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            changed = envelopes.changed() => {
                if changed.is_err() {
                    break;
                }
                match envelopes.borrow_and_update().as_ref() {
                    Some(envelope) => println!("\n┌ {}\n└ (Enter to dismiss)", envelope.summary()),
                    None => println!("  dismissed"),
                }
            }
            changed = badge.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("📋 Pending leads: {}", *badge.borrow_and_update());
            }
            toast = toasts.recv() => {
                match toast {
                    Ok(toast) => {
                        let icon = match toast.level {
                            ToastLevel::Info => "ℹ️",
                            ToastLevel::Success => "✅",
                            ToastLevel::Warning => "⚠️",
                            ToastLevel::Error => "❌",
                        };
                        println!("{icon} {}", toast.message);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        tracing::debug!("dropped {n} toasts");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            changed = rejected.changed() => {
                if changed.is_err() {
                    break;
                }
                if *rejected.borrow_and_update() {
                    tracing::warn!("🔒 Session token rejected by the API, stopping");
                    center.on_session_end();
                    println!("\n🔒 Session expired. Sign in again and restart with a fresh token.");
                    break;
                }
            }
            line = stdin.next_line(), if stdin_open => {
                match line {
                    Ok(Some(_)) => {
                        center.request_close();
                    }
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        tracing::warn!("⚠️ stdin read failed: {e}");
                        stdin_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                center.on_session_end();
                println!("\n👋 Stopped.");
                break;
            }
        }
    }

    Ok(())
}
