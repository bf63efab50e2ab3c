//! CLI command handling
//!
//! Dispatches CLI commands to the daemon and formats output.

use chrono::{Local, Utc};
use colored::{ColoredString, Colorize};
use tokio::io::BufReader;
use tokio::sync::broadcast;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::daemon::{DaemonClient, HealthReport, SessionStats};
use crate::relay::message::{CommandReply, DAEMON_OFFLINE_MESSAGE};
use crate::relay::{bridge, RemoteView, StatusRelay, UiState};
use crate::status::format_elapsed;

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, mut config: Config) -> Result<()> {
    let client = DaemonClient::from_config(&config)?;

    match command {
        Commands::Start { follow } => {
            let mut view = RemoteView::new();
            view.begin_start();
            println!("{}...", state_label(view.state()));

            let reply = CommandReply::from_start(&client.start().await);
            view.finish_start(&reply, Utc::now());
            if let Some(error) = view.last_error() {
                return Err(Error::Command(format!("Failed to start service: {}", error)));
            }

            println!("{} Decoy service started", "✓".green());

            if follow {
                follow_updates(client, &config, view, false).await?;
            }
            Ok(())
        }

        Commands::Stop => {
            let ack = client.stop().await?;
            println!(
                "{} {}",
                "✓".green(),
                ack.message.as_deref().unwrap_or("Decoy service stopped")
            );
            Ok(())
        }

        Commands::Status { json } => {
            let report = client.status().await;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let mut view = RemoteView::new();
                view.apply_status(&report, Utc::now());
                print_view(&view);
            }
            Ok(())
        }

        Commands::Watch { interval_ms, json } => {
            override_interval(&mut config, interval_ms)?;
            follow_updates(client, &config, RemoteView::new(), json).await
        }

        Commands::Bridge { interval_ms } => {
            override_interval(&mut config, interval_ms)?;

            let (handle, task) = StatusRelay::spawn(client, &config.relay);
            let served = bridge::serve(
                &handle,
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
            )
            .await;

            handle.shutdown();
            task.await
                .map_err(|e| Error::Internal(format!("Status relay task failed: {}", e)))?;
            served
        }

        Commands::Health => {
            let health = client.health().await?;
            print_health(&health, client.base_url());

            if !health.is_healthy() {
                return Err(Error::Command(format!(
                    "Daemon reports status '{}'",
                    health.status
                )));
            }
            Ok(())
        }

        Commands::Schedule { interval, duration } => {
            let ack = client.schedule(interval, duration).await?;
            println!(
                "{} {}",
                "✓".green(),
                ack.message.as_deref().unwrap_or("Service scheduled")
            );
            println!(
                "  A {}-minute session will run every {} minutes",
                duration, interval
            );
            Ok(())
        }

        Commands::DaemonConfig => {
            let settings = client.daemon_config().await?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}

fn override_interval(config: &mut Config, interval_ms: Option<u64>) -> Result<()> {
    if let Some(ms) = interval_ms {
        if ms == 0 {
            return Err(Error::Config("--interval-ms must be non-zero".to_string()));
        }
        config.relay.poll_interval_ms = ms;
    }
    Ok(())
}

/// Run a relay and print every update until Ctrl+C
async fn follow_updates(
    client: DaemonClient,
    config: &Config,
    mut view: RemoteView,
    json: bool,
) -> Result<()> {
    let (handle, task) = StatusRelay::spawn(client, &config.relay);
    let mut updates = handle.subscribe();

    if !json {
        println!("{}", "Following service status (Ctrl+C to stop)".dimmed());
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            update = updates.recv() => match update {
                Ok(update) => {
                    if !view.apply_push(&update, Utc::now()) {
                        continue;
                    }
                    if json {
                        println!("{}", serde_json::to_string(&update)?);
                    } else {
                        println!("{}", status_line(&view));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Fell behind on status updates");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    handle.shutdown();
    task.await
        .map_err(|e| Error::Internal(format!("Status relay task failed: {}", e)))?;
    Ok(())
}

fn state_label(state: UiState) -> ColoredString {
    let label = state.to_string();
    match state {
        UiState::Inactive => label.dimmed(),
        UiState::Starting => label.yellow(),
        UiState::Running => label.green().bold(),
    }
}

fn print_view(view: &RemoteView) {
    let status = view.status();

    println!("Service: {}", state_label(view.state()));
    if status.daemon_online {
        println!("Daemon:  {}", "online".green());
    } else {
        println!("Daemon:  {}", "offline".red());
        println!("{}", DAEMON_OFFLINE_MESSAGE.dimmed());
        return;
    }

    if let Some(elapsed) = status.elapsed(Utc::now()) {
        println!("Elapsed: {}", format_elapsed(elapsed));
    }
    print_stats(&status.stats);
}

fn print_stats(stats: &SessionStats) {
    println!();
    println!("Sites visited:      {}", stats.sites_visited);
    println!("Clicks made:        {}", stats.clicks_made);
    println!("Searches performed: {}", stats.searches_performed);
}

/// One line per update: time, state, elapsed time and counters
fn status_line(view: &RemoteView) -> String {
    let status = view.status();
    let time = Local::now().format("%H:%M:%S");

    if !status.daemon_online {
        return format!("[{}] {} {}", time, state_label(view.state()), "(daemon offline)".red());
    }

    let elapsed = status
        .elapsed(Utc::now())
        .map(format_elapsed)
        .unwrap_or_else(|| "-".to_string());

    format!(
        "[{}] {} {:>6}  sites {}  clicks {}  searches {}",
        time,
        state_label(view.state()),
        elapsed,
        status.stats.sites_visited,
        status.stats.clicks_made,
        status.stats.searches_performed
    )
}

fn print_health(health: &HealthReport, base_url: &str) {
    let status = if health.is_healthy() {
        health.status.green()
    } else {
        health.status.red()
    };

    println!("Daemon:  {}", base_url);
    println!("Status:  {}", status);
    if let Some(service) = &health.service {
        println!("Service: {}", service);
    }
    if let Some(version) = &health.version {
        println!("Version: {}", version);
    }
}
