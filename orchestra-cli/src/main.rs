mod cli;

use anyhow::Context;
use clap::Parser;
use conductor::client::ConductorClient;
use shared_types::{SessionStatus, WorkerId};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = ConductorClient::new(&cli.conductor_addr, reqwest::Client::new())?;
    tracing::debug!(conductor = %cli.conductor_addr, command = ?cli.command, "running command");

    match cli.command {
        Command::Add { id, address } => {
            let id: WorkerId = id.parse().context("invalid musician id")?;
            client.register(id, &address).await?;
            println!("musician {id} registered at {address}");
        }
        Command::Delete { id } => {
            let id: WorkerId = id.parse().context("invalid musician id")?;
            client.unregister(id).await?;
            println!("musician {id} removed");
        }
        Command::List => {
            let workers = client.workers().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&workers)?);
            } else if workers.is_empty() {
                println!("no musicians registered");
            } else {
                for (position, worker) in workers.iter().enumerate() {
                    println!("{position:>3}  {}  {}", worker.id, worker.address);
                }
            }
        }
        Command::Play { score } => {
            let session_id = client.play(&score).await?;
            println!("playing {score} (session {session_id})");
        }
        Command::Pause => {
            client.pause().await?;
            println!("paused");
        }
        Command::Resume => {
            client.resume().await?;
            println!("resumed");
        }
        Command::Stop => {
            client.stop().await?;
            println!("stopped");
        }
        Command::Status => {
            let status = client.status().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }
    }
    Ok(())
}

fn print_status(status: &SessionStatus) {
    let paused = if status.paused { " (paused)" } else { "" };
    println!("state:     {}{paused}", status.state);
    println!("musicians: {}", status.workers);
    println!("sessions:  {}", status.sessions_completed);
    if let Some(last) = &status.last_session {
        println!("last session {}:", last.session_id);
        println!(
            "  tracks {} routed {} dropped {:?}",
            last.tracks, last.routed_tracks, last.dropped_tracks
        );
        println!(
            "  delivered {} failed {} skipped {}{}",
            last.delivered,
            last.failed,
            last.skipped,
            if last.cancelled { " (stopped)" } else { "" }
        );
    }
}
