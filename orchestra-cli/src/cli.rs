use clap::{Parser, Subcommand};

#[derive(Debug, Parser, Clone)]
#[command(name = "orchestra-cli")]
#[command(about = "Manage musicians and playback on a conductor")]
pub struct Cli {
    /// Base URL of the conductor.
    #[arg(
        long,
        global = true,
        env = "CONDUCTOR_ADDR",
        default_value = "http://localhost:8080"
    )]
    pub conductor_addr: String,

    /// Print responses as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Register a musician by hex id and address.
    Add { id: String, address: String },
    /// Unregister a musician.
    Delete { id: String },
    /// List registered musicians in registration order.
    List,
    /// Play a score from the conductor's score directory.
    Play { score: String },
    Pause,
    Resume,
    Stop,
    /// Show playback state and the last session summary.
    Status,
}
