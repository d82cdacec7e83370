//! audiocore CLI - command-line demo/ops surface for the audio routing and
//! playback/capture core.

mod commands;
mod context;
mod types;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "audiocore")]
#[command(author, version, about = "Audio routing and playback/capture core CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List and select audio devices
    Devices(commands::devices::DevicesArgs),
    /// Get/set/mute per-stream-type volume
    Volume(commands::volume::VolumeArgs),
    /// Get/set the device ringer mode
    Ringer(commands::ringer::RingerArgs),
    /// Open/close/list driver-backed module ports
    Ports(commands::ports::PortsArgs),
    /// Simulate focus activation/deactivation for scripted scenarios
    Focus(commands::focus::FocusArgs),
    /// Admin pause/resume of sessions matching a uid and stream type
    StreamState(commands::stream_state::StreamStateArgs),
}

fn main() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();
    let cli = Cli::parse();
    tracing::debug!(command = ?std::mem::discriminant(&cli.command), "dispatching command");
    match cli.command {
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Volume(args) => commands::volume::run(args),
        Commands::Ringer(args) => commands::ringer::run(args),
        Commands::Ports(args) => commands::ports::run(args),
        Commands::Focus(args) => commands::focus::run(args),
        Commands::StreamState(args) => commands::stream_state::run(args),
    }
}
