//! Per-stream-type volume and mute.

use crate::context::build_core;
use crate::types::StreamTypeArg;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct VolumeArgs {
    #[command(subcommand)]
    command: VolumeCommand,
}

#[derive(Subcommand)]
enum VolumeCommand {
    /// Print the effective volume for a stream type
    Get {
        #[arg(long, value_enum)]
        stream_type: StreamTypeArg,
    },

    /// Set the stored volume for a stream type, 0.0-1.0
    Set {
        #[arg(long, value_enum)]
        stream_type: StreamTypeArg,
        #[arg(long)]
        level: f32,
    },

    /// Mute or unmute a stream type's volume group
    Mute {
        #[arg(long, value_enum)]
        stream_type: StreamTypeArg,
        #[arg(long)]
        muted: bool,
    },
}

pub fn run(args: VolumeArgs) -> anyhow::Result<()> {
    let core = build_core()?;

    match args.command {
        VolumeCommand::Get { stream_type } => {
            let stream_type = stream_type.into();
            let level = core.volume_store.get_stream_volume(stream_type);
            let muted = core.volume_store.get_stream_mute(stream_type);
            println!("volume: {level:.2} (muted: {muted})");
        }

        VolumeCommand::Set { stream_type, level } => {
            core.set_stream_volume(stream_type.into(), level)?;
            println!("volume set to {level:.2}");
        }

        VolumeCommand::Mute { stream_type, muted } => {
            core.volume_store.set_stream_mute(stream_type.into(), muted)?;
            println!("mute set to {muted}");
        }
    }

    Ok(())
}
