//! Admin pause/resume of every renderer/capturer session matching a uid
//! and stream type (`UpdateStreamState`).

use crate::context::build_core;
use crate::types::StreamTypeArg;
use audiocore_policy::AdminState;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct StreamStateArgs {
    #[command(subcommand)]
    command: StreamStateCommand,
}

#[derive(Subcommand)]
enum StreamStateCommand {
    /// Force every matching session to pause
    Pause {
        #[arg(long)]
        uid: u32,
        #[arg(long, value_enum)]
        stream_type: StreamTypeArg,
    },

    /// Resume every matching session
    Resume {
        #[arg(long)]
        uid: u32,
        #[arg(long, value_enum)]
        stream_type: StreamTypeArg,
    },
}

pub fn run(args: StreamStateArgs) -> anyhow::Result<()> {
    let core = build_core()?;

    match args.command {
        StreamStateCommand::Pause { uid, stream_type } => {
            core.update_stream_state(uid, stream_type.into(), AdminState::Pause)?;
            println!("uid {uid} paused");
        }

        StreamStateCommand::Resume { uid, stream_type } => {
            core.update_stream_state(uid, stream_type.into(), AdminState::Resume)?;
            println!("uid {uid} resumed");
        }
    }

    Ok(())
}
