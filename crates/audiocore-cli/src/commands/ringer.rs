//! Device-wide ringer mode.

use crate::context::build_core;
use crate::types::RingerModeArg;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct RingerArgs {
    #[command(subcommand)]
    command: RingerCommand,
}

#[derive(Subcommand)]
enum RingerCommand {
    /// Print the current ringer mode
    Get,

    /// Set the ringer mode
    Set {
        #[arg(long, value_enum)]
        mode: RingerModeArg,
    },
}

pub fn run(args: RingerArgs) -> anyhow::Result<()> {
    let core = build_core()?;

    match args.command {
        RingerCommand::Get => {
            println!("{:?}", core.volume_store.ringer_mode());
        }

        RingerCommand::Set { mode } => {
            core.set_ringer_mode(mode.into())?;
            println!("ringer mode set to {mode:?}");
        }
    }

    Ok(())
}
