//! Device listing and active-device selection.

use crate::context::build_core;
use crate::types::{ActiveDeviceTypeArg, DeviceFlagArg};
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    command: DevicesCommand,
}

#[derive(Subcommand)]
enum DevicesCommand {
    /// List devices matching a filter
    List {
        /// Which devices to include
        #[arg(long, value_enum, default_value = "output")]
        flag: DeviceFlagArg,
    },

    /// Activate a device by category (`SetDeviceActive`)
    Select {
        /// Device category to activate
        #[arg(long, value_enum)]
        active_device_type: ActiveDeviceTypeArg,
    },
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    let core = build_core()?;

    match args.command {
        DevicesCommand::List { flag } => {
            let devices = core.router.get_devices(flag.into());
            if devices.is_empty() {
                println!("No devices match that filter.");
                return Ok(());
            }
            println!("{:<14} {:<8} {:<6} {}", "TYPE", "ROLE", "ID", "NETWORK");
            for d in devices {
                let network = if d.network_id.is_empty() {
                    "local".to_string()
                } else {
                    d.network_id
                };
                println!(
                    "{:<14} {:<8} {:<6} {}",
                    format!("{:?}", d.device_type),
                    format!("{:?}", d.role),
                    d.device_id,
                    network
                );
            }
        }

        DevicesCommand::Select { active_device_type } => {
            core.router.set_device_active(active_device_type.into(), true)?;
            println!("Activated device category {active_device_type:?}");
        }
    }

    Ok(())
}
