//! Simulated focus activation/deactivation, for exercising the interrupt
//! arbitration engine without a real renderer/capturer session.

use crate::context::build_core;
use crate::types::StreamTypeArg;
use audiocore_types::SessionId;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct FocusArgs {
    #[command(subcommand)]
    command: FocusCommand,
}

#[derive(Subcommand)]
enum FocusCommand {
    /// Register a callback and activate focus for a renderer session
    Activate {
        #[arg(long)]
        session: u32,
        #[arg(long, value_enum)]
        stream_type: StreamTypeArg,
        #[arg(long, default_value_t = 1000)]
        pid: u32,
        #[arg(long, default_value_t = 0)]
        client_uid: u32,
        #[arg(long, default_value_t = 1)]
        token_id: u64,
    },

    /// Deactivate focus and unregister the callback for a session
    Deactivate {
        #[arg(long)]
        session: u32,
    },

    /// Request the legacy single-slot audio focus
    LegacyRequest {
        #[arg(long)]
        session: u32,
    },

    /// Abandon the legacy single-slot audio focus
    LegacyAbandon {
        #[arg(long)]
        session: u32,
    },
}

pub fn run(args: FocusArgs) -> anyhow::Result<()> {
    let core = build_core()?;

    match args.command {
        FocusCommand::Activate {
            session,
            stream_type,
            pid,
            client_uid,
            token_id,
        } => {
            core.start_renderer_session(
                SessionId(session),
                stream_type.into(),
                pid,
                client_uid,
                token_id,
            )?;
            println!("session {session} activated");
        }

        FocusCommand::Deactivate { session } => {
            core.stop_renderer_session(SessionId(session))?;
            println!("session {session} deactivated");
        }

        FocusCommand::LegacyRequest { session } => {
            core.interrupt.request_legacy_focus(SessionId(session))?;
            println!("session {session} holds the legacy focus slot");
        }

        FocusCommand::LegacyAbandon { session } => {
            core.interrupt.abandon_legacy_focus(SessionId(session));
            println!("session {session} abandoned the legacy focus slot");
        }
    }

    Ok(())
}
