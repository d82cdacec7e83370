//! Open/close/list driver-backed module ports, against either the null
//! driver or a WAV file, exercising the real HDI timing-engine IO threads.

use audiocore_adapter::EngineControl;
use audiocore_hdi::driver::SampleAttrs;
use audiocore_hdi::file_driver::{FileDriverEndpoint, FileSourceEndpoint};
use audiocore_hdi::null_driver::NullDriverEndpoint;
use audiocore_hdi::sink::{MixerSource, RenderChunk, SinkMessage, SinkState, SinkTimingEngine};
use audiocore_hdi::source::{
    MicMuteSource, MixerSink, SourceMessage, SourceState, SourceTimingEngine,
};
use audiocore_types::{AdapterLib, AudioModuleInfo, IoHandle, SampleFormat};
use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::thread;

use crate::context::build_core;

/// Which module direction to open.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PortKind {
    Sink,
    Source,
}

/// Which backing driver to open the port against.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PortDriver {
    Null,
    File,
}

#[derive(Args)]
pub struct PortsArgs {
    #[command(subcommand)]
    command: PortsCommand,
}

#[derive(Subcommand)]
enum PortsCommand {
    /// Open a module port and run its IO thread until Ctrl-C or a close
    Open {
        #[arg(long, value_enum)]
        kind: PortKind,
        #[arg(long, value_enum, default_value = "null")]
        driver: PortDriver,
        /// Sink/source name registered with the mixing daemon
        #[arg(long)]
        name: String,
        /// Backing WAV file, required when `--driver file`
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long, default_value_t = 48_000)]
        rate: u32,
        #[arg(long, default_value_t = 2)]
        channels: u16,
        /// Seconds to run the IO thread before closing the port
        #[arg(long, default_value_t = 2)]
        run_secs: u64,
    },

    /// List modules currently loaded in this process
    List,
}

struct SilenceSource {
    frame_bytes: usize,
}

impl MixerSource for SilenceSource {
    fn render(&mut self, max_bytes: usize) -> RenderChunk {
        RenderChunk {
            data: vec![0u8; self.frame_bytes.min(max_bytes).max(self.frame_bytes)],
        }
    }
}

struct DiscardSink;

impl MixerSink for DiscardSink {
    fn post(&mut self, _data: &[u8]) {}
}

struct FixedMicMute(bool);

impl MicMuteSource for FixedMicMute {
    fn mic_muted(&self) -> bool {
        self.0
    }
}

pub fn run(args: PortsArgs) -> anyhow::Result<()> {
    let core = build_core()?;

    match args.command {
        PortsCommand::Open {
            kind,
            driver,
            name,
            path,
            rate,
            channels,
            run_secs,
        } => open_port(&core, kind, driver, name, path, rate, channels, run_secs)?,

        PortsCommand::List => {
            let modules = core.registry.list_modules();
            if modules.is_empty() {
                println!("No modules currently loaded.");
            }
            for m in modules {
                println!("{} -> {:?} ({:?})", m.handle, m.config.lib, m.state);
            }
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn open_port(
    core: &crate::context::Core,
    kind: PortKind,
    driver: PortDriver,
    name: String,
    path: Option<PathBuf>,
    rate: u32,
    channels: u16,
    run_secs: u64,
) -> anyhow::Result<()> {
    let lib = match (kind, driver) {
        (PortKind::Sink, PortDriver::Null) | (PortKind::Sink, PortDriver::File) => {
            AdapterLib::HdiSink
        }
        (PortKind::Source, PortDriver::Null) | (PortKind::Source, PortDriver::File) => {
            AdapterLib::HdiSource
        }
    };
    if matches!(driver, PortDriver::File) && path.is_none() {
        anyhow::bail!("--path is required when --driver file is used");
    }

    let config = AudioModuleInfo {
        lib,
        name: name.clone(),
        adapter_name: "primary".to_string(),
        class_name: "file-io".to_string(),
        rate,
        channels,
        format: SampleFormat::S16Le,
        buffer_size: 8192,
        file_name: path.as_ref().map(|p| p.display().to_string()),
        network_id: String::new(),
        device_type: "speaker".to_string(),
        fixed_latency: false,
        render_in_idle_state: false,
        test_mode_on: false,
    };

    let attrs = SampleAttrs {
        rate,
        channels,
        bytes_per_frame: u32::from(channels) * 2,
    };

    let handle = core.registry.open_audio_port(config, |handle: IoHandle| {
        spawn_engine(handle, kind, driver, path, attrs)
    })?;

    println!("opened {handle} ({name}), running for {run_secs}s");
    thread::sleep(std::time::Duration::from_secs(run_secs));
    core.registry.close_audio_port(handle)?;
    println!("closed {handle}");
    Ok(())
}

type SpawnResult = audiocore_types::Result<(Box<dyn EngineControl>, thread::JoinHandle<()>)>;

fn spawn_engine(
    handle: IoHandle,
    kind: PortKind,
    driver: PortDriver,
    path: Option<PathBuf>,
    attrs: SampleAttrs,
) -> SpawnResult {
    match kind {
        PortKind::Sink => spawn_sink(handle, driver, path, attrs),
        PortKind::Source => spawn_source(handle, driver, path, attrs),
    }
}

fn spawn_sink(
    handle: IoHandle,
    driver: PortDriver,
    path: Option<PathBuf>,
    attrs: SampleAttrs,
) -> SpawnResult {
    let mixer = SilenceSource {
        frame_bytes: attrs.bytes_per_frame as usize * 480,
    };
    let (tx, rx) = crossbeam_channel::unbounded::<SinkMessage>();
    let tx_control = tx.clone();

    let join = match driver {
        PortDriver::Null => {
            let ep = NullDriverEndpoint::new(format!("sink-{}", handle.0), attrs);
            let engine = SinkTimingEngine::open(ep, mixer, 20_000)?;
            thread::spawn(move || {
                let exit = engine.run(&rx);
                tracing::info!(?handle, ?exit, "sink IO thread exited");
            })
        }
        PortDriver::File => {
            let path = path.expect("checked by caller");
            let ep = FileDriverEndpoint::create(format!("sink-{}", handle.0), &path, attrs)?;
            let engine = SinkTimingEngine::open(ep, mixer, 20_000)?;
            thread::spawn(move || {
                let exit = engine.run(&rx);
                tracing::info!(?handle, ?exit, "sink IO thread exited");
            })
        }
    };

    let _ = tx.send(SinkMessage::SetState {
        new_state: SinkState::Running,
    });
    Ok((Box::new(SinkControl(tx_control)), join))
}

fn spawn_source(
    handle: IoHandle,
    driver: PortDriver,
    path: Option<PathBuf>,
    attrs: SampleAttrs,
) -> SpawnResult {
    let sink = DiscardSink;
    let mic_mute = FixedMicMute(false);
    let (tx, rx) = crossbeam_channel::unbounded::<SourceMessage>();
    let tx_control = tx.clone();

    let join = match driver {
        PortDriver::Null => {
            let ep = NullDriverEndpoint::new(format!("source-{}", handle.0), attrs);
            let engine = SourceTimingEngine::open(ep, sink, mic_mute, 20_000)?;
            thread::spawn(move || {
                let exit = engine.run(&rx);
                tracing::info!(?handle, ?exit, "source IO thread exited");
            })
        }
        PortDriver::File => {
            let path = path.expect("checked by caller");
            let ep = FileSourceEndpoint::open(format!("source-{}", handle.0), &path, attrs)?;
            let engine = SourceTimingEngine::open(ep, sink, mic_mute, 20_000)?;
            thread::spawn(move || {
                let exit = engine.run(&rx);
                tracing::info!(?handle, ?exit, "source IO thread exited");
            })
        }
    };

    let _ = tx.send(SourceMessage::SetState {
        new_state: SourceState::Running,
    });
    Ok((Box::new(SourceControl(tx_control)), join))
}

struct SinkControl(crossbeam_channel::Sender<SinkMessage>);

impl EngineControl for SinkControl {
    fn request_shutdown(&self) {
        let _ = self.0.send(SinkMessage::Shutdown);
    }
}

struct SourceControl(crossbeam_channel::Sender<SourceMessage>);

impl EngineControl for SourceControl {
    fn request_shutdown(&self) {
        let _ = self.0.send(SourceMessage::Shutdown);
    }
}
