//! Adapter module registry: owns every loaded `ModuleInstance` and the IO
//! thread backing it, and mediates `OpenAudioPort`/`CloseAudioPort` through
//! a [`ServiceAdapter`].

use crate::service_adapter::MainLoopDaemon;
use crate::ServiceAdapter;
use audiocore_types::{AudioModuleInfo, ErrKind, IoHandle, ModuleInstance, ModuleState, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::thread::JoinHandle;
use tracing::info;

/// A handle an IO thread exposes for shutdown, independent of whether it's
/// a sink or source engine underneath.
pub trait EngineControl: Send {
    /// Ask the IO thread to exit after its current iteration.
    fn request_shutdown(&self);
}

struct LoadedModule {
    instance: ModuleInstance,
    control: Box<dyn EngineControl>,
    join: Option<JoinHandle<()>>,
}

/// Owns every currently loaded [`ModuleInstance`] plus its IO thread,
/// fronted by `OpenAudioPort`/`CloseAudioPort`.
pub struct ModuleRegistry<D: MainLoopDaemon> {
    adapter: ServiceAdapter<D>,
    modules: Mutex<HashMap<IoHandle, LoadedModule>>,
}

impl<D: MainLoopDaemon> ModuleRegistry<D> {
    /// Wrap a service adapter; starts with no modules loaded.
    pub fn new(adapter: ServiceAdapter<D>) -> Self {
        Self {
            adapter,
            modules: Mutex::new(HashMap::new()),
        }
    }

    /// The underlying service adapter, for commands the registry doesn't
    /// wrap directly (volume, mute, default device selection).
    pub fn adapter(&self) -> &ServiceAdapter<D> {
        &self.adapter
    }

    /// `OpenAudioPort(config)`: ask the daemon for a handle, spawn the IO
    /// thread via `spawn_engine`, and record the resulting module instance.
    ///
    /// `spawn_engine` is supplied by the caller because the concrete
    /// `DriverEndpoint`/mixer types differ per module and this registry is
    /// generic only over the daemon, not the IO thread's payload types.
    pub fn open_audio_port(
        &self,
        config: AudioModuleInfo,
        spawn_engine: impl FnOnce(IoHandle) -> Result<(Box<dyn EngineControl>, JoinHandle<()>)>,
    ) -> Result<IoHandle> {
        let handle = self.adapter.open_audio_port(&config)?;
        let (control, join) = spawn_engine(handle).inspect_err(|_| {
            let _ = self.adapter.close_audio_port(handle);
        })?;
        let instance = ModuleInstance {
            handle,
            config,
            state: ModuleState::Active,
        };
        self.modules.lock().insert(
            handle,
            LoadedModule {
                instance,
                control,
                join: Some(join),
            },
        );
        info!(?handle, "opened audio port");
        Ok(handle)
    }

    /// `CloseAudioPort(handle)`: signal the IO thread to shut down, join
    /// it, then release the module record and tell the daemon.
    pub fn close_audio_port(&self, handle: IoHandle) -> Result<()> {
        let loaded = self
            .modules
            .lock()
            .remove(&handle)
            .ok_or_else(|| ErrKind::InvalidHandle(format!("no module loaded for {handle}")))?;

        loaded.control.request_shutdown();
        if let Some(join) = loaded.join {
            let _ = join.join();
        }
        self.adapter.close_audio_port(handle)?;
        info!(?handle, "closed audio port");
        Ok(())
    }

    /// Snapshot of every loaded module's instance record, for diagnostics.
    pub fn list_modules(&self) -> Vec<ModuleInstance> {
        self.modules
            .lock()
            .values()
            .map(|m| m.instance.clone())
            .collect()
    }

    /// Number of currently loaded modules.
    pub fn len(&self) -> usize {
        self.modules.lock().len()
    }

    /// Whether no modules are currently loaded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service_adapter::{DaemonCommand, DaemonReply, SinkInputSnapshot};
    use std::thread;

    struct FakeDaemon;
    impl MainLoopDaemon for FakeDaemon {
        fn submit(&self, cmd: DaemonCommand) -> Result<DaemonReply> {
            match cmd {
                DaemonCommand::OpenAudioPort { .. } => Ok(DaemonReply::Handle(IoHandle(1))),
                _ => Ok(DaemonReply::Ack),
            }
        }
        fn sink_inputs(&self) -> Vec<SinkInputSnapshot> {
            Vec::new()
        }
    }

    struct NopControl(crossbeam_channel::Sender<()>);
    impl EngineControl for NopControl {
        fn request_shutdown(&self) {
            let _ = self.0.send(());
        }
    }

    fn test_config() -> AudioModuleInfo {
        use audiocore_types::{AdapterLib, SampleFormat};
        AudioModuleInfo {
            lib: AdapterLib::HdiSink,
            name: "Speaker_File".to_string(),
            adapter_name: "primary".to_string(),
            class_name: "file-io".to_string(),
            rate: 48000,
            channels: 2,
            format: SampleFormat::S16Le,
            buffer_size: 8192,
            file_name: None,
            network_id: String::new(),
            device_type: "speaker".to_string(),
            fixed_latency: false,
            render_in_idle_state: false,
            test_mode_on: false,
        }
    }

    #[test]
    fn open_then_close_round_trips() {
        let adapter = ServiceAdapter::new(FakeDaemon);
        adapter.mark_connecting();
        adapter.mark_ready();
        let registry = ModuleRegistry::new(adapter);

        let handle = registry
            .open_audio_port(test_config(), |_h| {
                let (tx, rx) = crossbeam_channel::unbounded::<()>();
                let join = thread::spawn(move || {
                    let _ = rx.recv();
                });
                Ok((Box::new(NopControl(tx)) as Box<dyn EngineControl>, join))
            })
            .unwrap();

        assert_eq!(registry.len(), 1);
        registry.close_audio_port(handle).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn close_unknown_handle_errs() {
        let adapter = ServiceAdapter::new(FakeDaemon);
        adapter.mark_connecting();
        adapter.mark_ready();
        let registry = ModuleRegistry::new(adapter);
        assert!(registry.close_audio_port(IoHandle(99)).is_err());
    }
}
