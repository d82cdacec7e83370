//! Process-local `AudioCore` construction for the CLI: in-process stand-ins
//! for the mixing daemon and route driver a real deployment backs with the
//! HDI and a live mixer, since this binary drives one-shot commands rather
//! than hosting a long-lived daemon connection.

use audiocore_adapter::{
    DaemonCommand, DaemonReply, MainLoopDaemon, ModuleRegistry, ServiceAdapter, SinkInputSnapshot,
};
use audiocore_policy::{paths, AudioCore, RouteDriver, RouteHandle};
use audiocore_types::{
    AudioCategory, AudioRoute, ConnectType, DeviceDescriptor, DeviceRole, DeviceType, IoHandle,
    PinType, Result,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// Stands in for the mixing daemon's single main-loop thread: tracks
/// loaded modules in memory instead of submitting to a real daemon
/// process.
pub struct LocalDaemon {
    next_handle: AtomicU32,
    modules: Mutex<HashMap<IoHandle, String>>,
}

impl LocalDaemon {
    fn new() -> Self {
        Self {
            next_handle: AtomicU32::new(1),
            modules: Mutex::new(HashMap::new()),
        }
    }
}

impl MainLoopDaemon for LocalDaemon {
    fn submit(&self, cmd: DaemonCommand) -> Result<DaemonReply> {
        match cmd {
            DaemonCommand::OpenAudioPort { lib_name, .. } => {
                let handle = IoHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
                self.modules.lock().insert(handle, lib_name);
                Ok(DaemonReply::Handle(handle))
            }
            DaemonCommand::CloseAudioPort(handle) => {
                self.modules.lock().remove(&handle);
                Ok(DaemonReply::Ack)
            }
            _ => Ok(DaemonReply::Ack),
        }
    }

    fn sink_inputs(&self) -> Vec<SinkInputSnapshot> {
        Vec::new()
    }
}

/// Stands in for a real `DriverEndpoint`-backed route driver: logs every
/// route/scene/default-endpoint change instead of touching hardware.
pub struct LoggingRouteDriver;

impl RouteDriver for LoggingRouteDriver {
    fn update_audio_route(&self, route: &AudioRoute) -> Result<RouteHandle> {
        tracing::info!(
            device = ?route.device.device_type,
            category = ?route.category,
            "route updated"
        );
        Ok(RouteHandle(1))
    }

    fn release_audio_route(&self, _handle: RouteHandle) {}

    fn select_scene(&self, category: AudioCategory, pin: PinType) -> Result<()> {
        tracing::info!(?category, ?pin, "scene selected");
        Ok(())
    }

    fn set_default_sink(&self, name: &str) -> Result<()> {
        tracing::info!(name, "default sink set");
        Ok(())
    }

    fn set_default_source(&self, name: &str) -> Result<()> {
        tracing::info!(name, "default source set");
        Ok(())
    }
}

/// The concrete `AudioCore` instantiation every CLI command runs against.
pub type Core = AudioCore<LocalDaemon, LoggingRouteDriver>;

/// Build the process-local context: opens the persistent volume store at
/// the platform-default root and seeds a speaker/mic pair plus a wired
/// headset so routing commands have something to select between.
pub fn build_core() -> Result<Core> {
    let adapter = ServiceAdapter::new(LocalDaemon::new());
    adapter.mark_connecting();
    adapter.mark_ready();
    let registry = ModuleRegistry::new(adapter);
    let core = AudioCore::new(registry, LoggingRouteDriver, paths::store_root())?;
    seed_demo_devices(&core);
    Ok(core)
}

fn demo_device(device_type: DeviceType, role: DeviceRole, device_id: u32) -> DeviceDescriptor {
    DeviceDescriptor {
        device_type,
        role,
        device_id,
        network_id: String::new(),
        connect_type: ConnectType::Local,
        mac_address: String::new(),
        channel_mask: 0b11,
        sample_rates: vec![48000],
        connected_at: Instant::now(),
    }
}

fn seed_demo_devices(core: &Core) {
    core.on_device_connected(demo_device(DeviceType::Speaker, DeviceRole::Output, 1));
    core.on_device_connected(demo_device(DeviceType::Mic, DeviceRole::Input, 2));
    core.on_device_connected(demo_device(DeviceType::WiredHeadset, DeviceRole::Output, 3));
}
