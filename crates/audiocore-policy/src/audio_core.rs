//! Wires the module registry, router, volume store, interrupt engine, and
//! stream tracker into the single context constructed once at process
//! start.

use crate::interrupt::{playback_interrupt, InterruptEngine, InterruptEvent};
use crate::routing::{RouteDriver, Router};
use crate::tracker::{AdminState, StreamChangeInfo, StreamTracker, TrackerChangeEvent, TrackerMode};
use crate::volume_store::VolumeStore;
use audiocore_adapter::{MainLoopDaemon, ModuleRegistry};
use audiocore_types::{
    DeviceDescriptor, DeviceRole, DeviceType, RendererState, Result, SessionId, StreamState,
    StreamType,
};
use std::path::PathBuf;

/// The top-level audio core context: everything a client-facing API (the
/// CLI, or a future IPC surface) calls through.
pub struct AudioCore<D: MainLoopDaemon, R: RouteDriver> {
    /// Module lifecycle and service adapter commands.
    pub registry: ModuleRegistry<D>,
    /// Device selection and route activation.
    pub router: Router<R>,
    /// Persistent volume/mute/ringer state.
    pub volume_store: VolumeStore,
    /// Focus arbitration.
    pub interrupt: InterruptEngine,
    /// Open renderer/capturer session tracking.
    pub tracker: StreamTracker,
}

impl<D: MainLoopDaemon, R: RouteDriver> AudioCore<D, R> {
    /// Construct the context, opening the persistent volume store at
    /// `store_root` and wiring interrupt/tracker callbacks to simple
    /// `tracing` logs (a real client surface would instead subscribe here).
    pub fn new(
        registry: ModuleRegistry<D>,
        route_driver: R,
        store_root: PathBuf,
    ) -> Result<Self> {
        let router = Router::new(route_driver, |change| {
            tracing::info!(?change, "device change");
        });
        let volume_store = VolumeStore::open(store_root)?;
        let interrupt = InterruptEngine::new(|session, event: InterruptEvent| {
            tracing::info!(session = session.0, ?event, "interrupt event");
        });
        let tracker = StreamTracker::new(|event: TrackerChangeEvent| {
            tracing::info!(
                session = event.session_id.0,
                mode = ?event.mode,
                state = ?event.state,
                "tracker change"
            );
        });

        Ok(Self {
            registry,
            router,
            volume_store,
            interrupt,
            tracker,
        })
    }

    /// `SetStreamVolume(type, v)`: persist, then push to every live
    /// sink-input of that type through the service adapter.
    pub fn set_stream_volume(&self, stream_type: StreamType, v: f32) -> Result<()> {
        self.volume_store.set_stream_volume(stream_type, v)?;
        let effective = self.volume_store.get_stream_volume(stream_type);
        self.registry.adapter().set_volume(stream_type, effective)
    }

    /// `SetRingerMode(mode)`: persist, then re-push the effective volume of
    /// every ringer-sensitive stream type — the ringer mode changes their
    /// effective volume immediately without touching the stored per-group
    /// level.
    pub fn set_ringer_mode(&self, mode: audiocore_types::RingerMode) -> Result<()> {
        self.volume_store.set_ringer_mode(mode)?;
        for stream_type in StreamType::ALL {
            if stream_type.ringer_sensitive() {
                let effective = self.volume_store.get_stream_volume(stream_type);
                self.registry.adapter().set_volume(stream_type, effective)?;
            }
        }
        Ok(())
    }

    /// Begin playback focus for a renderer session: registers the session's
    /// interrupt callback and activates it, in the legal `SetCallback ->
    /// Activate` order.
    pub fn start_renderer_session(
        &self,
        session_id: SessionId,
        stream_type: StreamType,
        pid: u32,
        client_uid: u32,
        token_id: u64,
    ) -> Result<()> {
        self.interrupt.set_callback(session_id);
        self.interrupt
            .activate(playback_interrupt(session_id, stream_type, pid))?;
        self.tracker.register(
            TrackerMode::Renderer,
            StreamChangeInfo {
                session_id,
                client_uid,
                token_id,
                stream_type,
                state: StreamState::Renderer(RendererState::Running),
                device: None,
            },
        );
        Ok(())
    }

    /// End a renderer session: deactivates focus, unsets the callback, and
    /// drops tracking.
    pub fn stop_renderer_session(&self, session_id: SessionId) -> Result<()> {
        self.interrupt.deactivate(session_id)?;
        self.interrupt.unset_callback(session_id)?;
        self.tracker.update(
            session_id,
            StreamState::Renderer(RendererState::Stopped),
            None,
        );
        self.tracker.unregister(session_id);
        Ok(())
    }

    /// A device appeared: update the router's table, then re-run the
    /// hot-plug selection algorithm for every active session and apply the
    /// new device wherever the choice changed.
    pub fn on_device_connected(&self, device: DeviceDescriptor) {
        self.router.on_device_connected(device);
        self.reselect_active_sessions();
    }

    /// A device disappeared: tear down its route if it was active, then
    /// re-run selection for every active session the same way a connect
    /// does.
    pub fn on_device_disconnected(
        &self,
        device_type: DeviceType,
        role: DeviceRole,
        device_id: u32,
    ) {
        self.router.on_device_disconnected(device_type, role, device_id);
        self.reselect_active_sessions();
    }

    /// Re-run `select_for_session` for every tracked renderer/capturer
    /// session and apply the result if it differs from what's currently
    /// active for that role (hot-plug steps 3-4).
    fn reselect_active_sessions(&self) {
        for info in self.tracker.renderer_change_infos() {
            self.reselect_one(info.session_id, DeviceRole::Output, info.stream_type);
        }
        for info in self.tracker.capturer_change_infos() {
            self.reselect_one(info.session_id, DeviceRole::Input, info.stream_type);
        }
    }

    fn reselect_one(&self, session_id: SessionId, role: DeviceRole, stream_type: StreamType) {
        let Some(device) = self.router.select_for_session(session_id, role, stream_type) else {
            return;
        };
        let unchanged = self
            .router
            .active_device(role)
            .is_some_and(|active| active.device_id == device.device_id);
        if !unchanged {
            let _ = self.router.apply_selection(role, device);
        }
    }

    /// Admin mic mute toggle, applied at the next (re)init of the source
    /// timing engine.
    pub fn set_mic_mute(&self, muted: bool) -> Result<()> {
        self.volume_store.set_mic_mute(muted)
    }

    /// `UpdateStreamState(uid, setState, streamType)`: admin pause/resume
    /// applied to every renderer/capturer session matching `uid` and
    /// `stream_type`.
    pub fn update_stream_state(
        &self,
        uid: u32,
        stream_type: StreamType,
        set_state: AdminState,
    ) -> Result<()> {
        self.tracker
            .update_stream_state_for_uid(uid, set_state, stream_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::RouteHandle;
    use audiocore_adapter::{
        DaemonCommand, DaemonReply, ServiceAdapter, SinkInputSnapshot,
    };
    use audiocore_types::{AudioCategory, AudioRoute, PinType};
    use tempfile::TempDir;

    struct FakeDaemon;
    impl MainLoopDaemon for FakeDaemon {
        fn submit(&self, cmd: DaemonCommand) -> Result<DaemonReply> {
            match cmd {
                DaemonCommand::OpenAudioPort { .. } => Ok(DaemonReply::Handle(audiocore_types::IoHandle(1))),
                _ => Ok(DaemonReply::Ack),
            }
        }
        fn sink_inputs(&self) -> Vec<SinkInputSnapshot> {
            Vec::new()
        }
    }

    struct FakeRouteDriver;
    impl RouteDriver for FakeRouteDriver {
        fn update_audio_route(&self, _route: &AudioRoute) -> Result<RouteHandle> {
            Ok(RouteHandle(1))
        }
        fn release_audio_route(&self, _handle: RouteHandle) {}
        fn select_scene(&self, _category: AudioCategory, _pin: PinType) -> Result<()> {
            Ok(())
        }
        fn set_default_sink(&self, _name: &str) -> Result<()> {
            Ok(())
        }
        fn set_default_source(&self, _name: &str) -> Result<()> {
            Ok(())
        }
    }

    fn core(dir: &TempDir) -> AudioCore<FakeDaemon, FakeRouteDriver> {
        let adapter = ServiceAdapter::new(FakeDaemon);
        adapter.mark_connecting();
        adapter.mark_ready();
        let registry = ModuleRegistry::new(adapter);
        AudioCore::new(registry, FakeRouteDriver, dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn set_stream_volume_persists_and_pushes() {
        let dir = TempDir::new().unwrap();
        let core = core(&dir);
        core.set_stream_volume(StreamType::Music, 0.4).unwrap();
        assert_eq!(core.volume_store.get_stream_volume(StreamType::Music), 0.4);
    }

    #[test]
    fn start_then_stop_renderer_session_round_trips() {
        let dir = TempDir::new().unwrap();
        let core = core(&dir);
        core.start_renderer_session(SessionId(1), StreamType::Music, 100, 1000, 1)
            .unwrap();
        assert_eq!(core.tracker.renderer_change_infos().len(), 1);
        core.stop_renderer_session(SessionId(1)).unwrap();
        assert!(core.tracker.renderer_change_infos().is_empty());
    }
}
