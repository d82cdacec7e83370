//! Service adapter: submits driver-endpoint lifecycle and property
//! commands to the mixing daemon's single-threaded main loop and blocks
//! the calling thread until a callback signals completion.
//!
//! The daemon itself is abstracted behind [`MainLoopDaemon`] so this crate
//! never depends on a concrete mixer implementation, mirroring the way
//! `sonido-io`'s `AudioBackend` trait keeps platform audio APIs out of
//! application code.

use crate::session_map::{SessionMap, SinkInputIndex};
use audiocore_types::{AudioModuleInfo, ErrKind, IoHandle, Result, SessionId, StreamType};
use parking_lot::Mutex;
use std::time::Duration;
use tracing::{info, warn};

/// One command the service adapter can submit to the daemon main loop.
/// Each corresponds to exactly one daemon operation.
#[derive(Debug, Clone)]
pub enum DaemonCommand {
    /// `OpenAudioPort(libName, argsString)`.
    OpenAudioPort { lib_name: String, args: String },
    /// `CloseAudioPort(IoHandle)`.
    CloseAudioPort(IoHandle),
    /// `SuspendAudioDevice(portName, boolean)`.
    SuspendAudioDevice { port_name: String, suspend: bool },
    /// `SetDefaultSink(name)`.
    SetDefaultSink(String),
    /// `SetDefaultSource(name)`.
    SetDefaultSource(String),
    /// Set one sink-input's volume directly, already factor-multiplied.
    SetSinkInputVolume { index: SinkInputIndex, level: f32 },
    /// `SetMute(streamType, bool)`.
    SetMute { stream_type: StreamType, mute: bool },
    /// `MoveSinkInput(id, destSinkIndex|destSinkName)`.
    MoveSinkInput { index: SinkInputIndex, dest_sink: String },
}

/// The daemon's reply to a submitted command.
#[derive(Debug, Clone, PartialEq)]
pub enum DaemonReply {
    /// `OpenAudioPort` succeeded with this handle.
    Handle(IoHandle),
    /// Command completed with no return value.
    Ack,
}

/// A snapshot of one live sink-input, as read from the daemon's proplist
/// (`stream.type`, `stream.volumeFactor`, `stream.sessionID`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinkInputSnapshot {
    /// Daemon-assigned sink-input index.
    pub index: SinkInputIndex,
    /// The policy stream type this input was created for.
    pub stream_type: StreamType,
    /// Per-input volume scaling factor, independent of the group volume.
    pub volume_factor: f32,
    /// Session this sink-input belongs to.
    pub session_id: SessionId,
    /// Whether the input is corked (paused).
    pub corked: bool,
}

/// Abstraction over the mixing daemon's main loop. Implementations own the
/// `mainloop.lock(); submit; wait; unref; unlock()` dance internally and
/// block the calling thread until the daemon's callback fires.
pub trait MainLoopDaemon: Send + Sync {
    /// Submit `cmd` and block until the daemon completes it.
    fn submit(&self, cmd: DaemonCommand) -> Result<DaemonReply>;

    /// Snapshot of every live sink-input, used by `SetVolume`/`IsMute`/
    /// `IsStreamActive` to walk inputs of a given stream type.
    fn sink_inputs(&self) -> Vec<SinkInputSnapshot>;
}

/// The service adapter's connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection to the daemon.
    Disconnected,
    /// Connection attempt in flight.
    Connecting,
    /// Connected; commands can be submitted.
    Ready,
}

/// Back-off applied after a failed connection attempt, before retrying.
pub const RECONNECT_BACKOFF: Duration = Duration::from_millis(200);

/// One subscribed daemon event.
#[derive(Debug, Clone, PartialEq)]
pub enum DaemonEvent {
    /// A new sink-input appeared.
    SinkInputNew(SinkInputSnapshot),
    /// A sink-input went away.
    SinkInputRemove(SinkInputIndex),
}

/// Submits commands to the mixing daemon and tracks its connection state
/// and the sink-input -> session mapping.
pub struct ServiceAdapter<D: MainLoopDaemon> {
    daemon: D,
    state: Mutex<ConnectionState>,
    session_map: SessionMap,
}

impl<D: MainLoopDaemon> ServiceAdapter<D> {
    /// Wrap a daemon handle, starting in `Disconnected`.
    pub fn new(daemon: D) -> Self {
        Self {
            daemon,
            state: Mutex::new(ConnectionState::Disconnected),
            session_map: SessionMap::new(),
        }
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Transition `Disconnected -> Connecting`, then `Connecting -> Ready`
    /// once the daemon context reaches READY.
    pub fn mark_connecting(&self) {
        *self.state.lock() = ConnectionState::Connecting;
    }

    /// The daemon context reached READY.
    pub fn mark_ready(&self) {
        *self.state.lock() = ConnectionState::Ready;
    }

    /// The daemon context reported FAILED; drop back to `Disconnected`.
    /// Caller is responsible for sleeping [`RECONNECT_BACKOFF`] before
    /// retrying — this only updates state.
    pub fn mark_failed(&self) {
        warn!("mixing daemon connection failed, dropping to disconnected");
        *self.state.lock() = ConnectionState::Disconnected;
    }

    fn require_ready(&self) -> Result<()> {
        if self.connection_state() != ConnectionState::Ready {
            return Err(ErrKind::InvalidHandle(
                "service adapter not connected to mixing daemon".to_string(),
            ));
        }
        Ok(())
    }

    /// `OpenAudioPort(libName, argsString) -> IoHandle`.
    pub fn open_audio_port(&self, config: &AudioModuleInfo) -> Result<IoHandle> {
        self.require_ready()?;
        let reply = self.daemon.submit(DaemonCommand::OpenAudioPort {
            lib_name: config.lib.lib_name().to_string(),
            args: config.to_args_string(),
        })?;
        match reply {
            DaemonReply::Handle(h) => Ok(h),
            DaemonReply::Ack => Err(ErrKind::InvalidHandle(
                "daemon did not return a handle for OpenAudioPort".to_string(),
            )),
        }
    }

    /// `CloseAudioPort(IoHandle)`.
    pub fn close_audio_port(&self, handle: IoHandle) -> Result<()> {
        self.require_ready()?;
        self.daemon.submit(DaemonCommand::CloseAudioPort(handle))?;
        Ok(())
    }

    /// `SuspendAudioDevice(portName, boolean)`.
    pub fn suspend_audio_device(&self, port_name: &str, suspend: bool) -> Result<()> {
        self.require_ready()?;
        self.daemon.submit(DaemonCommand::SuspendAudioDevice {
            port_name: port_name.to_string(),
            suspend,
        })?;
        Ok(())
    }

    /// `SetDefaultSink(name)`.
    pub fn set_default_sink(&self, name: &str) -> Result<()> {
        self.require_ready()?;
        self.daemon
            .submit(DaemonCommand::SetDefaultSink(name.to_string()))?;
        Ok(())
    }

    /// `SetDefaultSource(name)`.
    pub fn set_default_source(&self, name: &str) -> Result<()> {
        self.require_ready()?;
        self.daemon
            .submit(DaemonCommand::SetDefaultSource(name.to_string()))?;
        Ok(())
    }

    /// `SetVolume(streamType, float)`: walks every sink-input of
    /// `stream_type`, multiplying `group_volume` by each input's own
    /// `stream.volumeFactor` before submitting.
    pub fn set_volume(&self, stream_type: StreamType, group_volume: f32) -> Result<()> {
        self.require_ready()?;
        for input in self.daemon.sink_inputs() {
            if input.stream_type != stream_type {
                continue;
            }
            let level = (group_volume * input.volume_factor).clamp(0.0, 1.0);
            self.daemon.submit(DaemonCommand::SetSinkInputVolume {
                index: input.index,
                level,
            })?;
        }
        Ok(())
    }

    /// `SetMute(streamType, bool)`.
    pub fn set_mute(&self, stream_type: StreamType, mute: bool) -> Result<()> {
        self.require_ready()?;
        self.daemon
            .submit(DaemonCommand::SetMute { stream_type, mute })?;
        Ok(())
    }

    /// `IsStreamActive(streamType)`: true iff any sink-input of that type
    /// is non-corked.
    pub fn is_stream_active(&self, stream_type: StreamType) -> Result<bool> {
        self.require_ready()?;
        Ok(self
            .daemon
            .sink_inputs()
            .into_iter()
            .any(|i| i.stream_type == stream_type && !i.corked))
    }

    /// `MoveSinkInput(id, destSinkName)`.
    pub fn move_sink_input(&self, index: SinkInputIndex, dest_sink: &str) -> Result<()> {
        self.require_ready()?;
        self.daemon.submit(DaemonCommand::MoveSinkInput {
            index,
            dest_sink: dest_sink.to_string(),
        })?;
        Ok(())
    }

    /// Handle a subscribed daemon event. `SinkInputNew` triggers an
    /// immediate volume walk for that input and records the session
    /// mapping; `SinkInputRemove` returns the session to upcall as removed.
    pub fn handle_event(&self, event: DaemonEvent, group_volume_for: impl Fn(StreamType) -> f32) -> Result<Option<SessionId>> {
        match event {
            DaemonEvent::SinkInputNew(snapshot) => {
                self.session_map.insert(snapshot.index, snapshot.session_id);
                let level = group_volume_for(snapshot.stream_type) * snapshot.volume_factor;
                self.daemon.submit(DaemonCommand::SetSinkInputVolume {
                    index: snapshot.index,
                    level: level.clamp(0.0, 1.0),
                })?;
                info!(session = snapshot.session_id.0, "sink input created, volume applied");
                Ok(None)
            }
            DaemonEvent::SinkInputRemove(index) => Ok(self.session_map.remove(index)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PMutex;

    struct FakeDaemon {
        next_handle: PMutex<u32>,
        inputs: PMutex<Vec<SinkInputSnapshot>>,
        submitted: PMutex<Vec<DaemonCommand>>,
    }

    impl FakeDaemon {
        fn new(inputs: Vec<SinkInputSnapshot>) -> Self {
            Self {
                next_handle: PMutex::new(1),
                inputs: PMutex::new(inputs),
                submitted: PMutex::new(Vec::new()),
            }
        }
    }

    impl MainLoopDaemon for FakeDaemon {
        fn submit(&self, cmd: DaemonCommand) -> Result<DaemonReply> {
            self.submitted.lock().push(cmd.clone());
            match cmd {
                DaemonCommand::OpenAudioPort { .. } => {
                    let mut h = self.next_handle.lock();
                    let handle = IoHandle(*h);
                    *h += 1;
                    Ok(DaemonReply::Handle(handle))
                }
                _ => Ok(DaemonReply::Ack),
            }
        }

        fn sink_inputs(&self) -> Vec<SinkInputSnapshot> {
            self.inputs.lock().clone()
        }
    }

    fn adapter(inputs: Vec<SinkInputSnapshot>) -> ServiceAdapter<FakeDaemon> {
        let a = ServiceAdapter::new(FakeDaemon::new(inputs));
        a.mark_connecting();
        a.mark_ready();
        a
    }

    #[test]
    fn commands_rejected_before_ready() {
        let a = ServiceAdapter::new(FakeDaemon::new(Vec::new()));
        assert!(a.set_default_sink("Speaker").is_err());
    }

    #[test]
    fn set_volume_multiplies_by_per_input_factor() {
        let a = adapter(vec![SinkInputSnapshot {
            index: SinkInputIndex(1),
            stream_type: StreamType::Music,
            volume_factor: 0.5,
            session_id: SessionId(1),
            corked: false,
        }]);
        a.set_volume(StreamType::Music, 0.8).unwrap();
        let submitted = a.daemon.submitted.lock();
        match &submitted[0] {
            DaemonCommand::SetSinkInputVolume { level, .. } => {
                assert!((*level - 0.4).abs() < 1e-6);
            }
            _ => panic!("expected SetSinkInputVolume"),
        }
    }

    #[test]
    fn is_stream_active_ignores_corked_inputs() {
        let a = adapter(vec![SinkInputSnapshot {
            index: SinkInputIndex(1),
            stream_type: StreamType::Music,
            volume_factor: 1.0,
            session_id: SessionId(1),
            corked: true,
        }]);
        assert!(!a.is_stream_active(StreamType::Music).unwrap());
    }

    #[test]
    fn sink_input_new_then_remove_round_trips_session() {
        let a = adapter(Vec::new());
        let snapshot = SinkInputSnapshot {
            index: SinkInputIndex(9),
            stream_type: StreamType::Music,
            volume_factor: 1.0,
            session_id: SessionId(42),
            corked: false,
        };
        a.handle_event(DaemonEvent::SinkInputNew(snapshot), |_| 1.0)
            .unwrap();
        let removed = a
            .handle_event(DaemonEvent::SinkInputRemove(SinkInputIndex(9)), |_| 1.0)
            .unwrap();
        assert_eq!(removed, Some(SessionId(42)));
    }
}
