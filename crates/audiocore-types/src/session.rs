//! `StreamSession`: one client's open renderer or capturer.

use crate::device::DeviceDescriptor;
use crate::stream_type::StreamType;

/// Session identifier, process-wide unique for the lifetime of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u32);

/// Renderer-side playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    /// Created, not yet started.
    Prepared,
    /// Actively rendering.
    Running,
    /// Temporarily stopped by the client; resumable.
    Paused,
    /// Stopped by the client; requires `Start` to resume.
    Stopped,
    /// Torn down; session record pending removal.
    Released,
}

/// Capturer-side recording state, mirrors `RendererState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturerState {
    /// Created, not yet started.
    Prepared,
    /// Actively capturing.
    Running,
    /// Temporarily stopped by the client; resumable.
    Paused,
    /// Stopped by the client; requires `Start` to resume.
    Stopped,
    /// Torn down; session record pending removal.
    Released,
}

/// Either direction's playback/recording state, as tracked by the policy
/// layer and reported through `StreamTracker`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Renderer-side state.
    Renderer(RendererState),
    /// Capturer-side state.
    Capturer(CapturerState),
}

/// The focus outcome currently in effect for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusState {
    /// Holds focus, rendering/capturing at full requested volume.
    Active,
    /// Holds focus but ducked (volume attenuated) by a higher-priority stream.
    Ducked,
    /// Not rendering/capturing; can resume without a new focus request.
    Paused,
    /// Force-stopped; requires a fresh `ActivateAudioInterrupt` to resume.
    Stopped,
}

/// One client's open renderer or capturer.
#[derive(Debug, Clone)]
pub struct StreamSession {
    /// Process-wide unique session id.
    pub session_id: SessionId,
    /// Calling process's uid.
    pub client_uid: u32,
    /// Calling process's pid.
    pub client_pid: u32,
    /// Calling process's access token id, used for permission checks
    /// upstream of the audio core (opaque here).
    pub token_id: u64,
    /// The logical purpose this session was created for.
    pub stream_type: StreamType,
    /// Current renderer or capturer state.
    pub state: StreamState,
    /// Device this session is currently routed to, once selected.
    pub device: Option<DeviceDescriptor>,
    /// Effective volume, clamped to `[0.0, 1.0]`. This is the product of the
    /// stream type's volume-group level and any per-session ducking factor;
    /// it does not itself apply the stream-level mute flag.
    pub effective_volume: f32,
    /// Per-session mute flag, independent of the volume-group mute flag.
    pub muted: bool,
    /// Current focus-arbitration outcome.
    pub focus_state: FocusState,
}

impl StreamSession {
    /// Clamp and store a new effective volume.
    pub fn set_effective_volume(&mut self, v: f32) {
        self.effective_volume = v.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_volume_is_clamped() {
        let mut s = StreamSession {
            session_id: SessionId(1),
            client_uid: 0,
            client_pid: 0,
            token_id: 0,
            stream_type: StreamType::Music,
            state: StreamState::Renderer(RendererState::Running),
            device: None,
            effective_volume: 0.5,
            muted: false,
            focus_state: FocusState::Active,
        };
        s.set_effective_volume(1.5);
        assert_eq!(s.effective_volume, 1.0);
        s.set_effective_volume(-0.2);
        assert_eq!(s.effective_volume, 0.0);
    }
}
