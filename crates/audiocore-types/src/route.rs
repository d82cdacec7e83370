//! Audio routes and scenes.

use crate::device::{DeviceDescriptor, DeviceRole};
use crate::module::IoHandle;
use crate::session::SessionId;

/// A device-facing audio pipeline scenario. Determines which route nodes
/// the routing layer activates together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioScene {
    /// No call in progress; ordinary playback/capture routing.
    Default,
    /// An incoming call is ringing.
    Ringing,
    /// An active cellular/VoIP call.
    PhoneCall,
    /// A non-telephony voice chat (e.g. VoIP conferencing) scene.
    PhoneChat,
}

/// Driver-facing routing category, distinct from `AudioScene`: one scene may
/// require more than one simultaneously-active category (e.g. `PhoneCall`
/// needs both `Voice` and `Ring` active during call waiting).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCategory {
    /// Ordinary media playback/capture.
    Media,
    /// Voice call audio path.
    Voice,
    /// Ringtone path.
    Ring,
    /// Communication (VoIP-style) path distinct from cellular voice.
    Communication,
}

/// Which physical pin on a device a route node is bound to, when the
/// underlying HDI adapter exposes pin-level routing (e.g. headset mic vs.
/// built-in mic sharing one logical input device).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinType {
    /// No specific pin; device-level routing only.
    None,
    /// Headset microphone pin.
    HeadsetMic,
    /// Built-in microphone pin.
    BuiltinMic,
    /// Headset speaker pin.
    HeadsetSpeaker,
    /// Built-in speaker pin.
    BuiltinSpeaker,
}

/// One endpoint of an active route: a session bound to a module on a
/// device, at a given pin.
#[derive(Debug, Clone)]
pub struct RouteNode {
    /// Opaque port identifier for logging/diagnostics.
    pub port_id: u32,
    /// Output or input leg.
    pub role: DeviceRole,
    /// The module instance backing this node.
    pub module: IoHandle,
    /// The session routed through this node, if any (routes can exist
    /// ahead of a session attaching, e.g. during scene setup).
    pub stream_id: Option<SessionId>,
    /// Pin binding, when meaningful.
    pub pin_type: PinType,
    /// Free-form diagnostic description (adapter name + device type).
    pub pin_desc: String,
}

/// An active route: a scene plus its bound device and node set.
#[derive(Debug, Clone)]
pub struct AudioRoute {
    /// Scene this route implements.
    pub scene: AudioScene,
    /// Category this route drives (a `PhoneCall` scene may hold more than
    /// one `AudioRoute`, one per category).
    pub category: AudioCategory,
    /// The device this route currently targets.
    pub device: DeviceDescriptor,
    /// Active nodes for this route.
    pub nodes: Vec<RouteNode>,
}

impl AudioRoute {
    /// True if any node in this route is bound to `session`.
    pub fn carries_session(&self, session: SessionId) -> bool {
        self.nodes.iter().any(|n| n.stream_id == Some(session))
    }
}
