//! Shared data model for the audio routing and playback/capture core.
//!
//! This crate has no behavior of its own: it defines the types that
//! `audiocore-hdi`, `audiocore-adapter`, `audiocore-policy` and
//! `audiocore-cli` pass between each other, plus the uniform `ErrKind`
//! error type every fallible operation in the workspace returns.

pub mod device;
pub mod error;
pub mod focus;
pub mod module;
pub mod ringer;
pub mod route;
pub mod session;
pub mod stream_type;
pub mod timing;

pub use device::{
    ActiveDeviceType, ChannelMask, ConnectType, DeviceDescriptor, DeviceFlag, DeviceRole,
    DeviceType,
};
pub use error::{ErrKind, Result};
pub use focus::{
    AudioFocusType, AudioInterrupt, FocusEdge, FocusEntry, FocusGraph, FocusHint, FocusMode,
    ForceType, SourceType,
};
pub use module::{
    AdapterLib, AudioModuleInfo, IoHandle, ModuleInstance, ModuleState, SampleFormat,
    INVALID_HANDLE,
};
pub use ringer::RingerMode;
pub use route::{AudioCategory, AudioRoute, AudioScene, PinType, RouteNode};
pub use session::{CapturerState, FocusState, RendererState, SessionId, StreamSession, StreamState};
pub use stream_type::{StreamType, StreamUsage, VolumeGroup};
pub use timing::{SampleSpec, TimingEngineState};
