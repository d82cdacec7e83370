//! Routing, volume/ringer persistence, focus arbitration, and stream
//! tracking — the policy layer sitting above the adapter's module
//! registry and service adapter.

pub mod audio_core;
pub mod callback_worker;
pub mod interrupt;
pub mod paths;
pub mod routing;
pub mod tracker;
pub mod volume_store;

pub use audio_core::AudioCore;
pub use callback_worker::CallbackWorker;
pub use interrupt::{
    InterruptEngine, InterruptEvent, InterruptEventType, InterruptHint, DUCK_VOLUME,
};
pub use routing::{DeviceChange, DeviceTable, RouteDriver, RouteHandle, Router};
pub use tracker::{AdminState, StreamChangeInfo, StreamTracker, TrackerChangeEvent, TrackerMode};
pub use volume_store::{open_at, open_default, VolumeStore};
