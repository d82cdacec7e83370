//! HDI sink/source timing engines: the IO-thread pacing loops that bridge
//! the mixing daemon's pull-mode mixer graph to push-mode driver endpoints.
//!
//! Each [`sink::SinkTimingEngine`] / [`source::SourceTimingEngine`] owns one
//! dedicated OS thread for the lifetime of its module instance. No async
//! runtime is involved anywhere in this crate — see `audiocore-policy`'s
//! crate docs for why.

pub mod driver;
pub mod file_driver;
pub mod null_driver;
pub mod sink;
pub mod source;

pub use driver::{DriverEndpoint, SampleAttrs};
pub use file_driver::{FileDriverEndpoint, FileSourceEndpoint};
pub use null_driver::NullDriverEndpoint;
pub use sink::{MixerSource, RenderChunk, SinkExit, SinkMessage, SinkState, SinkTimingEngine};
pub use source::{
    MicMuteSource, MixerSink, SourceExit, SourceMessage, SourceState, SourceTimingEngine,
};
