//! The `DriverEndpoint` trait: the HAL contract a timing engine drives.
//!
//! This decouples the sink/source pacing loops in [`crate::sink`] and
//! [`crate::source`] from any concrete hardware driver. The contract is
//! push-style and blocking, mirroring the HDI `AudioRendererRenderFrame` /
//! `AudioCapturerCaptureFrame` calls the mixing daemon's IO thread makes
//! directly: the timing engine calls in, the endpoint writes/reads as much
//! as it can and reports how much it actually moved.
//!
//! ## Implementing a custom endpoint
//!
//! ```rust,ignore
//! use audiocore_hdi::driver::{DriverEndpoint, SampleAttrs};
//! use audiocore_types::Result;
//!
//! struct MyEndpoint { /* ... */ }
//!
//! impl DriverEndpoint for MyEndpoint {
//!     fn name(&self) -> &str { "my-endpoint" }
//!     fn sample_attrs(&self) -> SampleAttrs { todo!() }
//!     fn render_frame(&mut self, buf: &[u8]) -> Result<usize> { todo!() }
//!     fn capture_frame(&mut self, buf: &mut [u8]) -> Result<usize> { todo!() }
//!     fn latency_usec(&self) -> Option<u64> { None }
//! }
//! ```
use audiocore_types::Result;

/// Negotiated PCM parameters an endpoint was opened with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleAttrs {
    /// Sample rate, Hz.
    pub rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Bytes per frame (one sample per channel).
    pub bytes_per_frame: u32,
}

/// A driver-side render (sink) or capture (source) endpoint.
///
/// Implementations are not required to be thread-safe beyond `Send`: each
/// endpoint is owned by exactly one timing engine IO thread for its entire
/// lifetime.
pub trait DriverEndpoint: Send {
    /// Human-readable endpoint name, used in logging.
    fn name(&self) -> &str;

    /// The PCM parameters this endpoint was opened with.
    fn sample_attrs(&self) -> SampleAttrs;

    /// Write as much of `buf` to the device as it will currently accept,
    /// returning the number of bytes actually written. A return less than
    /// `buf.len()` is not an error; the caller accounts the remainder as
    /// dropped for this iteration.
    fn render_frame(&mut self, buf: &[u8]) -> Result<usize>;

    /// Read as much into `buf` as the device currently has available,
    /// returning the number of bytes actually read. Symmetric with
    /// `render_frame`.
    fn capture_frame(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// The driver's own latency estimate, in microseconds, when it can
    /// report one directly. `GET_LATENCY` falls back to a clock-based
    /// estimate when this returns `None`.
    fn latency_usec(&self) -> Option<u64> {
        None
    }

    /// Tear down and reinitialize the underlying device. Called when
    /// transitioning out of `Suspended` with `is_initialized == false`.
    fn reinitialize(&mut self) -> Result<()> {
        Ok(())
    }
}
