//! A driver endpoint that discards (sink) or synthesizes silence (source).
//!
//! Used for scene/route wiring tests where no real audio path is needed,
//! and as the default device-init fallback when a real HDI adapter is
//! absent.

use crate::driver::{DriverEndpoint, SampleAttrs};
use audiocore_types::Result;

/// A sink/source endpoint that always accepts/produces a full buffer
/// immediately, with no backing storage.
#[derive(Debug, Clone)]
pub struct NullDriverEndpoint {
    name: String,
    attrs: SampleAttrs,
}

impl NullDriverEndpoint {
    /// Construct a null endpoint with the given name and PCM parameters.
    pub fn new(name: impl Into<String>, attrs: SampleAttrs) -> Self {
        Self {
            name: name.into(),
            attrs,
        }
    }
}

impl DriverEndpoint for NullDriverEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn sample_attrs(&self) -> SampleAttrs {
        self.attrs
    }

    fn render_frame(&mut self, buf: &[u8]) -> Result<usize> {
        Ok(buf.len())
    }

    fn capture_frame(&mut self, buf: &mut [u8]) -> Result<usize> {
        buf.fill(0);
        Ok(buf.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs() -> SampleAttrs {
        SampleAttrs {
            rate: 48000,
            channels: 2,
            bytes_per_frame: 4,
        }
    }

    #[test]
    fn render_accepts_full_buffer() {
        let mut ep = NullDriverEndpoint::new("null", attrs());
        let buf = vec![0u8; 256];
        assert_eq!(ep.render_frame(&buf).unwrap(), 256);
    }

    #[test]
    fn capture_fills_silence() {
        let mut ep = NullDriverEndpoint::new("null", attrs());
        let mut buf = vec![0xffu8; 256];
        let n = ep.capture_frame(&mut buf).unwrap();
        assert_eq!(n, 256);
        assert!(buf.iter().all(|&b| b == 0));
    }
}
