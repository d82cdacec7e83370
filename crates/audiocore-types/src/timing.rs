//! `TimingEngineState`: the per-module bookkeeping the HDI timing engines
//! carry on their IO thread.

use crate::module::IoHandle;

/// Negotiated PCM format for one HDI endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleSpec {
    /// Sample rate, Hz.
    pub rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Bytes per frame (one sample per channel).
    pub bytes_per_frame: u32,
}

impl SampleSpec {
    /// Bytes per microsecond of audio at this spec, as a floating factor.
    pub fn bytes_per_usec(&self) -> f64 {
        f64::from(self.bytes_per_frame) * f64::from(self.rate) / 1_000_000.0
    }

    /// Convert a byte count to a duration in microseconds at this spec.
    pub fn bytes_to_usec(&self, bytes: u64) -> u64 {
        let bpu = self.bytes_per_usec();
        if bpu <= 0.0 {
            0
        } else {
            (bytes as f64 / bpu) as u64
        }
    }
}

/// State carried by a sink/source IO thread across iterations of its pacing
/// loop.
#[derive(Debug, Clone)]
pub struct TimingEngineState {
    /// Handle of the driver endpoint this engine drives.
    pub driver_endpoint: IoHandle,
    /// Negotiated sample format.
    pub sample_spec: SampleSpec,
    /// Size of one hardware period, in bytes.
    pub buffer_bytes: u32,
    /// Pacing interval between successive `renderFrame`/`captureFrame`
    /// calls, in microseconds, derived from `buffer_bytes`/`sample_spec`.
    pub block_usec: u64,
    /// Monotonically non-decreasing engine clock, in microseconds. Advances
    /// by `block_usec` on a clean iteration and is never stepped backward
    /// except by an explicit, bounded `RequestRewind`.
    pub timestamp_usec: u64,
    /// Running count of bytes dropped due to underrun (sink) or overrun
    /// (source) since the endpoint was opened.
    pub bytes_dropped: u64,
    /// Whether the IO thread's pacing loop is currently running.
    pub started: bool,
    /// Set by `RequestRewind`; consumed (and cleared) on the next loop
    /// iteration.
    pub rewind_pending: Option<u64>,
}

impl TimingEngineState {
    /// Construct a fresh, unstarted engine state for a newly opened endpoint.
    pub fn new(driver_endpoint: IoHandle, sample_spec: SampleSpec, buffer_bytes: u32) -> Self {
        let block_usec = sample_spec.bytes_to_usec(u64::from(buffer_bytes));
        Self {
            driver_endpoint,
            sample_spec,
            buffer_bytes,
            block_usec,
            timestamp_usec: 0,
            bytes_dropped: 0,
            started: false,
            rewind_pending: None,
        }
    }

    /// Advance the engine clock by one clean iteration.
    pub fn advance(&mut self) {
        self.timestamp_usec += self.block_usec;
    }

    /// Record a dropped-byte underrun/overrun without advancing the clock.
    pub fn record_drop(&mut self, bytes: u64) {
        self.bytes_dropped += bytes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> SampleSpec {
        SampleSpec {
            rate: 48000,
            channels: 2,
            bytes_per_frame: 4,
        }
    }

    #[test]
    fn block_usec_matches_period_size() {
        let st = TimingEngineState::new(IoHandle(1), spec(), 8192);
        // 8192 bytes / (4 bytes/frame * 48000 frames/sec) = ~42666us
        assert!(st.block_usec > 42_000 && st.block_usec < 43_000);
    }

    #[test]
    fn advance_is_monotonic_and_drops_do_not_move_clock() {
        let mut st = TimingEngineState::new(IoHandle(1), spec(), 8192);
        let t0 = st.timestamp_usec;
        st.advance();
        assert!(st.timestamp_usec > t0);
        let t1 = st.timestamp_usec;
        st.record_drop(512);
        assert_eq!(st.timestamp_usec, t1);
        assert_eq!(st.bytes_dropped, 512);
    }
}
