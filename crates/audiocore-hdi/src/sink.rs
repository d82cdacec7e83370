//! HDI sink timing engine: one IO thread per render module
//! instance, bridging the mixing daemon's pull-mode mixer to a push-mode
//! [`DriverEndpoint`].

use crate::driver::DriverEndpoint;
use audiocore_types::{ErrKind, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Where a sink's IO thread currently is in the state machine driven by
/// `SetStateInIoThread`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    /// Freshly opened; no render loop running yet.
    Init,
    /// Driver torn down; loop parked on the wake timer indefinitely.
    Suspended,
    /// Actively rendering.
    Running,
    /// Mixing daemon has released this module; thread exits on next wake.
    Unlinked,
}

/// The next chunk of audio to render, produced by the mixer callback.
pub struct RenderChunk {
    /// Interleaved PCM bytes to hand to the driver endpoint.
    pub data: Vec<u8>,
}

/// Supplies render chunks on demand, in place of the mixing daemon's real
/// pull-mode mixer. `audiocore-adapter` wires the real mixer graph in;
/// tests and the CLI demo use simple generators.
pub trait MixerSource: Send {
    /// Produce up to `max_bytes` of audio to render next.
    fn render(&mut self, max_bytes: usize) -> RenderChunk;

    /// Roll back already-rendered output by `n_bytes`, if supported.
    fn rewind(&mut self, _n_bytes: u64) {}
}

/// A control message delivered to a running sink IO thread.
pub enum SinkMessage {
    /// Drive a `SetStateInIoThread` transition.
    SetState {
        new_state: SinkState,
    },
    /// `ProcessMsg(GET_LATENCY)`; the reply channel receives microseconds.
    GetLatency(Sender<u64>),
    /// `RequestRewind(nBytes)`.
    RequestRewind(u64),
    /// `UpdateRequestedLatency(usec)`.
    UpdateRequestedLatency(u64),
    /// Ask the IO thread to exit after its current iteration.
    Shutdown,
}

/// Outcome of a terminated IO thread loop, posted upstream instead of
/// returning an error directly — a failing endpoint never crashes the
/// mixing daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkExit {
    /// Clean shutdown, requested via `SinkMessage::Shutdown`.
    Clean,
    /// Fatal error; the module should be unloaded.
    Fatal(String),
}

/// One sink module's IO thread state and pacing loop.
pub struct SinkTimingEngine<D: DriverEndpoint, M: MixerSource> {
    driver: D,
    mixer: M,
    state: SinkState,
    timestamp_usec: u64,
    block_usec: u64,
    max_request_bytes: usize,
    bytes_dropped: u64,
    drop_run_active: bool,
    rewind_pending: Option<u64>,
    driver_initialized: bool,
}

impl<D: DriverEndpoint, M: MixerSource> SinkTimingEngine<D, M> {
    /// Open a sink in `Init` state. The IO thread itself is started
    /// separately by calling [`Self::run`] on a dedicated thread.
    pub fn open(driver: D, mixer: M, block_usec: u64) -> Result<Self> {
        let attrs = driver.sample_attrs();
        if attrs.rate == 0 || attrs.channels == 0 {
            return Err(ErrKind::DeviceInit(
                "sink endpoint reports zero rate or channels".to_string(),
            ));
        }
        let bytes_per_usec = f64::from(attrs.bytes_per_frame) * f64::from(attrs.rate) / 1_000_000.0;
        let max_request_bytes = (bytes_per_usec * block_usec as f64) as usize;
        Ok(Self {
            driver,
            mixer,
            state: SinkState::Init,
            timestamp_usec: 0,
            block_usec,
            max_request_bytes: max_request_bytes.max(1),
            bytes_dropped: 0,
            drop_run_active: false,
            rewind_pending: None,
            driver_initialized: true,
        })
    }

    /// Current `SetStateInIoThread` state.
    pub fn state(&self) -> SinkState {
        self.state
    }

    /// Cumulative dropped-byte count since the endpoint was opened.
    pub fn bytes_dropped(&self) -> u64 {
        self.bytes_dropped
    }

    /// Drive a `SetStateInIoThread` transition.
    ///
    /// Legal transitions: `Init -> Running`, `Suspended -> Running`
    /// (device reinit if torn down), `Running -> Suspended` (stop + tear
    /// down), `* -> Unlinked`.
    pub fn set_state(&mut self, new_state: SinkState) -> Result<()> {
        match (self.state, new_state) {
            (_, SinkState::Unlinked) => {
                self.state = SinkState::Unlinked;
                Ok(())
            }
            (SinkState::Init, SinkState::Running)
            | (SinkState::Suspended, SinkState::Running) => {
                self.timestamp_usec = now_usec();
                if !self.driver_initialized {
                    info!(endpoint = self.driver.name(), "reinitializing HDI renderer");
                    self.driver.reinitialize()?;
                    self.driver_initialized = true;
                }
                self.state = SinkState::Running;
                Ok(())
            }
            (SinkState::Running, SinkState::Suspended) => {
                self.driver_initialized = false;
                self.bytes_dropped = 0;
                self.drop_run_active = false;
                self.state = SinkState::Suspended;
                Ok(())
            }
            (from, to) if from == to => Ok(()),
            (from, to) => Err(ErrKind::IllegalState(format!(
                "sink cannot transition {from:?} -> {to:?}"
            ))),
        }
    }

    /// `ProcessMsg(GET_LATENCY)`: driver's own estimate when available,
    /// else `now - timestampUsec`. Never negative.
    pub fn get_latency_usec(&self) -> u64 {
        if let Some(hw) = self.driver.latency_usec() {
            return hw;
        }
        let now = now_usec();
        now.saturating_sub(self.timestamp_usec)
    }

    /// `RequestRewind(nBytes)`.
    pub fn request_rewind(&mut self, n_bytes: u64) {
        self.rewind_pending = Some(n_bytes);
    }

    /// `UpdateRequestedLatency(usec)`: recompute `max_request_bytes`.
    pub fn update_requested_latency(&mut self, usec: u64) {
        self.block_usec = usec;
        let attrs = self.driver.sample_attrs();
        let bytes_per_usec = f64::from(attrs.bytes_per_frame) * f64::from(attrs.rate) / 1_000_000.0;
        self.max_request_bytes = ((bytes_per_usec * usec as f64) as usize).max(1);
    }

    /// One iteration of the IO thread pacing loop: dispatch a pending
    /// rewind, then render frames up to the requested latency window.
    /// Message dispatch is handled separately by the caller via `rx`.
    ///
    /// Returns the absolute deadline to arm the next wake-up at, or `None`
    /// if the wake timer should be disabled (not `Running`).
    fn render_iteration(&mut self) -> Option<u64> {
        if self.state != SinkState::Running {
            return None;
        }
        let now = now_usec();

        if let Some(n) = self.rewind_pending.take() {
            self.mixer.rewind(n);
        }

        let mut written_this_iter = 0usize;
        while self.timestamp_usec < now + self.block_usec && written_this_iter < self.max_request_bytes {
            let remaining = self.max_request_bytes - written_this_iter;
            let chunk = self.mixer.render(remaining);
            if chunk.data.is_empty() {
                break;
            }
            let attrs = self.driver.sample_attrs();
            let bytes_per_usec = f64::from(attrs.bytes_per_frame) * f64::from(attrs.rate) / 1_000_000.0;

            let written = match self.driver.render_frame(&chunk.data) {
                Ok(w) if w > 0 && w <= chunk.data.len() => w,
                Ok(_) | Err(_) => {
                    let dropped = chunk.data.len() as u64;
                    self.account_drop(dropped);
                    written_this_iter += chunk.data.len();
                    break;
                }
            };

            self.timestamp_usec += (written as f64 / bytes_per_usec) as u64;
            let dropped = (chunk.data.len() - written) as u64;
            self.account_drop(dropped);
            written_this_iter += chunk.data.len();
        }

        Some(self.timestamp_usec)
    }

    fn account_drop(&mut self, dropped: u64) {
        if self.bytes_dropped != 0 && dropped == 0 {
            debug!(total = self.bytes_dropped, "HDI-sink continuously dropped bytes, clearing");
            self.bytes_dropped = 0;
            self.drop_run_active = false;
        }
        if self.bytes_dropped == 0 && dropped != 0 {
            debug!(dropped, "HDI-sink just dropped bytes");
            self.drop_run_active = true;
        }
        self.bytes_dropped += dropped;
    }

    /// Run the pacing loop until a fatal error or a clean shutdown request,
    /// dispatching `SinkMessage`s received on `rx` between iterations.
    /// Never panics or propagates an error to the caller; terminal
    /// conditions are reported via the returned [`SinkExit`].
    pub fn run(mut self, rx: &Receiver<SinkMessage>) -> SinkExit {
        loop {
            let deadline = self.render_iteration();

            let timeout = match deadline {
                Some(ts) => {
                    let now = now_usec();
                    Duration::from_micros(ts.saturating_sub(now))
                }
                None => Duration::from_millis(200),
            };

            match rx.recv_timeout(timeout) {
                Ok(SinkMessage::SetState { new_state }) => {
                    if let Err(e) = self.set_state(new_state) {
                        error!(error = %e, "sink set_state failed");
                    }
                    if new_state == SinkState::Unlinked {
                        return SinkExit::Clean;
                    }
                }
                Ok(SinkMessage::GetLatency(reply)) => {
                    let _ = reply.send(self.get_latency_usec());
                }
                Ok(SinkMessage::RequestRewind(n)) => self.request_rewind(n),
                Ok(SinkMessage::UpdateRequestedLatency(usec)) => self.update_requested_latency(usec),
                Ok(SinkMessage::Shutdown) => return SinkExit::Clean,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return SinkExit::Fatal("control channel disconnected".to_string())
                }
            }
        }
    }
}

fn now_usec() -> u64 {
    use std::sync::OnceLock;
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    let epoch = *EPOCH.get_or_init(Instant::now);
    Instant::now().saturating_duration_since(epoch).as_micros() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::null_driver::NullDriverEndpoint;
    use crate::driver::SampleAttrs;

    struct SilenceMixer {
        frame_bytes: usize,
    }

    impl MixerSource for SilenceMixer {
        fn render(&mut self, max_bytes: usize) -> RenderChunk {
            RenderChunk {
                data: vec![0u8; self.frame_bytes.min(max_bytes).max(4)],
            }
        }
    }

    fn attrs() -> SampleAttrs {
        SampleAttrs {
            rate: 48000,
            channels: 2,
            bytes_per_frame: 4,
        }
    }

    #[test]
    fn init_to_running_resets_timestamp_to_now() {
        let driver = NullDriverEndpoint::new("speaker", attrs());
        let mixer = SilenceMixer { frame_bytes: 256 };
        let mut engine = SinkTimingEngine::open(driver, mixer, 20_000).unwrap();
        assert_eq!(engine.state(), SinkState::Init);
        engine.set_state(SinkState::Running).unwrap();
        assert_eq!(engine.state(), SinkState::Running);
    }

    #[test]
    fn illegal_transition_is_rejected() {
        let driver = NullDriverEndpoint::new("speaker", attrs());
        let mixer = SilenceMixer { frame_bytes: 256 };
        let mut engine = SinkTimingEngine::open(driver, mixer, 20_000).unwrap();
        assert!(engine.set_state(SinkState::Suspended).is_err());
    }

    #[test]
    fn running_to_suspended_resets_drop_stats() {
        let driver = NullDriverEndpoint::new("speaker", attrs());
        let mixer = SilenceMixer { frame_bytes: 256 };
        let mut engine = SinkTimingEngine::open(driver, mixer, 20_000).unwrap();
        engine.set_state(SinkState::Running).unwrap();
        engine.bytes_dropped = 128;
        engine.set_state(SinkState::Suspended).unwrap();
        assert_eq!(engine.bytes_dropped(), 0);
    }

    #[test]
    fn render_iteration_advances_timestamp_monotonically() {
        let driver = NullDriverEndpoint::new("speaker", attrs());
        let mixer = SilenceMixer { frame_bytes: 256 };
        let mut engine = SinkTimingEngine::open(driver, mixer, 20_000).unwrap();
        engine.set_state(SinkState::Running).unwrap();
        let t0 = engine.timestamp_usec;
        engine.render_iteration();
        assert!(engine.timestamp_usec >= t0);
    }

    #[test]
    fn get_latency_never_negative_without_hw_report() {
        let driver = NullDriverEndpoint::new("speaker", attrs());
        let mixer = SilenceMixer { frame_bytes: 256 };
        let mut engine = SinkTimingEngine::open(driver, mixer, 20_000).unwrap();
        engine.set_state(SinkState::Running).unwrap();
        engine.timestamp_usec = now_usec() + 1_000_000;
        assert_eq!(engine.get_latency_usec(), 0);
    }
}
