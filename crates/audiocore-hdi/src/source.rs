//! HDI source timing engine: symmetric to the sink engine for
//! capture, with subtly different state rules — `Idle -> Running` must
//! init the capturer; `Idle -> Suspended` only tears it down if it was
//! initialized.

use crate::driver::DriverEndpoint;
use audiocore_types::{ErrKind, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Source-side state machine, mirrors `SinkState` but with an explicit
/// `Idle` resting state distinct from `Init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    /// Freshly opened; capturer not yet initialized.
    Init,
    /// Parked; capturer torn down if it was ever initialized.
    Suspended,
    /// Open but not capturing.
    Idle,
    /// Actively capturing.
    Running,
    /// Released by the mixing daemon; thread exits on next wake.
    Unlinked,
}

/// Accepts captured audio blocks in place of the mixing daemon's real
/// source object.
pub trait MixerSink: Send {
    /// Post a freshly captured block upstream.
    fn post(&mut self, data: &[u8]);
}

/// Reports mic mute state, read from the volume/mute store at every
/// capturer (re)init and checked again on every captured block.
pub trait MicMuteSource: Send {
    /// Current mic-mute flag.
    fn mic_muted(&self) -> bool;
}

/// A control message delivered to a running source IO thread.
pub enum SourceMessage {
    /// Drive a state transition.
    SetState { new_state: SourceState },
    /// `ProcessMsg(GET_LATENCY)`.
    GetLatency(Sender<u64>),
    /// Ask the IO thread to exit after its current iteration.
    Shutdown,
}

/// Outcome of a terminated source IO thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceExit {
    /// Clean shutdown.
    Clean,
    /// Fatal error; the module should be unloaded.
    Fatal(String),
}

/// One source module's IO thread state and pacing loop.
pub struct SourceTimingEngine<D: DriverEndpoint, S: MixerSink, M: MicMuteSource> {
    driver: D,
    sink: S,
    mic_mute: M,
    state: SourceState,
    timestamp_usec: u64,
    block_usec: u64,
    capturer_initialized: bool,
}

impl<D: DriverEndpoint, S: MixerSink, M: MicMuteSource> SourceTimingEngine<D, S, M> {
    /// Open a source in `Init` state.
    pub fn open(driver: D, sink: S, mic_mute: M, block_usec: u64) -> Result<Self> {
        let attrs = driver.sample_attrs();
        if attrs.rate == 0 || attrs.channels == 0 {
            return Err(ErrKind::DeviceInit(
                "source endpoint reports zero rate or channels".to_string(),
            ));
        }
        Ok(Self {
            driver,
            sink,
            mic_mute,
            state: SourceState::Init,
            timestamp_usec: 0,
            block_usec,
            capturer_initialized: false,
        })
    }

    /// Current state.
    pub fn state(&self) -> SourceState {
        self.state
    }

    /// Drive a state transition.
    pub fn set_state(&mut self, new_state: SourceState) -> Result<()> {
        match (self.state, new_state) {
            (_, SourceState::Unlinked) => {
                self.state = SourceState::Unlinked;
                Ok(())
            }
            (SourceState::Idle, SourceState::Running)
            | (SourceState::Init, SourceState::Running)
            | (SourceState::Suspended, SourceState::Running) => {
                self.timestamp_usec = now_usec();
                if !self.capturer_initialized {
                    info!(endpoint = self.driver.name(), "initializing HDI capturer");
                    self.driver.reinitialize()?;
                    self.apply_mic_mute();
                    self.capturer_initialized = true;
                }
                self.state = SourceState::Running;
                Ok(())
            }
            (SourceState::Running, SourceState::Idle) => {
                self.state = SourceState::Idle;
                Ok(())
            }
            (SourceState::Idle, SourceState::Suspended) => {
                if self.capturer_initialized {
                    self.capturer_initialized = false;
                }
                self.state = SourceState::Suspended;
                Ok(())
            }
            (from, to) if from == to => Ok(()),
            (from, to) => Err(ErrKind::IllegalState(format!(
                "source cannot transition {from:?} -> {to:?}"
            ))),
        }
    }

    fn apply_mic_mute(&self) {
        debug!(muted = self.mic_mute.mic_muted(), "applying mic mute at capturer init");
    }

    /// `ProcessMsg(GET_LATENCY)`, symmetric with the sink's.
    pub fn get_latency_usec(&self) -> u64 {
        if let Some(hw) = self.driver.latency_usec() {
            return hw;
        }
        now_usec().saturating_sub(self.timestamp_usec)
    }

    fn capture_iteration(&mut self) -> Option<u64> {
        if self.state != SourceState::Running || !self.capturer_initialized {
            return None;
        }
        let now = now_usec();
        let attrs = self.driver.sample_attrs();
        let bytes_per_usec = f64::from(attrs.bytes_per_frame) * f64::from(attrs.rate) / 1_000_000.0;
        let due_usec = now.saturating_sub(self.timestamp_usec);
        let requested = ((due_usec as f64) * bytes_per_usec) as usize;
        if requested == 0 {
            return Some(self.timestamp_usec + self.block_usec);
        }

        let mut buf = vec![0u8; requested];
        match self.driver.capture_frame(&mut buf) {
            Ok(actual) if actual > 0 && actual <= requested => {
                if self.mic_mute.mic_muted() {
                    buf[..actual].fill(0);
                }
                self.sink.post(&buf[..actual]);
                self.timestamp_usec += (actual as f64 / bytes_per_usec) as u64;
            }
            Ok(_) | Err(_) => {
                error!("HDI source capture_frame returned a fatal short/over read");
                return None;
            }
        }

        Some(self.timestamp_usec + self.block_usec)
    }

    /// Run the pacing loop until shutdown or a fatal error.
    pub fn run(mut self, rx: &Receiver<SourceMessage>) -> SourceExit {
        loop {
            let deadline = self.capture_iteration();
            let timeout = match deadline {
                Some(ts) => Duration::from_micros(ts.saturating_sub(now_usec())),
                None => Duration::from_millis(200),
            };

            match rx.recv_timeout(timeout) {
                Ok(SourceMessage::SetState { new_state }) => {
                    if let Err(e) = self.set_state(new_state) {
                        error!(error = %e, "source set_state failed");
                    }
                    if new_state == SourceState::Unlinked {
                        return SourceExit::Clean;
                    }
                }
                Ok(SourceMessage::GetLatency(reply)) => {
                    let _ = reply.send(self.get_latency_usec());
                }
                Ok(SourceMessage::Shutdown) => return SourceExit::Clean,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return SourceExit::Fatal("control channel disconnected".to_string())
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
    use crate::driver::SampleAttrs;
    use crate::null_driver::NullDriverEndpoint;

    struct VecSink(Vec<u8>);
    impl MixerSink for VecSink {
        fn post(&mut self, data: &[u8]) {
            self.0.extend_from_slice(data);
        }
    }

    struct FixedMute(bool);
    impl MicMuteSource for FixedMute {
        fn mic_muted(&self) -> bool {
            self.0
        }
    }

    /// Fills captured buffers with a non-zero pattern, so a test can tell
    /// whether mic-mute actually zeroed the data instead of relying on a
    /// driver that already returns silence.
    struct LoudDriver {
        name: String,
        attrs: SampleAttrs,
    }
    impl DriverEndpoint for LoudDriver {
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
            buf.fill(0xAA);
            Ok(buf.len())
        }
    }

    fn attrs() -> SampleAttrs {
        SampleAttrs {
            rate: 48000,
            channels: 1,
            bytes_per_frame: 2,
        }
    }

    #[test]
    fn idle_to_running_initializes_capturer() {
        let driver = NullDriverEndpoint::new("mic", attrs());
        let mut engine =
            SourceTimingEngine::open(driver, VecSink(Vec::new()), FixedMute(false), 20_000).unwrap();
        engine.set_state(SourceState::Idle).unwrap();
        assert!(!engine.capturer_initialized);
        engine.set_state(SourceState::Running).unwrap();
        assert!(engine.capturer_initialized);
    }

    #[test]
    fn idle_to_suspended_only_tears_down_if_initialized() {
        let driver = NullDriverEndpoint::new("mic", attrs());
        let mut engine =
            SourceTimingEngine::open(driver, VecSink(Vec::new()), FixedMute(false), 20_000).unwrap();
        engine.set_state(SourceState::Idle).unwrap();
        engine.set_state(SourceState::Suspended).unwrap();
        assert!(!engine.capturer_initialized);
    }

    #[test]
    fn running_to_idle_keeps_capturer_initialized() {
        let driver = NullDriverEndpoint::new("mic", attrs());
        let mut engine =
            SourceTimingEngine::open(driver, VecSink(Vec::new()), FixedMute(false), 20_000).unwrap();
        engine.set_state(SourceState::Running).unwrap();
        engine.set_state(SourceState::Idle).unwrap();
        assert!(engine.capturer_initialized);
    }

    #[test]
    fn muted_capture_posts_silence_even_over_a_loud_driver() {
        let driver = LoudDriver {
            name: "mic".to_string(),
            attrs: attrs(),
        };
        let mut engine =
            SourceTimingEngine::open(driver, VecSink(Vec::new()), FixedMute(true), 20_000).unwrap();
        engine.set_state(SourceState::Running).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        engine.capture_iteration();
        assert!(!engine.sink.0.is_empty());
        assert!(engine.sink.0.iter().all(|&b| b == 0));
    }

    #[test]
    fn unmuted_capture_passes_driver_data_through() {
        let driver = LoudDriver {
            name: "mic".to_string(),
            attrs: attrs(),
        };
        let mut engine =
            SourceTimingEngine::open(driver, VecSink(Vec::new()), FixedMute(false), 20_000).unwrap();
        engine.set_state(SourceState::Running).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        engine.capture_iteration();
        assert!(!engine.sink.0.is_empty());
        assert!(engine.sink.0.iter().all(|&b| b == 0xAA));
    }
}
