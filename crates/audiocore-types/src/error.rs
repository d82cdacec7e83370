//! Uniform error type for the audio core.
//!
//! Every fallible public operation across the workspace returns
//! `Result<T, ErrKind>`. The IO thread in `audiocore-hdi` never surfaces this
//! type to its caller — fatal conditions there are posted upstream as unload
//! requests instead (see `audiocore_hdi::sink::SinkTimingEngine`).

use thiserror::Error;

/// The uniform error kind used across the audio core.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ErrKind {
    /// Rejected at entry; no state change occurred.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Service adapter not connected, or the driver endpoint handle is absent.
    #[error("invalid handle: {0}")]
    InvalidHandle(String),

    /// Operation is inconsistent with the current session/engine state.
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// The HDI endpoint failed to start.
    #[error("endpoint not started: {0}")]
    NotStarted(String),

    /// The driver failed during device initialization.
    #[error("device init failed: {0}")]
    DeviceInit(String),

    /// A driver call failed for a reason other than init/start.
    #[error("operation failed: {0}")]
    OperationFailed(String),

    /// The operation is not legal given the caller's registration state
    /// (e.g. `ActivateAudioInterrupt` without a prior `SetCallback`).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

/// Convenience result alias used throughout the audio core.
pub type Result<T> = std::result::Result<T, ErrKind>;
