//! `ModuleInstance`: one loaded driver-side endpoint.

use std::fmt;

/// Opaque handle to a loaded driver endpoint, returned by `OpenAudioPort`.
///
/// Handles are process-wide unique and never reused across `OpenAudioPort`
/// calls, even after the handle they once named has been closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IoHandle(pub u32);

impl fmt::Display for IoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IoHandle({})", self.0)
    }
}

/// A handle value guaranteed never to name a live module.
pub const INVALID_HANDLE: IoHandle = IoHandle(u32::MAX);

/// PCM sample format, as negotiated with the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// 16-bit signed little-endian PCM.
    S16Le,
    /// 24-bit signed little-endian PCM.
    S24Le,
    /// 32-bit signed little-endian PCM.
    S32Le,
    /// 32-bit IEEE float PCM.
    F32Le,
}

impl SampleFormat {
    /// Size of one sample in bytes.
    pub const fn bytes_per_sample(self) -> u32 {
        match self {
            SampleFormat::S16Le => 2,
            SampleFormat::S24Le => 3,
            SampleFormat::S32Le | SampleFormat::F32Le => 4,
        }
    }
}

/// The library a module is loaded from, determining its module-args
/// serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterLib {
    /// `libmodule-hdi-sink`: a real (or file-backed test) HDI render endpoint.
    HdiSink,
    /// `libmodule-hdi-source`: a real (or file-backed test) HDI capture endpoint.
    HdiSource,
    /// Pipe sink, used for debug/file-backed output.
    PipeSink,
    /// Pipe source, used for debug/file-backed input.
    PipeSource,
}

impl AdapterLib {
    /// The library name string as it would appear in module args.
    pub const fn lib_name(self) -> &'static str {
        match self {
            AdapterLib::HdiSink => "libmodule-hdi-sink",
            AdapterLib::HdiSource => "libmodule-hdi-source",
            AdapterLib::PipeSink => "libmodule-pipe-sink",
            AdapterLib::PipeSource => "libmodule-pipe-source",
        }
    }

    /// True for the sink-direction libraries.
    pub const fn is_sink(self) -> bool {
        matches!(self, AdapterLib::HdiSink | AdapterLib::PipeSink)
    }
}

/// The configuration tuple carried by a `ModuleInstance`.
#[derive(Debug, Clone)]
pub struct AudioModuleInfo {
    /// Adapter library to load.
    pub lib: AdapterLib,
    /// Sink/source name registered with the mixing daemon.
    pub name: String,
    /// HDI adapter name (e.g. "primary", "usb", "remote").
    pub adapter_name: String,
    /// Device class string passed to the driver.
    pub class_name: String,
    /// Sample rate, Hz.
    pub rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Sample format.
    pub format: SampleFormat,
    /// Buffer size, in bytes.
    pub buffer_size: u32,
    /// Backing file path, for pipe/file-backed libraries.
    pub file_name: Option<String>,
    /// Distributed network id; empty/"LocalDevice" for local devices.
    pub network_id: String,
    /// Device type string passed to the driver.
    pub device_type: String,
    /// Whether the driver reports a fixed (non-adaptive) latency.
    pub fixed_latency: bool,
    /// Whether rendering continues while the sink is idle (no active input).
    pub render_in_idle_state: bool,
    /// Test-mode flag; emits `test_mode_on=1` in serialized args when set.
    pub test_mode_on: bool,
}

impl AudioModuleInfo {
    /// Serialize to the whitespace-delimited `key=value` argument string the
    /// mixing daemon's `OpenAudioPort` expects.
    ///
    /// Pipe libraries only ever serialize `file=<path>`; HDI sink/source
    /// libraries serialize the full parameter set.
    pub fn to_args_string(&self) -> String {
        match self.lib {
            AdapterLib::PipeSink | AdapterLib::PipeSource => {
                format!("file={}", self.file_name.as_deref().unwrap_or(""))
            }
            AdapterLib::HdiSink | AdapterLib::HdiSource => {
                let name_key = if self.lib.is_sink() {
                    "sink_name"
                } else {
                    "source_name"
                };
                let network_id = if self.network_id.is_empty() {
                    "LocalDevice"
                } else {
                    self.network_id.as_str()
                };
                let mut parts = vec![
                    format!("rate={}", self.rate),
                    format!("channels={}", self.channels),
                    format!("buffer_size={}", self.buffer_size),
                    format!("format={}", format_key(self.format)),
                    format!("fixed_latency={}", bool_flag(self.fixed_latency)),
                    format!(
                        "render_in_idle_state={}",
                        bool_flag(self.render_in_idle_state)
                    ),
                    format!("{}={}", name_key, self.name),
                    format!("adapter_name={}", self.adapter_name),
                    format!("device_class={}", self.class_name),
                    format!("network_id={}", network_id),
                    format!("device_type={}", self.device_type),
                ];
                if let Some(path) = &self.file_name {
                    parts.push(format!("file_path={}", path));
                }
                if self.test_mode_on {
                    parts.push("test_mode_on=1".to_string());
                }
                parts.join(" ")
            }
        }
    }
}

const fn format_key(fmt: SampleFormat) -> &'static str {
    match fmt {
        SampleFormat::S16Le => "s16le",
        SampleFormat::S24Le => "s24le",
        SampleFormat::S32Le => "s32le",
        SampleFormat::F32Le => "f32le",
    }
}

const fn bool_flag(b: bool) -> &'static str {
    if b { "1" } else { "0" }
}

/// Lifecycle state of a `ModuleInstance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// `OpenAudioPort` in progress.
    Loading,
    /// The module's sink/source is live.
    Active,
    /// The underlying HDI endpoint is torn down; handle remains valid.
    Suspended,
    /// `CloseAudioPort` in progress.
    Unloading,
}

/// One loaded driver-side endpoint. Owned exclusively by the
/// adapter module registry.
#[derive(Debug, Clone)]
pub struct ModuleInstance {
    /// Handle returned by `OpenAudioPort`.
    pub handle: IoHandle,
    /// Configuration this instance was opened with.
    pub config: AudioModuleInfo,
    /// Current lifecycle state.
    pub state: ModuleState,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hdi_sink_config() -> AudioModuleInfo {
        AudioModuleInfo {
            lib: AdapterLib::HdiSink,
            name: "Speaker_File".to_string(),
            adapter_name: "primary".to_string(),
            class_name: "file-io".to_string(),
            rate: 48000,
            channels: 2,
            format: SampleFormat::S16Le,
            buffer_size: 8192,
            file_name: None,
            network_id: String::new(),
            device_type: "speaker".to_string(),
            fixed_latency: false,
            render_in_idle_state: false,
            test_mode_on: false,
        }
    }

    #[test]
    fn hdi_sink_args_contain_all_recognized_keys() {
        let args = hdi_sink_config().to_args_string();
        for key in [
            "rate=48000",
            "channels=2",
            "buffer_size=8192",
            "format=s16le",
            "sink_name=Speaker_File",
            "adapter_name=primary",
            "network_id=LocalDevice",
        ] {
            assert!(args.contains(key), "missing {key} in {args}");
        }
    }

    #[test]
    fn pipe_sink_args_are_file_only() {
        let mut cfg = hdi_sink_config();
        cfg.lib = AdapterLib::PipeSink;
        cfg.file_name = Some("/tmp/out.pcm".to_string());
        assert_eq!(cfg.to_args_string(), "file=/tmp/out.pcm");
    }

    #[test]
    fn test_mode_flag_is_appended() {
        let mut cfg = hdi_sink_config();
        cfg.test_mode_on = true;
        assert!(cfg.to_args_string().ends_with("test_mode_on=1"));
    }
}
