//! Module args serialization, re-exported for convenience.
//!
//! The `AudioModuleInfo -> key=value` mapping itself lives on the type in
//! `audiocore-types` (it's pure data shaping, no daemon interaction); this
//! module just re-exports it at the call site the registry actually uses.

pub use audiocore_types::AudioModuleInfo;

#[cfg(test)]
mod tests {
    use audiocore_types::{AdapterLib, AudioModuleInfo, SampleFormat};

    #[test]
    fn hdi_source_uses_source_name_key() {
        let cfg = AudioModuleInfo {
            lib: AdapterLib::HdiSource,
            name: "Built_in_mic".to_string(),
            adapter_name: "primary".to_string(),
            class_name: "file-io".to_string(),
            rate: 48000,
            channels: 1,
            format: SampleFormat::S16Le,
            buffer_size: 4096,
            file_name: None,
            network_id: String::new(),
            device_type: "mic".to_string(),
            fixed_latency: false,
            render_in_idle_state: false,
            test_mode_on: false,
        };
        assert!(cfg.to_args_string().contains("source_name=Built_in_mic"));
    }
}
