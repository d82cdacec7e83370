//! Platform-specific path for the persistent volume/ringer key-value store.

use std::path::PathBuf;

const APP_NAME: &str = "audiocore";
const STORE_SUBDIR: &str = "store";

/// Root directory the key-value store lives under.
///
/// - Linux: `~/.local/share/audiocore/store/`
/// - macOS: `~/Library/Application Support/audiocore/store/`
/// - Windows: `%APPDATA%\audiocore\store\`
///
/// Falls back to `./audiocore-store` if the platform data directory cannot
/// be determined.
pub fn store_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join(STORE_SUBDIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_root_is_namespaced_under_app_name() {
        let dir = store_root();
        assert!(dir.to_string_lossy().contains(APP_NAME));
    }
}
