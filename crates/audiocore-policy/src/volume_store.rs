//! Volume/mute/ringer persistence.
//!
//! One file per key under the store root, holding a raw 4-byte
//! little-endian value: IEEE-754 float for volumes, signed integer for
//! mute/ringer flags. `KvStore::open` retries directory creation up to 5
//! times at 200ms intervals before giving up, mirroring a
//! `STORE_NOT_FOUND`-detects-and-creates first-boot path.

use audiocore_types::{ErrKind, Result, RingerMode, StreamType, VolumeGroup};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

const OPEN_RETRIES: u32 = 5;
const OPEN_RETRY_DELAY: Duration = Duration::from_millis(200);
const DEFAULT_MAX_VOLUME: f32 = 1.0;

const MIC_MUTE_KEY: &str = "mic_mute";
const RINGER_MODE_KEY: &str = "ringermode";

/// Raw one-file-per-key binary store.
struct KvStore {
    root: PathBuf,
}

impl KvStore {
    /// Open (creating on first boot) the store rooted at `root`, retrying
    /// directory creation with the configured backoff.
    fn open(root: PathBuf) -> Result<Self> {
        let mut last_err = None;
        for attempt in 1..=OPEN_RETRIES {
            if root.is_dir() {
                return Ok(Self { root });
            }
            match fs::create_dir_all(&root) {
                Ok(()) => return Ok(Self { root }),
                Err(e) => {
                    warn!(attempt, error = %e, "volume store open failed, retrying");
                    last_err = Some(e);
                    if attempt < OPEN_RETRIES {
                        thread::sleep(OPEN_RETRY_DELAY);
                    }
                }
            }
        }
        Err(ErrKind::DeviceInit(format!(
            "could not open volume store at {}: {}",
            root.display(),
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn exists(&self, key: &str) -> bool {
        self.key_path(key).is_file()
    }

    fn write_f32(&self, key: &str, v: f32) -> Result<()> {
        fs::write(self.key_path(key), v.to_le_bytes())
            .map_err(|e| ErrKind::OperationFailed(format!("write {key}: {e}")))
    }

    fn read_f32(&self, key: &str) -> Option<f32> {
        let bytes = fs::read(self.key_path(key)).ok()?;
        let arr: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
        Some(f32::from_le_bytes(arr))
    }

    fn write_i32(&self, key: &str, v: i32) -> Result<()> {
        fs::write(self.key_path(key), v.to_le_bytes())
            .map_err(|e| ErrKind::OperationFailed(format!("write {key}: {e}")))
    }

    fn read_i32(&self, key: &str) -> Option<i32> {
        let bytes = fs::read(self.key_path(key)).ok()?;
        let arr: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
        Some(i32::from_le_bytes(arr))
    }
}

fn mute_key(group: VolumeGroup) -> String {
    format!("{}_mute_status", group.key())
}

fn ringer_mode_to_i32(mode: RingerMode) -> i32 {
    match mode {
        RingerMode::Normal => 0,
        RingerMode::Vibrate => 1,
        RingerMode::Silent => 2,
    }
}

fn ringer_mode_from_i32(v: i32) -> RingerMode {
    match v {
        1 => RingerMode::Vibrate,
        2 => RingerMode::Silent,
        _ => RingerMode::Normal,
    }
}

#[derive(Debug, Clone, Copy)]
struct State {
    volumes: [f32; 5],
    mutes: [bool; 5],
    ringer_mode: RingerMode,
    mic_muted: bool,
}

fn group_index(group: VolumeGroup) -> usize {
    VolumeGroup::ALL.iter().position(|g| *g == group).unwrap()
}

/// Volume groups, mutes, and ringer mode, persisted to a [`KvStore`] and
/// cached in memory under a single mutex.
pub struct VolumeStore {
    kv: KvStore,
    state: Mutex<State>,
}

impl VolumeStore {
    /// Open the store at `root`, performing first-boot initialization
    /// (every group at max volume and unmuted, ringer `normal`) if it was
    /// absent.
    pub fn open(root: PathBuf) -> Result<Self> {
        let kv = KvStore::open(root)?;
        let first_boot = !kv.exists(VolumeGroup::Music.key());
        if first_boot {
            info!("volume store absent, performing first-boot initialization");
            for group in VolumeGroup::ALL {
                kv.write_f32(group.key(), DEFAULT_MAX_VOLUME)?;
                kv.write_i32(&mute_key(group), 0)?;
            }
            kv.write_i32(RINGER_MODE_KEY, ringer_mode_to_i32(RingerMode::Normal))?;
            kv.write_i32(MIC_MUTE_KEY, 0)?;
        }

        let mut volumes = [DEFAULT_MAX_VOLUME; 5];
        let mut mutes = [false; 5];
        for group in VolumeGroup::ALL {
            let idx = group_index(group);
            volumes[idx] = kv.read_f32(group.key()).unwrap_or(DEFAULT_MAX_VOLUME);
            mutes[idx] = kv.read_i32(&mute_key(group)).unwrap_or(0) != 0;
        }
        let ringer_mode = ringer_mode_from_i32(kv.read_i32(RINGER_MODE_KEY).unwrap_or(0));
        let mic_muted = kv.read_i32(MIC_MUTE_KEY).unwrap_or(0) != 0;

        Ok(Self {
            kv,
            state: Mutex::new(State {
                volumes,
                mutes,
                ringer_mode,
                mic_muted,
            }),
        })
    }

    /// `SetStreamVolume(type, v)`: clamp to `[0, 1]`, persist, and clear
    /// the group's mute flag if `v > 0`.
    pub fn set_stream_volume(&self, stream_type: StreamType, v: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&v) {
            return Err(ErrKind::InvalidParam(format!(
                "volume {v} out of range [0, 1]"
            )));
        }
        let group = stream_type.volume_group();
        let idx = group_index(group);
        let mut state = self.state.lock();
        state.volumes[idx] = v;
        self.kv.write_f32(group.key(), v)?;
        if v > 0.0 && state.mutes[idx] {
            state.mutes[idx] = false;
            self.kv.write_i32(&mute_key(group), 0)?;
        }
        Ok(())
    }

    /// `GetStreamVolume(type)`: stored group volume, forced to `0.0` when
    /// the ringer is non-normal and the type is ringer-sensitive. Does not
    /// mutate the store.
    pub fn get_stream_volume(&self, stream_type: StreamType) -> f32 {
        let state = self.state.lock();
        if state.ringer_mode.silences_ringer_sensitive() && stream_type.ringer_sensitive() {
            return 0.0;
        }
        state.volumes[group_index(stream_type.volume_group())]
    }

    /// `SetStreamMute(type, m)`.
    pub fn set_stream_mute(&self, stream_type: StreamType, m: bool) -> Result<()> {
        let group = stream_type.volume_group();
        let idx = group_index(group);
        let mut state = self.state.lock();
        state.mutes[idx] = m;
        self.kv.write_i32(&mute_key(group), i32::from(m))
    }

    /// `GetStreamMute(type)`.
    pub fn get_stream_mute(&self, stream_type: StreamType) -> bool {
        self.state.lock().mutes[group_index(stream_type.volume_group())]
    }

    /// `SetRingerMode(m)`: persists; effective volumes of ringer-sensitive
    /// streams change immediately, stored volumes are untouched.
    pub fn set_ringer_mode(&self, mode: RingerMode) -> Result<()> {
        self.state.lock().ringer_mode = mode;
        self.kv.write_i32(RINGER_MODE_KEY, ringer_mode_to_i32(mode))
    }

    /// Current ringer mode.
    pub fn ringer_mode(&self) -> RingerMode {
        self.state.lock().ringer_mode
    }

    /// `SetMicrophoneMute`.
    pub fn set_mic_mute(&self, muted: bool) -> Result<()> {
        self.state.lock().mic_muted = muted;
        self.kv.write_i32(MIC_MUTE_KEY, i32::from(muted))
    }

    /// Current microphone mute flag, as read by the HDI source engine at
    /// every (re)init.
    pub fn mic_muted(&self) -> bool {
        self.state.lock().mic_muted
    }
}

/// Open a [`VolumeStore`] at the platform-default store root.
pub fn open_default() -> Result<VolumeStore> {
    VolumeStore::open(crate::paths::store_root())
}

/// Open a [`VolumeStore`] rooted at an explicit path — used by tests and
/// by deployments that override the default platform location.
pub fn open_at(root: impl AsRef<Path>) -> Result<VolumeStore> {
    VolumeStore::open(root.as_ref().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, VolumeStore) {
        let dir = TempDir::new().unwrap();
        let store = VolumeStore::open(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    #[test]
    fn first_boot_initializes_max_volume_and_normal_ringer() {
        let (_dir, store) = store();
        assert_eq!(store.get_stream_volume(StreamType::Music), 1.0);
        assert_eq!(store.ringer_mode(), RingerMode::Normal);
        assert!(!store.get_stream_mute(StreamType::Music));
    }

    #[test]
    fn set_then_get_round_trips() {
        let (_dir, store) = store();
        store.set_stream_volume(StreamType::Music, 0.5).unwrap();
        assert_eq!(store.get_stream_volume(StreamType::Music), 0.5);
    }

    #[test]
    fn out_of_range_volume_rejected() {
        let (_dir, store) = store();
        assert!(store.set_stream_volume(StreamType::Music, -0.1).is_err());
        assert!(store.set_stream_volume(StreamType::Music, 1.1).is_err());
        assert!(store.set_stream_volume(StreamType::Music, 0.0).is_ok());
        assert!(!store.get_stream_mute(StreamType::Music));
    }

    #[test]
    fn ringer_silent_silences_ring_not_music() {
        let (_dir, store) = store();
        store.set_stream_volume(StreamType::Ring, 0.8).unwrap();
        store.set_ringer_mode(RingerMode::Silent).unwrap();
        assert_eq!(store.get_stream_volume(StreamType::Ring), 0.0);
        assert_eq!(store.get_stream_volume(StreamType::Music), 1.0);
        store.set_ringer_mode(RingerMode::Normal).unwrap();
        assert_eq!(store.get_stream_volume(StreamType::Ring), 0.8);
    }

    #[test]
    fn set_mute_is_idempotent_and_cleared_by_set_volume() {
        let (_dir, store) = store();
        store.set_stream_mute(StreamType::Music, true).unwrap();
        store.set_stream_mute(StreamType::Music, true).unwrap();
        assert!(store.get_stream_mute(StreamType::Music));
        store.set_stream_volume(StreamType::Music, 0.5).unwrap();
        assert!(!store.get_stream_mute(StreamType::Music));
        assert_eq!(store.get_stream_volume(StreamType::Music), 0.5);
    }

    #[test]
    fn state_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = VolumeStore::open(dir.path().to_path_buf()).unwrap();
            store.set_stream_volume(StreamType::Alarm, 0.3).unwrap();
            store.set_ringer_mode(RingerMode::Vibrate).unwrap();
        }
        let reopened = VolumeStore::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(reopened.get_stream_volume(StreamType::Alarm), 0.3);
        assert_eq!(reopened.ringer_mode(), RingerMode::Vibrate);
    }
}
