//! Ringer mode.

/// Device-wide ringer mode, independent of any single volume group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RingerMode {
    /// Ring-family streams play normally.
    Normal,
    /// Ring-family streams are silenced; the device vibrates on ring events.
    Vibrate,
    /// Ring-family streams are silenced; no vibration either.
    Silent,
}

impl RingerMode {
    /// Whether this mode forces ringer-sensitive stream types to zero
    /// effective volume (ring is silenced; music is not).
    pub const fn silences_ringer_sensitive(self) -> bool {
        matches!(self, RingerMode::Vibrate | RingerMode::Silent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_normal_leaves_ringer_sensitive_streams_audible() {
        assert!(!RingerMode::Normal.silences_ringer_sensitive());
        assert!(RingerMode::Vibrate.silences_ringer_sensitive());
        assert!(RingerMode::Silent.silences_ringer_sensitive());
    }
}
