//! `StreamType`, its volume-group mapping, and the application-facing
//! `StreamUsage` that gets translated to a `StreamType` at session creation.

/// A logical audio purpose. Closed enumeration (see `DESIGN.md` for the
/// rationale behind the exact variant set).
///
/// Variant order is also the default focus-priority tier used by the
/// interrupt arbitration engine's total order (lower discriminant = higher
/// priority). There is no distinct `Wakeup` playback stream type; it
/// collapses into `Game` (see `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum StreamType {
    /// Cellular/VoIP voice call audio. Highest priority.
    VoiceCall = 0,
    /// Voice assistant prompts (ducks rather than pauses music, per policy table).
    VoiceAssistant = 1,
    /// Ringtone for incoming calls.
    Ring = 2,
    /// Alarm clock audio; not silenced by ringer mode.
    Alarm = 3,
    /// System feedback sounds (camera shutter, keyboard clicks, …).
    System = 4,
    /// Notification tones.
    Notification = 5,
    /// DTMF dial tones.
    Dtmf = 6,
    /// Accessibility announcements (screen reader, …).
    Accessibility = 7,
    /// Bluetooth SCO voice path.
    BluetoothSco = 8,
    /// Speech content (e.g. audiobooks, podcasts).
    Speech = 9,
    /// Music playback.
    Music = 10,
    /// Movie/video playback audio.
    Movie = 11,
    /// Game audio.
    Game = 12,
    /// Ultrasonic (inaudible) signaling. Lowest priority.
    Ultrasonic = 13,
}

impl StreamType {
    /// All stream types, in priority order (index 0 = highest priority).
    pub const ALL: [StreamType; 14] = [
        StreamType::VoiceCall,
        StreamType::VoiceAssistant,
        StreamType::Ring,
        StreamType::Alarm,
        StreamType::System,
        StreamType::Notification,
        StreamType::Dtmf,
        StreamType::Accessibility,
        StreamType::BluetoothSco,
        StreamType::Speech,
        StreamType::Music,
        StreamType::Movie,
        StreamType::Game,
        StreamType::Ultrasonic,
    ];

    /// The volume group this stream type's volume and mute state live
    /// under: `music -> music`; `{notification, dtmf, system, ring} ->
    /// ring`; `alarm -> alarm`; `voiceCall -> voiceCall`; `voiceAssistant
    /// -> voiceAssistant`; everything else -> `music`.
    pub const fn volume_group(self) -> VolumeGroup {
        match self {
            StreamType::Music => VolumeGroup::Music,
            StreamType::Notification | StreamType::Dtmf | StreamType::System | StreamType::Ring => {
                VolumeGroup::Ring
            }
            StreamType::Alarm => VolumeGroup::Alarm,
            StreamType::VoiceCall => VolumeGroup::VoiceCall,
            StreamType::VoiceAssistant => VolumeGroup::VoiceAssistant,
            StreamType::Accessibility
            | StreamType::BluetoothSco
            | StreamType::Speech
            | StreamType::Movie
            | StreamType::Game
            | StreamType::Ultrasonic => VolumeGroup::Music,
        }
    }

    /// Whether the ringer mode (`silent`/`vibrate`) forces this stream
    /// type's effective volume to zero. Ring-family streams are
    /// ringer-sensitive; alarm and voice call are never silenced this way
    /// (alarms must still sound, and calls use their own in-call volume
    /// path).
    pub const fn ringer_sensitive(self) -> bool {
        matches!(
            self,
            StreamType::Ring | StreamType::Notification | StreamType::Dtmf | StreamType::System
        )
    }

    /// The focus priority tier for the interrupt arbitration policy table.
    /// Lower value wins ties between requests at the same moment.
    pub const fn priority_tier(self) -> u8 {
        self as u8
    }
}

/// The volume group a `StreamType` belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeGroup {
    /// Shared by music and any stream type with no dedicated group.
    Music,
    /// Shared by notification, dtmf, system, and ring.
    Ring,
    /// Alarm clock volume, independent of ringer mode.
    Alarm,
    /// Voice call volume.
    VoiceCall,
    /// Voice assistant volume.
    VoiceAssistant,
}

impl VolumeGroup {
    /// All volume groups, used to enumerate persistence keys at first boot.
    pub const ALL: [VolumeGroup; 5] = [
        VolumeGroup::Music,
        VolumeGroup::Ring,
        VolumeGroup::Alarm,
        VolumeGroup::VoiceCall,
        VolumeGroup::VoiceAssistant,
    ];

    /// The persistence key this group is stored under.
    pub const fn key(self) -> &'static str {
        match self {
            VolumeGroup::Music => "music",
            VolumeGroup::Ring => "ring",
            VolumeGroup::Alarm => "alarm",
            VolumeGroup::VoiceCall => "voice_call",
            VolumeGroup::VoiceAssistant => "voice_assistant",
        }
    }
}

/// Application-facing intent, translated to a `StreamType` at session
/// creation. Kept as a distinct enum from `StreamType` since more than one
/// usage can map to the same underlying stream type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamUsage {
    /// Unknown/unspecified usage.
    Unknown,
    /// General media playback (collapses into `Music`).
    Media,
    /// Music playback.
    Music,
    /// Voice call communication.
    VoiceCommunication,
    /// Voice assistant prompts.
    VoiceAssistant,
    /// Alarm clock.
    Alarm,
    /// Ringtone for incoming notifications/calls.
    Ringtone,
    /// General notification tone.
    Notification,
    /// Accessibility announcement.
    Accessibility,
    /// System feedback sound.
    System,
    /// Movie/video playback.
    Movie,
    /// Game audio.
    Game,
    /// Audiobook narration.
    Audiobook,
    /// Turn-by-turn navigation prompts.
    Navigation,
    /// DTMF dial tone.
    Dtmf,
}

impl StreamUsage {
    /// The `StreamType` this usage maps to by default. `Media` collapses
    /// into `Music` since no distinct media-volume group exists.
    pub const fn default_stream_type(self) -> StreamType {
        match self {
            StreamUsage::Media | StreamUsage::Music | StreamUsage::Unknown => StreamType::Music,
            StreamUsage::VoiceCommunication => StreamType::VoiceCall,
            StreamUsage::VoiceAssistant => StreamType::VoiceAssistant,
            StreamUsage::Alarm => StreamType::Alarm,
            StreamUsage::Ringtone => StreamType::Ring,
            StreamUsage::Notification => StreamType::Notification,
            StreamUsage::Accessibility => StreamType::Accessibility,
            StreamUsage::System => StreamType::System,
            StreamUsage::Movie => StreamType::Movie,
            StreamUsage::Game => StreamType::Game,
            StreamUsage::Audiobook => StreamType::Speech,
            StreamUsage::Navigation => StreamType::Speech,
            StreamUsage::Dtmf => StreamType::Dtmf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_family_shares_group() {
        assert_eq!(StreamType::Notification.volume_group(), VolumeGroup::Ring);
        assert_eq!(StreamType::Dtmf.volume_group(), VolumeGroup::Ring);
        assert_eq!(StreamType::System.volume_group(), VolumeGroup::Ring);
        assert_eq!(StreamType::Ring.volume_group(), VolumeGroup::Ring);
    }

    #[test]
    fn unmapped_types_fall_back_to_music() {
        assert_eq!(StreamType::Game.volume_group(), VolumeGroup::Music);
        assert_eq!(StreamType::Movie.volume_group(), VolumeGroup::Music);
    }

    #[test]
    fn alarm_and_voice_call_are_not_ringer_sensitive() {
        assert!(!StreamType::Alarm.ringer_sensitive());
        assert!(!StreamType::VoiceCall.ringer_sensitive());
        assert!(StreamType::Ring.ringer_sensitive());
    }

    #[test]
    fn voice_call_outranks_music() {
        assert!(StreamType::VoiceCall.priority_tier() < StreamType::Music.priority_tier());
    }

    #[test]
    fn media_usage_collapses_to_music() {
        assert_eq!(StreamUsage::Media.default_stream_type(), StreamType::Music);
    }
}
