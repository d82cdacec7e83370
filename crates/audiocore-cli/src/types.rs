//! CLI-facing value-enum wrappers around the policy layer's domain types.

use audiocore_types::{ActiveDeviceType, DeviceFlag, RingerMode, StreamType};
use clap::ValueEnum;

/// `StreamType`, spelled out for `--stream-type` flags.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StreamTypeArg {
    VoiceCall,
    VoiceAssistant,
    Ring,
    Alarm,
    System,
    Notification,
    Dtmf,
    Accessibility,
    BluetoothSco,
    Speech,
    Music,
    Movie,
    Game,
    Ultrasonic,
}

impl From<StreamTypeArg> for StreamType {
    fn from(a: StreamTypeArg) -> Self {
        match a {
            StreamTypeArg::VoiceCall => StreamType::VoiceCall,
            StreamTypeArg::VoiceAssistant => StreamType::VoiceAssistant,
            StreamTypeArg::Ring => StreamType::Ring,
            StreamTypeArg::Alarm => StreamType::Alarm,
            StreamTypeArg::System => StreamType::System,
            StreamTypeArg::Notification => StreamType::Notification,
            StreamTypeArg::Dtmf => StreamType::Dtmf,
            StreamTypeArg::Accessibility => StreamType::Accessibility,
            StreamTypeArg::BluetoothSco => StreamType::BluetoothSco,
            StreamTypeArg::Speech => StreamType::Speech,
            StreamTypeArg::Music => StreamType::Music,
            StreamTypeArg::Movie => StreamType::Movie,
            StreamTypeArg::Game => StreamType::Game,
            StreamTypeArg::Ultrasonic => StreamType::Ultrasonic,
        }
    }
}

/// `RingerMode`, spelled out for `--mode` flags.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RingerModeArg {
    Normal,
    Vibrate,
    Silent,
}

impl From<RingerModeArg> for RingerMode {
    fn from(a: RingerModeArg) -> Self {
        match a {
            RingerModeArg::Normal => RingerMode::Normal,
            RingerModeArg::Vibrate => RingerMode::Vibrate,
            RingerModeArg::Silent => RingerMode::Silent,
        }
    }
}

/// `ActiveDeviceType`, spelled out for `devices select`.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ActiveDeviceTypeArg {
    Speaker,
    BluetoothSco,
    WiredHeadset,
    UsbHeadset,
    A2dp,
    FileSink,
}

impl From<ActiveDeviceTypeArg> for ActiveDeviceType {
    fn from(a: ActiveDeviceTypeArg) -> Self {
        match a {
            ActiveDeviceTypeArg::Speaker => ActiveDeviceType::Speaker,
            ActiveDeviceTypeArg::BluetoothSco => ActiveDeviceType::BluetoothSco,
            ActiveDeviceTypeArg::WiredHeadset => ActiveDeviceType::WiredHeadset,
            ActiveDeviceTypeArg::UsbHeadset => ActiveDeviceType::UsbHeadset,
            ActiveDeviceTypeArg::A2dp => ActiveDeviceType::A2dp,
            ActiveDeviceTypeArg::FileSink => ActiveDeviceType::FileSink,
        }
    }
}

/// `DeviceFlag`, spelled out for `devices list --flag`.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DeviceFlagArg {
    Output,
    Input,
    All,
    DistributedOutput,
    DistributedInput,
    AllDistributed,
    AllLocalAndDistributed,
}

impl From<DeviceFlagArg> for DeviceFlag {
    fn from(a: DeviceFlagArg) -> Self {
        match a {
            DeviceFlagArg::Output => DeviceFlag::Output,
            DeviceFlagArg::Input => DeviceFlag::Input,
            DeviceFlagArg::All => DeviceFlag::All,
            DeviceFlagArg::DistributedOutput => DeviceFlag::DistributedOutput,
            DeviceFlagArg::DistributedInput => DeviceFlag::DistributedInput,
            DeviceFlagArg::AllDistributed => DeviceFlag::AllDistributed,
            DeviceFlagArg::AllLocalAndDistributed => DeviceFlag::AllLocalAndDistributed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_type_arg_covers_every_variant() {
        assert_eq!(StreamType::from(StreamTypeArg::Music), StreamType::Music);
        assert_eq!(StreamType::from(StreamTypeArg::Ring), StreamType::Ring);
        assert_eq!(
            StreamType::from(StreamTypeArg::Ultrasonic),
            StreamType::Ultrasonic
        );
    }

    #[test]
    fn ringer_mode_arg_round_trips() {
        assert_eq!(RingerMode::from(RingerModeArg::Silent), RingerMode::Silent);
        assert_eq!(RingerMode::from(RingerModeArg::Normal), RingerMode::Normal);
    }

    #[test]
    fn active_device_type_arg_round_trips() {
        assert_eq!(
            ActiveDeviceType::from(ActiveDeviceTypeArg::A2dp),
            ActiveDeviceType::A2dp
        );
    }

    #[test]
    fn device_flag_arg_round_trips() {
        assert_eq!(
            DeviceFlag::from(DeviceFlagArg::AllLocalAndDistributed),
            DeviceFlag::AllLocalAndDistributed
        );
    }
}
