//! Device descriptors and the device-table query vocabulary.

use std::time::Instant;

/// Physical/logical category of an audio device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    /// Built-in speaker.
    Speaker,
    /// Built-in microphone.
    Mic,
    /// Wired (3.5mm/USB-C analog) headset.
    WiredHeadset,
    /// USB headset/DAC.
    UsbHeadset,
    /// Bluetooth SCO (voice) device.
    BluetoothSco,
    /// Bluetooth A2DP (media) device.
    BluetoothA2dp,
    /// Distributed (networked) remote rendering device.
    RemoteCast,
    /// Debug/file sink or source, not real hardware.
    FileSink,
}

/// Whether a device is used for output (render) or input (capture).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceRole {
    /// Output/render device.
    Output,
    /// Input/capture device.
    Input,
}

/// Local vs. distributed (networked) connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectType {
    /// Directly attached to this device.
    Local,
    /// Reached over the distributed audio network.
    Distributed,
}

/// The category passed to `SetDeviceActive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActiveDeviceType {
    /// Built-in speaker.
    Speaker,
    /// Bluetooth SCO.
    BluetoothSco,
    /// Wired headset.
    WiredHeadset,
    /// USB headset.
    UsbHeadset,
    /// Bluetooth A2DP.
    A2dp,
    /// Debug file sink.
    FileSink,
}

impl ActiveDeviceType {
    /// The corresponding `DeviceType`, used when looking the device up in
    /// the device table.
    pub const fn device_type(self) -> DeviceType {
        match self {
            ActiveDeviceType::Speaker => DeviceType::Speaker,
            ActiveDeviceType::BluetoothSco => DeviceType::BluetoothSco,
            ActiveDeviceType::WiredHeadset => DeviceType::WiredHeadset,
            ActiveDeviceType::UsbHeadset => DeviceType::UsbHeadset,
            ActiveDeviceType::A2dp => DeviceType::BluetoothA2dp,
            ActiveDeviceType::FileSink => DeviceType::FileSink,
        }
    }
}

/// A channel mask: one bit set per active channel position.
pub type ChannelMask = u32;

/// One entry in the device table.
///
/// Invariant: `(device_type, role, network_id, mac_address)` is unique
/// within a device table — enforced by `audiocore_policy::routing::DeviceTable`
/// at insertion time, not by this type.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    /// Hardware/logical category.
    pub device_type: DeviceType,
    /// Output or input.
    pub role: DeviceRole,
    /// Opaque device identifier, process-wide unique per (type, role).
    pub device_id: u32,
    /// Non-empty iff this is a remote/distributed device.
    pub network_id: String,
    /// Distinguishes directly-attached hardware from distributed devices.
    pub connect_type: ConnectType,
    /// MAC address, when meaningful (Bluetooth devices); empty otherwise.
    pub mac_address: String,
    /// Supported channel mask.
    pub channel_mask: ChannelMask,
    /// Supported sample rates, in Hz.
    pub sample_rates: Vec<u32>,
    /// Monotonic connect timestamp, used to break ties when multiple
    /// devices of the same preference tier are present.
    pub connected_at: Instant,
}

impl DeviceDescriptor {
    /// True iff this is a distributed (networked) device.
    pub fn is_distributed(&self) -> bool {
        !self.network_id.is_empty()
    }
}

/// The filter passed to `GetDevices`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFlag {
    /// All local output devices.
    Output,
    /// All local input devices.
    Input,
    /// All local devices, any role.
    All,
    /// Distributed output devices only.
    DistributedOutput,
    /// Distributed input devices only.
    DistributedInput,
    /// All distributed devices, any role.
    AllDistributed,
    /// Local and distributed devices, any role.
    AllLocalAndDistributed,
}

impl DeviceFlag {
    /// Whether `d` matches this filter.
    pub fn matches(self, d: &DeviceDescriptor) -> bool {
        let distributed = d.is_distributed();
        match self {
            DeviceFlag::Output => !distributed && d.role == DeviceRole::Output,
            DeviceFlag::Input => !distributed && d.role == DeviceRole::Input,
            DeviceFlag::All => !distributed,
            DeviceFlag::DistributedOutput => distributed && d.role == DeviceRole::Output,
            DeviceFlag::DistributedInput => distributed && d.role == DeviceRole::Input,
            DeviceFlag::AllDistributed => distributed,
            DeviceFlag::AllLocalAndDistributed => true,
        }
    }
}
