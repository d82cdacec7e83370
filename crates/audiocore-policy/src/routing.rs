//! Routing & device selection.

use crate::callback_worker::CallbackWorker;
use audiocore_types::{
    ActiveDeviceType, AudioCategory, AudioRoute, AudioScene, DeviceDescriptor, DeviceFlag,
    DeviceRole, DeviceType, ErrKind, PinType, Result, SessionId, StreamType,
};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Opaque handle returned by `DriverEndpoint.updateAudioRoute`, released on
/// device deactivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteHandle(pub u64);

/// Driver-facing half of routing: building and tearing down routes,
/// selecting scenes, and switching default sink/source. Kept behind a
/// trait so this crate never depends on a concrete `DriverEndpoint`.
pub trait RouteDriver: Send + Sync {
    /// `DriverEndpoint.updateAudioRoute(route) -> routeHandle`.
    fn update_audio_route(&self, route: &AudioRoute) -> Result<RouteHandle>;

    /// Release a previously returned route handle.
    fn release_audio_route(&self, handle: RouteHandle);

    /// `DriverEndpoint.selectScene({category, pin})`.
    fn select_scene(&self, category: AudioCategory, pin: PinType) -> Result<()>;

    /// `SetDefaultSink(name)`.
    fn set_default_sink(&self, name: &str) -> Result<()>;

    /// `SetDefaultSource(name)`.
    fn set_default_source(&self, name: &str) -> Result<()>;
}

/// A device appeared or disappeared, or the active device for a role
/// changed — dispatched via the callback worker.
#[derive(Debug, Clone)]
pub enum DeviceChange {
    /// The active device for `role` changed to `device`.
    ActiveDeviceChanged { role: DeviceRole, device: DeviceDescriptor },
}

/// The known device set, keyed by `(device_type, role, network_id,
/// mac_address)` uniqueness.
#[derive(Debug, Default)]
pub struct DeviceTable {
    devices: Vec<DeviceDescriptor>,
}

impl DeviceTable {
    /// An empty table.
    pub fn new() -> Self {
        Self { devices: Vec::new() }
    }

    fn key(d: &DeviceDescriptor) -> (DeviceType, DeviceRole, &str, &str) {
        (d.device_type, d.role, d.network_id.as_str(), d.mac_address.as_str())
    }

    /// Insert or replace a device.
    pub fn upsert(&mut self, device: DeviceDescriptor) {
        let key = (
            device.device_type,
            device.role,
            device.network_id.clone(),
            device.mac_address.clone(),
        );
        self.devices.retain(|d| {
            (d.device_type, d.role, d.network_id.clone(), d.mac_address.clone()) != key
        });
        self.devices.push(device);
    }

    /// Remove a device by identity.
    pub fn remove(&mut self, device_type: DeviceType, role: DeviceRole, device_id: u32) {
        self.devices
            .retain(|d| !(d.device_type == device_type && d.role == role && d.device_id == device_id));
    }

    /// `GetDevices(flag)`.
    pub fn get_devices(&self, flag: DeviceFlag) -> Vec<DeviceDescriptor> {
        self.devices
            .iter()
            .filter(|d| flag.matches(d))
            .cloned()
            .collect()
    }

    fn find(&self, device_type: DeviceType, role: DeviceRole) -> Option<&DeviceDescriptor> {
        self.devices
            .iter()
            .find(|d| d.device_type == device_type && d.role == role)
    }
}

/// Fallback preference order for hot-plug selection:
/// wired headset, usb headset, a2dp (if the stream type allows it),
/// bluetooth sco, speaker/mic, file (debug).
fn preference_order(role: DeviceRole, allow_a2dp: bool) -> Vec<DeviceType> {
    let mut order = vec![DeviceType::WiredHeadset, DeviceType::UsbHeadset];
    if allow_a2dp {
        order.push(DeviceType::BluetoothA2dp);
    }
    order.push(DeviceType::BluetoothSco);
    order.push(if role == DeviceRole::Output {
        DeviceType::Speaker
    } else {
        DeviceType::Mic
    });
    order.push(DeviceType::FileSink);
    order
}

/// Whether `stream_type` is allowed to route to an A2DP device (voice
/// call audio never goes over A2DP; SCO is used instead).
fn stream_allows_a2dp(stream_type: StreamType) -> bool {
    !matches!(stream_type, StreamType::VoiceCall)
}

fn active_device_type_to_device_type(t: ActiveDeviceType) -> DeviceType {
    t.device_type()
}

/// Owns the device table, active-route handles, and the selection
/// algorithm.
pub struct Router<D: RouteDriver> {
    driver: D,
    devices: Mutex<DeviceTable>,
    active: Mutex<HashMap<DeviceRole, DeviceDescriptor>>,
    route_handles: Mutex<HashMap<DeviceRole, RouteHandle>>,
    explicit_selections: Mutex<HashMap<SessionId, DeviceDescriptor>>,
    callbacks: CallbackWorker<DeviceChange>,
}

impl<D: RouteDriver> Router<D> {
    /// Construct an empty router over `driver`, dispatching device-change
    /// events through `on_change`.
    pub fn new(driver: D, on_change: impl FnMut(DeviceChange) + Send + 'static) -> Self {
        Self {
            driver,
            devices: Mutex::new(DeviceTable::new()),
            active: Mutex::new(HashMap::new()),
            route_handles: Mutex::new(HashMap::new()),
            explicit_selections: Mutex::new(HashMap::new()),
            callbacks: CallbackWorker::new(on_change),
        }
    }

    /// `GetDevices(flag)`.
    pub fn get_devices(&self, flag: DeviceFlag) -> Vec<DeviceDescriptor> {
        self.devices.lock().get_devices(flag)
    }

    /// Record an explicit user device selection for `session`, consulted
    /// first by the hot-plug selection algorithm (step 1).
    pub fn select_output_device(&self, session: SessionId, device: DeviceDescriptor) {
        self.explicit_selections.lock().insert(session, device);
    }

    /// Symmetric with `select_output_device`, for input routing.
    pub fn select_input_device(&self, session: SessionId, device: DeviceDescriptor) {
        self.explicit_selections.lock().insert(session, device);
    }

    /// `SetDeviceActive(ActiveDeviceType, bool)`.
    pub fn set_device_active(&self, device_type: ActiveDeviceType, active: bool) -> Result<()> {
        if !active {
            return Ok(());
        }
        let dt = active_device_type_to_device_type(device_type);
        let role = DeviceRole::Output;
        let device = self
            .devices
            .lock()
            .find(dt, role)
            .cloned()
            .ok_or_else(|| ErrKind::InvalidParam(format!("no device of type {dt:?} present")))?;
        self.activate_device(role, device)
    }

    /// Build a route for `device` on `role`, releasing any prior route
    /// handle for that role first.
    fn activate_device(&self, role: DeviceRole, device: DeviceDescriptor) -> Result<()> {
        if let Some(old) = self.route_handles.lock().remove(&role) {
            self.driver.release_audio_route(old);
        }

        let route = AudioRoute {
            scene: AudioScene::Default,
            category: AudioCategory::Media,
            device: device.clone(),
            nodes: Vec::new(),
        };
        let handle = self.driver.update_audio_route(&route)?;
        self.route_handles.lock().insert(role, handle);

        let endpoint_name = format!("{:?}_{:?}", device.device_type, role).to_lowercase();
        if role == DeviceRole::Output {
            self.driver.set_default_sink(&endpoint_name)?;
        } else {
            self.driver.set_default_source(&endpoint_name)?;
        }

        self.active.lock().insert(role, device.clone());
        self.callbacks.post(DeviceChange::ActiveDeviceChanged { role, device });
        Ok(())
    }

    /// `SetAudioScene(scene, activeDevice)`.
    pub fn set_audio_scene(&self, scene: AudioScene, active_device: &DeviceDescriptor) -> Result<()> {
        self.activate_device(active_device.role, active_device.clone())?;
        let category = match scene {
            AudioScene::Default => AudioCategory::Media,
            AudioScene::Ringing => AudioCategory::Ring,
            AudioScene::PhoneCall => AudioCategory::Voice,
            AudioScene::PhoneChat => AudioCategory::Communication,
        };
        self.driver.select_scene(category, PinType::None)
    }

    /// Hot-plug selection algorithm for one session.
    /// Returns the device that should now carry `session`, consulting an
    /// explicit selection first, then the fallback preference order.
    pub fn select_for_session(
        &self,
        session: SessionId,
        role: DeviceRole,
        stream_type: StreamType,
    ) -> Option<DeviceDescriptor> {
        let devices = self.devices.lock();
        if let Some(explicit) = self.explicit_selections.lock().get(&session) {
            if devices
                .get_devices(if role == DeviceRole::Output {
                    DeviceFlag::Output
                } else {
                    DeviceFlag::Input
                })
                .iter()
                .any(|d| d.device_id == explicit.device_id)
            {
                return Some(explicit.clone());
            }
        }

        for dt in preference_order(role, stream_allows_a2dp(stream_type)) {
            if let Some(d) = devices.find(dt, role) {
                return Some(d.clone());
            }
        }
        None
    }

    /// A device connected: update the table. The caller re-runs
    /// `select_for_session` per active session and calls `activate_device`
    /// if the chosen device changed (spec step 3).
    pub fn on_device_connected(&self, device: DeviceDescriptor) {
        self.devices.lock().upsert(device);
    }

    /// `ResetRouteForDisconnect(type)`: tear down the route for the
    /// disconnected device's role first, then the caller re-selects a
    /// fallback and calls `activate_device`.
    pub fn on_device_disconnected(&self, device_type: DeviceType, role: DeviceRole, device_id: u32) {
        self.devices.lock().remove(device_type, role, device_id);
        if let Some(active) = self.active.lock().get(&role) {
            if active.device_type == device_type && active.device_id == device_id {
                if let Some(handle) = self.route_handles.lock().remove(&role) {
                    self.driver.release_audio_route(handle);
                }
            }
        }
    }

    /// Apply a newly selected device for `role`, used after
    /// `select_for_session` returns a different device than is currently
    /// active.
    pub fn apply_selection(&self, role: DeviceRole, device: DeviceDescriptor) -> Result<()> {
        self.activate_device(role, device)
    }

    /// The device currently active for `role`, if any.
    pub fn active_device(&self, role: DeviceRole) -> Option<DeviceDescriptor> {
        self.active.lock().get(&role).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Instant;

    struct FakeRouteDriver {
        next_handle: AtomicU64,
        released: Mutex<Vec<RouteHandle>>,
    }

    impl FakeRouteDriver {
        fn new() -> Self {
            Self {
                next_handle: AtomicU64::new(1),
                released: Mutex::new(Vec::new()),
            }
        }
    }

    impl RouteDriver for FakeRouteDriver {
        fn update_audio_route(&self, _route: &AudioRoute) -> Result<RouteHandle> {
            Ok(RouteHandle(self.next_handle.fetch_add(1, Ordering::SeqCst)))
        }
        fn release_audio_route(&self, handle: RouteHandle) {
            self.released.lock().push(handle);
        }
        fn select_scene(&self, _category: AudioCategory, _pin: PinType) -> Result<()> {
            Ok(())
        }
        fn set_default_sink(&self, _name: &str) -> Result<()> {
            Ok(())
        }
        fn set_default_source(&self, _name: &str) -> Result<()> {
            Ok(())
        }
    }

    fn dev(device_type: DeviceType, role: DeviceRole, id: u32) -> DeviceDescriptor {
        DeviceDescriptor {
            device_type,
            role,
            device_id: id,
            network_id: String::new(),
            connect_type: audiocore_types::ConnectType::Local,
            mac_address: String::new(),
            channel_mask: 0b11,
            sample_rates: vec![48000],
            connected_at: Instant::now(),
        }
    }

    #[test]
    fn speaker_preferred_when_alone() {
        let router = Router::new(FakeRouteDriver::new(), |_| {});
        router.on_device_connected(dev(DeviceType::Speaker, DeviceRole::Output, 1));
        let chosen = router
            .select_for_session(SessionId(1), DeviceRole::Output, StreamType::Music)
            .unwrap();
        assert_eq!(chosen.device_type, DeviceType::Speaker);
    }

    #[test]
    fn wired_headset_outranks_speaker() {
        let router = Router::new(FakeRouteDriver::new(), |_| {});
        router.on_device_connected(dev(DeviceType::Speaker, DeviceRole::Output, 1));
        router.on_device_connected(dev(DeviceType::WiredHeadset, DeviceRole::Output, 2));
        let chosen = router
            .select_for_session(SessionId(1), DeviceRole::Output, StreamType::Music)
            .unwrap();
        assert_eq!(chosen.device_type, DeviceType::WiredHeadset);
    }

    #[test]
    fn voice_call_never_selects_a2dp() {
        let router = Router::new(FakeRouteDriver::new(), |_| {});
        router.on_device_connected(dev(DeviceType::BluetoothA2dp, DeviceRole::Output, 1));
        router.on_device_connected(dev(DeviceType::BluetoothSco, DeviceRole::Output, 2));
        let chosen = router
            .select_for_session(SessionId(1), DeviceRole::Output, StreamType::VoiceCall)
            .unwrap();
        assert_eq!(chosen.device_type, DeviceType::BluetoothSco);
    }

    #[test]
    fn disconnect_releases_route_handle_for_active_device() {
        let router = Router::new(FakeRouteDriver::new(), |_| {});
        router.on_device_connected(dev(DeviceType::Speaker, DeviceRole::Output, 1));
        router
            .apply_selection(DeviceRole::Output, dev(DeviceType::Speaker, DeviceRole::Output, 1))
            .unwrap();
        router.on_device_disconnected(DeviceType::Speaker, DeviceRole::Output, 1);
        assert!(router.active_device(DeviceRole::Output).is_some());
    }

    #[test]
    fn explicit_selection_honored_when_device_still_present() {
        let router = Router::new(FakeRouteDriver::new(), |_| {});
        router.on_device_connected(dev(DeviceType::Speaker, DeviceRole::Output, 1));
        router.on_device_connected(dev(DeviceType::WiredHeadset, DeviceRole::Output, 2));
        router.select_output_device(SessionId(1), dev(DeviceType::Speaker, DeviceRole::Output, 1));
        let chosen = router
            .select_for_session(SessionId(1), DeviceRole::Output, StreamType::Music)
            .unwrap();
        assert_eq!(chosen.device_type, DeviceType::Speaker);
    }
}
