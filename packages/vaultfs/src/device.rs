use vaultfs_primitives::{Access, DeviceId, DeviceName, UserId};

/// The locally-enrolled device: the author stamped on every local mutation,
/// and the access under which its user manifest is stored.
#[derive(Clone, Debug)]
pub struct LocalDevice {
    pub device_id: DeviceId,
    pub user_manifest_access: Access,
}

impl LocalDevice {
    pub fn new(device_id: DeviceId, user_manifest_access: Access) -> LocalDevice {
        LocalDevice { device_id, user_manifest_access }
    }

    /// Fresh device with a brand new root access, as produced during
    /// organization bootstrap.
    pub fn generate(device_id: DeviceId) -> LocalDevice {
        LocalDevice::new(device_id, Access::generate())
    }

    pub fn user_id(&self) -> UserId {
        self.device_id.user_id()
    }

    pub fn device_name(&self) -> DeviceName {
        self.device_id.device_name()
    }
}
