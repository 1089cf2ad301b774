//! Capture devices and back-camera selection.

use serde::{Deserialize, Serialize};

/// Lens assembly of a capture device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// Wide-angle and telephoto pair exposed as one virtual device.
    DualCamera,
    WideAngleCamera,
    TelephotoCamera,
}

/// Which side of the device the camera faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevicePosition {
    Back,
    Front,
    Unspecified,
}

/// A capture device advertised by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Platform-unique identifier.
    pub id: String,
    pub kind: DeviceKind,
    pub position: DevicePosition,
}

impl Device {
    pub fn new(id: impl Into<String>, kind: DeviceKind, position: DevicePosition) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
        }
    }
}

/// Snapshot of the devices the platform currently advertises.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInventory {
    devices: Vec<Device>,
}

impl DeviceInventory {
    pub fn new(devices: Vec<Device>) -> Self {
        Self { devices }
    }

    /// Inventory of a typical phone: dual and wide-angle back cameras plus
    /// a front camera.
    pub fn typical() -> Self {
        Self::new(vec![
            Device::new("back-dual", DeviceKind::DualCamera, DevicePosition::Back),
            Device::new("back-wide", DeviceKind::WideAngleCamera, DevicePosition::Back),
            Device::new("front-wide", DeviceKind::WideAngleCamera, DevicePosition::Front),
        ])
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Returns the first device of `kind` at `position`.
    pub fn find(&self, kind: DeviceKind, position: DevicePosition) -> Option<&Device> {
        self.devices
            .iter()
            .find(|d| d.kind == kind && d.position == position)
    }
}

/// Picks the camera used for document capture.
pub struct DeviceResolver;

impl DeviceResolver {
    /// Selects the best back-facing device: the dual camera when present,
    /// otherwise the wide-angle camera.
    pub fn resolve_back_device(inventory: &DeviceInventory) -> Option<Device> {
        let device = inventory
            .find(DeviceKind::DualCamera, DevicePosition::Back)
            .or_else(|| inventory.find(DeviceKind::WideAngleCamera, DevicePosition::Back))
            .cloned();

        match &device {
            Some(d) => tracing::debug!(id = %d.id, kind = ?d.kind, "Resolved back camera"),
            None => tracing::debug!(
                advertised = inventory.devices().len(),
                "No usable back camera advertised"
            ),
        }

        device
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_dual_camera() {
        let device = DeviceResolver::resolve_back_device(&DeviceInventory::typical()).unwrap();
        assert_eq!(device.kind, DeviceKind::DualCamera);
        assert_eq!(device.position, DevicePosition::Back);
    }

    #[test]
    fn test_falls_back_to_wide_angle() {
        let inventory = DeviceInventory::new(vec![
            Device::new("front-dual", DeviceKind::DualCamera, DevicePosition::Front),
            Device::new("back-tele", DeviceKind::TelephotoCamera, DevicePosition::Back),
            Device::new("back-wide", DeviceKind::WideAngleCamera, DevicePosition::Back),
        ]);

        let device = DeviceResolver::resolve_back_device(&inventory).unwrap();
        assert_eq!(device.id, "back-wide");
    }

    #[test]
    fn test_no_back_camera() {
        let inventory = DeviceInventory::new(vec![
            Device::new("front-wide", DeviceKind::WideAngleCamera, DevicePosition::Front),
            Device::new("back-tele", DeviceKind::TelephotoCamera, DevicePosition::Back),
        ]);

        assert!(DeviceResolver::resolve_back_device(&inventory).is_none());
        assert!(DeviceResolver::resolve_back_device(&DeviceInventory::default()).is_none());
    }
}
