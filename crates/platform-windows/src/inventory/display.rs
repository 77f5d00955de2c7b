//! Display adapters from the display device class in the registry.

use crate::registry::{device_instances, ConfigStore, StoreValue, DISPLAY_CLASS_GUID};
use crate::{indexed, Category, HardwareItem, NOT_AVAILABLE};

const MEMORY_SIZE_QWORD: &str = "HardwareInformation.qwMemorySize";
const MEMORY_SIZE: &str = "HardwareInformation.MemorySize";

/// One record group per display class instance that names a driver.
pub fn gpu_items(store: &dyn ConfigStore) -> Vec<HardwareItem> {
    let tag = Category::Gpu.tag();
    let instances = match device_instances(store, DISPLAY_CLASS_GUID) {
        Ok(instances) => instances,
        Err(err) => {
            tracing::warn!(error = %err, "display class registry unavailable");
            return vec![HardwareItem::error(tag, &err)];
        }
    };

    let mut items = Vec::new();
    let mut slot = 0usize;
    for instance in instances {
        let Some(name) = store.read_string(&instance, "DriverDesc") else {
            tracing::trace!(instance = %instance, "display instance without a driver");
            continue;
        };
        let text = |value: &str| {
            store
                .read_string(&instance, value)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };

        items.push(HardwareItem::new(tag, indexed("Name", slot), name.trim(), "Registry"));
        items.push(HardwareItem::new(tag, indexed("Provider", slot), text("ProviderName"), ""));
        items.push(HardwareItem::new(tag, indexed("DriverVersion", slot), text("DriverVersion"), ""));
        items.push(HardwareItem::new(tag, indexed("DriverDate", slot), text("DriverDate"), ""));
        let memory = adapter_memory(store, &instance)
            .map(|bytes| (bytes / (1024 * 1024)).to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        items.push(HardwareItem::new(tag, indexed("AdapterRAM", slot), memory, "MB"));
        slot += 1;
    }
    items
}

/// Dedicated memory in bytes. The QWORD value supersedes the 32-bit one,
/// which saturates at 4 GB.
fn adapter_memory(store: &dyn ConfigStore, instance: &str) -> Option<u64> {
    store
        .read_value(instance, MEMORY_SIZE_QWORD)
        .and_then(|v| v.as_u64())
        .or_else(|| {
            store
                .read_value(instance, MEMORY_SIZE)
                .as_ref()
                .and_then(StoreValue::as_u64)
        })
        .filter(|bytes| *bytes > 0)
}
