//! Category queries over pluggable hardware sources.
//!
//! [`HardwareProbe`] owns one instance of every source trait. Each query
//! method acquires its own data, decodes it and runs the fallbacks before
//! returning; nothing is cached between calls and no query can fail.

pub mod disk;
pub mod display;
pub mod hardware;
pub mod network;

pub use disk::{DeviceResponse, PhysicalDrives, StorageSource, MAX_DISK_INDEX};
pub use network::{AdapterRecord, IpHelper, NeighborRow, NetworkSource};

use serde::{Deserialize, Serialize};

use crate::firmware::{FirmwareSource, RawSmbiosProvider};
use crate::legacy::{CimSerials, LegacySource};
use crate::registry::{ConfigStore, RegistryStore};
use crate::smbios::fields::{ReleaseDateOffset, UuidByteOrder};
use crate::{Category, HardwareItem};

/// Knobs shared by all category queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOptions {
    /// Drives `0..max_disk_index` are probed.
    pub max_disk_index: u32,
    pub include_neighbors: bool,
    pub uuid_order: UuidByteOrder,
    pub release_date: ReleaseDateOffset,
    /// Consult the legacy management layer for unresolved serials.
    pub legacy_fallback: bool,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            max_disk_index: MAX_DISK_INDEX,
            include_neighbors: true,
            uuid_order: UuidByteOrder::Stored,
            release_date: ReleaseDateOffset::Compat,
            legacy_fallback: false,
        }
    }
}

pub struct HardwareProbe {
    firmware: Box<dyn FirmwareSource>,
    store: Box<dyn ConfigStore>,
    storage: Box<dyn StorageSource>,
    network: Box<dyn NetworkSource>,
    legacy: Option<Box<dyn LegacySource>>,
    options: ProbeOptions,
}

impl HardwareProbe {
    /// Probe backed by the native Windows sources.
    pub fn native(options: ProbeOptions) -> Self {
        let legacy = options
            .legacy_fallback
            .then(|| Box::new(CimSerials::new()) as Box<dyn LegacySource>);
        Self {
            firmware: Box::new(RawSmbiosProvider),
            store: Box::new(RegistryStore),
            storage: Box::new(PhysicalDrives),
            network: Box::new(IpHelper),
            legacy,
            options,
        }
    }

    pub fn with_firmware(mut self, firmware: impl FirmwareSource + 'static) -> Self {
        self.firmware = Box::new(firmware);
        self
    }

    pub fn with_store(mut self, store: impl ConfigStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    pub fn with_storage(mut self, storage: impl StorageSource + 'static) -> Self {
        self.storage = Box::new(storage);
        self
    }

    pub fn with_network(mut self, network: impl NetworkSource + 'static) -> Self {
        self.network = Box::new(network);
        self
    }

    pub fn with_legacy(mut self, legacy: impl LegacySource + 'static) -> Self {
        self.legacy = Some(Box::new(legacy));
        self
    }

    pub fn without_legacy(mut self) -> Self {
        self.legacy = None;
        self
    }

    pub fn options(&self) -> &ProbeOptions {
        &self.options
    }

    // ── Category queries ───────────────────────────────────────────────

    pub fn bios_info(&self) -> Vec<HardwareItem> {
        self.firmware_category(Category::Bios)
    }

    pub fn system_info(&self) -> Vec<HardwareItem> {
        self.firmware_category(Category::System)
    }

    pub fn baseboard_info(&self) -> Vec<HardwareItem> {
        self.firmware_category(Category::BaseBoard)
    }

    pub fn chassis_info(&self) -> Vec<HardwareItem> {
        self.firmware_category(Category::Chassis)
    }

    pub fn disk_info(&self) -> Vec<HardwareItem> {
        disk::disk_items(self.storage.as_ref(), self.options.max_disk_index)
    }

    pub fn network_info(&self) -> Vec<HardwareItem> {
        network::network_items(
            self.network.as_ref(),
            self.store.as_ref(),
            self.options.include_neighbors,
        )
    }

    pub fn gpu_info(&self) -> Vec<HardwareItem> {
        display::gpu_items(self.store.as_ref())
    }

    pub fn smbios_diagnostics(&self) -> Vec<HardwareItem> {
        hardware::smbios_diagnostics(self.firmware.as_ref())
    }

    pub fn query(&self, category: Category) -> Vec<HardwareItem> {
        let items = match category {
            Category::Bios => self.bios_info(),
            Category::System => self.system_info(),
            Category::BaseBoard => self.baseboard_info(),
            Category::Chassis => self.chassis_info(),
            Category::Disk => self.disk_info(),
            Category::Network => self.network_info(),
            Category::Gpu => self.gpu_info(),
            Category::Smbios => self.smbios_diagnostics(),
        };
        tracing::debug!(
            category = %category,
            count = items.len(),
            errors = items.iter().filter(|i| i.is_error()).count(),
            "category query complete"
        );
        items
    }

    /// Run `categories` in order and concatenate their records.
    pub fn collect(&self, categories: &[Category]) -> Vec<HardwareItem> {
        categories
            .iter()
            .flat_map(|category| self.query(*category))
            .collect()
    }

    fn firmware_category(&self, category: Category) -> Vec<HardwareItem> {
        hardware::firmware_items(
            category,
            self.firmware.as_ref(),
            self.store.as_ref(),
            self.legacy.as_deref(),
            &self.options,
        )
    }
}
