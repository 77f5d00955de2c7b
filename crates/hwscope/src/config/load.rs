use anyhow::Result;
use platform_windows::inventory::MAX_DISK_INDEX;
use platform_windows::ProbeOptions;

use super::types::HwscopeConfig;

impl HwscopeConfig {
    pub fn load() -> Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_file_config()?;
        cfg.apply_env_overrides();
        cfg.normalize();
        Ok(cfg)
    }

    fn normalize(&mut self) {
        self.max_disk_index = self.max_disk_index.clamp(1, MAX_DISK_INDEX);
        let mut seen = Vec::with_capacity(self.categories.len());
        self.categories.retain(|c| {
            let fresh = !seen.contains(c);
            seen.push(*c);
            fresh
        });
    }

    pub fn probe_options(&self) -> ProbeOptions {
        ProbeOptions {
            max_disk_index: self.max_disk_index,
            include_neighbors: self.neighbor_cache,
            uuid_order: self.uuid_byte_order,
            release_date: self.release_date_offset,
            legacy_fallback: self.legacy_fallback,
        }
    }
}
