use platform_windows::inventory::MAX_DISK_INDEX;
use platform_windows::{Category, ReleaseDateOffset, UuidByteOrder};

use super::constants::DEFAULT_LOG_LEVEL;
use super::types::{HwscopeConfig, OutputFormat};

impl Default for HwscopeConfig {
    fn default() -> Self {
        Self {
            categories: Category::ALL.to_vec(),
            skipped_categories: Vec::new(),
            max_disk_index: MAX_DISK_INDEX,
            neighbor_cache: true,
            legacy_fallback: false,
            uuid_byte_order: UuidByteOrder::Stored,
            release_date_offset: ReleaseDateOffset::Compat,
            firmware_dump: None,
            output_format: OutputFormat::Table,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}
