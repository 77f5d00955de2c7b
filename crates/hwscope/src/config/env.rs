use std::path::PathBuf;

use super::types::HwscopeConfig;
use super::util::{env_non_empty, parse_bool, parse_categories, parse_level, parse_output, split_csv};

impl HwscopeConfig {
    pub(super) fn apply_env_overrides(&mut self) {
        self.apply_env_probe();
        self.apply_env_output();
    }

    fn apply_env_probe(&mut self) {
        if let Some(v) = env_non_empty("HWSCOPE_CATEGORIES") {
            let (known, skipped) = parse_categories(split_csv(&v));
            self.categories = known;
            self.skipped_categories.extend(skipped);
        }
        if let Some(v) = env_non_empty("HWSCOPE_MAX_DISKS") {
            if let Ok(parsed) = v.trim().parse::<u32>() {
                self.max_disk_index = parsed;
            }
        }
        if let Some(v) = env_non_empty("HWSCOPE_NEIGHBOR_CACHE") {
            self.neighbor_cache = parse_bool(&v);
        }
        if let Some(v) = env_non_empty("HWSCOPE_LEGACY_FALLBACK") {
            self.legacy_fallback = parse_bool(&v);
        }
        if let Some(v) = env_non_empty("HWSCOPE_UUID_ORDER") {
            if let Ok(parsed) = v.parse() {
                self.uuid_byte_order = parsed;
            }
        }
        if let Some(v) = env_non_empty("HWSCOPE_RELEASE_DATE_OFFSET") {
            if let Ok(parsed) = v.parse() {
                self.release_date_offset = parsed;
            }
        }
        if let Some(v) = env_non_empty("HWSCOPE_FIRMWARE_DUMP") {
            self.firmware_dump = Some(PathBuf::from(v.trim()));
        }
    }

    fn apply_env_output(&mut self) {
        if let Some(format) = env_non_empty("HWSCOPE_OUTPUT").and_then(|v| parse_output(&v)) {
            self.output_format = format;
        }
        if let Some(v) = env_non_empty("HWSCOPE_LOG") {
            if parse_level(&v).is_some() {
                self.log_level = v.trim().to_string();
            }
        }
    }
}
