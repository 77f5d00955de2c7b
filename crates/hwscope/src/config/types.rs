use std::path::PathBuf;

use platform_windows::{Category, ReleaseDateOffset, UuidByteOrder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone)]
pub struct HwscopeConfig {
    pub categories: Vec<Category>,
    /// Names from the file or environment that matched no category.
    pub skipped_categories: Vec<String>,
    pub max_disk_index: u32,
    pub neighbor_cache: bool,
    pub legacy_fallback: bool,
    pub uuid_byte_order: UuidByteOrder,
    pub release_date_offset: ReleaseDateOffset,
    /// Captured raw firmware table used instead of the live one.
    pub firmware_dump: Option<PathBuf>,
    pub output_format: OutputFormat,
    pub log_level: String,
}
