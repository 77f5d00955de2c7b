use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::paths::resolve_config_path;
use super::types::HwscopeConfig;
use super::util::{non_empty, parse_categories, parse_level, parse_output};

impl HwscopeConfig {
    pub(super) fn apply_file_config(&mut self) -> Result<bool> {
        let path = resolve_config_path()?;
        let Some(path) = path else {
            return Ok(false);
        };

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed reading config file {}", path.display()))?;
        let file_cfg: FileConfig = toml::from_str(&raw)
            .with_context(|| format!("failed parsing TOML config {}", path.display()))?;

        self.apply_file_probe(file_cfg.probe)?;
        self.apply_file_output(file_cfg.output)?;
        self.apply_file_logging(file_cfg.logging)?;

        Ok(true)
    }

    fn apply_file_probe(&mut self, probe: Option<FileProbeConfig>) -> Result<()> {
        let Some(probe) = probe else {
            return Ok(());
        };

        if let Some(names) = probe.categories {
            let (known, skipped) = parse_categories(&names);
            self.categories = known;
            self.skipped_categories.extend(skipped);
        }
        if let Some(v) = probe.max_disk_index {
            self.max_disk_index = v;
        }
        if let Some(v) = probe.neighbor_cache {
            self.neighbor_cache = v;
        }
        if let Some(v) = probe.legacy_fallback {
            self.legacy_fallback = v;
        }
        if let Some(v) = non_empty(probe.uuid_byte_order) {
            self.uuid_byte_order = v.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(v) = non_empty(probe.release_date_offset) {
            self.release_date_offset = v.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(v) = non_empty(probe.firmware_dump) {
            self.firmware_dump = Some(PathBuf::from(v.trim()));
        }
        Ok(())
    }

    fn apply_file_output(&mut self, output: Option<FileOutputConfig>) -> Result<()> {
        let Some(output) = output else {
            return Ok(());
        };
        if let Some(v) = non_empty(output.format) {
            self.output_format = parse_output(&v)
                .with_context(|| format!("unknown output format in config: {v}"))?;
        }
        Ok(())
    }

    fn apply_file_logging(&mut self, logging: Option<FileLoggingConfig>) -> Result<()> {
        let Some(logging) = logging else {
            return Ok(());
        };
        if let Some(v) = non_empty(logging.level) {
            if parse_level(&v).is_none() {
                anyhow::bail!("unknown log level in config: {v}");
            }
            self.log_level = v.trim().to_string();
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    probe: Option<FileProbeConfig>,
    #[serde(default)]
    output: Option<FileOutputConfig>,
    #[serde(default)]
    logging: Option<FileLoggingConfig>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct FileProbeConfig {
    #[serde(default)]
    categories: Option<Vec<String>>,
    #[serde(default)]
    max_disk_index: Option<u32>,
    #[serde(default)]
    neighbor_cache: Option<bool>,
    #[serde(default)]
    legacy_fallback: Option<bool>,
    #[serde(default)]
    uuid_byte_order: Option<String>,
    #[serde(default)]
    release_date_offset: Option<String>,
    #[serde(default)]
    firmware_dump: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct FileOutputConfig {
    #[serde(default)]
    format: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct FileLoggingConfig {
    #[serde(default)]
    level: Option<String>,
}
