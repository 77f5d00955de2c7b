mod config;
mod report;

use std::io::Write;

use anyhow::{Context, Result};
use platform_windows::HardwareProbe;
use tracing::{info, warn};

use config::HwscopeConfig;

fn main() -> Result<()> {
    let config = HwscopeConfig::load()?;
    init_tracing(&config.log_level);

    for name in &config.skipped_categories {
        warn!(category = %name, "ignoring unknown category");
    }
    info!(
        categories = ?config.categories,
        max_disk_index = config.max_disk_index,
        neighbor_cache = config.neighbor_cache,
        legacy_fallback = config.legacy_fallback,
        "hwscope started"
    );

    let mut probe = HardwareProbe::native(config.probe_options());
    if let Some(path) = &config.firmware_dump {
        let dump = std::fs::read(path)
            .with_context(|| format!("failed reading firmware dump {}", path.display()))?;
        info!(path = %path.display(), bytes = dump.len(), "using captured firmware table");
        probe = probe.with_firmware(dump);
    }

    let items = probe.collect(&config.categories);
    let rendered = report::render(&items, config.output_format)?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .context("failed writing records to stdout")?;
    stdout.flush().context("failed flushing stdout")?;
    Ok(())
}

fn init_tracing(level: &str) {
    let level = level.parse::<tracing::Level>().unwrap_or(tracing::Level::WARN);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}
