use super::*;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use platform_windows::{Category, ReleaseDateOffset, UuidByteOrder};

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Mutex::new(()));
    if lock.is_poisoned() {
        lock.clear_poison();
    }
    lock
}

fn clear_env() {
    let vars = [
        "HWSCOPE_CONFIG",
        "HWSCOPE_CATEGORIES",
        "HWSCOPE_MAX_DISKS",
        "HWSCOPE_NEIGHBOR_CACHE",
        "HWSCOPE_LEGACY_FALLBACK",
        "HWSCOPE_UUID_ORDER",
        "HWSCOPE_RELEASE_DATE_OFFSET",
        "HWSCOPE_FIRMWARE_DUMP",
        "HWSCOPE_OUTPUT",
        "HWSCOPE_LOG",
    ];
    for v in vars {
        std::env::remove_var(v);
    }
}

fn write_config(contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "hwscope-config-{}.toml",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default()
    ));
    let mut f = std::fs::File::create(&path).expect("create file");
    f.write_all(contents.as_bytes()).expect("write file");
    path
}

#[test]
fn defaults_cover_every_category() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();

    let cfg = HwscopeConfig::default();
    assert_eq!(cfg.categories, Category::ALL.to_vec());
    assert_eq!(cfg.max_disk_index, 32);
    assert!(cfg.neighbor_cache);
    assert!(!cfg.legacy_fallback);
    assert_eq!(cfg.uuid_byte_order, UuidByteOrder::Stored);
    assert_eq!(cfg.release_date_offset, ReleaseDateOffset::Compat);
    assert_eq!(cfg.output_format, OutputFormat::Table);
    assert_eq!(cfg.log_level, "warn");
}

#[test]
fn file_config_is_loaded() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();

    let path = write_config(
        "[probe]\ncategories = [\"bios\", \"disk\", \"cpu\"]\nmax_disk_index = 4\nneighbor_cache = false\nlegacy_fallback = true\nuuid_byte_order = \"smbios\"\nrelease_date_offset = \"smbios\"\nfirmware_dump = \"rsmb.bin\"\n[output]\nformat = \"json\"\n[logging]\nlevel = \"debug\"\n",
    );
    std::env::set_var("HWSCOPE_CONFIG", &path);
    let cfg = HwscopeConfig::load().expect("load config");

    assert_eq!(cfg.categories, vec![Category::Bios, Category::Disk]);
    assert_eq!(cfg.skipped_categories, vec!["cpu".to_string()]);
    assert_eq!(cfg.max_disk_index, 4);
    assert!(!cfg.neighbor_cache);
    assert!(cfg.legacy_fallback);
    assert_eq!(cfg.uuid_byte_order, UuidByteOrder::Smbios);
    assert_eq!(cfg.release_date_offset, ReleaseDateOffset::Smbios);
    assert_eq!(cfg.firmware_dump, Some(PathBuf::from("rsmb.bin")));
    assert_eq!(cfg.output_format, OutputFormat::Json);
    assert_eq!(cfg.log_level, "debug");

    let options = cfg.probe_options();
    assert_eq!(options.max_disk_index, 4);
    assert!(!options.include_neighbors);
    assert_eq!(options.release_date, ReleaseDateOffset::Smbios);

    clear_env();
    let _ = std::fs::remove_file(path);
}

#[test]
fn env_overrides_file_values() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();

    let path = write_config("[probe]\nmax_disk_index = 8\n[output]\nformat = \"json\"\n");
    std::env::set_var("HWSCOPE_CONFIG", &path);
    std::env::set_var("HWSCOPE_CATEGORIES", "network, gpu,network");
    std::env::set_var("HWSCOPE_MAX_DISKS", "16");
    std::env::set_var("HWSCOPE_NEIGHBOR_CACHE", "off");
    std::env::set_var("HWSCOPE_LEGACY_FALLBACK", "yes");
    std::env::set_var("HWSCOPE_OUTPUT", "table");
    std::env::set_var("HWSCOPE_LOG", "trace");
    std::env::set_var("HWSCOPE_RELEASE_DATE_OFFSET", "smbios");

    let cfg = HwscopeConfig::load().expect("load config");
    assert_eq!(cfg.categories, vec![Category::Network, Category::Gpu]);
    assert_eq!(cfg.max_disk_index, 16);
    assert!(!cfg.neighbor_cache);
    assert!(cfg.legacy_fallback);
    assert_eq!(cfg.output_format, OutputFormat::Table);
    assert_eq!(cfg.log_level, "trace");
    assert_eq!(cfg.release_date_offset, ReleaseDateOffset::Smbios);

    clear_env();
    let _ = std::fs::remove_file(path);
}

#[test]
fn disk_range_is_clamped() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();

    std::env::set_var("HWSCOPE_MAX_DISKS", "500");
    let cfg = HwscopeConfig::load().expect("load config");
    assert_eq!(cfg.max_disk_index, 32);

    std::env::set_var("HWSCOPE_MAX_DISKS", "0");
    let cfg = HwscopeConfig::load().expect("load config");
    assert_eq!(cfg.max_disk_index, 1);

    clear_env();
}

#[test]
fn missing_configured_file_is_an_error() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();

    std::env::set_var("HWSCOPE_CONFIG", "/nonexistent/hwscope-test.toml");
    assert!(resolve_config_path().is_err());
    assert!(HwscopeConfig::load().is_err());

    clear_env();
}

#[test]
fn invalid_file_values_are_rejected() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();

    let path = write_config("[output]\nformat = \"xml\"\n");
    std::env::set_var("HWSCOPE_CONFIG", &path);
    assert!(HwscopeConfig::load().is_err());

    clear_env();
    let _ = std::fs::remove_file(path);
}

#[test]
fn bool_and_level_parsing() {
    assert!(parse_bool("Enabled"));
    assert!(parse_bool(" 1 "));
    assert!(!parse_bool("off"));
    assert_eq!(parse_level("DEBUG"), Some(tracing::Level::DEBUG));
    assert_eq!(parse_level("loud"), None);
}
