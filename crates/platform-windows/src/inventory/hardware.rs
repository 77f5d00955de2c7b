//! Firmware-backed categories: BIOS, System, BaseBoard, Chassis and the
//! SMBIOS decode diagnostics.

use super::ProbeOptions;
use crate::error::SourceError;
use crate::fallback::{merge_fallback, merge_legacy, STORE_FIELDS};
use crate::firmware::{acquire_firmware_table, FirmwareSource};
use crate::legacy::LegacySource;
use crate::registry::ConfigStore;
use crate::smbios::diagnostics::diagnostic_items;
use crate::smbios::decode_report;
use crate::smbios::fields::{baseboard_items, bios_items, chassis_items, system_items};
use crate::{Category, HardwareItem};

/// Categories whose serial number the legacy source can supply.
const LEGACY_SERIAL_CATEGORIES: [Category; 3] =
    [Category::System, Category::BaseBoard, Category::Chassis];

/// Decode one firmware category, then fill gaps from the registry and,
/// when given, the legacy source.
///
/// An unreadable table yields a single error record, and so does a table
/// whose decode stopped at a malformed or truncated structure. The
/// fallbacks still run and append whatever they can supply.
pub fn firmware_items(
    category: Category,
    firmware: &dyn FirmwareSource,
    store: &dyn ConfigStore,
    legacy: Option<&dyn LegacySource>,
    options: &ProbeOptions,
) -> Vec<HardwareItem> {
    let mut items = match acquire_firmware_table(firmware) {
        Ok(table) => {
            let report = decode_report(&table.entries);
            let structures = &report.structures;
            let mut items = match category {
                Category::Bios => bios_items(structures, options.release_date),
                Category::System => system_items(structures, options.uuid_order),
                Category::BaseBoard => baseboard_items(structures),
                Category::Chassis => chassis_items(structures),
                other => {
                    tracing::debug!(category = %other, "not a firmware category");
                    Vec::new()
                }
            };
            if !report.stop.is_clean() {
                tracing::warn!(
                    category = %category,
                    stop = ?report.stop,
                    "SMBIOS table decode stopped early"
                );
                let err = SourceError::Malformed(report.stop.describe());
                items.push(HardwareItem::error(category.tag(), &err));
            }
            items
        }
        Err(err) => {
            tracing::warn!(category = %category, error = %err, "firmware table unavailable");
            vec![HardwareItem::error(category.tag(), &err)]
        }
    };

    if STORE_FIELDS.iter().any(|field| field.category == category) {
        items = merge_fallback(items, category, store);
    }
    if let Some(legacy) = legacy {
        if LEGACY_SERIAL_CATEGORIES.contains(&category) {
            items = merge_legacy(items, category, legacy);
        }
    }
    items
}

/// `SMBIOS` category: what the structure decoder found.
pub fn smbios_diagnostics(firmware: &dyn FirmwareSource) -> Vec<HardwareItem> {
    match acquire_firmware_table(firmware) {
        Ok(table) => diagnostic_items(&table.header, &decode_report(&table.entries)),
        Err(err) => vec![HardwareItem::error(Category::Smbios.tag(), &err)],
    }
}
