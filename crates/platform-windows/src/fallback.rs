//! Gap filling from lower-priority sources.
//!
//! Priority is firmware table, then registry, then the optional legacy
//! source. A lower-priority value only lands where the record is missing or
//! holds a placeholder; a real value is never replaced.

use crate::legacy::LegacySource;
use crate::registry::{ConfigStore, BIOS_KEY};
use crate::{Category, HardwareItem};

/// Vendor boilerplate that means "not filled in".
const PLACEHOLDERS: &[&str] = &[
    "N/A",
    "To be filled by O.E.M.",
    "Default string",
    "System Product Name",
    "System manufacturer",
    "System Version",
    "System Serial Number",
    "Not Applicable",
    "Not Specified",
    "O.E.M.",
    "00000000",
    "Base Board Serial Number",
    "Chassis Serial Number",
];

/// Whether `value` is empty, whitespace or known boilerplate.
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || PLACEHOLDERS.iter().any(|p| value.eq_ignore_ascii_case(p))
}

/// Merge `incoming` into `existing`.
///
/// For each incoming record: append it when `existing` has no record with
/// the same category and name; overwrite value and notes when the existing
/// value is a placeholder; otherwise keep the existing record. Incoming
/// records with blank values are dropped. Order of `existing` is preserved
/// and new records are appended in incoming order.
pub fn merge<F>(
    mut existing: Vec<HardwareItem>,
    incoming: Vec<HardwareItem>,
    is_placeholder: F,
) -> Vec<HardwareItem>
where
    F: Fn(&str) -> bool,
{
    for candidate in incoming {
        if candidate.value.trim().is_empty() {
            continue;
        }
        match existing
            .iter_mut()
            .find(|item| item.matches(&candidate.category, &candidate.name))
        {
            Some(current) if is_placeholder(&current.value) => {
                tracing::debug!(
                    category = %current.category,
                    name = %current.name,
                    from = %current.value,
                    to = %candidate.value,
                    "filling placeholder"
                );
                current.value = candidate.value;
                if !candidate.notes.is_empty() {
                    current.notes = candidate.notes;
                }
            }
            Some(_) => {}
            None => existing.push(candidate),
        }
    }
    existing
}

// ── Registry fallback ──────────────────────────────────────────────────

/// One field the registry mirrors.
#[derive(Debug, Clone, Copy)]
pub struct StoreField {
    pub category: Category,
    pub name: &'static str,
    pub path: &'static str,
    pub value_name: &'static str,
}

const fn bios_field(category: Category, name: &'static str, value_name: &'static str) -> StoreField {
    StoreField {
        category,
        name,
        path: BIOS_KEY,
        value_name,
    }
}

pub const STORE_FIELDS: &[StoreField] = &[
    bios_field(Category::Bios, "Vendor", "BIOSVendor"),
    bios_field(Category::Bios, "Version", "BIOSVersion"),
    bios_field(Category::Bios, "ReleaseDate", "BIOSReleaseDate"),
    bios_field(Category::System, "Manufacturer", "SystemManufacturer"),
    bios_field(Category::System, "ProductName", "SystemProductName"),
    bios_field(Category::System, "Version", "SystemVersion"),
    bios_field(Category::System, "SKU", "SystemSKU"),
    bios_field(Category::System, "Family", "SystemFamily"),
    bios_field(Category::BaseBoard, "Manufacturer", "BaseBoardManufacturer"),
    bios_field(Category::BaseBoard, "Product", "BaseBoardProduct"),
    bios_field(Category::BaseBoard, "Version", "BaseBoardVersion"),
];

/// Fill `category` records from the registry mirror of the firmware fields.
pub fn merge_fallback(
    items: Vec<HardwareItem>,
    category: Category,
    store: &dyn ConfigStore,
) -> Vec<HardwareItem> {
    let incoming = STORE_FIELDS
        .iter()
        .filter(|field| field.category == category)
        .filter_map(|field| {
            let value = store.read_string(field.path, field.value_name)?;
            Some(HardwareItem::new(
                category.tag(),
                field.name,
                value.trim(),
                format!(r"Registry: HKLM\{}\{}", field.path, field.value_name),
            ))
        })
        .collect();
    merge(items, incoming, is_placeholder)
}

/// Fill a still-unresolved `SerialNumber` from the legacy source.
pub fn merge_legacy(
    items: Vec<HardwareItem>,
    category: Category,
    legacy: &dyn LegacySource,
) -> Vec<HardwareItem> {
    let resolved = items
        .iter()
        .find(|item| item.matches(category.tag(), "SerialNumber"))
        .is_some_and(|item| !is_placeholder(&item.value));
    if resolved {
        return items;
    }

    let incoming = legacy
        .serial_number(category)
        .map(|serial| HardwareItem::new(category.tag(), "SerialNumber", serial.trim(), "CIM"))
        .into_iter()
        .collect();
    merge(items, incoming, is_placeholder)
}
