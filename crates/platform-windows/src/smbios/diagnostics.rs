//! Records describing what the structure decoder actually found.

use std::collections::BTreeMap;

use super::{type_name, DecodeReport};
use crate::firmware::TableHeader;
use crate::{Category, HardwareItem};

/// Summarise one decode pass as `SMBIOS` category records.
pub fn diagnostic_items(header: &TableHeader, report: &DecodeReport) -> Vec<HardwareItem> {
    let tag = Category::Smbios.tag();
    let mut items = vec![
        HardwareItem::new(
            tag,
            "Version",
            header.version(),
            format!(
                "DMI revision {}, calling method {}",
                header.revision, header.calling_method
            ),
        ),
        HardwareItem::new(
            tag,
            "TableLength",
            header.declared_length.to_string(),
            format!("{} bytes decoded", report.consumed),
        ),
        HardwareItem::new(
            tag,
            "StructureCount",
            report.structures.len().to_string(),
            "",
        ),
        HardwareItem::new(
            tag,
            "StopReason",
            report.stop.describe(),
            if report.stop.is_clean() {
                ""
            } else {
                "Later structures were not decoded"
            },
        ),
    ];

    let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
    for structure in &report.structures {
        *counts.entry(structure.kind).or_default() += 1;
    }
    for (kind, count) in counts {
        items.push(HardwareItem::new(
            tag,
            format!("Type{kind}"),
            count.to_string(),
            type_name(kind),
        ));
    }

    items
}
