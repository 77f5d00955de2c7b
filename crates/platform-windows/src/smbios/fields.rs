//! Typed field extraction for BIOS, System, BaseBoard and Chassis structures.
//!
//! Offsets are relative to the formatted area with the 4-byte header
//! removed. A string field whose offset is past the formatted area, or
//! whose reference is 0 or past the string table, resolves to `N/A`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{SmbiosStructure, TYPE_BASEBOARD, TYPE_BIOS, TYPE_CHASSIS, TYPE_SYSTEM};
use crate::buffer::{read_u16_le, read_u8};
use crate::{Category, HardwareItem, NOT_AVAILABLE};

const SOURCE_NOTE: &str = "SMBIOS";
const UUID_OFFSET: usize = 4;
const UUID_LEN: usize = 16;

/// Byte order used when rendering the 16-byte system identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UuidByteOrder {
    /// Bytes in the order stored in the table.
    #[default]
    Stored,
    /// First three groups byte-reversed, as SMBIOS 2.6+ encodes them.
    Smbios,
}

impl FromStr for UuidByteOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stored" | "raw" => Ok(Self::Stored),
            "smbios" | "rfc4122" | "guid" => Ok(Self::Smbios),
            other => Err(format!("unknown uuid byte order: {other}")),
        }
    }
}

/// Where the BIOS `ReleaseDate` string reference is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseDateOffset {
    /// Data offset 2, the position existing consumers of this output read.
    #[default]
    Compat,
    /// Data offset 4 (structure offset 08h), as the SMBIOS layout defines.
    Smbios,
}

impl ReleaseDateOffset {
    pub fn data_offset(self) -> usize {
        match self {
            Self::Compat => 2,
            Self::Smbios => 4,
        }
    }
}

impl FromStr for ReleaseDateOffset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compat" | "2" => Ok(Self::Compat),
            "smbios" | "4" => Ok(Self::Smbios),
            other => Err(format!("unknown release date offset: {other}")),
        }
    }
}

/// A structure whose formatted area cannot hold any field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    EmptyFormattedArea { kind: u8, handle: u16 },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFormattedArea { kind, handle } => write!(
                f,
                "type {kind} structure (handle {handle:#06X}) has an empty formatted area"
            ),
        }
    }
}

impl std::error::Error for DecodeError {}

// ── Extractors ─────────────────────────────────────────────────────────

pub fn bios_items(structures: &[SmbiosStructure], date: ReleaseDateOffset) -> Vec<HardwareItem> {
    extract_each(Category::Bios, TYPE_BIOS, structures, |s, out| {
        out.string(s, "Vendor", 0);
        out.string(s, "Version", 1);
        out.string(s, "ReleaseDate", date.data_offset());
        out.value("RomSize", rom_size(s), "");
        out.value("SystemBiosRelease", bios_release(s), "");
    })
}

pub fn system_items(structures: &[SmbiosStructure], order: UuidByteOrder) -> Vec<HardwareItem> {
    extract_each(Category::System, TYPE_SYSTEM, structures, |s, out| {
        out.string(s, "Manufacturer", 0);
        out.string(s, "ProductName", 1);
        out.string(s, "Version", 2);
        out.string(s, "SerialNumber", 3);
        let (uuid, note) = system_uuid(s, order);
        out.value("UUID", uuid, note);
        out.string(s, "SKU", 21);
        out.string(s, "Family", 22);
    })
}

pub fn baseboard_items(structures: &[SmbiosStructure]) -> Vec<HardwareItem> {
    extract_each(Category::BaseBoard, TYPE_BASEBOARD, structures, |s, out| {
        out.string(s, "Manufacturer", 0);
        out.string(s, "Product", 1);
        out.string(s, "Version", 2);
        out.string(s, "SerialNumber", 3);
        out.string(s, "AssetTag", 4);
    })
}

pub fn chassis_items(structures: &[SmbiosStructure]) -> Vec<HardwareItem> {
    extract_each(Category::Chassis, TYPE_CHASSIS, structures, |s, out| {
        out.string(s, "Manufacturer", 0);
        match read_u8(&s.data, 1) {
            Some(raw) => {
                let mut note = chassis_type_name(raw & 0x7F).to_string();
                if raw & 0x80 != 0 {
                    note.push_str(", lock present");
                }
                out.value("Type", raw.to_string(), note);
            }
            None => out.value("Type", NOT_AVAILABLE.to_string(), ""),
        }
        out.string(s, "Version", 2);
        out.string(s, "SerialNumber", 3);
        out.string(s, "AssetTag", 4);
    })
}

/// Collects the records of one structure instance.
struct FieldWriter<'a> {
    category: &'static str,
    suffix: String,
    items: &'a mut Vec<HardwareItem>,
}

impl FieldWriter<'_> {
    fn string(&mut self, structure: &SmbiosStructure, name: &str, offset: usize) {
        let value = structure
            .string_at(offset)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(NOT_AVAILABLE)
            .to_string();
        self.value(name, value, "");
    }

    fn value(&mut self, name: &str, value: String, note: impl Into<String>) {
        let note = note.into();
        let notes = if note.is_empty() {
            SOURCE_NOTE.to_string()
        } else {
            format!("{SOURCE_NOTE}: {note}")
        };
        self.items.push(HardwareItem::new(
            self.category,
            format!("{name}{}", self.suffix),
            value,
            notes,
        ));
    }
}

fn extract_each<F>(
    category: Category,
    kind: u8,
    structures: &[SmbiosStructure],
    mut fields: F,
) -> Vec<HardwareItem>
where
    F: FnMut(&SmbiosStructure, &mut FieldWriter<'_>),
{
    let mut items = Vec::new();
    for (instance, structure) in structures.iter().filter(|s| s.kind == kind).enumerate() {
        let suffix = if instance == 0 {
            String::new()
        } else {
            format!("_{instance}")
        };

        if let Err(err) = validate(structure) {
            tracing::debug!(error = %err, "skipping SMBIOS structure");
            items.push(HardwareItem::new(
                category.tag(),
                format!("DecodeError{suffix}"),
                err.to_string(),
                "Structure skipped",
            ));
            continue;
        }

        let mut out = FieldWriter {
            category: category.tag(),
            suffix,
            items: &mut items,
        };
        fields(structure, &mut out);
    }
    items
}

fn validate(structure: &SmbiosStructure) -> Result<(), DecodeError> {
    if structure.data.is_empty() {
        return Err(DecodeError::EmptyFormattedArea {
            kind: structure.kind,
            handle: structure.handle,
        });
    }
    Ok(())
}

// ── Field helpers ──────────────────────────────────────────────────────

fn rom_size(s: &SmbiosStructure) -> String {
    match read_u8(&s.data, 5) {
        Some(0xFF) => match read_u16_le(&s.data, 20) {
            Some(ext) => {
                let size = ext & 0x3FFF;
                match ext >> 14 {
                    0 => format!("{size} MB"),
                    1 => format!("{size} GB"),
                    _ => NOT_AVAILABLE.to_string(),
                }
            }
            None => NOT_AVAILABLE.to_string(),
        },
        Some(raw) => format!("{} KB", 64 * (u32::from(raw) + 1)),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn bios_release(s: &SmbiosStructure) -> String {
    match (read_u8(&s.data, 16), read_u8(&s.data, 17)) {
        (Some(major), Some(minor)) if major != 0xFF && minor != 0xFF => {
            format!("{major}.{minor}")
        }
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn system_uuid(s: &SmbiosStructure, order: UuidByteOrder) -> (String, &'static str) {
    let Some(raw) = s.data.get(UUID_OFFSET..UUID_OFFSET + UUID_LEN) else {
        return (NOT_AVAILABLE.to_string(), "");
    };
    let mut bytes = [0u8; UUID_LEN];
    bytes.copy_from_slice(raw);

    let note = if bytes.iter().all(|&b| b == 0x00) {
        "not present"
    } else if bytes.iter().all(|&b| b == 0xFF) {
        "not set (settable)"
    } else {
        ""
    };
    (format_uuid(&bytes, order), note)
}

/// Render a 16-byte identifier as 4-2-2-2-6 hyphenated uppercase hex.
///
/// `Stored` keeps the table byte order, so
/// `00 11 .. FF` renders as `00112233-4455-6677-8899-AABBCCDDEEFF`.
pub fn format_uuid(bytes: &[u8; 16], order: UuidByteOrder) -> String {
    let mut ordered = *bytes;
    if order == UuidByteOrder::Smbios {
        ordered[0..4].reverse();
        ordered[4..6].reverse();
        ordered[6..8].reverse();
    }

    let hex = |range: std::ops::Range<usize>| -> String {
        ordered[range].iter().map(|b| format!("{b:02X}")).collect()
    };
    format!(
        "{}-{}-{}-{}-{}",
        hex(0..4),
        hex(4..6),
        hex(6..8),
        hex(8..10),
        hex(10..16)
    )
}

pub fn chassis_type_name(kind: u8) -> &'static str {
    match kind {
        0x01 => "Other",
        0x02 => "Unknown",
        0x03 => "Desktop",
        0x04 => "Low Profile Desktop",
        0x05 => "Pizza Box",
        0x06 => "Mini Tower",
        0x07 => "Tower",
        0x08 => "Portable",
        0x09 => "Laptop",
        0x0A => "Notebook",
        0x0B => "Hand Held",
        0x0C => "Docking Station",
        0x0D => "All in One",
        0x0E => "Sub Notebook",
        0x0F => "Space-saving",
        0x10 => "Lunch Box",
        0x11 => "Main Server Chassis",
        0x12 => "Expansion Chassis",
        0x13 => "SubChassis",
        0x14 => "Bus Expansion Chassis",
        0x15 => "Peripheral Chassis",
        0x16 => "RAID Chassis",
        0x17 => "Rack Mount Chassis",
        0x18 => "Sealed-case PC",
        0x19 => "Multi-system Chassis",
        0x1A => "Compact PCI",
        0x1B => "Advanced TCA",
        0x1C => "Blade",
        0x1D => "Blade Enclosure",
        0x1E => "Tablet",
        0x1F => "Convertible",
        0x20 => "Detachable",
        0x21 => "IoT Gateway",
        0x22 => "Embedded PC",
        0x23 => "Mini PC",
        0x24 => "Stick PC",
        _ => "Unrecognized",
    }
}
