//! SMBIOS structure table decoding.
//!
//! Each structure is a 4-byte header (type, length, handle), the rest of
//! its formatted area, then a string table of NUL-terminated strings closed
//! by an empty string (a double NUL). Decoding is best effort: it stops at
//! the end-of-table structure or at the first entry that does not fit.

pub mod diagnostics;
pub mod fields;

use crate::buffer::read_u16_le;

pub const TYPE_BIOS: u8 = 0;
pub const TYPE_SYSTEM: u8 = 1;
pub const TYPE_BASEBOARD: u8 = 2;
pub const TYPE_CHASSIS: u8 = 3;
pub const TYPE_END_OF_TABLE: u8 = 127;

const HEADER_LEN: usize = 4;

/// One decoded structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmbiosStructure {
    pub kind: u8,
    /// Formatted area length including the 4-byte header.
    pub length: u8,
    pub handle: u16,
    /// Formatted area with the header removed.
    pub data: Vec<u8>,
    /// String table; string reference `n` is `strings[n - 1]`.
    pub strings: Vec<String>,
}

impl SmbiosStructure {
    /// Resolve a 1-based string reference. Index 0 means "no string".
    pub fn string(&self, index: u8) -> Option<&str> {
        if index == 0 {
            return None;
        }
        self.strings.get(usize::from(index) - 1).map(String::as_str)
    }

    /// Resolve the string referenced by the byte at data offset `offset`.
    pub fn string_at(&self, offset: usize) -> Option<&str> {
        self.string(*self.data.get(offset)?)
    }
}

/// Why decoding stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Reached the type 127 structure.
    EndOfTable,
    /// Consumed the whole buffer without an end-of-table structure.
    Exhausted,
    /// A structure declared a length below the header size.
    Malformed { offset: usize, length: u8 },
    /// A structure or its header runs past the buffer end.
    Truncated { offset: usize },
    NoProgress { offset: usize },
}

impl StopReason {
    pub fn describe(&self) -> String {
        match self {
            Self::EndOfTable => "end-of-table structure".to_string(),
            Self::Exhausted => "buffer exhausted".to_string(),
            Self::Malformed { offset, length } => {
                format!("structure at offset {offset} declares length {length}")
            }
            Self::Truncated { offset } => format!("structure at offset {offset} is truncated"),
            Self::NoProgress { offset } => format!("no progress at offset {offset}"),
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, Self::EndOfTable | Self::Exhausted)
    }
}

/// Decoded structures plus where and why decoding stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeReport {
    pub structures: Vec<SmbiosStructure>,
    pub consumed: usize,
    pub stop: StopReason,
}

/// Decode every structure up to the first malformed or truncated entry.
pub fn decode(table: &[u8]) -> Vec<SmbiosStructure> {
    decode_report(table).structures
}

pub fn decode_report(table: &[u8]) -> DecodeReport {
    let mut structures = Vec::new();
    let mut offset = 0usize;

    let stop = loop {
        if offset >= table.len() {
            break StopReason::Exhausted;
        }
        if table.len() - offset < HEADER_LEN {
            break StopReason::Truncated { offset };
        }

        let kind = table[offset];
        let length = table[offset + 1];
        if kind == TYPE_END_OF_TABLE {
            break StopReason::EndOfTable;
        }
        if usize::from(length) < HEADER_LEN {
            break StopReason::Malformed { offset, length };
        }
        let formatted_end = offset + usize::from(length);
        if formatted_end > table.len() {
            break StopReason::Truncated { offset };
        }

        let handle = read_u16_le(table, offset + 2).unwrap_or_default();
        let data = table[offset + HEADER_LEN..formatted_end].to_vec();
        let (strings, next) = read_string_table(table, formatted_end);

        if next <= offset {
            break StopReason::NoProgress { offset };
        }

        structures.push(SmbiosStructure {
            kind,
            length,
            handle,
            data,
            strings,
        });
        offset = next;
    };

    tracing::trace!(count = structures.len(), consumed = offset, ?stop, "decoded SMBIOS table");
    DecodeReport {
        structures,
        consumed: offset.min(table.len()),
        stop,
    }
}

/// Read the string table starting at `start`. Returns the non-empty strings
/// and the offset just past the double-NUL terminator (or the buffer end if
/// the terminator is missing).
fn read_string_table(table: &[u8], start: usize) -> (Vec<String>, usize) {
    let area = &table[start.min(table.len())..];
    let terminator = area.windows(2).position(|pair| pair == [0, 0]);

    let (strings_area, next) = match terminator {
        Some(pos) => (&area[..pos], start + pos + 2),
        None => (area, table.len()),
    };

    let strings = strings_area
        .split(|&b| b == 0)
        .filter(|s| !s.is_empty())
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .collect();

    (strings, next)
}

/// Human readable name of a structure type.
pub fn type_name(kind: u8) -> &'static str {
    match kind {
        0 => "BIOS Information",
        1 => "System Information",
        2 => "Baseboard Information",
        3 => "System Enclosure",
        4 => "Processor Information",
        7 => "Cache Information",
        8 => "Port Connector Information",
        9 => "System Slots",
        11 => "OEM Strings",
        12 => "System Configuration Options",
        13 => "BIOS Language Information",
        16 => "Physical Memory Array",
        17 => "Memory Device",
        19 => "Memory Array Mapped Address",
        20 => "Memory Device Mapped Address",
        24 => "Hardware Security",
        26 => "Voltage Probe",
        27 => "Cooling Device",
        28 => "Temperature Probe",
        32 => "System Boot Information",
        39 => "System Power Supply",
        41 => "Onboard Devices Extended Information",
        43 => "TPM Device",
        127 => "End-of-Table",
        128..=255 => "OEM-specific",
        _ => "Other",
    }
}
