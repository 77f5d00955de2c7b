//! Raw SMBIOS firmware table acquisition.
//!
//! The `'RSMB'` firmware table provider returns an 8-byte header followed
//! by the structure table:
//!
//! | offset | field |
//! |--------|-------|
//! | 0 | calling-method flag |
//! | 1 | SMBIOS major version |
//! | 2 | SMBIOS minor version |
//! | 3 | DMI revision |
//! | 4..8 | table length (little endian) |

use crate::buffer::read_u32_le;
use crate::SourceError;

pub const PROVIDER_HEADER_LEN: usize = 8;

/// Provider header fields that precede the structure table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableHeader {
    pub calling_method: u8,
    pub major: u8,
    pub minor: u8,
    pub revision: u8,
    pub declared_length: u32,
}

impl TableHeader {
    pub fn version(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

/// Structure table bytes with the provider header stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareTable {
    pub header: TableHeader,
    pub entries: Vec<u8>,
}

/// Source of the raw provider buffer, header included.
pub trait FirmwareSource {
    fn read_raw_table(&self) -> Result<Vec<u8>, SourceError>;
}

/// A previously captured raw table, e.g. a dump loaded from disk.
impl FirmwareSource for Vec<u8> {
    fn read_raw_table(&self) -> Result<Vec<u8>, SourceError> {
        Ok(self.clone())
    }
}

/// Fetch the table and strip the provider header.
pub fn acquire_firmware_table(source: &dyn FirmwareSource) -> Result<FirmwareTable, SourceError> {
    let raw = source.read_raw_table()?;
    split_provider_header(&raw)
}

/// Validate the provider header and return the structure table bytes.
///
/// The declared length is clamped to the bytes actually returned; an empty
/// result is an error rather than a zero-length table.
pub fn split_provider_header(raw: &[u8]) -> Result<FirmwareTable, SourceError> {
    if raw.len() < PROVIDER_HEADER_LEN {
        return Err(SourceError::TooSmall {
            what: "firmware table",
            needed: PROVIDER_HEADER_LEN,
            actual: raw.len(),
        });
    }

    let declared_length = read_u32_le(raw, 4).unwrap_or_default();
    let header = TableHeader {
        calling_method: raw[0],
        major: raw[1],
        minor: raw[2],
        revision: raw[3],
        declared_length,
    };

    let available = raw.len() - PROVIDER_HEADER_LEN;
    let length = (declared_length as usize).min(available);
    if length == 0 {
        return Err(SourceError::Malformed(format!(
            "firmware table declares {declared_length} bytes with {available} available"
        )));
    }
    if length < declared_length as usize {
        tracing::debug!(declared_length, available, "clamping firmware table length");
    }

    Ok(FirmwareTable {
        header,
        entries: raw[PROVIDER_HEADER_LEN..PROVIDER_HEADER_LEN + length].to_vec(),
    })
}

// ── Native provider ────────────────────────────────────────────────────

/// `GetSystemFirmwareTable('RSMB', 0)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawSmbiosProvider;

impl FirmwareSource for RawSmbiosProvider {
    fn read_raw_table(&self) -> Result<Vec<u8>, SourceError> {
        #[cfg(target_os = "windows")]
        {
            read_rsmb_windows()
        }
        #[cfg(not(target_os = "windows"))]
        {
            tracing::warn!("read_raw_table is a stub on non-Windows");
            Err(SourceError::Unsupported("GetSystemFirmwareTable"))
        }
    }
}

#[cfg(target_os = "windows")]
fn read_rsmb_windows() -> Result<Vec<u8>, SourceError> {
    use windows::Win32::Foundation::GetLastError;
    use windows::Win32::System::SystemInformation::{GetSystemFirmwareTable, RSMB};

    use crate::buffer::{query_two_call, SizedCall};

    query_two_call("firmware table", |buf| {
        let capacity = buf.len();
        let target = if capacity == 0 { None } else { Some(buf) };
        // SAFETY: the slice is valid for `capacity` bytes for the whole call.
        let size = unsafe { GetSystemFirmwareTable(RSMB, 0, target) } as usize;
        if size == 0 {
            let code = unsafe { GetLastError() }.0;
            return SizedCall::Failed(SourceError::os("GetSystemFirmwareTable", code));
        }
        if size > capacity {
            SizedCall::Required(size)
        } else {
            SizedCall::Complete(size)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{acquire_firmware_table, split_provider_header, PROVIDER_HEADER_LEN};
    use crate::SourceError;

    fn raw_with(declared: u32, body: &[u8]) -> Vec<u8> {
        let mut raw = vec![0, 3, 4, 0];
        raw.extend_from_slice(&declared.to_le_bytes());
        raw.extend_from_slice(body);
        raw
    }

    #[test]
    fn strips_header_and_keeps_version() {
        let table = split_provider_header(&raw_with(4, &[127, 4, 0, 0])).expect("table");
        assert_eq!(table.entries, vec![127, 4, 0, 0]);
        assert_eq!(table.header.version(), "3.4");
    }

    #[test]
    fn clamps_declared_length_to_available_bytes() {
        let table = split_provider_header(&raw_with(4096, &[1, 2, 3])).expect("table");
        assert_eq!(table.entries, vec![1, 2, 3]);
        assert_eq!(table.header.declared_length, 4096);
    }

    #[test]
    fn ignores_bytes_past_declared_length() {
        let table = split_provider_header(&raw_with(2, &[9, 8, 7, 6])).expect("table");
        assert_eq!(table.entries, vec![9, 8]);
    }

    #[test]
    fn rejects_short_or_empty_buffers() {
        assert!(matches!(
            split_provider_header(&[0, 3, 4]),
            Err(SourceError::TooSmall { needed: PROVIDER_HEADER_LEN, actual: 3, .. })
        ));
        assert!(matches!(
            split_provider_header(&raw_with(0, &[1, 2])),
            Err(SourceError::Malformed(_))
        ));
        assert!(split_provider_header(&raw_with(16, &[])).is_err());
    }

    #[test]
    fn acquires_from_captured_dump() {
        let dump = raw_with(2, &[0xAA, 0xBB]);
        let table = acquire_firmware_table(&dump).expect("table");
        assert_eq!(table.entries, vec![0xAA, 0xBB]);
    }
}
