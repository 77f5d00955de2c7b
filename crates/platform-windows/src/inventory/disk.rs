//! Physical drive identity via storage control requests.
//!
//! Each `\\.\PhysicalDriveN` is opened with no data access rights, asked
//! for its storage device descriptor and its drive geometry, and closed
//! before the next index is tried.

use serde::{Deserialize, Serialize};

use crate::buffer::{read_c_string, read_i64_le, read_u32_le, read_u8};
use crate::{indexed, Category, HardwareItem, SourceError, NOT_AVAILABLE};

/// Exclusive upper bound of the drive indices probed.
pub const MAX_DISK_INDEX: u32 = 32;

/// `STORAGE_DEVICE_DESCRIPTOR` up to and including `RawPropertiesLength`.
pub const DESCRIPTOR_HEADER_LEN: usize = 36;
/// `DISK_GEOMETRY`.
pub const GEOMETRY_LEN: usize = 24;

/// Upper bound for a descriptor re-request sized from its `Size` field.
const MAX_DESCRIPTOR_LEN: usize = 64 * 1024;

const OFF_SIZE: usize = 4;
const OFF_DEVICE_TYPE: usize = 8;
const OFF_REMOVABLE: usize = 10;
const OFF_VENDOR: usize = 12;
const OFF_PRODUCT: usize = 16;
const OFF_REVISION: usize = 20;
const OFF_SERIAL: usize = 24;
const OFF_BUS_TYPE: usize = 28;

/// Raw control-request responses for one drive, each truncated to the
/// bytes the device actually returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceResponse {
    pub descriptor: Vec<u8>,
    pub geometry: Option<Vec<u8>>,
}

/// Per-index access to storage devices.
pub trait StorageSource {
    /// `Ok(None)` when no device exists at `index`.
    fn query_device(&self, index: u32) -> Result<Option<DeviceResponse>, SourceError>;
}

/// Identity strings and flags from a storage device descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub device_type: u8,
    pub removable: bool,
    pub vendor: Option<String>,
    pub product: Option<String>,
    pub revision: Option<String>,
    pub serial: Option<String>,
    pub bus_type: u32,
}

/// `DISK_GEOMETRY`, logged but never reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveGeometry {
    pub cylinders: i64,
    pub media_type: u32,
    pub tracks_per_cylinder: u32,
    pub sectors_per_track: u32,
    pub bytes_per_sector: u32,
}

pub fn decode_descriptor(buf: &[u8]) -> Result<DeviceDescriptor, SourceError> {
    if buf.len() < DESCRIPTOR_HEADER_LEN {
        return Err(SourceError::TooSmall {
            what: "storage device descriptor",
            needed: DESCRIPTOR_HEADER_LEN,
            actual: buf.len(),
        });
    }

    Ok(DeviceDescriptor {
        device_type: read_u8(buf, OFF_DEVICE_TYPE).unwrap_or_default(),
        removable: read_u8(buf, OFF_REMOVABLE).is_some_and(|b| b != 0),
        vendor: descriptor_string(buf, OFF_VENDOR),
        product: descriptor_string(buf, OFF_PRODUCT),
        revision: descriptor_string(buf, OFF_REVISION),
        serial: descriptor_string(buf, OFF_SERIAL),
        bus_type: read_u32_le(buf, OFF_BUS_TYPE).unwrap_or_default(),
    })
}

/// Full descriptor length when the device declares more than `buf` holds.
///
/// Devices with long raw properties fill the first request and report the
/// real size in `Size`; one larger request then reaches the strings past it.
pub fn descriptor_shortfall(buf: &[u8]) -> Option<usize> {
    let declared = read_u32_le(buf, OFF_SIZE)? as usize;
    (declared > buf.len() && declared <= MAX_DESCRIPTOR_LEN).then_some(declared)
}

/// String at the buffer-relative offset stored at `field`. An offset of 0,
/// or one at or past the returned bytes, means the field is absent.
fn descriptor_string(buf: &[u8], field: usize) -> Option<String> {
    let offset = read_u32_le(buf, field)? as usize;
    if offset == 0 || offset >= buf.len() {
        return None;
    }
    let value = read_c_string(buf, offset)?;
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

pub fn decode_geometry(buf: &[u8]) -> Option<DriveGeometry> {
    Some(DriveGeometry {
        cylinders: read_i64_le(buf, 0)?,
        media_type: read_u32_le(buf, 8)?,
        tracks_per_cylinder: read_u32_le(buf, 12)?,
        sectors_per_track: read_u32_le(buf, 16)?,
        bytes_per_sector: read_u32_le(buf, 20)?,
    })
}

/// `STORAGE_BUS_TYPE` name.
pub fn bus_type_name(bus: u32) -> &'static str {
    match bus {
        0x01 => "SCSI",
        0x02 => "ATAPI",
        0x03 => "ATA",
        0x04 => "1394",
        0x05 => "SSA",
        0x06 => "Fibre Channel",
        0x07 => "USB",
        0x08 => "RAID",
        0x09 => "iSCSI",
        0x0A => "SAS",
        0x0B => "SATA",
        0x0C => "SD",
        0x0D => "MMC",
        0x0E => "Virtual",
        0x0F => "File Backed Virtual",
        0x10 => "Storage Spaces",
        0x11 => "NVMe",
        0x12 => "SCM",
        0x13 => "UFS",
        _ => "Unknown",
    }
}

// ── Category query ─────────────────────────────────────────────────────

/// Probe drive indices `0..max_index` and report each drive found.
///
/// Records are indexed by drive number, so gaps in numbering survive.
pub fn disk_items(source: &dyn StorageSource, max_index: u32) -> Vec<HardwareItem> {
    let tag = Category::Disk.tag();
    let mut items = Vec::new();
    let mut found = 0usize;
    let mut last_error = None;

    for index in 0..max_index.min(MAX_DISK_INDEX) {
        let response = match source.query_device(index) {
            Ok(Some(response)) => response,
            Ok(None) => continue,
            Err(err) => {
                tracing::debug!(index, error = %err, "skipping physical drive");
                last_error = Some(err);
                continue;
            }
        };

        if let Some(geometry) = response.geometry.as_deref().and_then(decode_geometry) {
            tracing::debug!(index, ?geometry, "drive geometry");
        }

        let descriptor = match decode_descriptor(&response.descriptor) {
            Ok(descriptor) => descriptor,
            Err(err) => {
                tracing::warn!(index, error = %err, "unusable storage descriptor");
                last_error = Some(err);
                continue;
            }
        };

        found += 1;
        let slot = index as usize;
        let text = |value: &Option<String>| value.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let note = "IOCTL_STORAGE_QUERY_PROPERTY";
        items.push(HardwareItem::new(tag, indexed("Model", slot), text(&descriptor.product), note));
        items.push(HardwareItem::new(tag, indexed("SerialNumber", slot), text(&descriptor.serial), note));
        items.push(HardwareItem::new(tag, indexed("Vendor", slot), text(&descriptor.vendor), note));
        items.push(HardwareItem::new(tag, indexed("Revision", slot), text(&descriptor.revision), note));
        items.push(HardwareItem::new(
            tag,
            indexed("BusType", slot),
            bus_type_name(descriptor.bus_type),
            format!("STORAGE_BUS_TYPE {}", descriptor.bus_type),
        ));
        items.push(HardwareItem::new(
            tag,
            indexed("Removable", slot),
            if descriptor.removable { "Yes" } else { "No" },
            "",
        ));
    }

    if found == 0 {
        let err = last_error.unwrap_or(SourceError::os("CreateFileW", 2));
        return vec![HardwareItem::error(tag, &err)];
    }
    items
}

// ── Native drives ──────────────────────────────────────────────────────

/// `\\.\PhysicalDriveN` devices.
#[derive(Debug, Default, Clone, Copy)]
pub struct PhysicalDrives;

impl StorageSource for PhysicalDrives {
    fn query_device(&self, index: u32) -> Result<Option<DeviceResponse>, SourceError> {
        #[cfg(target_os = "windows")]
        {
            native::query_device(index)
        }
        #[cfg(not(target_os = "windows"))]
        {
            if index == 0 {
                tracing::warn!("query_device is a stub on non-Windows");
            }
            Err(SourceError::Unsupported("physical drive queries"))
        }
    }
}

#[cfg(target_os = "windows")]
mod native {
    use std::ffi::c_void;

    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::Storage::FileSystem::{
        CreateFileW, FILE_FLAGS_AND_ATTRIBUTES, FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING,
    };
    use windows::Win32::System::Ioctl::{IOCTL_DISK_GET_DRIVE_GEOMETRY, IOCTL_STORAGE_QUERY_PROPERTY};
    use windows::Win32::System::IO::DeviceIoControl;

    use super::{descriptor_shortfall, DeviceResponse, GEOMETRY_LEN};
    use crate::SourceError;

    const ERROR_FILE_NOT_FOUND: u32 = 2;
    const ERROR_PATH_NOT_FOUND: u32 = 3;
    const DESCRIPTOR_CAPACITY: usize = 1024;

    /// `STORAGE_PROPERTY_QUERY { StorageDeviceProperty, PropertyStandardQuery }`.
    const DEVICE_PROPERTY_QUERY: [u8; 12] = [0; 12];

    /// Device handle, closed on drop.
    struct DeviceHandle(HANDLE);

    impl Drop for DeviceHandle {
        fn drop(&mut self) {
            // SAFETY: the handle came from a successful `CreateFileW` and is closed once.
            let _ = unsafe { CloseHandle(self.0) };
        }
    }

    pub(super) fn query_device(index: u32) -> Result<Option<DeviceResponse>, SourceError> {
        let path: Vec<u16> = format!(r"\\.\PhysicalDrive{index}")
            .encode_utf16()
            .chain(std::iter::once(0))
            .collect();

        // Access 0: metadata only, no read or write rights on the medium.
        // SAFETY: `path` is NUL-terminated and outlives the call.
        let opened = unsafe {
            CreateFileW(
                PCWSTR(path.as_ptr()),
                0,
                FILE_SHARE_READ | FILE_SHARE_WRITE,
                None,
                OPEN_EXISTING,
                FILE_FLAGS_AND_ATTRIBUTES(0),
                HANDLE::default(),
            )
        };
        let handle = match opened {
            Ok(handle) if !handle.is_invalid() => DeviceHandle(handle),
            Ok(_) => return Ok(None),
            Err(err) => {
                return match SourceError::from_win32("CreateFileW", &err) {
                    SourceError::Os { code, .. }
                        if code == ERROR_FILE_NOT_FOUND || code == ERROR_PATH_NOT_FOUND =>
                    {
                        Ok(None)
                    }
                    other => Err(other),
                };
            }
        };

        let mut descriptor = control(
            &handle,
            IOCTL_STORAGE_QUERY_PROPERTY,
            &DEVICE_PROPERTY_QUERY,
            DESCRIPTOR_CAPACITY,
        )?;
        if let Some(size) = descriptor_shortfall(&descriptor) {
            tracing::debug!(index, size, returned = descriptor.len(), "re-requesting full descriptor");
            descriptor = control(&handle, IOCTL_STORAGE_QUERY_PROPERTY, &DEVICE_PROPERTY_QUERY, size)?;
        }
        let geometry = control(&handle, IOCTL_DISK_GET_DRIVE_GEOMETRY, &[], GEOMETRY_LEN)
            .map_err(|err| tracing::debug!(index, error = %err, "geometry request failed"))
            .ok();

        Ok(Some(DeviceResponse {
            descriptor,
            geometry,
        }))
    }

    fn control(
        handle: &DeviceHandle,
        code: u32,
        input: &[u8],
        capacity: usize,
    ) -> Result<Vec<u8>, SourceError> {
        let mut output = vec![0u8; capacity];
        let mut returned = 0u32;
        let input_ptr = (!input.is_empty()).then(|| input.as_ptr() as *const c_void);

        // SAFETY: both buffers are valid for the sizes passed and outlive the call.
        unsafe {
            DeviceIoControl(
                handle.0,
                code,
                input_ptr,
                input.len() as u32,
                Some(output.as_mut_ptr() as *mut c_void),
                output.len() as u32,
                Some(&mut returned),
                None,
            )
        }
        .map_err(|err| SourceError::from_win32("DeviceIoControl", &err))?;

        output.truncate((returned as usize).min(capacity));
        Ok(output)
    }
}


#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    use super::test_support::descriptor;
    use super::*;

    struct FakeDrives {
        devices: BTreeMap<u32, Result<DeviceResponse, SourceError>>,
        asked: RefCell<Vec<u32>>,
    }

    impl StorageSource for FakeDrives {
        fn query_device(&self, index: u32) -> Result<Option<DeviceResponse>, SourceError> {
            self.asked.borrow_mut().push(index);
            match self.devices.get(&index) {
                Some(Ok(response)) => Ok(Some(response.clone())),
                Some(Err(err)) => Err(err.clone()),
                None => Ok(None),
            }
        }
    }

    fn drives(devices: Vec<(u32, Result<DeviceResponse, SourceError>)>) -> FakeDrives {
        FakeDrives {
            devices: devices.into_iter().collect(),
            asked: RefCell::new(Vec::new()),
        }
    }

    fn response(descriptor: Vec<u8>) -> DeviceResponse {
        DeviceResponse {
            descriptor,
            geometry: None,
        }
    }

    #[test]
    fn descriptor_strings_are_trimmed() {
        let buf = descriptor(None, Some("  Samsung SSD 980  "), Some("1B4Q"), Some(" S64ANS0T "), 0x11, false);
        let decoded = decode_descriptor(&buf).expect("descriptor");

        assert_eq!(decoded.product.as_deref(), Some("Samsung SSD 980"));
        assert_eq!(decoded.serial.as_deref(), Some("S64ANS0T"));
        assert_eq!(decoded.vendor, None);
        assert_eq!(bus_type_name(decoded.bus_type), "NVMe");
    }

    #[test]
    fn declared_size_beyond_returned_bytes_asks_for_more() {
        let mut buf = descriptor(Some("JMicron"), Some("Bridge"), None, None, 0x07, true);
        assert_eq!(descriptor_shortfall(&buf), None);

        let returned = buf.len();
        buf[4..8].copy_from_slice(&4200u32.to_le_bytes());
        assert_eq!(descriptor_shortfall(&buf), Some(4200));
        assert_eq!(descriptor_shortfall(&buf[..returned - 3]), Some(4200));

        buf[4..8].copy_from_slice(&u32::MAX.to_le_bytes());
        assert_eq!(descriptor_shortfall(&buf), None);
        assert_eq!(descriptor_shortfall(&buf[..3]), None);
    }

    #[test]
    fn offset_past_returned_bytes_is_absent() {
        let mut buf = descriptor(None, Some("Model"), None, None, 0x0B, false);
        buf[24..28].copy_from_slice(&4096u32.to_le_bytes());
        let decoded = decode_descriptor(&buf).expect("descriptor");
        assert_eq!(decoded.serial, None);
        assert_eq!(decoded.product.as_deref(), Some("Model"));
    }

    #[test]
    fn short_descriptor_is_rejected() {
        let err = decode_descriptor(&[0u8; 20]).expect_err("too small");
        assert!(matches!(err, SourceError::TooSmall { actual: 20, .. }));
    }

    #[test]
    fn geometry_decodes_all_fields() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&121_601i64.to_le_bytes());
        buf.extend_from_slice(&12u32.to_le_bytes());
        buf.extend_from_slice(&255u32.to_le_bytes());
        buf.extend_from_slice(&63u32.to_le_bytes());
        buf.extend_from_slice(&512u32.to_le_bytes());

        let geometry = decode_geometry(&buf).expect("geometry");
        assert_eq!(geometry.cylinders, 121_601);
        assert_eq!(geometry.bytes_per_sector, 512);
        assert_eq!(decode_geometry(&buf[..20]), None);
    }

    #[test]
    fn reports_each_drive_under_its_index() {
        let source = drives(vec![
            (0, Ok(response(descriptor(None, Some("WDC WD10"), None, Some("WD-1"), 0x0B, false)))),
            (2, Ok(response(descriptor(Some("Kingston"), Some("DataTraveler"), None, None, 0x07, true)))),
        ]);

        let items = disk_items(&source, 4);
        let get = |name: &str| items.iter().find(|i| i.name == name).expect(name);

        assert_eq!(get("Model_0").value, "WDC WD10");
        assert_eq!(get("SerialNumber_0").value, "WD-1");
        assert_eq!(get("BusType_0").value, "SATA");
        assert_eq!(get("Model_2").value, "DataTraveler");
        assert_eq!(get("SerialNumber_2").value, NOT_AVAILABLE);
        assert_eq!(get("Removable_2").value, "Yes");
        assert!(items.iter().all(|i| !i.name.ends_with("_1")));
        assert_eq!(*source.asked.borrow(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn failing_drive_does_not_stop_enumeration() {
        let source = drives(vec![
            (0, Err(SourceError::os("DeviceIoControl", 1))),
            (1, Ok(response(descriptor(None, Some("Disk"), None, Some("SN"), 0x03, false)))),
        ]);
        let items = disk_items(&source, 2);
        assert!(items.iter().all(|i| !i.is_error()));
        assert!(items.iter().any(|i| i.name == "Model_1"));
    }

    #[test]
    fn no_drives_yields_single_error_record() {
        let source = drives(vec![(3, Err(SourceError::os("CreateFileW", 5)))]);
        let items = disk_items(&source, MAX_DISK_INDEX);

        assert_eq!(items.len(), 1);
        assert!(items[0].is_error());
        assert!(items[0].notes.contains("administrator"));
    }

    #[test]
    fn index_range_is_capped() {
        let source = drives(Vec::new());
        let _ = disk_items(&source, 1000);
        assert_eq!(source.asked.borrow().len(), MAX_DISK_INDEX as usize);
    }
}
