//! Read-only registry access.
//!
//! [`ConfigStore`] is the seam every registry consumer goes through:
//! [`RegistryStore`] reads `HKEY_LOCAL_MACHINE` natively and
//! [`MemoryStore`] serves fixed values.

use crate::SourceError;

pub const BIOS_KEY: &str = r"HARDWARE\DESCRIPTION\System\BIOS";
pub const CLASS_ROOT: &str = r"SYSTEM\CurrentControlSet\Control\Class";
pub const NET_CLASS_GUID: &str = "{4d36e972-e325-11ce-bfc1-08002be10318}";
pub const DISPLAY_CLASS_GUID: &str = "{4d36e968-e325-11ce-bfc1-08002be10318}";

#[cfg(any(test, target_os = "windows"))]
const REG_SZ: u32 = 1;
#[cfg(any(test, target_os = "windows"))]
const REG_EXPAND_SZ: u32 = 2;
#[cfg(any(test, target_os = "windows"))]
const REG_BINARY: u32 = 3;
#[cfg(any(test, target_os = "windows"))]
const REG_DWORD: u32 = 4;
#[cfg(any(test, target_os = "windows"))]
const REG_MULTI_SZ: u32 = 7;
#[cfg(any(test, target_os = "windows"))]
const REG_QWORD: u32 = 11;

/// A registry value decoded from its raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreValue {
    Text(String),
    Number(u64),
    Binary(Vec<u8>),
}

impl StoreValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view; 4- and 8-byte binary values are read little endian.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Binary(b) if b.len() == 4 => {
                Some(u64::from(u32::from_le_bytes([b[0], b[1], b[2], b[3]])))
            }
            Self::Binary(b) if b.len() == 8 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(b);
                Some(u64::from_le_bytes(raw))
            }
            _ => None,
        }
    }
}

impl From<&str> for StoreValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<u64> for StoreValue {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

/// Hierarchical key/value store addressed by `HKLM`-relative paths.
pub trait ConfigStore {
    fn read_value(&self, path: &str, name: &str) -> Option<StoreValue>;

    /// Names of the direct subkeys of `path`.
    fn subkeys(&self, path: &str) -> Result<Vec<String>, SourceError>;

    fn read_string(&self, path: &str, name: &str) -> Option<String> {
        self.read_value(path, name)
            .and_then(|v| v.as_text().map(ToString::to_string))
    }
}

/// Subkeys of a device class whose names start with a digit (`0000`,
/// `0001`, ...): the per-device driver instances.
pub fn device_instances(store: &dyn ConfigStore, class_guid: &str) -> Result<Vec<String>, SourceError> {
    let class_path = format!(r"{CLASS_ROOT}\{class_guid}");
    let mut instances: Vec<String> = store
        .subkeys(&class_path)?
        .into_iter()
        .filter(|name| name.starts_with(|c: char| c.is_ascii_digit()))
        .map(|name| format!(r"{class_path}\{name}"))
        .collect();
    instances.sort();
    Ok(instances)
}

/// Decode raw registry data by value type.
#[cfg(any(test, target_os = "windows"))]
pub(crate) fn decode_value(kind: u32, data: &[u8]) -> Option<StoreValue> {
    match kind {
        REG_SZ | REG_EXPAND_SZ => Some(StoreValue::Text(utf16_strings(data).into_iter().next()?)),
        REG_MULTI_SZ => Some(StoreValue::Text(utf16_strings(data).join("; "))),
        REG_DWORD => data
            .get(..4)
            .map(|b| StoreValue::Number(u64::from(u32::from_le_bytes([b[0], b[1], b[2], b[3]])))),
        REG_QWORD => data.get(..8).map(|b| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(b);
            StoreValue::Number(u64::from_le_bytes(raw))
        }),
        REG_BINARY => Some(StoreValue::Binary(data.to_vec())),
        _ => None,
    }
}

#[cfg(any(test, target_os = "windows"))]
fn utf16_strings(data: &[u8]) -> Vec<String> {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    let mut strings: Vec<String> = units
        .split(|&u| u == 0)
        .map(String::from_utf16_lossy)
        .collect();
    while strings.last().is_some_and(|s| s.is_empty()) {
        strings.pop();
    }
    if strings.is_empty() {
        strings.push(String::new());
    }
    strings
}

// ── In-memory store ────────────────────────────────────────────────────

/// Registry contents held in memory. Paths and names compare
/// case-insensitively, like the registry.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Vec<(String, String, StoreValue)>,
    keys: Vec<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, path: &str, name: &str, value: impl Into<StoreValue>) -> Self {
        self.insert(path, name, value);
        self
    }

    pub fn insert(&mut self, path: &str, name: &str, value: impl Into<StoreValue>) {
        self.add_key(path);
        self.values
            .retain(|(p, n, _)| !(p.eq_ignore_ascii_case(path) && n.eq_ignore_ascii_case(name)));
        self.values
            .push((path.to_string(), name.to_string(), value.into()));
    }

    /// Register `path` and all its ancestors as existing keys.
    pub fn add_key(&mut self, path: &str) {
        let mut prefix = String::new();
        for part in path.split('\\').filter(|p| !p.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('\\');
            }
            prefix.push_str(part);
            if !self.keys.iter().any(|k| k.eq_ignore_ascii_case(&prefix)) {
                self.keys.push(prefix.clone());
            }
        }
    }
}

impl ConfigStore for MemoryStore {
    fn read_value(&self, path: &str, name: &str) -> Option<StoreValue> {
        self.values
            .iter()
            .find(|(p, n, _)| p.eq_ignore_ascii_case(path) && n.eq_ignore_ascii_case(name))
            .map(|(_, _, v)| v.clone())
    }

    fn subkeys(&self, path: &str) -> Result<Vec<String>, SourceError> {
        if !self.keys.iter().any(|k| k.eq_ignore_ascii_case(path)) {
            return Err(SourceError::os("RegOpenKeyExW", 2));
        }
        let prefix = format!("{}\\", path.to_ascii_lowercase());
        Ok(self
            .keys
            .iter()
            .filter_map(|k| {
                let lower = k.to_ascii_lowercase();
                let rest = lower.strip_prefix(&prefix)?;
                (!rest.contains('\\')).then(|| k[prefix.len()..].to_string())
            })
            .collect())
    }
}

// ── Native registry ────────────────────────────────────────────────────

/// `HKEY_LOCAL_MACHINE`, read only.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegistryStore;

impl ConfigStore for RegistryStore {
    fn read_value(&self, path: &str, name: &str) -> Option<StoreValue> {
        #[cfg(target_os = "windows")]
        {
            native::read_value(path, name)
        }
        #[cfg(not(target_os = "windows"))]
        {
            let _ = (path, name);
            None
        }
    }

    fn subkeys(&self, path: &str) -> Result<Vec<String>, SourceError> {
        #[cfg(target_os = "windows")]
        {
            native::subkeys(path)
        }
        #[cfg(not(target_os = "windows"))]
        {
            tracing::warn!(path, "registry subkeys is a stub on non-Windows");
            Err(SourceError::Unsupported("registry"))
        }
    }
}

#[cfg(target_os = "windows")]
mod native {
    use windows::core::{PCWSTR, PWSTR};
    use windows::Win32::Foundation::{ERROR_MORE_DATA, ERROR_NO_MORE_ITEMS, ERROR_SUCCESS};
    use windows::Win32::System::Registry::{
        RegCloseKey, RegEnumKeyExW, RegOpenKeyExW, RegQueryValueExW, HKEY, HKEY_LOCAL_MACHINE,
        KEY_READ, REG_VALUE_TYPE,
    };

    use super::{decode_value, StoreValue};
    use crate::buffer::{query_two_call, SizedCall};
    use crate::SourceError;

    /// Open registry key, closed on drop.
    struct OpenKey(HKEY);

    impl OpenKey {
        fn open(path: &str) -> Result<Self, SourceError> {
            let wide = to_wide(path);
            let mut key = HKEY::default();
            // SAFETY: `wide` is NUL-terminated and outlives the call.
            let status = unsafe {
                RegOpenKeyExW(HKEY_LOCAL_MACHINE, PCWSTR(wide.as_ptr()), 0, KEY_READ, &mut key)
            };
            if status != ERROR_SUCCESS {
                return Err(SourceError::os("RegOpenKeyExW", status.0));
            }
            Ok(Self(key))
        }
    }

    impl Drop for OpenKey {
        fn drop(&mut self) {
            // SAFETY: the key was opened by `OpenKey::open` and is closed once.
            let _ = unsafe { RegCloseKey(self.0) };
        }
    }

    pub(super) fn read_value(path: &str, name: &str) -> Option<StoreValue> {
        let key = OpenKey::open(path).ok()?;
        let wide_name = to_wide(name);
        let mut kind = REG_VALUE_TYPE::default();

        let data = query_two_call("registry value", |buf| {
            let mut size = buf.len() as u32;
            let target = if buf.is_empty() {
                None
            } else {
                Some(buf.as_mut_ptr())
            };
            // SAFETY: `target` is valid for `size` bytes; the name is NUL-terminated.
            let status = unsafe {
                RegQueryValueExW(
                    key.0,
                    PCWSTR(wide_name.as_ptr()),
                    None,
                    Some(&mut kind as *mut REG_VALUE_TYPE),
                    target,
                    Some(&mut size as *mut u32),
                )
            };
            let size = size as usize;
            if status == ERROR_MORE_DATA || (status == ERROR_SUCCESS && target.is_none()) {
                if size == 0 {
                    SizedCall::Empty
                } else {
                    SizedCall::Required(size)
                }
            } else if status == ERROR_SUCCESS {
                SizedCall::Complete(size)
            } else {
                SizedCall::Failed(SourceError::os("RegQueryValueExW", status.0))
            }
        })
        .ok()?;

        if data.is_empty() {
            return None;
        }
        decode_value(kind.0, &data)
    }

    pub(super) fn subkeys(path: &str) -> Result<Vec<String>, SourceError> {
        let key = OpenKey::open(path)?;
        let mut names = Vec::new();

        for index in 0u32.. {
            let mut name = [0u16; 256];
            let mut len = name.len() as u32;
            // SAFETY: `name` holds `len` UTF-16 units.
            let status = unsafe {
                RegEnumKeyExW(
                    key.0,
                    index,
                    PWSTR(name.as_mut_ptr()),
                    &mut len,
                    None,
                    PWSTR::null(),
                    None,
                    None,
                )
            };
            if status == ERROR_NO_MORE_ITEMS {
                break;
            }
            if status != ERROR_SUCCESS {
                return Err(SourceError::os("RegEnumKeyExW", status.0));
            }
            let len = (len as usize).min(name.len());
            names.push(String::from_utf16_lossy(&name[..len]));
        }

        Ok(names)
    }

    fn to_wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }
}
