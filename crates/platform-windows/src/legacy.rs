//! Optional legacy management query for serial numbers.
//!
//! Only consulted when the firmware table and the registry both leave a
//! `SerialNumber` unresolved, and only when enabled in configuration.

#[cfg(any(test, target_os = "windows"))]
use serde_json::Value;

use crate::Category;

/// Source of last-resort serial numbers.
pub trait LegacySource {
    fn serial_number(&self, category: Category) -> Option<String>;
}

/// Serial numbers from the CIM classes `Win32_BIOS`, `Win32_BaseBoard`
/// and `Win32_SystemEnclosure`.
#[derive(Debug, Default)]
pub struct CimSerials;

impl CimSerials {
    pub fn new() -> Self {
        Self
    }
}

/// CIM class that carries the serial for `category`, if any.
pub fn cim_class(category: Category) -> Option<&'static str> {
    match category {
        Category::System => Some("Win32_BIOS"),
        Category::BaseBoard => Some("Win32_BaseBoard"),
        Category::Chassis => Some("Win32_SystemEnclosure"),
        _ => None,
    }
}

impl LegacySource for CimSerials {
    #[cfg(target_os = "windows")]
    fn serial_number(&self, category: Category) -> Option<String> {
        let class = cim_class(category)?;
        let command = format!(
            "Get-CimInstance -ClassName {class} | Select-Object -First 1 SerialNumber | ConvertTo-Json -Compress"
        );
        let raw = run_powershell(&command)?;
        let serial = parse_serial_json(&raw);
        if serial.is_none() {
            tracing::debug!(class, "CIM query returned no serial number");
        }
        serial
    }

    #[cfg(not(target_os = "windows"))]
    fn serial_number(&self, category: Category) -> Option<String> {
        tracing::warn!(%category, "CimSerials::serial_number is a stub on non-Windows");
        None
    }
}

#[cfg(target_os = "windows")]
fn run_powershell(command: &str) -> Option<String> {
    use std::process::Command;

    let output = Command::new(crate::windows_cmd::POWERSHELL_EXE)
        .args(["-NoProfile", "-NonInteractive", "-Command", command])
        .output()
        .map_err(|err| tracing::warn!(error = %err, "failed to spawn powershell"))
        .ok()?;
    if !output.status.success() {
        tracing::debug!(status = ?output.status.code(), "powershell query failed");
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        None
    } else {
        Some(stdout)
    }
}

/// Pull `SerialNumber` out of a `ConvertTo-Json` object or array.
#[cfg(any(test, target_os = "windows"))]
fn parse_serial_json(raw: &str) -> Option<String> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = match &value {
        Value::Array(entries) => entries.first()?,
        other => other,
    };
    object
        .get("SerialNumber")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|serial| !serial.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::{cim_class, parse_serial_json};
    use crate::Category;

    #[test]
    fn parses_object_and_array_forms() {
        assert_eq!(
            parse_serial_json(r#"{"SerialNumber":" 5CG1234XYZ "}"#),
            Some("5CG1234XYZ".to_string())
        );
        assert_eq!(
            parse_serial_json(r#"[{"SerialNumber":"ABC"},{"SerialNumber":"DEF"}]"#),
            Some("ABC".to_string())
        );
    }

    #[test]
    fn blank_null_or_garbage_yields_none() {
        assert_eq!(parse_serial_json(r#"{"SerialNumber":"  "}"#), None);
        assert_eq!(parse_serial_json(r#"{"SerialNumber":null}"#), None);
        assert_eq!(parse_serial_json("not json"), None);
        assert_eq!(parse_serial_json("[]"), None);
    }

    #[test]
    fn only_serial_bearing_categories_map_to_a_class() {
        assert_eq!(cim_class(Category::System), Some("Win32_BIOS"));
        assert_eq!(cim_class(Category::Chassis), Some("Win32_SystemEnclosure"));
        assert_eq!(cim_class(Category::Disk), None);
    }
}
