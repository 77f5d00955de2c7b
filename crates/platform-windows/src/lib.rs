//! Platform-windows crate: hardware identification from native sources.
//!
//! Reads the raw SMBIOS firmware table, storage device descriptors, the
//! kernel adapter list, the neighbor cache and the registry directly, then
//! merges them into one flat list of [`HardwareItem`] records per category.
//! Every category query is synchronous, self-contained and infallible: a
//! failing source becomes a diagnostic record instead of an error.

pub mod buffer;
pub mod error;
pub mod fallback;
pub mod firmware;
pub mod inventory;
pub mod legacy;
pub mod registry;
pub mod smbios;
mod windows_cmd;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use error::SourceError;
pub use inventory::{HardwareProbe, ProbeOptions};
pub use smbios::fields::{ReleaseDateOffset, UuidByteOrder};

/// Sentinel value for a field the source does not provide.
pub const NOT_AVAILABLE: &str = "N/A";

// ── Output record ──────────────────────────────────────────────────────

/// One decoded hardware fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareItem {
    pub category: String,
    pub name: String,
    pub value: String,
    pub notes: String,
}

impl HardwareItem {
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            value: value.into(),
            notes: notes.into(),
        }
    }

    /// Diagnostic record for a source that could not be read.
    pub fn error(category: impl Into<String>, err: &SourceError) -> Self {
        Self::new(category, "Error", err.to_string(), err.remediation())
    }

    pub fn is_error(&self) -> bool {
        self.name == "Error"
    }

    /// Whether this record describes `(category, name)`.
    pub fn matches(&self, category: &str, name: &str) -> bool {
        self.category == category && self.name == name
    }
}

// ── Categories ─────────────────────────────────────────────────────────

/// Independently callable category queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Bios,
    System,
    BaseBoard,
    Chassis,
    Disk,
    Network,
    Gpu,
    Smbios,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Bios,
        Category::System,
        Category::BaseBoard,
        Category::Chassis,
        Category::Disk,
        Category::Network,
        Category::Gpu,
        Category::Smbios,
    ];

    /// Tag written into [`HardwareItem::category`].
    pub fn tag(self) -> &'static str {
        match self {
            Self::Bios => "BIOS",
            Self::System => "System",
            Self::BaseBoard => "BaseBoard",
            Self::Chassis => "Chassis",
            Self::Disk => "Disk",
            Self::Network => "Network",
            Self::Gpu => "GPU",
            Self::Smbios => "SMBIOS",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bios" => Ok(Self::Bios),
            "system" | "systemproduct" | "product" => Ok(Self::System),
            "baseboard" | "board" | "motherboard" => Ok(Self::BaseBoard),
            "chassis" | "enclosure" => Ok(Self::Chassis),
            "disk" | "disks" | "storage" => Ok(Self::Disk),
            "network" | "net" => Ok(Self::Network),
            "gpu" | "display" => Ok(Self::Gpu),
            "smbios" | "diagnostics" => Ok(Self::Smbios),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

// ── Helpers ────────────────────────────────────────────────────────────

/// Name for an enumerated field: `SerialNumber_0`.
pub(crate) fn indexed(name: &str, index: usize) -> String {
    format!("{name}_{index}")
}
