//! Errors raised while acquiring raw data from a platform source.

use std::fmt;

const ERROR_FILE_NOT_FOUND: u32 = 2;
const ERROR_ACCESS_DENIED: u32 = 5;
const ERROR_PRIVILEGE_NOT_HELD: u32 = 1314;

/// A data source could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The source only exists on Windows.
    Unsupported(&'static str),
    /// A native API call failed with a Win32 error code.
    Os { api: &'static str, code: u32 },
    /// The source returned fewer bytes than the layout requires.
    TooSmall {
        what: &'static str,
        needed: usize,
        actual: usize,
    },
    /// The required size changed between the sizing and fetching calls.
    SizeChanged {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Structurally inconsistent data.
    Malformed(String),
    /// An external helper process failed.
    Command(String),
}

impl SourceError {
    /// Hint placed in the notes of the error record.
    pub fn remediation(&self) -> String {
        match self {
            Self::Os { code, .. }
                if *code == ERROR_ACCESS_DENIED || *code == ERROR_PRIVILEGE_NOT_HELD =>
            {
                "Access denied; run as administrator".to_string()
            }
            Self::Os { code, .. } if *code == ERROR_FILE_NOT_FOUND => {
                "Source not present on this system".to_string()
            }
            Self::Os { .. } | Self::TooSmall { .. } => {
                "Try running as administrator".to_string()
            }
            Self::SizeChanged { .. } => "Source changed while reading; query again".to_string(),
            Self::Unsupported(_) => "Only available on Windows".to_string(),
            Self::Malformed(_) => "Source data is inconsistent".to_string(),
            Self::Command(_) => "Legacy management query failed".to_string(),
        }
    }

    pub(crate) fn os(api: &'static str, code: u32) -> Self {
        Self::Os { api, code }
    }

    /// Recover the Win32 code from an `HRESULT_FROM_WIN32` error.
    #[cfg(target_os = "windows")]
    pub(crate) fn from_win32(api: &'static str, err: &windows::core::Error) -> Self {
        Self::os(api, (err.code().0 as u32) & 0xFFFF)
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(what) => write!(f, "{what} is not supported on this platform"),
            Self::Os { api, code } => write!(f, "{api} failed with error {code}"),
            Self::TooSmall {
                what,
                needed,
                actual,
            } => write!(f, "{what} too small: {actual} bytes, need {needed}"),
            Self::SizeChanged {
                what,
                expected,
                actual,
            } => write!(f, "{what} size changed from {expected} to {actual} bytes"),
            Self::Malformed(msg) => write!(f, "malformed data: {msg}"),
            Self::Command(msg) => write!(f, "command failed: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}
