//! Two-call "query size, then fetch" buffer protocol.
//!
//! `GetSystemFirmwareTable`, `GetAdaptersInfo` and `GetIpNetTable` all
//! report the buffer size they need when called with an empty buffer, then
//! fill a buffer of that size on the second call. The closure adapts one
//! API to [`SizedCall`]; the helper owns allocation and validation.

use crate::SourceError;

/// Outcome of one call into a size-then-fetch API.
#[derive(Debug)]
pub enum SizedCall {
    /// The buffer is too small; this many bytes are needed.
    Required(usize),
    /// The call succeeded and wrote this many bytes.
    Complete(usize),
    /// The source has no data at all.
    Empty,
    Failed(SourceError),
}

/// Run the two-call protocol and return the fetched bytes.
///
/// The first call receives an empty slice. A second `Required` answer means
/// the data grew between the calls; that is reported, not retried.
pub fn query_two_call<F>(what: &'static str, mut call: F) -> Result<Vec<u8>, SourceError>
where
    F: FnMut(&mut [u8]) -> SizedCall,
{
    let required = match call(&mut []) {
        SizedCall::Required(0) => {
            return Err(SourceError::TooSmall {
                what,
                needed: 1,
                actual: 0,
            })
        }
        SizedCall::Required(size) => size,
        SizedCall::Complete(_) | SizedCall::Empty => return Ok(Vec::new()),
        SizedCall::Failed(err) => return Err(err),
    };

    let mut buffer = vec![0u8; required];
    match call(&mut buffer) {
        SizedCall::Complete(written) => {
            buffer.truncate(written.min(required));
            tracing::trace!(what, required, written, "two-call fetch complete");
            Ok(buffer)
        }
        SizedCall::Empty => Ok(Vec::new()),
        SizedCall::Required(actual) => Err(SourceError::SizeChanged {
            what,
            expected: required,
            actual,
        }),
        SizedCall::Failed(err) => Err(err),
    }
}

// ── Bounds-checked reads ───────────────────────────────────────────────

pub(crate) fn read_u8(buf: &[u8], offset: usize) -> Option<u8> {
    buf.get(offset).copied()
}

pub(crate) fn read_u16_le(buf: &[u8], offset: usize) -> Option<u16> {
    let bytes = buf.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

pub(crate) fn read_u32_le(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes = buf.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub(crate) fn read_u64_le(buf: &[u8], offset: usize) -> Option<u64> {
    let bytes = buf.get(offset..offset.checked_add(8)?)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    Some(u64::from_le_bytes(raw))
}

pub(crate) fn read_i64_le(buf: &[u8], offset: usize) -> Option<i64> {
    read_u64_le(buf, offset).map(|v| v as i64)
}

/// Read a little-endian pointer-sized value of `width` (4 or 8) bytes.
pub(crate) fn read_word_le(buf: &[u8], offset: usize, width: usize) -> Option<u64> {
    match width {
        4 => read_u32_le(buf, offset).map(u64::from),
        8 => read_u64_le(buf, offset),
        _ => None,
    }
}

/// ANSI string starting at `offset`, ending at the first NUL or at the end
/// of `buf`. Lossy for non-ASCII bytes.
pub(crate) fn read_c_string(buf: &[u8], offset: usize) -> Option<String> {
    let tail = buf.get(offset..)?;
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    Some(String::from_utf8_lossy(&tail[..end]).into_owned())
}
