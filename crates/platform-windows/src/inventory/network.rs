//! Network adapters from the kernel adapter list, the registry mirror and
//! the neighbor (ARP) cache.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::buffer::{read_c_string, read_u32_le, read_word_le};
use crate::registry::{device_instances, ConfigStore, NET_CLASS_GUID};
use crate::{indexed, Category, HardwareItem, SourceError, NOT_AVAILABLE};

const MAX_ADAPTER_NAME_LEN: usize = 260;
const MAX_ADAPTER_DESCRIPTION_LEN: usize = 132;
const MAX_ADAPTER_ADDRESS_LEN: usize = 8;
const IP_ADDRESS_STRING_LEN: usize = 16;

const NEIGHBOR_ROW_LEN: usize = 24;
const NEIGHBOR_TYPE_INVALID: u32 = 2;

/// One node of the kernel adapter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterRecord {
    pub index: u32,
    pub name: String,
    pub description: String,
    /// Hardware address, already cut to the declared length.
    pub mac: Vec<u8>,
    pub kind: u32,
    pub dhcp_enabled: bool,
    pub ipv4: Option<String>,
}

/// One row of the IPv4 neighbor table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborRow {
    pub interface_index: u32,
    pub phys_addr: Vec<u8>,
    pub address: Ipv4Addr,
    pub kind: u32,
}

pub trait NetworkSource {
    fn adapter_snapshot(&self) -> Result<Vec<AdapterRecord>, SourceError>;
    fn neighbor_rows(&self) -> Result<Vec<NeighborRow>, SourceError>;
}

// ── Formatting ─────────────────────────────────────────────────────────

/// Colon-separated uppercase hex pairs.
pub fn format_mac(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// Reformat a registry `NetworkAddress`. Exactly 12 hex digits become
/// colon-separated pairs; anything else is returned unmodified.
pub fn format_registry_mac(raw: &str) -> String {
    if raw.len() != 12 || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
        return raw.to_string();
    }
    raw.as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair).to_ascii_uppercase())
        .collect::<Vec<_>>()
        .join(":")
}

/// `MIB_IPNET_TYPE` as written into the notes.
pub fn neighbor_type_name(kind: u32) -> String {
    match kind {
        1 => "Other".to_string(),
        2 => "Invalid".to_string(),
        3 => "Dynamic".to_string(),
        4 => "Static".to_string(),
        other => format!("Type {other}"),
    }
}

// ── Adapter list decoding ──────────────────────────────────────────────

/// Field offsets of `IP_ADAPTER_INFO` for a given pointer width.
#[derive(Debug, Clone, Copy)]
struct AdapterLayout {
    width: usize,
    name: usize,
    description: usize,
    address_length: usize,
    address: usize,
    index: usize,
    kind: usize,
    dhcp: usize,
    ip_address: usize,
}

impl AdapterLayout {
    fn for_width(width: usize) -> Self {
        let name = width + 4;
        let description = name + MAX_ADAPTER_NAME_LEN;
        let address_length = description + MAX_ADAPTER_DESCRIPTION_LEN;
        let address = address_length + 4;
        let index = address + MAX_ADAPTER_ADDRESS_LEN;
        let kind = index + 4;
        let dhcp = kind + 4;
        let current_ip = (dhcp + 4).next_multiple_of(width);
        // IpAddressList follows CurrentIpAddress; its IpAddress sits after Next.
        let ip_address = current_ip + width + width;
        Self {
            width,
            name,
            description,
            address_length,
            address,
            index,
            kind,
            dhcp,
            ip_address,
        }
    }

    /// Bytes a node must span for every field read here.
    fn min_len(&self) -> usize {
        self.ip_address + IP_ADDRESS_STRING_LEN
    }
}

/// Walk the adapter list in `buf`, which the OS wrote at address `base`.
///
/// `Next` pointers are translated into offsets; a pointer outside the
/// buffer, or a chain longer than the buffer could hold, is malformed.
pub fn decode_adapter_list(
    buf: &[u8],
    base: usize,
    pointer_width: usize,
) -> Result<Vec<AdapterRecord>, SourceError> {
    if buf.is_empty() {
        return Ok(Vec::new());
    }
    if pointer_width != 4 && pointer_width != 8 {
        return Err(SourceError::Malformed(format!(
            "unsupported pointer width {pointer_width}"
        )));
    }
    let layout = AdapterLayout::for_width(pointer_width);
    let max_nodes = buf.len() / layout.min_len();

    let mut adapters = Vec::new();
    let mut offset = 0usize;
    loop {
        if offset + layout.min_len() > buf.len() {
            return Err(SourceError::TooSmall {
                what: "adapter record",
                needed: offset + layout.min_len(),
                actual: buf.len(),
            });
        }
        if adapters.len() >= max_nodes {
            return Err(SourceError::Malformed(
                "adapter list does not terminate".to_string(),
            ));
        }

        adapters.push(decode_adapter(&buf[offset..], &layout));

        let next = read_word_le(buf, offset, layout.width).unwrap_or_default() as usize;
        if next == 0 {
            break;
        }
        offset = next
            .checked_sub(base)
            .filter(|off| *off < buf.len())
            .ok_or_else(|| {
                SourceError::Malformed(format!("adapter link {next:#x} points outside the list"))
            })?;
    }
    Ok(adapters)
}

fn decode_adapter(node: &[u8], layout: &AdapterLayout) -> AdapterRecord {
    let address_length = read_u32_le(node, layout.address_length).unwrap_or_default() as usize;
    let mac = node
        .get(layout.address..layout.address + address_length.min(MAX_ADAPTER_ADDRESS_LEN))
        .unwrap_or_default()
        .to_vec();

    AdapterRecord {
        index: read_u32_le(node, layout.index).unwrap_or_default(),
        name: fixed_string(node, layout.name, MAX_ADAPTER_NAME_LEN).unwrap_or_default(),
        description: fixed_string(node, layout.description, MAX_ADAPTER_DESCRIPTION_LEN)
            .unwrap_or_default(),
        mac,
        kind: read_u32_le(node, layout.kind).unwrap_or_default(),
        dhcp_enabled: read_u32_le(node, layout.dhcp).is_some_and(|v| v != 0),
        ipv4: fixed_string(node, layout.ip_address, IP_ADDRESS_STRING_LEN)
            .filter(|ip| !ip.is_empty()),
    }
}

/// NUL-terminated string inside a fixed-size char array.
fn fixed_string(buf: &[u8], offset: usize, len: usize) -> Option<String> {
    let field = buf.get(offset..offset + len)?;
    read_c_string(field, 0).map(|s| s.trim().to_string())
}

// ── Neighbor table decoding ────────────────────────────────────────────

/// Decode `MIB_IPNETTABLE`: an entry count followed by fixed-size rows.
pub fn decode_neighbor_table(buf: &[u8]) -> Result<Vec<NeighborRow>, SourceError> {
    if buf.is_empty() {
        return Ok(Vec::new());
    }
    let count = read_u32_le(buf, 0).ok_or(SourceError::TooSmall {
        what: "neighbor table",
        needed: 4,
        actual: buf.len(),
    })? as usize;
    let needed = count
        .checked_mul(NEIGHBOR_ROW_LEN)
        .and_then(|rows| rows.checked_add(4))
        .unwrap_or(usize::MAX);
    if needed > buf.len() {
        return Err(SourceError::TooSmall {
            what: "neighbor table",
            needed,
            actual: buf.len(),
        });
    }

    Ok(buf[4..needed]
        .chunks_exact(NEIGHBOR_ROW_LEN)
        .map(|row| {
            let len = read_u32_le(row, 4).unwrap_or_default() as usize;
            let addr = read_u32_le(row, 16).unwrap_or_default();
            NeighborRow {
                interface_index: read_u32_le(row, 0).unwrap_or_default(),
                phys_addr: row[8..8 + len.min(MAX_ADAPTER_ADDRESS_LEN)].to_vec(),
                // dwAddr holds the address bytes in network order.
                address: Ipv4Addr::from(addr.to_le_bytes()),
                kind: read_u32_le(row, 20).unwrap_or_default(),
            }
        })
        .collect())
}

// ── Records ────────────────────────────────────────────────────────────

pub fn adapter_items(adapters: &[AdapterRecord]) -> Vec<HardwareItem> {
    let tag = Category::Network.tag();
    let mut items = Vec::new();
    for (i, adapter) in adapters.iter().enumerate() {
        let mac = if adapter.mac.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            format_mac(&adapter.mac)
        };
        items.push(HardwareItem::new(
            tag,
            indexed("MAC", i),
            mac,
            adapter.description.as_str(),
        ));
        if let Some(ip) = adapter.ipv4.as_deref().filter(|ip| *ip != "0.0.0.0") {
            items.push(HardwareItem::new(
                tag,
                indexed("IPv4", i),
                ip,
                adapter.description.as_str(),
            ));
        }
        items.push(HardwareItem::new(
            tag,
            indexed("DHCP", i),
            if adapter.dhcp_enabled { "Enabled" } else { "Disabled" },
            format!("Interface {}", adapter.index),
        ));
    }
    items
}

/// `NetworkAddress` overrides configured on network class instances.
pub fn registry_mac_items(store: &dyn ConfigStore) -> Result<Vec<HardwareItem>, SourceError> {
    let tag = Category::Network.tag();
    let mut items = Vec::new();
    for instance in device_instances(store, NET_CLASS_GUID)? {
        let Some(address) = store
            .read_string(&instance, "NetworkAddress")
            .filter(|a| !a.trim().is_empty())
        else {
            continue;
        };
        let description = store
            .read_string(&instance, "DriverDesc")
            .unwrap_or_else(|| "Unknown".to_string());
        items.push(HardwareItem::new(
            tag,
            indexed("RegistryMAC", items.len()),
            format_registry_mac(address.trim()),
            description,
        ));
    }
    Ok(items)
}

/// Neighbor rows with a hardware address and a valid type, resolved
/// against `adapters`.
pub fn neighbor_items(rows: &[NeighborRow], adapters: &[AdapterRecord]) -> Vec<HardwareItem> {
    let tag = Category::Network.tag();
    rows.iter()
        .filter(|row| !row.phys_addr.is_empty() && row.kind != NEIGHBOR_TYPE_INVALID)
        .enumerate()
        .map(|(i, row)| {
            let adapter = adapters
                .iter()
                .find(|a| a.index == row.interface_index)
                .map(|a| a.description.clone())
                .unwrap_or_else(|| format!("Interface {}", row.interface_index));
            HardwareItem::new(
                tag,
                indexed("ARP", i),
                format!("{} {}", row.address, format_mac(&row.phys_addr)),
                format!("{}: {adapter}", neighbor_type_name(row.kind)),
            )
        })
        .collect()
}

/// Run the three network sub-queries, each isolated from the others.
pub fn network_items(
    source: &dyn NetworkSource,
    store: &dyn ConfigStore,
    include_neighbors: bool,
) -> Vec<HardwareItem> {
    let tag = Category::Network.tag();
    let mut items = Vec::new();

    let snapshot = source.adapter_snapshot();
    match &snapshot {
        Ok(adapters) => items.extend(adapter_items(adapters)),
        Err(err) => {
            tracing::warn!(error = %err, "adapter list unavailable");
            items.push(HardwareItem::error(tag, err));
        }
    }

    match registry_mac_items(store) {
        Ok(found) => items.extend(found),
        Err(err) => {
            tracing::warn!(error = %err, "network class registry unavailable");
            items.push(HardwareItem::error(tag, &err));
        }
    }

    if include_neighbors {
        match source.neighbor_rows() {
            Ok(rows) => {
                let adapters = snapshot.as_deref().unwrap_or(&[]);
                items.extend(neighbor_items(&rows, adapters));
            }
            Err(err) => {
                tracing::warn!(error = %err, "neighbor table unavailable");
                items.push(HardwareItem::error(tag, &err));
            }
        }
    }

    items
}

// ── Native IP helper ───────────────────────────────────────────────────

/// `GetAdaptersInfo` and `GetIpNetTable`.
#[derive(Debug, Default, Clone, Copy)]
pub struct IpHelper;

impl NetworkSource for IpHelper {
    fn adapter_snapshot(&self) -> Result<Vec<AdapterRecord>, SourceError> {
        #[cfg(target_os = "windows")]
        {
            native::adapter_snapshot()
        }
        #[cfg(not(target_os = "windows"))]
        {
            tracing::warn!("adapter_snapshot is a stub on non-Windows");
            Err(SourceError::Unsupported("GetAdaptersInfo"))
        }
    }

    fn neighbor_rows(&self) -> Result<Vec<NeighborRow>, SourceError> {
        #[cfg(target_os = "windows")]
        {
            native::neighbor_rows()
        }
        #[cfg(not(target_os = "windows"))]
        {
            tracing::warn!("neighbor_rows is a stub on non-Windows");
            Err(SourceError::Unsupported("GetIpNetTable"))
        }
    }
}

#[cfg(target_os = "windows")]
mod native {
    use windows::Win32::Foundation::FALSE;
    use windows::Win32::NetworkManagement::IpHelper::{
        GetAdaptersInfo, GetIpNetTable, IP_ADAPTER_INFO, MIB_IPNETTABLE,
    };

    use super::{decode_adapter_list, decode_neighbor_table, AdapterRecord, NeighborRow};
    use crate::buffer::{query_two_call, SizedCall};
    use crate::SourceError;

    const NO_ERROR: u32 = 0;
    const ERROR_BUFFER_OVERFLOW: u32 = 111;
    const ERROR_INSUFFICIENT_BUFFER: u32 = 122;
    const ERROR_NO_DATA: u32 = 232;

    fn classify(api: &'static str, status: u32, size: u32, capacity: usize) -> SizedCall {
        match status {
            NO_ERROR if capacity == 0 => SizedCall::Empty,
            NO_ERROR => SizedCall::Complete(capacity),
            ERROR_BUFFER_OVERFLOW | ERROR_INSUFFICIENT_BUFFER => SizedCall::Required(size as usize),
            ERROR_NO_DATA => SizedCall::Empty,
            code => SizedCall::Failed(SourceError::os(api, code)),
        }
    }

    pub(super) fn adapter_snapshot() -> Result<Vec<AdapterRecord>, SourceError> {
        let buf = query_two_call("adapter list", |buf| {
            let mut size = buf.len() as u32;
            let target = (!buf.is_empty()).then(|| buf.as_mut_ptr() as *mut IP_ADAPTER_INFO);
            // SAFETY: `target` is valid for `size` bytes for the whole call.
            let status = unsafe { GetAdaptersInfo(target, &mut size) };
            classify("GetAdaptersInfo", status, size, buf.len())
        })?;
        decode_adapter_list(&buf, buf.as_ptr() as usize, std::mem::size_of::<usize>())
    }

    pub(super) fn neighbor_rows() -> Result<Vec<NeighborRow>, SourceError> {
        let buf = query_two_call("neighbor table", |buf| {
            let mut size = buf.len() as u32;
            let target = (!buf.is_empty()).then(|| buf.as_mut_ptr() as *mut MIB_IPNETTABLE);
            // SAFETY: `target` is valid for `size` bytes for the whole call.
            let status = unsafe { GetIpNetTable(target, &mut size, FALSE) };
            classify("GetIpNetTable", status, size, buf.len())
        })?;
        decode_neighbor_table(&buf)
    }
}
