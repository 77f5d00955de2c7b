use std::net::Ipv4Addr;

use platform_windows::firmware::FirmwareSource;
use platform_windows::inventory::{
    AdapterRecord, DeviceResponse, NeighborRow, NetworkSource, StorageSource,
};
use platform_windows::legacy::LegacySource;
use platform_windows::registry::{MemoryStore, BIOS_KEY, CLASS_ROOT, NET_CLASS_GUID};
use platform_windows::{
    Category, HardwareItem, HardwareProbe, ProbeOptions, ReleaseDateOffset, SourceError,
    UuidByteOrder, NOT_AVAILABLE,
};

struct DeniedFirmware;

impl FirmwareSource for DeniedFirmware {
    fn read_raw_table(&self) -> Result<Vec<u8>, SourceError> {
        Err(SourceError::Os {
            api: "GetSystemFirmwareTable",
            code: 5,
        })
    }
}

struct NoDrives;

impl StorageSource for NoDrives {
    fn query_device(&self, _index: u32) -> Result<Option<DeviceResponse>, SourceError> {
        Ok(None)
    }
}

struct FakeNetwork {
    adapters: Result<Vec<AdapterRecord>, SourceError>,
    neighbors: Vec<NeighborRow>,
}

impl NetworkSource for FakeNetwork {
    fn adapter_snapshot(&self) -> Result<Vec<AdapterRecord>, SourceError> {
        self.adapters.clone()
    }

    fn neighbor_rows(&self) -> Result<Vec<NeighborRow>, SourceError> {
        Ok(self.neighbors.clone())
    }
}

struct CimFake;

impl LegacySource for CimFake {
    fn serial_number(&self, category: Category) -> Option<String> {
        (category == Category::BaseBoard).then(|| "MB-CIM-42".to_string())
    }
}

fn adapter(index: u32, description: &str, mac: &[u8]) -> AdapterRecord {
    AdapterRecord {
        index,
        name: format!("{{ADAPTER-{index}}}"),
        description: description.to_string(),
        mac: mac.to_vec(),
        kind: 6,
        dhcp_enabled: true,
        ipv4: Some("10.0.0.5".to_string()),
    }
}

fn neighbor(interface_index: u32, octets: [u8; 4], kind: u32) -> NeighborRow {
    NeighborRow {
        interface_index,
        phys_addr: vec![0x00, 0x11, 0x22, 0x33, 0x44, 0x55],
        address: Ipv4Addr::from(octets),
        kind,
    }
}

/// Raw provider buffer: 8-byte header then the structure table.
fn raw_table(entries: &[u8]) -> Vec<u8> {
    let mut raw = vec![0, 3, 2, 0];
    raw.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    raw.extend_from_slice(entries);
    raw
}

fn structure(kind: u8, data: &[u8], strings: &[&str]) -> Vec<u8> {
    let mut out = vec![kind, (data.len() + 4) as u8, 0x10, 0x00];
    out.extend_from_slice(data);
    for s in strings {
        out.extend_from_slice(s.as_bytes());
        out.push(0);
    }
    if strings.is_empty() {
        out.push(0);
    }
    out.push(0);
    out
}

fn sample_firmware() -> Vec<u8> {
    let mut entries = structure(0, &[1, 2, 0, 0xF0, 3, 0x3F], &["American Megatrends", "F.42", "03/14/2023"]);
    let mut system = vec![1, 2, 3, 4];
    system.extend_from_slice(&[
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE,
        0xFF,
    ]);
    system.push(6);
    entries.extend(structure(1, &system, &["HP", "EliteBook 840", "1.0", "5CG0001"]));
    entries.extend(structure(2, &[1, 2, 0, 3], &["HP", "8723", "Default string"]));
    entries.extend(structure(3, &[1, 0x0A, 0, 2, 0], &["HP", "CZC1234"]));
    entries.extend(structure(127, &[], &[]));
    raw_table(&entries)
}

fn quiet_network() -> FakeNetwork {
    FakeNetwork {
        adapters: Ok(Vec::new()),
        neighbors: Vec::new(),
    }
}

fn probe(firmware: impl FirmwareSource + 'static, store: MemoryStore) -> HardwareProbe {
    HardwareProbe::native(ProbeOptions::default())
        .with_firmware(firmware)
        .with_store(store)
        .with_storage(NoDrives)
        .with_network(quiet_network())
        .without_legacy()
}

fn value<'a>(items: &'a [HardwareItem], name: &str) -> &'a str {
    items
        .iter()
        .find(|i| i.name == name)
        .map(|i| i.value.as_str())
        .unwrap_or_else(|| panic!("missing {name}"))
}

#[test]
fn unreadable_firmware_yields_one_error_plus_registry_fields() {
    let store = MemoryStore::new()
        .with_value(BIOS_KEY, "BIOSVendor", "LENOVO")
        .with_value(BIOS_KEY, "BIOSVersion", "N2HET71W (1.54 )");
    let items = probe(DeniedFirmware, store).bios_info();

    let errors: Vec<_> = items.iter().filter(|i| i.is_error()).collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].notes.contains("administrator"));
    assert_eq!(value(&items, "Vendor"), "LENOVO");
    assert_eq!(value(&items, "Version"), "N2HET71W (1.54 )");
    assert!(items.iter().all(|i| i.category == "BIOS"));
}

#[test]
fn firmware_values_win_over_registry() {
    let store = || {
        MemoryStore::new()
            .with_value(BIOS_KEY, "BIOSVendor", "Registry Vendor")
            .with_value(BIOS_KEY, "BIOSReleaseDate", "07/01/2024")
            .with_value(BIOS_KEY, "BaseBoardVersion", "A01")
    };
    let probe = probe(sample_firmware(), store());

    // Data offset 2 holds no string reference here, so the registry fills it.
    let bios = probe.bios_info();
    assert_eq!(value(&bios, "Vendor"), "American Megatrends");
    assert_eq!(value(&bios, "ReleaseDate"), "07/01/2024");
    assert_eq!(value(&bios, "RomSize"), "4096 KB");

    let options = ProbeOptions {
        release_date: ReleaseDateOffset::Smbios,
        ..ProbeOptions::default()
    };
    let smbios_layout = HardwareProbe::native(options)
        .with_firmware(sample_firmware())
        .with_store(store())
        .bios_info();
    assert_eq!(value(&smbios_layout, "ReleaseDate"), "03/14/2023");

    let board = probe.baseboard_info();
    assert_eq!(value(&board, "Version"), "A01");
    assert_eq!(value(&board, "SerialNumber"), "Default string");
}

#[test]
fn system_uuid_rendering_follows_option() {
    let stored = probe(sample_firmware(), MemoryStore::new()).system_info();
    assert_eq!(value(&stored, "UUID"), "00112233-4455-6677-8899-AABBCCDDEEFF");
    assert_eq!(value(&stored, "SerialNumber"), "5CG0001");

    let options = ProbeOptions {
        uuid_order: UuidByteOrder::Smbios,
        ..ProbeOptions::default()
    };
    let smbios = HardwareProbe::native(options)
        .with_firmware(sample_firmware())
        .with_store(MemoryStore::new())
        .system_info();
    assert_eq!(value(&smbios, "UUID"), "33221100-5544-7766-8899-AABBCCDDEEFF");
}

#[test]
fn chassis_type_is_numeric() {
    let chassis = probe(sample_firmware(), MemoryStore::new()).chassis_info();
    assert_eq!(value(&chassis, "Type"), "10");
    assert_eq!(value(&chassis, "SerialNumber"), "CZC1234");
    assert_eq!(value(&chassis, "AssetTag"), NOT_AVAILABLE);
}

#[test]
fn legacy_source_fills_unresolved_serials() {
    let items = probe(sample_firmware(), MemoryStore::new())
        .with_legacy(CimFake)
        .baseboard_info();
    let serial = items
        .iter()
        .find(|i| i.name == "SerialNumber")
        .expect("serial");
    assert_eq!(serial.value, "MB-CIM-42");
    assert_eq!(serial.notes, "CIM");
}

#[test]
fn network_sub_queries_are_isolated() {
    let class = format!(r"{CLASS_ROOT}\{NET_CLASS_GUID}");
    let store = MemoryStore::new()
        .with_value(&format!(r"{class}\0007"), "NetworkAddress", "AABBCCDDEEFF")
        .with_value(&format!(r"{class}\0007"), "DriverDesc", "Intel(R) Wi-Fi 6 AX201");
    let network = FakeNetwork {
        adapters: Err(SourceError::Os {
            api: "GetAdaptersInfo",
            code: 87,
        }),
        neighbors: vec![neighbor(3, [192, 168, 0, 1], 4)],
    };
    let items = probe(sample_firmware(), store)
        .with_network(network)
        .network_info();

    assert_eq!(items.iter().filter(|i| i.is_error()).count(), 1);
    assert_eq!(value(&items, "RegistryMAC_0"), "AA:BB:CC:DD:EE:FF");
    let arp = items.iter().find(|i| i.name == "ARP_0").expect("arp");
    assert_eq!(arp.value, "192.168.0.1 00:11:22:33:44:55");
    assert_eq!(arp.notes, "Static: Interface 3");
}

#[test]
fn neighbors_resolve_against_the_adapter_snapshot() {
    let network = FakeNetwork {
        adapters: Ok(vec![adapter(3, "Realtek PCIe GbE", &[0xAA, 0xBB, 0xCC, 0x11, 0x22, 0x33])]),
        neighbors: vec![
            neighbor(3, [192, 168, 0, 1], 3),
            neighbor(3, [192, 168, 0, 9], 2),
        ],
    };
    let items = probe(sample_firmware(), MemoryStore::new())
        .with_network(network)
        .network_info();

    assert_eq!(value(&items, "MAC_0"), "AA:BB:CC:11:22:33");
    assert_eq!(value(&items, "IPv4_0"), "10.0.0.5");
    let arp: Vec<_> = items.iter().filter(|i| i.name.starts_with("ARP_")).collect();
    assert_eq!(arp.len(), 1);
    assert_eq!(arp[0].notes, "Dynamic: Realtek PCIe GbE");
}

#[test]
fn neighbor_cache_can_be_disabled() {
    let options = ProbeOptions {
        include_neighbors: false,
        ..ProbeOptions::default()
    };
    let network = FakeNetwork {
        adapters: Ok(Vec::new()),
        neighbors: vec![neighbor(1, [10, 0, 0, 1], 4)],
    };
    let items = HardwareProbe::native(options)
        .with_store(MemoryStore::new())
        .with_network(network)
        .network_info();
    assert!(items.iter().all(|i| !i.name.starts_with("ARP_")));
}

#[test]
fn empty_disk_enumeration_is_one_error_record() {
    let items = probe(sample_firmware(), MemoryStore::new()).disk_info();
    assert_eq!(items.len(), 1);
    assert!(items[0].is_error());
    assert_eq!(items[0].category, "Disk");
}

#[test]
fn collect_preserves_category_order() {
    let probe = probe(sample_firmware(), MemoryStore::new());
    let items = probe.collect(&[Category::Chassis, Category::Bios, Category::Smbios]);

    let first_bios = items.iter().position(|i| i.category == "BIOS").expect("bios");
    let last_chassis = items.iter().rposition(|i| i.category == "Chassis").expect("chassis");
    assert!(last_chassis < first_bios);
    assert_eq!(value(&items, "StructureCount"), "4");
    let version = items
        .iter()
        .find(|i| i.matches("SMBIOS", "Version"))
        .expect("smbios version");
    assert_eq!(version.value, "3.2");
}
