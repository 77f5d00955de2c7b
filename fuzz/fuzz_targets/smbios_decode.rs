#![no_main]

use libfuzzer_sys::fuzz_target;
use platform_windows::firmware::split_provider_header;
use platform_windows::smbios::diagnostics::diagnostic_items;
use platform_windows::smbios::fields::{
    baseboard_items, bios_items, chassis_items, system_items, ReleaseDateOffset,
    UuidByteOrder,
};
use platform_windows::smbios::decode_report;

fuzz_target!(|data: &[u8]| {
    let Ok(table) = split_provider_header(data) else {
        return;
    };
    let report = decode_report(&table.entries);
    assert!(report.consumed <= table.entries.len());

    let structures = &report.structures;
    let _ = bios_items(structures, ReleaseDateOffset::Compat);
    let _ = bios_items(structures, ReleaseDateOffset::Smbios);
    let _ = system_items(structures, UuidByteOrder::Stored);
    let _ = system_items(structures, UuidByteOrder::Smbios);
    let _ = baseboard_items(structures);
    let _ = chassis_items(structures);
    let _ = diagnostic_items(&table.header, &report);
});
