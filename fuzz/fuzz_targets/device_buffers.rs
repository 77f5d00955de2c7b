#![no_main]

use libfuzzer_sys::fuzz_target;
use platform_windows::inventory::disk::{decode_descriptor, decode_geometry, descriptor_shortfall};
use platform_windows::inventory::network::{decode_adapter_list, decode_neighbor_table};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };

    match selector % 4 {
        0 => {
            let _ = decode_descriptor(rest);
            if let Some(size) = descriptor_shortfall(rest) {
                assert!(size > rest.len());
            }
        }
        1 => {
            let _ = decode_geometry(rest);
        }
        2 => {
            // Pretend the list was written at a fixed address so links can
            // point back into the buffer.
            let width = if selector & 0x80 == 0 { 8 } else { 4 };
            let _ = decode_adapter_list(rest, 0x1000, width);
        }
        _ => {
            let _ = decode_neighbor_table(rest);
        }
    }
});
