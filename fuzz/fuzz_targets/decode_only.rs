#![no_main]

use libfuzzer_sys::fuzz_target;

use pocket_cbor::{DecodeMode, Decoder};

fuzz_target!(|data: &[u8]| {
    for mode in [
        DecodeMode::Normal,
        DecodeMode::MapStringsOnly,
        DecodeMode::MapAsArray,
    ] {
        let mut block = [0u8; 4096];
        let mut dec = Decoder::new(data, mode);
        if dec.set_mem_pool(&mut block, mode == DecodeMode::MapStringsOnly).is_err() {
            return;
        }
        // Every call either consumes input or fails.
        while dec.get_next().is_ok() {}
        let _ = dec.finish();
    }
});
