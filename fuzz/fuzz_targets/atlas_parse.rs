//! Fuzz target for sprite container parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use thingkit::codec::atlas::fuzz_parse;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = fuzz_parse(data);
});
