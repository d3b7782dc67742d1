//! Fuzz target for catalogue container parsing.
//!
//! Covers framing detection, the flag tag stream and frame group headers.

#![no_main]

use libfuzzer_sys::fuzz_target;
use thingkit::codec::catalog::fuzz_parse;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = fuzz_parse(data);
});
