//! Fuzz target for interchange file decoding.
//!
//! The input is compressed before decoding so the fuzzer explores the
//! layout parser rather than the zlib header checks.

#![no_main]

use libfuzzer_sys::fuzz_target;
use thingkit::codec::interchange::fuzz_decode_inflated;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let _ = fuzz_decode_inflated(data);
});
