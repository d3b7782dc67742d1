//! Fuzz target for sprite blob decoding.
//!
//! Feeds arbitrary bytes to the run-length decoder at offset 0, checking
//! for panics and out-of-bounds writes.

#![no_main]

use libfuzzer_sys::fuzz_target;
use thingkit::codec::sprite::{blob_len, decode};

fuzz_target!(|data: &[u8]| {
    let _ = blob_len(data, 0);
    let _ = decode(data, 0);
});
