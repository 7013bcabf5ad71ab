// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use zkwire::protocol::FrameCodec;

fuzz_target!(|data: &[u8]| {
    // Small limit so length prefixes hit the size check
    let mut codec = FrameCodec::new(4096);
    let mut reader = data;
    while let Ok(Some(body)) = codec.decode(&mut reader) {
        assert!(body.len() <= 4096);
    }
});
