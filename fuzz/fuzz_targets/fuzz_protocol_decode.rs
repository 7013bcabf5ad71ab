// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use zkwire::Protocol;

fuzz_target!(|data: &[u8]| {
    let protocol = Protocol::standard();

    // A -1 length decodes as empty, so compare messages rather than bytes
    if let Ok(message) = protocol.decode(data) {
        let encoded = protocol.encode(&message).expect("decoded message re-encodes");
        assert_eq!(protocol.decode(&encoded), Ok(message));
    }
});
