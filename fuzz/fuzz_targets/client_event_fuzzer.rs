//! Fuzz target for client event decoding
//!
//! # Strategy
//!
//! - Raw bytes: arbitrary input interpreted as a single wire line
//! - Re-encoding: anything that decodes must encode and decode back to the
//!   same event
//!
//! # Invariants
//!
//! - NEVER panic on malformed input
//! - Decoded events survive a re-encode unchanged

#![no_main]

use coopsweep_proto::{decode_client_event, encode_client_event};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else { return };

    if let Ok(event) = decode_client_event(line) {
        let encoded = encode_client_event(&event).expect("decoded event must encode");
        let again = decode_client_event(&encoded).expect("encoded event must decode");
        assert_eq!(event, again);
    }
});
