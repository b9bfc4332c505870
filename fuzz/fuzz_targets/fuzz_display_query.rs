#![no_main]
//! Fuzz target for display query answer parsing
//!
//! Feeds random bytes as script results to the answer parser. Parsing must
//! never panic, and only numeric answers may override the fallback.

use libfuzzer_sys::fuzz_target;

use multiview::bridge::DisplayAnswer;
use multiview::OutputIndex;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let fallback = OutputIndex(3);
        let answer = DisplayAnswer::parse(s);
        let resolved = answer.resolve(fallback);
        match answer {
            DisplayAnswer::Explicit(index) => assert_eq!(resolved, index),
            DisplayAnswer::Unaddressable => assert_eq!(resolved, OutputIndex::UNADDRESSABLE),
            DisplayAnswer::NoPreference | DisplayAnswer::Malformed => assert_eq!(resolved, fallback),
        }
    }
});
