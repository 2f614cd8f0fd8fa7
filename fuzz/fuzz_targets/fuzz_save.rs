#![no_main]

//! Save file parser fuzzer.
//!
//! Any text either fails to parse with an error or yields a state that
//! satisfies every invariant and writes back to text that parses again.

use phalanx::game::check_invariants;
use phalanx::save::{parse_state, write_state};
use phalanx::RuleSet;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(state) = parse_state(text, RuleSet::base()) else {
        return;
    };
    let violations = check_invariants(&state);
    assert!(violations.is_empty(), "parsed state breaks invariants: {violations:?}");

    let written = write_state(&state);
    let reparsed = parse_state(&written, RuleSet::base()).expect("written state must parse");
    assert_eq!(write_state(&reparsed), written);
});
