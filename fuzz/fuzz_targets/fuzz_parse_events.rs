//! Fuzz target for the plain-text progress parser.
//!
//! Arbitrary stderr bytes and flags must never panic, and re-parsing the same
//! input must give the same result.

#![no_main]

use arbitrary::Arbitrary;
use compose_events::compose::parse_events;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzInput<'a> {
    stderr: &'a [u8],
    dry_run: bool,
    nonzero_rc: bool,
}

fuzz_target!(|input: FuzzInput<'_>| {
    let mut first_warnings = Vec::new();
    let first = parse_events(input.stderr, input.dry_run, input.nonzero_rc, |w| {
        first_warnings.push(w)
    });

    let mut second_warnings = Vec::new();
    let second = parse_events(input.stderr, input.dry_run, input.nonzero_rc, |w| {
        second_warnings.push(w)
    });

    match (first, second) {
        (Ok(a), Ok(b)) => {
            assert_eq!(a, b);
            assert_eq!(first_warnings, second_warnings);
        }
        (Err(_), Err(_)) => {}
        _ => panic!("parse result changed between runs"),
    }
});
