//! Fuzz target for the logfmt decoder used for logrus warning lines.

#![no_main]

use compose_events::compose::logfmt::parse_logfmt_line;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(line) = std::str::from_utf8(data) {
        let _ = parse_logfmt_line(line, true);
        let _ = parse_logfmt_line(line, false);
    }
});
