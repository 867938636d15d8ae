#![no_main]

use libfuzzer_sys::fuzz_target;
use punishtrack::source::{FramePairer, parse_line};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let mut pairer = FramePairer::new();
    for (i, line) in text.lines().enumerate() {
        let line_number = i + 1;
        match parse_line(line_number, line) {
            Ok(Some(record)) => {
                let _ = pairer.push(line_number, record);
            }
            Ok(None) => {}
            Err(_) => return,
        }
    }
});
