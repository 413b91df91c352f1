#![allow(dead_code, unused_imports)]

use std::error::Error;

pub use logpipes_test_utils::{init_tracing, serial, with_timeout};

pub type TestResult = Result<(), Box<dyn Error>>;

/// Prefix every line of `identity` starts with, up to the timestamp.
pub fn prefix(component: &str, operation: &str) -> String {
    format!("[{component}][{operation}][")
}

/// Strip `[<component>][<operation>][HH:MM:SS] ` from a line, checking the
/// timestamp shape on the way.
pub fn message<'a>(line: &'a str, component: &str, operation: &str) -> &'a str {
    let head = prefix(component, operation);
    let rest = line
        .strip_prefix(head.as_str())
        .unwrap_or_else(|| panic!("line {line:?} does not start with {head:?}"));
    let (time, msg) = rest
        .split_once("] ")
        .unwrap_or_else(|| panic!("line {line:?} has no timestamp"));
    assert_eq!(time.len(), 8, "timestamp {time:?} is not HH:MM:SS");
    assert!(
        time.chars()
            .enumerate()
            .all(|(i, c)| if i == 2 || i == 5 { c == ':' } else { c.is_ascii_digit() }),
        "timestamp {time:?} is not HH:MM:SS"
    );
    msg
}
