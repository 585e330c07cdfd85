//! Utility functions for printing statements with their bind values inlined.
//!
//! The output is meant for humans reading logs. Values are not quoted or
//! escaped, so a composed statement must never be sent to the store.
use super::Value;

/// Replace each `?` in `statement`, left to right, with the next argument.
///
/// Placeholders without a matching argument are left as `?`; surplus
/// arguments are ignored.
#[must_use]
pub fn compose_query(statement: &str, args: &[Value]) -> String {
    let mut composed = String::with_capacity(statement.len());
    let mut args = args.iter();
    for part in statement.split_inclusive('?') {
        match part.strip_suffix('?').zip(args.as_slice().first()) {
            Some((before, arg)) => {
                composed.push_str(before);
                composed.push_str(&arg.to_string());
                args.next();
            }
            None => composed.push_str(part),
        }
    }
    composed
}

/// A composed statement headed by `name`, padded with blank lines so it
/// stands out in a log stream.
#[must_use]
pub fn debug_query(name: &str, statement: &str, args: &[Value]) -> String {
    format!("\n{name}\n{}\n", compose_query(statement, args))
}
