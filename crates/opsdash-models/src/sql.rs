// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQL literal rendering.

/// Render `value` as a single-quoted SQL string literal.
pub fn text(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

pub fn int(value: i64) -> String {
    value.to_string()
}

pub fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(text("o'brien"), "'o''brien'");
        assert_eq!(text("'; DROP TABLE views; --"), "'''; DROP TABLE views; --'");
    }

    #[test]
    fn plain_values() {
        assert_eq!(text(""), "''");
        assert_eq!(int(-12), "-12");
        assert_eq!(flag(true), "1");
    }
}
