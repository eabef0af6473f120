use std::sync::OnceLock;

use inflections::Inflect;
use regex::Regex;

use crate::config::IdentCase;

/// Matches the characters some vendors use in their peripheral/field names
/// but that are not valid in a C++ identifier
fn blacklist() -> &'static Regex {
    static BLACKLIST: OnceLock<Regex> = OnceLock::new();
    BLACKLIST.get_or_init(|| Regex::new(r"[^A-Za-z0-9_ ]+").unwrap())
}

pub trait ToSanitizedCase {
    /// Strips characters outside `[A-Za-z0-9_ ]` and applies `case`
    fn to_sanitized_case(&self, case: IdentCase) -> String;

    /// Like [`to_sanitized_case`](Self::to_sanitized_case), but the result
    /// never starts with a digit
    fn to_identifier(&self, case: IdentCase) -> String {
        let s = self.to_sanitized_case(case);
        match s.chars().next() {
            Some(c) if c.is_ascii_digit() => {
                let s = relocate_digits(&s);
                if s.starts_with(|c: char| c.is_ascii_digit()) {
                    format!("_{s}")
                } else {
                    s
                }
            }
            _ => s,
        }
    }
}

impl ToSanitizedCase for str {
    fn to_sanitized_case(&self, case: IdentCase) -> String {
        let s = blacklist().replace_all(self, "");
        match case {
            IdentCase::Title => s.to_pascal_case(),
            IdentCase::Lower => s.replace(' ', "").to_lowercase(),
            IdentCase::Verbatim => s.replace(' ', ""),
        }
    }
}

/// Removes a trailing run of digits, so `Uart0`, `Uart1` and `Uart2`
/// share the base name `Uart`
///
/// A name made only of digits is returned unchanged.
pub fn strip_trailing_digits(name: &str) -> &str {
    let stripped = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if stripped.is_empty() {
        name
    } else {
        stripped
    }
}

/// Moves every digit to the end of `name`, keeping the relative order of the
/// digits and of the other characters: `8Bit` becomes `Bit8`
pub fn relocate_digits(name: &str) -> String {
    let (digits, rest): (String, String) = name.chars().partition(|c| c.is_ascii_digit());
    rest + &digits
}

pub fn respace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses an SVD scaled non-negative integer: `0x` hexadecimal, `#` or `0b`
/// binary, or decimal
pub fn parse_u64(text: &str) -> Option<u64> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = text
        .strip_prefix('#')
        .or_else(|| text.strip_prefix("0b"))
        .or_else(|| text.strip_prefix("0B"))
    {
        u64::from_str_radix(bin, 2).ok()
    } else {
        text.parse().ok()
    }
}

pub fn hex(n: u64) -> String {
    format!("0x{n:X}")
}
