//! Price value normalization.
//!
//! Prices travel through the filter pipeline as optional decimals and leave it
//! as fixed-precision decimals. Normalization works on the textual form so the
//! sale-price suffix quirk behaves exactly as it does for stored text prices.

use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Suffix glued onto the textual sale price before it is normalized.
pub const SALE_PRICE_SUFFIX: &str = ".00";

/// Default number of decimals for prices.
pub const DEFAULT_PRICE_DECIMALS: u32 = 2;

/// Textual form of an optional price; unset renders as the empty string.
pub fn raw_price(value: Option<Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Normalize a textual price to `decimals` places.
///
/// Characters other than digits, `.`, `,` and `-` are dropped, then the longest
/// leading numeric prefix is read (anything after a second separator is
/// ignored). Text with no numeric prefix, including the empty string, reads as
/// zero. Midpoints round away from zero.
pub fn format_decimal(raw: &str, decimals: u32) -> Decimal {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();

    let prefix = numeric_prefix(&cleaned);
    let prefix = if prefix.starts_with('.') {
        format!("0{prefix}")
    } else {
        prefix.replacen("-.", "-0.", 1)
    };
    let value = Decimal::from_str(&prefix).unwrap_or(Decimal::ZERO);
    let mut rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded.rescale(decimals);
    rounded
}

/// Normalize a textual sale price.
///
/// The sale price gets [`SALE_PRICE_SUFFIX`] appended before normalizing.
/// Because only the leading numeric prefix is read, `"8"` becomes `8.00` and
/// `"8.5"` (read as `"8.5.00"`) becomes `8.50`; the suffix never changes the
/// rounded value.
pub fn format_sale_decimal(raw: &str, decimals: u32) -> Decimal {
    format_decimal(&format!("{raw}{SALE_PRICE_SUFFIX}"), decimals)
}

fn numeric_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start {
            has_digits = true;
            end = frac_end;
        }
    }
    if has_digits { &s[..end] } else { "" }
}
