//! Hexadecimal rendering and parsing for addresses and register values.
//!
//! NDJSON writes a fixed 16-digit form and reads either hex or decimal.

use crate::utils::config::JSON_HEX_DIGITS;

/// `0x` followed by 16 lowercase, zero-padded hex digits
pub fn to_padded_hex(value: u64) -> String {
    format!("0x{:0width$x}", value, width = JSON_HEX_DIGITS)
}

/// Parse a 64-bit value from a hex (`0x`-prefixed) or decimal string
///
/// **Public** - used by the NDJSON decoder
///
/// Hex takes 1 to 16 digits; decimal takes ASCII digits only. Signs and
/// surrounding whitespace are rejected.
///
/// # Errors
/// Returns a human-readable reason when the string is empty, contains
/// invalid digits, or does not fit in 64 bits.
pub fn parse_u64(value: &str) -> Result<u64, String> {
    if let Some(digits) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        if digits.is_empty() {
            return Err("has no hex digits after 0x".to_string());
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("is not a valid hex value: {:?}", value));
        }
        if digits.len() > JSON_HEX_DIGITS {
            return Err(format!(
                "has {} hex digits, at most {} allowed",
                digits.len(),
                JSON_HEX_DIGITS
            ));
        }
        u64::from_str_radix(digits, 16).map_err(|e| format!("is not a valid 64-bit hex value: {}", e))
    } else if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        Err(format!("is not a valid hex or decimal value: {:?}", value))
    } else {
        value
            .parse::<u64>()
            .map_err(|e| format!("is not a valid 64-bit decimal value: {}", e))
    }
}
