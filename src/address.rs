//! Address-format validation for user input.
//!
//! Accepts the canonical 20-byte hex form with an optional `0x` prefix. All-lowercase
//! and all-uppercase digits are accepted as-is; mixed case must match the EIP-55
//! checksum.

use alloy::primitives::Address;
use std::str::FromStr;

use crate::error::DappError;

pub fn parse_address(input: &str) -> Option<Address> {
    let digits = input.strip_prefix("0x").unwrap_or(input);
    if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let address = Address::from_str(digits).ok()?;

    let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper && address.to_checksum(None)[2..] != *digits {
        return None;
    }

    Some(address)
}

pub fn is_valid_address(input: &str) -> bool {
    parse_address(input).is_some()
}

/// Parses `input` or fails with a validation error naming `field`.
pub fn require_address(input: &str, field: &str) -> Result<Address, DappError> {
    parse_address(input.trim())
        .ok_or_else(|| DappError::Validation(format!("The {field} address is invalid.")))
}
