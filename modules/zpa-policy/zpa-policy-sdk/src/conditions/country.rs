//! ISO-3166-1 alpha-2 country codes.

use isocountry::CountryCode;

/// Whether `code` is an assigned alpha-2 code. Matching is case-sensitive.
#[must_use]
pub fn is_valid_alpha2(code: &str) -> bool {
    code.bytes().all(|b| b.is_ascii_uppercase()) && CountryCode::for_alpha2(code).is_ok()
}
