//! Field-level validation rules for mutation inputs.
//!
//! These rules are pure and shared by the mutation engine; uniqueness
//! checks need the store and live with the engine itself.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

/// Accepted phone formats: `+1234567890` (10-15 digits, optional `+`)
/// or `123-456-7890`.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+?\d{10,15}|\d{3}-\d{3}-\d{4})$").expect("valid regex"));

/// Whether a phone value is acceptable. Absent or empty phones are valid;
/// a present phone must match one of the accepted formats.
pub fn valid_phone(phone: Option<&str>) -> bool {
    match phone {
        None => true,
        Some(p) if p.is_empty() => true,
        Some(p) => PHONE_RE.is_match(p),
    }
}

/// Product prices must be strictly positive.
pub fn valid_price(price: Decimal) -> bool {
    price > Decimal::ZERO
}

/// Product stock can never go negative.
pub fn valid_stock(stock: i32) -> bool {
    stock >= 0
}
