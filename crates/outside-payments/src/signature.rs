//! PayU integrity signatures.
//!
//! Both sides compute the same MD5 digest over `~`-joined fields, so field
//! order, delimiter and digest are a fixed contract with the provider.

use crate::constants::SIGNATURE_DELIMITER;

fn md5_hex(fields: &[&str]) -> String {
    let payload = fields.join(SIGNATURE_DELIMITER);
    format!("{:x}", md5::compute(payload.as_bytes()))
}

/// Signature for a checkout request:
/// `md5(apiKey~merchantId~referenceCode~amount~currency)` as lowercase hex.
pub fn payment_signature(
    api_key: &str,
    merchant_id: &str,
    reference_code: &str,
    amount: &str,
    currency: &str,
) -> String {
    md5_hex(&[api_key, merchant_id, reference_code, amount, currency])
}

/// Signature PayU attaches to a confirmation:
/// `md5(apiKey~merchant_id~reference_sale~new_value~currency~state_pol)`.
///
/// `value` is the raw `value` field of the confirmation; it is normalized with
/// [`confirmation_value`] first.
pub fn confirmation_signature(
    api_key: &str,
    merchant_id: &str,
    reference_sale: &str,
    value: &str,
    currency: &str,
    state_pol: &str,
) -> String {
    let new_value = confirmation_value(value);
    md5_hex(&[
        api_key,
        merchant_id,
        reference_sale,
        new_value.as_str(),
        currency,
        state_pol,
    ])
}

/// Check a confirmation `sign` field. Hex case is ignored.
pub fn verify_confirmation_signature(expected: &str, sign: &str) -> bool {
    expected.eq_ignore_ascii_case(sign.trim())
}

/// Normalize a confirmation amount the way PayU does before signing: one
/// decimal when the second decimal is zero, two otherwise.
///
/// `"150.00"` -> `"150.0"`, `"150.26"` -> `"150.26"`, `"150"` -> `"150.0"`.
/// Digits past the second decimal are dropped.
pub fn confirmation_value(value: &str) -> String {
    let value = value.trim();
    let (integer, decimals) = value.split_once('.').unwrap_or((value, ""));
    let mut digits = decimals.chars().chain(std::iter::repeat('0'));
    let first = digits.next().unwrap_or('0');
    let second = digits.next().unwrap_or('0');

    if second == '0' {
        format!("{integer}.{first}")
    } else {
        format!("{integer}.{first}{second}")
    }
}
