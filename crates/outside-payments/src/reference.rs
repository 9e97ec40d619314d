//! Reference codes embed the purchase id behind [`REFERENCE_PREFIX`].

use crate::constants::REFERENCE_PREFIX;

/// Build the reference code for a purchase id.
pub fn reference_for(purchase_id: &str) -> String {
    format!("{REFERENCE_PREFIX}{purchase_id}")
}

/// Recover the purchase id from a reference code.
///
/// A reference without the prefix is taken as the id itself. Returns `None`
/// when nothing is left after stripping.
pub fn purchase_id_from_reference(reference: &str) -> Option<String> {
    let id = reference.strip_prefix(REFERENCE_PREFIX).unwrap_or(reference);
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}
