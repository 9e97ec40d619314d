//! Inbound purchase payloads.
//!
//! Payloads arrive as loose JSON from the storefront. A field counts as
//! present only when it is set and truthy: `null`, `""`, `0` and `false` are
//! reported as missing.

use serde_json::{Number, Value};

use crate::error::ValidationError;

/// Required fields shared by the minimal PayU checkout and MercadoPago.
pub const BASE_REQUIRED_FIELDS: &[&str] = &["total", "referenceCode", "buyerEmail"];

/// Required fields of the PayU checkout that carries buyer and payer identity.
pub const IDENTITY_REQUIRED_FIELDS: &[&str] = &[
    "total",
    "referenceCode",
    "description",
    "buyerFullName",
    "buyerEmail",
    "buyerPhone",
    "buyerDocumentType",
    "buyerDocument",
    "payerFullName",
    "payerEmail",
    "payerPhone",
    "payerDocumentType",
    "payerDocument",
];

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Fields from `required` that are absent or falsy in `body`, in declaration order.
pub fn missing_fields(body: &Value, required: &[&'static str]) -> Vec<&'static str> {
    required
        .iter()
        .copied()
        .filter(|name| !body.get(*name).map(is_truthy).unwrap_or(false))
        .collect()
}

/// Fail with a [`ValidationError`] naming every missing field.
pub fn require_fields(body: &Value, required: &[&'static str]) -> Result<(), ValidationError> {
    let missing = missing_fields(body, required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { missing })
    }
}

/// Largest integer an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Render a JSON number the way a storefront's template string would:
/// integral floats lose their fraction (`10000.0` -> `10000`).
pub(crate) fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}

/// Text of a scalar field. Strings are returned verbatim, numbers as
/// [`number_text`] renders them (`10000`, `10000.5`). Falsy values are
/// treated as absent.
pub fn field_text(body: &Value, name: &str) -> Option<String> {
    let value = body.get(name).filter(|v| is_truthy(v))?;
    Some(match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_text(n),
        other => other.to_string(),
    })
}

/// Identity of the buyer or payer of a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Party {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub document_type: String,
    pub document: String,
}

impl Party {
    /// Read `<role>FullName`, `<role>Email`, `<role>Phone`,
    /// `<role>DocumentType` and `<role>Document`. All five must be present.
    fn from_body(body: &Value, role: &str) -> Option<Self> {
        let field = |suffix: &str| field_text(body, &format!("{role}{suffix}"));
        Some(Self {
            full_name: field("FullName")?,
            email: field("Email")?,
            phone: field("Phone")?,
            document_type: field("DocumentType")?,
            document: field("Document")?,
        })
    }
}

/// A validated purchase request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRequest {
    /// Amount in COP, exactly as the client sent it.
    pub total: String,
    pub reference_code: String,
    pub buyer_email: String,
    pub description: Option<String>,
    pub buyer: Option<Party>,
    pub payer: Option<Party>,
}

impl PurchaseRequest {
    /// Validate `body` against `required` and extract the request.
    ///
    /// `required` must include the base fields; the identity bundles are
    /// picked up whenever they are complete.
    pub fn from_json(body: &Value, required: &[&'static str]) -> Result<Self, ValidationError> {
        require_fields(body, required)?;
        // Base fields are checked even when a provider forgets to list them.
        require_fields(body, BASE_REQUIRED_FIELDS)?;

        let text = |name: &str| field_text(body, name).unwrap_or_default();
        Ok(Self {
            total: text("total"),
            reference_code: text("referenceCode"),
            buyer_email: text("buyerEmail"),
            description: field_text(body, "description"),
            buyer: Party::from_body(body, "buyer"),
            payer: Party::from_body(body, "payer"),
        })
    }

    /// `total` as a number, for APIs that take a numeric price.
    pub fn total_amount(&self) -> Option<f64> {
        self.total
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|amount| amount.is_finite())
    }
}
