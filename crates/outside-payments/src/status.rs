use serde::{Deserialize, Serialize};
use std::fmt;

/// Internal purchase status.
///
/// Provider codes that do not map to a known status become
/// [`InternalStatus::Unknown`]; mapping never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InternalStatus {
    Completed,
    Declined,
    Expired,
    Pending,
    Unknown,
}

impl InternalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InternalStatus::Completed => "completed",
            InternalStatus::Declined => "declined",
            InternalStatus::Expired => "expired",
            InternalStatus::Pending => "pending",
            InternalStatus::Unknown => "unknown",
        }
    }

    /// Map a PayU `state_pol` code.
    ///
    /// `4` approved, `6` declined, `5` expired, `7` pending. Everything else,
    /// including surrounding whitespace or an empty code, is `Unknown`.
    pub fn from_payu_state(code: &str) -> Self {
        match code {
            "4" => InternalStatus::Completed,
            "6" => InternalStatus::Declined,
            "5" => InternalStatus::Expired,
            "7" => InternalStatus::Pending,
            _ => InternalStatus::Unknown,
        }
    }
}

impl fmt::Display for InternalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status value written to a purchase record.
///
/// PayU confirmations always produce an [`InternalStatus`]. MercadoPago only
/// translates `approved`; its other payment statuses are stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    Internal(InternalStatus),
    Passthrough(String),
}

impl StatusUpdate {
    /// Map a MercadoPago payment status.
    pub fn from_mercadopago(status: &str) -> Self {
        match status {
            "approved" => StatusUpdate::Internal(InternalStatus::Completed),
            other => StatusUpdate::Passthrough(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StatusUpdate::Internal(status) => status.as_str(),
            StatusUpdate::Passthrough(raw) => raw,
        }
    }
}

impl From<InternalStatus> for StatusUpdate {
    fn from(status: InternalStatus) -> Self {
        StatusUpdate::Internal(status)
    }
}

impl fmt::Display for StatusUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
