use std::sync::Arc;

use crate::error::RelayError;
use crate::notification::Notification;
use crate::provider::{PaymentProvider, Resolution, StatusChange};
use crate::store::PurchaseStore;

/// Result of handling one notification. Every variant is acknowledged to the
/// provider as delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// Nothing to correlate with a purchase; the store was not touched.
    Ignored(&'static str),
    /// The purchase status was written.
    Updated(StatusChange),
    /// The write failed. Logged only, never retried.
    StoreFailed(StatusChange),
}

/// Applies provider notifications to purchase records.
///
/// Each notification results in at most one store update. There is no replay
/// or ordering guard: a later notification overwrites an earlier status.
#[derive(Clone)]
pub struct ConfirmationHandler {
    provider: Arc<dyn PaymentProvider>,
    store: Arc<dyn PurchaseStore>,
}

impl ConfirmationHandler {
    pub fn new(provider: Arc<dyn PaymentProvider>, store: Arc<dyn PurchaseStore>) -> Self {
        Self { provider, store }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Resolve `notification` and apply it.
    ///
    /// Only provider-side failures (e.g. a failed merchant order lookup) are
    /// returned as errors. Store failures are reported as
    /// [`ConfirmationOutcome::StoreFailed`].
    pub async fn handle(
        &self,
        notification: &Notification,
    ) -> Result<ConfirmationOutcome, RelayError> {
        let change = match self.provider.resolve_notification(notification).await? {
            Resolution::Apply(change) => change,
            Resolution::Ignore(reason) => {
                tracing::info!(
                    provider = self.provider.name(),
                    reason,
                    "notification acknowledged without update"
                );
                return Ok(ConfirmationOutcome::Ignored(reason));
            }
        };

        match self
            .store
            .update_status(&change.purchase_id, &change.status)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    provider = self.provider.name(),
                    purchase_id = %change.purchase_id,
                    status = %change.status,
                    "purchase status updated"
                );
                Ok(ConfirmationOutcome::Updated(change))
            }
            Err(e) => {
                tracing::error!(
                    provider = self.provider.name(),
                    purchase_id = %change.purchase_id,
                    status = %change.status,
                    error = %e,
                    "failed to update purchase status"
                );
                Ok(ConfirmationOutcome::StoreFailed(change))
            }
        }
    }
}
