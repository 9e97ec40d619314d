//! Purchase persistence.
//!
//! The relay never creates or reads purchases. It only sets the `status`
//! column of an existing row, identified by id.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Mutex;
use thiserror::Error;

use crate::status::StatusUpdate;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(String),

    #[error("store rejected update with {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Update-by-id contract of the purchase store.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait PurchaseStore: Send + Sync {
    /// Set the status of purchase `purchase_id`. Only the status changes.
    async fn update_status(&self, purchase_id: &str, status: &StatusUpdate)
        -> Result<(), StoreError>;
}

/// In-memory store backed by DashMap. Keeps every update in arrival order.
pub struct InMemoryPurchaseStore {
    statuses: DashMap<String, String>,
    updates: Mutex<Vec<(String, String)>>,
}

impl InMemoryPurchaseStore {
    pub fn new() -> Self {
        Self {
            statuses: DashMap::new(),
            updates: Mutex::new(Vec::new()),
        }
    }

    /// Current status of a purchase, if it was ever updated.
    pub fn status(&self, purchase_id: &str) -> Option<String> {
        self.statuses.get(purchase_id).map(|s| s.value().clone())
    }

    /// Every `(purchase_id, status)` update applied so far.
    pub fn updates(&self) -> Vec<(String, String)> {
        self.updates
            .lock()
            .map(|updates| updates.clone())
            .unwrap_or_default()
    }
}

impl Default for InMemoryPurchaseStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PurchaseStore for InMemoryPurchaseStore {
    async fn update_status(
        &self,
        purchase_id: &str,
        status: &StatusUpdate,
    ) -> Result<(), StoreError> {
        let mut updates = self
            .updates
            .lock()
            .map_err(|_| StoreError::Request("update log lock poisoned".to_string()))?;
        self.statuses
            .insert(purchase_id.to_string(), status.as_str().to_string());
        updates.push((purchase_id.to_string(), status.as_str().to_string()));
        Ok(())
    }
}

/// Supabase (PostgREST) table store.
///
/// Issues `PATCH {url}/rest/v1/{table}?id=eq.{id}` with `{"status": ...}`.
pub struct SupabaseStore {
    client: reqwest::Client,
    url: String,
    key: String,
    table: String,
}

impl std::fmt::Debug for SupabaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseStore")
            .field("url", &self.url)
            .field("key", &"[REDACTED]")
            .field("table", &self.table)
            .finish()
    }
}

impl SupabaseStore {
    pub fn new(client: reqwest::Client, url: &str, key: &str, table: &str) -> Self {
        Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            table: table.to_string(),
        }
    }

    /// Endpoint that targets exactly one purchase row.
    pub fn row_url(&self, purchase_id: &str) -> String {
        format!(
            "{}/rest/v1/{}?id=eq.{}",
            self.url,
            urlencoding::encode(&self.table),
            urlencoding::encode(purchase_id)
        )
    }
}

#[async_trait]
impl PurchaseStore for SupabaseStore {
    async fn update_status(
        &self,
        purchase_id: &str,
        status: &StatusUpdate,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .patch(self.row_url(purchase_id))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({ "status": status.as_str() }))
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let code = response.status();
        if code.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(StoreError::Rejected {
                status: code.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::InternalStatus;

    #[tokio::test]
    async fn test_in_memory_records_updates_in_order() {
        let store = InMemoryPurchaseStore::new();
        store
            .update_status("42", &InternalStatus::Completed.into())
            .await
            .unwrap();
        store
            .update_status("42", &InternalStatus::Declined.into())
            .await
            .unwrap();
        store
            .update_status("7", &StatusUpdate::Passthrough("in_process".to_string()))
            .await
            .unwrap();

        assert_eq!(store.status("42").as_deref(), Some("declined"));
        assert_eq!(store.status("7").as_deref(), Some("in_process"));
        assert!(store.status("1").is_none());
        assert_eq!(
            store.updates(),
            vec![
                ("42".to_string(), "completed".to_string()),
                ("42".to_string(), "declined".to_string()),
                ("7".to_string(), "in_process".to_string()),
            ]
        );
    }

    #[test]
    fn test_supabase_row_url() {
        let store = SupabaseStore::new(
            reqwest::Client::new(),
            "https://abc.supabase.co/",
            "service-key",
            "purchases",
        );
        assert_eq!(
            store.row_url("42"),
            "https://abc.supabase.co/rest/v1/purchases?id=eq.42"
        );
        assert_eq!(
            store.row_url("a b&c"),
            "https://abc.supabase.co/rest/v1/purchases?id=eq.a%20b%26c"
        );
    }

    #[test]
    fn test_supabase_debug_redacts_key() {
        let store = SupabaseStore::new(
            reqwest::Client::new(),
            "https://abc.supabase.co",
            "service-key",
            "purchases",
        );
        let rendered = format!("{store:?}");
        assert!(!rendered.contains("service-key"));
    }
}
