//! Bucket expiration configuration.

use crate::store::{ExpirationRule, ObjectStore, StoreError};
use std::sync::Arc;
use tracing::info;

/// Ensures the destination bucket expires uploaded frames after the
/// retention window. Safe to call every cycle; the underlying write
/// happens at most once per process lifetime.
pub struct LifecycleConfigurator<S> {
    store: Arc<S>,
    rule: ExpirationRule,
    retention_days: i32,
    configured: bool,
}

impl<S: ObjectStore> LifecycleConfigurator<S> {
    pub fn new(store: Arc<S>, folder: &str, retention_days: i32) -> Self {
        Self {
            store,
            rule: ExpirationRule {
                id: format!("ttl-{retention_days}-days"),
                prefix: folder.to_string(),
                days: retention_days,
            },
            retention_days,
            configured: false,
        }
    }

    /// Install the expiration rule if it has not been installed yet.
    ///
    /// Returns immediately when the rule is already in place or when
    /// retention is disabled (<= 0 days). A failed write leaves the
    /// flag unset so the next cycle tries again.
    pub async fn ensure(&mut self) -> Result<(), StoreError> {
        if self.configured || self.retention_days <= 0 {
            return Ok(());
        }

        self.store.put_expiration_rule(&self.rule).await?;
        self.configured = true;

        info!(
            rule = %self.rule.id,
            prefix = %self.rule.prefix,
            days = self.retention_days,
            "bucket expiration rule configured"
        );

        Ok(())
    }
}
