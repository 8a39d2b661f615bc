use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One connected CRM portal: its OAuth token pair plus the per-entity
/// watermarks recording the last fully-synced point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub hub_id: i64,
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub last_pulled_dates: HashMap<String, DateTime<Utc>>,
}

impl Account {
    /// Watermark for one entity type, if a sync has ever completed for it.
    pub fn watermark(&self, entity: &str) -> Option<DateTime<Utc>> {
        self.last_pulled_dates.get(entity).copied()
    }

    /// Advance the watermark for one entity type. Callers must only do this
    /// once that entity's pagination has fully drained.
    pub fn set_watermark(&mut self, entity: &str, at: DateTime<Utc>) {
        self.last_pulled_dates.insert(entity.to_string(), at);
    }
}

/// Tenant-level container: the accounts to sync plus the API key used for
/// log attribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: Uuid,
    pub api_key: String,
    pub accounts: Vec<Account>,
}
