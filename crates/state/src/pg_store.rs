use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::models::Domain;
use crate::store::DomainStore;
use beacon_common::error::{BeaconError, BeaconResult};

/// Postgres-backed domain store. The whole domain (accounts, tokens,
/// watermarks) is one jsonb payload per row, keyed by domain id.
#[derive(Clone)]
pub struct PgDomainStore {
    pool: PgPool,
}

impl PgDomainStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DomainStore for PgDomainStore {
    async fn load(&self) -> BeaconResult<Domain> {
        let payload: serde_json::Value =
            sqlx::query_scalar("select payload from domains order by updated_at desc limit 1")
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| BeaconError::Storage(e.to_string()))?
                .ok_or_else(|| BeaconError::Storage("no domain configured".to_string()))?;

        serde_json::from_value(payload).map_err(|e| BeaconError::Storage(e.to_string()))
    }

    async fn save(&self, domain: &Domain) -> BeaconResult<()> {
        let payload =
            serde_json::to_value(domain).map_err(|e| BeaconError::Storage(e.to_string()))?;

        sqlx::query(
            "insert into domains (id, payload, updated_at)
             values ($1, $2, $3)
             on conflict (id) do update set payload = $2, updated_at = $3",
        )
        .bind(domain.id)
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| BeaconError::Storage(e.to_string()))?;

        Ok(())
    }
}
