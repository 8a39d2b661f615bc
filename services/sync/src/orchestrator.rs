use std::sync::Arc;

use crate::buffer::ActionBuffer;
use crate::hubspot::client::HubSpotClient;
use crate::pager::sync_entity;
use crate::session::{RetryPolicy, Session};
use crate::sink::ActionSink;
use crate::transform::ENTITIES;
use beacon_state::models::Domain;
use beacon_state::store::DomainStore;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub policy: RetryPolicy,
    pub flush_threshold: usize,
    pub max_in_flight: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::default(),
            flush_threshold: 2000,
            max_in_flight: 4,
        }
    }
}

#[derive(Debug)]
pub struct SyncReport {
    pub hub_id: i64,
    pub events: usize,
    pub failed_entities: usize,
}

/// Run one full sync pass over every account in the domain. Accounts are
/// processed sequentially; a failing entity type or account is logged and
/// skipped, never aborting the run. State is persisted after each completed
/// entity type and again after each account.
pub async fn run_sync(
    domain: &mut Domain,
    client: &HubSpotClient,
    store: &dyn DomainStore,
    sink: Arc<dyn ActionSink>,
    options: &SyncOptions,
) -> Vec<SyncReport> {
    let api_key = domain.api_key.clone();
    let mut reports = Vec::new();

    for idx in 0..domain.accounts.len() {
        let hub_id = domain.accounts[idx].hub_id;
        tracing::info!(api_key = %api_key, hub_id, "start processing account");

        let mut session = Session::new(options.policy.clone());
        if let Err(e) = session.refresh(client, &mut domain.accounts[idx]).await {
            // The session starts expired, so the retry path gets another shot
            // at refreshing before any entity is given up on.
            tracing::error!(api_key = %api_key, hub_id, error = %e, "initial token refresh failed");
        }

        let mut buffer =
            ActionBuffer::new(Arc::clone(&sink), options.flush_threshold, options.max_in_flight);
        let mut events = 0usize;
        let mut failed_entities = 0usize;

        for entity in &ENTITIES {
            match sync_entity(
                client,
                &mut session,
                &mut domain.accounts[idx],
                entity,
                &mut buffer,
            )
            .await
            {
                Ok(emitted) => {
                    events += emitted;
                    if let Err(e) = store.save(domain).await {
                        tracing::error!(
                            api_key = %api_key,
                            hub_id,
                            entity = entity.name,
                            error = %e,
                            "failed to persist state"
                        );
                    }
                }
                Err(e) => {
                    failed_entities += 1;
                    tracing::error!(
                        api_key = %api_key,
                        hub_id,
                        entity = entity.name,
                        error = %e,
                        "entity sync failed"
                    );
                }
            }
        }

        if let Err(e) = buffer.drain().await {
            tracing::error!(api_key = %api_key, hub_id, error = %e, "failed to drain action buffer");
        }

        if let Err(e) = store.save(domain).await {
            tracing::error!(api_key = %api_key, hub_id, error = %e, "failed to persist state");
        }

        let report = SyncReport {
            hub_id,
            events,
            failed_entities,
        };
        tracing::info!(api_key = %api_key, ?report, "finished processing account");
        reports.push(report);
    }

    reports
}
