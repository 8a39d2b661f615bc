mod buffer;
mod hubspot;
mod orchestrator;
mod pager;
mod session;
mod sink;
mod transform;

use std::sync::Arc;

use beacon_config::{init_tracing, AppConfig};
use beacon_state::pg_store::PgDomainStore;
use beacon_state::store::DomainStore;

use crate::hubspot::client::{HubSpotClient, HubSpotClientConfig};
use crate::orchestrator::{run_sync, SyncOptions};
use crate::session::RetryPolicy;
use crate::sink::{ActionSink, HttpSink};

#[tokio::main]
async fn main() {
    init_tracing("info");

    let config = AppConfig::from_env().expect("configuration error");
    tracing::info!(service = "beacon-sync", "starting");

    let pool = beacon_state::create_pool(&config.database_url)
        .await
        .expect("failed to connect to database");
    let store = PgDomainStore::new(pool);

    let mut domain = store.load().await.expect("failed to load domain state");
    tracing::info!(
        api_key = %domain.api_key,
        accounts = domain.accounts.len(),
        "loaded domain"
    );

    let client = HubSpotClient::new(HubSpotClientConfig {
        base_url: config.hubspot_base_url.clone(),
        client_id: config.hubspot_client_id.clone(),
        client_secret: config.hubspot_client_secret.clone(),
        timeout_secs: config.hubspot_timeout_secs,
    })
    .expect("failed to create hubspot client");

    let sink: Arc<dyn ActionSink> = Arc::new(
        HttpSink::new(&config.sink_url, config.hubspot_timeout_secs)
            .expect("failed to create action sink"),
    );

    let options = SyncOptions {
        policy: RetryPolicy {
            max_attempts: config.max_attempts,
            base_delay_ms: config.retry_base_delay_ms,
        },
        flush_threshold: config.flush_threshold,
        max_in_flight: config.max_in_flight,
    };

    let reports = run_sync(&mut domain, &client, &store, sink, &options).await;

    for report in &reports {
        tracing::info!(
            hub_id = report.hub_id,
            events = report.events,
            failed_entities = report.failed_entities,
            "account summary"
        );
    }

    // Per-account failures are reported through logs only; the run itself
    // always exits cleanly.
    tracing::info!("sync finished");
}
