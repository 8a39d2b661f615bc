use chrono::Utc;

use crate::buffer::ActionBuffer;
use crate::hubspot::client::HubSpotClient;
use crate::hubspot::models::SearchRequest;
use crate::session::{Session, SyncError};
use crate::transform::{
    transform_company, transform_contact, transform_meeting, EntityDescriptor, EntityKind,
};
use beacon_state::models::Account;

pub const PAGE_LIMIT: u32 = 100;

/// The search API refuses to page past this offset. Reaching it forces a
/// restart from a narrower date window.
pub const CURSOR_CEILING: u64 = 9900;

/// Drain one entity collection for one account: fetch pages in order,
/// transform and buffer each record, roll the date window over when the
/// cursor ceiling is hit, and advance the watermark to the sync start time
/// only after the collection is exhausted.
///
/// Returns the number of action events emitted.
pub async fn sync_entity(
    client: &HubSpotClient,
    session: &mut Session,
    account: &mut Account,
    entity: &EntityDescriptor,
    buffer: &mut ActionBuffer,
) -> Result<usize, SyncError> {
    let run_started = Utc::now();
    let watermark = account.watermark(entity.name);

    let mut window_start = watermark;
    let mut after: Option<u64> = None;
    let mut emitted = 0usize;

    tracing::info!(
        hub_id = account.hub_id,
        entity = entity.name,
        watermark = ?watermark,
        "start entity sync"
    );

    loop {
        let request = SearchRequest::new(
            entity.last_modified_property,
            entity.properties,
            window_start.map(|start| (start, run_started)),
            after,
            PAGE_LIMIT,
        );

        let object = entity.name;
        let page = session
            .with_retry(client, account, |token| {
                let client = client.clone();
                let request = request.clone();
                async move { client.search(&token, object, &request).await }
            })
            .await?;

        tracing::info!(
            entity = entity.name,
            count = page.results.len(),
            "fetched page"
        );

        for record in &page.results {
            match entity.kind {
                EntityKind::Contact => {
                    if let Some(event) = transform_contact(record, watermark) {
                        buffer.push(event).await;
                        emitted += 1;
                    }
                }
                EntityKind::Company => {
                    if let Some(event) = transform_company(record, watermark) {
                        buffer.push(event).await;
                        emitted += 1;
                    }
                }
                EntityKind::Meeting => {
                    let attendees = match client
                        .fetch_meeting_attendees(session.access_token(), &record.id)
                        .await
                    {
                        Ok(attendees) => attendees,
                        Err(e) => {
                            tracing::warn!(
                                meeting_id = %record.id,
                                error = %e,
                                "attendee lookup failed, treating as no attendees"
                            );
                            Vec::new()
                        }
                    };
                    for event in transform_meeting(record, watermark, &attendees) {
                        buffer.push(event).await;
                        emitted += 1;
                    }
                }
            }
        }

        match page.next_after() {
            None => break,
            Some(next) if next >= CURSOR_CEILING => {
                after = None;
                window_start = page.results.last().map(|r| r.updated_at).or(window_start);
                tracing::info!(
                    entity = entity.name,
                    "cursor ceiling reached, narrowing date window"
                );
            }
            Some(next) => after = Some(next),
        }
    }

    // Watermark moves to the sync start, not the last record: anything
    // modified while we were paging stays inside the next run's window.
    account.set_watermark(entity.name, run_started);

    tracing::info!(
        hub_id = account.hub_id,
        entity = entity.name,
        emitted,
        "entity sync complete"
    );
    Ok(emitted)
}
