use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::sink::{ActionSink, SinkError};
use crate::transform::ActionEvent;

/// Order-preserving accumulator of action events. Crossing the threshold
/// snapshots the buffer and submits it asynchronously; `drain` must be called
/// after the last push so nothing is left behind.
pub struct ActionBuffer {
    events: Vec<ActionEvent>,
    sink: Arc<dyn ActionSink>,
    threshold: usize,
    permits: Arc<Semaphore>,
    in_flight: JoinSet<()>,
}

impl ActionBuffer {
    pub fn new(sink: Arc<dyn ActionSink>, threshold: usize, max_in_flight: usize) -> Self {
        Self {
            events: Vec::new(),
            sink,
            threshold,
            permits: Arc::new(Semaphore::new(max_in_flight)),
            in_flight: JoinSet::new(),
        }
    }

    /// Append one event; flush asynchronously once the buffer exceeds the
    /// threshold. Blocks only when all flush slots are occupied.
    pub async fn push(&mut self, event: ActionEvent) {
        self.events.push(event);

        if self.events.len() > self.threshold {
            let batch = std::mem::take(&mut self.events);
            self.spawn_flush(batch).await;
        }
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }

    async fn spawn_flush(&mut self, batch: Vec<ActionEvent>) {
        // The semaphore is never closed, so acquisition only fails if the
        // buffer itself is gone.
        let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
            return;
        };

        let sink = Arc::clone(&self.sink);
        let count = batch.len();
        tracing::info!(count, "submitting action batch");

        self.in_flight.spawn(async move {
            let _permit = permit;
            if let Err(e) = sink.submit_batch(batch).await {
                tracing::error!(count, error = %e, "action batch submission failed");
            }
        });
    }

    /// Wait for every in-flight submission, then submit whatever remains
    /// below the threshold.
    pub async fn drain(&mut self) -> Result<(), SinkError> {
        while let Some(joined) = self.in_flight.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "flush task failed to join");
            }
        }

        if !self.events.is_empty() {
            let batch = std::mem::take(&mut self.events);
            tracing::info!(count = batch.len(), "submitting final action batch");
            self.sink.submit_batch(batch).await?;
        }

        Ok(())
    }
}
