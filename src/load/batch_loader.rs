use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::load::sink::SinkClient;
use crate::load::staged_reader::StagedReader;
use crate::models::{LoadOutcome, SinkRecord};
use crate::utils::constants::{BATCH_MAX_RETRIES, BATCH_RETRY_DELAY, DEFAULT_BATCH_SIZE};

/// Inserts a staged dataset into the sink in fixed-size batches.
///
/// Each batch is retried independently with a fixed delay; a batch that
/// exhausts its retries is recorded as failed and the loader moves on,
/// so a failure in batch k never blocks batches k+1..n. Batches are
/// all-or-nothing: a single bad row sacrifices its whole batch. A
/// failing batch is never bisected to rescue its good rows; this is a
/// known limitation inherited from the source system.
pub struct BatchLoader {
    batch_size: usize,
    max_retries: u32,
    retry_delay: Duration,
}

impl BatchLoader {
    pub fn new() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_retries: BATCH_MAX_RETRIES,
            retry_delay: BATCH_RETRY_DELAY,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Read, normalise and insert the staged dataset at `staged_path`.
    /// Missing or empty input is a fatal error; per-batch failures are
    /// accounted in the returned [`LoadOutcome`] instead.
    pub async fn load<S: SinkClient>(&self, sink: &S, staged_path: &Path) -> Result<LoadOutcome> {
        let rows = StagedReader::new().read(staged_path)?;
        let records: Vec<SinkRecord> = rows.into_iter().map(SinkRecord::from).collect();
        let total_rows = records.len();

        tracing::info!(
            rows = total_rows,
            batch_size = self.batch_size,
            "loading staged dataset into sink"
        );

        let mut inserted_rows = 0;
        let mut failed_batches = Vec::new();

        for (batch_index, batch) in records.chunks(self.batch_size).enumerate() {
            if self.insert_with_retries(sink, batch_index, batch).await {
                inserted_rows += batch.len();
            } else {
                failed_batches.push(batch_index);
            }
        }

        Ok(LoadOutcome {
            total_rows,
            inserted_rows,
            failed_batches,
        })
    }

    /// One initial attempt plus `max_retries` retries for a single
    /// batch. Returns whether the batch was inserted.
    async fn insert_with_retries<S: SinkClient>(
        &self,
        sink: &S,
        batch_index: usize,
        batch: &[SinkRecord],
    ) -> bool {
        let mut attempts = 0;

        loop {
            attempts += 1;
            match sink.insert_batch(batch).await {
                Ok(()) => {
                    tracing::info!(batch = batch_index, rows = batch.len(), "batch inserted");
                    return true;
                }
                Err(e) => {
                    tracing::warn!(
                        batch = batch_index,
                        attempt = attempts,
                        error = %e,
                        "batch insert failed"
                    );

                    if attempts > self.max_retries {
                        tracing::error!(
                            batch = batch_index,
                            retries = self.max_retries,
                            "batch failed after all retries"
                        );
                        return false;
                    }

                    tracing::info!(
                        batch = batch_index,
                        attempt = attempts,
                        max_retries = self.max_retries,
                        delay = ?self.retry_delay,
                        "retrying batch"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }
}

impl Default for BatchLoader {
    fn default() -> Self {
        Self::new()
    }
}
