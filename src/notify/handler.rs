//! Event batch rendering.
//!
//! Turns each [`EventBatch`] pushed by the chain client into console lines:
//!
//! ```text
//!
//! Received 2 events:
//! Balances:Transfer:: ( phase= ApplyExtrinsic(1) )
//! 		AccountId32: 5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY
//!
//! System:ExtrinsicSuccess:: ( phase= ApplyExtrinsic(1) )
//! ```
//!
//! Malformed fields and records are rendered as placeholders so one bad
//! event never ends the subscription.

use std::io::{self, Write};

use crate::chain::types::{EventBatch, EventRecord};

/// Header line printed before the records of a batch.
pub fn batch_header(count: usize) -> String {
    format!("\nReceived {} events:", count)
}

/// Render one record into its console lines.
///
/// Pure: the same record always yields the same lines.
pub fn format_record(record: &EventRecord) -> Vec<String> {
    let mut lines = Vec::with_capacity(record.fields.len() + 1);
    lines.push(format!(
        "{}:{}:: ( phase= {} )",
        record.section, record.method, record.phase
    ));
    for field in &record.fields {
        let value = match &field.value {
            Ok(value) => value.clone(),
            Err(reason) => format!("<undecodable: {}>", reason),
        };
        lines.push(format!("\t\t{}: {}\n", field.type_name, value));
    }
    lines
}

/// Render a whole batch, header first, records in delivery order.
pub fn format_batch(batch: &EventBatch) -> Vec<String> {
    let mut lines = vec![batch_header(batch.len())];
    for slot in &batch.records {
        match slot {
            Ok(record) => lines.extend(format_record(record)),
            Err(reason) => lines.push(format!("<undecodable event: {}>", reason)),
        }
    }
    lines
}

/// Writes rendered batches to an output sink.
pub struct NotificationHandler<W: Write> {
    out: W,
    batches: u64,
    records: u64,
    malformed: u64,
}

impl<W: Write> NotificationHandler<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            batches: 0,
            records: 0,
            malformed: 0,
        }
    }

    /// Print one batch.
    ///
    /// Only a failing output sink is an error; malformed event data is
    /// logged and rendered as a placeholder.
    pub fn handle(&mut self, batch: &EventBatch) -> io::Result<()> {
        for slot in &batch.records {
            match slot {
                Ok(record) => {
                    for field in &record.fields {
                        if let Err(reason) = &field.value {
                            self.malformed += 1;
                            tracing::warn!(
                                block = batch.block_number,
                                event = %format!("{}:{}", record.section, record.method),
                                field_type = %field.type_name,
                                reason = %reason,
                                "Skipping undecodable event field"
                            );
                        }
                    }
                }
                Err(reason) => {
                    self.malformed += 1;
                    tracing::warn!(
                        block = batch.block_number,
                        reason = %reason,
                        "Skipping undecodable event"
                    );
                }
            }
        }

        for line in format_batch(batch) {
            writeln!(self.out, "{}", line)?;
        }
        self.out.flush()?;

        self.batches += 1;
        self.records += batch.len() as u64;
        tracing::debug!(
            block = batch.block_number,
            hash = %batch.block_hash,
            events = batch.len(),
            "Rendered event batch"
        );
        Ok(())
    }

    /// (batches, records, malformed items) seen so far.
    pub fn stats(&self) -> (u64, u64, u64) {
        (self.batches, self.records, self.malformed)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
