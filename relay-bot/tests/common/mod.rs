//! Shared test doubles: a recording [`mock_bot::MockBot`] and a scripted [`mock_provider::MockProvider`].

#![allow(dead_code)]

pub mod mock_bot;
pub mod mock_provider;

use mock_bot::EditRecord;
use std::time::Duration;
use tokio::sync::mpsc;

/// Receives edits until one satisfies `pred`; panics after 5s.
pub async fn wait_for_edit<F>(rx: &mut mpsc::UnboundedReceiver<EditRecord>, pred: F) -> EditRecord
where
    F: Fn(&EditRecord) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let record = rx.recv().await.expect("edit channel closed");
            if pred(&record) {
                return record;
            }
        }
    })
    .await
    .expect("timed out waiting for edit")
}

/// Every edit currently queued in the channel.
pub fn drain_edits(rx: &mut mpsc::UnboundedReceiver<EditRecord>) -> Vec<EditRecord> {
    let mut edits = Vec::new();
    while let Ok(record) = rx.try_recv() {
        edits.push(record);
    }
    edits
}
