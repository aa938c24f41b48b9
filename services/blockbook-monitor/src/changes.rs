//! Field-level change detection between consecutive reports

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::status::StatusReport;

/// A displayed attribute of a server card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangedField {
    Status,
    Coin,
    BlockHeight,
    Synchronized,
    MempoolSync,
    LastBlock,
    LastMempool,
    Version,
}

impl ChangedField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangedField::Status => "status",
            ChangedField::Coin => "coin",
            ChangedField::BlockHeight => "block-height",
            ChangedField::Synchronized => "synchronized",
            ChangedField::MempoolSync => "mempool-sync",
            ChangedField::LastBlock => "last-block",
            ChangedField::LastMempool => "last-mempool",
            ChangedField::Version => "version",
        }
    }
}

impl fmt::Display for ChangedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields that differ between two reports, in canonical order
pub type ChangedFieldSet = Vec<ChangedField>;

/// Compare the previous report of a server with the current one.
///
/// Returns `None` on the first observation (no previous report), meaning
/// every field should be treated as changed. Returns an empty set when the
/// server was polled but nothing visible changed.
pub fn diff(previous: Option<&StatusReport>, current: &StatusReport) -> Option<ChangedFieldSet> {
    let previous = previous?;
    let old = &previous.blockbook;
    let new = &current.blockbook;

    let checks = [
        (ChangedField::Status, previous.status != current.status),
        (
            ChangedField::BlockHeight,
            previous.block_height() != current.block_height(),
        ),
        (ChangedField::Synchronized, old.in_sync != new.in_sync),
        (
            ChangedField::MempoolSync,
            old.in_sync_mempool != new.in_sync_mempool,
        ),
        (
            ChangedField::LastBlock,
            old.last_block_time != new.last_block_time,
        ),
        (
            ChangedField::LastMempool,
            old.last_mempool_time != new.last_mempool_time,
        ),
        (ChangedField::Version, old.version != new.version),
        (ChangedField::Coin, old.coin != new.coin),
    ];

    Some(
        checks
            .into_iter()
            .filter_map(|(field, changed)| changed.then_some(field))
            .collect(),
    )
}
