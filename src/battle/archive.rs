//! In-memory archive of received battles, keyed by encounter id.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::battle::record::BattleRecord;

pub const DEFAULT_ARCHIVE_CAPACITY: usize = 200;

#[derive(Debug, Clone)]
pub struct ArchivedBattle {
    pub received_at: DateTime<Utc>,
    pub record: BattleRecord,
}

/// Listing entry for one archived battle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveEntry {
    pub id: String,
    pub received_at: DateTime<Utc>,
    pub area_id: i64,
    pub map_id: i64,
    pub cell_id: i64,
    pub night: bool,
}

#[derive(Debug, Clone)]
pub struct BattleArchive {
    capacity: usize,
    /// Ids in receipt order, oldest first.
    order: VecDeque<String>,
    battles: BTreeMap<String, ArchivedBattle>,
}

impl Default for BattleArchive {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_ARCHIVE_CAPACITY)
    }
}

impl BattleArchive {
    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            battles: BTreeMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.battles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.battles.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&BattleRecord> {
        self.battles.get(id).map(|archived| &archived.record)
    }

    /// Store a battle received now.
    pub fn insert(&mut self, record: BattleRecord) -> Option<BattleRecord> {
        self.insert_at(record, Utc::now())
    }

    /// Store a battle with an explicit receipt time. Re-delivery of a known id replaces the
    /// stored record and moves it to the newest position. Returns the evicted or replaced
    /// record, if any.
    pub fn insert_at(&mut self, record: BattleRecord, received_at: DateTime<Utc>) -> Option<BattleRecord> {
        let id = record.id.clone();
        let replaced = self.battles.remove(&id).map(|old| {
            self.order.retain(|known| known != &id);
            old.record
        });

        self.order.push_back(id.clone());
        self.battles.insert(id.clone(), ArchivedBattle { received_at, record });

        let evicted = if self.order.len() > self.capacity {
            self.order
                .pop_front()
                .and_then(|oldest| self.battles.remove(&oldest))
                .map(|old| old.record)
        } else {
            None
        };

        tracing::debug!(
            target: "fleetview::battle",
            battle_id = %id,
            replaced = replaced.is_some(),
            evicted = evicted.as_ref().map(|r| r.id.as_str()),
            size = self.battles.len(),
            "battle.archive.inserted"
        );
        replaced.or(evicted)
    }

    /// Entries newest first.
    pub fn list(&self) -> Vec<ArchiveEntry> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.battles.get(id))
            .map(|archived| ArchiveEntry {
                id: archived.record.id.clone(),
                received_at: archived.received_at,
                area_id: archived.record.area_id,
                map_id: archived.record.map_id,
                cell_id: archived.record.cell_id,
                night: archived.record.night.is_some(),
            })
            .collect()
    }
}
