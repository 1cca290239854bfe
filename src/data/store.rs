//! Normalized store: keyed tables of ship/equipment instances and templates plus fleet rosters.
//! Updated incrementally (full upserts or partial patches) and read as a snapshot by the
//! aggregation code, which never writes back into it.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::data::equipment::{EquipmentInstance, EquipmentTemplate};
use crate::data::fleet::{CombinedFleetType, FleetRoster};
use crate::data::ship::{ShipInstance, ShipTemplate};

/// Records stored in a [Table] expose their own key.
pub trait Keyed {
    fn key(&self) -> i64;
}

impl Keyed for ShipInstance {
    fn key(&self) -> i64 {
        self.id
    }
}

impl Keyed for ShipTemplate {
    fn key(&self) -> i64 {
        self.id
    }
}

impl Keyed for EquipmentInstance {
    fn key(&self) -> i64 {
        self.id
    }
}

impl Keyed for EquipmentTemplate {
    fn key(&self) -> i64 {
        self.id
    }
}

impl Keyed for FleetRoster {
    fn key(&self) -> i64 {
        self.id
    }
}

/// Id-keyed mapping with point lookup and ordered enumeration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<T>", into = "Vec<T>")]
#[serde(bound(
    serialize = "T: Serialize + Clone + Keyed",
    deserialize = "T: Deserialize<'de> + Keyed"
))]
pub struct Table<T> {
    rows: BTreeMap<i64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<T: Keyed> Table<T> {
    pub fn get(&self, id: i64) -> Option<&T> {
        self.rows.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.rows.contains_key(&id)
    }

    /// Insert or replace by key.
    pub fn upsert(&mut self, record: T) {
        self.rows.insert(record.key(), record);
    }

    pub fn remove(&mut self, id: i64) -> Option<T> {
        self.rows.remove(&id)
    }

    fn get_mut(&mut self, id: i64) -> Option<&mut T> {
        self.rows.get_mut(&id)
    }
}

impl<T: Keyed> From<Vec<T>> for Table<T> {
    fn from(records: Vec<T>) -> Self {
        let mut table = Table::default();
        for record in records {
            table.upsert(record);
        }
        table
    }
}

impl<T: Keyed + Clone> From<Table<T>> for Vec<T> {
    fn from(table: Table<T>) -> Self {
        table.rows.into_values().collect()
    }
}

impl<T: Keyed> FromIterator<T> for Table<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut table = Table::default();
        for record in iter {
            table.upsert(record);
        }
        table
    }
}

/// One land-based air squadron slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirSquadron {
    pub slot_id: i64,
    /// Equipment instance id; <= 0 when the slot is empty.
    pub equipment_id: i64,
    #[serde(default)]
    pub aircraft: i64,
}

/// Land-based air corps stationed in one map area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirBase {
    pub area_id: i64,
    pub base_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub squadrons: Vec<AirSquadron>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizedStore {
    pub ships: Table<ShipInstance>,
    pub ship_templates: Table<ShipTemplate>,
    pub equipment: Table<EquipmentInstance>,
    pub equipment_templates: Table<EquipmentTemplate>,
    pub fleets: Table<FleetRoster>,
    pub combined: CombinedFleetType,
    pub air_bases: Vec<AirBase>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot i/o failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{table} patch for id {id} does not produce a valid record: {source}")]
    Patch {
        table: &'static str,
        id: i64,
        #[source]
        source: serde_json::Error,
    },
}

/// Incremental store mutation as delivered by the sync feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreUpdate {
    Ships { records: Vec<ShipInstance> },
    ShipPatch { id: i64, fields: Map<String, Value> },
    ShipTemplates { records: Vec<ShipTemplate> },
    Equipment { records: Vec<EquipmentInstance> },
    EquipmentRemoved { ids: Vec<i64> },
    EquipmentTemplates { records: Vec<EquipmentTemplate> },
    Fleets { records: Vec<FleetRoster> },
    FleetPatch { id: i64, fields: Map<String, Value> },
    CombinedFlag { value: CombinedFleetType },
    AirBases { records: Vec<AirBase> },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub accepted: usize,
    pub ignored: usize,
}

impl ApplyReport {
    fn merge(&mut self, other: ApplyReport) {
        self.accepted += other.accepted;
        self.ignored += other.ignored;
    }
}

impl NormalizedStore {
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        let mut store: Self = serde_json::from_str(json)?;
        store.sort_air_bases();
        Ok(store)
    }

    /// Keep air bases in (area, base) order and each base's squadrons in slot order.
    fn sort_air_bases(&mut self) {
        self.air_bases.sort_by_key(|b| (b.area_id, b.base_id));
        for base in &mut self.air_bases {
            base.squadrons.sort_by_key(|s| s.slot_id);
        }
    }

    /// Apply a batch of updates in order. Bad patches are skipped and counted, never fatal.
    pub fn apply_all<I>(&mut self, updates: I) -> ApplyReport
    where
        I: IntoIterator<Item = StoreUpdate>,
    {
        let mut report = ApplyReport::default();
        for update in updates {
            report.merge(self.apply(update));
        }
        tracing::debug!(
            target: "fleetview::store",
            accepted = report.accepted,
            ignored = report.ignored,
            "store.update.batch"
        );
        report
    }

    pub fn apply(&mut self, update: StoreUpdate) -> ApplyReport {
        match update {
            StoreUpdate::Ships { records } => upsert_all(&mut self.ships, records),
            StoreUpdate::ShipPatch { id, fields } => {
                patch_one(&mut self.ships, "ship", id, &fields)
            }
            StoreUpdate::ShipTemplates { records } => {
                upsert_all(&mut self.ship_templates, records)
            }
            StoreUpdate::Equipment { records } => upsert_all(&mut self.equipment, records),
            StoreUpdate::EquipmentRemoved { ids } => {
                let mut report = ApplyReport::default();
                for id in ids {
                    if self.equipment.remove(id).is_some() {
                        report.accepted += 1;
                    } else {
                        report.ignored += 1;
                    }
                }
                report
            }
            StoreUpdate::EquipmentTemplates { records } => {
                upsert_all(&mut self.equipment_templates, records)
            }
            StoreUpdate::Fleets { records } => upsert_all(&mut self.fleets, records),
            StoreUpdate::FleetPatch { id, fields } => {
                patch_one(&mut self.fleets, "fleet", id, &fields)
            }
            StoreUpdate::CombinedFlag { value } => {
                self.combined = value;
                ApplyReport {
                    accepted: 1,
                    ignored: 0,
                }
            }
            StoreUpdate::AirBases { records } => {
                let accepted = records.len();
                for base in records {
                    match self
                        .air_bases
                        .iter_mut()
                        .find(|b| b.area_id == base.area_id && b.base_id == base.base_id)
                    {
                        Some(existing) => *existing = base,
                        None => self.air_bases.push(base),
                    }
                }
                self.sort_air_bases();
                ApplyReport {
                    accepted,
                    ignored: 0,
                }
            }
        }
    }

    /// Air bases stationed in `area_id`, in base order.
    pub fn air_bases_in(&self, area_id: i64) -> impl Iterator<Item = &AirBase> {
        self.air_bases.iter().filter(move |b| b.area_id == area_id)
    }
}

fn upsert_all<T: Keyed>(table: &mut Table<T>, records: Vec<T>) -> ApplyReport {
    let accepted = records.len();
    for record in records {
        table.upsert(record);
    }
    ApplyReport {
        accepted,
        ignored: 0,
    }
}

fn patch_one<T>(table: &mut Table<T>, name: &'static str, id: i64, fields: &Map<String, Value>) -> ApplyReport
where
    T: Keyed + Serialize + DeserializeOwned,
{
    let ignored = ApplyReport {
        accepted: 0,
        ignored: 1,
    };
    let Some(existing) = table.get_mut(id) else {
        tracing::debug!(target: "fleetview::store", table = name, id, "store.patch.unknown_id");
        return ignored;
    };
    match merge_fields(existing, fields).map_err(|source| StoreError::Patch {
        table: name,
        id,
        source,
    }) {
        Ok(patched) => {
            *existing = patched;
            ApplyReport {
                accepted: 1,
                ignored: 0,
            }
        }
        Err(err) => {
            tracing::warn!(target: "fleetview::store", error = %err, "store.patch.rejected");
            ignored
        }
    }
}

/// Overlay `fields` onto the JSON form of `record`. The id field is never overwritten.
fn merge_fields<T>(record: &T, fields: &Map<String, Value>) -> Result<T, serde_json::Error>
where
    T: Serialize + DeserializeOwned,
{
    let mut value = serde_json::to_value(record)?;
    if let Value::Object(object) = &mut value {
        for (key, field) in fields {
            if key == "id" {
                continue;
            }
            object.insert(key.clone(), field.clone());
        }
    }
    serde_json::from_value(value)
}
