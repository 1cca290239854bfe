//! Join table builder: ship instance -> template -> equipped items (instance + template).
//!
//! Every level of the join degrades to [Lookup::Missing] instead of failing, so a consumer can
//! always render something ("Unknown") for a half-synced store.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::equipment::{EquipmentInstance, EquipmentTemplate};
use crate::data::ship::{ShipInstance, ShipTemplate};
use crate::data::store::NormalizedStore;

pub const UNKNOWN_NAME: &str = "Unknown";

/// Result of one join step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Lookup<T> {
    Found(T),
    /// The referenced record is absent. `id` is `None` when the parent join already failed
    /// and the reference itself is unknown.
    Missing { id: Option<i64> },
}

impl<T> Lookup<T> {
    pub fn from_option(value: Option<T>, id: i64) -> Self {
        match value {
            Some(found) => Self::Found(found),
            None => Self::Missing { id: Some(id) },
        }
    }

    pub fn unreachable() -> Self {
        Self::Missing { id: None }
    }

    pub fn found(&self) -> Option<&T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Missing { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum EquipSlot {
    Fixed(usize),
    Expansion,
}

/// Equipped item reference in slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotRef {
    pub slot: EquipSlot,
    pub equipment_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipJoin<'a> {
    pub ship_id: i64,
    pub ship: Lookup<&'a ShipInstance>,
    pub template: Lookup<&'a ShipTemplate>,
    /// Occupied slots in slot order, expansion slot last.
    pub slots: Vec<SlotRef>,
    /// Equipment instance id -> instance.
    pub items: BTreeMap<i64, Lookup<&'a EquipmentInstance>>,
    /// Equipment template id -> template, for every resolvable item.
    pub item_templates: BTreeMap<i64, Lookup<&'a EquipmentTemplate>>,
}

impl ShipJoin<'_> {
    pub fn display_name(&self) -> &str {
        self.template
            .found()
            .map(|t| t.name.as_str())
            .unwrap_or(UNKNOWN_NAME)
    }

    /// Template of an equipped item, when both joins resolved.
    pub fn item_template(&self, equipment_id: i64) -> Option<&EquipmentTemplate> {
        let item = self.items.get(&equipment_id)?.found()?;
        self.item_templates.get(&item.template_id)?.found().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentJoin<'a> {
    pub equipment_id: i64,
    pub item: Lookup<&'a EquipmentInstance>,
    pub template: Lookup<&'a EquipmentTemplate>,
}

impl EquipmentJoin<'_> {
    pub fn display_name(&self) -> &str {
        self.template
            .found()
            .map(|t| t.name.as_str())
            .unwrap_or(UNKNOWN_NAME)
    }
}

/// Join one ship id against the store.
pub fn join_ship(store: &NormalizedStore, ship_id: i64) -> ShipJoin<'_> {
    let ship = Lookup::from_option(store.ships.get(ship_id), ship_id);
    let Lookup::Found(instance) = ship else {
        return ShipJoin {
            ship_id,
            ship,
            template: Lookup::unreachable(),
            slots: Vec::new(),
            items: BTreeMap::new(),
            item_templates: BTreeMap::new(),
        };
    };

    let template = Lookup::from_option(
        store.ship_templates.get(instance.template_id),
        instance.template_id,
    );

    let slots: Vec<SlotRef> = instance
        .slots
        .iter()
        .enumerate()
        .map(|(index, &id)| (EquipSlot::Fixed(index), id))
        .chain(std::iter::once((EquipSlot::Expansion, instance.expansion_slot)))
        .filter(|&(_, id)| id > 0)
        .map(|(slot, equipment_id)| SlotRef { slot, equipment_id })
        .collect();

    let mut items = BTreeMap::new();
    let mut item_templates = BTreeMap::new();
    for slot in &slots {
        let item = join_equipment(store, slot.equipment_id);
        if let Lookup::Found(found) = item.item {
            item_templates.insert(found.template_id, item.template);
        }
        items.insert(slot.equipment_id, item.item);
    }

    ShipJoin {
        ship_id,
        ship,
        template,
        slots,
        items,
        item_templates,
    }
}

/// Join a set of ship ids. Output is keyed by ship id; duplicate ids collapse.
pub fn join_ships<'a, I>(store: &'a NormalizedStore, ship_ids: I) -> BTreeMap<i64, ShipJoin<'a>>
where
    I: IntoIterator<Item = i64>,
{
    ship_ids
        .into_iter()
        .map(|id| (id, join_ship(store, id)))
        .collect()
}

pub fn join_equipment(store: &NormalizedStore, equipment_id: i64) -> EquipmentJoin<'_> {
    let item = Lookup::from_option(store.equipment.get(equipment_id), equipment_id);
    let template = match item {
        Lookup::Found(found) => Lookup::from_option(
            store.equipment_templates.get(found.template_id),
            found.template_id,
        ),
        Lookup::Missing { .. } => Lookup::unreachable(),
    };
    EquipmentJoin {
        equipment_id,
        item,
        template,
    }
}

/// Join an equipment list, preserving input order.
pub fn join_equipment_list<'a, I>(store: &'a NormalizedStore, equipment_ids: I) -> Vec<EquipmentJoin<'a>>
where
    I: IntoIterator<Item = i64>,
{
    equipment_ids
        .into_iter()
        .map(|id| join_equipment(store, id))
        .collect()
}
